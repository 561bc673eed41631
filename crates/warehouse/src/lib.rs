#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

//! CRM record storage in `BigQuery`

mod client;
mod error;
mod insert;
mod rows;
mod table;

pub use client::Warehouse;
pub use error::{Result, WarehouseError};
pub use insert::CrmRow;
pub use rows::Record;
pub use table::TableRef;
