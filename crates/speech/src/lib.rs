#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

//! Speech-to-text for uploaded voice notes
//!
//! An upload is staged to a temporary file, mapped to a recognizer codec by
//! its extension, and sent to Google Cloud Speech-to-Text for synchronous
//! recognition.

mod encoding;
mod error;
mod recognizer;
mod staging;
mod upload;

pub use encoding::AudioEncoding;
pub use error::{Result, SpeechError};
pub use recognizer::{NO_SPEECH_DETECTED, Recognizer, Transcript};
pub use staging::StagedAudio;
pub use upload::{AudioUpload, ExtractUpload, UploadLimit};
