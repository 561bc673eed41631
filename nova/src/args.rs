use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Nova voice-note CRM backend
#[derive(Debug, Parser)]
#[command(name = "nova", about = "Turns recorded sales conversations into CRM records")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "nova.toml", env = "NOVA_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "NOVA_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter directives, e.g. `info,speech=debug`
    #[arg(long, default_value = "info", env = "NOVA_LOG")]
    pub log: String,
}
