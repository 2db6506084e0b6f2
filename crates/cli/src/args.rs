//! Command-line surface for `vet-sw-ctl`.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "vet-sw-ctl", version, about = "Inspect and update a running vet-sw proxy", long_about = None)]
pub struct Cli {
    /// Base URL of the vet-sw proxy
    #[arg(long, env = "VET_SW_ENDPOINT", default_value = "http://127.0.0.1:8080")]
    pub endpoint: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask the router for its cache version
    Version {
        /// Version the caller last saw; reports whether an update is available
        #[arg(long)]
        known: Option<String>,
    },
    /// Activate a waiting version now
    SkipWaiting,
    /// Print version, phase and cache stores
    Status,
}
