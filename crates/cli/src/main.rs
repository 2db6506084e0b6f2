//! vet-sw-ctl: version check and update prompt for a running vet-sw proxy.

mod args;
mod client;

use anyhow::Result;
use clap::Parser;

use args::{Cli, Commands};
use client::{ControlClient, describe_update};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = ControlClient::new(&cli.endpoint)?;

    match cli.command {
        Commands::Version { known } => {
            let version = client.version().await?;
            match known {
                Some(known) => println!("{}", describe_update(&known, &version)),
                None => println!("{version}"),
            }
        }
        Commands::SkipWaiting => {
            client.skip_waiting().await?;
            println!("skip-waiting sent");
        }
        Commands::Status => {
            let status = client.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
