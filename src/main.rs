mod cli;
mod error;
mod output;
mod providers;
mod registry;
mod run;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting pipestat");

    tokio::select! {
        result = cli.execute() => result?,
        _ = tokio::signal::ctrl_c() => {
            // Operator interrupt is a clean exit, not an error.
            println!("[...]");
        }
    }

    Ok(())
}
