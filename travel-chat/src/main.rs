//! Binary for the travel chat CLI.

use anyhow::Result;
use clap::Parser;
use travel_chat::{init_tracing, load_config, run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config()?;
    init_tracing(config.log_file.as_deref())?;

    run(cli, config).await
}
