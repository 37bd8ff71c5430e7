use anyhow::Result;
use clap::{CommandFactory, Parser, error::ErrorKind};
use polecat_csv::cli::{Cli, run};
use polecat_csv::{PolecatConfig, PolecatError};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("polecat_csv=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let summary = match run(cli, PolecatConfig::from_env()).await {
        Ok(summary) => summary,
        Err(PolecatError::Usage(message)) => {
            Cli::command().error(ErrorKind::ValueValidation, message).exit()
        }
        Err(e) => return Err(anyhow::Error::new(e).context("failed to download documents")),
    };

    println!("Total of {} documents matched.", summary.documents);
    Ok(())
}
