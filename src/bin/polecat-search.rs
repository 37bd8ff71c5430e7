use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use polecat_csv::{Polecat, SearchOperations, render_matches};
use tracing_subscriber::EnvFilter;

/// Look up the company or taxonomy id needed for `polecat-csv --focus/--taxonomy`.
#[derive(Debug, Parser)]
#[command(name = "polecat-search")]
#[command(
    group(
        ArgGroup::new("kind")
            .required(true)
            .args(["company", "taxonomy"])
    )
)]
struct Args {
    /// Name to search for.
    #[arg(long)]
    name: String,

    /// Search companies.
    #[arg(long)]
    company: bool,

    /// Search the taxonomies of your organisation.
    #[arg(long)]
    taxonomy: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("polecat_csv=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let polecat = Polecat::from_env().context("failed to create Polecat client")?;

    let matches = if args.company {
        polecat
            .search_companies(&args.name)
            .await
            .context("company search failed")?
    } else {
        polecat
            .search_taxonomies(&args.name)
            .await
            .context("taxonomy search failed")?
    };

    print!("{}", render_matches(&matches));
    Ok(())
}
