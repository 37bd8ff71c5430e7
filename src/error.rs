use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolecatError {
    #[error("Invalid arguments: {0}")]
    Usage(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Request failed with status {status}: {body}")]
    Request { status: u16, body: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Rate limit exceeded: maximum number of retries exhausted")]
    RateLimitExceeded,

    #[error("GraphQL query returned the following errors:\n  {0}")]
    GraphQl(String),

    #[error(
        "Files already exist: {}. Use --overwrite to overwrite existing files or --append to append to them.",
        display_paths(.0)
    )]
    FileExists(Vec<PathBuf>),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, PolecatError>;
