//! # polecat-csv - download Polecat insight documents into CSV files
//!
//! A small reference client for the Polecat GraphQL API. It builds one insight query
//! (a focus company, a taxonomy and a date range, plus optional filters), pages through
//! every matching document and writes them to four CSV files.
//!
//! ## Features
//!
//! - **API client** - authenticated GraphQL calls with rate-limit retries
//! - **Document paging** - cursor pagination exposed as a lazy stream of pages
//! - **CSV export** - fail / append / overwrite handling decided once per file
//! - **Lookup** - resolve company and taxonomy names to ids (feature `search`)
//!
//! ## Basic Usage
//!
//! ```ignore
//! use polecat_csv::{DownloadRequest, InsightQuery, Polecat, WriteMode, download};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads POLECAT_API_TOKEN
//!     let polecat = Polecat::from_env()?;
//!
//!     let insight = InsightQuery::new(
//!         "company-id",
//!         "taxonomy-id",
//!         "2024-01-01".parse()?,
//!         "2024-01-31".parse()?,
//!     )?
//!     .with_languages(["en"]);
//!
//!     let request = DownloadRequest {
//!         insight,
//!         mode: WriteMode::Fail,
//!         output_dir: ".".into(),
//!     };
//!     let summary = download(&polecat, &request).await?;
//!     println!("Total of {} documents matched.", summary.documents);
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod documents;
mod error;
mod insight;
mod traits;

pub mod cli;
pub mod download;
pub mod export;

#[cfg(feature = "search")]
mod search;

pub use config::{DEFAULT_URL, PolecatConfig, TOKEN_ENV, URL_ENV};
pub use self::core::Polecat;
pub use documents::{CompanyMention, Document, DocumentPage, Entity, TopicMention, document_pages};
pub use download::{DownloadRequest, DownloadSummary, download, stream_documents};
pub use error::{PolecatError, Result};
pub use export::{
    CsvExport, CsvKind, DocumentSink, ExportPlan, OpenAction, OutputTarget, RowCounts, WriteMode,
};
pub use insight::InsightQuery;
pub use traits::DocumentOperations;

#[cfg(feature = "search")]
pub use search::{NameMatches, render_matches};
#[cfg(feature = "search")]
pub use traits::SearchOperations;

/// Current crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
