use chrono::NaiveDate;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use super::Polecat;
use super::config::PolecatConfig;
use super::download::{DownloadRequest, DownloadSummary, download};
use super::error::Result;
use super::export::WriteMode;
use super::insight::InsightQuery;

/// Save documents matching an insight query in CSVs.
///
/// The arguments are the fields of an insight query. --focus, --taxonomy, --from and
/// --to are required. The filters --language, --media and --sentiment are optional;
/// repeat a flag to pass several values. See https://developer.polecat.com/reference/enums
/// for valid filter values.
#[derive(Debug, Clone, Parser)]
#[command(name = "polecat-csv", version)]
#[command(after_help = "For further info refer to https://developer.polecat.com.")]
#[command(group(ArgGroup::new("existing").args(["append", "overwrite"])))]
pub struct Cli {
    /// Id of the company the documents must match. Look it up with
    /// `polecat-search --company --name <NAME>` if unknown.
    #[arg(long = "focus", value_name = "ID")]
    pub focus_id: String,

    /// Id of the taxonomy the documents must match. Look it up with
    /// `polecat-search --taxonomy --name <NAME>` if unknown.
    #[arg(long = "taxonomy", value_name = "ID")]
    pub taxonomy_id: String,

    /// Earliest day to include (inclusive), as yyyy-mm-dd.
    #[arg(long = "from", value_name = "DATE")]
    pub from_date: NaiveDate,

    /// Latest day to include (inclusive), as yyyy-mm-dd.
    #[arg(long = "to", value_name = "DATE")]
    pub to_date: NaiveDate,

    /// Two-letter language code of documents to include. Repeatable.
    #[arg(long = "language", value_name = "CODE")]
    pub languages: Vec<String>,

    /// Media type of documents to include. Repeatable.
    #[arg(long = "media", value_name = "TYPE")]
    pub media: Vec<String>,

    /// Sentiment of documents to include. Repeatable.
    #[arg(long = "sentiment", value_name = "SENTIMENT")]
    pub sentiments: Vec<String>,

    /// Append to existing CSVs. Headers are only written to files that do not exist yet.
    #[arg(long)]
    pub append: bool,

    /// Overwrite existing CSVs. Without this flag or --append the run fails if any
    /// output file already exists.
    #[arg(long)]
    pub overwrite: bool,

    /// Directory to write the CSV files to.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,
}

impl Cli {
    pub fn write_mode(&self) -> WriteMode {
        match (self.append, self.overwrite) {
            (true, _) => WriteMode::Append,
            (_, true) => WriteMode::Overwrite,
            _ => WriteMode::Fail,
        }
    }

    /// Validates the arguments into a download request.
    ///
    /// # Errors
    ///
    /// Returns `PolecatError::Usage` if an id is blank or `--from` is after `--to`.
    pub fn into_request(self) -> Result<DownloadRequest> {
        let mode = self.write_mode();
        let insight = InsightQuery::new(
            self.focus_id,
            self.taxonomy_id,
            self.from_date,
            self.to_date,
        )?
        .with_languages(&self.languages)
        .with_media(&self.media)
        .with_sentiments(&self.sentiments);

        Ok(DownloadRequest {
            insight,
            mode,
            output_dir: self.output_dir,
        })
    }
}

/// Runs the download described by `cli` against the API configured in `config`.
///
/// Arguments are validated first, then the token, then the output files. A missing
/// token therefore fails before any file is opened or request is sent.
pub async fn run(cli: Cli, config: PolecatConfig) -> Result<DownloadSummary> {
    let request = cli.into_request()?;
    let polecat = Polecat::with_config(config)?;
    download(&polecat, &request).await
}
