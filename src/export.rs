//! CSV export of downloaded documents.
//!
//! Every run writes four files that together describe the documents: one row per
//! document, the document/company and document/topic links, and a denormalised
//! document × focus company × topic table for quick analysis.
//!
//! How each file is opened is decided once, before the first row, by [`ExportPlan`]:
//!
//! | [`WriteMode`] | file missing       | file present                        |
//! |---------------|--------------------|-------------------------------------|
//! | `Fail`        | create + header    | `PolecatError::FileExists`          |
//! | `Append`      | create + header    | append rows (header only if empty)  |
//! | `Overwrite`   | create + header    | truncate, header + rows             |

use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use super::documents::Document;
use super::error::{PolecatError, Result};

/// What to do with output files that already exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Refuse to touch existing files.
    #[default]
    Fail,
    /// Add rows to existing files without repeating the header.
    Append,
    /// Replace existing files.
    Overwrite,
}

/// How a single output file is opened, resolved from a [`WriteMode`] and whether
/// the file exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAction {
    Create,
    Append,
    Truncate,
}

impl OpenAction {
    /// Resolves the open action for one file. `None` means the file exists and the
    /// mode forbids touching it.
    pub fn resolve(mode: WriteMode, exists: bool) -> Option<Self> {
        match (mode, exists) {
            (_, false) => Some(OpenAction::Create),
            (WriteMode::Fail, true) => None,
            (WriteMode::Append, true) => Some(OpenAction::Append),
            (WriteMode::Overwrite, true) => Some(OpenAction::Truncate),
        }
    }
}

/// The four CSV files written per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvKind {
    Documents,
    Denormalised,
    Companies,
    Topics,
}

impl CsvKind {
    pub const ALL: [CsvKind; 4] = [
        CsvKind::Documents,
        CsvKind::Denormalised,
        CsvKind::Companies,
        CsvKind::Topics,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            CsvKind::Documents => "documents.csv",
            CsvKind::Denormalised => "documents_denormalised.csv",
            CsvKind::Companies => "documents_companies.csv",
            CsvKind::Topics => "documents_topics.csv",
        }
    }

    pub fn header(self) -> &'static [&'static str] {
        match self {
            CsvKind::Documents => &[
                "id",
                "harvest_time",
                "sentiment",
                "reach",
                "publisher",
                "domain",
                "source",
                "author",
                "url",
                "title",
            ],
            CsvKind::Denormalised => &[
                "document_id",
                "harvest_time",
                "data_source",
                "sentiment",
                "reach",
                "company_id",
                "company_name",
                "company_significance",
                "topic_id",
                "topic_name",
                "topic_significance",
            ],
            CsvKind::Companies => &[
                "document_id",
                "company_id",
                "company_name",
                "company_significance",
            ],
            CsvKind::Topics => &["document_id", "topic_id", "topic_name", "topic_significance"],
        }
    }
}

/// One output file with its resolved open action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub kind: CsvKind,
    pub path: PathBuf,
    pub action: OpenAction,
}

/// Open actions for every output file, resolved before any network call.
#[derive(Debug, Clone)]
pub struct ExportPlan {
    targets: Vec<OutputTarget>,
}

impl ExportPlan {
    /// Checks the four output paths in `dir` against `mode`.
    ///
    /// # Errors
    ///
    /// Returns `PolecatError::FileExists` listing every colliding path when `mode` is
    /// [`WriteMode::Fail`] and any output file already exists. Nothing is written.
    pub fn resolve(dir: impl AsRef<Path>, mode: WriteMode) -> Result<Self> {
        let dir = dir.as_ref();
        let mut targets = Vec::with_capacity(CsvKind::ALL.len());
        let mut existing = Vec::new();

        for kind in CsvKind::ALL {
            let path = dir.join(kind.file_name());
            match OpenAction::resolve(mode, path.exists()) {
                Some(action) => targets.push(OutputTarget { kind, path, action }),
                None => existing.push(path),
            }
        }

        if !existing.is_empty() {
            return Err(PolecatError::FileExists(existing));
        }
        Ok(Self { targets })
    }

    pub fn targets(&self) -> &[OutputTarget] {
        &self.targets
    }

    /// Opens every target and writes headers where needed.
    ///
    /// Files opened before a failure are closed again when the partial export is dropped.
    pub fn open(self, focus_id: impl Into<String>) -> Result<CsvExport> {
        let mut writers = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            writers.push(open_writer(target)?);
        }
        tracing::debug!("Opened {} CSV files", writers.len());

        let [documents, denormalised, companies, topics]: [csv::Writer<File>; 4] = writers
            .try_into()
            .map_err(|_| PolecatError::Config("Export plan must hold four files".to_string()))?;

        Ok(CsvExport {
            focus_id: focus_id.into(),
            documents,
            denormalised,
            companies,
            topics,
            rows: RowCounts::default(),
        })
    }
}

fn open_writer(target: &OutputTarget) -> Result<csv::Writer<File>> {
    let (file, write_header) = match target.action {
        OpenAction::Create => {
            let file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target.path)
                .map_err(|e| match e.kind() {
                    io::ErrorKind::AlreadyExists => {
                        PolecatError::FileExists(vec![target.path.clone()])
                    }
                    _ => PolecatError::Io(e),
                })?;
            (file, true)
        }
        OpenAction::Append => {
            let file = OpenOptions::new().append(true).open(&target.path)?;
            let empty = file.metadata()?.len() == 0;
            (file, empty)
        }
        OpenAction::Truncate => (File::create(&target.path)?, true),
    };

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(file);

    if write_header {
        writer.write_record(target.kind.header())?;
    }
    Ok(writer)
}

/// Number of data rows written to each file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub documents: usize,
    pub denormalised: usize,
    pub companies: usize,
    pub topics: usize,
}

/// Destination for pages of documents.
pub trait DocumentSink {
    /// Writes a batch of documents, in order.
    fn write_documents(&mut self, documents: &[Document]) -> Result<()>;
    /// Flushes buffered output.
    fn flush(&mut self) -> Result<()>;
}

/// Open CSV writers for one run.
pub struct CsvExport {
    focus_id: String,
    documents: csv::Writer<File>,
    denormalised: csv::Writer<File>,
    companies: csv::Writer<File>,
    topics: csv::Writer<File>,
    rows: RowCounts,
}

impl CsvExport {
    /// Flushes every file and closes them.
    pub fn finish(mut self) -> Result<RowCounts> {
        DocumentSink::flush(&mut self)?;
        Ok(self.rows)
    }

    fn write_document(&mut self, doc: &Document) -> Result<()> {
        let id = doc.id.as_str();
        let harvest_time = text(&doc.harvest_time);
        let sentiment = text(&doc.sentiment);
        let reach = text(&doc.reach);

        self.documents.write_record([
            id,
            harvest_time,
            sentiment,
            reach,
            text(&doc.publisher),
            text(&doc.domain),
            text(&doc.source),
            text(&doc.author),
            text(&doc.url),
            text(&doc.title),
        ])?;
        self.rows.documents += 1;

        let focus_id = self.focus_id.as_str();
        for mention in doc.companies.iter().filter(|m| m.company.id == focus_id) {
            let company_significance = text(&mention.significance);

            for topic in &doc.topics {
                self.denormalised.write_record([
                    id,
                    harvest_time,
                    text(&doc.source),
                    sentiment,
                    reach,
                    mention.company.id.as_str(),
                    mention.company.name.as_str(),
                    company_significance,
                    topic.topic.id.as_str(),
                    topic.topic.name.as_str(),
                    text(&topic.significance),
                ])?;
                self.rows.denormalised += 1;
            }

            self.companies.write_record([
                id,
                mention.company.id.as_str(),
                mention.company.name.as_str(),
                company_significance,
            ])?;
            self.rows.companies += 1;
        }

        for topic in &doc.topics {
            self.topics.write_record([
                id,
                topic.topic.id.as_str(),
                topic.topic.name.as_str(),
                text(&topic.significance),
            ])?;
            self.rows.topics += 1;
        }

        Ok(())
    }
}

impl DocumentSink for CsvExport {
    fn write_documents(&mut self, documents: &[Document]) -> Result<()> {
        for doc in documents {
            self.write_document(doc)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.documents.flush()?;
        self.denormalised.flush()?;
        self.companies.flush()?;
        self.topics.flush()?;
        Ok(())
    }
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn document(id: &str) -> Document {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "harvestTime": "2024-02-01T09:30:00Z",
            "title": "Quarterly \"results\", at last",
            "source": "NEWS",
            "reach": 10,
            "sentiment": 0.4,
            "companies": [
                { "company": { "id": "focus", "name": "Focus Co" }, "significance": 0.9 },
                { "company": { "id": "other", "name": "Other Co" }, "significance": 0.1 }
            ],
            "topics": [
                { "topic": { "id": "t1", "name": "Governance" }, "significance": 0.7 },
                { "topic": { "id": "t2", "name": "Climate" }, "significance": 0.2 }
            ]
        }))
        .unwrap()
    }

    fn read(dir: &TempDir, kind: CsvKind) -> String {
        fs::read_to_string(dir.path().join(kind.file_name())).unwrap()
    }

    #[test]
    fn resolve_action_table() {
        assert_eq!(OpenAction::resolve(WriteMode::Fail, false), Some(OpenAction::Create));
        assert_eq!(OpenAction::resolve(WriteMode::Fail, true), None);
        assert_eq!(OpenAction::resolve(WriteMode::Append, true), Some(OpenAction::Append));
        assert_eq!(OpenAction::resolve(WriteMode::Append, false), Some(OpenAction::Create));
        assert_eq!(
            OpenAction::resolve(WriteMode::Overwrite, true),
            Some(OpenAction::Truncate)
        );
        assert_eq!(
            OpenAction::resolve(WriteMode::Overwrite, false),
            Some(OpenAction::Create)
        );
    }

    #[test]
    fn rows_fan_out_across_files() {
        let dir = TempDir::new().unwrap();
        let mut export = ExportPlan::resolve(dir.path(), WriteMode::Fail)
            .unwrap()
            .open("focus")
            .unwrap();
        export.write_documents(&[document("d1")]).unwrap();
        let rows = export.finish().unwrap();

        assert_eq!(
            rows,
            RowCounts {
                documents: 1,
                denormalised: 2,
                companies: 1,
                topics: 2,
            }
        );

        let documents = read(&dir, CsvKind::Documents);
        assert_eq!(
            documents,
            "\"id\",\"harvest_time\",\"sentiment\",\"reach\",\"publisher\",\"domain\",\"source\",\"author\",\"url\",\"title\"\n\
             \"d1\",\"2024-02-01T09:30:00Z\",\"0.4\",\"10\",\"\",\"\",\"NEWS\",\"\",\"\",\"Quarterly \"\"results\"\", at last\"\n"
        );

        let denormalised = read(&dir, CsvKind::Denormalised);
        let lines: Vec<&str> = denormalised.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "\"d1\",\"2024-02-01T09:30:00Z\",\"NEWS\",\"0.4\",\"10\",\"focus\",\"Focus Co\",\"0.9\",\"t1\",\"Governance\",\"0.7\""
        );

        let companies = read(&dir, CsvKind::Companies);
        assert!(!companies.contains("Other Co"));
    }

    #[test]
    fn zero_documents_still_creates_headers() {
        let dir = TempDir::new().unwrap();
        let export = ExportPlan::resolve(dir.path(), WriteMode::Fail)
            .unwrap()
            .open("focus")
            .unwrap();
        export.finish().unwrap();

        for kind in CsvKind::ALL {
            let content = read(&dir, kind);
            assert_eq!(content.lines().count(), 1, "{}", kind.file_name());
        }
    }

    #[test]
    fn existing_files_are_reported_and_untouched() {
        let dir = TempDir::new().unwrap();
        let docs = dir.path().join("documents.csv");
        let topics = dir.path().join("documents_topics.csv");
        fs::write(&docs, "keep me\n").unwrap();
        fs::write(&topics, "").unwrap();

        match ExportPlan::resolve(dir.path(), WriteMode::Fail) {
            Err(PolecatError::FileExists(paths)) => assert_eq!(paths, vec![docs.clone(), topics]),
            other => panic!("expected FileExists, got {:?}", other.map(|p| p.targets().len())),
        }
        assert_eq!(fs::read_to_string(&docs).unwrap(), "keep me\n");
        assert!(!dir.path().join("documents_companies.csv").exists());
    }

    #[test]
    fn append_skips_header_unless_file_is_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("documents.csv"), "\"id\"\n\"old\"\n").unwrap();
        fs::write(dir.path().join("documents_topics.csv"), "").unwrap();

        let plan = ExportPlan::resolve(dir.path(), WriteMode::Append).unwrap();
        let actions: Vec<OpenAction> = plan.targets().iter().map(|t| t.action).collect();
        assert_eq!(
            actions,
            vec![
                OpenAction::Append,
                OpenAction::Create,
                OpenAction::Create,
                OpenAction::Append
            ]
        );

        let mut export = plan.open("focus").unwrap();
        export.write_documents(&[document("new")]).unwrap();
        export.finish().unwrap();

        let documents = read(&dir, CsvKind::Documents);
        assert!(documents.starts_with("\"id\"\n\"old\"\n\"new\","));
        assert_eq!(documents.matches("harvest_time").count(), 0);

        let topics = read(&dir, CsvKind::Topics);
        assert!(topics.starts_with("\"document_id\",\"topic_id\""));
        assert_eq!(topics.lines().count(), 3);
    }

    #[test]
    fn overwrite_replaces_contents() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("documents.csv"), "stale\nstale\nstale\n").unwrap();

        let mut export = ExportPlan::resolve(dir.path(), WriteMode::Overwrite)
            .unwrap()
            .open("focus")
            .unwrap();
        export.write_documents(&[document("fresh")]).unwrap();
        export.finish().unwrap();

        let documents = read(&dir, CsvKind::Documents);
        assert!(!documents.contains("stale"));
        assert!(documents.starts_with("\"id\",\"harvest_time\""));
        assert_eq!(documents.lines().count(), 2);
    }
}
