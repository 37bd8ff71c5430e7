//! Download loop: fetch pages of documents and hand them to a sink.
//!
//! The loop is sequential: one request in flight, one page written at a time.
//! Rows already flushed to disk stay there if a later page fails.

use futures_util::TryStreamExt;
use std::path::PathBuf;

use super::documents::document_pages;
use super::error::Result;
use super::export::{DocumentSink, ExportPlan, RowCounts, WriteMode};
use super::insight::InsightQuery;
use super::traits::DocumentOperations;

/// Everything one run needs besides the API client.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub insight: InsightQuery,
    pub mode: WriteMode,
    /// Directory the CSV files are written to
    pub output_dir: PathBuf,
}

/// Totals reported after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub pages: usize,
    pub documents: usize,
    pub rows: RowCounts,
}

/// Streams every page matching `insight` into `sink`, returning page and document counts.
pub async fn stream_documents<C, S>(
    client: &C,
    insight: &InsightQuery,
    sink: &mut S,
) -> Result<(usize, usize)>
where
    C: DocumentOperations + Sync + ?Sized,
    S: DocumentSink + ?Sized,
{
    let mut pages = std::pin::pin!(document_pages(client, insight));
    let mut page_count = 0;
    let mut document_count = 0;

    while let Some(page) = pages.try_next().await? {
        tracing::info!("Writing {} documents", page.documents.len());
        sink.write_documents(&page.documents)?;
        sink.flush()?;
        page_count += 1;
        document_count += page.documents.len();
    }

    Ok((page_count, document_count))
}

/// Runs one download into the four CSV files.
///
/// Output files are checked against `request.mode` before the first request, so a
/// collision fails without contacting the API and without touching any file.
pub async fn download<C>(client: &C, request: &DownloadRequest) -> Result<DownloadSummary>
where
    C: DocumentOperations + Sync + ?Sized,
{
    let plan = ExportPlan::resolve(&request.output_dir, request.mode)?;
    for target in plan.targets() {
        tracing::debug!("{} -> {:?}", target.path.display(), target.action);
    }

    let mut export = plan.open(request.insight.focus_id.as_str())?;
    let (pages, documents) = stream_documents(client, &request.insight, &mut export).await?;
    let rows = export.finish()?;

    tracing::info!(
        "Finished: {} documents matched across {} pages",
        documents,
        pages
    );

    Ok(DownloadSummary {
        pages,
        documents,
        rows,
    })
}
