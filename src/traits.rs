//! Trait definitions grouping Polecat API operations by area.
//!
//! The `Polecat` client implements each trait. The download loop and the CSV
//! export only depend on [`DocumentOperations`], so tests can drive them with a
//! scripted implementation instead of a live endpoint.

use super::documents::DocumentPage;
use super::error::Result;
use super::insight::InsightQuery;
#[cfg(feature = "search")]
use super::search::NameMatches;
use async_trait::async_trait;

/// Operations for retrieving documents that match an insight query.
#[async_trait]
pub trait DocumentOperations {
    /// Fetches one page of documents, starting after `after` or from the beginning.
    async fn documents_page(
        &self,
        insight: &InsightQuery,
        after: Option<&str>,
    ) -> Result<DocumentPage>;
}

/// Operations for looking up the ids needed to build an insight query.
///
/// A focus id names a company and a taxonomy id names one of the caller's
/// organisation taxonomies. Both lookups return every match plus the subset whose
/// name equals the search text, ignoring case.
#[cfg(feature = "search")]
#[async_trait]
pub trait SearchOperations {
    /// Searches companies by name, paging through every result.
    async fn search_companies(&self, name: &str) -> Result<NameMatches>;
    /// Searches the taxonomies of the caller's organisation by name.
    async fn search_taxonomies(&self, name: &str) -> Result<NameMatches>;
}
