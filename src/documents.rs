//! Documents matching an insight query.
//!
//! The `documents` GraphQL query is cursor-paginated: each response carries a page
//! of document nodes plus `pageInfo { endCursor hasNextPage }`. [`DocumentOperations`]
//! fetches a single page, and [`document_pages`] turns repeated calls into a finite
//! stream that ends once the API reports no further page.
//!
//! ```rust,no_run
//! use futures_util::TryStreamExt;
//! use polecat_csv::{InsightQuery, Polecat, document_pages};
//!
//! # async fn run(insight: InsightQuery) -> polecat_csv::Result<()> {
//! let polecat = Polecat::from_env()?;
//! let mut pages = std::pin::pin!(document_pages(&polecat, &insight));
//! while let Some(page) = pages.try_next().await? {
//!     println!("{} documents", page.documents.len());
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use futures_util::Stream;
use futures_util::stream;
use serde::{Deserialize, Deserializer, Serialize};

use super::Polecat;
use super::error::{PolecatError, Result};
use super::insight::InsightQuery;
use super::traits::DocumentOperations;

const DOCUMENTS_QUERY: &str = r#"
query Documents($insight: InsightQuery!, $first: Int!, $after: Cursor) {
    documents(insight: $insight, first: $first, after: $after, sortAsc: false) {
        edges {
            node {
                id harvestTime title domain url
                source publisher reach sentiment author
                companies { company { id name } significance }
                topics { topic { id name } significance }
            }
        }
        pageInfo { endCursor hasNextPage }
    }
}
"#;

/// One piece of content (article, post, ...) matching an insight query.
///
/// Scalar fields whose type varies between sources (`reach`, `sentiment`) are kept in
/// their textual form so they can be written to CSV unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    #[serde(default, deserialize_with = "scalar_as_text")]
    pub harvest_time: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_text")]
    pub reach: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_text")]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub companies: Vec<CompanyMention>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub topics: Vec<TopicMention>,
}

/// A company tagged on a document, with how significant it is to the document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompanyMention {
    pub company: Entity,
    #[serde(default, deserialize_with = "scalar_as_text")]
    pub significance: Option<String>,
}

/// A taxonomy topic tagged on a document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopicMention {
    pub topic: Entity,
    #[serde(default, deserialize_with = "scalar_as_text")]
    pub significance: Option<String>,
}

/// An `{ id name }` pair as returned for companies, topics and taxonomies.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Entity {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One page of results plus the cursor needed to fetch the next one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPage {
    pub documents: Vec<Document>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

impl DocumentPage {
    /// Cursor for the following page, or `None` once results are exhausted.
    pub fn next_cursor(&self) -> Option<&str> {
        if self.has_next_page {
            self.end_cursor.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Connection<N> {
    pub edges: Vec<Edge<N>>,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Edge<N> {
    pub node: N,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageInfo {
    #[serde(rename = "endCursor")]
    pub end_cursor: Option<String>,
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
}

#[derive(Debug, Deserialize)]
struct DocumentsData {
    documents: Connection<Document>,
}

impl Connection<Document> {
    fn into_page(self) -> DocumentPage {
        DocumentPage {
            documents: self.edges.into_iter().map(|e| e.node).collect(),
            end_cursor: self.page_info.end_cursor,
            has_next_page: self.page_info.has_next_page,
        }
    }
}

#[derive(Debug, Serialize)]
struct DocumentsVariables<'a> {
    insight: &'a InsightQuery,
    first: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<&'a str>,
}

#[async_trait]
impl DocumentOperations for Polecat {
    /// Fetches the page of documents following `after` (the first page when `None`).
    ///
    /// A response with `"data": null` is treated as an empty, final page.
    async fn documents_page(
        &self,
        insight: &InsightQuery,
        after: Option<&str>,
    ) -> Result<DocumentPage> {
        let variables = DocumentsVariables {
            insight,
            first: self.page_size,
            after,
        };

        let data: Option<DocumentsData> = self.query_data(DOCUMENTS_QUERY, &variables).await?;
        Ok(data.map(|d| d.documents.into_page()).unwrap_or_default())
    }
}

#[derive(Debug)]
enum Cursor {
    First,
    After(String),
    Exhausted,
}

/// Lazily pages through every document matching `insight`.
///
/// Each item is one API page, in the order the API returns them. The stream ends
/// after the page whose `hasNextPage` is false (or that carries no cursor), and stops
/// at the first error.
pub fn document_pages<'a, C>(
    client: &'a C,
    insight: &'a InsightQuery,
) -> impl Stream<Item = Result<DocumentPage>> + Send + 'a
where
    C: DocumentOperations + Sync + ?Sized,
{
    stream::try_unfold(
        (Cursor::First, 1_usize),
        move |(cursor, number)| async move {
            let after = match cursor {
                Cursor::First => None,
                Cursor::After(after) => Some(after),
                Cursor::Exhausted => return Ok::<_, PolecatError>(None),
            };

            tracing::info!("Fetching page {}", number);
            let page = client.documents_page(insight, after.as_deref()).await?;
            let next = match page.next_cursor() {
                Some(cursor) => Cursor::After(cursor.to_string()),
                None => Cursor::Exhausted,
            };
            Ok::<_, PolecatError>(Some((page, (next, number + 1))))
        },
    )
}

fn scalar_as_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
