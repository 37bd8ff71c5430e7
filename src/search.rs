//! Company and taxonomy lookup.
//!
//! An insight query needs a company id (`--focus`) and a taxonomy id (`--taxonomy`).
//! This module resolves names to those ids.
//!
//! ```rust,no_run
//! use polecat_csv::{Polecat, SearchOperations};
//!
//! # async fn run() -> polecat_csv::Result<()> {
//! let polecat = Polecat::from_env()?;
//! let matches = polecat.search_companies("Acme").await?;
//! for company in &matches.best {
//!     println!("{} {}", company.id, company.name);
//! }
//! # Ok(())
//! # }
//! ```

use super::Polecat;
use super::documents::{Connection, Entity};
use super::error::Result;
use super::traits::SearchOperations;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const COMPANIES_QUERY: &str = r#"
query Companies($first: Int!, $after: Cursor, $search: String) {
    companies(first: $first, after: $after, search: $search) {
        edges { node { id name } }
        pageInfo { endCursor hasNextPage }
    }
}
"#;

const TAXONOMIES_QUERY: &str = r#"
query Taxonomies {
    myOrganisation {
        taxonomies { id name }
    }
}
"#;

/// Result of a name lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMatches {
    /// Entities whose name equals the search text, ignoring case
    pub best: Vec<Entity>,
    /// Every entity returned by the API, in API order
    pub all: Vec<Entity>,
}

impl NameMatches {
    /// Splits `entities` into exact (case-insensitive) and all matches for `name`.
    pub fn classify(name: &str, entities: impl IntoIterator<Item = Entity>) -> Self {
        let wanted = name.to_lowercase();
        let mut matches = NameMatches::default();
        for entity in entities {
            if entity.name.to_lowercase() == wanted {
                matches.best.push(entity.clone());
            }
            matches.all.push(entity);
        }
        matches
    }
}

#[derive(Debug, Serialize)]
struct CompaniesVariables<'a> {
    first: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<&'a str>,
    search: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompaniesData {
    companies: Connection<Entity>,
}

#[derive(Debug, Deserialize)]
struct TaxonomiesData {
    #[serde(rename = "myOrganisation")]
    my_organisation: Organisation,
}

#[derive(Debug, Deserialize)]
struct Organisation {
    #[serde(default)]
    taxonomies: Vec<Entity>,
}

#[async_trait]
impl SearchOperations for Polecat {
    async fn search_companies(&self, name: &str) -> Result<NameMatches> {
        let mut companies = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let variables = CompaniesVariables {
                first: self.page_size,
                after: after.as_deref(),
                search: name,
            };
            let Some(data) = self
                .query_data::<CompaniesData, _>(COMPANIES_QUERY, &variables)
                .await?
            else {
                break;
            };

            let page_info = data.companies.page_info;
            companies.extend(data.companies.edges.into_iter().map(|e| e.node));

            match page_info.end_cursor {
                Some(cursor) if page_info.has_next_page => after = Some(cursor),
                _ => break,
            }
        }

        tracing::debug!("Company search for {:?} returned {} results", name, companies.len());
        Ok(NameMatches::classify(name, companies))
    }

    async fn search_taxonomies(&self, name: &str) -> Result<NameMatches> {
        let data = self
            .query_data_once::<TaxonomiesData, _>(TAXONOMIES_QUERY, &serde_json::json!({}))
            .await?;
        let taxonomies = data
            .map(|d| d.my_organisation.taxonomies)
            .unwrap_or_default();
        Ok(NameMatches::classify(name, taxonomies))
    }
}

/// Renders matches the way `polecat-search` prints them.
pub fn render_matches(matches: &NameMatches) -> String {
    let mut out = String::new();
    out.push_str(&format!("Exact matches: {}\n", matches.best.len()));
    if !matches.best.is_empty() {
        render_table(&mut out, &matches.best);
    }
    out.push_str(&format!("Total matches: {}\n", matches.all.len()));
    if !matches.all.is_empty() {
        render_table(&mut out, &matches.all);
    }
    out
}

fn render_table(out: &mut String, entities: &[Entity]) {
    out.push_str(&format!("{:<14} {:<70}\n", "ID", "NAME"));
    for entity in entities {
        out.push_str(&format!("{:<14} {:<70}\n", entity.id, entity.name));
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, name: &str) -> Entity {
        Entity {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn classify_is_case_insensitive() {
        let matches = NameMatches::classify(
            "acme",
            vec![entity("1", "ACME"), entity("2", "Acme Holdings"), entity("3", "Acme")],
        );
        assert_eq!(matches.best, vec![entity("1", "ACME"), entity("3", "Acme")]);
        assert_eq!(matches.all.len(), 3);
    }

    #[test]
    fn render_skips_empty_tables() {
        let rendered = render_matches(&NameMatches::default());
        assert_eq!(rendered, "Exact matches: 0\nTotal matches: 0\n");
    }

    #[test]
    fn render_pads_columns() {
        let matches = NameMatches::classify("x", vec![entity("42", "X")]);
        let rendered = render_matches(&matches);
        let row = rendered.lines().nth(2).unwrap();
        assert!(row.starts_with("42             X"));
    }
}
