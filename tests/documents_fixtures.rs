mod common;

use common::fixture_json;
use polecat_csv::Document;

fn nodes(relative: &str) -> Vec<Document> {
    let page = fixture_json(relative);
    page["data"]["documents"]["edges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|edge| serde_json::from_value(edge["node"].clone()).unwrap())
        .collect()
}

#[test]
fn parse_document_page() {
    let documents = nodes("documents/page-1.json");
    assert_eq!(documents.len(), 2);

    let first = &documents[0];
    assert_eq!(first.id, "doc-001");
    assert_eq!(first.harvest_time.as_deref(), Some("2024-03-14T08:12:44Z"));
    assert_eq!(first.reach.as_deref(), Some("125000"));
    assert_eq!(first.sentiment.as_deref(), Some("0.62"));
    assert_eq!(first.companies[0].company.name, "Acme Corp");
    assert_eq!(first.companies[0].significance.as_deref(), Some("0.91"));
    assert_eq!(first.topics.len(), 2);
}

#[test]
fn parse_document_with_null_fields() {
    let documents = nodes("documents/page-1.json");
    let second = &documents[1];

    assert!(second.publisher.is_none());
    assert!(second.reach.is_none());
    assert!(second.author.is_none());
    assert_eq!(second.sentiment.as_deref(), Some("-0.4"));
}

#[test]
fn parse_document_without_topics() {
    let documents = nodes("documents/page-2.json");
    assert_eq!(documents.len(), 1);
    assert!(documents[0].topics.is_empty());
}
