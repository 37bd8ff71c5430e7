use chrono::NaiveDate;
use serde::Serialize;

use super::error::{PolecatError, Result};

/// Parameters of an insight query: the documents about one focus company,
/// classified by one taxonomy, harvested within an inclusive date range.
///
/// Filters are normalised the way the API expects them: language codes are
/// lower-cased, media and sentiment values upper-cased. The value is built once
/// per run and not changed afterwards.
///
/// ```rust
/// use chrono::NaiveDate;
/// use polecat_csv::InsightQuery;
///
/// let insight = InsightQuery::new(
///     "focus-1",
///     "taxonomy-1",
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
/// )?
/// .with_languages(["EN", "fr"])
/// .with_media(["news"]);
///
/// assert_eq!(insight.language_filters, vec!["en", "fr"]);
/// assert_eq!(insight.media_filters, vec!["NEWS"]);
/// # Ok::<(), polecat_csv::PolecatError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightQuery {
    pub focus_id: String,
    pub taxonomy_id: String,
    /// First day to include, serialized as `yyyy-mm-dd`
    pub from_date: NaiveDate,
    /// Last day to include, serialized as `yyyy-mm-dd`
    pub to_date: NaiveDate,
    pub language_filters: Vec<String>,
    pub media_filters: Vec<String>,
    pub sentiment_filters: Vec<String>,
}

impl InsightQuery {
    /// Creates a query without filters.
    ///
    /// # Errors
    ///
    /// Returns `PolecatError::Usage` if an id is blank or `from_date` is after `to_date`.
    pub fn new(
        focus_id: impl Into<String>,
        taxonomy_id: impl Into<String>,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Self> {
        let focus_id = focus_id.into();
        let taxonomy_id = taxonomy_id.into();

        if focus_id.trim().is_empty() {
            return Err(PolecatError::Usage("--focus must not be empty".to_string()));
        }
        if taxonomy_id.trim().is_empty() {
            return Err(PolecatError::Usage(
                "--taxonomy must not be empty".to_string(),
            ));
        }
        if from_date > to_date {
            return Err(PolecatError::Usage(format!(
                "--from ({}) must not be after --to ({})",
                from_date, to_date
            )));
        }

        Ok(Self {
            focus_id,
            taxonomy_id,
            from_date,
            to_date,
            language_filters: Vec::new(),
            media_filters: Vec::new(),
            sentiment_filters: Vec::new(),
        })
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.language_filters = languages
            .into_iter()
            .map(|l| l.as_ref().trim().to_lowercase())
            .collect();
        self
    }

    pub fn with_media<I, S>(mut self, media: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.media_filters = media
            .into_iter()
            .map(|m| m.as_ref().trim().to_uppercase())
            .collect();
        self
    }

    pub fn with_sentiments<I, S>(mut self, sentiments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.sentiment_filters = sentiments
            .into_iter()
            .map(|s| s.as_ref().trim().to_uppercase())
            .collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn serializes_as_api_variable() {
        let insight = InsightQuery::new("c-1", "t-1", date(2024, 3, 1), date(2024, 3, 31))
            .unwrap()
            .with_languages(["EN"])
            .with_media(["news", "Blog"])
            .with_sentiments(["positive"]);

        assert_eq!(
            serde_json::to_value(&insight).unwrap(),
            json!({
                "focusId": "c-1",
                "taxonomyId": "t-1",
                "fromDate": "2024-03-01",
                "toDate": "2024-03-31",
                "languageFilters": ["en"],
                "mediaFilters": ["NEWS", "BLOG"],
                "sentimentFilters": ["POSITIVE"],
            })
        );
    }

    #[test]
    fn single_day_range_is_valid() {
        assert!(InsightQuery::new("c", "t", date(2024, 5, 5), date(2024, 5, 5)).is_ok());
    }

    #[test]
    fn reversed_range_is_usage_error() {
        let err = InsightQuery::new("c", "t", date(2024, 5, 6), date(2024, 5, 5)).unwrap_err();
        assert!(matches!(err, PolecatError::Usage(_)));
    }

    #[test]
    fn blank_focus_is_usage_error() {
        let err = InsightQuery::new(" ", "t", date(2024, 5, 5), date(2024, 5, 5)).unwrap_err();
        assert!(matches!(err, PolecatError::Usage(_)));
    }
}
