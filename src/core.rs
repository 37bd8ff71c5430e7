use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;

use super::config::PolecatConfig;
use super::error::{PolecatError, Result};

const BASE_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF_DOUBLINGS: u32 = 16;
const ERROR_PREVIEW_CHARS: usize = 200;

/// HTTP client for the Polecat GraphQL API.
///
/// `Polecat` holds the configuration shared by every call (endpoint, token, timeout,
/// page size and retry limits) so callers only supply a GraphQL query and its variables.
/// Each call is a single POST of `{"query": ..., "variables": ...}` authenticated with
/// an `api-key` authorization header.
///
/// # Error Handling
///
/// Status codes are mapped as follows:
///
/// * 401 and 403 become `PolecatError::Auth`
/// * 429 is retried up to `max_retries` times, waiting for `Retry-After` seconds
///   (capped at `max_retry_wait`), and then becomes `PolecatError::RateLimitExceeded`
/// * any other non-success status becomes `PolecatError::Request` with a body preview
/// * network failures become `PolecatError::Transport` and are never retried
///
/// # Examples
///
/// ```rust,no_run
/// # use polecat_csv::{Polecat, PolecatConfig};
/// let polecat = Polecat::with_config(PolecatConfig::new("my-token"))?;
/// # Ok::<(), polecat_csv::PolecatError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Polecat {
    /// HTTP client with the authorization header preinstalled
    pub(crate) client: reqwest::Client,

    /// GraphQL endpoint
    pub(crate) url: String,

    pub(crate) page_size: u32,

    pub(crate) max_retries: u32,

    pub(crate) max_retry_wait: Duration,
}

/// Request body of a GraphQL call.
#[derive(Debug, Serialize)]
struct GraphQlRequest<'a, V: Serialize> {
    query: &'a str,
    variables: &'a V,
}

impl Polecat {
    /// Creates a client from the environment (`POLECAT_API_TOKEN`, `POLECAT_API_URL`).
    pub fn from_env() -> Result<Self> {
        Self::with_config(PolecatConfig::from_env())
    }

    /// Creates a client with custom configuration settings.
    ///
    /// # Errors
    ///
    /// Returns `PolecatError::Auth` if the token is empty, and `PolecatError::Config`
    /// if the token cannot be sent as a header, the page size is zero, or the HTTP
    /// client cannot be built.
    pub fn with_config(config: PolecatConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("api-key {}", config.token))
            .map_err(|e| PolecatError::Config(format!("Invalid API token: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| PolecatError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Polecat {
            client,
            url: config.url,
            page_size: config.page_size,
            max_retries: config.max_retries,
            max_retry_wait: config.max_retry_wait,
        })
    }

    /// Executes a GraphQL query once and returns the raw response body.
    ///
    /// No status is retried here; use [`Polecat::execute_query_with_retries`] to
    /// ride out rate limiting.
    pub async fn execute_query<V: Serialize + Sync>(
        &self,
        query: &str,
        variables: &V,
    ) -> Result<String> {
        let response = self.send(query, variables).await?;
        Self::into_body(response).await
    }

    /// Executes a GraphQL query, retrying rate-limited (429) responses.
    ///
    /// The wait before each retry is the `Retry-After` header in seconds, or an
    /// exponential backoff when the header is absent, never more than `max_retry_wait`.
    /// After `max_retries` retries the call fails with `PolecatError::RateLimitExceeded`.
    pub async fn execute_query_with_retries<V: Serialize + Sync>(
        &self,
        query: &str,
        variables: &V,
    ) -> Result<String> {
        let mut retries = 0;

        loop {
            let response = self.send(query, variables).await?;

            if response.status() != reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Self::into_body(response).await;
            }

            if retries >= self.max_retries {
                return Err(PolecatError::RateLimitExceeded);
            }

            let wait = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or_else(|| backoff_delay(retries))
                .min(self.max_retry_wait);

            tracing::warn!(
                "Rate limit exceeded. Attempt {}/{}. Retrying in {:?}.",
                retries + 1,
                self.max_retries.saturating_add(1),
                wait
            );
            sleep(wait).await;
            retries += 1;
        }
    }

    /// Executes a query with retries and decodes the `data` member of the GraphQL envelope.
    ///
    /// Returns `Ok(None)` when the server answers with `"data": null` and no errors.
    pub(crate) async fn query_data<T, V>(&self, query: &str, variables: &V) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        V: Serialize + Sync,
    {
        let body = self.execute_query_with_retries(query, variables).await?;
        decode_data(&body)
    }

    /// Like [`Polecat::query_data`], but a 429 fails straight away.
    #[cfg_attr(not(feature = "search"), allow(dead_code))]
    pub(crate) async fn query_data_once<T, V>(
        &self,
        query: &str,
        variables: &V,
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        V: Serialize + Sync,
    {
        let body = self.execute_query(query, variables).await?;
        decode_data(&body)
    }

    async fn send<V: Serialize + Sync>(
        &self,
        query: &str,
        variables: &V,
    ) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(&self.url)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await?;
        Ok(response)
    }

    async fn into_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.text().await?);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        let preview = body.chars().take(ERROR_PREVIEW_CHARS).collect::<String>();
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => Err(
                PolecatError::Auth(format!("API rejected the token ({}): {}", status, preview)),
            ),
            other => Err(PolecatError::Request {
                status: other.as_u16(),
                body: preview,
            }),
        }
    }
}

/// Delay before retry `attempt` (zero-based) when a 429 carries no `Retry-After`.
///
/// Starts at one second and doubles per attempt up to `MAX_BACKOFF_DOUBLINGS`, then
/// stays flat. Each delay is spread uniformly over ±10%.
fn backoff_delay(attempt: u32) -> Duration {
    let nominal = BASE_BACKOFF.saturating_mul(1 << attempt.min(MAX_BACKOFF_DOUBLINGS));
    let spread = nominal / 10;
    let offset_ms = fastrand::u64(0..=spread.as_millis() as u64 * 2);
    (nominal + Duration::from_millis(offset_ms)).saturating_sub(spread)
}

fn decode_data<T: DeserializeOwned>(body: &str) -> Result<Option<T>> {
    let envelope: GraphQlResponse<T> = serde_json::from_str(body)?;
    envelope.into_data()
}

/// GraphQL response envelope.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlErrorMessage>>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct GraphQlErrorMessage {
    pub message: String,
}

impl<T> GraphQlResponse<T> {
    pub(crate) fn into_data(self) -> Result<Option<T>> {
        match self.errors {
            Some(errors) if !errors.is_empty() => {
                let messages = errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("\n  ");
                Err(PolecatError::GraphQl(messages))
            }
            _ => Ok(self.data),
        }
    }
}
