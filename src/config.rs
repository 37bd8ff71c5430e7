use std::time::Duration;

use super::error::{PolecatError, Result};

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "POLECAT_API_TOKEN";

/// Environment variable that overrides the GraphQL endpoint.
pub const URL_ENV: &str = "POLECAT_API_URL";

pub const DEFAULT_URL: &str = "https://api.polecat.com/graphql";

/// Configuration for the Polecat client
#[derive(Debug, Clone)]
pub struct PolecatConfig {
    /// API token sent as `Authorization: api-key <token>`
    pub token: String,
    /// GraphQL endpoint to execute queries against
    pub url: String,
    /// HTTP request timeout
    pub timeout: Duration,
    /// Number of results requested per page for paginated queries
    pub page_size: u32,
    /// Maximum number of successive retries after a 429 response
    pub max_retries: u32,
    /// Upper bound on the wait between rate-limited retries
    pub max_retry_wait: Duration,
}

impl Default for PolecatConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            url: DEFAULT_URL.to_string(),
            timeout: Duration::from_secs(60),
            page_size: 100,
            max_retries: 3,
            max_retry_wait: Duration::from_secs(30),
        }
    }
}

impl PolecatConfig {
    /// Creates a config with default settings and the given token.
    ///
    /// ```rust
    /// use polecat_csv::PolecatConfig;
    /// let config = PolecatConfig::new("my-token").with_page_size(50);
    /// assert_eq!(config.page_size, 50);
    /// ```
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// Builds a config from `POLECAT_API_TOKEN` and the optional `POLECAT_API_URL`.
    ///
    /// A missing token is not an error here; the client rejects it when constructed.
    pub fn from_env() -> Self {
        let mut config = Self::new(std::env::var(TOKEN_ENV).unwrap_or_default());
        if let Ok(url) = std::env::var(URL_ENV) {
            if !url.trim().is_empty() {
                config.url = url;
            }
        }
        config
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_max_retry_wait(mut self, wait: Duration) -> Self {
        self.max_retry_wait = wait;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(PolecatError::Auth(format!("{} is not set", TOKEN_ENV)));
        }
        if self.page_size == 0 {
            return Err(PolecatError::Config(
                "Page size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_public_api() {
        let config = PolecatConfig::default();
        assert_eq!(config.url, "https://api.polecat.com/graphql");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.page_size, 100);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.max_retry_wait, Duration::from_secs(30));
    }

    #[test]
    fn empty_token_is_an_auth_error() {
        let err = PolecatConfig::new("  ").validate().unwrap_err();
        assert!(matches!(err, PolecatError::Auth(_)));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = PolecatConfig::new("token")
            .with_page_size(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, PolecatError::Config(_)));
    }
}
