use std::time::Duration;
use thiserror::Error;

/// Listing fetched by default: the top-rated movie chart.
pub const DEFAULT_URL: &str = "https://www.imdb.com/chart/top/";

/// Browser identity sent with the request; the listing site rejects the
/// default client string.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how to fetch the listing page.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            url: DEFAULT_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Fetch the listing page once. There is no retry: any failure is returned
/// to the caller, which decides whether a checkpoint can stand in.
pub async fn fetch_listing(config: &FetchConfig) -> Result<String, FetchError> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout)
        .build()
        .map_err(FetchError::Client)?;

    let response = client
        .get(&config.url)
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: config.url.clone(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: config.url.clone(),
            status,
        });
    }

    response.text().await.map_err(|source| FetchError::Body {
        url: config.url.clone(),
        source,
    })
}
