//! The shared `reqwest` client and status handling.

use std::time::Duration;

use metaflask_common_config::HttpSettings;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::debug;

/// Settings applied when the client is built.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    /// Upper bound for a whole request, body included.
    pub request_timeout: Duration,
    /// GitHub rejects requests without a user agent.
    pub user_agent: String,
    pub idle_connections_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig::from(&HttpSettings::default())
    }
}

impl From<&HttpSettings> for HttpConfig {
    fn from(settings: &HttpSettings) -> Self {
        Self {
            connect_timeout: settings.connect_timeout(),
            request_timeout: settings.request_timeout(),
            user_agent: format!("metaflask/{}", env!("CARGO_PKG_VERSION")),
            idle_connections_per_host: 4,
        }
    }
}

/// Transport failures and non-success statuses.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("could not set up the HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("server answered {status}")]
    ServerError { status: u16, body: String },

    #[error("request rejected with {status}: {body}")]
    ClientError { status: u16, body: String },
}

impl HttpError {
    /// Status code behind the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerError { status, .. } | Self::ClientError { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
            Self::ClientBuild(_) | Self::Request(_) | Self::Timeout => None,
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        match err.is_timeout() {
            true => Self::Timeout,
            false => Self::Request(err),
        }
    }
}

/// Cheaply cloneable handle to one connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(HttpConfig::default())
    }

    pub fn with_config(config: HttpConfig) -> Result<Self, HttpError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent)
            .pool_max_idle_per_host(config.idle_connections_per_host)
            .gzip(true)
            .build()
            .map_err(HttpError::ClientBuild)?;
        Ok(Self { client })
    }

    /// Start a request; finish it with [`HttpClient::send`].
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Send a prepared request. The status is not checked.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, HttpError> {
        let response = request.send().await?;
        debug!(status = %response.status(), url = %response.url(), "response received");
        Ok(response)
    }

    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        self.send(self.request(Method::GET, url)).await
    }

    /// Pass 2xx responses through and turn everything else into an error,
    /// keeping the body for diagnostics.
    pub async fn check_response(response: Response) -> Result<Response, HttpError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse().ok())
                .map(Duration::from_secs);
            return Err(HttpError::RateLimited { retry_after });
        }

        let code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(if status.is_server_error() {
            HttpError::ServerError { status: code, body }
        } else {
            HttpError::ClientError { status: code, body }
        })
    }
}
