//! HTTP request target
//!
//! One [`HttpTarget`] wraps one reqwest `Client` and is shared by every
//! worker of a burst, so all requests reuse the same connection pool.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT_ENCODING;
use reqwest::{Client, StatusCode, Url};

use burst_bench_core::{RequestError, RequestTarget, TargetConfig};

use crate::error::HttpError;

// ============================================================================
// HTTP Client Configuration
// ============================================================================

/// Configuration for the HTTP client behind a target.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Idle connection timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Per-request timeout (None = no bound)
    pub request_timeout: Option<Duration>,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// TCP keepalive interval
    pub tcp_keepalive: Option<Duration>,

    /// Accept invalid or self-signed certificates
    pub skip_tls_verify: bool,

    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 1024,
            request_timeout: None,
            connect_timeout: Duration::from_secs(30),
            tcp_keepalive: Some(Duration::from_secs(60)),
            skip_tls_verify: true,
            user_agent: format!("burst-bench/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    /// Client settings for a configured target
    pub fn from_target(target: &TargetConfig) -> Self {
        Self {
            request_timeout: target.request_timeout(),
            skip_tls_verify: target.skip_tls_verify,
            ..Self::default()
        }
    }

    /// Create config with custom request timeout.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Create config with custom connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Create config with TLS verification on or off.
    pub fn with_skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }

    fn build_client(&self) -> Result<Client, HttpError> {
        let mut builder = Client::builder()
            .pool_idle_timeout(self.pool_idle_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .connect_timeout(self.connect_timeout)
            .user_agent(&self.user_agent)
            .danger_accept_invalid_certs(self.skip_tls_verify);

        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(keepalive) = self.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        builder
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))
    }
}

// ============================================================================
// HTTP Target
// ============================================================================

/// A fixed URL fetched with plain GET requests.
///
/// A request succeeds only when the response status is exactly 200. The
/// body is drained so the connection can go back to the pool.
#[derive(Debug, Clone)]
pub struct HttpTarget {
    client: Client,
    url: Url,
    config: HttpConfig,
}

impl HttpTarget {
    /// Create a target for `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not an absolute http(s) URL or the
    /// client cannot be built.
    pub fn new(url: &str, config: &HttpConfig) -> Result<Self, HttpError> {
        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HttpError::InvalidUrl {
                url: url.to_string(),
                message: format!("unsupported scheme {:?}", parsed.scheme()),
            });
        }

        let client = config.build_client()?;

        tracing::debug!(
            url = %parsed,
            skip_tls_verify = config.skip_tls_verify,
            request_timeout_ms = config.request_timeout.map(|t| t.as_millis() as u64),
            "HTTP target ready"
        );

        Ok(Self {
            client,
            url: parsed,
            config: config.clone(),
        })
    }

    /// Create a target from the `[target]` configuration section.
    pub fn from_config(target: &TargetConfig) -> Result<Self, HttpError> {
        Self::new(&target.url, &HttpConfig::from_target(target))
    }

    /// Get the configuration this target was built with.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

#[async_trait]
impl RequestTarget for HttpTarget {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch(&self, _request_id: usize) -> Result<(), RequestError> {
        let response = self
            .client
            .get(self.url.clone())
            .header(ACCEPT_ENCODING, "gzip")
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();

        // Drain so the connection is reusable; body errors do not change
        // the outcome.
        if let Err(e) = response.bytes().await {
            tracing::trace!(error = %e, "Discarding unreadable response body");
        }

        if status != StatusCode::OK {
            return Err(RequestError::Status(status.as_u16()));
        }

        Ok(())
    }
}

/// Map a reqwest failure onto the request error taxonomy
fn classify(err: reqwest::Error) -> RequestError {
    if err.is_builder() {
        RequestError::Build(err.to_string())
    } else if err.is_timeout() {
        RequestError::Timeout
    } else {
        RequestError::Send(err.to_string())
    }
}
