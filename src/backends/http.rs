//! HTTP prober backed by reqwest.
//!
//! Every probe is a plain `GET` with the configured default headers.
//! Redirects are followed, a final `403 Forbidden` is reported as
//! [`ProbeOutcome::RateLimited`], and every other status counts as an
//! answer whose body is checked for reflection.

use crate::core::{ProbeOutcome, Prober, ReflexError};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{redirect, Client, StatusCode};
use std::time::Duration;

/// Default User-Agent sent with every probe.
pub const DEFAULT_USER_AGENT: &str = concat!("reflex/", env!("CARGO_PKG_VERSION"));

/// Configuration for [`HttpProber`].
#[derive(Debug, Clone)]
pub struct HttpProberConfig {
    /// Whole-request timeout, body included.
    pub timeout: Duration,

    /// User-Agent header value.
    pub user_agent: String,

    /// Extra headers applied after the User-Agent, so they can replace it.
    pub headers: Vec<(String, String)>,

    /// Maximum redirects followed per probe.
    pub max_redirects: usize,
}

impl Default for HttpProberConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: Vec::new(),
            max_redirects: 10,
        }
    }
}

impl HttpProberConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds a header given as `"Name: Value"`.
    ///
    /// # Errors
    ///
    /// Returns [`ReflexError::InvalidHeader`] if there is no colon or the
    /// name is empty.
    pub fn with_raw_header(self, raw: &str) -> Result<Self, ReflexError> {
        let (name, value) = parse_header(raw)?;
        Ok(self.with_header(name, value))
    }

    /// Sets the redirect limit.
    pub fn with_max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }
}

/// Splits `"Name: Value"` at the first colon and trims both halves.
///
/// # Errors
///
/// Returns [`ReflexError::InvalidHeader`] if there is no colon or the name
/// is empty after trimming.
pub fn parse_header(raw: &str) -> Result<(String, String), ReflexError> {
    let Some((name, value)) = raw.split_once(':') else {
        return Err(ReflexError::invalid_header(raw, "expected 'Name: Value'"));
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(ReflexError::invalid_header(raw, "empty header name"));
    }

    Ok((name.to_string(), value.trim().to_string()))
}

/// Issues probe requests over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    config: HttpProberConfig,
}

impl HttpProber {
    /// Builds the prober and its connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`ReflexError::InvalidHeader`] if a header name or value is
    /// not legal HTTP, or [`ReflexError::Configuration`] if the client
    /// cannot be built.
    pub fn new(config: HttpProberConfig) -> Result<Self, ReflexError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| ReflexError::invalid_header(&config.user_agent, e.to_string()))?,
        );

        for (name, value) in &config.headers {
            let raw = format!("{}: {}", name, value);
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ReflexError::invalid_header(&raw, e.to_string()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| ReflexError::invalid_header(&raw, e.to_string()))?;
            headers.insert(header_name, header_value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .default_headers(headers)
            .build()
            .map_err(|e| {
                ReflexError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    /// Creates a prober with default settings.
    ///
    /// # Errors
    ///
    /// See [`HttpProber::new`].
    pub fn with_defaults() -> Result<Self, ReflexError> {
        Self::new(HttpProberConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HttpProberConfig {
        &self.config
    }

    fn map_error(&self, url: &str, error: reqwest::Error) -> ReflexError {
        if error.is_timeout() {
            ReflexError::timeout(url, self.config.timeout)
        } else {
            ReflexError::transport(url, error.to_string())
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    fn name(&self) -> &str {
        "http"
    }

    async fn probe(&self, url: &str) -> ProbeOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return ProbeOutcome::TransportError(self.map_error(url, e)),
        };

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return ProbeOutcome::RateLimited;
        }

        match response.bytes().await {
            Ok(body) => ProbeOutcome::success(status.as_u16(), body.to_vec()),
            Err(e) => ProbeOutcome::TransportError(self.map_error(url, e)),
        }
    }
}
