//! Remote store configuration.
//!
//! Values arrive from the command line (or their environment fallbacks, see
//! `main.rs`) and are validated here into a typed [`ApiConfig`].

use reqwest::Url;

pub const DEFAULT_BASE_URL: &str = "https://67d8e3ac00348dd3e2a88e28.mockapi.io/api/group12/group12";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("{name} must be greater than zero")]
    ZeroTimeout { name: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Collection URL without a trailing slash. Item URLs are `{base_url}/{id}`.
    pub base_url: String,
    pub timeouts: Timeouts,
}

impl ApiConfig {
    /// Validate a base URL and timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the URL is not absolute http(s) or a timeout is zero.
    pub fn new(base_url: &str, timeouts: Timeouts) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(base_url)?;
        if timeouts.request_secs == 0 {
            return Err(ConfigError::ZeroTimeout { name: "request timeout" });
        }
        if timeouts.connect_secs == 0 {
            return Err(ConfigError::ZeroTimeout { name: "connect timeout" });
        }
        Ok(Self { base_url, timeouts })
    }

    /// URL of a single record.
    #[must_use]
    pub fn item_url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, id)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_owned(), timeouts: Timeouts::default() }
    }
}

fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = |reason: String| ConfigError::InvalidBaseUrl { url: raw.to_owned(), reason };

    let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query strings and fragments are not supported".to_owned()));
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
