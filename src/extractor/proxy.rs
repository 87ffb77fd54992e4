//! Proxy URL validation
//!
//! Proxies are passed to the extractor as a URL string
//! (`scheme://[user:pass@]host:port`). They are checked once, when the
//! configuration or command line is parsed, so a typo surfaces immediately
//! instead of as an extraction failure.

use std::fmt;
use thiserror::Error;
use url::Url;

/// Schemes the extractor accepts for `--proxy`
pub const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "socks4", "socks5", "socks5h"];

/// A proxy string that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid proxy '{input}': {reason}")]
pub struct InvalidProxy {
    /// The rejected input (credentials included, do not log)
    pub input: String,
    /// Why it was rejected
    pub reason: String,
}

/// A validated proxy URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyUrl(Url);

impl ProxyUrl {
    /// Parse and validate a proxy URL
    pub fn parse(input: &str) -> Result<Self, InvalidProxy> {
        let invalid = |reason: String| InvalidProxy {
            input: input.to_string(),
            reason,
        };

        let url = Url::parse(input.trim()).map_err(|e| invalid(e.to_string()))?;

        if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
            return Err(invalid(format!(
                "unsupported scheme '{}' (expected one of {})",
                url.scheme(),
                SUPPORTED_SCHEMES.join(", ")
            )));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host".into()));
        }
        if url.port_or_known_default().is_none() {
            return Err(invalid("missing port".into()));
        }

        Ok(Self(url))
    }

    /// URL as handed to the extractor
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// URL with the password masked, for logs
    pub fn redacted(&self) -> String {
        let mut url = self.0.clone();
        if url.password().is_some() {
            // set_password only fails for cannot-be-a-base URLs, which parse() rejects
            let _ = url.set_password(Some("***"));
        }
        url.to_string()
    }
}

impl fmt::Display for ProxyUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl std::str::FromStr for ProxyUrl {
    type Err = InvalidProxy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
