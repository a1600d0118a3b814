//! Client configuration.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::feed_store::DEFAULT_HISTORY_LIMIT;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid origin: {0}")]
    InvalidOrigin(#[from] url::ParseError),
    #[error("Unsupported origin scheme: {0}")]
    UnsupportedScheme(String),
    #[error("Origin cannot carry a path: {0}")]
    NotABase(String),
}

/// Origin the dashboard is served from.
///
/// Socket endpoints are derived from it: an `https` origin yields `wss`
/// endpoints, an `http` origin yields `ws`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Origin {
    url: Url,
}

impl Origin {
    /// Parse an origin such as `https://dashboard.example.com`.
    ///
    /// # Errors
    /// Returns error if the URL is invalid or not http(s)/ws(s).
    pub fn parse(origin: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(origin)?;
        match url.scheme() {
            "http" | "https" | "ws" | "wss" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
        if url.cannot_be_a_base() {
            return Err(ConfigError::NotABase(origin.to_string()));
        }
        Ok(Self { url })
    }

    /// Whether the origin is served over TLS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        matches!(self.url.scheme(), "https" | "wss")
    }

    /// Socket endpoint for `segments` under this origin.
    ///
    /// # Errors
    /// Returns error if the origin cannot carry a path.
    pub fn websocket_url(&self, segments: &[&str]) -> Result<Url, ConfigError> {
        let mut url = self.url.clone();
        let scheme = if self.is_secure() { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| ConfigError::UnsupportedScheme(scheme.to_string()))?;
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| ConfigError::NotABase(self.url.to_string()))?
            .clear()
            .extend(segments);
        Ok(url)
    }
}

impl TryFrom<String> for Origin {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        origin.url.into()
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.url.fmt(f)
    }
}

/// Reconnect backoff bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay before the first reconnect, and after every successful open.
    pub initial_ms: u64,
    /// Ceiling for the doubled delay.
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_ms: 1000,
            max_ms: 30_000,
        }
    }
}

impl BackoffConfig {
    #[must_use]
    pub const fn initial(&self) -> Duration {
        Duration::from_millis(self.initial_ms)
    }

    #[must_use]
    pub const fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

/// Marketplace event feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub origin: Origin,
    /// Path segments of the feed endpoint.
    #[serde(default = "default_feed_path")]
    pub path: Vec<String>,
    /// Retained recent events.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default)]
    pub backoff: BackoffConfig,
}

fn default_feed_path() -> Vec<String> {
    vec!["ws".to_string(), "events".to_string()]
}

const fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl FeedConfig {
    /// Feed configuration with default path, history and backoff.
    #[must_use]
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            path: default_feed_path(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            backoff: BackoffConfig::default(),
        }
    }

    /// Set the retained history size.
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Set the backoff bounds.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Feed endpoint URL.
    ///
    /// # Errors
    /// Returns error if the origin cannot carry a path.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let segments: Vec<&str> = self.path.iter().map(String::as_str).collect();
        self.origin.websocket_url(&segments)
    }
}

/// A2UI session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub origin: Origin,
    pub agent_id: String,
    /// Auth token passed as the `token` query parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// How long `connect` waits for the handshake reply.
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
}

const fn default_handshake_timeout_ms() -> u64 {
    10_000
}

impl SessionConfig {
    #[must_use]
    pub fn new(origin: Origin, agent_id: impl Into<String>) -> Self {
        Self {
            origin,
            agent_id: agent_id.into(),
            token: None,
            handshake_timeout_ms: default_handshake_timeout_ms(),
        }
    }

    /// Set the auth token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the handshake timeout.
    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub const fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Session endpoint URL: `/ws/a2ui/{agent_id}?token=...`.
    ///
    /// # Errors
    /// Returns error if the origin cannot carry a path.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let mut url = self
            .origin
            .websocket_url(&["ws", "a2ui", self.agent_id.as_str()])?;
        if let Some(token) = &self.token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_mirrors_origin_security() {
        let secure = tokio_test::assert_ok!(Origin::parse("https://dash.example.com"));
        let plain = Origin::parse("http://localhost:8080").unwrap();

        let feed = FeedConfig::new(secure).endpoint().unwrap();
        assert_eq!(feed.as_str(), "wss://dash.example.com/ws/events");

        let feed = FeedConfig::new(plain).endpoint().unwrap();
        assert_eq!(feed.as_str(), "ws://localhost:8080/ws/events");
    }

    #[test]
    fn test_session_endpoint_carries_agent_and_token() {
        let origin = Origin::parse("https://dash.example.com/app?x=1").unwrap();
        let config = SessionConfig::new(origin, "agent 7").with_token("t0k");

        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "wss://dash.example.com/ws/a2ui/agent%207?token=t0k"
        );
    }

    #[test]
    fn test_rejects_unsupported_origin() {
        assert!(matches!(
            Origin::parse("ftp://example.com"),
            Err(ConfigError::UnsupportedScheme(_))
        ));
        assert!(Origin::parse("not a url").is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: FeedConfig =
            serde_json::from_str(r#"{"origin": "http://localhost:3000"}"#).unwrap();

        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
        assert_eq!(config.backoff, BackoffConfig::default());
        assert_eq!(config.backoff.max(), Duration::from_secs(30));
    }
}
