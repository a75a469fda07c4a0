// src/error.rs

//! Error types for every layer of the notifier.
//!
//! Each collaborator gets its own enum so callers can tell a fatal
//! configuration problem apart from a transient one.

use std::path::PathBuf;

use thiserror::Error;

/// Startup configuration problems. Always fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("invalid proxy URL '{url}': {reason}")]
    InvalidProxy { url: String, reason: String },

    #[error("--proxy is only valid together with --telegram")]
    ProxyWithoutTelegram,

    #[error("reading feed list {path}: {source}")]
    FeedList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("building HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl ConfigError {
    pub fn invalid_proxy(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidProxy {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Keyword rule file could not be turned into a rule set.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("reading rule file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decoding rule file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("decoding rule file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid pattern '{pattern}' in group '{group}': {source}")]
    Pattern {
        group: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown thread ID key '{key}' in group '{group}'")]
    UnknownDestination { group: String, key: String },
}

/// Fetching or decoding a single feed failed.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed returned status {0}")]
    Status(u16),

    #[error("feed XML could not be parsed as RSS or Atom: {0}")]
    Parse(String),
}

/// Seen-item store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single send attempt did not get an HTTP response back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}
