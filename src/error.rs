//! Domain errors surfaced in console and preview banners

use thiserror::Error;

/// Failures of an execution-console send. Each one stays local to its console.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("URL required")]
    UrlRequired,

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    /// The proxy itself failed; no target-server status is available
    #[error("{0}")]
    Proxy(String),

    #[error("Invalid response from proxy: {0}")]
    InvalidProxyReply(String),

    #[error("A request is already in flight")]
    Busy,
}

/// Failures while loading a linked document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreviewError {
    /// The preview endpoint answered with a non-success status
    #[error("{0}")]
    Rejected(String),

    #[error("Failed to fetch file: {0}")]
    Transport(String),
}
