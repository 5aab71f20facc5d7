//! Error types for scroll-harvest
//!
//! Errors here only travel inside the crate: across the page seam and out of
//! browser lifecycle calls. The engine components turn every one of them into
//! an outcome value before it reaches a caller.

use thiserror::Error;

/// The main error type for scroll-harvest operations
#[derive(Error, Debug)]
pub enum Error {
    /// Browser lifecycle errors
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// DOM query and interaction errors
    #[error("Page error: {0}")]
    Page(#[from] PageError),

    /// Metadata extraction errors
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ChromiumOxide errors
    #[error("CDP error: {0}")]
    Cdp(String),
}

/// Browser lifecycle and control errors
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Failed to launch browser
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Browser configuration error
    #[error("Invalid browser configuration: {0}")]
    ConfigError(String),

    /// Failed to create new page/tab
    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),

    /// URL rejected before navigation
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Page load did not finish in time
    #[error("Page load timed out after {0}ms")]
    Timeout(u64),
}

/// Errors raised by a page handle while querying or driving the DOM
#[derive(Error, Debug)]
pub enum PageError {
    /// Selector query failed
    #[error("Query failed for '{selector}': {message}")]
    QueryFailed {
        /// Selector that was queried
        selector: String,
        /// Underlying failure
        message: String,
    },

    /// Element is stale or detached from the document
    #[error("Element detached: {0}")]
    Detached(String),

    /// Script evaluation failed or returned an unexpected shape
    #[error("Script evaluation failed: {0}")]
    ScriptFailed(String),

    /// Click/hover/scroll/focus failed
    #[error("Interaction failed: {0}")]
    InteractionFailed(String),

    /// No scrollable container could be resolved
    #[error("No scroll container found")]
    NoScrollContainer,
}

/// Metadata extraction errors
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A configured regex did not compile
    #[error("Invalid pattern '{name}': {message}")]
    InvalidPattern {
        /// Label of the offending pattern
        name: String,
        /// Compiler message
        message: String,
    },
}

/// Result type alias for scroll-harvest operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a CDP error from a string
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }

    /// Shorthand for a script evaluation failure
    pub fn script<S: Into<String>>(msg: S) -> Self {
        Error::Page(PageError::ScriptFailed(msg.into()))
    }
}

/// Convert chromiumoxide errors
impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}
