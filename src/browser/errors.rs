//! Scenario error types

use thiserror::Error;

/// Errors raised while acquiring a session or executing a step. Any of these
/// aborts the remaining steps of the current scenario only; session teardown
/// still runs.
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Failed to acquire browser session: {0}")]
    ResourceAcquisitionFailed(String),

    #[error("Navigation to {url} timed out after {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Element matching {selector} not ready for {action}")]
    ElementNotReady { selector: String, action: String },

    #[error("Unexpected dialog: {0}")]
    UnexpectedDialog(String),

    #[error("Script evaluation failed: {0}")]
    Evaluation(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Invalid scenario: {0}")]
    Config(String),

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
