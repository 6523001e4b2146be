//! The session operations the runner needs, as a seam.
//!
//! `BrowserSession` is the production implementation; tests drive the runner
//! with a scripted in-memory implementation to verify ordering, teardown,
//! and isolation without a browser.

use std::time::Duration;

use async_trait::async_trait;

use crate::browser::{BrowserSession, ElementState, ScenarioError};
use crate::scenario::{Locator, WaitUntil};

/// One scenario's window onto its session.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Navigate to an absolute URL
    async fn navigate(
        &self,
        url: &str,
        wait: WaitUntil,
        timeout: Duration,
    ) -> Result<(), ScenarioError>;

    /// Read presence/visibility/text of the n-th match
    async fn query_state(
        &self,
        locator: &Locator,
        nth: usize,
    ) -> Result<ElementState, ScenarioError>;

    /// Count matching elements
    async fn count(&self, locator: &Locator) -> Result<usize, ScenarioError>;

    /// Click the n-th match (caller has established readiness)
    async fn click(&self, locator: &Locator, nth: usize) -> Result<(), ScenarioError>;

    /// Fill the n-th matching input with a value
    async fn fill(&self, locator: &Locator, nth: usize, value: &str)
        -> Result<(), ScenarioError>;

    /// Read an attribute of the n-th match
    async fn attribute(
        &self,
        locator: &Locator,
        nth: usize,
        name: &str,
    ) -> Result<Option<String>, ScenarioError>;

    /// Evaluate a page-side script
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, ScenarioError>;

    /// Full rendered body text
    async fn page_text(&self) -> Result<String, ScenarioError>;

    /// Whether any JavaScript dialog opened since the session started
    fn dialog_seen(&self) -> bool;

    /// Release the session. Called exactly once per scenario run.
    async fn close(&self) -> Result<(), ScenarioError>;
}

#[async_trait]
impl Driver for BrowserSession {
    async fn navigate(
        &self,
        url: &str,
        wait: WaitUntil,
        timeout: Duration,
    ) -> Result<(), ScenarioError> {
        BrowserSession::navigate(self, url, wait, timeout).await
    }

    async fn query_state(
        &self,
        locator: &Locator,
        nth: usize,
    ) -> Result<ElementState, ScenarioError> {
        BrowserSession::query_state(self, locator, nth).await
    }

    async fn count(&self, locator: &Locator) -> Result<usize, ScenarioError> {
        BrowserSession::count(self, locator).await
    }

    async fn click(&self, locator: &Locator, nth: usize) -> Result<(), ScenarioError> {
        BrowserSession::click(self, locator, nth).await
    }

    async fn fill(
        &self,
        locator: &Locator,
        nth: usize,
        value: &str,
    ) -> Result<(), ScenarioError> {
        BrowserSession::fill(self, locator, nth, value).await
    }

    async fn attribute(
        &self,
        locator: &Locator,
        nth: usize,
        name: &str,
    ) -> Result<Option<String>, ScenarioError> {
        BrowserSession::attribute(self, locator, nth, name).await
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, ScenarioError> {
        BrowserSession::evaluate(self, script).await
    }

    async fn page_text(&self) -> Result<String, ScenarioError> {
        BrowserSession::page_text(self).await
    }

    fn dialog_seen(&self) -> bool {
        BrowserSession::dialog_seen(self)
    }

    async fn close(&self) -> Result<(), ScenarioError> {
        BrowserSession::close(self).await
    }
}
