//! Browser automation module
//!
//! Launching and controlling one disposable Chrome instance per scenario
//! over the Chrome DevTools Protocol.

mod errors;
mod session;

pub use errors::ScenarioError;
pub use session::{BrowserSession, ElementState, SessionConfig};
