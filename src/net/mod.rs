//! Out-of-band HTTP checks against the target application
//!
//! Navigation responses are not observable through the page API alone, so
//! scenarios that assert on status codes, headers, or JSON bodies issue the
//! same request directly and capture the exchange for their assertions.

mod client;

pub use client::{ApiClient, CapturedResponse};
