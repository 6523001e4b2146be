//! folio-probe
//!
//! Declarative end-to-end scenario runner for the portfolio site. Each
//! scenario owns a freshly launched headless Chrome session, executes its
//! steps strictly in order, evaluates its assertions against the final page
//! state and any captured HTTP responses, and tears the session down on
//! every exit path.

pub mod browser;
pub mod net;
pub mod runner;
pub mod scenario;

use std::path::PathBuf;

/// Environment-level configuration shared by every scenario run.
///
/// A scenario never overrides these globally; per-step timeouts in the
/// scenario file take precedence over the defaults here.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerConfig {
    /// Base URL of the application under test
    pub base_url: String,
    /// Run Chrome in headless mode
    pub headless: bool,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
    /// Default timeout for element readiness and HTTP calls, in seconds
    pub default_timeout_secs: u64,
    /// Default navigation timeout, in seconds
    pub nav_timeout_secs: u64,
    /// Best-effort post-navigation settle wait, in seconds (failure swallowed)
    pub settle_timeout_secs: u64,
    /// Path to Chrome/Chromium executable (auto-detected when unset)
    pub chrome_path: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            headless: true,
            window_width: 1280,
            window_height: 720,
            default_timeout_secs: 5,
            nav_timeout_secs: 10,
            settle_timeout_secs: 3,
            chrome_path: None,
        }
    }
}

impl RunnerConfig {
    /// Set the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the default element/HTTP timeout
    pub fn timeout(mut self, secs: u64) -> Self {
        self.default_timeout_secs = secs;
        self
    }

    /// Set the navigation timeout
    pub fn nav_timeout(mut self, secs: u64) -> Self {
        self.nav_timeout_secs = secs;
        self
    }

    /// Set Chrome path
    pub fn chrome_path(mut self, path: Option<String>) -> Self {
        self.chrome_path = path;
        self
    }
}

/// Get log directory path (shared across modules)
pub fn log_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("folio-probe").join("logs"))
}

/// Initialize logging: console layer plus a daily rolling file when a log
/// directory is available. Returns the appender guard that must be held for
/// the lifetime of the process.
pub fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false);

    if let Some(log_dir) = log_dir() {
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "folio-probe.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(non_blocking);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        None
    }
}
