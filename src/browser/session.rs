//! Browser session management
//!
//! Launches and controls one disposable Chrome instance. A session is owned
//! by exactly one scenario run: created at scenario start, torn down at
//! scenario end on every exit path, never shared or reused.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::HeadlessMode;
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::ScenarioError;
use crate::scenario::{Locator, Query, WaitUntil};
use crate::RunnerConfig;

/// Find Chrome/Chromium executable on the system
fn find_chrome() -> Option<PathBuf> {
    let candidates: Vec<PathBuf> = if cfg!(target_os = "windows") {
        let mut paths = vec![
            PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
            PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
        ];
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            paths.push(PathBuf::from(format!(
                r"{}\Google\Chrome\Application\chrome.exe",
                local
            )));
        }
        paths
    } else if cfg!(target_os = "macos") {
        vec![PathBuf::from(
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        )]
    } else {
        vec![
            PathBuf::from("/usr/bin/chromium"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/google-chrome-stable"),
        ]
    };

    candidates.into_iter().find(|p| p.exists())
}

/// Configuration for a browser session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Path to Chrome/Chromium executable
    pub chrome_path: Option<String>,
    /// Run in headless mode
    pub headless: bool,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
    /// Launch timeout in seconds
    pub launch_timeout_secs: u64,
    /// Best-effort post-navigation settle wait in seconds
    pub settle_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            window_width: 1280,
            window_height: 720,
            launch_timeout_secs: 30,
            settle_timeout_secs: 3,
        }
    }
}

impl SessionConfig {
    /// Derive a session config from the environment-level runner config
    pub fn from_runner(config: &RunnerConfig) -> Self {
        Self {
            chrome_path: config.chrome_path.clone(),
            headless: config.headless,
            window_width: config.window_width,
            window_height: config.window_height,
            settle_timeout_secs: config.settle_timeout_secs,
            ..Default::default()
        }
    }
}

/// Observable state of one located element, read in a single page-side pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementState {
    /// Element exists in the document
    pub present: bool,
    /// Element occupies visible layout space
    pub visible: bool,
    /// Rendered text, when present
    pub text: Option<String>,
}

impl ElementState {
    /// State reported when the locator matches nothing
    pub fn missing() -> Self {
        Self {
            present: false,
            visible: false,
            text: None,
        }
    }
}

/// An isolated, disposable browser execution context.
pub struct BrowserSession {
    /// Unique session ID
    pub id: String,
    /// The browser instance
    browser: Arc<RwLock<Option<Browser>>>,
    /// The single page this session drives
    page: Arc<RwLock<Option<Page>>>,
    /// Whether the session is alive (Chrome connected)
    alive: Arc<AtomicBool>,
    /// Set when any JavaScript dialog opened on the page
    dialog_seen: Arc<AtomicBool>,
    /// Per-session temporary user data directory, removed on close
    data_dir: PathBuf,
    /// Settle wait applied after commit-level navigations
    settle_timeout: Duration,
}

impl BrowserSession {
    /// Launch a fresh Chrome instance with its own user data directory.
    pub async fn launch(config: SessionConfig) -> Result<Self, ScenarioError> {
        let id = uuid::Uuid::new_v4().to_string();
        let data_dir = std::env::temp_dir().join("folio-probe").join(&id);
        std::fs::create_dir_all(&data_dir)?;

        info!("Launching browser session {} (headless: {})", id, config.headless);

        let chrome_path = match config.chrome_path.clone().map(PathBuf::from) {
            Some(path) => path,
            None => find_chrome().ok_or_else(|| {
                ScenarioError::ResourceAcquisitionFailed(
                    "Chrome/Chromium executable not found; set --chrome or install Chrome".into(),
                )
            })?,
        };
        debug!("Using Chrome at {}", chrome_path.display());

        let mut builder = BrowserConfig::builder()
            .chrome_executable(&chrome_path)
            .user_data_dir(&data_dir)
            .window_size(config.window_width, config.window_height)
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-background-networking")
            .arg("--disable-notifications")
            .arg("--no-sandbox");

        builder = if config.headless {
            builder.headless_mode(HeadlessMode::New)
        } else {
            builder.with_head()
        };

        let browser_config = builder
            .build()
            .map_err(ScenarioError::ResourceAcquisitionFailed)?;

        let launch_timeout = Duration::from_secs(config.launch_timeout_secs);
        let (browser, mut handler) =
            tokio::time::timeout(launch_timeout, Browser::launch(browser_config))
                .await
                .map_err(|_| {
                    ScenarioError::ResourceAcquisitionFailed(format!(
                        "browser launch timed out after {}s",
                        config.launch_timeout_secs
                    ))
                })?
                .map_err(|e| ScenarioError::ResourceAcquisitionFailed(e.to_string()))?;

        // Drive the CDP event loop; when it ends, Chrome has disconnected.
        let alive = Arc::new(AtomicBool::new(true));
        let alive_for_handler = alive.clone();
        let handler_id = id.clone();
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    debug!("Session {} handler event error: {:?}", handler_id, event);
                }
            }
            warn!("Session {} Chrome disconnected (event handler ended)", handler_id);
            alive_for_handler.store(false, Ordering::Relaxed);
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScenarioError::ResourceAcquisitionFailed(e.to_string()))?;

        // Auto-dismiss dialogs and record that one fired; an alert firing at
        // all is an observable the sanitization assertions check for.
        let dialog_seen = Arc::new(AtomicBool::new(false));
        let mut dialogs = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(|e| ScenarioError::ResourceAcquisitionFailed(e.to_string()))?;
        let dialog_flag = dialog_seen.clone();
        let dialog_page = page.clone();
        let dialog_session = id.clone();
        tokio::spawn(async move {
            while let Some(event) = dialogs.next().await {
                warn!(
                    "Session {} dialog opened: {:?} ({})",
                    dialog_session, event.r#type, event.message
                );
                dialog_flag.store(true, Ordering::Relaxed);
                if let Err(e) = dialog_page
                    .execute(HandleJavaScriptDialogParams::new(false))
                    .await
                {
                    warn!("Session {} failed to dismiss dialog: {}", dialog_session, e);
                }
            }
        });

        info!("Browser session {} created", id);

        Ok(Self {
            id,
            browser: Arc::new(RwLock::new(Some(browser))),
            page: Arc::new(RwLock::new(Some(page))),
            alive,
            dialog_seen,
            data_dir,
            settle_timeout: Duration::from_secs(config.settle_timeout_secs),
        })
    }

    /// Check if the session is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    /// Whether any JavaScript dialog opened since launch
    pub fn dialog_seen(&self) -> bool {
        self.dialog_seen.load(Ordering::Relaxed)
    }

    async fn page(&self) -> Result<Page, ScenarioError> {
        if !self.is_alive() {
            return Err(ScenarioError::ConnectionLost(format!(
                "session {} Chrome disconnected",
                self.id
            )));
        }
        self.page
            .read()
            .await
            .clone()
            .ok_or_else(|| ScenarioError::ConnectionLost("no active page".into()))
    }

    /// Navigate to a URL. `Commit` resolves once the navigate call returns;
    /// `DomContentLoaded` also waits for the navigation lifecycle within the
    /// same timeout. After a commit-level navigation a best-effort settle
    /// wait runs with its own short timeout and its failure is swallowed:
    /// slow sub-resources must not abort an otherwise-successful navigation.
    pub async fn navigate(
        &self,
        url: &str,
        wait: WaitUntil,
        timeout: Duration,
    ) -> Result<(), ScenarioError> {
        let page = self.page().await?;
        let timeout_secs = timeout.as_secs();

        debug!("Session {} navigating to {}", self.id, url);
        tokio::time::timeout(timeout, page.goto(url))
            .await
            .map_err(|_| ScenarioError::NavigationTimeout {
                url: url.to_string(),
                timeout_secs,
            })?
            .map_err(|e| ScenarioError::NavigationFailed(e.to_string()))?;

        match wait {
            WaitUntil::DomContentLoaded => {
                tokio::time::timeout(timeout, page.wait_for_navigation())
                    .await
                    .map_err(|_| ScenarioError::NavigationTimeout {
                        url: url.to_string(),
                        timeout_secs,
                    })?
                    .map_err(|e| ScenarioError::NavigationFailed(e.to_string()))?;
            }
            WaitUntil::Commit => {
                match tokio::time::timeout(self.settle_timeout, page.wait_for_navigation()).await
                {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => {
                        debug!("Session {} settle wait after {} skipped: {}", self.id, url, e)
                    }
                    Err(_) => debug!(
                        "Session {} page not settled after {:?}, continuing",
                        self.id, self.settle_timeout
                    ),
                }
            }
        }

        Ok(())
    }

    /// Resolve a locator to its n-th matching element. Zero matches is not
    /// an error here; it is deferred to whatever operation needed the
    /// element.
    async fn find_nth(
        &self,
        locator: &Locator,
        nth: usize,
    ) -> Result<Option<Element>, ScenarioError> {
        let page = self.page().await?;
        let elements = match locator.to_query() {
            Query::Css(selector) => page.find_elements(selector).await,
            Query::XPath(xpath) => page.find_xpaths(xpath).await,
        };
        match elements {
            Ok(elements) => Ok(elements.into_iter().nth(nth)),
            // The DOM query itself reporting "nothing matched" is a deferred
            // zero-match, not a transport failure.
            Err(chromiumoxide::error::CdpError::NotFound) => Ok(None),
            Err(e) => Err(ScenarioError::Evaluation(e.to_string())),
        }
    }

    /// Read presence/visibility/text of the n-th match in one pass.
    pub async fn query_state(
        &self,
        locator: &Locator,
        nth: usize,
    ) -> Result<ElementState, ScenarioError> {
        let page = self.page().await?;
        let script = format!(
            r#"(function() {{
                const el = {resolve};
                if (!el) return {{ present: false, visible: false, text: null }};
                const rect = el.getBoundingClientRect();
                const style = window.getComputedStyle(el);
                return {{
                    present: true,
                    visible: rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden',
                    text: el.innerText !== undefined ? el.innerText : el.textContent
                }};
            }})()"#,
            resolve = js_resolve(&locator.to_query(), nth)
        );
        page.evaluate(script)
            .await
            .map_err(|e| ScenarioError::Evaluation(e.to_string()))?
            .into_value::<ElementState>()
            .map_err(|e| ScenarioError::Evaluation(e.to_string()))
    }

    /// Count elements matching a locator.
    pub async fn count(&self, locator: &Locator) -> Result<usize, ScenarioError> {
        let page = self.page().await?;
        let script = match locator.to_query() {
            Query::Css(selector) => {
                format!("document.querySelectorAll({}).length", js_string(&selector))
            }
            Query::XPath(xpath) => format!(
                "document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength",
                js_string(&xpath)
            ),
        };
        page.evaluate(script)
            .await
            .map_err(|e| ScenarioError::Evaluation(e.to_string()))?
            .into_value::<usize>()
            .map_err(|e| ScenarioError::Evaluation(e.to_string()))
    }

    /// Click the n-th element matching the locator.
    pub async fn click(&self, locator: &Locator, nth: usize) -> Result<(), ScenarioError> {
        let element = self
            .find_nth(locator, nth)
            .await?
            .ok_or_else(|| ScenarioError::ElementNotFound(locator.to_string()))?;

        element
            .click()
            .await
            .map_err(|_| ScenarioError::ElementNotReady {
                selector: locator.to_string(),
                action: "click".into(),
            })?;

        debug!("Session {} clicked {}", self.id, locator);
        Ok(())
    }

    /// Fill the n-th matching input or textarea. Drives the native value
    /// setter and fires input/change so framework-bound forms observe it.
    pub async fn fill(
        &self,
        locator: &Locator,
        nth: usize,
        value: &str,
    ) -> Result<(), ScenarioError> {
        let element = self
            .find_nth(locator, nth)
            .await?
            .ok_or_else(|| ScenarioError::ElementNotFound(locator.to_string()))?;

        let function = format!(
            r#"function() {{
                const value = {value};
                this.focus();
                const proto = this instanceof HTMLTextAreaElement
                    ? HTMLTextAreaElement.prototype
                    : HTMLInputElement.prototype;
                const desc = Object.getOwnPropertyDescriptor(proto, 'value');
                if (desc && desc.set) {{
                    desc.set.call(this, value);
                }} else {{
                    this.value = value;
                }}
                this.dispatchEvent(new Event('input', {{ bubbles: true }}));
                this.dispatchEvent(new Event('change', {{ bubbles: true }}));
            }}"#,
            value = js_string(value)
        );

        element
            .call_js_fn(function, false)
            .await
            .map_err(|_| ScenarioError::ElementNotReady {
                selector: locator.to_string(),
                action: "fill".into(),
            })?;

        debug!("Session {} filled {}", self.id, locator);
        Ok(())
    }

    /// Read an attribute of the n-th matching element.
    pub async fn attribute(
        &self,
        locator: &Locator,
        nth: usize,
        name: &str,
    ) -> Result<Option<String>, ScenarioError> {
        let page = self.page().await?;
        let script = format!(
            r#"(function() {{
                const el = {resolve};
                return el ? el.getAttribute({name}) : null;
            }})()"#,
            resolve = js_resolve(&locator.to_query(), nth),
            name = js_string(name)
        );
        page.evaluate(script)
            .await
            .map_err(|e| ScenarioError::Evaluation(e.to_string()))?
            .into_value::<Option<String>>()
            .map_err(|e| ScenarioError::Evaluation(e.to_string()))
    }

    /// Execute JavaScript on the page and return its JSON value.
    pub async fn evaluate(&self, script: &str) -> Result<serde_json::Value, ScenarioError> {
        let page = self.page().await?;
        let result = page
            .evaluate(script.to_string())
            .await
            .map_err(|e| ScenarioError::Evaluation(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    /// Full rendered text of the document body.
    pub async fn page_text(&self) -> Result<String, ScenarioError> {
        let page = self.page().await?;
        page.evaluate("document.body ? document.body.innerText : ''")
            .await
            .map_err(|e| ScenarioError::Evaluation(e.to_string()))?
            .into_value::<String>()
            .map_err(|e| ScenarioError::Evaluation(e.to_string()))
    }

    /// Close the browser session. Safe to call when Chrome already died;
    /// always removes the session's user data directory.
    pub async fn close(&self) -> Result<(), ScenarioError> {
        self.alive.store(false, Ordering::Relaxed);

        {
            let mut page = self.page.write().await;
            if let Some(p) = page.take() {
                let _ = p.close().await;
            }
        }

        {
            let mut browser = self.browser.write().await;
            if let Some(mut b) = browser.take() {
                // Graceful close first, brief grace period, then force kill
                // so no Chrome child processes outlive the scenario.
                let _ = b.close().await;
                tokio::time::sleep(Duration::from_millis(500)).await;
                let _ = b.kill().await;
            }
        }

        if let Err(e) = std::fs::remove_dir_all(&self.data_dir) {
            debug!("Session {} data dir cleanup failed: {}", self.id, e);
        }

        info!("Browser session {} closed", self.id);
        Ok(())
    }
}

/// Quote a Rust string as a JavaScript string literal.
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}

/// JS expression resolving a query to its n-th matching element (or
/// undefined/null when there are fewer matches).
fn js_resolve(query: &Query, nth: usize) -> String {
    match query {
        Query::Css(selector) => {
            format!("document.querySelectorAll({})[{}]", js_string(selector), nth)
        }
        Query::XPath(xpath) => format!(
            "document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotItem({})",
            js_string(xpath),
            nth
        ),
    }
}
