//! Scenario runner
//!
//! Executes one scenario against one freshly acquired session: steps
//! strictly in declared order, assertions against the final observed state,
//! teardown on every exit path. The runner itself holds no state across
//! scenario invocations.

mod checks;
mod driver;
mod poll;

pub use driver::Driver;
pub use poll::{poll_until, PollError, PollPolicy};

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::browser::{BrowserSession, ElementState, ScenarioError, SessionConfig};
use crate::net::{ApiClient, CapturedResponse};
use crate::scenario::{Assertion, Locator, ReadyCondition, Scenario, Step};
use crate::RunnerConfig;

/// One assertion that did not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionFailure {
    pub check: String,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.check, self.expected, self.actual
        )
    }
}

/// Terminal result of a scenario run.
#[derive(Debug)]
pub enum Outcome {
    /// All steps completed and every assertion held
    Passed,
    /// Steps completed but one or more assertions failed
    Failed(Vec<AssertionFailure>),
    /// A step (or session acquisition) failed; remaining steps and the
    /// assertions were skipped
    Error {
        step: Option<String>,
        cause: ScenarioError,
    },
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    /// Process exit code contribution: 0 pass, 1 fail, 2 error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Passed => 0,
            Outcome::Failed(_) => 1,
            Outcome::Error { .. } => 2,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Passed => write!(f, "passed"),
            Outcome::Failed(failures) => write!(f, "failed ({} assertion(s))", failures.len()),
            Outcome::Error { step: Some(step), cause } => {
                write!(f, "error at {}: {}", step, cause)
            }
            Outcome::Error { step: None, cause } => write!(f, "error: {}", cause),
        }
    }
}

/// Report for one scenario run.
#[derive(Debug)]
pub struct RunReport {
    pub scenario: String,
    pub outcome: Outcome,
    pub steps_run: usize,
    pub steps_total: usize,
    pub duration: Duration,
}

/// Scenario lifecycle, traced per transition.
#[derive(Debug)]
enum Phase {
    Initialized,
    SessionAcquired,
    Executing(usize),
    Asserting,
    TornDown,
}

fn trace_phase(scenario: &str, phase: Phase) {
    debug!("scenario '{}' phase {:?}", scenario, phase);
}

/// Captures accumulated while steps execute; consumed by assertions.
#[derive(Default)]
struct StepContext {
    responses: HashMap<String, CapturedResponse>,
    values: HashMap<String, serde_json::Value>,
}

/// Runs scenarios against a target application. Stateless across runs;
/// every `run` acquires and releases its own session.
pub struct ScenarioRunner {
    config: RunnerConfig,
    api: ApiClient,
}

impl ScenarioRunner {
    pub fn new(config: RunnerConfig) -> Result<Self, ScenarioError> {
        let api = ApiClient::new(&config.base_url, config.default_timeout_secs)?;
        Ok(Self { config, api })
    }

    /// Run one scenario in a freshly launched browser session.
    pub async fn run(&self, scenario: &Scenario) -> RunReport {
        trace_phase(&scenario.name, Phase::Initialized);
        let started = Instant::now();

        let session = match BrowserSession::launch(SessionConfig::from_runner(&self.config)).await
        {
            Ok(session) => session,
            Err(cause) => {
                warn!("scenario '{}' session acquisition failed: {}", scenario.name, cause);
                return RunReport {
                    scenario: scenario.name.clone(),
                    outcome: Outcome::Error { step: None, cause },
                    steps_run: 0,
                    steps_total: scenario.steps.len(),
                    duration: started.elapsed(),
                };
            }
        };

        self.run_with(&session, scenario).await
    }

    /// Run one scenario against an already-acquired driver. The driver is
    /// closed exactly once before this returns, whatever the outcome.
    pub async fn run_with<D: Driver>(&self, driver: &D, scenario: &Scenario) -> RunReport {
        trace_phase(&scenario.name, Phase::SessionAcquired);
        let started = Instant::now();
        let steps_total = scenario.steps.len();

        let mut ctx = StepContext::default();
        let mut steps_run = 0;
        let mut step_error: Option<Outcome> = None;

        for (index, step) in scenario.steps.iter().enumerate() {
            trace_phase(&scenario.name, Phase::Executing(index));
            match self.execute_step(driver, scenario, step, &mut ctx).await {
                Ok(()) => steps_run += 1,
                Err(cause) => {
                    warn!(
                        "scenario '{}' step {} ({}) failed: {}",
                        scenario.name,
                        index + 1,
                        step.label(),
                        cause
                    );
                    step_error = Some(Outcome::Error {
                        step: Some(format!("step {} ({})", index + 1, step.label())),
                        cause,
                    });
                    break;
                }
            }
        }

        let outcome = match step_error {
            Some(outcome) => outcome,
            None => {
                trace_phase(&scenario.name, Phase::Asserting);
                match self.evaluate_assertions(driver, scenario, &ctx).await {
                    Ok(failures) if failures.is_empty() => Outcome::Passed,
                    Ok(failures) => Outcome::Failed(failures),
                    Err(cause) => Outcome::Error {
                        step: Some("assertions".to_string()),
                        cause,
                    },
                }
            }
        };

        // Teardown is unconditional and happens exactly once.
        if let Err(e) = driver.close().await {
            warn!("scenario '{}' teardown: {}", scenario.name, e);
        }
        trace_phase(&scenario.name, Phase::TornDown);

        info!("scenario '{}' {}", scenario.name, outcome);
        RunReport {
            scenario: scenario.name.clone(),
            outcome,
            steps_run,
            steps_total,
            duration: started.elapsed(),
        }
    }

    fn step_timeout(&self, timeout_secs: Option<u64>) -> Duration {
        Duration::from_secs(timeout_secs.unwrap_or(self.config.default_timeout_secs))
    }

    async fn execute_step<D: Driver>(
        &self,
        driver: &D,
        scenario: &Scenario,
        step: &Step,
        ctx: &mut StepContext,
    ) -> Result<(), ScenarioError> {
        match step {
            Step::Navigate { url, wait_until, timeout_secs } => {
                let target = self.api.resolve(url)?;
                let timeout =
                    Duration::from_secs(timeout_secs.unwrap_or(self.config.nav_timeout_secs));
                driver.navigate(target.as_str(), *wait_until, timeout).await?;
            }
            Step::Click { locator, nth, timeout_secs } => {
                self.await_ready(
                    driver,
                    locator,
                    *nth,
                    ReadyCondition::Visible,
                    self.step_timeout(*timeout_secs),
                    "click",
                )
                .await?;
                driver.click(locator, *nth).await?;
            }
            Step::Fill { locator, nth, value, timeout_secs } => {
                self.await_ready(
                    driver,
                    locator,
                    *nth,
                    ReadyCondition::Visible,
                    self.step_timeout(*timeout_secs),
                    "fill",
                )
                .await?;
                driver.fill(locator, *nth, value).await?;
            }
            Step::WaitFor { locator, nth, condition, timeout_secs } => {
                self.await_ready(
                    driver,
                    locator,
                    *nth,
                    *condition,
                    self.step_timeout(*timeout_secs),
                    "wait_for",
                )
                .await?;
            }
            Step::Pause { millis } => {
                tokio::time::sleep(Duration::from_millis(*millis)).await;
            }
            Step::Evaluate { script, capture } => {
                let value = driver.evaluate(script).await?;
                if let Some(name) = capture {
                    ctx.values.insert(name.clone(), value);
                }
            }
            Step::HttpGet { path, capture } => {
                let response = self.api.get(path).await?;
                ctx.responses.insert(capture.clone(), response);
            }
            Step::HttpPost { path, body, capture } => {
                let response = self.api.post_json(path, body).await?;
                ctx.responses.insert(capture.clone(), response);
            }
        }

        // A dialog firing mid-scenario is a hard failure unless the
        // scenario opted to observe dialogs through an assertion instead.
        if !scenario.allow_dialogs && driver.dialog_seen() {
            return Err(ScenarioError::UnexpectedDialog(
                "javascript dialog opened during step execution".into(),
            ));
        }

        Ok(())
    }

    /// Poll element state until the condition holds. On timeout, the last
    /// observed state decides between not-found and not-ready.
    async fn await_ready<D: Driver>(
        &self,
        driver: &D,
        locator: &Locator,
        nth: usize,
        condition: ReadyCondition,
        timeout: Duration,
        action: &str,
    ) -> Result<ElementState, ScenarioError> {
        let baseline = if condition == ReadyCondition::TextChanged {
            driver
                .query_state(locator, nth)
                .await?
                .text
                .unwrap_or_default()
        } else {
            String::new()
        };
        let baseline = &baseline;

        let policy = PollPolicy::within(timeout);
        let result = poll_until(&policy, || async move {
            let state = driver.query_state(locator, nth).await?;
            Ok::<_, ScenarioError>(condition_met(&state, condition, baseline).then_some(state))
        })
        .await;

        match result {
            Ok(state) => Ok(state),
            Err(PollError::Probe(e)) => Err(e),
            Err(PollError::Timeout(_)) => {
                let last = driver
                    .query_state(locator, nth)
                    .await
                    .unwrap_or_else(|_| ElementState::missing());
                if last.present {
                    Err(ScenarioError::ElementNotReady {
                        selector: locator.to_string(),
                        action: action.to_string(),
                    })
                } else {
                    Err(ScenarioError::ElementNotFound(locator.to_string()))
                }
            }
        }
    }

    /// Evaluate every assertion; failures are collected, not short-circuited.
    async fn evaluate_assertions<D: Driver>(
        &self,
        driver: &D,
        scenario: &Scenario,
        ctx: &StepContext,
    ) -> Result<Vec<AssertionFailure>, ScenarioError> {
        let mut failures = Vec::new();

        for assertion in &scenario.assertions {
            let result = self.evaluate_assertion(driver, assertion, ctx).await?;
            if let Err(failure) = result {
                failures.push(failure);
            }
        }

        Ok(failures)
    }

    async fn evaluate_assertion<D: Driver>(
        &self,
        driver: &D,
        assertion: &Assertion,
        ctx: &StepContext,
    ) -> Result<Result<(), AssertionFailure>, ScenarioError> {
        let result = match assertion {
            Assertion::ElementVisible { locator, nth } => {
                let state = driver.query_state(locator, *nth).await?;
                if state.visible {
                    Ok(())
                } else {
                    Err(AssertionFailure {
                        check: format!("element_visible({})", locator),
                        expected: "visible".into(),
                        actual: if state.present { "hidden".into() } else { "absent".into() },
                    })
                }
            }
            Assertion::ElementCount { locator, min } => {
                let count = driver.count(locator).await?;
                if count >= *min {
                    Ok(())
                } else {
                    Err(AssertionFailure {
                        check: format!("element_count({})", locator),
                        expected: format!(">= {}", min),
                        actual: count.to_string(),
                    })
                }
            }
            Assertion::TextContains { locator, nth, needle } => {
                let state = driver.query_state(locator, *nth).await?;
                let text = state.text.unwrap_or_default();
                if text.contains(needle) {
                    Ok(())
                } else {
                    Err(AssertionFailure {
                        check: format!("text_contains({})", locator),
                        expected: format!("contains '{}'", needle),
                        actual: text,
                    })
                }
            }
            Assertion::TextNotEmpty { locator, nth } => {
                let state = driver.query_state(locator, *nth).await?;
                let text = state.text.unwrap_or_default();
                if text.trim().is_empty() {
                    Err(AssertionFailure {
                        check: format!("text_not_empty({})", locator),
                        expected: "non-empty text".into(),
                        actual: "empty".into(),
                    })
                } else {
                    Ok(())
                }
            }
            Assertion::AttributePresent { locator, nth, name } => {
                match driver.attribute(locator, *nth, name).await? {
                    Some(value) if !value.is_empty() => Ok(()),
                    _ => Err(AssertionFailure {
                        check: format!("attribute_present({})", locator),
                        expected: format!("non-empty '{}'", name),
                        actual: "absent or empty".into(),
                    }),
                }
            }
            Assertion::PageContains { needle } => {
                let text = driver.page_text().await?;
                if text.contains(needle) {
                    Ok(())
                } else {
                    Err(AssertionFailure {
                        check: "page_contains".into(),
                        expected: format!("body contains '{}'", needle),
                        actual: "not found".into(),
                    })
                }
            }
            Assertion::CapturedNotEmpty { capture } => {
                let value = ctx.values.get(capture);
                let empty = match value {
                    Some(serde_json::Value::String(s)) => s.trim().is_empty(),
                    Some(serde_json::Value::Null) | None => true,
                    Some(_) => false,
                };
                if empty {
                    Err(AssertionFailure {
                        check: format!("captured_not_empty({})", capture),
                        expected: "non-empty value".into(),
                        actual: format!("{:?}", value),
                    })
                } else {
                    Ok(())
                }
            }
            Assertion::StatusIs { capture, status } => {
                checks::status_is(capture, self.response(ctx, capture)?, *status)
            }
            Assertion::HeaderPresent { capture, header } => {
                checks::header_present(capture, self.response(ctx, capture)?, header)
            }
            Assertion::JsonRecordsHaveFields { capture, fields } => {
                checks::records_have_fields(capture, self.response(ctx, capture)?, fields)
            }
            Assertion::JsonFilterSubset { all, filtered, field, value } => checks::filter_subset(
                all,
                self.response(ctx, all)?,
                filtered,
                self.response(ctx, filtered)?,
                field,
                value,
            ),
            Assertion::JsonNumberAtLeast { capture, pointer, min } => {
                checks::number_at_least(capture, self.response(ctx, capture)?, pointer, *min)
            }
            Assertion::NoDialog => {
                if driver.dialog_seen() {
                    Err(AssertionFailure {
                        check: "no_dialog".into(),
                        expected: "no javascript dialog".into(),
                        actual: "a dialog fired".into(),
                    })
                } else {
                    Ok(())
                }
            }
        };

        Ok(result)
    }

    fn response<'a>(
        &self,
        ctx: &'a StepContext,
        capture: &str,
    ) -> Result<&'a CapturedResponse, ScenarioError> {
        // Load-time validation guarantees the binding step exists; it can
        // still be absent if that step never ran.
        ctx.responses.get(capture).ok_or_else(|| {
            ScenarioError::Config(format!("capture '{}' was never recorded", capture))
        })
    }
}

/// Does the observed state satisfy the readiness condition?
fn condition_met(state: &ElementState, condition: ReadyCondition, baseline: &str) -> bool {
    match condition {
        ReadyCondition::Present => state.present,
        ReadyCondition::Visible => state.present && state.visible,
        ReadyCondition::TextChanged => {
            let text = state.text.as_deref().unwrap_or("");
            state.present && !text.is_empty() && text != baseline
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::scenario::WaitUntil;

    /// Scripted driver: records operations in order, counts closes, and
    /// keeps filled values per instance so isolation is observable.
    #[derive(Default)]
    struct MockDriver {
        ops: Mutex<Vec<String>>,
        fields: Mutex<HashMap<String, String>>,
        close_count: AtomicUsize,
        dialog: AtomicBool,
        fail_action: Option<&'static str>,
        page_text: String,
        /// Fixed element state reported by `query_state`; present and
        /// visible when unset
        element_state: Option<ElementState>,
    }

    impl MockDriver {
        fn with_page_text(text: &str) -> Self {
            Self {
                page_text: text.to_string(),
                ..Default::default()
            }
        }

        fn log(&self, op: String) {
            self.ops.lock().unwrap().push(op);
        }

        fn fail_if(&self, action: &str) -> Result<(), ScenarioError> {
            if self.fail_action == Some(action) {
                Err(ScenarioError::ConnectionLost(format!("{} failed", action)))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl Driver for MockDriver {
        async fn navigate(
            &self,
            url: &str,
            _wait: WaitUntil,
            _timeout: Duration,
        ) -> Result<(), ScenarioError> {
            self.log(format!("navigate {}", url));
            self.fail_if("navigate")
        }

        async fn query_state(
            &self,
            _locator: &Locator,
            _nth: usize,
        ) -> Result<ElementState, ScenarioError> {
            Ok(self.element_state.clone().unwrap_or(ElementState {
                present: true,
                visible: true,
                text: Some("stable".to_string()),
            }))
        }

        async fn count(&self, _locator: &Locator) -> Result<usize, ScenarioError> {
            Ok(3)
        }

        async fn click(&self, locator: &Locator, _nth: usize) -> Result<(), ScenarioError> {
            self.log(format!("click {}", locator));
            self.fail_if("click")
        }

        async fn fill(
            &self,
            locator: &Locator,
            _nth: usize,
            value: &str,
        ) -> Result<(), ScenarioError> {
            self.log(format!("fill {}", locator));
            self.fields
                .lock()
                .unwrap()
                .insert(locator.to_string(), value.to_string());
            self.fail_if("fill")
        }

        async fn attribute(
            &self,
            _locator: &Locator,
            _nth: usize,
            _name: &str,
        ) -> Result<Option<String>, ScenarioError> {
            Ok(Some("label".to_string()))
        }

        async fn evaluate(&self, script: &str) -> Result<serde_json::Value, ScenarioError> {
            self.log(format!("evaluate {}", script));
            Ok(serde_json::Value::String("result".to_string()))
        }

        async fn page_text(&self) -> Result<String, ScenarioError> {
            Ok(self.page_text.clone())
        }

        fn dialog_seen(&self) -> bool {
            self.dialog.load(Ordering::Relaxed)
        }

        async fn close(&self) -> Result<(), ScenarioError> {
            self.log("close".to_string());
            self.close_count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn runner() -> ScenarioRunner {
        ScenarioRunner::new(RunnerConfig::default()).unwrap()
    }

    fn scenario(yaml: &str) -> Scenario {
        Scenario::from_yaml(yaml).unwrap()
    }

    const THREE_STEPS: &str = r#"
name: ordered
steps:
  - action: navigate
    url: http://localhost:3000/
  - action: click
    locator:
      role: button
      name: Send
  - action: fill
    locator:
      test_id: email
    value: a@b.c
"#;

    #[tokio::test]
    async fn teardown_runs_exactly_once_on_success() {
        let driver = MockDriver::default();
        let report = runner().run_with(&driver, &scenario(THREE_STEPS)).await;

        assert!(report.outcome.is_passed());
        assert_eq!(driver.close_count.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn steps_execute_in_declared_order() {
        let driver = MockDriver::default();
        let report = runner().run_with(&driver, &scenario(THREE_STEPS)).await;
        assert_eq!(report.steps_run, 3);

        let ops = driver.ops.lock().unwrap().clone();
        assert_eq!(
            ops,
            vec![
                "navigate http://localhost:3000/",
                "click role=button[Send]",
                "fill test_id=email",
                "close",
            ]
        );
    }

    #[tokio::test]
    async fn step_failure_skips_rest_but_still_tears_down() {
        let driver = MockDriver {
            fail_action: Some("click"),
            ..Default::default()
        };
        let report = runner().run_with(&driver, &scenario(THREE_STEPS)).await;

        match &report.outcome {
            Outcome::Error { step: Some(step), .. } => assert!(step.contains("step 2")),
            other => panic!("expected step error, got {:?}", other),
        }
        assert_eq!(report.steps_run, 1);
        assert_eq!(report.outcome.exit_code(), 2);

        let ops = driver.ops.lock().unwrap().clone();
        // The fill step never ran; teardown still did.
        assert!(!ops.iter().any(|op| op.starts_with("fill")));
        assert_eq!(driver.close_count.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn all_assertions_are_evaluated_and_collected() {
        let driver = MockDriver::with_page_text("hello world");
        let s = scenario(
            r#"
name: asserted
steps:
  - action: navigate
    url: /
assertions:
  - kind: page_contains
    needle: absent-one
  - kind: page_contains
    needle: hello
  - kind: page_contains
    needle: absent-two
"#,
        );
        let report = runner().run_with(&driver, &s).await;

        match &report.outcome {
            Outcome::Failed(failures) => {
                assert_eq!(failures.len(), 2);
                assert!(failures[0].expected.contains("absent-one"));
                assert!(failures[1].expected.contains("absent-two"));
            }
            other => panic!("expected failed outcome, got {:?}", other),
        }
        assert_eq!(report.outcome.exit_code(), 1);
        assert_eq!(driver.close_count.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn dialog_aborts_step_unless_allowed() {
        let driver = MockDriver::default();
        driver.dialog.store(true, Ordering::Relaxed);
        let report = runner().run_with(&driver, &scenario(THREE_STEPS)).await;

        match &report.outcome {
            Outcome::Error { cause, .. } => {
                assert!(matches!(cause, ScenarioError::UnexpectedDialog(_)))
            }
            other => panic!("expected dialog error, got {:?}", other),
        }
        assert_eq!(driver.close_count.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn allowed_dialog_is_reported_by_assertion_instead() {
        let driver = MockDriver::default();
        driver.dialog.store(true, Ordering::Relaxed);
        let s = scenario(
            r#"
name: sanitization
allow_dialogs: true
steps:
  - action: navigate
    url: /
assertions:
  - kind: no_dialog
"#,
        );
        let report = runner().run_with(&driver, &s).await;

        match &report.outcome {
            Outcome::Failed(failures) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].check, "no_dialog");
            }
            other => panic!("expected failed outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn sessions_do_not_leak_state_across_runs() {
        let r = runner();
        let fill_scenario = scenario(
            r#"
name: writer
steps:
  - action: fill
    locator:
      test_id: name
    value: John Doe
"#,
        );

        let driver_a = MockDriver::default();
        let report = r.run_with(&driver_a, &fill_scenario).await;
        assert!(report.outcome.is_passed());
        assert_eq!(
            driver_a.fields.lock().unwrap().get("test_id=name"),
            Some(&"John Doe".to_string())
        );

        // A second scenario gets a fresh driver; nothing written by the
        // first run is observable through the same locator.
        let driver_b = MockDriver::default();
        let probe_scenario = scenario(
            r#"
name: reader
steps:
  - action: navigate
    url: /
"#,
        );
        let report = r.run_with(&driver_b, &probe_scenario).await;
        assert!(report.outcome.is_passed());
        assert!(driver_b.fields.lock().unwrap().is_empty());
    }

    const WAIT_FOR_HERO: &str = r#"
name: waiting
steps:
  - action: wait_for
    locator:
      css: section#hero
    timeout_secs: 1
"#;

    #[tokio::test(start_paused = true)]
    async fn element_never_present_times_out_as_not_found() {
        let driver = MockDriver {
            element_state: Some(ElementState::missing()),
            ..Default::default()
        };
        let report = runner().run_with(&driver, &scenario(WAIT_FOR_HERO)).await;

        match &report.outcome {
            Outcome::Error { cause, .. } => match cause {
                ScenarioError::ElementNotFound(selector) => {
                    assert_eq!(selector, "css=section#hero")
                }
                other => panic!("expected not-found, got {:?}", other),
            },
            other => panic!("expected step error, got {:?}", other),
        }
        assert_eq!(driver.close_count.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn present_but_hidden_element_times_out_as_not_ready() {
        let driver = MockDriver {
            element_state: Some(ElementState {
                present: true,
                visible: false,
                text: None,
            }),
            ..Default::default()
        };
        let report = runner().run_with(&driver, &scenario(WAIT_FOR_HERO)).await;

        match &report.outcome {
            Outcome::Error { cause, .. } => match cause {
                ScenarioError::ElementNotReady { selector, action } => {
                    assert_eq!(selector, "css=section#hero");
                    assert_eq!(action, "wait_for");
                }
                other => panic!("expected not-ready, got {:?}", other),
            },
            other => panic!("expected step error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn evaluate_capture_feeds_assertion() {
        let driver = MockDriver::default();
        let s = scenario(
            r#"
name: captured
steps:
  - action: evaluate
    script: document.title
    capture: title
assertions:
  - kind: captured_not_empty
    capture: title
"#,
        );
        let report = runner().run_with(&driver, &s).await;
        assert!(report.outcome.is_passed());
    }

    #[test]
    fn condition_met_variants() {
        let hidden = ElementState {
            present: true,
            visible: false,
            text: Some("x".into()),
        };
        assert!(condition_met(&hidden, ReadyCondition::Present, ""));
        assert!(!condition_met(&hidden, ReadyCondition::Visible, ""));

        let rotated = ElementState {
            present: true,
            visible: true,
            text: Some("Engineer".into()),
        };
        assert!(condition_met(&rotated, ReadyCondition::TextChanged, "Designer"));
        assert!(!condition_met(&rotated, ReadyCondition::TextChanged, "Engineer"));
        assert!(!condition_met(&ElementState::missing(), ReadyCondition::TextChanged, ""));
    }
}
