//! Scenario data model
//!
//! Defines the data structures for deserializing YAML scenario files. A
//! scenario is immutable once loaded: an ordered sequence of steps plus a
//! final list of assertions.

use serde::{Deserialize, Serialize};

/// A complete scenario loaded from a YAML file
#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// When true, JavaScript dialogs are tolerated during steps and only
    /// reported by a `no_dialog` assertion. When false (default), a dialog
    /// observed after any step aborts the scenario.
    #[serde(default)]
    pub allow_dialogs: bool,
    /// The ordered sequence of steps to execute
    pub steps: Vec<Step>,
    /// Assertions evaluated after the last step completes
    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

/// How long a navigation step waits before it is considered complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitUntil {
    /// The navigation request was initiated and committed
    #[default]
    Commit,
    /// The document was parsed (DOMContentLoaded observed)
    DomContentLoaded,
}

/// Readiness predicate for `wait_for` steps and pre-interaction polling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyCondition {
    /// Element exists in the document
    Present,
    /// Element exists and occupies visible layout space
    #[default]
    Visible,
    /// Element text differs from its value when the wait began
    TextChanged,
}

/// A single step in the execution flow
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a URL (absolute, or a path joined onto the base URL)
    Navigate {
        url: String,
        #[serde(default)]
        wait_until: WaitUntil,
        timeout_secs: Option<u64>,
    },
    /// Click the n-th element matching the locator once it is actionable
    Click {
        locator: Locator,
        #[serde(default)]
        nth: usize,
        timeout_secs: Option<u64>,
    },
    /// Fill the n-th matching input/textarea with a value
    Fill {
        locator: Locator,
        #[serde(default)]
        nth: usize,
        value: String,
        timeout_secs: Option<u64>,
    },
    /// Block until a readiness predicate holds for the locator
    WaitFor {
        locator: Locator,
        #[serde(default)]
        nth: usize,
        #[serde(default)]
        condition: ReadyCondition,
        timeout_secs: Option<u64>,
    },
    /// Fixed sleep. Prefer `wait_for`; kept for asynchronous effects that
    /// expose no observable predicate.
    Pause { millis: u64 },
    /// Evaluate a page-side script, optionally capturing the result
    Evaluate {
        script: String,
        capture: Option<String>,
    },
    /// GET against the base URL, capturing the response under a name
    HttpGet { path: String, capture: String },
    /// POST a JSON body against the base URL, capturing the response
    HttpPost {
        path: String,
        body: serde_json::Value,
        capture: String,
    },
}

impl Step {
    /// Capture name this step binds, if any
    pub fn binds_capture(&self) -> Option<&str> {
        match self {
            Step::Evaluate { capture, .. } => capture.as_deref(),
            Step::HttpGet { capture, .. } => Some(capture),
            Step::HttpPost { capture, .. } => Some(capture),
            _ => None,
        }
    }

    /// Short label used in reports and logs
    pub fn label(&self) -> String {
        match self {
            Step::Navigate { url, .. } => format!("navigate {}", url),
            Step::Click { locator, .. } => format!("click {}", locator),
            Step::Fill { locator, .. } => format!("fill {}", locator),
            Step::WaitFor { locator, condition, .. } => {
                format!("wait_for {} ({:?})", locator, condition)
            }
            Step::Pause { millis } => format!("pause {}ms", millis),
            Step::Evaluate { .. } => "evaluate".to_string(),
            Step::HttpGet { path, .. } => format!("GET {}", path),
            Step::HttpPost { path, .. } => format!("POST {}", path),
        }
    }
}

/// A semantic element locator, resolved to a concrete document query at
/// execution time. Deliberately not an absolute positional path: scenarios
/// address elements by stable ids, roles, or text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Locator {
    /// CSS selector
    Css { css: String },
    /// Dedicated test identifier (`data-testid` attribute)
    TestId { test_id: String },
    /// ARIA role, optionally narrowed by accessible name substring
    Role { role: String, name: Option<String> },
    /// Visible text substring
    Text { text: String },
}

/// A concrete document query produced from a [`Locator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Css(String),
    XPath(String),
}

impl Locator {
    /// Resolve to a CSS or XPath query.
    pub fn to_query(&self) -> Query {
        match self {
            Locator::Css { css } => Query::Css(css.clone()),
            Locator::TestId { test_id } => {
                Query::Css(format!("[data-testid=\"{}\"]", test_id))
            }
            Locator::Role { role, name } => match name {
                Some(name) => {
                    let tag = implicit_role_tag(role);
                    Query::XPath(format!(
                        "//{tag}[contains(normalize-space(.), {n})] | //*[@role={r}][contains(normalize-space(.), {n})]",
                        tag = tag,
                        n = xpath_string(name),
                        r = xpath_string(role),
                    ))
                }
                None => {
                    let tag = implicit_role_tag(role);
                    Query::Css(format!("{}, [role=\"{}\"]", tag, role))
                }
            },
            Locator::Text { text } => Query::XPath(format!(
                "//*[contains(normalize-space(.), {}) and not(.//*[contains(normalize-space(.), {})])]",
                xpath_string(text),
                xpath_string(text),
            )),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Css { css } => write!(f, "css={}", css),
            Locator::TestId { test_id } => write!(f, "test_id={}", test_id),
            Locator::Role { role, name: Some(name) } => write!(f, "role={}[{}]", role, name),
            Locator::Role { role, name: None } => write!(f, "role={}", role),
            Locator::Text { text } => write!(f, "text={}", text),
        }
    }
}

/// Map a handful of ARIA roles to the elements that carry them implicitly.
fn implicit_role_tag(role: &str) -> &'static str {
    match role {
        "button" => "button",
        "link" => "a",
        "textbox" => "input",
        "checkbox" => "input",
        "heading" => "h1",
        "article" => "article",
        "navigation" => "nav",
        _ => "*",
    }
}

/// Quote a string for embedding in an XPath expression. XPath 1.0 has no
/// escape syntax, so strings containing both quote kinds use concat().
fn xpath_string(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{}'", s)
    } else if !s.contains('"') {
        format!("\"{}\"", s)
    } else {
        let parts: Vec<String> = s
            .split('\'')
            .map(|p| format!("'{}'", p))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// A post-execution predicate over observable state. Evaluated after all
/// steps complete; never mutates state.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assertion {
    /// The n-th matching element is visible
    ElementVisible {
        locator: Locator,
        #[serde(default)]
        nth: usize,
    },
    /// At least `min` elements match the locator
    ElementCount {
        locator: Locator,
        #[serde(default = "default_min_count")]
        min: usize,
    },
    /// Element text contains a substring
    TextContains {
        locator: Locator,
        #[serde(default)]
        nth: usize,
        needle: String,
    },
    /// Element text is non-empty
    TextNotEmpty {
        locator: Locator,
        #[serde(default)]
        nth: usize,
    },
    /// Element carries a non-empty attribute
    AttributePresent {
        locator: Locator,
        #[serde(default)]
        nth: usize,
        name: String,
    },
    /// The page body text contains a substring
    PageContains { needle: String },
    /// A captured evaluate result is a non-empty string
    CapturedNotEmpty { capture: String },
    /// A captured response has the given status code
    StatusIs { capture: String, status: u16 },
    /// A captured response carries the given header
    HeaderPresent { capture: String, header: String },
    /// Every record in a captured JSON array carries all fields
    JsonRecordsHaveFields { capture: String, fields: Vec<String> },
    /// The `filtered` captured array is a subset of `all`, and every record's
    /// `field` list contains `value`
    JsonFilterSubset {
        all: String,
        filtered: String,
        field: String,
        value: String,
    },
    /// A number at a JSON pointer in a captured response is at least `min`
    JsonNumberAtLeast {
        capture: String,
        pointer: String,
        min: f64,
    },
    /// No JavaScript dialog fired during the scenario
    NoDialog,
}

fn default_min_count() -> usize {
    1
}

impl Assertion {
    /// Capture names this assertion references
    pub fn references_captures(&self) -> Vec<&str> {
        match self {
            Assertion::CapturedNotEmpty { capture }
            | Assertion::StatusIs { capture, .. }
            | Assertion::HeaderPresent { capture, .. }
            | Assertion::JsonRecordsHaveFields { capture, .. }
            | Assertion::JsonNumberAtLeast { capture, .. } => vec![capture],
            Assertion::JsonFilterSubset { all, filtered, .. } => vec![all, filtered],
            _ => vec![],
        }
    }

    /// Short label used in failure reports
    pub fn label(&self) -> &'static str {
        match self {
            Assertion::ElementVisible { .. } => "element_visible",
            Assertion::ElementCount { .. } => "element_count",
            Assertion::TextContains { .. } => "text_contains",
            Assertion::TextNotEmpty { .. } => "text_not_empty",
            Assertion::AttributePresent { .. } => "attribute_present",
            Assertion::PageContains { .. } => "page_contains",
            Assertion::CapturedNotEmpty { .. } => "captured_not_empty",
            Assertion::StatusIs { .. } => "status_is",
            Assertion::HeaderPresent { .. } => "header_present",
            Assertion::JsonRecordsHaveFields { .. } => "json_records_have_fields",
            Assertion::JsonFilterSubset { .. } => "json_filter_subset",
            Assertion::JsonNumberAtLeast { .. } => "json_number_at_least",
            Assertion::NoDialog => "no_dialog",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_forms_deserialize() {
        let css: Locator = serde_yaml::from_str("css: section#hero").unwrap();
        assert_eq!(css, Locator::Css { css: "section#hero".into() });

        let test_id: Locator = serde_yaml::from_str("test_id: contact-email").unwrap();
        assert_eq!(test_id, Locator::TestId { test_id: "contact-email".into() });

        let role: Locator = serde_yaml::from_str("role: button\nname: Send").unwrap();
        assert_eq!(
            role,
            Locator::Role { role: "button".into(), name: Some("Send".into()) }
        );

        let text: Locator = serde_yaml::from_str("text: required").unwrap();
        assert_eq!(text, Locator::Text { text: "required".into() });
    }

    #[test]
    fn test_id_maps_to_attribute_selector() {
        let locator = Locator::TestId { test_id: "hero-title".into() };
        assert_eq!(
            locator.to_query(),
            Query::Css("[data-testid=\"hero-title\"]".into())
        );
    }

    #[test]
    fn role_without_name_maps_to_css() {
        let locator = Locator::Role { role: "button".into(), name: None };
        assert_eq!(locator.to_query(), Query::Css("button, [role=\"button\"]".into()));
    }

    #[test]
    fn role_with_name_maps_to_xpath() {
        let locator = Locator::Role { role: "button".into(), name: Some("Send".into()) };
        match locator.to_query() {
            Query::XPath(x) => {
                assert!(x.contains("//button[contains(normalize-space(.), 'Send')]"));
                assert!(x.contains("@role='button'"));
            }
            other => panic!("expected xpath, got {:?}", other),
        }
    }

    #[test]
    fn xpath_string_handles_quotes() {
        assert_eq!(xpath_string("plain"), "'plain'");
        assert_eq!(xpath_string("it's"), "\"it's\"");
        assert!(xpath_string("both ' and \"").starts_with("concat("));
    }

    #[test]
    fn step_deserializes_with_defaults() {
        let step: Step = serde_yaml::from_str(
            "action: click\nlocator:\n  role: button\n  name: Send",
        )
        .unwrap();
        match step {
            Step::Click { nth, timeout_secs, .. } => {
                assert_eq!(nth, 0);
                assert!(timeout_secs.is_none());
            }
            other => panic!("expected click, got {:?}", other),
        }
    }

    #[test]
    fn http_steps_bind_captures() {
        let step: Step = serde_yaml::from_str(
            "action: http_get\npath: /api/projects\ncapture: all",
        )
        .unwrap();
        assert_eq!(step.binds_capture(), Some("all"));
    }

    #[test]
    fn filter_subset_assertion_references_both_captures() {
        let assertion: Assertion = serde_yaml::from_str(
            "kind: json_filter_subset\nall: all\nfiltered: by_tech\nfield: technologies\nvalue: Next.js",
        )
        .unwrap();
        assert_eq!(assertion.references_captures(), vec!["all", "by_tech"]);
    }
}
