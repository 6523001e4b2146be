//! Scenario definitions
//!
//! Scenarios are data, not code: each YAML file declares an ordered step
//! sequence and a final assertion list. Loading validates the definition so
//! that authoring errors (notably assertions referencing captures no step
//! ever binds) are rejected up front instead of failing mid-run.

mod types;

pub use types::{Assertion, Locator, Query, ReadyCondition, Scenario, Step, WaitUntil};

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::browser::ScenarioError;

impl Scenario {
    /// Parse a scenario from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_yaml::from_str(content)
            .map_err(|e| ScenarioError::Config(format!("failed to parse scenario: {}", e)))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load and validate a scenario from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScenarioError::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        let scenario = Self::from_yaml(&content).map_err(|e| {
            ScenarioError::Config(format!("{}: {}", path.display(), e))
        })?;
        debug!("Loaded scenario '{}' from {}", scenario.name, path.display());
        Ok(scenario)
    }

    /// Structural validation: non-empty name and steps, unique capture
    /// names, and every assertion-referenced capture bound by some step.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.name.trim().is_empty() {
            return Err(ScenarioError::Config("scenario name is empty".into()));
        }
        if self.steps.is_empty() {
            return Err(ScenarioError::Config(format!(
                "scenario '{}' has no steps",
                self.name
            )));
        }

        let mut bound: HashSet<&str> = HashSet::new();
        for step in &self.steps {
            if let Some(name) = step.binds_capture() {
                if !bound.insert(name) {
                    return Err(ScenarioError::Config(format!(
                        "scenario '{}' binds capture '{}' more than once",
                        self.name, name
                    )));
                }
            }
        }

        for assertion in &self.assertions {
            for capture in assertion.references_captures() {
                if !bound.contains(capture) {
                    return Err(ScenarioError::Config(format!(
                        "scenario '{}' assertion '{}' references capture '{}' that no step binds",
                        self.name,
                        assertion.label(),
                        capture
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Load every `.yaml`/`.yml` scenario under a path, in filename order. A
/// plain file loads as a single scenario.
pub fn load_all(path: &Path) -> Result<Vec<Scenario>, ScenarioError> {
    if path.is_file() {
        return Ok(vec![Scenario::load(path)?]);
    }

    let mut files: Vec<_> = std::fs::read_dir(path)
        .map_err(|e| {
            ScenarioError::Config(format!("failed to read '{}': {}", path.display(), e))
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(ScenarioError::Config(format!(
            "no scenario files under '{}'",
            path.display()
        )));
    }

    files.iter().map(|f| Scenario::load(f)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
name: smoke
steps:
  - action: navigate
    url: /
assertions:
  - kind: page_contains
    needle: Home
"#;

    #[test]
    fn minimal_scenario_parses() {
        let scenario = Scenario::from_yaml(MINIMAL).unwrap();
        assert_eq!(scenario.name, "smoke");
        assert_eq!(scenario.steps.len(), 1);
        assert_eq!(scenario.assertions.len(), 1);
        assert!(!scenario.allow_dialogs);
    }

    #[test]
    fn unbound_capture_is_rejected() {
        let yaml = r#"
name: bad
steps:
  - action: navigate
    url: /
assertions:
  - kind: status_is
    capture: response
    status: 200
"#;
        let err = Scenario::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("references capture 'response'"));
    }

    #[test]
    fn duplicate_capture_is_rejected() {
        let yaml = r#"
name: bad
steps:
  - action: http_get
    path: /health
    capture: r
  - action: http_get
    path: /health
    capture: r
"#;
        let err = Scenario::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn empty_steps_are_rejected() {
        let err = Scenario::from_yaml("name: empty\nsteps: []\n").unwrap_err();
        assert!(err.to_string().contains("no steps"));
    }

    #[test]
    fn load_all_reads_directory_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.yaml", "a.yaml"] {
            let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
            write!(f, "name: {}\nsteps:\n  - action: navigate\n    url: /\n", name).unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let scenarios = load_all(dir.path()).unwrap();
        let names: Vec<_> = scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a.yaml", "b.yaml"]);
    }

    #[test]
    fn load_all_rejects_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_all(dir.path()).is_err());
    }
}
