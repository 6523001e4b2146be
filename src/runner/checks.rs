//! Pure assertion predicates over captured responses.
//!
//! These never touch the session; they compare captured state against
//! expectations and produce expected/actual failure records.

use serde_json::Value;

use super::AssertionFailure;
use crate::net::CapturedResponse;

/// Status code equality.
pub fn status_is(capture: &str, response: &CapturedResponse, status: u16) -> Result<(), AssertionFailure> {
    if response.status == status {
        Ok(())
    } else {
        Err(AssertionFailure {
            check: format!("status_is({})", capture),
            expected: status.to_string(),
            actual: response.status.to_string(),
        })
    }
}

/// A header is present with a non-empty value.
pub fn header_present(
    capture: &str,
    response: &CapturedResponse,
    header: &str,
) -> Result<(), AssertionFailure> {
    match response.header(header) {
        Some(value) if !value.is_empty() => Ok(()),
        _ => Err(AssertionFailure {
            check: format!("header_present({})", capture),
            expected: format!("header '{}' present", header),
            actual: "absent".to_string(),
        }),
    }
}

/// The captured body is a JSON array whose every record carries all fields.
pub fn records_have_fields(
    capture: &str,
    response: &CapturedResponse,
    fields: &[String],
) -> Result<(), AssertionFailure> {
    let records = json_array(capture, response)?;
    for (index, record) in records.iter().enumerate() {
        for field in fields {
            if record.get(field).is_none() {
                return Err(AssertionFailure {
                    check: format!("json_records_have_fields({})", capture),
                    expected: format!("every record has '{}'", field),
                    actual: format!("record {} lacks '{}'", index, field),
                });
            }
        }
    }
    Ok(())
}

/// Filtering property: `filtered` is a subset of `all` (|filtered| ≤ |all|,
/// every filtered record appears in `all`) and every filtered record's
/// `field` list contains `value`.
pub fn filter_subset(
    all_name: &str,
    all: &CapturedResponse,
    filtered_name: &str,
    filtered: &CapturedResponse,
    field: &str,
    value: &str,
) -> Result<(), AssertionFailure> {
    let all_records = json_array(all_name, all)?;
    let filtered_records = json_array(filtered_name, filtered)?;

    let check = format!("json_filter_subset({}, {})", all_name, filtered_name);

    if filtered_records.len() > all_records.len() {
        return Err(AssertionFailure {
            check,
            expected: format!("at most {} records", all_records.len()),
            actual: format!("{} records", filtered_records.len()),
        });
    }

    for (index, record) in filtered_records.iter().enumerate() {
        if !all_records.contains(record) {
            return Err(AssertionFailure {
                check,
                expected: "every filtered record present in the unfiltered set".to_string(),
                actual: format!("record {} not found in '{}'", index, all_name),
            });
        }

        let members = record.get(field).and_then(Value::as_array);
        let contains = members
            .map(|list| list.iter().any(|m| m.as_str() == Some(value)))
            .unwrap_or(false);
        if !contains {
            return Err(AssertionFailure {
                check,
                expected: format!("every record's '{}' contains '{}'", field, value),
                actual: format!("record {} does not", index),
            });
        }
    }

    Ok(())
}

/// A number at a JSON pointer is at least `min`.
pub fn number_at_least(
    capture: &str,
    response: &CapturedResponse,
    pointer: &str,
    min: f64,
) -> Result<(), AssertionFailure> {
    let check = format!("json_number_at_least({})", capture);
    match response.json_pointer(pointer).and_then(Value::as_f64) {
        Some(n) if n >= min => Ok(()),
        Some(n) => Err(AssertionFailure {
            check,
            expected: format!("{} >= {}", pointer, min),
            actual: n.to_string(),
        }),
        None => Err(AssertionFailure {
            check,
            expected: format!("number at '{}'", pointer),
            actual: "absent or not a number".to_string(),
        }),
    }
}

fn json_array<'a>(
    capture: &str,
    response: &'a CapturedResponse,
) -> Result<&'a Vec<Value>, AssertionFailure> {
    response
        .json
        .as_ref()
        .and_then(Value::as_array)
        .ok_or_else(|| AssertionFailure {
            check: format!("json({})", capture),
            expected: "a JSON array body".to_string(),
            actual: preview(&response.body),
        })
}

fn preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= 80 {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(80).collect();
        format!("{}…", head)
    }
}
