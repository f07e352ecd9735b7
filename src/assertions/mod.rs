#![allow(dead_code)]
//! # Response Assertions
//!
//! Declarative checks evaluated against a captured [`ApiResponse`]: status
//! code, headers, body substrings, and dotted-path lookups into the JSON
//! body. Evaluation never panics; a check that cannot read its target
//! simply fails with the reason in its message.

use std::fmt::{self, Display};

use serde::Serialize;
use serde_json::Value;

use crate::http::response::ApiResponse;

/// Statuses the process endpoint may answer a valid request with.
pub const ACCEPTED_STATUSES: [u16; 2] = [200, 202];

/// Target of an assertion within the HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AssertionTarget {
    StatusCode,
    Header(String),
    JsonField(String),
    BodyContains,
}

impl Display for AssertionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssertionTarget::StatusCode => write!(f, "status code"),
            AssertionTarget::Header(name) => write!(f, "header `{name}`"),
            AssertionTarget::JsonField(path) => write!(f, "json field `{path}`"),
            AssertionTarget::BodyContains => write!(f, "body"),
        }
    }
}

/// Comparison operator for an assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssertionOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    Exists,
}

impl Display for AssertionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AssertionOperator::Equals => "==",
            AssertionOperator::NotEquals => "!=",
            AssertionOperator::Contains => "contains",
            AssertionOperator::GreaterThan => ">",
            AssertionOperator::LessThan => "<",
            AssertionOperator::Exists => "exists",
        };
        write!(f, "{label}")
    }
}

/// A single check that can be evaluated against a response.
#[derive(Debug, Clone, Serialize)]
pub struct Assertion {
    pub target: AssertionTarget,
    pub operator: AssertionOperator,
    pub expected: String,
}

impl Assertion {
    pub fn status_equals(status: u16) -> Self {
        Self {
            target: AssertionTarget::StatusCode,
            operator: AssertionOperator::Equals,
            expected: status.to_string(),
        }
    }

    pub fn header_equals(name: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            target: AssertionTarget::Header(name.into()),
            operator: AssertionOperator::Equals,
            expected: expected.into(),
        }
    }

    pub fn json_equals(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            target: AssertionTarget::JsonField(path.into()),
            operator: AssertionOperator::Equals,
            expected: expected.into(),
        }
    }

    pub fn json_exists(path: impl Into<String>) -> Self {
        Self {
            target: AssertionTarget::JsonField(path.into()),
            operator: AssertionOperator::Exists,
            expected: String::new(),
        }
    }

    pub fn json_greater_than(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            target: AssertionTarget::JsonField(path.into()),
            operator: AssertionOperator::GreaterThan,
            expected: expected.into(),
        }
    }

    pub fn body_contains(expected: impl Into<String>) -> Self {
        Self {
            target: AssertionTarget::BodyContains,
            operator: AssertionOperator::Contains,
            expected: expected.into(),
        }
    }
}

/// Result of evaluating an assertion.
#[derive(Debug, Clone, Serialize)]
pub struct AssertionResult {
    pub assertion: Assertion,
    pub passed: bool,
    pub actual: String,
    pub message: String,
}

/// Checks the intake endpoint's success contract must satisfy.
pub fn process_success_checks() -> Vec<Assertion> {
    vec![
        Assertion::json_equals("status", "SUCCESS"),
        Assertion::json_exists("session_id"),
        Assertion::json_greater_than("response_time", "0"),
    ]
}

/// Checks for the 422 validation-error contract.
pub fn validation_error_checks() -> Vec<Assertion> {
    vec![Assertion::json_exists("detail")]
}

/// Evaluate one assertion against a captured response.
pub fn evaluate(assertion: &Assertion, response: &ApiResponse) -> AssertionResult {
    let actual = read_target(&assertion.target, response);

    let (passed, message) = match assertion.operator {
        AssertionOperator::Exists => {
            let present = actual.is_some();
            let message = if present {
                format!("{} is present", assertion.target)
            } else {
                format!("{} is absent", assertion.target)
            };
            (present, message)
        }
        operator => match &actual {
            None => (false, format!("{} is absent", assertion.target)),
            Some(value) => compare(operator, value, &assertion.expected, &assertion.target),
        },
    };

    AssertionResult {
        assertion: assertion.clone(),
        passed,
        actual: actual.unwrap_or_else(|| "<absent>".to_string()),
        message,
    }
}

/// Evaluate a batch of assertions in order.
pub fn evaluate_all(assertions: &[Assertion], response: &ApiResponse) -> Vec<AssertionResult> {
    assertions
        .iter()
        .map(|assertion| evaluate(assertion, response))
        .collect()
}

fn compare(
    operator: AssertionOperator,
    actual: &str,
    expected: &str,
    target: &AssertionTarget,
) -> (bool, String) {
    let passed = match operator {
        AssertionOperator::Equals => actual == expected,
        AssertionOperator::NotEquals => actual != expected,
        AssertionOperator::Contains => actual.contains(expected),
        AssertionOperator::GreaterThan | AssertionOperator::LessThan => {
            match (actual.parse::<f64>(), expected.parse::<f64>()) {
                (Ok(lhs), Ok(rhs)) if operator == AssertionOperator::GreaterThan => lhs > rhs,
                (Ok(lhs), Ok(rhs)) => lhs < rhs,
                _ => false,
            }
        }
        AssertionOperator::Exists => unreachable!("Exists is handled before compare"),
    };

    let message = if passed {
        format!("{target} {operator} {expected}")
    } else {
        format!("expected {target} {operator} `{expected}`, got `{actual}`")
    };
    (passed, message)
}

fn read_target(target: &AssertionTarget, response: &ApiResponse) -> Option<String> {
    match target {
        AssertionTarget::StatusCode => Some(response.status.to_string()),
        AssertionTarget::Header(name) => response.header(name).map(str::to_string),
        AssertionTarget::BodyContains => Some(response.body.clone()),
        AssertionTarget::JsonField(path) => {
            let body = response.json().ok()?;
            let value = json_field(&body, path)?;
            Some(render(&value))
        }
    }
}

/// Walk a dotted path into a JSON value. Array segments may be numeric
/// indices (`detail.0.msg`).
fn json_field(body: &Value, path: &str) -> Option<Value> {
    let mut current = body.clone();
    for segment in path.split('.') {
        current = match &current {
            Value::Object(map) => map.get(segment)?.clone(),
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?.clone()
            }
            _ => return None,
        };
    }
    Some(current)
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
