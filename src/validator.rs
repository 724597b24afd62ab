//! Schema validation
//!
//! Parses the raw text into a value tree (TOML values are converted to JSON
//! values so later stages work on one representation) and walks the tree
//! against the schema. Violations are collected exhaustively: a failing run
//! reports every missing field, kind mismatch, and unknown key at once
//! rather than stopping at the first.

use serde_json::Value;

use crate::loader::{RawDocument, SourceFormat};
use crate::resolver::full_placeholder;
use crate::schema::{lookup_path, Kind, Schema};

/// What to do with input keys the schema does not declare.
///
/// `Ignore` (the default) silently drops them: the output is built purely
/// from schema fields, so undeclared keys never reach it. `Deny` collects
/// each one as a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeyPolicy {
    #[default]
    Ignore,
    Deny,
}

/// Malformed input syntax
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("syntax error at line {line}, column {column}: {message}")]
    At {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("syntax error: {0}")]
    Other(String),
}

/// A single schema violation
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    MissingField {
        path: String,
    },
    TypeMismatch {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },
    UnknownField {
        path: String,
    },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::MissingField { path } => write!(f, "missing required field: {}", path),
            Violation::TypeMismatch {
                path,
                expected,
                actual,
            } => write!(f, "type mismatch at {}: expected {}, got {}", path, expected, actual),
            Violation::UnknownField { path } => write!(f, "unknown field: {}", path),
        }
    }
}

fn render_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// One or more schema violations, reported together
#[derive(Debug, thiserror::Error)]
#[error("{}", render_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    /// Serialize the violation list to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.violations)
    }
}

/// A parsed tree that passed every schema check
#[derive(Debug, Clone)]
pub struct ValidatedDocument {
    pub tree: Value,
}

/// Parse the raw text into a JSON value tree.
pub fn parse(raw: &RawDocument) -> Result<Value, ParseError> {
    match raw.format {
        SourceFormat::Json => serde_json::from_str(&raw.text).map_err(|e| {
            if e.line() > 0 {
                ParseError::At {
                    line: e.line(),
                    column: e.column(),
                    message: e.to_string(),
                }
            } else {
                ParseError::Other(e.to_string())
            }
        }),
        SourceFormat::Toml => {
            let value: toml::Value = toml::from_str(&raw.text).map_err(|e| {
                match e.span().map(|s| line_column(&raw.text, s.start)) {
                    Some((line, column)) => ParseError::At {
                        line,
                        column,
                        message: e.message().to_string(),
                    },
                    None => ParseError::Other(e.message().to_string()),
                }
            })?;
            Ok(toml_to_json(value))
        }
    }
}

/// Convert a byte offset to a 1-based line/column pair
fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let clamped = offset.min(text.len());
    let before = &text[..clamped];
    let line = before.matches('\n').count() + 1;
    let column = before.chars().rev().take_while(|c| *c != '\n').count() + 1;
    (line, column)
}

/// Convert a TOML value to a JSON value
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            Value::Object(map)
        }
    }
}

/// Walk the parsed tree against the schema.
pub fn validate(
    tree: Value,
    schema: &Schema,
    policy: UnknownKeyPolicy,
) -> Result<ValidatedDocument, ValidationError> {
    if !tree.is_object() {
        return Err(ValidationError {
            violations: vec![Violation::TypeMismatch {
                path: "(root)".to_string(),
                expected: Kind::Mapping.as_str(),
                actual: Kind::of(&tree),
            }],
        });
    }

    let mut violations = Vec::new();

    for spec in schema.fields() {
        match lookup_path(&tree, spec.path) {
            None => {
                if spec.required {
                    violations.push(Violation::MissingField {
                        path: spec.path.to_string(),
                    });
                }
            }
            Some(value) => check_kind(spec.path, spec.kind, spec.element_kind, value, &mut violations),
        }
    }

    if policy == UnknownKeyPolicy::Deny {
        scan_unknown(&tree, "", schema, &mut violations);
    }

    if violations.is_empty() {
        Ok(ValidatedDocument { tree })
    } else {
        Err(ValidationError { violations })
    }
}

fn check_kind(
    path: &str,
    kind: Kind,
    element_kind: Option<Kind>,
    value: &Value,
    violations: &mut Vec<Violation>,
) {
    // A full-string placeholder is kind-checked by the resolver once its
    // concrete value is known. Mapping fields get no deferral: an
    // environment variable can never supply a mapping, so a placeholder
    // there is a plain kind mismatch.
    if kind != Kind::Mapping && value.as_str().map(|s| full_placeholder(s).is_some()) == Some(true)
    {
        return;
    }

    if !kind.matches(value) {
        violations.push(Violation::TypeMismatch {
            path: path.to_string(),
            expected: kind.as_str(),
            actual: Kind::of(value),
        });
        return;
    }

    if let (Kind::List, Some(element), Value::Array(items)) = (kind, element_kind, value) {
        for (i, item) in items.iter().enumerate() {
            if item.as_str().map(|s| full_placeholder(s).is_some()) == Some(true) {
                continue;
            }
            if !element.matches(item) {
                violations.push(Violation::TypeMismatch {
                    path: format!("{}[{}]", path, i),
                    expected: element.as_str(),
                    actual: Kind::of(item),
                });
            }
        }
    }
}

fn scan_unknown(value: &Value, prefix: &str, schema: &Schema, violations: &mut Vec<Violation>) {
    let Some(map) = value.as_object() else {
        return;
    };

    for (key, child) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match schema.lookup(&path) {
            Some(spec) if spec.kind == Kind::Mapping => scan_unknown(child, &path, schema, violations),
            Some(_) => {}
            None => {
                if schema.has_children(&path) {
                    scan_unknown(child, &path, schema, violations);
                } else {
                    violations.push(Violation::UnknownField { path });
                }
            }
        }
    }
}
