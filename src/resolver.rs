//! Placeholder and default resolution
//!
//! Substitutes `${VAR}` placeholders from an environment snapshot taken once
//! at startup and fills in schema defaults. Fields resolve in
//! schema-declaration order, never input order, and the resolver checks that
//! no placeholder token survives before handing the tree to the serializer.
//!
//! Substitution rules:
//! - a scalar whose entire text is `${VAR}` takes the snapshot value of
//!   `VAR`, coerced to the declared kind; if `VAR` is unset, the field's
//!   default applies, and with no default the run fails
//! - embedded `${VAR}` tokens inside longer strings substitute textually;
//!   every named variable must be set (defaults replace whole values only)
//! - an absent optional field takes its declared environment variable if
//!   set, else its default, else it is omitted

use regex_lite::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::schema::{lookup_path, Kind, Schema};
use crate::validator::ValidatedDocument;

/// Environment variables captured once at startup.
///
/// The resolver never reads the process environment directly; passing a
/// snapshot keeps resolution deterministic and lets tests supply variables
/// without mutating real process state.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Snapshot the real process environment
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build a snapshot from explicit pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(|s| s.as_str())
    }
}

/// Errors producing concrete values
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("unresolved placeholder at {path}: environment variable {variable} is not set and no default exists")]
    UnresolvedPlaceholder { path: String, variable: String },

    #[error("invalid substitution at {path}: {value:?} cannot be read as {expected}")]
    InvalidSubstitution {
        path: String,
        expected: &'static str,
        value: String,
    },
}

/// A tree with no placeholder tokens left
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    pub tree: Value,
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
    })
}

/// Returns the variable name when the entire text is a single `${VAR}` token
pub(crate) fn full_placeholder(text: &str) -> Option<&str> {
    let m = placeholder_re().find(text)?;
    if m.start() == 0 && m.end() == text.len() {
        Some(&text[2..text.len() - 1])
    } else {
        None
    }
}

fn contains_placeholder(text: &str) -> bool {
    placeholder_re().is_match(text)
}

/// Resolve a validated document against the snapshot.
pub fn resolve(
    doc: ValidatedDocument,
    schema: &Schema,
    env: &EnvSnapshot,
) -> Result<ResolvedDocument, ResolutionError> {
    let input = doc.tree;
    let mut out = Map::new();

    for spec in schema.fields() {
        // Mapping containers materialize from their declared children.
        if spec.kind == Kind::Mapping {
            continue;
        }

        match lookup_path(&input, spec.path) {
            Some(value) => {
                let resolved = resolve_value(value, spec.path, spec.kind, spec.element_kind, spec.default.as_ref(), env)?;
                insert(&mut out, spec.path, resolved);
            }
            None => {
                if let Some(var) = spec.env {
                    if let Some(raw) = env.get(var) {
                        insert(&mut out, spec.path, coerce(raw, spec.kind, spec.path)?);
                        continue;
                    }
                }
                if let Some(default) = &spec.default {
                    insert(&mut out, spec.path, default.clone());
                } else if let Some(var) = spec.env {
                    return Err(ResolutionError::UnresolvedPlaceholder {
                        path: spec.path.to_string(),
                        variable: var.to_string(),
                    });
                }
                // Absent optional field with no default and no env rule: omitted.
            }
        }
    }

    let tree = Value::Object(out);
    assert_resolved(&tree, "")?;

    Ok(ResolvedDocument { tree })
}

fn resolve_value(
    value: &Value,
    path: &str,
    kind: Kind,
    element_kind: Option<Kind>,
    default: Option<&Value>,
    env: &EnvSnapshot,
) -> Result<Value, ResolutionError> {
    match value {
        Value::String(text) => {
            if let Some(var) = full_placeholder(text) {
                match env.get(var) {
                    Some(raw) => coerce(raw, kind, path),
                    None => match default {
                        Some(d) => Ok(d.clone()),
                        None => Err(ResolutionError::UnresolvedPlaceholder {
                            path: path.to_string(),
                            variable: var.to_string(),
                        }),
                    },
                }
            } else if contains_placeholder(text) {
                Ok(Value::String(substitute_embedded(text, path, env)?))
            } else {
                Ok(value.clone())
            }
        }
        Value::Array(items) => {
            let element = element_kind.unwrap_or(Kind::String);
            let mut resolved = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, i);
                resolved.push(resolve_value(item, &item_path, element, None, None, env)?);
            }
            Ok(Value::Array(resolved))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_embedded(
    text: &str,
    path: &str,
    env: &EnvSnapshot,
) -> Result<String, ResolutionError> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for m in placeholder_re().find_iter(text) {
        let name = &text[m.start() + 2..m.end() - 1];
        match env.get(name) {
            Some(value) => {
                out.push_str(&text[last..m.start()]);
                out.push_str(value);
                last = m.end();
            }
            None => {
                return Err(ResolutionError::UnresolvedPlaceholder {
                    path: path.to_string(),
                    variable: name.to_string(),
                })
            }
        }
    }

    out.push_str(&text[last..]);
    Ok(out)
}

/// Coerce an environment string to the declared kind
fn coerce(raw: &str, kind: Kind, path: &str) -> Result<Value, ResolutionError> {
    let invalid = || ResolutionError::InvalidSubstitution {
        path: path.to_string(),
        expected: kind.as_str(),
        value: raw.to_string(),
    };

    match kind {
        Kind::String => Ok(Value::String(raw.to_string())),
        Kind::Number => {
            if let Ok(i) = raw.parse::<i64>() {
                Ok(Value::Number(i.into()))
            } else {
                raw.parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(invalid)
            }
        }
        Kind::Bool => match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        // Environment variables cannot supply structured values.
        Kind::List | Kind::Mapping => Err(invalid()),
    }
}

/// Insert a value at a dot-separated path, creating parent mappings
fn insert(tree: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            tree.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = tree
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(map) = entry {
                insert(map, rest, value);
            }
        }
    }
}

/// Structural invariant: no string in the output may still carry a token
fn assert_resolved(value: &Value, path: &str) -> Result<(), ResolutionError> {
    match value {
        Value::String(text) => {
            if let Some(m) = placeholder_re().find(text) {
                return Err(ResolutionError::UnresolvedPlaceholder {
                    path: path.to_string(),
                    variable: text[m.start() + 2..m.end() - 1].to_string(),
                });
            }
            Ok(())
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                assert_resolved(item, &format!("{}[{}]", path, i))?;
            }
            Ok(())
        }
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                assert_resolved(child, &child_path)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
