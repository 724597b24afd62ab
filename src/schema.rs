//! Build-time configuration schema
//!
//! The schema is fixed when the binary is built; callers never supply one.
//! Fields are declared in order, and that declaration order is also the
//! order the resolver processes them in, so two inputs differing only in
//! key order resolve identically.

use serde_json::{json, Value};

/// Closed set of value kinds a field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    String,
    Number,
    Bool,
    List,
    Mapping,
}

impl Kind {
    /// Returns the kind name used in validation reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Bool => "boolean",
            Kind::List => "list",
            Kind::Mapping => "mapping",
        }
    }

    /// Kind name of a parsed value, for expected/actual reporting
    pub fn of(value: &Value) -> &'static str {
        match value {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Array(_) => "list",
            Value::Object(_) => "mapping",
            Value::Null => "null",
        }
    }

    /// Whether a parsed value has this kind
    pub fn matches(&self, value: &Value) -> bool {
        self.as_str() == Kind::of(value)
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single declared field.
///
/// `path` is dot-separated for nested fields; a `Mapping` field declares the
/// container, and its children are declared as separate specs under the
/// container's path.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Dot-separated key path (e.g. "limits.timeout_seconds")
    pub path: &'static str,

    /// Expected value kind
    pub kind: Kind,

    /// Whether absence is a validation error
    pub required: bool,

    /// Value used when the field is absent, or when its placeholder's
    /// environment variable is not set
    pub default: Option<Value>,

    /// Environment variable consulted when the field is absent entirely
    pub env: Option<&'static str>,

    /// Element kind for `List` fields
    pub element_kind: Option<Kind>,
}

impl FieldSpec {
    /// A field whose absence fails validation
    pub fn required(path: &'static str, kind: Kind) -> Self {
        Self {
            path,
            kind,
            required: true,
            default: None,
            env: None,
            element_kind: None,
        }
    }

    /// A field that may be absent
    pub fn optional(path: &'static str, kind: Kind) -> Self {
        Self {
            required: false,
            ..Self::required(path, kind)
        }
    }

    /// Set the default value
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Set the environment variable consulted when the field is absent
    pub fn with_env(mut self, var: &'static str) -> Self {
        self.env = Some(var);
        self
    }

    /// Set the element kind for a list field
    pub fn with_element(mut self, kind: Kind) -> Self {
        self.element_kind = Some(kind);
        self
    }
}

/// The declaration-ordered field list.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up a field by exact path
    pub fn lookup(&self, path: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.path == path)
    }

    /// Whether any declared field lives underneath the given path
    pub fn has_children(&self, path: &str) -> bool {
        self.fields
            .iter()
            .any(|f| f.path.len() > path.len() && f.path.starts_with(path) && f.path.as_bytes()[path.len()] == b'.')
    }

    /// The schema this binary ships with.
    pub fn builtin() -> Self {
        Self::new(vec![
            FieldSpec::required("service", Kind::String),
            FieldSpec::required("region", Kind::String),
            FieldSpec::optional("retries", Kind::Number).with_default(json!(3)),
            FieldSpec::optional("log_level", Kind::String)
                .with_default(json!("info"))
                .with_env("LOG_LEVEL"),
            FieldSpec::optional("debug", Kind::Bool).with_default(json!(false)),
            FieldSpec::optional("endpoints", Kind::List)
                .with_element(Kind::String)
                .with_default(json!([])),
            FieldSpec::optional("limits", Kind::Mapping),
            FieldSpec::optional("limits.timeout_seconds", Kind::Number).with_default(json!(30)),
            FieldSpec::optional("limits.max_body_bytes", Kind::Number).with_default(json!(1_048_576)),
        ])
    }
}

/// Navigate a value tree by dot-separated path
pub fn lookup_path<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = tree;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}
