//! Ordered dictionary model for generated case files.
//!
//! Entry order is significant: rendered files list keys in insertion order.
//! Sub-dictionaries are reference counted so two keys can point at one built
//! fragment (e.g. a solver block and its `Final` twin).

use std::sync::Arc;

use indexmap::IndexMap;

/// A single dictionary value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Bare token, written verbatim (`zeroGradient`, `1e-16`, `"(p|pcorr)"`).
    Word(String),
    Number(f64),
    /// Dimension set, written as `[M L T Θ N I J]`.
    Dimensions([i32; 7]),
    /// Keyword-prefixed value such as `uniform 101325` or `table (...)`.
    Tagged(String, Box<Value>),
    /// Bracketed items without a count: vectors and table rows.
    Tuple(Vec<Value>),
    /// Count-prefixed list: `2(a b)`.
    List(Vec<Value>),
    Dict(Arc<Dictionary>),
}

impl Value {
    pub fn word(token: impl Into<String>) -> Self {
        Value::Word(token.into())
    }

    pub fn tagged(keyword: impl Into<String>, value: impl Into<Value>) -> Self {
        Value::Tagged(keyword.into(), Box::new(value.into()))
    }

    /// `uniform <value>`.
    pub fn uniform(value: impl Into<Value>) -> Self {
        Value::tagged("uniform", value)
    }

    pub fn vector(components: [f64; 3]) -> Self {
        Value::Tuple(components.iter().copied().map(Value::Number).collect())
    }

    pub fn as_dict(&self) -> Option<&Arc<Dictionary>> {
        match self {
            Value::Dict(dict) => Some(dict),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Word(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Word(value)
    }
}

impl From<Dictionary> for Value {
    fn from(value: Dictionary) -> Self {
        Value::Dict(Arc::new(value))
    }
}

impl From<Arc<Dictionary>> for Value {
    fn from(value: Arc<Dictionary>) -> Self {
        Value::Dict(value)
    }
}

/// Insertion-ordered mapping from keys to values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    entries: IndexMap<String, Value>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace `key`. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Nested dictionary stored under `key`, if any.
    pub fn dict(&self, key: &str) -> Option<&Arc<Dictionary>> {
        self.get(key).and_then(Value::as_dict)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `FoamFile` header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoamHeader {
    pub class: String,
    /// Case-relative directory, e.g. `0`, `0/solid`, `system`.
    pub location: String,
    pub object: String,
}

impl FoamHeader {
    pub fn vol_scalar_field(location: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            class: "volScalarField".to_string(),
            location: location.into(),
            object: object.into(),
        }
    }

    pub fn dictionary(location: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            class: "dictionary".to_string(),
            location: location.into(),
            object: object.into(),
        }
    }
}

/// One generated file: header plus body.
#[derive(Debug, Clone, PartialEq)]
pub struct FoamDocument {
    pub header: FoamHeader,
    pub body: Dictionary,
}

/// Case-relative location of a region's directory under `base`
/// (`0` + `""` -> `0`, `0` + `solid` -> `0/solid`).
pub fn region_location(base: &str, rname: &str) -> String {
    if rname.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{rname}")
    }
}
