//! Structural query keys.

use serde_json::Value;
use std::fmt;

/// A single primitive component of a query key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
  Str(String),
  Int(i64),
  Bool(bool),
  Null,
}

impl KeyPart {
  fn to_json(&self) -> Value {
    match self {
      KeyPart::Str(s) => Value::String(s.clone()),
      KeyPart::Int(i) => Value::from(*i),
      KeyPart::Bool(b) => Value::Bool(*b),
      KeyPart::Null => Value::Null,
    }
  }
}

impl From<&str> for KeyPart {
  fn from(value: &str) -> Self {
    KeyPart::Str(value.to_string())
  }
}

impl From<String> for KeyPart {
  fn from(value: String) -> Self {
    KeyPart::Str(value)
  }
}

impl From<&String> for KeyPart {
  fn from(value: &String) -> Self {
    KeyPart::Str(value.clone())
  }
}

impl From<i64> for KeyPart {
  fn from(value: i64) -> Self {
    KeyPart::Int(value)
  }
}

impl From<u32> for KeyPart {
  fn from(value: u32) -> Self {
    KeyPart::Int(i64::from(value))
  }
}

impl From<bool> for KeyPart {
  fn from(value: bool) -> Self {
    KeyPart::Bool(value)
  }
}

impl<T: Into<KeyPart>> From<Option<T>> for KeyPart {
  fn from(value: Option<T>) -> Self {
    value.map(Into::into).unwrap_or(KeyPart::Null)
  }
}

/// Identifier for a cacheable fetch: a resource name followed by its parameters.
///
/// Two keys with equal components address the same cache entry. The cache
/// never relies on key identity, only on [`QueryKey::cache_hash`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
  parts: Vec<KeyPart>,
}

impl QueryKey {
  /// Create a key for a resource with no parameters.
  pub fn new(resource: impl Into<String>) -> Self {
    Self {
      parts: vec![KeyPart::Str(resource.into())],
    }
  }

  /// Build a key from already converted parts.
  pub fn from_parts(parts: Vec<KeyPart>) -> Self {
    Self { parts }
  }

  /// Append a parameter component.
  pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
    self.parts.push(part.into());
    self
  }

  /// Deterministic serialization used as the cache map lookup key.
  ///
  /// Encoded as a JSON array so `"2"` and `2` stay distinct.
  pub fn cache_hash(&self) -> String {
    Value::Array(self.parts.iter().map(KeyPart::to_json).collect()).to_string()
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.cache_hash())
  }
}

/// Build a [`QueryKey`] from a list of primitive values.
///
/// ```ignore
/// let key = query_key!["payments", page, status];
/// ```
#[macro_export]
macro_rules! query_key {
  ($($part:expr),+ $(,)?) => {
    $crate::query::QueryKey::from_parts(vec![$($crate::query::KeyPart::from($part)),+])
  };
}
