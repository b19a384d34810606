//! The Value type - what handlers read and write.
//!
//! A dynamically-typed tree able to hold the contents of any configuration or
//! data file, plus two variants that only the tree layer produces:
//! [`Value::Missing`], the sentinel for intentionally absent data, and
//! [`Value::Config`], the ordered result of reading a nested tree.

use std::collections::BTreeMap;

/// The MISSING sentinel.
///
/// Returned in place of data when a filtered read is skipped; a field whose
/// value is `MISSING` is skipped by filtered writes.
pub const MISSING: Value = Value::Missing;

/// A tree-shaped value read from or written to a file.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Intentionally absent data. Never produced by decoding a file.
    Missing,
    /// Explicit null, as found in file contents.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Key-value map with string keys, as found in file contents.
    Map(BTreeMap<String, Value>),
    /// The fields of a nested tree, in declaration order.
    Config(Config),
}

impl Value {
    /// Create an empty map.
    pub fn map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Check if this value is the MISSING sentinel.
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_config(&self) -> Option<&Config> {
        match self {
            Value::Config(config) => Some(config),
            _ => None,
        }
    }

    /// A short name for the kind of value, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Missing => "MISSING",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Config(_) => "config",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<Config> for Value {
    fn from(v: Config) -> Self {
        Value::Config(v)
    }
}

/// An insertion-ordered mapping from field name to value.
///
/// `Tree::read` produces one, with keys in the order the fields were declared,
/// and `Tree::write` consumes one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    entries: Vec<(String, Value)>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert a value, returning the previous value for `name` if there was one.
    ///
    /// Replacing keeps the original position of the key.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
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

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Config {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = Config::new();
        for (key, value) in iter {
            config.insert(key, value);
        }
        config
    }
}

impl IntoIterator for Config {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_is_distinct_from_null() {
        assert!(MISSING.is_missing());
        assert_ne!(MISSING, Value::Null);
        assert!(!Value::Null.is_missing());
        assert_eq!(Value::default(), Value::Null);
    }

    #[test]
    fn config_preserves_insertion_order() {
        let mut config = Config::new();
        config.insert("zeta", 1);
        config.insert("alpha", 2);
        config.insert("mu", 3);

        assert_eq!(config.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mu"]);
    }

    #[test]
    fn config_replace_keeps_position() {
        let mut config: Config = [("a", 1), ("b", 2)].into_iter().collect();
        let old = config.insert("a", 10);

        assert_eq!(old, Some(Value::Integer(1)));
        assert_eq!(config.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(config.get("a"), Some(&Value::Integer(10)));
    }

    #[test]
    fn config_remove() {
        let mut config: Config = [("a", "x"), ("b", "y")].into_iter().collect();
        assert_eq!(config.remove("a"), Some(Value::from("x")));
        assert_eq!(config.remove("a"), None);
        assert_eq!(config.len(), 1);
        assert!(!config.contains_key("a"));
    }

    #[test]
    fn kind_names() {
        assert_eq!(MISSING.kind(), "MISSING");
        assert_eq!(Value::from(vec![1, 2]).kind(), "array");
        assert_eq!(Value::from(Config::new()).kind(), "config");
    }
}
