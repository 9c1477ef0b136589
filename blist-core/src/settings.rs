//! Per-node key/value settings.
//!
//! Settings are small typed values (bool, int, string) attached to a node,
//! e.g. `last_seen` on a buddy. Typed reads are lenient: asking for a key
//! stored with another type logs a warning and yields the zero value of
//! the requested type. Callers across the list rely on that default, so
//! the strict form is only offered through [`SettingsStore::try_get`].

use blist_types::{BlistError, Value, ValueKind};
use std::collections::BTreeMap;

/// Typed key/value map owned by a single node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsStore {
    values: BTreeMap<String, Value>,
}

impl SettingsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing whatever was under `key`.
    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    /// Remove a key. Returns the removed value, if any.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Check whether a key is present (of any type).
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Raw access to a stored value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Strict typed read.
    ///
    /// Returns `Ok(None)` when the key is absent and
    /// [`BlistError::TypeMismatch`] when it holds another type.
    pub fn try_get(&self, key: &str, expected: ValueKind) -> Result<Option<&Value>, BlistError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(value) if value.kind() == expected => Ok(Some(value)),
            Some(value) => Err(BlistError::TypeMismatch {
                key: key.to_string(),
                expected,
                found: value.kind(),
            }),
        }
    }

    /// Lenient typed read; missing keys and mismatches yield `None`.
    fn lenient(&self, key: &str, expected: ValueKind) -> Option<&Value> {
        match self.try_get(key, expected) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("setting read: {}", err);
                None
            }
        }
    }

    /// Read a bool, `false` when missing or mistyped.
    pub fn get_bool(&self, key: &str) -> bool {
        self.lenient(key, ValueKind::Bool)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Read an int, `0` when missing or mistyped.
    pub fn get_int(&self, key: &str) -> i64 {
        self.lenient(key, ValueKind::Int)
            .and_then(Value::as_int)
            .unwrap_or(0)
    }

    /// Read a string, `None` when missing or mistyped.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.lenient(key, ValueKind::String).and_then(Value::as_str)
    }

    /// Iterate over all settings in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of stored settings.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_roundtrip() {
        let mut store = SettingsStore::new();
        store.set("show_offline", Value::Bool(true));
        store.set("last_seen", Value::Int(1_700_000_000));
        store.set("note", Value::from("met at work"));

        assert!(store.get_bool("show_offline"));
        assert_eq!(store.get_int("last_seen"), 1_700_000_000);
        assert_eq!(store.get_string("note"), Some("met at work"));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn missing_keys_default() {
        let store = SettingsStore::new();
        assert!(!store.get_bool("nope"));
        assert_eq!(store.get_int("nope"), 0);
        assert_eq!(store.get_string("nope"), None);
        assert!(!store.contains("nope"));
    }

    #[test]
    fn mismatch_is_lenient() {
        let mut store = SettingsStore::new();
        store.set("last_seen", Value::from("yesterday"));

        assert_eq!(store.get_int("last_seen"), 0);
        assert!(!store.get_bool("last_seen"));
        assert_eq!(store.get_string("last_seen"), Some("yesterday"));
    }

    #[test]
    fn strict_read_reports_mismatch() {
        let mut store = SettingsStore::new();
        store.set("last_seen", Value::from("yesterday"));

        let err = store.try_get("last_seen", ValueKind::Int).unwrap_err();
        assert_eq!(
            err,
            BlistError::TypeMismatch {
                key: "last_seen".into(),
                expected: ValueKind::Int,
                found: ValueKind::String,
            }
        );
        assert_eq!(store.try_get("absent", ValueKind::Int), Ok(None));
    }

    #[test]
    fn overwrite_changes_type() {
        let mut store = SettingsStore::new();
        store.set("k", Value::Int(1));
        store.set("k", Value::Bool(true));
        assert!(store.get_bool("k"));
        assert_eq!(store.get_int("k"), 0);
    }

    #[test]
    fn remove_returns_old_value() {
        let mut store = SettingsStore::new();
        store.set("k", Value::Int(5));
        assert_eq!(store.remove("k"), Some(Value::Int(5)));
        assert_eq!(store.remove("k"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn iter_is_key_ordered() {
        let mut store = SettingsStore::new();
        store.set("b", Value::Int(2));
        store.set("a", Value::Int(1));
        let keys: Vec<&str> = store.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
