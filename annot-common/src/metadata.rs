//! Optional JSON side-files keyed by sample path
//!
//! A side-file is a JSON object mapping a sample reference to a value. Each
//! entry is expanded into all three lookup keys (see [`crate::keys`]) so a
//! sample can be matched however the author wrote the key. Later entries
//! overwrite earlier ones when their derived keys collide.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::groups::GroupId;
use crate::keys;

/// Lookup key → value, built once at startup and read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct MetadataMap<V = Value> {
    entries: HashMap<String, V>,
}

/// Side-file whose values must be valid group ids
pub type GroupMap = MetadataMap<GroupId>;

impl<V> MetadataMap<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Insert `value` under every lookup key derived from `key`
    pub fn insert_expanded(&mut self, key: &str, value: V)
    where
        V: Clone,
    {
        for derived in keys::lookup_keys(key) {
            self.entries.insert(derived.to_string(), value.clone());
        }
    }

    /// Exact lookup by a single key
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Resolve a sample path: full path, then base filename, then stem
    pub fn resolve(&self, sample: &str) -> Option<&V> {
        keys::lookup_keys(sample)
            .into_iter()
            .find_map(|key| self.entries.get(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetadataMap<Value> {
    /// Load a category/intention side-file
    ///
    /// An empty path or a missing file yields an empty map. Malformed JSON,
    /// or a document that is not an object, is a [`Error::MetadataLoad`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut map = Self::new();
        let Some(raw) = read_object(path)? else {
            return Ok(map);
        };
        for (key, value) in raw {
            map.insert_expanded(&key, value);
        }
        Ok(map)
    }

    /// Resolve a sample, skipping empty values
    ///
    /// `null`, `""`, `false`, `0` and empty arrays or objects fall through
    /// to the next lookup key.
    pub fn resolve_present(&self, sample: &str) -> Option<&Value> {
        keys::lookup_keys(sample)
            .into_iter()
            .filter_map(|key| self.entries.get(key))
            .find(|value| !is_empty_value(value))
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

impl MetadataMap<GroupId> {
    /// Load a group side-file
    ///
    /// Entries whose value is not a valid group id are dropped one by one;
    /// the rest of the file still loads.
    pub fn load_groups(path: Option<&Path>) -> Result<Self> {
        let mut map = Self::new();
        let Some(raw) = read_object(path)? else {
            return Ok(map);
        };
        let mut dropped = 0usize;
        for (key, value) in raw {
            match GroupId::from_json(&value) {
                Some(group) => map.insert_expanded(&key, group),
                None => {
                    dropped += 1;
                    tracing::debug!("Ignoring group entry {:?} with value {}", key, value);
                }
            }
        }
        if dropped > 0 {
            tracing::warn!("Dropped {} group entries with invalid group ids", dropped);
        }
        Ok(map)
    }
}

/// Read a side-file as a JSON object, or None when there is nothing to read
fn read_object(path: Option<&Path>) -> Result<Option<serde_json::Map<String, Value>>> {
    let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(None);
    };
    if !path.is_file() {
        tracing::debug!("Side-file not present: {}", path.display());
        return Ok(None);
    }

    let load_error = |reason: String| Error::MetadataLoad {
        path: path.to_path_buf(),
        reason,
    };
    let content = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
    match serde_json::from_str::<Value>(&content).map_err(|e| load_error(e.to_string()))? {
        Value::Object(raw) => {
            tracing::info!("Loaded {} entries from {}", raw.len(), path.display());
            Ok(Some(raw))
        }
        other => Err(load_error(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_path_is_empty() {
        assert!(MetadataMap::load(None).unwrap().is_empty());
        assert!(MetadataMap::load(Some(Path::new(""))).unwrap().is_empty());
        assert!(MetadataMap::load(Some(Path::new("/nonexistent/categories.json")))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_entry_resolves_by_all_three_keys() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "categories.json", r#"{"sub/dir/img.png": "kitchen"}"#);
        let map = MetadataMap::load(Some(&path)).unwrap();

        assert_eq!(map.get("sub/dir/img.png"), Some(&json!("kitchen")));
        assert_eq!(map.get("img.png"), Some(&json!("kitchen")));
        assert_eq!(map.get("img"), Some(&json!("kitchen")));
        assert_eq!(map.resolve("other/img.jpg"), Some(&json!("kitchen")));
    }

    #[test]
    fn test_resolve_prefers_full_path() {
        let mut map = MetadataMap::new();
        map.insert_expanded("img", json!("by-stem"));
        map.insert_expanded("a/img.png", json!("by-path"));
        map.insert_expanded("img", json!("stem-again"));

        assert_eq!(map.resolve("a/img.png"), Some(&json!("by-path")));
        assert_eq!(map.resolve("b/img.png"), Some(&json!("by-path")));
        assert_eq!(map.resolve("b/img.jpg"), Some(&json!("stem-again")));
    }

    #[test]
    fn test_resolve_present_skips_null() {
        let mut map = MetadataMap::new();
        map.insert_expanded("img", json!("fallback"));
        map.insert_expanded("a/img.png", Value::Null);
        map.insert_expanded("img", json!("fallback"));

        assert_eq!(map.resolve("a/img.png"), Some(&Value::Null));
        assert_eq!(map.resolve_present("a/img.png"), Some(&json!("fallback")));
    }

    #[test]
    fn test_resolve_present_skips_empty_string() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "categories.json", r#"{"img": "cat", "a/img.png": ""}"#);
        let map = MetadataMap::load(Some(&path)).unwrap();

        assert_eq!(map.resolve("a/img.png"), Some(&json!("")));
        assert_eq!(map.resolve_present("a/img.png"), Some(&json!("cat")));
    }

    #[test]
    fn test_malformed_json_fails_load() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "categories.json", "{not json");
        let err = MetadataMap::load(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::MetadataLoad { .. }));
    }

    #[test]
    fn test_non_object_fails_load() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "categories.json", r#"["a.png"]"#);
        let err = MetadataMap::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_group_map_drops_invalid_values_only() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "groups.json",
            r#"{"a.png": "1", "b": 2, "c.jpg": "3", "d": " 2 ", "e": true, "f": null}"#,
        );
        let map = MetadataMap::load_groups(Some(&path)).unwrap();

        assert_eq!(map.resolve("a.png"), Some(&GroupId::One));
        assert_eq!(map.resolve("x/b.png"), Some(&GroupId::Two));
        assert_eq!(map.resolve("d.webp"), Some(&GroupId::Two));
        assert_eq!(map.resolve("c.jpg"), None);
        assert_eq!(map.resolve("e.png"), None);
        assert_eq!(map.resolve("f.png"), None);
    }
}
