//! Session persistence.
//!
//! The persisted snapshot is a flat, serializable subset of the UI state:
//! code, the two flags, the comma-joined preset labels, and one boolean per
//! plugin. It is rebuilt and written whole after every settled change, to
//! both ports: an opaque blob under a fixed storage key, and a flat
//! string map encoded as a query string. On load, query values override
//! stored values per key.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::form_urlencoded;

use crate::error::PersistError;
use crate::registry;

/// Fixed key the state blob is stored under.
pub const STORAGE_KEY: &str = "replState";

/// Flattened persisted snapshot of the playground state.
///
/// Every field has a substitute default: empty strings, false booleans,
/// `line_wrap` true. There is no lifecycle beyond being overwritten on each
/// write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedState {
    /// Source code.
    pub code: String,
    /// Evaluate-after-compile flag.
    pub evaluate: bool,
    /// Source panel line wrapping flag.
    pub line_wrap: bool,
    /// Comma-joined labels of the active presets (plus `babili` when that
    /// plugin is active).
    pub presets: String,
    /// Per-plugin enabled flags, keyed by package id, flattened into the
    /// top level of the serialized form.
    #[serde(flatten)]
    pub plugins: BTreeMap<String, bool>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            code: String::new(),
            evaluate: false,
            line_wrap: true,
            presets: String::new(),
            plugins: BTreeMap::new(),
        }
    }
}

impl PersistedState {
    /// Reconstruct a fully-populated snapshot from the two sources.
    ///
    /// The storage blob (JSON) supplies the base; query values override it
    /// per key. Neither source is mutated; missing fields fall back to the
    /// defaults. An unparseable blob degrades to defaults.
    pub fn from_sources(blob: Option<&str>, query: &HashMap<String, String>) -> Self {
        let mut state = match blob {
            Some(blob) => serde_json::from_str(blob).unwrap_or_else(|error| {
                warn!(%error, "discarding unparseable state blob");
                Self::default()
            }),
            None => Self::default(),
        };
        state.apply_query(query);
        state
    }

    /// Override fields from a flat query map, one key at a time.
    ///
    /// Booleans parse `"true"` as true and anything else as false. Keys
    /// matching no field and no known plugin are ignored.
    fn apply_query(&mut self, query: &HashMap<String, String>) {
        for (key, value) in query {
            match key.as_str() {
                "code" => self.code = value.clone(),
                "evaluate" => self.evaluate = parse_bool(value),
                "lineWrap" => self.line_wrap = parse_bool(value),
                "presets" => self.presets = value.clone(),
                package if registry::PLUGINS.iter().any(|c| c.package == package) => {
                    self.plugins.insert(package.to_string(), parse_bool(value));
                }
                _ => {}
            }
        }
    }

    /// Serialize to the storage blob.
    pub fn to_blob(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Flatten to ordered query pairs.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("code".to_string(), self.code.clone()),
            ("evaluate".to_string(), self.evaluate.to_string()),
            ("lineWrap".to_string(), self.line_wrap.to_string()),
            ("presets".to_string(), self.presets.clone()),
        ];
        for (package, enabled) in &self.plugins {
            pairs.push((package.clone(), enabled.to_string()));
        }
        pairs
    }
}

fn parse_bool(value: &str) -> bool {
    value == "true"
}

/// Encode query pairs as a query string.
pub fn encode_query(pairs: &[(String, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Parse a query string into a flat map.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Key-value storage of the opaque state blob.
pub trait StateStore: Send {
    /// Read the blob stored under `key`, if any.
    fn load(&self, key: &str) -> Option<String>;
    /// Overwrite the blob stored under `key`.
    fn save(&mut self, key: &str, blob: &str) -> Result<(), PersistError>;
}

/// Read/write access to the location's query string.
pub trait QueryPort: Send {
    /// Parse the current query string into a flat map.
    fn read(&self) -> HashMap<String, String>;
    /// Replace the query string.
    fn write(&mut self, query: &str) -> Result<(), PersistError>;
}

/// In-memory store, for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a blob under [`STORAGE_KEY`].
    pub fn with_blob(blob: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.entries.insert(STORAGE_KEY.to_string(), blob.into());
        store
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<(), PersistError> {
        self.entries.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

/// In-memory query string, for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryQuery {
    current: String,
}

impl MemoryQuery {
    /// Empty query string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Query string pre-seeded from pairs.
    pub fn with_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            current: encode_query(pairs),
        }
    }

    /// The raw query string as last written.
    pub fn current(&self) -> &str {
        &self.current
    }
}

impl QueryPort for MemoryQuery {
    fn read(&self) -> HashMap<String, String> {
        parse_query(&self.current)
    }

    fn write(&mut self, query: &str) -> Result<(), PersistError> {
        self.current = query.to_string();
        Ok(())
    }
}

/// File-backed store: one JSON object mapping keys to blobs.
///
/// Stands in for browser local storage so sessions survive restarts.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store backed by the file at `path`. The file is created on first
    /// save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_entries(&self) -> HashMap<String, String> {
        let Ok(contents) = fs::read_to_string(&self.path) else {
            return HashMap::new();
        };
        serde_json::from_str(&contents).unwrap_or_else(|error| {
            warn!(path = %self.path.display(), %error, "ignoring corrupt state file");
            HashMap::new()
        })
    }
}

impl StateStore for FileStore {
    fn load(&self, key: &str) -> Option<String> {
        self.read_entries().remove(key)
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<(), PersistError> {
        let mut entries = self.read_entries();
        entries.insert(key.to_string(), blob.to_string());
        fs::write(&self.path, serde_json::to_string(&entries)?)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_both_sources_empty() {
        let state = PersistedState::from_sources(None, &HashMap::new());
        assert_eq!(state, PersistedState::default());
        assert!(state.line_wrap);
        assert!(!state.evaluate);
        assert_eq!(state.code, "");
        assert_eq!(state.presets, "");
    }

    #[test]
    fn test_query_overrides_storage_per_key() {
        let blob = r#"{"code":"stored","evaluate":true,"lineWrap":false,"presets":"es2015"}"#;
        let query = HashMap::from([
            ("code".to_string(), "from query".to_string()),
            ("lineWrap".to_string(), "true".to_string()),
        ]);

        let state = PersistedState::from_sources(Some(blob), &query);
        assert_eq!(state.code, "from query");
        assert!(state.line_wrap);
        // Keys absent from the query keep the stored value.
        assert!(state.evaluate);
        assert_eq!(state.presets, "es2015");
    }

    #[test]
    fn test_unparseable_blob_degrades_to_defaults() {
        let state = PersistedState::from_sources(Some("{not json"), &HashMap::new());
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn test_plugin_flags_flatten() {
        let mut state = PersistedState::default();
        state.plugins.insert("prettier".to_string(), true);

        let blob = state.to_blob().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(parsed["prettier"], serde_json::Value::Bool(true));

        let restored = PersistedState::from_sources(Some(&blob), &HashMap::new());
        assert_eq!(restored, state);
    }

    #[test]
    fn test_query_plugin_key_recognized_unknown_ignored() {
        let query = HashMap::from([
            ("prettier".to_string(), "true".to_string()),
            ("mystery".to_string(), "true".to_string()),
        ]);
        let state = PersistedState::from_sources(None, &query);
        assert_eq!(state.plugins.get("prettier"), Some(&true));
        assert!(!state.plugins.contains_key("mystery"));
    }

    #[test]
    fn test_query_roundtrip() {
        let mut state = PersistedState {
            code: "const a = () => 1;".to_string(),
            evaluate: true,
            line_wrap: false,
            presets: "es2015,react".to_string(),
            ..PersistedState::default()
        };
        state.plugins.insert("babili-standalone".to_string(), true);

        let encoded = encode_query(&state.to_query_pairs());
        let restored = PersistedState::from_sources(None, &parse_query(&encoded));
        assert_eq!(restored, state);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut store = FileStore::new(&path);
        assert!(store.load(STORAGE_KEY).is_none());

        store.save(STORAGE_KEY, r#"{"code":"x"}"#).unwrap();
        assert_eq!(store.load(STORAGE_KEY).as_deref(), Some(r#"{"code":"x"}"#));

        // A second store over the same file sees the saved blob.
        let store = FileStore::new(&path);
        assert_eq!(store.load(STORAGE_KEY).as_deref(), Some(r#"{"code":"x"}"#));
    }

    #[test]
    fn test_file_store_corrupt_file_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json at all").unwrap();

        let store = FileStore::new(&path);
        assert!(store.load(STORAGE_KEY).is_none());
    }
}
