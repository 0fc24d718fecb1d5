//! Tracked JSON documents.
//!
//! This module provides [`JsonDocument`], the wrapper around one field's
//! JSON-decoded value. A document remembers the decoded shape it was loaded
//! with, exposes a live mutable key/value state (including in-place mutable
//! nested containers), layers configured defaults over absent keys, and
//! reports exactly which keys have changed since load.
//!
//! # Usage
//!
//! ```
//! # use std::collections::BTreeMap;
//! # use jsonfield::{DocumentOptions, JsonDocument};
//! let doc = JsonDocument::new(
//!     r#"{"name":"Alice","tags":["a"]}"#,
//!     BTreeMap::new(),
//!     DocumentOptions::default(),
//! );
//!
//! doc.set("name", "Bob");
//! doc.get("tags").unwrap().as_list().unwrap().push("b");
//!
//! let dirty = doc.dirty();
//! assert_eq!(dirty.len(), 2);
//! assert_eq!(doc.encode().unwrap(), r#"{"name":"Bob","tags":["a","b"]}"#);
//! ```

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
    fmt,
    rc::Rc,
};

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::debug;

// Submodules
pub mod errors;
pub mod value;

// Convenience re-exports for core document types
pub use errors::DocError;
pub use value::{List, Map, Value};

/// Options controlling how a document reports changes.
///
/// Supplied once at construction and never mutated afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOptions {
    /// When set, a key whose live value still equals its configured default
    /// is excluded from the dirty set even if it differs from the original
    /// snapshot. "Still at default" then counts as clean regardless of
    /// history.
    #[serde(default)]
    pub suppress_default_dirty: bool,
}

impl DocumentOptions {
    /// Creates the default option set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to enable or disable default suppression
    pub fn with_suppress_default_dirty(mut self, enabled: bool) -> Self {
        self.suppress_default_dirty = enabled;
        self
    }
}

/// A field's raw attribute value as handed over by the record layer:
/// either the persisted JSON string or an already-decoded value.
#[derive(Debug, Clone)]
pub enum RawDocument {
    /// A JSON-encoded string, as stored at rest
    Encoded(String),
    /// An already-decoded JSON value
    Decoded(Json),
}

impl RawDocument {
    /// Decodes into the snapshot map.
    ///
    /// Empty strings, `"null"`, unparseable text, and non-object top levels
    /// all degrade to the empty document. Parse failures are logged and
    /// never surfaced.
    fn decode(self) -> BTreeMap<String, Json> {
        match self {
            RawDocument::Encoded(text) => {
                let text = text.trim();
                if text.is_empty() || text == "null" {
                    return BTreeMap::new();
                }
                match serde_json::from_str::<Json>(text) {
                    Ok(json) => Self::object_entries(json),
                    Err(err) => {
                        debug!(%err, "malformed JSON source, treating as empty document");
                        BTreeMap::new()
                    }
                }
            }
            RawDocument::Decoded(json) => Self::object_entries(json),
        }
    }

    fn object_entries(json: Json) -> BTreeMap<String, Json> {
        match json {
            Json::Object(entries) => entries.into_iter().collect(),
            Json::Null => BTreeMap::new(),
            _ => {
                debug!("non-object JSON source, treating as empty document");
                BTreeMap::new()
            }
        }
    }
}

impl From<&str> for RawDocument {
    fn from(text: &str) -> Self {
        RawDocument::Encoded(text.to_string())
    }
}

impl From<String> for RawDocument {
    fn from(text: String) -> Self {
        RawDocument::Encoded(text)
    }
}

impl From<Json> for RawDocument {
    fn from(json: Json) -> Self {
        RawDocument::Decoded(json)
    }
}

/// A tracked JSON document: one field's original snapshot, live mutable
/// state, configured defaults, and the encode/diff logic.
///
/// The document is a shared handle: all state lives behind `Rc`, so cloning
/// yields another handle onto the same live state and dirty history. This
/// mirrors the by-reference binding between a record and its field values,
/// and it is why mutators take `&self`.
///
/// Nested containers returned by [`get`](Self::get) or
/// [`current`](Self::current) alias the document's own slots: mutating them
/// in place is visible in [`dirty`](Self::dirty) and
/// [`encode`](Self::encode) without re-assigning the top-level key.
///
/// # Examples
///
/// ```
/// # use std::collections::BTreeMap;
/// # use jsonfield::{DocumentOptions, JsonDocument};
/// # use serde_json::json;
/// let mut defaults = BTreeMap::new();
/// defaults.insert("retries".to_string(), json!(3));
///
/// let doc = JsonDocument::new(r#"{"host":"db1"}"#, defaults, DocumentOptions::default());
///
/// // Defaults are layered over absent keys without dirtying them.
/// assert_eq!(doc.get_as::<i64>("retries"), Some(3));
/// assert!(doc.dirty().is_empty());
///
/// doc.set("host", "db2");
/// assert_eq!(doc.dirty().get("host"), Some(&json!("db2")));
/// ```
#[derive(Debug, Clone)]
pub struct JsonDocument {
    /// What was loaded: immutable after construction
    original: Rc<BTreeMap<String, Json>>,
    /// What the caller currently sees and can mutate
    live: Map,
    /// Configured defaults, layered over absent keys at construction
    defaults: Rc<BTreeMap<String, Json>>,
    /// Keys whose live value came from default layering and has not been
    /// explicitly written since. Such keys stay clean while still equal to
    /// their default.
    seeded: Rc<RefCell<BTreeSet<String>>>,
    options: DocumentOptions,
}

impl JsonDocument {
    /// Constructs a document from a raw attribute value.
    ///
    /// The raw value is decoded (or forwarded if already structured) into
    /// the original snapshot, the live state is initialized from it, and
    /// each default whose key is absent is layered on top. Defaults never
    /// overwrite a key that is already present.
    pub fn new(
        raw: impl Into<RawDocument>,
        defaults: BTreeMap<String, Json>,
        options: DocumentOptions,
    ) -> Self {
        let original = raw.into().decode();

        let live = Map::new();
        for (key, value) in &original {
            live.insert(key.clone(), Value::from(value.clone()));
        }

        let mut seeded = BTreeSet::new();
        for (key, value) in &defaults {
            if !live.contains_key(key) {
                live.insert(key.clone(), Value::from(value.clone()));
                seeded.insert(key.clone());
            }
        }

        Self {
            original: Rc::new(original),
            live,
            defaults: Rc::new(defaults),
            seeded: Rc::new(RefCell::new(seeded)),
            options,
        }
    }

    /// Creates an empty document with no defaults and default options
    pub fn empty() -> Self {
        Self::new(Json::Null, BTreeMap::new(), DocumentOptions::default())
    }

    /// Returns the options this document was constructed with
    pub fn options(&self) -> DocumentOptions {
        self.options
    }

    /// Returns the configured defaults
    pub fn defaults(&self) -> &BTreeMap<String, Json> {
        &self.defaults
    }

    /// Gets the current value for a key.
    ///
    /// Returns `None` for keys that were never set and have no default.
    /// Container values are aliasing handles: in-place mutation through
    /// them is visible through the document. Reading does not create keys.
    pub fn get(&self, key: impl AsRef<str>) -> Option<Value> {
        self.live.get(key.as_ref())
    }

    /// Gets a value by key with automatic type conversion.
    ///
    /// Returns `None` if the key doesn't exist or the conversion fails.
    ///
    /// ```
    /// # use std::collections::BTreeMap;
    /// # use jsonfield::{DocumentOptions, JsonDocument};
    /// let doc = JsonDocument::new(r#"{"age":30}"#, BTreeMap::new(), DocumentOptions::default());
    /// assert_eq!(doc.get_as::<i64>("age"), Some(30));
    /// assert_eq!(doc.get_as::<String>("age"), None);
    /// ```
    pub fn get_as<T>(&self, key: impl AsRef<str>) -> Option<T>
    where
        T: TryFrom<Value, Error = DocError>,
    {
        self.get(key).and_then(|value| T::try_from(value).ok())
    }

    /// Gets a key's value deserialized into any `Deserialize` type
    pub fn get_typed<T>(&self, key: impl AsRef<str>) -> crate::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let key = key.as_ref();
        let value = self.get(key).ok_or_else(|| DocError::KeyNotFound {
            key: key.to_string(),
        })?;
        serde_json::from_value(value.to_json()).map_err(|e| {
            DocError::DeserializationFailed {
                reason: format!("key '{key}': {e}"),
            }
            .into()
        })
    }

    /// Stores a value under a key, overwriting any prior value
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        self.seeded.borrow_mut().remove(&key);
        self.live.insert(key, value);
    }

    /// Stores several key/value pairs at once
    pub fn set_many<I, K, V>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in entries {
            self.set(key, value);
        }
    }

    /// Stores any `Serialize` value under a key
    pub fn set_typed<T: Serialize>(&self, key: impl Into<String>, value: &T) -> crate::Result<()> {
        let json = serde_json::to_value(value).map_err(|e| DocError::SerializationFailed {
            reason: e.to_string(),
        })?;
        self.set(key, Value::from(json));
        Ok(())
    }

    /// Returns true iff the key resolves to a defined, non-null value
    pub fn has(&self, key: impl AsRef<str>) -> bool {
        match self.live.get(key.as_ref()) {
            Some(value) => !value.is_null(),
            None => false,
        }
    }

    /// Returns true if the key is present in the live state, even as null
    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.live.contains_key(key.as_ref())
    }

    /// Deletes a key from the live state entirely.
    ///
    /// The key disappears from subsequent encodes and reads as absent, not
    /// as null. Returns the removed value if the key was present.
    pub fn remove(&self, key: impl AsRef<str>) -> Option<Value> {
        let key = key.as_ref();
        self.seeded.borrow_mut().remove(key);
        self.live.remove(key)
    }

    /// Returns the whole original snapshot.
    ///
    /// Never reflects post-construction mutations.
    pub fn original(&self) -> &BTreeMap<String, Json> {
        &self.original
    }

    /// Returns the original value at a key, if it was present at load time
    pub fn original_key(&self, key: impl AsRef<str>) -> Option<&Json> {
        self.original.get(key.as_ref())
    }

    /// Returns the full live state as a map handle.
    ///
    /// The handle aliases the document's own state: in-place mutation
    /// through it is reflected in `dirty()` and `encode()`.
    pub fn current(&self) -> Map {
        self.live.clone()
    }

    /// Returns a detached deep copy of the live state
    pub fn to_json(&self) -> Json {
        self.live.to_json()
    }

    /// Returns the number of keys in the live state
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Returns true if the live state has no keys
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Returns the live keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        self.live.keys()
    }

    /// Computes the mapping of keys whose current value differs from clean.
    ///
    /// A key is dirty iff it is not suppressed by the default rules and
    /// either it is absent from the original snapshot or its current value
    /// is not deep-equal to its original value.
    ///
    /// Suppression: a key still holding the default it was seeded with at
    /// construction is clean; with
    /// [`suppress_default_dirty`](DocumentOptions::suppress_default_dirty),
    /// any key equal to its configured default is clean regardless of
    /// history.
    pub fn dirty(&self) -> BTreeMap<String, Json> {
        let mut dirty = BTreeMap::new();
        for (key, value) in self.live.entries() {
            if self.is_clean_default(&key, &value) {
                continue;
            }
            match self.original.get(&key) {
                Some(origin) if value == *origin => {}
                _ => {
                    dirty.insert(key, value.to_json());
                }
            }
        }
        dirty
    }

    /// Returns true if any key is dirty
    pub fn is_dirty(&self) -> bool {
        !self.dirty().is_empty()
    }

    fn is_clean_default(&self, key: &str, value: &Value) -> bool {
        let Some(default) = self.defaults.get(key) else {
            return false;
        };
        if *value != *default {
            return false;
        }
        self.options.suppress_default_dirty || self.seeded.borrow().contains(key)
    }

    /// Returns the canonical JSON serialization of the live state.
    ///
    /// Keys are emitted in sorted order, so documents with equal key sets
    /// and values produce identical strings. Removed keys are omitted;
    /// keys explicitly set to null are emitted as JSON `null`.
    pub fn encode(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(&self.live)?)
    }
}

impl Default for JsonDocument {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for JsonDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.live)
    }
}
