//! Field-name to tracked-document mapping.
//!
//! [`DocumentRegistry`] is the thin adaptation layer a record type uses for
//! its JSON-typed fields: one lazily constructed [`JsonDocument`] per field,
//! dot-notation dirty/original lookups across all fields, and the encoded
//! write-back set collected immediately before the record is persisted.
//!
//! Field accessors are explicit [`FieldAccessor`] handles rather than
//! dynamic dispatch: the record layer registers one per declared JSON field
//! and exposes it as the field-named method.

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    rc::Rc,
};

use serde_json::Value as Json;
use tracing::debug;

use crate::doc::{DocumentOptions, JsonDocument, RawDocument};

type FieldMap = Rc<RefCell<HashMap<String, JsonDocument>>>;

/// Maps field names to their tracked documents.
///
/// Documents are created lazily, one per declared JSON field, the first
/// time that field is read or written. An entry is never mutated in place:
/// re-assigning the whole field value through [`assign`](Self::assign)
/// builds a fresh document and discards the old one together with its dirty
/// history.
///
/// The registry is a shared handle, like [`JsonDocument`]: clones and
/// handed-out accessors observe the same field map.
///
/// # Examples
///
/// ```
/// # use std::collections::BTreeMap;
/// # use jsonfield::{DocumentOptions, DocumentRegistry};
/// # use serde_json::json;
/// let registry = DocumentRegistry::new();
/// let settings = registry.ensure(
///     "settings",
///     r#"{"foo":"bar"}"#,
///     BTreeMap::new(),
///     DocumentOptions::default(),
/// );
///
/// settings.set("foo", "baz");
/// assert_eq!(registry.original_for("settings.foo", json!(null)), json!("bar"));
/// assert_eq!(
///     registry.dirty_fields().unwrap().get("settings"),
///     Some(&r#"{"foo":"baz"}"#.to_string()),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocumentRegistry {
    documents: FieldMap,
}

impl DocumentRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing document for a field, constructing and storing
    /// one from the raw value if none exists yet.
    ///
    /// Called whenever the record layer reads a JSON-typed attribute. The
    /// raw value, defaults, and options are only consulted on first access.
    pub fn ensure(
        &self,
        field: impl Into<String>,
        raw: impl Into<RawDocument>,
        defaults: BTreeMap<String, Json>,
        options: DocumentOptions,
    ) -> JsonDocument {
        let field = field.into();
        if let Some(doc) = self.documents.borrow().get(&field) {
            return doc.clone();
        }
        debug!(field = %field, "creating tracked document");
        let doc = JsonDocument::new(raw, defaults, options);
        self.documents.borrow_mut().insert(field, doc.clone());
        doc
    }

    /// Builds a fresh document for a field, replacing any existing one.
    ///
    /// Called when the record layer re-assigns the whole attribute value.
    /// The previous document's dirty history is discarded; accessors bound
    /// to the field resolve to the new document from now on.
    pub fn assign(
        &self,
        field: impl Into<String>,
        raw: impl Into<RawDocument>,
        defaults: BTreeMap<String, Json>,
        options: DocumentOptions,
    ) -> JsonDocument {
        let field = field.into();
        if self.documents.borrow().contains_key(&field) {
            debug!(field = %field, "replacing tracked document");
        }
        let doc = JsonDocument::new(raw, defaults, options);
        self.documents.borrow_mut().insert(field, doc.clone());
        doc
    }

    /// Returns the document for a field, if one has been constructed
    pub fn get(&self, field: &str) -> Option<JsonDocument> {
        self.documents.borrow().get(field).cloned()
    }

    /// Returns a reusable accessor bound to a field name.
    ///
    /// The accessor resolves the registry's current document on every call,
    /// so it keeps working across [`assign`](Self::assign).
    pub fn accessor(&self, field: impl Into<String>) -> FieldAccessor {
        FieldAccessor {
            documents: Rc::clone(&self.documents),
            field: field.into(),
        }
    }

    /// Looks up an original value through a `field.key` dot path.
    ///
    /// Returns `default` when the path has no key part, the field has no
    /// document, or the key was not in that field's original snapshot.
    pub fn original_for(&self, dot_path: &str, default: Json) -> Json {
        let Some((field, key)) = dot_path.split_once('.') else {
            return default;
        };
        match self.get(field) {
            Some(doc) => doc.original_key(key).cloned().unwrap_or(default),
            None => default,
        }
    }

    /// Returns one field's dirty set, empty for unknown fields
    pub fn dirty_for(&self, field: &str) -> BTreeMap<String, Json> {
        self.get(field).map(|doc| doc.dirty()).unwrap_or_default()
    }

    /// Returns field name → encoded form for every field with changes.
    ///
    /// Fields with no changes are omitted entirely, so the result can be
    /// merged into a broader changed-attributes report.
    pub fn dirty_fields(&self) -> crate::Result<BTreeMap<String, String>> {
        let mut dirty = BTreeMap::new();
        for (field, doc) in self.documents.borrow().iter() {
            if doc.is_dirty() {
                dirty.insert(field.clone(), doc.encode()?);
            }
        }
        Ok(dirty)
    }

    /// Like [`dirty_fields`](Self::dirty_fields), with each changed field's
    /// dirty entries additionally flattened into `field.key` pairs.
    pub fn dirty_nested(&self) -> crate::Result<BTreeMap<String, Json>> {
        let mut dirty = BTreeMap::new();
        for (field, doc) in self.documents.borrow().iter() {
            let entries = doc.dirty();
            if entries.is_empty() {
                continue;
            }
            dirty.insert(field.clone(), Json::String(doc.encode()?));
            for (key, value) in entries {
                dirty.insert(format!("{field}.{key}"), value);
            }
        }
        Ok(dirty)
    }

    /// Returns field name → encoded form for every registered field.
    ///
    /// Collected immediately before the record is serialized or persisted,
    /// so each JSON field is written back as a canonical string.
    pub fn encode_all(&self) -> crate::Result<BTreeMap<String, String>> {
        let mut encoded = BTreeMap::new();
        for (field, doc) in self.documents.borrow().iter() {
            encoded.insert(field.clone(), doc.encode()?);
        }
        Ok(encoded)
    }

    /// Returns the registered field names in sorted order
    pub fn fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self.documents.borrow().keys().cloned().collect();
        fields.sort();
        fields
    }

    /// Returns the number of registered fields
    pub fn len(&self) -> usize {
        self.documents.borrow().len()
    }

    /// Returns true if no field has a document yet
    pub fn is_empty(&self) -> bool {
        self.documents.borrow().is_empty()
    }
}

/// A reusable handle bound to one field name.
///
/// Replaces the source's catch-all dynamic dispatch: the record layer hands
/// one of these out as the field-named method, and every
/// [`document`](Self::document) call resolves the registry's *current*
/// document for the field, so re-assignment is picked up transparently.
#[derive(Debug, Clone)]
pub struct FieldAccessor {
    documents: FieldMap,
    field: String,
}

impl FieldAccessor {
    /// The field name this accessor is bound to
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Resolves the current document for the bound field
    pub fn document(&self) -> Option<JsonDocument> {
        self.documents.borrow().get(&self.field).cloned()
    }
}
