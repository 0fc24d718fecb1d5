//! Shared helpers for integration tests.

use std::collections::BTreeMap;

use jsonfield::{DocumentOptions, DocumentRegistry, JsonDocument};
use serde_json::Value as Json;

/// Builds a defaults map from literal pairs.
pub fn defaults(pairs: &[(&str, Json)]) -> BTreeMap<String, Json> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Minimal record-layer stand-in: raw string attributes plus a registry,
/// wired the way a persistence layer would use the crate at its boundary.
pub struct TestRecord {
    pub attributes: BTreeMap<String, String>,
    pub registry: DocumentRegistry,
}

impl TestRecord {
    /// Loads a record from its persisted string attributes.
    pub fn load<const N: usize>(attributes: [(&str, &str); N]) -> Self {
        Self {
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            registry: DocumentRegistry::new(),
        }
    }

    /// The lazy field access path: hands the stored raw value to the
    /// registry the first time, reuses the document afterwards.
    pub fn json_field(&self, name: &str) -> JsonDocument {
        self.json_field_with(name, BTreeMap::new(), DocumentOptions::default())
    }

    pub fn json_field_with(
        &self,
        name: &str,
        defaults: BTreeMap<String, Json>,
        options: DocumentOptions,
    ) -> JsonDocument {
        let raw = self.attributes.get(name).cloned().unwrap_or_default();
        self.registry.ensure(name, raw, defaults, options)
    }

    /// The pre-save write-back path: every JSON field goes back into raw
    /// attribute storage as a canonical string.
    pub fn write_back(&mut self) -> jsonfield::Result<()> {
        for (field, encoded) in self.registry.encode_all()? {
            self.attributes.insert(field, encoded);
        }
        Ok(())
    }
}
