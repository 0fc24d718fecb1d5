//! Document-level integration tests: construction, defaults, dirty
//! reporting, nested mutation visibility, and encoding.

use std::collections::BTreeMap;

use jsonfield::{DocumentOptions, JsonDocument, Value};
use serde_json::{Value as Json, json};

use crate::helpers::defaults;

fn plain(raw: &str) -> JsonDocument {
    JsonDocument::new(raw, BTreeMap::new(), DocumentOptions::default())
}

// ===== CONSTRUCTION =====

#[test]
fn test_document_from_string_and_value_sources() {
    let from_string = plain(r#"{"foo":"bar"}"#);
    let from_value = JsonDocument::new(
        json!({"foo": "bar"}),
        BTreeMap::new(),
        DocumentOptions::default(),
    );

    assert_eq!(from_string.to_json(), from_value.to_json());
    assert_eq!(from_string.original(), from_value.original());
}

#[test]
fn test_document_absorbs_bad_sources() {
    for raw in ["", "null", "not json at all", "{\"unterminated\": "] {
        let doc = plain(raw);
        assert!(doc.is_empty());
        assert!(doc.dirty().is_empty());
        assert_eq!(doc.encode().unwrap(), "{}");
    }
}

#[test]
fn test_document_usable_after_bad_source() {
    let doc = plain("garbage");
    doc.set("fresh", "start");
    assert_eq!(doc.encode().unwrap(), r#"{"fresh":"start"}"#);
    assert_eq!(doc.dirty(), defaults(&[("fresh", json!("start"))]));
}

// ===== READS AND WRITES =====

#[test]
fn test_unknown_key_is_absent_not_an_error() {
    let doc = plain(r#"{"foo":"bar"}"#);
    assert!(doc.get("never_set").is_none());
    assert!(!doc.has("never_set"));
    // The read must not have created a slot.
    assert_eq!(doc.keys(), vec!["foo".to_string()]);
}

#[test]
fn test_dirty_after_mutation() {
    let doc = plain(r#"{"foo":"bar"}"#);

    doc.set("foo", "bar2");
    assert_eq!(doc.dirty(), defaults(&[("foo", json!("bar2"))]));

    doc.set("foo2", "bar3");
    assert_eq!(
        doc.dirty(),
        defaults(&[("foo", json!("bar2")), ("foo2", json!("bar3"))])
    );
}

#[test]
fn test_removal_disappears_from_encode() {
    let doc = plain(r#"{"foo":"bar","other":2}"#);
    doc.remove("foo");

    assert!(!doc.has("foo"));
    assert_eq!(doc.encode().unwrap(), r#"{"other":2}"#);
    // Gone entirely, not set to null.
    assert!(!doc.contains_key("foo"));
}

#[test]
fn test_null_write_versus_removal() {
    let doc = plain(r#"{"a":1,"b":2}"#);
    doc.set("a", Value::Null);
    doc.remove("b");
    assert_eq!(doc.encode().unwrap(), r#"{"a":null}"#);
}

// ===== DEFAULTS =====

#[test]
fn test_default_layering() {
    let doc = JsonDocument::new(
        r#"{"foo":"bar"}"#,
        defaults(&[("bar2", json!("bar3"))]),
        DocumentOptions::default(),
    );

    assert_eq!(doc.to_json(), json!({"foo": "bar", "bar2": "bar3"}));
    assert!(doc.dirty().is_empty());
}

#[test]
fn test_default_suppression() {
    let doc = JsonDocument::new(
        r#"{"foo":"bar"}"#,
        defaults(&[("foo2", json!("bar2")), ("foo3", json!("bar3"))]),
        DocumentOptions::new().with_suppress_default_dirty(true),
    );

    assert!(doc.dirty().is_empty());

    doc.set("foo3", "bar4");
    let dirty = doc.dirty();
    assert_eq!(dirty, defaults(&[("foo3", json!("bar4"))]));
    assert!(!dirty.contains_key("foo2"));
}

// ===== NESTED MUTATION =====

#[test]
fn test_nested_mutation_visibility() {
    let doc = plain(r#"{"foo":{"bar1":["bar2"],"bar3":"bar4"}}"#);

    let foo = doc.get("foo").unwrap();
    foo.as_map().unwrap().insert(
        "bar3",
        Value::from(json!(["bar4", {"bar5": "bar6"}])),
    );

    let current = doc.to_json();
    assert_eq!(current["foo"]["bar3"], json!(["bar4", {"bar5": "bar6"}]));
    assert_eq!(
        doc.dirty().get("foo"),
        Some(&json!({"bar1": ["bar2"], "bar3": ["bar4", {"bar5": "bar6"}]}))
    );
}

#[test]
fn test_mutation_two_levels_deep() {
    let doc = plain(r#"{"a":{"b":{"c":1}}}"#);

    doc.get("a")
        .unwrap()
        .as_map()
        .unwrap()
        .get("b")
        .unwrap()
        .as_map()
        .unwrap()
        .insert("c", 2);

    assert_eq!(doc.dirty(), defaults(&[("a", json!({"b": {"c": 2}}))]));
    assert_eq!(doc.encode().unwrap(), r#"{"a":{"b":{"c":2}}}"#);
}

#[test]
fn test_repeated_gets_alias_the_same_container() {
    let doc = plain(r#"{"tags":[]}"#);

    let first = doc.get("tags").unwrap();
    let second = doc.get("tags").unwrap();
    first.as_list().unwrap().push("a");
    second.as_list().unwrap().push("b");

    assert_eq!(doc.to_json(), json!({"tags": ["a", "b"]}));
}

// ===== ENCODING =====

#[test]
fn test_round_trip() {
    let doc = plain(r#"{"a":[1,"two",null],"b":{"c":true}}"#);
    let reparsed: Json = serde_json::from_str(&doc.encode().unwrap()).unwrap();
    assert_eq!(reparsed, doc.to_json());
}

#[test]
fn test_encode_stability() {
    let doc = plain("{}");
    doc.set("b", 2);
    doc.set("a", 1);

    let other = plain(r#"{"a":1,"b":2}"#);
    assert_eq!(doc.encode().unwrap(), other.encode().unwrap());
    assert_eq!(doc.encode().unwrap(), doc.encode().unwrap());
}

#[test]
fn test_dirty_idempotence() {
    let doc = plain(r#"{"foo":"bar"}"#);
    doc.get("foo");
    assert_eq!(doc.dirty(), doc.dirty());
    assert!(doc.dirty().is_empty());
}
