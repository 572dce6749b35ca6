//! Recursive key-sorting canonicalizer.
//!
//! `serde_json` is built with `preserve_order` in this workspace, so a
//! `Map` iterates in insertion order. Canonical form is produced by
//! rebuilding every object with its keys inserted in byte order.

use serde_json::{Map, Value};

/// Return `value` with object keys sorted at every nesting level.
///
/// Arrays are walked element-wise without reordering; scalars pass through.
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));

            let mut sorted = Map::with_capacity(entries.len());
            for (key, inner) in entries {
                sorted.insert(key, canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        scalar => scalar,
    }
}

/// Canonicalize and serialize with compact separators (`,` and `:`).
pub fn to_canonical_string(value: Value) -> String {
    // Display on Value is the compact writer and cannot fail.
    canonicalize(value).to_string()
}
