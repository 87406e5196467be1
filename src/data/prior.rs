//! Prior-submission store
//!
//! Values from a previous (usually rejected) submission, addressed by the full
//! key path of a field. A stored `false`, `0`, `""` or `[]` is present; only a
//! missing key or `null` is absent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::bound::step;
use crate::form::path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorInput(Value);

impl PriorInput {
    /// Wrap an already nested structure
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Build a nested store from flat `name => value` pairs
    ///
    /// Names use the same bracket syntax as key paths; `tags[]` appends.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut root = Value::Object(Map::new());
        for (name, value) in pairs {
            insert(&mut root, &raw_segments(name.as_ref()), value);
        }
        Self(root)
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Value stored at a full key path, trying a flat key first
    pub fn get(&self, key_path: &str) -> Option<&Value> {
        let found = match &self.0 {
            Value::Object(map) if map.contains_key(key_path) => map.get(key_path),
            root => path::segments(key_path)
                .into_iter()
                .try_fold(root, |current, segment| step(current, segment)),
        }?;
        (!found.is_null()).then_some(found)
    }

    pub fn contains(&self, key_path: &str) -> bool {
        self.get(key_path).is_some()
    }
}

impl From<Value> for PriorInput {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Segments of a submitted name, keeping empty `[]` segments
fn raw_segments(name: &str) -> Vec<&str> {
    let (head, mut rest) = match name.find('[') {
        Some(at) => name.split_at(at),
        None => (name, ""),
    };
    let mut out = vec![head];
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        match after.find(']') {
            Some(close) => {
                out.push(&after[..close]);
                rest = &after[close + 1..];
            }
            None => {
                out.push(after);
                break;
            }
        }
    }
    out
}

fn insert(target: &mut Value, keys: &[&str], value: Value) {
    let Some((key, rest)) = keys.split_first() else {
        *target = value;
        return;
    };

    if key.is_empty() {
        if !target.is_array() {
            *target = Value::Array(Vec::new());
        }
        if let Value::Array(items) = target {
            items.push(Value::Null);
            if let Some(slot) = items.last_mut() {
                insert(slot, rest, value);
            }
        }
        return;
    }

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        let slot = map.entry(key.to_string()).or_insert(Value::Null);
        insert(slot, rest, value);
    }
}
