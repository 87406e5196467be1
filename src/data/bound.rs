//! Bound data and its traversal

use serde_json::Value;

use super::traits::{Record, RecordRef};
use crate::form::path;

/// External data bound to a form node
///
/// Plain JSON structures and records exposing named properties are traversed
/// the same way.
#[derive(Debug, Clone)]
pub enum BoundData {
    Value(Value),
    Record(RecordRef),
}

impl BoundData {
    pub fn record(record: impl Record + 'static) -> Self {
        Self::Record(std::rc::Rc::new(record))
    }

    pub fn as_record(&self) -> Option<&RecordRef> {
        match self {
            Self::Record(record) => Some(record),
            Self::Value(_) => None,
        }
    }

    /// Resolve a field-local path such as `person[name]` or `items[0][sku]`
    ///
    /// Bracket segments are nested lookups and numeric segments index into
    /// sequences. A missing segment or a `null` at the end is "no value".
    pub fn lookup(&self, local_path: &str) -> Option<Value> {
        lookup_in(self, &path::segments(local_path))
    }
}

impl From<Value> for BoundData {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<RecordRef> for BoundData {
    fn from(record: RecordRef) -> Self {
        Self::Record(record)
    }
}

fn lookup_in(data: &BoundData, segments: &[&str]) -> Option<Value> {
    match data {
        BoundData::Value(value) => {
            let found = segments
                .iter()
                .try_fold(value, |current, segment| step(current, segment))?;
            (!found.is_null()).then(|| found.clone())
        }
        BoundData::Record(record) => match segments.split_first() {
            None => record.key().filter(|key| !key.is_null()),
            Some((head, tail)) => lookup_in(&record.get(head)?, tail),
        },
    }
}

/// One nested lookup into a JSON value
pub(crate) fn step<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}
