//! Property and state snapshots
//!
//! A snapshot is an ordered map from field name to [`Value`]. Lookups return
//! `Option<&Value>`: `None` means the field was not supplied, which is the
//! only notion of absence the reconciliation rules recognise.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::{Value, ValueConversionError};

/// Read-only inputs handed to a component by its owner
pub type Props = Snapshot;

/// Component-owned data; partial states share the same shape
pub type State = Snapshot;

/// Error when building a snapshot from foreign data
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error when reading a typed field out of a snapshot
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("Field not present: {0}")]
    Missing(String),

    #[error("Field {field}: {source}")]
    Conversion {
        field: String,
        #[source]
        source: ValueConversionError,
    },
}

/// Ordered field → value map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    fields: BTreeMap<String, Value>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        pairs.into_iter().collect()
    }

    /// Parse a snapshot from a JSON object string
    pub fn from_json_str(s: &str) -> Result<Self, SnapshotError> {
        let json: serde_json::Value = serde_json::from_str(s)?;
        Self::try_from(json)
    }

    /// Value for `field`, or `None` if it was not supplied
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Typed access to a supplied field
    pub fn get_as<T>(&self, field: &str) -> Result<T, FieldError>
    where
        T: TryFrom<Value, Error = ValueConversionError>,
    {
        let value = self
            .get(field)
            .cloned()
            .ok_or_else(|| FieldError::Missing(field.to_string()))?;
        T::try_from(value).map_err(|source| FieldError::Conversion {
            field: field.to_string(),
            source,
        })
    }

    /// Whether `field` was supplied (a `Null` value counts)
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Shallow merge: every field of `other` overwrites the same field here
    pub fn merge(&mut self, other: Snapshot) {
        self.fields.extend(other.fields);
    }

    /// Shallow merge returning a new snapshot
    pub fn merged(mut self, other: Snapshot) -> Snapshot {
        self.merge(other);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.fields.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Snapshot {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl TryFrom<serde_json::Value> for Snapshot {
    type Error = SnapshotError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        match Value::from(json) {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(SnapshotError::NotAnObject(other.type_name())),
        }
    }
}

impl From<Snapshot> for serde_json::Value {
    fn from(snapshot: Snapshot) -> Self {
        Value::Object(snapshot.fields).into()
    }
}

impl From<Snapshot> for Value {
    fn from(snapshot: Snapshot) -> Self {
        Value::Object(snapshot.fields)
    }
}

/// Compact JSON, e.g. `{"active":true,"level":2}`
impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::Value::from(self.clone());
        write!(f, "{json}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_is_supplied() {
        let props = Snapshot::from_pairs([("active", Value::Null)]);
        assert!(props.contains("active"));
        assert_eq!(props.get("active"), Some(&Value::Null));
        assert!(props.get("level").is_none());
    }

    #[test]
    fn test_merge_right_wins() {
        let mut state = Snapshot::from_pairs([("active", Value::from(false)), ("level", 0.into())]);
        state.merge(Snapshot::from_pairs([("level", 4)]));

        assert_eq!(state.get_as::<bool>("active").unwrap(), false);
        assert_eq!(state.get_as::<i64>("level").unwrap(), 4);
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_typed_access_errors() {
        let state = Snapshot::from_pairs([("level", "high")]);

        assert!(matches!(
            state.get_as::<i64>("level"),
            Err(FieldError::Conversion { .. })
        ));
        assert!(matches!(
            state.get_as::<bool>("active"),
            Err(FieldError::Missing(field)) if field == "active"
        ));
    }

    #[test]
    fn test_from_json() {
        let props = Snapshot::from_json_str(r#"{"active": true, "name": null}"#).unwrap();
        assert_eq!(props.keys().collect::<Vec<_>>(), vec!["active", "name"]);
        assert_eq!(props.to_string(), r#"{"active":true,"name":null}"#);

        assert!(matches!(
            Snapshot::from_json_str("[1, 2]"),
            Err(SnapshotError::NotAnObject("array"))
        ));
        assert!(matches!(
            Snapshot::from_json_str("{"),
            Err(SnapshotError::Json(_))
        ));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let state = Snapshot::from_pairs([("level", 2)]);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json, serde_json::json!({ "level": { "kind": "Int", "value": 2 } }));
    }
}
