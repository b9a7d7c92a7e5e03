//! Record and document types flowing through the ingest pipeline
//!
//! A [`SanitizedRecord`] only ever holds present values: an absent field is
//! missing from the map, never stored as null. [`EntityDocument`] keeps the same
//! rule and adds deferred references and nested locations.

mod reference;

use serde::Serialize;
use std::collections::BTreeMap;

pub use reference::{DeferredReference, Lookup};

/// Marker written for a `true` boolean when a value is rendered back to text
pub const YES_MARKER: &str = "Y";

/// A single normalized field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Numeric view of the value, if it is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(n) => Some(*n as f64),
            FieldValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Render the value the way it would appear in a source file
    pub fn to_raw(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(n) => n.to_string(),
            FieldValue::Float(n) => n.to_string(),
            FieldValue::Bool(true) => YES_MARKER.to_string(),
            FieldValue::Bool(false) => "N".to_string(),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{:?}", s),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Float(n) => write!(f, "{}", n),
            FieldValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Field name to value map for one input row after sanitization
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SanitizedRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl SanitizedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a field if it has a value; `None` leaves the field absent
    pub fn set(&mut self, name: impl Into<String>, value: Option<FieldValue>) {
        if let Some(value) = value {
            self.fields.insert(name.into(), value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, FieldValue)> for SanitizedRecord {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Latitude/longitude pair nested under `location`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A value inside a document bound for the store
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DocValue {
    Scalar(FieldValue),
    Reference(DeferredReference),
    Location(GeoPoint),
}

impl From<FieldValue> for DocValue {
    fn from(value: FieldValue) -> Self {
        DocValue::Scalar(value)
    }
}

impl From<DeferredReference> for DocValue {
    fn from(value: DeferredReference) -> Self {
        DocValue::Reference(value)
    }
}

impl From<GeoPoint> for DocValue {
    fn from(value: GeoPoint) -> Self {
        DocValue::Location(value)
    }
}

/// Final payload submitted for persistence
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EntityDocument {
    fields: BTreeMap<String, DocValue>,
}

impl EntityDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<DocValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&DocValue> {
        self.fields.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<DocValue> {
        self.fields.remove(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The deferred reference stored under `name`, if any
    pub fn reference(&self, name: &str) -> Option<&DeferredReference> {
        match self.fields.get(name) {
            Some(DocValue::Reference(r)) => Some(r),
            _ => None,
        }
    }

    pub fn references(&self) -> impl Iterator<Item = (&str, &DeferredReference)> {
        self.fields.iter().filter_map(|(k, v)| match v {
            DocValue::Reference(r) => Some((k.as_str(), r)),
            _ => None,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<SanitizedRecord> for EntityDocument {
    fn from(record: SanitizedRecord) -> Self {
        Self {
            fields: record
                .fields
                .into_iter()
                .map(|(k, v)| (k, DocValue::Scalar(v)))
                .collect(),
        }
    }
}
