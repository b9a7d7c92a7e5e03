//! Deferred lookups resolved by the store at write time

use serde::Serialize;

use super::FieldValue;

/// How the target document is located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Lookup {
    /// Natural key lookup, first match wins
    #[serde(rename = "name")]
    ByName,
    #[serde(rename = "id")]
    ById,
}

/// "Look up `collection` by `key` when this document is written."
///
/// Built only from a present value, so a reference never stands in for
/// missing data.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredReference {
    collection: String,
    lookup: Lookup,
    key: FieldValue,
}

impl DeferredReference {
    pub fn by_name(collection: impl Into<String>, key: FieldValue) -> Self {
        Self {
            collection: collection.into(),
            lookup: Lookup::ByName,
            key,
        }
    }

    pub fn by_id(collection: impl Into<String>, key: FieldValue) -> Self {
        Self {
            collection: collection.into(),
            lookup: Lookup::ById,
            key,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn lookup(&self) -> Lookup {
        self.lookup
    }

    pub fn key(&self) -> &FieldValue {
        &self.key
    }
}

#[derive(Serialize)]
struct RefBody<'a> {
    collection: &'a str,
    by: Lookup,
    key: &'a FieldValue,
}

impl Serialize for DeferredReference {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(
            "@ref",
            &RefBody {
                collection: &self.collection,
                by: self.lookup,
                key: &self.key,
            },
        )?;
        map.end()
    }
}

impl std::fmt::Display for DeferredReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.lookup {
            Lookup::ByName => write!(f, "{}.byName({}).first()", self.collection, self.key),
            Lookup::ById => write!(f, "{}.byId({})", self.collection, self.key),
        }
    }
}
