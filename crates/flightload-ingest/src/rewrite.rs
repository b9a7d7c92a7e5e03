//! Reference Rewriter
//!
//! Turns natural-key and id fields into [`DeferredReference`]s resolved by the
//! store, and nests `latitude`/`longitude` under `location`. A rewrite only
//! happens when its source field is present.

use flightload_common::{
    DeferredReference, EntityDocument, EntityKind, FieldValue, GeoPoint, SanitizedRecord,
};
use thiserror::Error;

/// Reasons a sanitized record cannot become a document
#[derive(Debug, Error, PartialEq)]
pub enum RewriteError {
    #[error("field `{field}` must be numeric, got {value}")]
    NotNumeric { field: &'static str, value: String },

    #[error("record has no values")]
    Empty,
}

/// An id column replaced by a reference, with its code column renamed
struct IdRewrite {
    code_field: &'static str,
    id_field: &'static str,
    renamed_code: &'static str,
    target: EntityKind,
}

const ROUTE_REWRITES: [IdRewrite; 3] = [
    IdRewrite {
        code_field: "airline",
        id_field: "airlineId",
        renamed_code: "airlineCode",
        target: EntityKind::Airline,
    },
    IdRewrite {
        code_field: "sourceAirport",
        id_field: "sourceAirportId",
        renamed_code: "sourceAirportCode",
        target: EntityKind::Airport,
    },
    IdRewrite {
        code_field: "destinationAirport",
        id_field: "destinationAirportId",
        renamed_code: "destinationAirportCode",
        target: EntityKind::Airport,
    },
];

/// Build the store document for one sanitized record of `kind`
pub fn rewrite(
    kind: EntityKind,
    mut record: SanitizedRecord,
) -> Result<EntityDocument, RewriteError> {
    if record.is_empty() {
        return Err(RewriteError::Empty);
    }

    match kind {
        EntityKind::Country => Ok(EntityDocument::from(record)),
        EntityKind::Airline => {
            let country = record.remove("country");
            let mut doc = EntityDocument::from(record);
            link_country(&mut doc, country);
            Ok(doc)
        },
        EntityKind::Airport => {
            let country = record.remove("country");
            let location = nest_location(&mut record)?;
            let mut doc = EntityDocument::from(record);
            link_country(&mut doc, country);
            if let Some(location) = location {
                doc.insert("location", location);
            }
            Ok(doc)
        },
        EntityKind::Route => {
            let mut links = Vec::with_capacity(ROUTE_REWRITES.len());
            for rule in &ROUTE_REWRITES {
                let code = record.remove(rule.code_field);
                let id = match record.remove(rule.id_field) {
                    Some(id) => Some(numeric(rule.id_field, id)?),
                    None => None,
                };
                links.push((rule, code, id));
            }

            let mut doc = EntityDocument::from(record);
            for (rule, code, id) in links {
                if let Some(code) = code {
                    doc.insert(rule.renamed_code, code);
                }
                if let Some(id) = id {
                    doc.insert(
                        rule.code_field,
                        DeferredReference::by_id(rule.target.collection(), id),
                    );
                }
            }
            Ok(doc)
        },
    }
}

fn link_country(doc: &mut EntityDocument, country: Option<FieldValue>) {
    if let Some(name) = country {
        doc.insert(
            "country",
            DeferredReference::by_name(EntityKind::Country.collection(), name),
        );
    }
}

/// Remove the flat coordinates; a point comes back only when both were present
fn nest_location(record: &mut SanitizedRecord) -> Result<Option<GeoPoint>, RewriteError> {
    let latitude = record.remove("latitude");
    let longitude = record.remove("longitude");

    match (latitude, longitude) {
        (Some(lat), Some(lon)) => Ok(Some(GeoPoint {
            latitude: as_number("latitude", &lat)?,
            longitude: as_number("longitude", &lon)?,
        })),
        _ => Ok(None),
    }
}

fn as_number(field: &'static str, value: &FieldValue) -> Result<f64, RewriteError> {
    value.as_f64().ok_or_else(|| RewriteError::NotNumeric {
        field,
        value: value.to_string(),
    })
}

fn numeric(field: &'static str, value: FieldValue) -> Result<FieldValue, RewriteError> {
    as_number(field, &value)?;
    Ok(value)
}
