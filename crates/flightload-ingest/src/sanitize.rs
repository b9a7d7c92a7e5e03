//! Field Sanitizer
//!
//! Pure per-field normalization: trim, map the missing-value sentinel and the
//! empty string to absent, then coerce by field identity.
//!
//! Boolean fields are one-sided. The yes marker yields `true`; anything else is
//! absent, never `false`.

use flightload_common::types::YES_MARKER;
use flightload_common::{FieldValue, SanitizedRecord};

use crate::source::RawRecord;

/// Literal token the source files use for "no value"
pub const MISSING_SENTINEL: &str = "\\N";

/// Fields parsed as numbers
pub const NUMERIC_FIELDS: &[&str] = &[
    "id",
    "airlineId",
    "sourceAirportId",
    "destinationAirportId",
    "latitude",
    "longitude",
    "altitude",
    "timezone",
    "stops",
];

/// Fields interpreted as yes-markers
pub const BOOLEAN_FIELDS: &[&str] = &["active", "codeshare"];

/// Semantic type of a field, decided by its name alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Number,
    Boolean,
}

impl FieldType {
    pub fn of(field: &str) -> Self {
        if NUMERIC_FIELDS.contains(&field) {
            FieldType::Number
        } else if BOOLEAN_FIELDS.contains(&field) {
            FieldType::Boolean
        } else {
            FieldType::Text
        }
    }
}

/// Normalize one raw field value; `None` means the field is absent
pub fn sanitize(field: &str, raw: &str) -> Option<FieldValue> {
    let trimmed = raw.trim();

    if trimmed.is_empty() || trimmed == MISSING_SENTINEL {
        return None;
    }

    match FieldType::of(field) {
        FieldType::Number => parse_number(trimmed),
        FieldType::Boolean => trimmed
            .eq_ignore_ascii_case(YES_MARKER)
            .then_some(FieldValue::Bool(true)),
        FieldType::Text => Some(FieldValue::text(trimmed)),
    }
}

/// Sanitize every field of a raw record, dropping absent ones
pub fn sanitize_record(raw: &RawRecord) -> SanitizedRecord {
    let mut record = SanitizedRecord::new();
    for (field, value) in raw.iter() {
        record.set(field, sanitize(field, value));
    }
    record
}

fn parse_number(value: &str) -> Option<FieldValue> {
    if let Ok(n) = value.parse::<i64>() {
        return Some(FieldValue::Integer(n));
    }

    let n = value.parse::<f64>().ok().filter(|n| n.is_finite())?;

    // "1.0" and "1" normalize to the same value
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Some(FieldValue::Integer(n as i64))
    } else {
        Some(FieldValue::Float(n))
    }
}
