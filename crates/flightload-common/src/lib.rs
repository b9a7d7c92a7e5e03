//! Flightload Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the Flightload workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`FlightloadError`] and the [`Result`] alias
//! - **Entities**: the fixed flat-file schemas in [`entity`]
//! - **Types**: field values, deferred references and documents in [`types`]
//! - **Logging**: `tracing` subscriber setup in [`logging`]
//!
//! # Example
//!
//! ```no_run
//! use flightload_common::{EntityKind, Result};
//!
//! fn collection_for(name: &str) -> Result<&'static str> {
//!     let kind: EntityKind = name.parse()?;
//!     Ok(kind.collection())
//! }
//! ```

pub mod entity;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use entity::EntityKind;
pub use error::{FlightloadError, Result};
pub use types::{
    DeferredReference, DocValue, EntityDocument, FieldValue, GeoPoint, Lookup, SanitizedRecord,
};
