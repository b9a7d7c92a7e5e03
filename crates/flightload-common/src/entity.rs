//! Entity schemas for the flat-file datasets
//!
//! Each input file is positional with no header row. The field order here is
//! the order of the columns on disk.

use serde::{Deserialize, Serialize};

use crate::error::FlightloadError;

const AIRLINE_FIELDS: &[&str] = &[
    "id", "name", "alias", "IATA", "ICAO", "callsign", "country", "active",
];

const AIRPORT_FIELDS: &[&str] = &[
    "id",
    "name",
    "citymain",
    "country",
    "iata",
    "icao",
    "latitude",
    "longitude",
    "altitude",
    "timezone",
    "dst",
    "tzdatabasetimezone",
    "type",
    "source",
];

const COUNTRY_FIELDS: &[&str] = &["name", "iso_code", "dafif_code"];

const ROUTE_FIELDS: &[&str] = &[
    "airline",
    "airlineId",
    "sourceAirport",
    "sourceAirportId",
    "destinationAirport",
    "destinationAirportId",
    "codeshare",
    "stops",
    "equipment",
];

/// The kinds of entity a pipeline can load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Country,
    Airline,
    Airport,
    Route,
}

impl EntityKind {
    /// All entity kinds, ordered so that every reference target is loaded
    /// before the entities that point at it.
    pub const LOAD_ORDER: [EntityKind; 4] = [
        EntityKind::Country,
        EntityKind::Airline,
        EntityKind::Airport,
        EntityKind::Route,
    ];

    /// Lowercase identifier used on the command line and in logs
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Country => "country",
            EntityKind::Airline => "airline",
            EntityKind::Airport => "airport",
            EntityKind::Route => "route",
        }
    }

    /// Collection the documents are written to
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Country => "Country",
            EntityKind::Airline => "Airline",
            EntityKind::Airport => "Airport",
            EntityKind::Route => "Route",
        }
    }

    /// Positional field names, in file column order
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            EntityKind::Country => COUNTRY_FIELDS,
            EntityKind::Airline => AIRLINE_FIELDS,
            EntityKind::Airport => AIRPORT_FIELDS,
            EntityKind::Route => ROUTE_FIELDS,
        }
    }

    /// Conventional file name of the dataset inside the data directory
    pub fn default_file_name(self) -> &'static str {
        match self {
            EntityKind::Country => "countries.dat",
            EntityKind::Airline => "airlines.dat",
            EntityKind::Airport => "airports.dat",
            EntityKind::Route => "routes.dat",
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = FlightloadError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "country" | "countries" => Ok(EntityKind::Country),
            "airline" | "airlines" => Ok(EntityKind::Airline),
            "airport" | "airports" => Ok(EntityKind::Airport),
            "route" | "routes" => Ok(EntityKind::Route),
            other => Err(FlightloadError::UnknownEntity(other.to_string())),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_from_str() {
        assert_eq!("airline".parse::<EntityKind>().unwrap(), EntityKind::Airline);
        assert_eq!("Airports".parse::<EntityKind>().unwrap(), EntityKind::Airport);
        assert_eq!("COUNTRY".parse::<EntityKind>().unwrap(), EntityKind::Country);
        assert_eq!("routes".parse::<EntityKind>().unwrap(), EntityKind::Route);
        assert!("aircraft".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_field_counts() {
        assert_eq!(EntityKind::Airline.fields().len(), 8);
        assert_eq!(EntityKind::Airport.fields().len(), 14);
        assert_eq!(EntityKind::Country.fields().len(), 3);
        assert_eq!(EntityKind::Route.fields().len(), 9);
    }

    #[test]
    fn test_load_order_puts_targets_first() {
        let order = EntityKind::LOAD_ORDER;
        let pos = |k| order.iter().position(|o| *o == k).unwrap();
        assert!(pos(EntityKind::Country) < pos(EntityKind::Airline));
        assert!(pos(EntityKind::Country) < pos(EntityKind::Airport));
        assert!(pos(EntityKind::Airline) < pos(EntityKind::Route));
        assert!(pos(EntityKind::Airport) < pos(EntityKind::Route));
    }
}
