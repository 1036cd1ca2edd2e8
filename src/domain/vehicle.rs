// src/domain/vehicle.rs

use serde::Serialize;
use std::fmt;

/// Which inventory pool a search query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Condition {
    New,
    Used,
}

impl Condition {
    pub const ALL: [Condition; 2] = [Condition::New, Condition::Used];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::New => "new",
            Condition::Used => "used",
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Condition::New)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single listing, normalized from the search API and stored as-is.
/// Every field is replaced together on upsert; only `vin` + `city` identify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleRecord {
    pub vin: String,
    pub year: String,
    /// Marketing trim name (`TrimName` in the API).
    pub name: String,
    pub price: String,
    pub paint: String,
    pub interior_color: String,
    pub trim: String,
    pub wheels: String,
    /// Subscription city key.
    pub city: String,
    /// The vendor's own city label for the listing location.
    pub city_granular: String,
    pub is_new: bool,
    pub is_demo: bool,
}
