// src/domain/reconcile.rs

use crate::domain::vehicle::VehicleRecord;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// What needs to change to make the stored snapshot match a fresh fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Stored but no longer listed. These get deleted.
    pub sold_vins: BTreeSet<String>,
    /// Stored and still listed. Left untouched.
    pub unsold_vins: BTreeSet<String>,
    /// Listed but not yet stored, one per VIN, ordered by VIN.
    pub new_records: Vec<VehicleRecord>,
}

impl Reconciliation {
    /// True if there is nothing to upsert or delete.
    pub fn is_noop(&self) -> bool {
        self.sold_vins.is_empty() && self.new_records.is_empty()
    }

    pub fn has_new_vehicles(&self) -> bool {
        !self.new_records.is_empty()
    }
}

/// Diffs freshly fetched records against the VINs already stored for a city.
///
/// Input order does not matter. When the fetch lists the same VIN twice
/// (e.g. under both conditions) the first occurrence is kept.
pub fn reconcile(fetched: Vec<VehicleRecord>, existing: &HashSet<String>) -> Reconciliation {
    let fetched_vins: BTreeSet<&str> = fetched.iter().map(|r| r.vin.as_str()).collect();

    let sold_vins = existing
        .iter()
        .filter(|vin| !fetched_vins.contains(vin.as_str()))
        .cloned()
        .collect();

    let unsold_vins: BTreeSet<String> = existing
        .iter()
        .filter(|vin| fetched_vins.contains(vin.as_str()))
        .cloned()
        .collect();

    let mut new_by_vin: BTreeMap<String, VehicleRecord> = BTreeMap::new();
    for record in fetched {
        if unsold_vins.contains(&record.vin) {
            continue;
        }
        new_by_vin.entry(record.vin.clone()).or_insert(record);
    }

    Reconciliation {
        sold_vins,
        unsold_vins,
        new_records: new_by_vin.into_values().collect(),
    }
}
