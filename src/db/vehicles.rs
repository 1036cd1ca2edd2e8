use crate::config::WritePolicy;
use crate::db::connection::Database;
use crate::domain::VehicleRecord;
use crate::errors::StoreError;
use chrono::Utc;
use rusqlite::params;
use std::collections::HashSet;
use tracing::{error, warn};

/// Per-city snapshot of stored vehicles.
pub trait InventoryStore {
    fn list_vins(&self, city: &str) -> Result<HashSet<String>, StoreError>;

    /// Full records for `city`, ordered by VIN.
    fn list_vehicles(&self, city: &str) -> Result<Vec<VehicleRecord>, StoreError>;

    /// Removing a VIN that is not stored is not an error.
    fn delete(&self, city: &str, vin: &str) -> Result<(), StoreError>;

    /// Writes every column of `record`, replacing any stored row.
    fn upsert(&self, record: &VehicleRecord) -> Result<(), StoreError>;
}

/// Applies `policy` to the result of a single write.
pub fn settle_write(
    policy: WritePolicy,
    op: &str,
    vin: &str,
    result: Result<(), StoreError>,
) -> Result<(), StoreError> {
    match (result, policy) {
        (Ok(()), _) => Ok(()),
        (Err(e), WritePolicy::BestEffort) => {
            error!(%vin, op, error = %e, "Store write failed, continuing");
            Ok(())
        }
        (Err(e), WritePolicy::Strict) => Err(e),
    }
}

pub struct SqliteInventoryStore {
    db: Database,
    policy: WritePolicy,
}

impl SqliteInventoryStore {
    pub fn new(db: Database, policy: WritePolicy) -> Self {
        Self { db, policy }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn try_delete(&self, city: &str, vin: &str) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM vehicles WHERE city = ?1 AND vin = ?2",
                params![city, vin],
            )?;
            if removed == 0 {
                warn!(%city, %vin, "Sold vehicle was already gone from the store");
            }
            Ok(())
        })
    }

    fn try_upsert(&self, car: &VehicleRecord) -> Result<(), StoreError> {
        let now = Utc::now().naive_utc();

        self.db.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO vehicles (
                    vin, city, year, name, price,
                    paint, interior_color, trim, wheels,
                    city_granular, is_new, is_demo, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                ON CONFLICT(city, vin) DO UPDATE SET
                    year = excluded.year,
                    name = excluded.name,
                    price = excluded.price,
                    paint = excluded.paint,
                    interior_color = excluded.interior_color,
                    trim = excluded.trim,
                    wheels = excluded.wheels,
                    city_granular = excluded.city_granular,
                    is_new = excluded.is_new,
                    is_demo = excluded.is_demo,
                    updated_at = excluded.updated_at
                "#,
                params![
                    car.vin,
                    car.city,
                    car.year,
                    car.name,
                    car.price,
                    car.paint,
                    car.interior_color,
                    car.trim,
                    car.wheels,
                    car.city_granular,
                    car.is_new,
                    car.is_demo,
                    now
                ],
            )?;
            Ok(())
        })
    }
}

impl InventoryStore for SqliteInventoryStore {
    fn list_vins(&self, city: &str) -> Result<HashSet<String>, StoreError> {
        let result = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT vin FROM vehicles WHERE city = ?1")?;
            let rows = stmt.query_map(params![city], |row| row.get::<_, String>(0))?;

            let mut vins = HashSet::new();
            for r in rows {
                vins.insert(r?);
            }
            Ok(vins)
        });

        if let Err(e) = &result {
            error!(%city, error = %e, "Failed to list stored VINs");
        }
        result
    }

    fn list_vehicles(&self, city: &str) -> Result<Vec<VehicleRecord>, StoreError> {
        let result = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT vin, year, name, price, paint, interior_color, trim, wheels,
                       city, city_granular, is_new, is_demo
                FROM vehicles
                WHERE city = ?1
                ORDER BY vin
                "#,
            )?;

            let rows = stmt.query_map(params![city], |row| {
                Ok(VehicleRecord {
                    vin: row.get(0)?,
                    year: row.get(1)?,
                    name: row.get(2)?,
                    price: row.get(3)?,
                    paint: row.get(4)?,
                    interior_color: row.get(5)?,
                    trim: row.get(6)?,
                    wheels: row.get(7)?,
                    city: row.get(8)?,
                    city_granular: row.get(9)?,
                    is_new: row.get(10)?,
                    is_demo: row.get(11)?,
                })
            })?;

            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        });

        if let Err(e) = &result {
            error!(%city, error = %e, "Failed to read stored inventory");
        }
        result
    }

    fn delete(&self, city: &str, vin: &str) -> Result<(), StoreError> {
        settle_write(self.policy, "delete", vin, self.try_delete(city, vin))
    }

    fn upsert(&self, record: &VehicleRecord) -> Result<(), StoreError> {
        settle_write(self.policy, "upsert", &record.vin, self.try_upsert(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_effort_swallows_write_errors() {
        let failed = Err(StoreError::Db("disk I/O error".into()));
        assert!(settle_write(WritePolicy::BestEffort, "upsert", "VIN1", failed).is_ok());
    }

    #[test]
    fn strict_surfaces_write_errors() {
        let failed = Err(StoreError::Db("disk I/O error".into()));
        let err = settle_write(WritePolicy::Strict, "delete", "VIN1", failed).unwrap_err();
        assert!(err.to_string().contains("disk I/O error"));
    }
}
