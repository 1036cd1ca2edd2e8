use crate::config::CityConfig;
use crate::db::{init_db, Database, InventoryStore};
use crate::domain::{Condition, VehicleRecord};
use crate::errors::StoreError;
use crate::inventory::{FetchError, InventorySource};
use crate::mailer::{EmailMessage, Mailer, MailerError};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;
use tempfile::TempDir;

/// Fresh SQLite file in its own temp dir. Keep the `TempDir` alive.
pub fn init_test_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = Database::new(dir.path().join("inventory.sqlite3"), Duration::from_secs(1));
    init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    (dir, db)
}

pub fn city(name: &str) -> CityConfig {
    CityConfig {
        name: name.to_string(),
        postal_code: "V6T 1Z4".to_string(),
        region: "BC".to_string(),
        market: "CA".to_string(),
        range: 200,
        latitude: 49.2606,
        longitude: -123.246,
        recipients: vec![format!("{}@example.com", name.to_lowercase())],
    }
}

pub fn vehicle(city: &str, vin: &str) -> VehicleRecord {
    VehicleRecord {
        vin: vin.to_string(),
        year: "2024".to_string(),
        name: "Model 3 Long Range".to_string(),
        price: "52990".to_string(),
        paint: "WHITE".to_string(),
        interior_color: "PREMIUM_BLACK".to_string(),
        trim: "LRAWD".to_string(),
        wheels: "EIGHTEEN".to_string(),
        city: city.to_string(),
        city_granular: format!("{city} North"),
        is_new: true,
        is_demo: false,
    }
}

/// Serves canned listings per (city, condition). Unknown pairs are empty.
#[derive(Default)]
pub struct FakeSource {
    listings: HashMap<(String, Condition), Vec<VehicleRecord>>,
    failing: HashSet<String>,
    pub calls: RefCell<Vec<(String, Condition)>>,
}

impl FakeSource {
    pub fn with(mut self, city: &str, condition: Condition, vins: &[&str]) -> Self {
        let records = vins
            .iter()
            .map(|vin| VehicleRecord {
                is_new: condition.is_new(),
                ..vehicle(city, vin)
            })
            .collect();
        self.listings.insert((city.to_string(), condition), records);
        self
    }

    pub fn failing_for(mut self, city: &str) -> Self {
        self.failing.insert(city.to_string());
        self
    }
}

impl InventorySource for FakeSource {
    fn fetch(
        &self,
        city: &CityConfig,
        condition: Condition,
    ) -> Result<Vec<VehicleRecord>, FetchError> {
        self.calls.borrow_mut().push((city.name.clone(), condition));

        if self.failing.contains(&city.name) {
            return Err(FetchError::Network("connection reset".to_string()));
        }

        Ok(self
            .listings
            .get(&(city.name.clone(), condition))
            .cloned()
            .unwrap_or_default())
    }
}

/// In-memory store keyed by (city, vin). Can be told to fail reads per city.
#[derive(Default)]
pub struct MemoryStore {
    rows: RefCell<BTreeMap<(String, String), VehicleRecord>>,
    failing_reads: HashSet<String>,
    pub writes: Cell<usize>,
}

impl MemoryStore {
    pub fn seeded(records: &[VehicleRecord]) -> Self {
        let store = Self::default();
        for r in records {
            store
                .rows
                .borrow_mut()
                .insert((r.city.clone(), r.vin.clone()), r.clone());
        }
        store
    }

    pub fn failing_reads_for(mut self, city: &str) -> Self {
        self.failing_reads.insert(city.to_string());
        self
    }

    pub fn vins(&self, city: &str) -> Vec<String> {
        self.rows
            .borrow()
            .keys()
            .filter(|(c, _)| c == city)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

impl InventoryStore for MemoryStore {
    fn list_vins(&self, city: &str) -> Result<HashSet<String>, StoreError> {
        if self.failing_reads.contains(city) {
            return Err(StoreError::Db("table is locked".to_string()));
        }
        Ok(self.vins(city).into_iter().collect())
    }

    fn list_vehicles(&self, city: &str) -> Result<Vec<VehicleRecord>, StoreError> {
        if self.failing_reads.contains(city) {
            return Err(StoreError::Db("table is locked".to_string()));
        }
        Ok(self
            .rows
            .borrow()
            .iter()
            .filter(|((c, _), _)| c == city)
            .map(|(_, r)| r.clone())
            .collect())
    }

    fn delete(&self, city: &str, vin: &str) -> Result<(), StoreError> {
        self.writes.set(self.writes.get() + 1);
        self.rows
            .borrow_mut()
            .remove(&(city.to_string(), vin.to_string()));
        Ok(())
    }

    fn upsert(&self, record: &VehicleRecord) -> Result<(), StoreError> {
        self.writes.set(self.writes.get() + 1);
        self.rows
            .borrow_mut()
            .insert((record.city.clone(), record.vin.clone()), record.clone());
        Ok(())
    }
}

/// Keeps every message it is asked to send. Optionally fails every send.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: RefCell<Vec<EmailMessage>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent.borrow().iter().map(|m| m.subject.clone()).collect()
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        self.sent.borrow_mut().push(message.clone());
        if self.fail {
            return Err(MailerError::ApiError("503 - unavailable".to_string()));
        }
        Ok(())
    }
}
