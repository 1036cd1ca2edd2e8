// src/tests/store_tests.rs

use super::utils::{city, init_test_db, vehicle, FakeSource, RecordingMailer};
use crate::config::WritePolicy;
use crate::db::runs::{record_city_run, recent_runs};
use crate::db::{InventoryStore, SqliteInventoryStore};
use crate::domain::Condition;
use crate::notifier::Notifier;
use crate::pipeline::{CityOutcome, CityResult, Orchestrator};
use chrono::{Duration, Utc};
use std::collections::HashSet;

#[test]
fn upsert_replaces_the_whole_row() {
    let (_dir, db) = init_test_db();
    let store = SqliteInventoryStore::new(db, WritePolicy::Strict);

    store.upsert(&vehicle("Vancouver", "A")).unwrap();
    let repriced = crate::domain::VehicleRecord {
        price: "48990".to_string(),
        paint: "BLACK".to_string(),
        is_demo: true,
        ..vehicle("Vancouver", "A")
    };
    store.upsert(&repriced).unwrap();

    let stored = store.list_vehicles("Vancouver").unwrap();
    assert_eq!(stored, vec![repriced]);
}

#[test]
fn vins_are_scoped_by_city() {
    let (_dir, db) = init_test_db();
    let store = SqliteInventoryStore::new(db, WritePolicy::Strict);

    store.upsert(&vehicle("Vancouver", "A")).unwrap();
    store.upsert(&vehicle("Vancouver", "B")).unwrap();
    store.upsert(&vehicle("Toronto", "A")).unwrap();

    let vancouver = store.list_vins("Vancouver").unwrap();
    assert_eq!(
        vancouver,
        HashSet::from(["A".to_string(), "B".to_string()])
    );
    assert_eq!(store.list_vins("Toronto").unwrap().len(), 1);
    assert!(store.list_vins("Calgary").unwrap().is_empty());
}

#[test]
fn delete_is_scoped_and_tolerates_missing_rows() {
    let (_dir, db) = init_test_db();
    let store = SqliteInventoryStore::new(db, WritePolicy::Strict);

    store.upsert(&vehicle("Vancouver", "A")).unwrap();
    store.upsert(&vehicle("Toronto", "A")).unwrap();

    store.delete("Vancouver", "A").unwrap();
    store.delete("Vancouver", "NOPE").unwrap();

    assert!(store.list_vins("Vancouver").unwrap().is_empty());
    assert_eq!(store.list_vins("Toronto").unwrap().len(), 1);
}

#[test]
fn list_vehicles_is_ordered_by_vin() {
    let (_dir, db) = init_test_db();
    let store = SqliteInventoryStore::new(db, WritePolicy::BestEffort);

    for vin in ["C", "A", "B"] {
        store.upsert(&vehicle("Vancouver", vin)).unwrap();
    }

    let vins: Vec<_> = store
        .list_vehicles("Vancouver")
        .unwrap()
        .into_iter()
        .map(|v| v.vin)
        .collect();
    assert_eq!(vins, vec!["A", "B", "C"]);
}

#[test]
fn pipeline_against_sqlite_end_to_end() {
    let (_dir, db) = init_test_db();
    let store = SqliteInventoryStore::new(db, WritePolicy::BestEffort);
    store.upsert(&vehicle("Vancouver", "SOLD")).unwrap();
    store.upsert(&vehicle("Vancouver", "KEPT")).unwrap();

    let source = FakeSource::default()
        .with("Vancouver", Condition::New, &["KEPT"])
        .with("Vancouver", Condition::Used, &["FRESH"]);
    let mailer = RecordingMailer::default();
    let notifier = Notifier::new(&mailer, &store, vec!["ops@example.com".to_string()]);

    let report = Orchestrator::new(&source, &store, &notifier).run(&[city("Vancouver")]);

    assert_eq!(
        report.outcomes[0].result,
        CityResult::Updated { sold: 1, added: 1 }
    );

    let stored = store.list_vehicles("Vancouver").unwrap();
    let vins: Vec<_> = stored.iter().map(|v| v.vin.as_str()).collect();
    assert_eq!(vins, vec!["FRESH", "KEPT"]);
    assert!(!stored[0].is_new);

    let body = &mailer.sent.borrow()[0].body;
    assert!(body.contains("Vin: FRESH"));
    assert!(body.contains("Vin: KEPT"));
    assert!(!body.contains("Vin: SOLD"));
}

#[test]
fn run_history_round_trips_newest_first() {
    let (_dir, db) = init_test_db();
    let start = Utc::now();

    let ok = CityOutcome {
        city: "Vancouver".to_string(),
        started_at: start,
        finished_at: start + Duration::seconds(3),
        result: CityResult::Updated { sold: 2, added: 5 },
    };
    let failed = CityOutcome {
        city: "Toronto".to_string(),
        started_at: start + Duration::seconds(10),
        finished_at: start + Duration::seconds(11),
        result: CityResult::Failed {
            error: "Network error: timed out".to_string(),
        },
    };

    record_city_run(&db, &ok).unwrap();
    record_city_run(&db, &failed).unwrap();

    let runs = recent_runs(&db, 10).unwrap();
    assert_eq!(runs.len(), 2);

    assert_eq!(runs[0].city, "Toronto");
    assert!(!runs[0].success);
    assert_eq!(
        runs[0].error_message.as_deref(),
        Some("Network error: timed out")
    );

    assert_eq!(runs[1].city, "Vancouver");
    assert!(runs[1].success);
    assert_eq!(runs[1].sold_count, 2);
    assert_eq!(runs[1].new_count, 5);

    assert_eq!(recent_runs(&db, 1).unwrap().len(), 1);
}
