// src/pipeline.rs

use crate::config::CityConfig;
use crate::db::InventoryStore;
use crate::domain::{reconcile, Condition};
use crate::errors::PipelineError;
use crate::inventory::InventorySource;
use crate::notifier::Notifier;
use chrono::{DateTime, Utc};
use tracing::{error, info, info_span};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CityResult {
    /// New vehicles were stored and subscribers were mailed.
    Updated { sold: usize, added: usize },
    /// Nothing new. Sold vehicles, if any, were still removed.
    NoNewVehicles { sold: usize },
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct CityOutcome {
    pub city: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub result: CityResult,
}

impl CityOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.result, CityResult::Failed { .. })
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<CityOutcome>,
}

impl RunReport {
    pub fn failed_cities(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_failure())
            .map(|o| o.city.as_str())
            .collect()
    }

    /// 200 when every city completed, 400 when any failed.
    pub fn status_code(&self) -> u16 {
        if self.outcomes.iter().any(CityOutcome::is_failure) {
            400
        } else {
            200
        }
    }

    pub fn message(&self) -> String {
        let failed = self.failed_cities();
        if failed.is_empty() {
            format!("Inventory check complete for {} cities", self.outcomes.len())
        } else {
            format!("Inventory check failed for: {}", failed.join(", "))
        }
    }
}

/// Runs fetch → reconcile → persist → notify for each city in turn.
pub struct Orchestrator<'a> {
    source: &'a dyn InventorySource,
    store: &'a dyn InventoryStore,
    notifier: &'a Notifier<'a>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        source: &'a dyn InventorySource,
        store: &'a dyn InventoryStore,
        notifier: &'a Notifier<'a>,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
        }
    }

    pub fn run(&self, cities: &[CityConfig]) -> RunReport {
        let outcomes = cities.iter().map(|city| self.run_city(city)).collect();
        RunReport { outcomes }
    }

    /// Processes one city. Errors stop here: they are logged, reported to the
    /// operator, and recorded in the outcome.
    pub fn run_city(&self, city: &CityConfig) -> CityOutcome {
        let span = info_span!("city", city = %city.name);
        let _enter = span.enter();

        let started_at = Utc::now();
        let result = match self.process_city(city) {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Failed to process city");
                self.notifier.send_failure(&city.name);
                CityResult::Failed {
                    error: e.to_string(),
                }
            }
        };

        CityOutcome {
            city: city.name.clone(),
            started_at,
            finished_at: Utc::now(),
            result,
        }
    }

    fn process_city(&self, city: &CityConfig) -> Result<CityResult, PipelineError> {
        let existing = self.store.list_vins(&city.name)?;

        let mut fetched = Vec::new();
        for condition in Condition::ALL {
            fetched.extend(self.source.fetch(city, condition)?);
        }

        let diff = reconcile(fetched, &existing);
        let sold = diff.sold_vins.len();

        for vin in &diff.sold_vins {
            self.store.delete(&city.name, vin)?;
        }
        if sold > 0 {
            info!(sold, "Removed sold vehicles");
        }

        if !diff.has_new_vehicles() {
            info!("No new cars at the moment");
            return Ok(CityResult::NoNewVehicles { sold });
        }

        let added = diff.new_records.len();
        info!(added, "New cars found, updating database");
        for record in &diff.new_records {
            self.store.upsert(record)?;
        }

        self.notifier.send_update(city)?;

        Ok(CityResult::Updated { sold, added })
    }
}
