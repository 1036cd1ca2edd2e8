// src/notifier.rs

use crate::config::CityConfig;
use crate::db::InventoryStore;
use crate::domain::VehicleRecord;
use crate::errors::StoreError;
use crate::mailer::{EmailMessage, Mailer};
use std::fmt::Write;
use tracing::{error, info};

pub const FAILURE_SUBJECT: &str = "Failed to run check-tesla-inventory";

const UPDATE_GREETING: &str =
    "New Tesla has been updated for your subscription. Here is the existing inventory.";

pub fn update_subject(city: &str) -> String {
    format!("New Tesla Inventory Updated For {city}!")
}

/// Renders the summary body: greeting, then one block per vehicle.
pub fn update_body(vehicles: &[VehicleRecord]) -> String {
    let mut body = String::from(UPDATE_GREETING);

    for car in vehicles {
        // Writing into a String cannot fail.
        let _ = write!(
            body,
            "\n\n{} {}\
             \nWheels: {}\
             \nExterior: {}\
             \nInterior: {}\
             \nPrice: {}\
             \nWas this car a demo car?: {}\
             \nIs this car new? {}\
             \nVin: {}\
             \nCity: {}",
            car.year,
            car.trim,
            car.wheels,
            car.paint,
            car.interior_color,
            car.price,
            car.is_demo,
            car.is_new,
            car.vin,
            car.city_granular,
        );
    }

    body
}

/// Best-effort email delivery. Transport failures are logged and dropped.
pub struct Notifier<'a> {
    mailer: &'a dyn Mailer,
    store: &'a dyn InventoryStore,
    failure_recipients: Vec<String>,
}

impl<'a> Notifier<'a> {
    pub fn new(
        mailer: &'a dyn Mailer,
        store: &'a dyn InventoryStore,
        failure_recipients: Vec<String>,
    ) -> Self {
        Self {
            mailer,
            store,
            failure_recipients,
        }
    }

    /// Mails the city's full stored inventory to its subscribers.
    ///
    /// The store is re-read here, so the email reflects everything on hand,
    /// not only what this run added. Only the store read can fail.
    pub fn send_update(&self, city: &CityConfig) -> Result<(), StoreError> {
        let vehicles = self.store.list_vehicles(&city.name)?;

        let message = EmailMessage {
            to: city.recipients.clone(),
            subject: update_subject(&city.name),
            body: update_body(&vehicles),
        };

        self.deliver(&message, &city.name);
        Ok(())
    }

    /// Alerts the operator list that `city` failed. Never city subscribers.
    pub fn send_failure(&self, city: &str) {
        let message = EmailMessage {
            to: self.failure_recipients.clone(),
            subject: FAILURE_SUBJECT.to_string(),
            body: String::new(),
        };

        self.deliver(&message, city);
    }

    fn deliver(&self, message: &EmailMessage, city: &str) {
        match self.mailer.send(message) {
            Ok(()) => info!(%city, subject = %message.subject, "Email successfully sent"),
            Err(e) => error!(%city, subject = %message.subject, error = %e, "Failed to send email"),
        }
    }
}
