pub mod reconcile;
pub mod vehicle;

pub use reconcile::{reconcile, Reconciliation};
pub use vehicle::{Condition, VehicleRecord};
