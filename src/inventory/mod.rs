mod client;
mod inventory_error;
pub(crate) mod models;

pub use client::{build_query, parse_inventory_response, InventorySource, TeslaInventoryClient};
pub use inventory_error::FetchError;
