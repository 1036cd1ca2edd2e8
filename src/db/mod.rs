pub mod connection;
pub mod runs;
pub mod vehicles;

pub use connection::{init_db, Database};
pub use vehicles::{InventoryStore, SqliteInventoryStore};
