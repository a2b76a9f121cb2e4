pub mod connection;
pub mod connections;
pub mod migrations;
pub mod patterns;
pub mod profiles;

pub use connection::{get_db_pool, DatabaseConfig};
pub use connections::RelationshipRecords;
