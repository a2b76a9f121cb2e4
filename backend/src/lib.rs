pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod matching;
pub mod models;
pub mod utils;

pub use utils::config::Config;
pub use db::connection::get_db_pool;
pub use error::MatchError;

// Re-export common types
pub use sqlx::PgPool;
pub use anyhow::Result;
pub use uuid::Uuid;
pub use chrono::{DateTime, Utc};
