//! # RegWatch Store
//! Persistence for compliance parameters, reminders, subscriptions and the
//! delivery audit log.

pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteStore;
