//! # RegWatch Gateway
//! HTTP surface for the notification engine: the run trigger, a health
//! probe, and a read-only view of recent delivery attempts.

pub mod routes;
pub mod server;

pub use server::{AppState, GatewayServer};
