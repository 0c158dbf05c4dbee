//! # RegWatch Dispatch
//!
//! The compliance notification engine. One run:
//!
//! 1. sweeps reminders that can no longer matter,
//! 2. resolves due reminders, upcoming expiries and overdue parameters,
//! 3. fans each event out to the unit's subscribed members over email and
//!    WhatsApp, one recipient at a time,
//! 4. logs every attempt and marks reminders sent after a delivery.

pub mod composer;
pub mod coordinator;
pub mod eligibility;
pub mod orchestrator;
pub mod recipients;
pub mod summary;
pub mod sweeper;
pub mod terminology;
pub mod trigger;

pub use coordinator::RunCoordinator;
pub use orchestrator::Dispatcher;
pub use summary::{EventOutcome, EventStatus, RunSummary};
pub use trigger::{Invocation, TriggerSource};
