//! Capability traits at the engine's seams.

pub mod channel;
pub mod store;

pub use channel::ChannelSender;
pub use store::ComplianceStore;
