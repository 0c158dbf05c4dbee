//! # RegWatch Core
//! Core traits, types, configuration and errors for the compliance
//! notification engine.

pub mod clock;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::RegWatchConfig;
pub use error::{RegWatchError, Result, SendError};
