//! Domain types shared by every RegWatch crate.

pub mod delivery;
pub mod event;
pub mod message;
pub mod parameter;
pub mod reminder;
pub mod subscription;

pub use delivery::{DeliveryLog, DeliveryStatus};
pub use event::{EventKind, EventRef, NotificationEvent};
pub use message::{MessageContent, ProviderReceipt};
pub use parameter::{ComplianceParameter, ParameterCategory};
pub use reminder::{DueReminder, Reminder};
pub use subscription::{Channel, Member, Recipient, Subscription};
