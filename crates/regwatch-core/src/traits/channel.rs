//! Channel sender trait: one outbound provider per implementation.

use async_trait::async_trait;

use crate::error::SendError;
use crate::types::{Channel, MessageContent, ProviderReceipt};

/// A single outbound notification provider.
///
/// Implementations make exactly one provider call per `send` and never
/// retry; retry policy belongs to the caller.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// Channel this sender delivers on.
    fn channel(&self) -> Channel;

    /// Whether the credentials needed to reach the provider are present.
    fn is_configured(&self) -> bool;

    /// Deliver `content` to `address`.
    async fn send(
        &self,
        address: &str,
        content: &MessageContent,
    ) -> std::result::Result<ProviderReceipt, SendError>;
}
