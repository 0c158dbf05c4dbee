//! # RegWatch Channels
//! Outbound notification providers behind the [`ChannelSender`] trait.

pub mod email;
pub mod throttle;
pub mod whatsapp;

use std::collections::HashMap;
use std::sync::Arc;

use regwatch_core::RegWatchConfig;
use regwatch_core::traits::ChannelSender;
use regwatch_core::types::Channel;

pub use email::EmailSender;
pub use throttle::SendThrottle;
pub use whatsapp::WhatsAppSender;

/// Senders keyed by the channel they deliver on.
pub type SenderMap = HashMap<Channel, Arc<dyn ChannelSender>>;

/// Build one sender per channel from configuration.
///
/// Senders are always created; one without credentials fails every send
/// with `SendError::NotConfigured` rather than aborting the run.
pub fn create_senders(config: &RegWatchConfig) -> SenderMap {
    let mut senders: SenderMap = HashMap::new();
    senders.insert(Channel::Email, Arc::new(EmailSender::new(config.email.clone())));
    senders.insert(Channel::WhatsApp, Arc::new(WhatsAppSender::new(config.whatsapp.clone())));

    for (channel, sender) in &senders {
        if sender.is_configured() {
            tracing::info!("Channel {channel} ready");
        } else {
            tracing::warn!("Channel {channel} missing credentials; sends will fail");
        }
    }
    senders
}

/// Shared HTTP client with a request timeout.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .user_agent(concat!("RegWatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default()
}

/// Read a non-success response into a `SendError::Rejected`.
pub(crate) async fn rejection(response: reqwest::Response) -> regwatch_core::SendError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    regwatch_core::SendError::Rejected { status, body }
}
