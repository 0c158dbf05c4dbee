//! Configuration: TOML file plus environment overlay.
//!
//! Load order: defaults, then `~/.regwatch/config.toml` (or an explicit
//! path), then environment variables. Secrets normally arrive through the
//! environment. The resulting value is passed explicitly to the run
//! coordinator.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RegWatchError, Result};
use crate::types::{Channel, EventKind};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegWatchConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { db_path: default_db_path() }
    }
}

/// Email provider (HTTP API, bearer key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_email_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sender address, e.g. `Compliance <alerts@example.com>`.
    #[serde(default)]
    pub from: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: default_email_api_url(),
            api_key: None,
            from: None,
        }
    }
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        present(&self.api_key) && present(&self.from) && !self.api_url.trim().is_empty()
    }
}

/// WhatsApp Business provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default = "default_whatsapp_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub phone_number_id: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_url: default_whatsapp_api_url(),
            api_key: None,
            phone_number_id: None,
            access_token: None,
        }
    }
}

impl WhatsAppConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_url.trim().is_empty()
            && present(&self.api_key)
            && present(&self.phone_number_id)
            && present(&self.access_token)
    }
}

/// Which channels each event set is dispatched on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoutingConfig {
    #[serde(default = "default_reminder_channels")]
    pub due_reminder: Vec<Channel>,
    #[serde(default = "default_parameter_channels")]
    pub upcoming_expiry: Vec<Channel>,
    #[serde(default = "default_parameter_channels")]
    pub overdue: Vec<Channel>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            due_reminder: default_reminder_channels(),
            upcoming_expiry: default_parameter_channels(),
            overdue: default_parameter_channels(),
        }
    }
}

impl RoutingConfig {
    pub fn channels_for(&self, kind: EventKind) -> &[Channel] {
        match kind {
            EventKind::DueReminder => &self.due_reminder,
            EventKind::UpcomingExpiry => &self.upcoming_expiry,
            EventKind::Overdue => &self.overdue,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Pause between successive sends within one event.
    #[serde(default = "default_send_interval_ms")]
    pub send_interval_ms: u64,
    /// Upcoming-expiry window length in days, inclusive of both ends.
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: i64,
    /// Reminders scheduled more than this many days ago are swept.
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: i64,
    /// Offset east of UTC used to compute the reference date.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            send_interval_ms: default_send_interval_ms(),
            lookahead_days: default_lookahead_days(),
            stale_after_days: default_stale_after_days(),
            utc_offset_minutes: default_utc_offset_minutes(),
            routing: RoutingConfig::default(),
        }
    }
}

impl DispatchConfig {
    pub fn send_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.send_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

fn default_db_path() -> String { "~/.regwatch/regwatch.db".into() }
fn default_email_api_url() -> String { "https://api.resend.com/emails".into() }
fn default_whatsapp_api_url() -> String { "https://graph.facebook.com/v19.0".into() }
fn default_reminder_channels() -> Vec<Channel> { vec![Channel::Email, Channel::WhatsApp] }
fn default_parameter_channels() -> Vec<Channel> { vec![Channel::WhatsApp] }
fn default_send_interval_ms() -> u64 { 2000 }
fn default_lookahead_days() -> i64 { 5 }
fn default_stale_after_days() -> i64 { 1 }
fn default_utc_offset_minutes() -> i32 { 330 }
fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8787 }

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl RegWatchConfig {
    /// `~/.regwatch`.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".regwatch")
    }

    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Load from the default path (if present) and overlay the process environment.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::read_file(&path)?
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from an explicit path (must exist) and overlay the process environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RegWatchError::ConfigNotFound(path.display().to_string()));
        }
        let mut config = Self::read_file(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| RegWatchError::config(format!("{}: {e}", path.display())))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| RegWatchError::config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay values from an environment lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("REGWATCH_DB_PATH") { self.store.db_path = v; }
        if let Some(v) = get("EMAIL_API_URL") { self.email.api_url = v; }
        if let Some(v) = get("EMAIL_API_KEY") { self.email.api_key = Some(v); }
        if let Some(v) = get("EMAIL_FROM") { self.email.from = Some(v); }
        if let Some(v) = get("WHATSAPP_API_URL") { self.whatsapp.api_url = v; }
        if let Some(v) = get("WHATSAPP_API_KEY") { self.whatsapp.api_key = Some(v); }
        if let Some(v) = get("WHATSAPP_PHONE_NUMBER_ID") { self.whatsapp.phone_number_id = Some(v); }
        if let Some(v) = get("WHATSAPP_ACCESS_TOKEN") { self.whatsapp.access_token = Some(v); }

        if let Some(v) = get("REGWATCH_UTC_OFFSET_MINUTES") {
            match v.parse() {
                Ok(n) => self.dispatch.utc_offset_minutes = n,
                Err(_) => tracing::warn!("Ignoring REGWATCH_UTC_OFFSET_MINUTES={v}: not an integer"),
            }
        }
        if let Some(v) = get("REGWATCH_SEND_INTERVAL_MS") {
            match v.parse() {
                Ok(n) => self.dispatch.send_interval_ms = n,
                Err(_) => tracing::warn!("Ignoring REGWATCH_SEND_INTERVAL_MS={v}: not an integer"),
            }
        }
    }

    /// Database path with `~` expanded.
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.store.db_path).to_string())
    }

    /// Check settings whose absence makes a run impossible.
    ///
    /// Channel credentials are deliberately not checked here: a channel
    /// without credentials fails its own sends instead.
    pub fn validate(&self) -> Result<()> {
        if self.store.db_path.trim().is_empty() {
            return Err(RegWatchError::config("store.db_path is empty"));
        }
        if self.dispatch.lookahead_days < 0 {
            return Err(RegWatchError::config("dispatch.lookahead_days must be >= 0"));
        }
        if self.dispatch.stale_after_days < 0 {
            return Err(RegWatchError::config("dispatch.stale_after_days must be >= 0"));
        }
        if self.dispatch.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(RegWatchError::config(format!(
                "dispatch.utc_offset_minutes out of range: {}",
                self.dispatch.utc_offset_minutes
            )));
        }
        if !self.email.is_configured() {
            tracing::warn!("Email channel not configured; email sends will fail");
        }
        if !self.whatsapp.is_configured() {
            tracing::warn!("WhatsApp channel not configured; WhatsApp sends will fail");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = RegWatchConfig::default();
        assert_eq!(config.dispatch.send_interval_ms, 2000);
        assert_eq!(config.dispatch.lookahead_days, 5);
        assert_eq!(config.dispatch.stale_after_days, 1);
        assert_eq!(config.dispatch.utc_offset_minutes, 330);
        assert!(!config.email.is_configured());
        assert!(!config.whatsapp.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_routing() {
        let routing = RoutingConfig::default();
        assert_eq!(routing.channels_for(EventKind::DueReminder), &[Channel::Email, Channel::WhatsApp]);
        assert_eq!(routing.channels_for(EventKind::UpcomingExpiry), &[Channel::WhatsApp]);
        assert_eq!(routing.channels_for(EventKind::Overdue), &[Channel::WhatsApp]);
    }

    #[test]
    fn test_env_overlay() {
        let env: HashMap<&str, &str> = [
            ("EMAIL_API_KEY", "re_123"),
            ("EMAIL_FROM", "alerts@example.com"),
            ("WHATSAPP_API_KEY", "k"),
            ("WHATSAPP_PHONE_NUMBER_ID", "1234"),
            ("WHATSAPP_ACCESS_TOKEN", "tok"),
            ("REGWATCH_SEND_INTERVAL_MS", "0"),
            ("REGWATCH_UTC_OFFSET_MINUTES", "not-a-number"),
            ("REGWATCH_DB_PATH", "   "),
        ]
        .into_iter()
        .collect();

        let mut config = RegWatchConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert!(config.email.is_configured());
        assert!(config.whatsapp.is_configured());
        assert_eq!(config.dispatch.send_interval_ms, 0);
        assert_eq!(config.dispatch.utc_offset_minutes, 330);
        assert_eq!(config.store.db_path, "~/.regwatch/regwatch.db");
    }

    #[test]
    fn test_partial_whatsapp_credentials_not_configured() {
        let mut config = RegWatchConfig::default();
        config.whatsapp.access_token = Some("tok".into());
        config.whatsapp.phone_number_id = Some("".into());
        assert!(!config.whatsapp.is_configured());
    }

    #[test]
    fn test_validate_rejects_empty_db_path() {
        let mut config = RegWatchConfig::default();
        config.store.db_path = " ".into();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, RegWatchError::Config(_)));
    }

    #[test]
    fn test_file_roundtrip_with_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[dispatch]
send_interval_ms = 500

[dispatch.routing]
overdue = ["email", "whatsapp"]

[email]
from = "alerts@example.com"
"#,
        )
        .unwrap();

        let config = RegWatchConfig::read_file(&path).unwrap();
        assert_eq!(config.dispatch.send_interval_ms, 500);
        assert_eq!(config.dispatch.lookahead_days, 5);
        assert_eq!(config.dispatch.routing.overdue, vec![Channel::Email, Channel::WhatsApp]);
        assert_eq!(config.dispatch.routing.upcoming_expiry, vec![Channel::WhatsApp]);
        assert_eq!(config.email.from.as_deref(), Some("alerts@example.com"));

        let out = dir.path().join("nested").join("saved.toml");
        config.save_to(&out).unwrap();
        let reloaded = RegWatchConfig::read_file(&out).unwrap();
        assert_eq!(reloaded.dispatch.send_interval_ms, 500);
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = RegWatchConfig::load_from(Path::new("/nonexistent/regwatch.toml")).unwrap_err();
        assert!(matches!(err, RegWatchError::ConfigNotFound(_)));
    }
}
