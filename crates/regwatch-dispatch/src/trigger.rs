//! Invocation payload shared by the HTTP trigger and the CLI.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Who asked for the run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerSource {
    ScheduledCron,
    ManualTest,
}

impl TriggerSource {
    /// Manual test runs re-process reminders already marked sent so the same
    /// data can be verified repeatedly; scheduled runs never do.
    pub fn includes_sent_reminders(&self) -> bool {
        matches!(self, TriggerSource::ManualTest)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerSource::ScheduledCron => "scheduled-cron",
            TriggerSource::ManualTest => "manual-test",
        }
    }
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invocation {
    pub source: TriggerSource,
    /// Caller's timestamp. Logged only; the run's clock decides the date.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Reference-date override, honoured for manual test runs only.
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

impl Invocation {
    pub fn scheduled() -> Self {
        Self { source: TriggerSource::ScheduledCron, timestamp: Some(Utc::now()), reference_date: None }
    }

    pub fn manual_test() -> Self {
        Self { source: TriggerSource::ManualTest, timestamp: Some(Utc::now()), reference_date: None }
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }
}
