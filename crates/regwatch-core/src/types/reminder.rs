//! User-authored reminders.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::parameter::ComplianceParameter;

/// A reminder scheduled against one compliance parameter.
///
/// `sent` flips from false to true exactly once, and only after at least one
/// successful delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reminder {
    pub id: String,
    pub parameter_id: String,
    pub unit_id: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub sent: bool,
}

/// A reminder joined with the parameter it refers to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DueReminder {
    pub reminder: Reminder,
    pub parameter: ComplianceParameter,
}
