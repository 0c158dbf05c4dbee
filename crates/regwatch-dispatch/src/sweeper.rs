//! Retention sweep: deletes reminders that can no longer matter.
//!
//! Runs before eligibility so a swept reminder is never dispatched in the
//! same run. Each row is deleted on its own; one failure does not stop the
//! rest.

use chrono::{NaiveDate, TimeDelta};
use regwatch_core::traits::ComplianceStore;
use std::sync::Arc;

use crate::summary::CleanupSummary;

pub struct RetentionSweeper {
    store: Arc<dyn ComplianceStore>,
    stale_after_days: i64,
}

impl RetentionSweeper {
    pub fn new(store: Arc<dyn ComplianceStore>, stale_after_days: i64) -> Self {
        Self { store, stale_after_days }
    }

    /// Reminders scheduled before this date are stale.
    pub fn stale_cutoff(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_signed(TimeDelta::days(self.stale_after_days.max(0)))
            .unwrap_or(NaiveDate::MIN)
    }

    pub async fn sweep(&self, today: NaiveDate) -> CleanupSummary {
        let mut summary = CleanupSummary::default();

        match self.store.reminders_with_expired_parameter(today).await {
            Ok(ids) => {
                let deleted = self.delete_each(&ids, "expired parameter", &mut summary).await;
                summary.expired_parameter_deleted = deleted;
            }
            Err(e) => {
                tracing::warn!("Could not list reminders of expired parameters: {e}");
                summary.error(format!("expired-parameter query: {e}"));
            }
        }

        let cutoff = self.stale_cutoff(today);
        match self.store.reminders_scheduled_before(cutoff).await {
            Ok(ids) => {
                let deleted = self.delete_each(&ids, "stale", &mut summary).await;
                summary.stale_deleted = deleted;
            }
            Err(e) => {
                tracing::warn!("Could not list stale reminders: {e}");
                summary.error(format!("stale query: {e}"));
            }
        }

        if summary.deleted() > 0 || summary.errors > 0 {
            tracing::info!(
                "Cleanup: {} expired-parameter, {} stale reminder(s) deleted, {} error(s)",
                summary.expired_parameter_deleted, summary.stale_deleted, summary.errors
            );
        }
        summary
    }

    async fn delete_each(&self, ids: &[String], reason: &str, summary: &mut CleanupSummary) -> usize {
        let mut deleted = 0;
        for id in ids {
            match self.store.delete_reminder(id).await {
                Ok(()) => {
                    tracing::debug!("Deleted {reason} reminder {id}");
                    deleted += 1;
                }
                Err(e) => {
                    tracing::warn!("Could not delete {reason} reminder {id}: {e}");
                    summary.error(format!("delete {id}: {e}"));
                }
            }
        }
        deleted
    }
}
