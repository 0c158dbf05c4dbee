//! Run coordination: one invocation from sweep to summary.
//!
//! ```text
//! run(invocation)
//!   ├── config check + store ping        (fatal on failure)
//!   ├── reference date, computed once
//!   ├── RetentionSweeper::sweep          (real date, even when overridden)
//!   ├── EligibilityResolver::resolve     (three independent sets)
//!   └── Dispatcher::dispatch per event   → RunSummary
//! ```

use chrono::NaiveDate;
use regwatch_channels::SenderMap;
use regwatch_core::clock::{self, Clock, SystemClock};
use regwatch_core::error::{RegWatchError, Result};
use regwatch_core::traits::ComplianceStore;
use regwatch_core::RegWatchConfig;
use std::sync::Arc;

use crate::eligibility::EligibilityResolver;
use crate::orchestrator::Dispatcher;
use crate::summary::{AbortedSet, RunSummary};
use crate::sweeper::RetentionSweeper;
use crate::trigger::{Invocation, TriggerSource};

pub struct RunCoordinator {
    config: RegWatchConfig,
    store: Arc<dyn ComplianceStore>,
    clock: Arc<dyn Clock>,
    sweeper: RetentionSweeper,
    eligibility: EligibilityResolver,
    dispatcher: Dispatcher,
}

impl RunCoordinator {
    pub fn new(config: RegWatchConfig, store: Arc<dyn ComplianceStore>, senders: SenderMap) -> Self {
        let dispatch = &config.dispatch;
        Self {
            sweeper: RetentionSweeper::new(store.clone(), dispatch.stale_after_days),
            eligibility: EligibilityResolver::new(store.clone(), dispatch.lookahead_days),
            dispatcher: Dispatcher::new(
                store.clone(),
                senders,
                dispatch.routing.clone(),
                dispatch.send_interval(),
            ),
            clock: Arc::new(SystemClock),
            store,
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &RegWatchConfig {
        &self.config
    }

    /// Today in the policy offset, ignoring any override.
    pub fn clock_date(&self) -> NaiveDate {
        clock::reference_date(self.clock.now(), self.config.dispatch.utc_offset_minutes)
    }

    /// The date eligibility and composition use for this run.
    pub fn reference_date(&self, invocation: &Invocation) -> NaiveDate {
        Self::effective_date(invocation, self.clock_date())
    }

    fn effective_date(invocation: &Invocation, clock_date: NaiveDate) -> NaiveDate {
        match (invocation.source, invocation.reference_date) {
            (TriggerSource::ManualTest, Some(date)) => date,
            (TriggerSource::ScheduledCron, Some(date)) => {
                tracing::warn!("Ignoring reference_date {date} on a scheduled run");
                clock_date
            }
            (_, None) => clock_date,
        }
    }

    /// Execute one run. Errors only when the run cannot start at all.
    pub async fn run(&self, invocation: &Invocation) -> Result<RunSummary> {
        self.config.validate()?;
        self.store.ping().await.map_err(|e| match e {
            RegWatchError::StoreUnavailable(_) => e,
            other => RegWatchError::StoreUnavailable(other.to_string()),
        })?;

        let started_at = self.clock.now();
        // Cleanup always follows the real date; an override never deletes rows.
        let sweep_date = clock::reference_date(started_at, self.config.dispatch.utc_offset_minutes);
        let today = Self::effective_date(invocation, sweep_date);
        if sweep_date != today {
            tracing::info!("Reference date overridden to {today}; cleanup uses {sweep_date}");
        }
        tracing::info!(
            "Run started: source={} reference_date={today} store={} (caller timestamp {:?})",
            invocation.source, self.store.name(), invocation.timestamp
        );

        let mut summary = RunSummary::new(today, invocation.source, started_at);
        summary.cleanup = self.sweeper.sweep(sweep_date).await;

        let eligible = self.eligibility.resolve(today, invocation.source).await;
        for set in eligible.into_sets() {
            if let Some(error) = set.error {
                summary.aborted_sets.push(AbortedSet { set: set.kind, error });
                continue;
            }
            for outcome in self.dispatcher.dispatch_all(&set.events, today).await {
                summary.record(outcome);
            }
        }

        summary.finished_at = self.clock.now().max(started_at);
        tracing::info!(
            "Run finished: {} reminder / {} upcoming / {} overdue event(s), {} send attempt(s), {} aborted set(s){}",
            summary.due_reminders.processed,
            summary.upcoming_expiry.processed,
            summary.overdue.processed,
            summary.total_attempts(),
            summary.aborted_sets.len(),
            if summary.is_degraded() { " (degraded)" } else { "" },
        );
        Ok(summary)
    }
}
