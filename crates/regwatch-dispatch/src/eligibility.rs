//! Eligibility resolution: which events are due on the reference date.
//!
//! Three independent queries. A failed query empties only its own set and is
//! reported on that set; the others still go out.

use chrono::{NaiveDate, TimeDelta};
use regwatch_core::traits::ComplianceStore;
use regwatch_core::types::{EventKind, NotificationEvent};
use std::sync::Arc;

use crate::trigger::TriggerSource;

/// One resolved event set, or the reason it could not be resolved.
#[derive(Debug, Clone)]
pub struct EventSet {
    pub kind: EventKind,
    pub events: Vec<NotificationEvent>,
    pub error: Option<String>,
}

impl EventSet {
    fn ok(kind: EventKind, events: Vec<NotificationEvent>) -> Self {
        Self { kind, events, error: None }
    }

    fn aborted(kind: EventKind, error: String) -> Self {
        Self { kind, events: Vec::new(), error: Some(error) }
    }

    pub fn is_aborted(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct EligibleEvents {
    pub due_reminders: EventSet,
    pub upcoming_expiry: EventSet,
    pub overdue: EventSet,
}

impl EligibleEvents {
    /// Sets in dispatch order.
    pub fn into_sets(self) -> [EventSet; 3] {
        [self.due_reminders, self.upcoming_expiry, self.overdue]
    }
}

/// `[today, today + lookahead_days]`, both ends inclusive.
pub fn upcoming_window(today: NaiveDate, lookahead_days: i64) -> (NaiveDate, NaiveDate) {
    let end = today
        .checked_add_signed(TimeDelta::days(lookahead_days.max(0)))
        .unwrap_or(NaiveDate::MAX);
    (today, end)
}

pub struct EligibilityResolver {
    store: Arc<dyn ComplianceStore>,
    lookahead_days: i64,
}

impl EligibilityResolver {
    pub fn new(store: Arc<dyn ComplianceStore>, lookahead_days: i64) -> Self {
        Self { store, lookahead_days }
    }

    pub async fn resolve(&self, today: NaiveDate, source: TriggerSource) -> EligibleEvents {
        EligibleEvents {
            due_reminders: self.due_reminders(today, source).await,
            upcoming_expiry: self.upcoming_expiry(today).await,
            overdue: self.overdue(today).await,
        }
    }

    /// Reminders scheduled today; already-sent rows only on manual test runs.
    pub async fn due_reminders(&self, today: NaiveDate, source: TriggerSource) -> EventSet {
        let kind = EventKind::DueReminder;
        match self.store.reminders_scheduled_on(today, source.includes_sent_reminders()).await {
            Ok(rows) => {
                tracing::info!("{} due reminder(s) for {today} ({source})", rows.len());
                EventSet::ok(kind, rows.into_iter().map(NotificationEvent::due_reminder).collect())
            }
            Err(e) => {
                tracing::warn!("Due-reminder query failed: {e}");
                EventSet::aborted(kind, e.to_string())
            }
        }
    }

    /// Parameters expiring inside the lookahead window. No dedup: every run re-notifies.
    pub async fn upcoming_expiry(&self, today: NaiveDate) -> EventSet {
        let kind = EventKind::UpcomingExpiry;
        let (from, to) = upcoming_window(today, self.lookahead_days);
        match self.store.parameters_expiring_between(from, to).await {
            Ok(rows) => {
                tracing::info!("{} parameter(s) expiring between {from} and {to}", rows.len());
                EventSet::ok(kind, rows.into_iter().map(NotificationEvent::upcoming).collect())
            }
            Err(e) => {
                tracing::warn!("Upcoming-expiry query failed: {e}");
                EventSet::aborted(kind, e.to_string())
            }
        }
    }

    /// Parameters already past expiry. Re-notified until renewed or deleted.
    pub async fn overdue(&self, today: NaiveDate) -> EventSet {
        let kind = EventKind::Overdue;
        match self.store.parameters_expired_before(today).await {
            Ok(rows) => {
                tracing::info!("{} overdue parameter(s) as of {today}", rows.len());
                EventSet::ok(kind, rows.into_iter().map(NotificationEvent::overdue).collect())
            }
            Err(e) => {
                tracing::warn!("Overdue query failed: {e}");
                EventSet::aborted(kind, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use regwatch_core::types::{ComplianceParameter, Reminder};
    use regwatch_store::SqliteStore;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn parameter(id: &str, expiry: NaiveDate) -> ComplianceParameter {
        ComplianceParameter {
            id: id.into(),
            unit_id: "unit-1".into(),
            category: "Permit".into(),
            description: id.into(),
            issue_date: d("2000-01-01"),
            expiry_date: expiry,
        }
    }

    fn ids(set: &EventSet) -> Vec<String> {
        set.events.iter().map(|e| e.event_ref().source_id).collect()
    }

    #[test]
    fn test_upcoming_window() {
        let today = d("2026-12-29");
        assert_eq!(upcoming_window(today, 5), (today, d("2027-01-03")));
        assert_eq!(upcoming_window(today, -3), (today, today));
    }

    #[tokio::test]
    async fn test_window_boundaries_and_overdue() {
        let today = d("2026-03-10");
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_parameter(&parameter("plus5", today + TimeDelta::days(5))).unwrap();
        store.insert_parameter(&parameter("plus6", today + TimeDelta::days(6))).unwrap();
        store.insert_parameter(&parameter("today", today)).unwrap();
        store.insert_parameter(&parameter("minus1", today - TimeDelta::days(1))).unwrap();

        let resolver = EligibilityResolver::new(Arc::new(store), 5);
        let events = resolver.resolve(today, TriggerSource::ScheduledCron).await;

        assert_eq!(ids(&events.upcoming_expiry), vec!["today", "plus5"]);
        assert_eq!(ids(&events.overdue), vec!["minus1"]);
        assert!(events.due_reminders.events.is_empty());
        assert!(!events.overdue.is_aborted());
    }

    #[tokio::test]
    async fn test_sent_reminders_only_on_manual_runs() {
        let today = d("2026-03-10");
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_parameter(&parameter("p1", d("2026-06-01"))).unwrap();
        store.insert_reminder(&Reminder {
            id: "r1".into(),
            parameter_id: "p1".into(),
            unit_id: "unit-1".into(),
            scheduled_date: today,
            scheduled_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            message: None,
            sent: true,
        }).unwrap();

        let resolver = EligibilityResolver::new(Arc::new(store), 5);
        let scheduled = resolver.due_reminders(today, TriggerSource::ScheduledCron).await;
        assert!(scheduled.events.is_empty());

        let manual = resolver.due_reminders(today, TriggerSource::ManualTest).await;
        assert_eq!(ids(&manual), vec!["r1"]);
        assert_eq!(manual.events[0].kind, EventKind::DueReminder);
    }
}
