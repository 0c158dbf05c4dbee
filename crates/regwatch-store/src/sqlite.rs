//! SQLite compliance store.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use regwatch_core::error::{RegWatchError, Result};
use regwatch_core::traits::ComplianceStore;
use regwatch_core::types::{
    Channel, ComplianceParameter, DeliveryLog, DeliveryStatus, DueReminder, EventKind, EventRef,
    Member, Reminder, Subscription,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::schema::SCHEMA;

const PARAMETER_COLUMNS: &str = "id, unit_id, category, description, issue_date, expiry_date";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

fn query_err(e: rusqlite::Error) -> RegWatchError {
    RegWatchError::Query(e.to_string())
}

fn text_err(column: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        msg.into(),
    )
}

fn parameter_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<ComplianceParameter> {
    Ok(ComplianceParameter {
        id: row.get(offset)?,
        unit_id: row.get(offset + 1)?,
        category: row.get(offset + 2)?,
        description: row.get(offset + 3)?,
        issue_date: row.get(offset + 4)?,
        expiry_date: row.get(offset + 5)?,
    })
}

fn delivery_from_row(row: &Row<'_>) -> rusqlite::Result<DeliveryLog> {
    let kind: String = row.get(1)?;
    let channel: String = row.get(3)?;
    let status: String = row.get(5)?;
    Ok(DeliveryLog {
        id: row.get(0)?,
        event: EventRef {
            kind: EventKind::parse(&kind).ok_or_else(|| text_err(1, format!("unknown event kind {kind}")))?,
            source_id: row.get(2)?,
        },
        channel: Channel::parse(&channel).ok_or_else(|| text_err(3, format!("unknown channel {channel}")))?,
        recipient: row.get(4)?,
        status: match status.as_str() {
            "sent" => DeliveryStatus::Sent,
            "failed" => DeliveryStatus::Failed,
            other => return Err(text_err(5, format!("unknown status {other}"))),
        },
        error: row.get(6)?,
        provider_message_id: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl SqliteStore {
    /// Open (or create) a database file and apply the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| RegWatchError::StoreUnavailable(format!("{}: {e}", path.display())))?;
        let store = Self::init(conn)?;
        tracing::debug!("Compliance store opened: {}", path.display());
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RegWatchError::StoreUnavailable(e.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(query_err)?;
        conn.execute_batch(SCHEMA).map_err(query_err)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RegWatchError::StoreUnavailable(format!("connection lock poisoned: {e}")))
    }

    // ── Write helpers for the record-keeping layer and fixtures ──

    /// Create a parameter, or update it in place (renewal). Reminders keep
    /// pointing at the same row.
    pub fn insert_parameter(&self, p: &ComplianceParameter) -> Result<()> {
        if p.expiry_date < p.issue_date {
            return Err(RegWatchError::query(format!(
                "parameter {}: expiry date {} precedes issue date {}",
                p.id, p.expiry_date, p.issue_date
            )));
        }
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO compliance_parameters (id, unit_id, category, description, issue_date, expiry_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                unit_id = excluded.unit_id,
                category = excluded.category,
                description = excluded.description,
                issue_date = excluded.issue_date,
                expiry_date = excluded.expiry_date",
            params![p.id, p.unit_id, p.category, p.description, p.issue_date, p.expiry_date],
        ).map_err(query_err)?;
        Ok(())
    }

    pub fn insert_reminder(&self, r: &Reminder) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO reminders (id, parameter_id, unit_id, scheduled_date, scheduled_time, message, sent)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![r.id, r.parameter_id, r.unit_id, r.scheduled_date, r.scheduled_time, r.message, r.sent],
        ).map_err(query_err)?;
        Ok(())
    }

    /// Create (or update) a profile and attach it to a unit.
    pub fn insert_member(&self, member: &Member) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO profiles (id, full_name, email) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET full_name = excluded.full_name, email = excluded.email",
            params![member.user_id, member.full_name, member.email],
        ).map_err(query_err)?;
        conn.execute(
            "INSERT OR IGNORE INTO unit_members (unit_id, user_id) VALUES (?1, ?2)",
            params![member.unit_id, member.user_id],
        ).map_err(query_err)?;
        Ok(())
    }

    pub fn upsert_subscription(&self, s: &Subscription) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO subscriptions
                (user_id, unit_id, channel, is_subscribed, address, subscribed_at, unsubscribed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                s.user_id,
                s.unit_id,
                s.channel.as_str(),
                s.is_subscribed,
                s.address,
                s.subscribed_at,
                s.unsubscribed_at,
            ],
        ).map_err(query_err)?;
        Ok(())
    }

    pub fn get_reminder(&self, id: &str) -> Result<Option<Reminder>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, parameter_id, unit_id, scheduled_date, scheduled_time, message, sent
             FROM reminders WHERE id = ?1",
            params![id],
            |row| {
                Ok(Reminder {
                    id: row.get(0)?,
                    parameter_id: row.get(1)?,
                    unit_id: row.get(2)?,
                    scheduled_date: row.get(3)?,
                    scheduled_time: row.get(4)?,
                    message: row.get(5)?,
                    sent: row.get(6)?,
                })
            },
        )
        .optional()
        .map_err(query_err)
    }

    pub fn get_parameter(&self, id: &str) -> Result<Option<ComplianceParameter>> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {PARAMETER_COLUMNS} FROM compliance_parameters WHERE id = ?1"),
            params![id],
            |row| parameter_from_row(row, 0),
        )
        .optional()
        .map_err(query_err)
    }

    /// Row counts for (parameters, reminders, delivery logs).
    pub fn stats(&self) -> Result<(usize, usize, usize)> {
        let conn = self.lock()?;
        let count = |table: &str| -> Result<usize> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get::<_, i64>(0))
                .map(|n| n as usize)
                .map_err(query_err)
        };
        Ok((count("compliance_parameters")?, count("reminders")?, count("delivery_logs")?))
    }

    fn parameters_where(&self, clause: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<ComplianceParameter>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {PARAMETER_COLUMNS} FROM compliance_parameters WHERE {clause} ORDER BY expiry_date, id"
            ))
            .map_err(query_err)?;
        let rows = stmt
            .query_map(args, |row| parameter_from_row(row, 0))
            .map_err(query_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(query_err)
    }

    fn ids_where(&self, sql: &str, date: NaiveDate) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql).map_err(query_err)?;
        let rows = stmt
            .query_map(params![date], |row| row.get::<_, String>(0))
            .map_err(query_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(query_err)
    }
}

#[async_trait]
impl ComplianceStore for SqliteStore {
    fn name(&self) -> &str { "sqlite" }

    async fn ping(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))
            .map_err(|e| RegWatchError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn reminders_scheduled_on(&self, date: NaiveDate, include_sent: bool) -> Result<Vec<DueReminder>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT r.id, r.parameter_id, r.unit_id, r.scheduled_date, r.scheduled_time, r.message, r.sent,
                    p.id, p.unit_id, p.category, p.description, p.issue_date, p.expiry_date
             FROM reminders r
             JOIN compliance_parameters p ON p.id = r.parameter_id
             WHERE r.scheduled_date = ?1 AND (?2 OR r.sent = 0)
             ORDER BY r.scheduled_time, r.id"
        ).map_err(query_err)?;

        let rows = stmt.query_map(params![date, include_sent], |row| {
            Ok(DueReminder {
                reminder: Reminder {
                    id: row.get(0)?,
                    parameter_id: row.get(1)?,
                    unit_id: row.get(2)?,
                    scheduled_date: row.get(3)?,
                    scheduled_time: row.get::<_, NaiveTime>(4)?,
                    message: row.get(5)?,
                    sent: row.get(6)?,
                },
                parameter: parameter_from_row(row, 7)?,
            })
        }).map_err(query_err)?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(query_err)
    }

    async fn parameters_expiring_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ComplianceParameter>> {
        self.parameters_where("expiry_date >= ?1 AND expiry_date <= ?2", &[&from, &to])
    }

    async fn parameters_expired_before(&self, date: NaiveDate) -> Result<Vec<ComplianceParameter>> {
        self.parameters_where("expiry_date < ?1", &[&date])
    }

    async fn unit_members(&self, unit_id: &str) -> Result<Vec<Member>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT m.user_id, m.unit_id, p.full_name, p.email
             FROM unit_members m
             LEFT JOIN profiles p ON p.id = m.user_id
             WHERE m.unit_id = ?1
             ORDER BY m.rowid"
        ).map_err(query_err)?;

        let rows = stmt.query_map(params![unit_id], |row| {
            Ok(Member {
                user_id: row.get(0)?,
                unit_id: row.get(1)?,
                full_name: row.get(2)?,
                email: row.get(3)?,
            })
        }).map_err(query_err)?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(query_err)
    }

    async fn subscription(&self, user_id: &str, unit_id: &str, channel: Channel) -> Result<Option<Subscription>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT user_id, unit_id, is_subscribed, address, subscribed_at, unsubscribed_at
             FROM subscriptions
             WHERE user_id = ?1 AND unit_id = ?2 AND channel = ?3",
            params![user_id, unit_id, channel.as_str()],
            |row| {
                Ok(Subscription {
                    user_id: row.get(0)?,
                    unit_id: row.get(1)?,
                    channel,
                    is_subscribed: row.get(2)?,
                    address: row.get(3)?,
                    subscribed_at: row.get(4)?,
                    unsubscribed_at: row.get(5)?,
                })
            },
        )
        .optional()
        .map_err(query_err)
    }

    async fn record_delivery(&self, log: &DeliveryLog) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO delivery_logs
                (id, event_kind, source_id, channel, recipient, status, error, provider_message_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                log.id,
                log.event.kind.as_str(),
                log.event.source_id,
                log.channel.as_str(),
                log.recipient,
                log.status.as_str(),
                log.error,
                log.provider_message_id,
                log.created_at,
            ],
        ).map_err(query_err)?;
        Ok(())
    }

    async fn mark_reminder_sent(&self, reminder_id: &str) -> Result<()> {
        let conn = self.lock()?;
        let updated = conn
            .execute("UPDATE reminders SET sent = 1 WHERE id = ?1", params![reminder_id])
            .map_err(query_err)?;
        if updated == 0 {
            return Err(RegWatchError::query(format!("reminder {reminder_id} not found")));
        }
        Ok(())
    }

    async fn reminders_with_expired_parameter(&self, date: NaiveDate) -> Result<Vec<String>> {
        self.ids_where(
            "SELECT r.id FROM reminders r
             JOIN compliance_parameters p ON p.id = r.parameter_id
             WHERE p.expiry_date < ?1
             ORDER BY r.id",
            date,
        )
    }

    async fn reminders_scheduled_before(&self, date: NaiveDate) -> Result<Vec<String>> {
        self.ids_where(
            "SELECT id FROM reminders WHERE scheduled_date < ?1 ORDER BY id",
            date,
        )
    }

    async fn delete_reminder(&self, reminder_id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM reminders WHERE id = ?1", params![reminder_id])
            .map_err(query_err)?;
        Ok(())
    }

    async fn recent_deliveries(&self, limit: usize) -> Result<Vec<DeliveryLog>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, event_kind, source_id, channel, recipient, status, error, provider_message_id, created_at
             FROM delivery_logs
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1"
        ).map_err(query_err)?;
        let rows = stmt
            .query_map(params![i64::try_from(limit).unwrap_or(i64::MAX)], delivery_from_row)
            .map_err(query_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(query_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn parameter(id: &str, expiry: &str) -> ComplianceParameter {
        ComplianceParameter {
            id: id.into(),
            unit_id: "unit-1".into(),
            category: "License".into(),
            description: format!("{id} description"),
            issue_date: d("2020-01-01"),
            expiry_date: d(expiry),
        }
    }

    fn reminder(id: &str, parameter_id: &str, date: &str, sent: bool) -> Reminder {
        Reminder {
            id: id.into(),
            parameter_id: parameter_id.into(),
            unit_id: "unit-1".into(),
            scheduled_date: d(date),
            scheduled_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            message: Some("renew soon".into()),
            sent,
        }
    }

    #[tokio::test]
    async fn test_expiry_window_is_inclusive() {
        let store = SqliteStore::open_in_memory().unwrap();
        for (id, expiry) in [("before", "2026-03-09"), ("start", "2026-03-10"), ("end", "2026-03-15"), ("after", "2026-03-16")] {
            store.insert_parameter(&parameter(id, expiry)).unwrap();
        }

        let ids: Vec<String> = store
            .parameters_expiring_between(d("2026-03-10"), d("2026-03-15"))
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["start", "end"]);

        let overdue = store.parameters_expired_before(d("2026-03-10")).await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, "before");
    }

    #[tokio::test]
    async fn test_reminders_scheduled_on_respects_sent_flag() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_parameter(&parameter("p1", "2026-12-31")).unwrap();
        store.insert_reminder(&reminder("r-open", "p1", "2026-03-10", false)).unwrap();
        store.insert_reminder(&reminder("r-done", "p1", "2026-03-10", true)).unwrap();
        store.insert_reminder(&reminder("r-later", "p1", "2026-03-11", false)).unwrap();

        let unsent = store.reminders_scheduled_on(d("2026-03-10"), false).await.unwrap();
        assert_eq!(unsent.len(), 1);
        assert_eq!(unsent[0].reminder.id, "r-open");
        assert_eq!(unsent[0].parameter.id, "p1");
        assert_eq!(unsent[0].reminder.message.as_deref(), Some("renew soon"));

        let all = store.reminders_scheduled_on(d("2026-03-10"), true).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_renewing_parameter_keeps_its_reminders() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut p1 = parameter("p1", "2026-03-20");
        store.insert_parameter(&p1).unwrap();
        store.insert_reminder(&reminder("r1", "p1", "2026-03-15", false)).unwrap();

        p1.expiry_date = d("2027-03-20");
        store.insert_parameter(&p1).unwrap();

        assert_eq!(store.get_parameter("p1").unwrap().unwrap().expiry_date, d("2027-03-20"));
        let r1 = store.get_reminder("r1").unwrap().unwrap();
        assert_eq!(r1.parameter_id, "p1");
        assert_eq!(store.stats().unwrap(), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_mark_sent_and_missing_reminder() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_parameter(&parameter("p1", "2026-12-31")).unwrap();
        store.insert_reminder(&reminder("r1", "p1", "2026-03-10", false)).unwrap();

        store.mark_reminder_sent("r1").await.unwrap();
        assert!(store.get_reminder("r1").unwrap().unwrap().sent);
        assert!(store.mark_reminder_sent("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_members_keep_insertion_order_and_subscriptions_by_channel() {
        let store = SqliteStore::open_in_memory().unwrap();
        for user in ["zed", "amy"] {
            store.insert_member(&Member {
                user_id: user.into(),
                unit_id: "unit-1".into(),
                full_name: Some(user.to_uppercase()),
                email: Some(format!("{user}@example.com")),
            }).unwrap();
        }
        store.upsert_subscription(&Subscription {
            user_id: "amy".into(),
            unit_id: "unit-1".into(),
            channel: Channel::WhatsApp,
            is_subscribed: true,
            address: Some("+15550100".into()),
            subscribed_at: Some(Utc::now()),
            unsubscribed_at: None,
        }).unwrap();

        let members = store.unit_members("unit-1").await.unwrap();
        let ids: Vec<&str> = members.iter().map(|m| m.user_id.as_str()).collect();
        assert_eq!(ids, vec!["zed", "amy"]);

        let sub = store.subscription("amy", "unit-1", Channel::WhatsApp).await.unwrap().unwrap();
        assert!(sub.is_subscribed);
        assert_eq!(sub.address.as_deref(), Some("+15550100"));
        assert!(store.subscription("amy", "unit-1", Channel::Email).await.unwrap().is_none());
        assert!(store.unit_members("unit-2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retention_queries() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_parameter(&parameter("expired", "2026-03-01")).unwrap();
        store.insert_parameter(&parameter("valid", "2026-12-31")).unwrap();
        store.insert_reminder(&reminder("r-expired", "expired", "2026-03-20", false)).unwrap();
        store.insert_reminder(&reminder("r-stale", "valid", "2026-03-08", false)).unwrap();
        store.insert_reminder(&reminder("r-yesterday", "valid", "2026-03-09", false)).unwrap();

        let expired = store.reminders_with_expired_parameter(d("2026-03-10")).await.unwrap();
        assert_eq!(expired, vec!["r-expired"]);

        let stale = store.reminders_scheduled_before(d("2026-03-09")).await.unwrap();
        assert_eq!(stale, vec!["r-stale"]);

        store.delete_reminder("r-stale").await.unwrap();
        assert!(store.get_reminder("r-stale").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delivery_log_roundtrip_newest_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        for (i, status) in [DeliveryStatus::Failed, DeliveryStatus::Sent].into_iter().enumerate() {
            store.record_delivery(&DeliveryLog {
                id: format!("log-{i}"),
                event: EventRef { kind: EventKind::Overdue, source_id: "p1".into() },
                channel: Channel::WhatsApp,
                recipient: "15550100".into(),
                status,
                error: (status == DeliveryStatus::Failed).then(|| "rejected".into()),
                provider_message_id: None,
                created_at: Utc::now() + chrono::Duration::seconds(i as i64),
            }).await.unwrap();
        }

        let logs = store.recent_deliveries(10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].id, "log-1");
        assert_eq!(logs[0].status, DeliveryStatus::Sent);
        assert_eq!(logs[1].error.as_deref(), Some("rejected"));
        assert_eq!(logs[1].event.kind, EventKind::Overdue);

        assert_eq!(store.recent_deliveries(1).await.unwrap().len(), 1);
        assert_eq!(store.recent_deliveries(usize::MAX).await.unwrap().len(), 2);
    }

    #[test]
    fn test_rejects_expiry_before_issue() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut p = parameter("bad", "2019-01-01");
        p.issue_date = d("2020-01-01");
        assert!(store.insert_parameter(&p).is_err());
    }

    #[tokio::test]
    async fn test_open_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("regwatch.db");
        let store = SqliteStore::open(&path).unwrap();
        store.ping().await.unwrap();
        assert!(path.exists());
        assert_eq!(store.stats().unwrap(), (0, 0, 0));
    }
}
