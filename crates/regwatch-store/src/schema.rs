//! SQLite schema. Dates are ISO-8601 text so range comparisons sort correctly.

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    full_name TEXT,
    email TEXT
);

CREATE TABLE IF NOT EXISTS unit_members (
    unit_id TEXT NOT NULL,
    user_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    PRIMARY KEY (unit_id, user_id)
);

CREATE TABLE IF NOT EXISTS compliance_parameters (
    id TEXT PRIMARY KEY,
    unit_id TEXT NOT NULL,
    category TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    issue_date TEXT NOT NULL,
    expiry_date TEXT NOT NULL,
    CHECK (expiry_date >= issue_date)
);
CREATE INDEX IF NOT EXISTS idx_parameters_expiry ON compliance_parameters(expiry_date);

CREATE TABLE IF NOT EXISTS reminders (
    id TEXT PRIMARY KEY,
    parameter_id TEXT NOT NULL REFERENCES compliance_parameters(id) ON DELETE CASCADE,
    unit_id TEXT NOT NULL,
    scheduled_date TEXT NOT NULL,
    scheduled_time TEXT NOT NULL DEFAULT '09:00:00',
    message TEXT,
    sent INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_reminders_date ON reminders(scheduled_date);

-- One row per (user, unit, channel). address is an email or a phone number.
CREATE TABLE IF NOT EXISTS subscriptions (
    user_id TEXT NOT NULL,
    unit_id TEXT NOT NULL,
    channel TEXT NOT NULL CHECK (channel IN ('email', 'whatsapp')),
    is_subscribed INTEGER NOT NULL DEFAULT 1,
    address TEXT,
    subscribed_at TEXT,
    unsubscribed_at TEXT,
    PRIMARY KEY (user_id, unit_id, channel)
);

CREATE TABLE IF NOT EXISTS delivery_logs (
    id TEXT PRIMARY KEY,
    event_kind TEXT NOT NULL,
    source_id TEXT NOT NULL,
    channel TEXT NOT NULL,
    recipient TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('sent', 'failed')),
    error TEXT,
    provider_message_id TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_delivery_logs_created ON delivery_logs(created_at);
";
