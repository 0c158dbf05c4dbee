//! Message composition: pure rendering of an event for one recipient.

use chrono::NaiveDate;
use regwatch_core::types::{Channel, EventKind, MessageContent, NotificationEvent, Recipient};

use crate::terminology::{self, Terminology};

const SIGNATURE: &str = "RegWatch compliance alerts";

/// Day/month/year display form.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Human phrase for a signed day count.
pub fn expiry_phrase(days_until_expiry: i64) -> String {
    match days_until_expiry {
        d if d > 1 => format!("expires in {d} days"),
        1 => "expires tomorrow".into(),
        0 => "expires today".into(),
        -1 => "expired 1 day ago".into(),
        d => format!("expired {} days ago", d.unsigned_abs()),
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Everything the templates need, computed once per (event, recipient).
struct Facts<'a> {
    term: &'static Terminology,
    greeting_name: &'a str,
    subject: String,
    headline: String,
    details: Vec<(&'static str, String)>,
    note: Option<&'a str>,
}

fn facts<'a>(event: &'a NotificationEvent, recipient: &'a Recipient, today: NaiveDate) -> Facts<'a> {
    let term = terminology::lookup(&event.parameter.category);
    let parameter = &event.parameter;
    let days = event.days_until_expiry(today);
    let label = if parameter.description.trim().is_empty() {
        term.title.to_string()
    } else {
        parameter.description.trim().to_string()
    };

    let (subject, headline) = match event.kind {
        EventKind::DueReminder => (
            format!("Reminder: {} {}", term.title, expiry_phrase(days)),
            format!("This is your scheduled reminder: {label} {}.", expiry_phrase(days)),
        ),
        EventKind::UpcomingExpiry => (
            format!("{} expiring soon: {label}", term.title),
            format!("{label} {}.", expiry_phrase(days)),
        ),
        EventKind::Overdue => (
            format!("Overdue: {} {label} has expired", term.title),
            format!("{label} {}.", expiry_phrase(days)),
        ),
    };

    let mut details = vec![
        ("Type", term.title.to_string()),
        ("Expiry date", format_date(parameter.expiry_date)),
    ];
    match event.kind {
        EventKind::Overdue => details.push(("Days overdue", days.unsigned_abs().to_string())),
        EventKind::DueReminder | EventKind::UpcomingExpiry => {
            details.push(("Days until expiry", days.to_string()))
        }
    }
    if let Some(reminder) = &event.reminder {
        details.push(("Reminder date", format_date(reminder.scheduled_date)));
    }

    let note = event
        .reminder
        .as_ref()
        .and_then(|r| r.message.as_deref())
        .map(str::trim)
        .filter(|m| !m.is_empty());

    let greeting_name = recipient
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("there");

    Facts { term, greeting_name, subject, headline, details, note }
}

fn call_to_action(term: &Terminology) -> String {
    format!("Please {} the {} as soon as possible.", term.action, term.title.to_lowercase())
}

fn render_text(f: &Facts<'_>) -> String {
    let mut out = format!("Hello {},\n\n{}\n\n", f.greeting_name, f.headline);
    for (label, value) in &f.details {
        out.push_str(&format!("{label}: {value}\n"));
    }
    if let Some(note) = f.note {
        out.push_str(&format!("Note: {note}\n"));
    }
    out.push_str(&format!("\n{}\n{}\n\n-- {SIGNATURE}\n", f.term.description, call_to_action(f.term)));
    out
}

fn render_html(f: &Facts<'_>) -> String {
    let mut rows = String::new();
    for (label, value) in &f.details {
        rows.push_str(&format!(
            "<tr><td style=\"padding:4px 12px 4px 0;color:#555\">{}</td><td style=\"padding:4px 0\"><strong>{}</strong></td></tr>",
            escape_html(label),
            escape_html(value),
        ));
    }
    let note = f
        .note
        .map(|n| format!("<p style=\"background:#fff8e1;padding:8px\"><em>Note:</em> {}</p>", escape_html(n)))
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html><html><body style=\"font-family:Arial,sans-serif;color:#222\">\
<h2 style=\"color:#b71c1c\">{subject}</h2>\
<p>Hello {name},</p>\
<p>{headline}</p>\
<table>{rows}</table>\
{note}\
<p>{description}</p>\
<p><strong>{cta}</strong></p>\
<p style=\"color:#888;font-size:12px\">{SIGNATURE}</p>\
</body></html>",
        subject = escape_html(&f.subject),
        name = escape_html(f.greeting_name),
        headline = escape_html(&f.headline),
        description = escape_html(f.term.description),
        cta = escape_html(&call_to_action(f.term)),
    )
}

fn render_whatsapp(f: &Facts<'_>) -> String {
    let mut out = format!("*{}*\n\nHello {}, {}\n\n", f.subject, f.greeting_name, f.headline);
    for (label, value) in &f.details {
        out.push_str(&format!("• {label}: {value}\n"));
    }
    if let Some(note) = f.note {
        out.push_str(&format!("\n_{note}_\n"));
    }
    out.push_str(&format!("\n{}", call_to_action(f.term)));
    out
}

/// Render `event` for `recipient` on `channel`, relative to the run's reference date.
pub fn compose(event: &NotificationEvent, recipient: &Recipient, channel: Channel, today: NaiveDate) -> MessageContent {
    let f = facts(event, recipient, today);
    match channel {
        Channel::Email => MessageContent::email(f.subject.clone(), render_html(&f), render_text(&f)),
        Channel::WhatsApp => MessageContent::text(render_whatsapp(&f)),
    }
}
