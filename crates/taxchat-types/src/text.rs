//! Small text helpers shared by the client and its logs.

use chrono::{DateTime, Utc};

/// Cut `text` to `max_chars` characters and append `...` when it was longer.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    }
}

/// Abbreviated identifier for log lines, e.g. `3f2a9c1e-77b0...`
pub fn short_id(id: &str) -> String {
    format!("{}...", id.chars().take(12).collect::<String>())
}

/// Render an RFC 3339 timestamp as `17 Oct 2026`.
///
/// Naive timestamps (no offset, as some backends emit) are read as UTC.
/// Anything unparseable is returned unchanged.
pub fn format_date(value: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return parsed.format("%-d %b %Y").to_string();
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.format("%-d %b %Y").to_string();
    }
    value.to_string()
}

/// Session id made up locally when the backend cannot issue one,
/// shaped `<prefix>_<unix-ms>_<9 chars>`.
pub fn generate_local_session_id(prefix: &str, now: DateTime<Utc>) -> String {
    let suffix: String = uuid::Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("{}_{}_{}", prefix, now.timestamp_millis(), suffix)
}
