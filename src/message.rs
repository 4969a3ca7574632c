//! Message and inbox data model
//!
//! The two backends return differently-shaped JSON for the same
//! logical message, so every field is deserialized leniently: missing
//! fields fall back to defaults, timestamps accept several formats,
//! and relay UIDs may arrive as numbers or strings. A message that
//! fails to parse entirely is skipped by the fetcher rather than
//! failing the whole list.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single email as reported by a list or body fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub subject: Option<String>,

    #[serde(default)]
    pub from_name: String,

    #[serde(default)]
    pub from_email: String,

    /// Delivery timestamp, if the backend reported a parseable one.
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<DateTime<Utc>>,

    /// Full body. Absent in relay list responses until fetched
    /// separately by UID.
    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub read: bool,

    /// Relay message identifier used for the lazy body fetch. Managed
    /// messages have none.
    #[serde(default, deserialize_with = "lenient_uid")]
    pub uid: Option<String>,
}

impl Message {
    /// Whether the message counts toward the unread badge.
    #[must_use]
    pub const fn is_unread(&self) -> bool {
        !self.read
    }

    /// Subject with the display fallback for missing or blank values.
    #[must_use]
    pub fn display_subject(&self) -> &str {
        self.subject
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("No Subject")
    }
}

/// One fetched page of a mailbox.
#[derive(Debug, Clone, Serialize)]
pub struct Inbox {
    pub messages: Vec<Message>,
    /// Count of messages whose `read` flag is false or absent.
    pub unread: usize,
}

impl Inbox {
    #[must_use]
    pub fn from_messages(messages: Vec<Message>) -> Self {
        let unread = messages.iter().filter(|m| m.is_unread()).count();
        Self { messages, unread }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Accept unix seconds (number or string), RFC 3339, or the
/// backend's `YYYY-MM-DD HH:MM:SS` shape. Anything else becomes
/// `None` instead of failing the message.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_date_value))
}

fn parse_date_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        Value::String(s) => parse_date_str(s),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(secs) = s.parse::<i64>() {
        return Utc.timestamp_opt(secs, 0).single();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn lenient_uid<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}
