//! crates/interview_core/src/domain.rs
//!
//! Defines the view models exchanged with the external automation webhooks.
//! None of these are persisted; every value is a transient projection of
//! upstream state, so deserialization is lenient wherever the upstream may
//! omit a field.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// Reads an explicit `null` as the field's default, the same as an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A candidate or an interviewer. The email is the unique key within a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
}

impl Person {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// `Name (email)` as shown in pickers and event cards.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.email)
    }
}

/// The booking payload handed to the proxy endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub candidate: Person,
    pub interviewers: Vec<Person>,
    /// Serialized as RFC 3339 with the original offset.
    pub datetime: DateTime<FixedOffset>,
}

/// The classified outcome of one booking attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleResult {
    Success { event_id: String },
    Failure { message: String },
}

/// A `{dateTime, timeZone}` pair as the calendar upstream reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTime {
    #[serde(rename = "dateTime", default, deserialize_with = "null_as_default")]
    pub date_time: String,
    #[serde(rename = "timeZone", default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// One line of a processed interview recording.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLine {
    #[serde(default, deserialize_with = "null_as_default")]
    pub speaker: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

/// An interview record combining scheduling metadata with optional
/// AI-derived summary and transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "eventID", default, deserialize_with = "null_as_default")]
    pub event_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,
    #[serde(rename = "startDateTime", default)]
    pub start_date_time: Option<EventTime>,
    #[serde(rename = "endDateTime", default)]
    pub end_date_time: Option<EventTime>,
    #[serde(default)]
    pub candidate: Option<Person>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub interviewers: Vec<Person>,
    /// Absent until the recording has been processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<Vec<TranscriptLine>>,
}

impl Event {
    /// The transcript, if one exists and has at least one line.
    pub fn transcript(&self) -> Option<&[TranscriptLine]> {
        self.transcription
            .as_deref()
            .filter(|lines| !lines.is_empty())
    }

    pub fn start(&self) -> Option<&str> {
        self.start_date_time.as_ref().map(|t| t.date_time.as_str())
    }

    pub fn end(&self) -> Option<&str> {
        self.end_date_time.as_ref().map(|t| t.date_time.as_str())
    }
}

/// Normalizes the events webhook payload, which is either a list of events or
/// a single bare event object.
pub fn events_from_value(value: serde_json::Value) -> Result<Vec<Event>, serde_json::Error> {
    match value {
        serde_json::Value::Array(_) => serde_json::from_value(value),
        other => Ok(vec![serde_json::from_value(other)?]),
    }
}
