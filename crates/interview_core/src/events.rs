//! crates/interview_core/src/events.rs
//!
//! The events view: the loaded interview records, the per-event UI flags, and
//! the card projection the page renders from.

use std::collections::HashMap;

use chrono::DateTime;
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::domain::{Event, TranscriptLine};
use crate::lifecycle::{LoadLifecycle, LoadPhase};
use crate::ports::{EventFeedService, ProcessingTrigger};

/// Transcript visibility for one event row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disclosure {
    #[default]
    Collapsed,
    Expanded,
}

impl Disclosure {
    fn toggled(self) -> Self {
        match self {
            Disclosure::Collapsed => Disclosure::Expanded,
            Disclosure::Expanded => Disclosure::Collapsed,
        }
    }
}

/// Whether re-processing was requested for an event. Never resets on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingState {
    #[default]
    Idle,
    Requested,
}

/// The lower half of an event card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPanel<'a> {
    Transcript {
        conclusion: Option<&'a str>,
        disclosure: Disclosure,
        /// Present only while expanded.
        lines: Option<&'a [TranscriptLine]>,
    },
    AwaitingRecording {
        event_id: &'a str,
        processing: ProcessingState,
    },
}

/// Everything the page needs to draw one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCard<'a> {
    pub key: String,
    pub heading: &'a str,
    pub time_range: String,
    pub duration: String,
    pub candidate: String,
    pub interviewers: String,
    pub summary: Option<&'a str>,
    pub panel: EventPanel<'a>,
}

pub struct EventsView {
    lifecycle: LoadLifecycle,
    events: Vec<Event>,
    transcripts: HashMap<String, Disclosure>,
    processing: HashMap<String, ProcessingState>,
}

impl Default for EventsView {
    fn default() -> Self {
        Self::new()
    }
}

impl EventsView {
    pub fn new() -> Self {
        Self {
            lifecycle: LoadLifecycle::new(),
            events: Vec::new(),
            transcripts: HashMap::new(),
            processing: HashMap::new(),
        }
    }

    /// Fetches the events once per mount, keeping upstream order.
    pub async fn load(&mut self, feed: &dyn EventFeedService) {
        if !self.lifecycle.begin() {
            return;
        }
        let outcome = feed.list_events().await;
        if let Some(events) = self.lifecycle.finish("events", outcome) {
            info!("Loaded {} interview events", events.len());
            self.events = events;
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.lifecycle.phase()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    fn row(&self, key: &str) -> Option<&Event> {
        self.events
            .iter()
            .enumerate()
            .find(|(index, event)| row_key(event, *index) == key)
            .map(|(_, event)| event)
    }

    pub fn disclosure(&self, key: &str) -> Disclosure {
        self.transcripts.get(key).copied().unwrap_or_default()
    }

    /// Flips transcript visibility for the row. Rows without a transcript
    /// have no toggle and return `None`.
    pub fn toggle_transcript(&mut self, key: &str) -> Option<Disclosure> {
        self.row(key)?.transcript()?;
        let next = self.disclosure(key).toggled();
        self.transcripts.insert(key.to_string(), next);
        Some(next)
    }

    /// The transcript lines currently revealed for the row.
    pub fn visible_transcript(&self, key: &str) -> Option<&[TranscriptLine]> {
        if self.disclosure(key) != Disclosure::Expanded {
            return None;
        }
        self.row(key)?.transcript()
    }

    pub fn processing_state(&self, event_id: &str) -> ProcessingState {
        self.processing.get(event_id).copied().unwrap_or_default()
    }

    /// Marks processing as requested for an event still waiting on its
    /// recording. Returns `false` when there is nothing to trigger.
    pub fn begin_processing(&mut self, event_id: &str) -> bool {
        let waiting = self
            .events
            .iter()
            .any(|e| e.event_id == event_id && e.transcript().is_none());
        if !waiting || self.processing_state(event_id) == ProcessingState::Requested {
            return false;
        }
        self.processing
            .insert(event_id.to_string(), ProcessingState::Requested);
        true
    }

    /// Best-effort re-trigger; the flag stays set whatever the outcome.
    pub async fn request_processing(&mut self, event_id: &str, trigger: &dyn ProcessingTrigger) {
        if !self.begin_processing(event_id) {
            return;
        }
        if let Err(e) = trigger.trigger_processing(event_id).await {
            warn!("Simulation trigger failed for {}: {}", event_id, e);
        }
    }

    /// Projects every event into a card, rendering times in `tz`.
    pub fn cards(&self, tz: &Tz) -> Vec<EventCard<'_>> {
        self.events
            .iter()
            .enumerate()
            .map(|(index, event)| self.card(event, index, tz))
            .collect()
    }

    fn card<'a>(&'a self, event: &'a Event, index: usize, tz: &Tz) -> EventCard<'a> {
        let key = row_key(event, index);
        let panel = match event.transcript() {
            Some(lines) => {
                let disclosure = self.disclosure(&key);
                EventPanel::Transcript {
                    conclusion: event.conclusion.as_deref(),
                    disclosure,
                    lines: (disclosure == Disclosure::Expanded).then_some(lines),
                }
            }
            None => EventPanel::AwaitingRecording {
                event_id: &event.event_id,
                processing: self.processing_state(&event.event_id),
            },
        };
        EventCard {
            heading: &event.description,
            time_range: format!(
                "{} – {}",
                format_timestamp(event.start(), tz),
                format_timestamp(event.end(), tz)
            ),
            duration: format_duration(event.start(), event.end()),
            candidate: event
                .candidate
                .as_ref()
                .map(|c| c.label())
                .unwrap_or_default(),
            interviewers: event
                .interviewers
                .iter()
                .map(|i| i.label())
                .collect::<Vec<_>>()
                .join(", "),
            summary: event.summary.as_deref().filter(|s| !s.is_empty()),
            panel,
            key,
        }
    }
}

/// The row key: the upstream `_id`, or `#<row index>` when it is missing. The
/// prefix keeps index keys apart from numeric ids.
pub fn row_key(event: &Event, index: usize) -> String {
    event
        .id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("#{}", index))
}

/// `YYYY-MM-DD HH:mm` in `tz`, or `unknown` for a missing or unparseable value.
pub fn format_timestamp(iso: Option<&str>, tz: &Tz) -> String {
    iso.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Whole minutes from `start` to `end`, never negative.
pub fn format_duration(start: Option<&str>, end: Option<&str>) -> String {
    let minutes = match (
        start.and_then(|s| DateTime::parse_from_rfc3339(s).ok()),
        end.and_then(|s| DateTime::parse_from_rfc3339(s).ok()),
    ) {
        (Some(start), Some(end)) => (end - start).num_minutes().max(0),
        _ => 0,
    };
    format!("{} minutes", minutes)
}
