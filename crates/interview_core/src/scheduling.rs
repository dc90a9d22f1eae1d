//! crates/interview_core/src/scheduling.rs
//!
//! The scheduling view: loads the candidate and interviewer lists, holds the
//! form selection, and drives one booking attempt at a time through the proxy.
//!
//! Network calls are split into `begin_*` / `complete_*` pairs so a caller
//! holding the view behind a lock can release it while the call is in flight.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Timelike};
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::{Person, ScheduleRequest, ScheduleResult};
use crate::lifecycle::{LoadLifecycle, LoadPhase, TimeoutCeiling};
use crate::ports::{
    DirectoryService, PortError, PortResult, ProcessingTrigger, ScheduleProxy,
};

//=========================================================================================
// Booking State
//=========================================================================================

/// Whether the post-booking processing simulation has been requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    NotStarted,
    Started,
}

/// Why a booking attempt ended in an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The proxy relayed an `error` message from the upstream.
    Server,
    /// The reply had neither `eventID` nor `error`.
    Unexpected,
    /// The client-side ceiling expired before the proxy answered.
    Timeout,
    /// The proxy could not be reached or its reply was unreadable.
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingState {
    Idle,
    Submitting,
    Success {
        event_id: String,
        simulation: SimulationState,
    },
    Error {
        kind: FailureKind,
        message: String,
    },
}

impl BookingState {
    /// The line shown to the user for a terminal state.
    pub fn display_message(&self) -> Option<String> {
        match self {
            BookingState::Success { event_id, .. } => Some(format!(
                "Interview scheduled successfully. Event ID: {}",
                event_id
            )),
            BookingState::Error {
                kind: FailureKind::Server,
                message,
            } => Some(format!("Error: {}", message)),
            BookingState::Error { message, .. } => Some(message.clone()),
            _ => None,
        }
    }
}

/// Classifies a proxy reply body.
pub fn classify_reply(reply: &Value) -> ScheduleResult {
    if let Some(event_id) = present_text(reply.get("eventID")) {
        ScheduleResult::Success { event_id }
    } else if let Some(message) = present_text(reply.get("error")) {
        ScheduleResult::Failure { message }
    } else {
        ScheduleResult::Failure {
            message: UNEXPECTED_REPLY.to_string(),
        }
    }
}

const UNEXPECTED_REPLY: &str = "Unexpected response from the server.";

/// A field counts as present when it is truthy: `null`, `false`, `""` and a
/// zero number are absent.
fn present_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

//=========================================================================================
// Selection
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub candidate_email: Option<String>,
    pub interviewer_emails: Vec<String>,
    pub datetime: Option<DateTime<FixedOffset>>,
}

impl Selection {
    pub fn is_complete(&self) -> bool {
        self.candidate_email.is_some()
            && !self.interviewer_emails.is_empty()
            && self.datetime.is_some()
    }
}

/// The default slot: the next full hour, or `now` itself when it already sits
/// on the hour.
pub fn next_full_hour<Tz: TimeZone>(now: DateTime<Tz>) -> DateTime<FixedOffset> {
    let now = now.fixed_offset();
    let on_the_hour = now
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);
    if now.minute() == 0 {
        on_the_hour
    } else {
        on_the_hour + Duration::hours(1)
    }
}

//=========================================================================================
// The View
//=========================================================================================

pub struct SchedulingView {
    lifecycle: LoadLifecycle,
    candidates: Vec<Person>,
    interviewers: Vec<Person>,
    selection: Selection,
    booking: BookingState,
    rejection: Option<String>,
    ceiling: TimeoutCeiling,
}

impl SchedulingView {
    /// Creates a fresh mount with the datetime pre-filled.
    pub fn new(ceiling: TimeoutCeiling, default_datetime: DateTime<FixedOffset>) -> Self {
        Self {
            lifecycle: LoadLifecycle::new(),
            candidates: Vec::new(),
            interviewers: Vec::new(),
            selection: Selection {
                datetime: Some(default_datetime),
                ..Selection::default()
            },
            booking: BookingState::Idle,
            rejection: None,
            ceiling,
        }
    }

    /// Fetches both reference lists concurrently, once per mount. If either
    /// fails both lists stay empty.
    pub async fn load(&mut self, directory: &dyn DirectoryService) {
        if !self.lifecycle.begin() {
            return;
        }
        let (candidates, interviewers) =
            futures::join!(directory.get_candidates(), directory.get_interviewers());
        let outcome = candidates.and_then(|c| interviewers.map(|i| (c, i)));
        if let Some((candidates, interviewers)) = self.lifecycle.finish("scheduling", outcome) {
            info!(
                "Loaded {} candidates and {} interviewers",
                candidates.len(),
                interviewers.len()
            );
            self.candidates = candidates;
            self.interviewers = interviewers;
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.lifecycle.phase()
    }

    pub fn candidates(&self) -> &[Person] {
        &self.candidates
    }

    pub fn interviewers(&self) -> &[Person] {
        &self.interviewers
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn booking(&self) -> &BookingState {
        &self.booking
    }

    /// The reason the last submit was refused before reaching the proxy.
    pub fn rejection(&self) -> Option<&str> {
        self.rejection.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.booking == BookingState::Submitting
    }

    pub fn select_candidate(&mut self, email: Option<String>) {
        self.selection.candidate_email = email.filter(|e| !e.is_empty());
    }

    pub fn set_interviewers(&mut self, emails: Vec<String>) {
        self.selection.interviewer_emails = emails.into_iter().filter(|e| !e.is_empty()).collect();
    }

    pub fn set_datetime(&mut self, datetime: Option<DateTime<FixedOffset>>) {
        self.selection.datetime = datetime;
    }

    /// Submit is enabled only with a complete selection and nothing in flight.
    pub fn can_submit(&self) -> bool {
        !self.is_submitting() && self.selection.is_complete()
    }

    /// Moves to `Submitting` and builds the request from the loaded lists.
    pub fn begin_submit(&mut self) -> PortResult<ScheduleRequest> {
        match self.build_request() {
            Ok(request) => {
                self.rejection = None;
                self.booking = BookingState::Submitting;
                Ok(request)
            }
            Err(e) => {
                self.rejection = Some(rejection_text(&e));
                Err(e)
            }
        }
    }

    fn build_request(&self) -> PortResult<ScheduleRequest> {
        if self.is_submitting() {
            return Err(PortError::Validation(
                "A scheduling request is already in progress.".to_string(),
            ));
        }
        let (Some(email), Some(datetime)) =
            (&self.selection.candidate_email, self.selection.datetime)
        else {
            return Err(incomplete_selection());
        };
        let candidate = self
            .candidates
            .iter()
            .find(|c| &c.email == email)
            .cloned()
            .ok_or_else(incomplete_selection)?;
        let interviewers: Vec<Person> = self
            .interviewers
            .iter()
            .filter(|i| self.selection.interviewer_emails.contains(&i.email))
            .cloned()
            .collect();
        if interviewers.is_empty() {
            return Err(incomplete_selection());
        }
        Ok(ScheduleRequest {
            candidate,
            interviewers,
            datetime,
        })
    }

    /// Applies the proxy outcome. Ignored unless a submit is in flight.
    pub fn complete_submit(&mut self, outcome: PortResult<Value>) -> &BookingState {
        if !self.is_submitting() {
            return &self.booking;
        }
        self.booking = match outcome {
            Ok(reply) => match classify_reply(&reply) {
                ScheduleResult::Success { event_id } => BookingState::Success {
                    event_id,
                    simulation: SimulationState::NotStarted,
                },
                ScheduleResult::Failure { message } => {
                    let kind = if present_text(reply.get("error")).is_some() {
                        FailureKind::Server
                    } else {
                        FailureKind::Unexpected
                    };
                    BookingState::Error { kind, message }
                }
            },
            Err(e) => {
                warn!("Scheduling request failed: {}", e);
                if e.is_timeout() {
                    BookingState::Error {
                        kind: FailureKind::Timeout,
                        message: format!(
                            "Request timed out after {}.",
                            self.ceiling.describe()
                        ),
                    }
                } else {
                    BookingState::Error {
                        kind: FailureKind::Unreachable,
                        message: "Unable to connect to the scheduling service.".to_string(),
                    }
                }
            }
        };
        &self.booking
    }

    /// One full booking attempt against the proxy.
    pub async fn submit(&mut self, proxy: &dyn ScheduleProxy) -> &BookingState {
        let request = match self.begin_submit() {
            Ok(request) => request,
            Err(_) => return &self.booking,
        };
        let outcome = proxy.submit(&request).await;
        self.complete_submit(outcome)
    }

    /// Flips the simulation flag and returns the event to trigger. `None` when
    /// there is no successful booking or the simulation was already started.
    pub fn begin_simulation(&mut self) -> Option<String> {
        match &mut self.booking {
            BookingState::Success {
                event_id,
                simulation,
            } if *simulation == SimulationState::NotStarted => {
                *simulation = SimulationState::Started;
                Some(event_id.clone())
            }
            _ => None,
        }
    }

    /// Fire-and-forget processing trigger for the booked event.
    pub async fn simulate(&mut self, trigger: &dyn ProcessingTrigger) {
        if let Some(event_id) = self.begin_simulation() {
            if let Err(e) = trigger.trigger_processing(&event_id).await {
                warn!("Simulation request failed (ignored): {}", e);
            }
        }
    }
}

fn incomplete_selection() -> PortError {
    PortError::Validation(
        "Select a candidate, at least one interviewer, and a date and time.".to_string(),
    )
}

fn rejection_text(e: &PortError) -> String {
    match e {
        PortError::Validation(message) => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct FakeDirectory {
        fail_interviewers: bool,
    }

    #[async_trait]
    impl DirectoryService for FakeDirectory {
        async fn get_candidates(&self) -> PortResult<Vec<Person>> {
            Ok(vec![
                Person::new("Test User", "test@example.com"),
                Person::new("Charlie Adams", "charlie@example.com"),
            ])
        }

        async fn get_interviewers(&self) -> PortResult<Vec<Person>> {
            if self.fail_interviewers {
                return Err(PortError::Transport("connection refused".into()));
            }
            Ok(vec![
                Person::new("Jane Doe", "jane@example.com"),
                Person::new("Mark Smith", "mark@example.com"),
            ])
        }
    }

    struct ScriptedProxy {
        reply: PortResult<Value>,
        seen: Mutex<Vec<ScheduleRequest>>,
    }

    impl ScriptedProxy {
        fn new(reply: PortResult<Value>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ScheduleProxy for ScriptedProxy {
        async fn submit(&self, request: &ScheduleRequest) -> PortResult<Value> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone()
        }
    }

    struct RecordingTrigger {
        fail: bool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProcessingTrigger for RecordingTrigger {
        async fn trigger_processing(&self, event_id: &str) -> PortResult<()> {
            self.calls.lock().unwrap().push(event_id.to_string());
            if self.fail {
                Err(PortError::Transport("down".into()))
            } else {
                Ok(())
            }
        }
    }

    fn slot() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2025-05-06T22:00:00+03:00").unwrap()
    }

    async fn loaded_view() -> SchedulingView {
        let mut view = SchedulingView::new(TimeoutCeiling::default(), slot());
        view.load(&FakeDirectory {
            fail_interviewers: false,
        })
        .await;
        view
    }

    fn fill(view: &mut SchedulingView) {
        view.select_candidate(Some("charlie@example.com".into()));
        view.set_interviewers(vec!["mark@example.com".into(), "jane@example.com".into()]);
    }

    #[tokio::test]
    async fn load_keeps_upstream_order() {
        let view = loaded_view().await;
        assert_eq!(view.phase(), LoadPhase::Loaded);
        assert_eq!(view.candidates()[0].email, "test@example.com");
        assert_eq!(view.interviewers()[1].name, "Mark Smith");
    }

    #[tokio::test]
    async fn either_list_failing_leaves_both_empty() {
        let mut view = SchedulingView::new(TimeoutCeiling::default(), slot());
        view.load(&FakeDirectory {
            fail_interviewers: true,
        })
        .await;
        assert_eq!(view.phase(), LoadPhase::LoadError);
        assert!(view.candidates().is_empty());
        assert!(view.interviewers().is_empty());
    }

    #[tokio::test]
    async fn submit_enables_only_with_all_three_selections() {
        let mut view = loaded_view().await;
        view.set_datetime(None);
        assert!(!view.can_submit());
        view.select_candidate(Some("charlie@example.com".into()));
        assert!(!view.can_submit());
        view.set_interviewers(vec!["jane@example.com".into()]);
        assert!(!view.can_submit());
        view.set_datetime(Some(slot()));
        assert!(view.can_submit());
        view.set_interviewers(Vec::new());
        assert!(!view.can_submit());
    }

    #[tokio::test]
    async fn success_reply_resolves_people_from_loaded_lists() {
        let mut view = loaded_view().await;
        fill(&mut view);
        let proxy = ScriptedProxy::new(Ok(json!({ "eventID": "evt-42" })));

        let state = view.submit(&proxy).await.clone();
        assert_eq!(
            state,
            BookingState::Success {
                event_id: "evt-42".into(),
                simulation: SimulationState::NotStarted,
            }
        );
        assert_eq!(
            state.display_message().unwrap(),
            "Interview scheduled successfully. Event ID: evt-42"
        );

        let seen = proxy.seen.lock().unwrap();
        assert_eq!(seen[0].candidate, Person::new("Charlie Adams", "charlie@example.com"));
        // list order, not click order
        assert_eq!(seen[0].interviewers[0].email, "jane@example.com");
        assert_eq!(seen[0].datetime, slot());
    }

    #[tokio::test]
    async fn error_reply_is_shown_verbatim() {
        let mut view = loaded_view().await;
        fill(&mut view);
        let proxy = ScriptedProxy::new(Ok(json!({ "error": "Calendar is full" })));
        match view.submit(&proxy).await {
            BookingState::Error { kind, message } => {
                assert_eq!(*kind, FailureKind::Server);
                assert_eq!(message, "Calendar is full");
            }
            other => panic!("expected error, got {:?}", other),
        }
        assert_eq!(
            view.booking().display_message().unwrap(),
            "Error: Calendar is full"
        );
    }

    #[tokio::test]
    async fn reply_without_known_keys_is_unexpected() {
        let mut view = loaded_view().await;
        fill(&mut view);
        let proxy = ScriptedProxy::new(Ok(json!({ "status": "queued" })));
        let state = view.submit(&proxy).await;
        assert!(matches!(
            state,
            BookingState::Error {
                kind: FailureKind::Unexpected,
                ..
            }
        ));
        assert_eq!(
            state.display_message().unwrap(),
            "Unexpected response from the server."
        );
    }

    #[test]
    fn falsy_fields_count_as_absent() {
        assert_eq!(
            classify_reply(&json!({ "eventID": 0, "error": "Calendar is full" })),
            ScheduleResult::Failure {
                message: "Calendar is full".into()
            }
        );
        assert_eq!(
            classify_reply(&json!({ "eventID": "", "error": false })),
            ScheduleResult::Failure {
                message: UNEXPECTED_REPLY.into()
            }
        );
        assert_eq!(
            classify_reply(&json!({ "eventID": 17 })),
            ScheduleResult::Success {
                event_id: "17".into()
            }
        );
    }

    #[tokio::test]
    async fn timeout_is_distinguishable_from_unreachable() {
        let mut view = loaded_view().await;
        fill(&mut view);
        let timed_out = ScriptedProxy::new(Err(PortError::Timeout("ceiling".into())));
        assert_eq!(
            view.submit(&timed_out).await.display_message().unwrap(),
            "Request timed out after 3 minutes."
        );

        let refused = ScriptedProxy::new(Err(PortError::Transport("refused".into())));
        let state = view.submit(&refused).await;
        assert!(matches!(
            state,
            BookingState::Error {
                kind: FailureKind::Unreachable,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn second_submit_is_refused_while_in_flight() {
        let mut view = loaded_view().await;
        fill(&mut view);
        view.begin_submit().unwrap();
        assert!(!view.can_submit());
        let err = view.begin_submit().unwrap_err();
        assert!(matches!(err, PortError::Validation(_)));
        assert_eq!(view.booking(), &BookingState::Submitting);
        assert!(view.rejection().is_some());

        view.complete_submit(Ok(json!({ "eventID": "evt-1" })));
        assert!(view.can_submit());
    }

    #[tokio::test]
    async fn incomplete_selection_never_reaches_the_proxy() {
        let mut view = loaded_view().await;
        view.select_candidate(Some("nobody@example.com".into()));
        view.set_interviewers(vec!["jane@example.com".into()]);
        let proxy = ScriptedProxy::new(Ok(json!({ "eventID": "evt-1" })));
        assert_eq!(view.submit(&proxy).await, &BookingState::Idle);
        assert!(proxy.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn simulation_flag_flips_even_when_trigger_fails() {
        let mut view = loaded_view().await;
        fill(&mut view);
        view.submit(&ScriptedProxy::new(Ok(json!({ "eventID": "evt-7" }))))
            .await;

        let trigger = RecordingTrigger {
            fail: true,
            calls: Mutex::new(Vec::new()),
        };
        view.simulate(&trigger).await;
        view.simulate(&trigger).await;

        assert_eq!(*trigger.calls.lock().unwrap(), vec!["evt-7".to_string()]);
        assert!(matches!(
            view.booking(),
            BookingState::Success {
                simulation: SimulationState::Started,
                ..
            }
        ));
    }

    #[test]
    fn default_slot_rounds_up_to_the_next_hour() {
        let now = DateTime::parse_from_rfc3339("2025-05-06T21:17:42+03:00").unwrap();
        assert_eq!(next_full_hour(now), slot());

        let on_the_hour = DateTime::parse_from_rfc3339("2025-05-06T22:00:10+03:00").unwrap();
        assert_eq!(next_full_hour(on_the_hour), slot());
    }
}
