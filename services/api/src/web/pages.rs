//! services/api/src/web/pages.rs
//!
//! Handlers for the two server-rendered views. A `GET` on the bare path
//! mounts a new view; interactions are form posts against the mounted view id
//! followed by a redirect back to it.

use crate::web::{render, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use interview_core::scheduling::next_full_hour;
use interview_core::{EventsView, SchedulingView};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

//=========================================================================================
// Form Parsing
//=========================================================================================

/// The scheduling form as posted by the browser.
#[derive(Debug, Default, PartialEq)]
pub struct ScheduleForm {
    pub candidate: Option<String>,
    pub interviewers: Vec<String>,
    pub datetime: Option<String>,
}

impl ScheduleForm {
    /// Parses an urlencoded body. `interviewers` may repeat.
    pub fn parse(body: &[u8]) -> Self {
        let mut form = Self::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            let value = value.into_owned();
            match &*key {
                "candidate" => form.candidate = Some(value),
                "interviewers" => form.interviewers.push(value),
                "datetime" => form.datetime = Some(value),
                _ => {}
            }
        }
        form
    }
}

/// The first value of `field` in an urlencoded body.
fn form_field(body: &[u8], field: &str) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == field)
        .map(|(_, value)| value.into_owned())
}

/// Reads a `datetime-local` value as wall-clock time in `tz`. During a DST
/// fold the earlier instant wins; a time inside a DST gap is rejected.
pub fn parse_local_datetime(raw: &str, tz: &Tz) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    let naive = NaiveDateTime::parse_from_str(raw, render::PICKER_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|t| t.fixed_offset())
}

fn parse_view_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

fn expired(remount: &str) -> Response {
    (StatusCode::NOT_FOUND, Html(render::expired_page(remount))).into_response()
}

//=========================================================================================
// Scheduling View Handlers
//=========================================================================================

/// GET / - mount a new scheduling view and load its reference lists.
pub async fn mount_schedule_handler(State(state): State<Arc<AppState>>) -> Redirect {
    let tz = state.config.timezone;
    let mut view = SchedulingView::new(
        state.config.upstream_timeout,
        next_full_hour(Utc::now().with_timezone(&tz)),
    );
    view.load(state.directory.as_ref()).await;
    let id = state.scheduling_views.insert(view).await;
    info!("Mounted scheduling view {}", id);
    Redirect::to(&format!("/schedule/{}", id))
}

/// GET /schedule/{view} - render the current scheduling state.
pub async fn show_schedule_handler(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<String>,
) -> Response {
    let Some(id) = parse_view_id(&view_id) else {
        return expired("/");
    };
    let Some(view) = state.scheduling_views.get(&id).await else {
        return expired("/");
    };
    let view = view.lock().await;
    Html(render::schedule_page(id, &view, &state.config.timezone)).into_response()
}

/// POST /schedule/{view} - submit the booking form.
///
/// The proxy call runs in its own task so the attempt always reaches a
/// terminal state, even when the browser drops this request. The redirect is
/// immediate and the page shows the in-flight state until the task finishes.
pub async fn submit_schedule_handler(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<String>,
    body: String,
) -> Response {
    let Some(id) = parse_view_id(&view_id) else {
        return expired("/");
    };
    let Some(view) = state.scheduling_views.get(&id).await else {
        return expired("/");
    };

    let form = ScheduleForm::parse(body.as_bytes());
    let tz = state.config.timezone;

    // 1. Apply the selection and claim the submit slot.
    let request = {
        let mut view = view.lock().await;
        view.select_candidate(form.candidate);
        view.set_interviewers(form.interviewers);
        view.set_datetime(
            form.datetime
                .as_deref()
                .and_then(|raw| parse_local_datetime(raw, &tz)),
        );
        view.begin_submit()
    };

    // 2. Hand the proxy call to a detached task that owns the view.
    match request {
        Ok(request) => {
            info!("Submitting booking for view {}", id);
            let proxy = state.schedule_proxy.clone();
            tokio::spawn(async move {
                let outcome = proxy.submit(&request).await;
                let mut view = view.lock().await;
                view.complete_submit(outcome);
                info!("Booking on view {} finished: {:?}", id, view.booking());
            });
        }
        Err(e) => warn!("Booking on view {} refused: {}", id, e),
    }

    Redirect::to(&format!("/schedule/{}", id)).into_response()
}

/// POST /schedule/{view}/simulate - best-effort processing trigger for the booked event.
pub async fn simulate_schedule_handler(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<String>,
) -> Response {
    let Some(id) = parse_view_id(&view_id) else {
        return expired("/");
    };
    let Some(view) = state.scheduling_views.get(&id).await else {
        return expired("/");
    };

    let event_id = view.lock().await.begin_simulation();
    if let Some(event_id) = event_id {
        if let Err(e) = state.processing.trigger_processing(&event_id).await {
            warn!("Simulation request failed (ignored): {}", e);
        }
    }

    Redirect::to(&format!("/schedule/{}", id)).into_response()
}

//=========================================================================================
// Events View Handlers
//=========================================================================================

/// GET /events - mount a new events view and load the feed.
pub async fn mount_events_handler(State(state): State<Arc<AppState>>) -> Redirect {
    let mut view = EventsView::new();
    view.load(state.event_feed.as_ref()).await;
    let id = state.events_views.insert(view).await;
    info!("Mounted events view {}", id);
    Redirect::to(&format!("/events/{}", id))
}

/// GET /events/{view} - render the loaded events.
pub async fn show_events_handler(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<String>,
) -> Response {
    let Some(id) = parse_view_id(&view_id) else {
        return expired("/events");
    };
    let Some(view) = state.events_views.get(&id).await else {
        return expired("/events");
    };
    let view = view.lock().await;
    Html(render::events_page(id, &view, &state.config.timezone)).into_response()
}

/// POST /events/{view}/transcripts - toggle one event's transcript.
pub async fn toggle_transcript_handler(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<String>,
    body: String,
) -> Response {
    let Some(id) = parse_view_id(&view_id) else {
        return expired("/events");
    };
    let Some(view) = state.events_views.get(&id).await else {
        return expired("/events");
    };

    let Some(key) = form_field(body.as_bytes(), "key") else {
        return (StatusCode::BAD_REQUEST, "Missing transcript key").into_response();
    };
    view.lock().await.toggle_transcript(&key);

    Redirect::to(&format!("/events/{}", id)).into_response()
}

/// POST /events/{view}/processing - re-trigger AI processing for one event.
pub async fn request_processing_handler(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<String>,
    body: String,
) -> Response {
    let Some(id) = parse_view_id(&view_id) else {
        return expired("/events");
    };
    let Some(view) = state.events_views.get(&id).await else {
        return expired("/events");
    };

    let Some(event_id) = form_field(body.as_bytes(), "event_id") else {
        return (StatusCode::BAD_REQUEST, "Missing event id").into_response();
    };

    let should_trigger = view.lock().await.begin_processing(&event_id);
    if should_trigger {
        if let Err(e) = state.processing.trigger_processing(&event_id).await {
            warn!("Simulation trigger failed for {}: {}", event_id, e);
        }
    }

    Redirect::to(&format!("/events/{}", id)).into_response()
}
