//! Shared harness: a scripted stand-in for the n8n webhooks and a running app
//! wired to it, both on ephemeral local ports.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use interview_core::TimeoutCeiling;
use scheduler_api_lib::config::Config;
use scheduler_api_lib::web::{router, state::AppState};
use serde_json::{json, Value};

/// How the fake schedule webhook answers.
#[derive(Clone)]
pub enum ScheduleMode {
    Reply(u16, Value),
    Slow(Duration),
    NotJson,
}

pub struct FakeN8n {
    pub schedule_mode: Mutex<ScheduleMode>,
    pub events: Mutex<Value>,
    pub fail_interviewers: Mutex<bool>,
    pub schedule_calls: AtomicUsize,
    pub schedule_bodies: Mutex<Vec<Value>>,
    pub simulated: Mutex<Vec<String>>,
}

impl Default for FakeN8n {
    fn default() -> Self {
        Self {
            schedule_mode: Mutex::new(ScheduleMode::Reply(200, json!({ "eventID": "evt-1" }))),
            events: Mutex::new(sample_events()),
            fail_interviewers: Mutex::new(false),
            schedule_calls: AtomicUsize::new(0),
            schedule_bodies: Mutex::new(Vec::new()),
            simulated: Mutex::new(Vec::new()),
        }
    }
}

impl FakeN8n {
    pub fn set_schedule_mode(&self, mode: ScheduleMode) {
        *self.schedule_mode.lock().unwrap() = mode;
    }

    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }

    pub fn simulated(&self) -> Vec<String> {
        self.simulated.lock().unwrap().clone()
    }
}

pub fn sample_events() -> Value {
    json!([
        {
            "_id": "mock123",
            "eventID": "mock-event-id",
            "description": "Interview with Charlie Adams",
            "summary": "Charlie is a great candidate with React experience.",
            "conclusion": "Highly recommended for next round.",
            "startDateTime": { "dateTime": "2025-05-06T22:00:00+03:00", "timeZone": "America/Chicago" },
            "endDateTime": { "dateTime": "2025-05-06T22:30:00+03:00", "timeZone": "America/Chicago" },
            "candidate": { "name": "Charlie Adams", "email": "charlie@example.com" },
            "interviewers": [
                { "name": "Jane Doe", "email": "jane@example.com" },
                { "name": "Mark Smith", "email": "mark@example.com" }
            ],
            "transcription": [
                { "speaker": "Jane Doe", "timestamp": "00:05", "message": "Hello Charlie, can you introduce yourself?" },
                { "speaker": "Charlie Adams", "timestamp": "00:10", "message": "Sure, I am a React developer with 5 years of experience." }
            ]
        },
        {
            "_id": "pending456",
            "eventID": "pending-event-id",
            "description": "Interview with Dana Lee",
            "startDateTime": { "dateTime": "2025-05-07T10:00:00Z", "timeZone": "UTC" },
            "endDateTime": { "dateTime": "2025-05-07T11:00:00Z", "timeZone": "UTC" },
            "candidate": { "name": "Dana Lee", "email": "dana@example.com" },
            "interviewers": [ { "name": "Jane Doe", "email": "jane@example.com" } ]
        }
    ])
}

async fn candidates() -> Json<Value> {
    Json(json!([
        { "name": "Test User", "email": "test@example.com" },
        { "name": "Charlie Adams", "email": "charlie@example.com" }
    ]))
}

async fn interviewers(State(fake): State<Arc<FakeN8n>>) -> Response {
    if *fake.fail_interviewers.lock().unwrap() {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    Json(json!([
        { "name": "Jane Doe", "email": "jane@example.com" },
        { "name": "Mark Smith", "email": "mark@example.com" }
    ]))
    .into_response()
}

async fn events(State(fake): State<Arc<FakeN8n>>) -> Json<Value> {
    Json(fake.events.lock().unwrap().clone())
}

async fn schedule(State(fake): State<Arc<FakeN8n>>, Json(body): Json<Value>) -> Response {
    fake.schedule_calls.fetch_add(1, Ordering::SeqCst);
    fake.schedule_bodies.lock().unwrap().push(body);
    let mode = fake.schedule_mode.lock().unwrap().clone();
    match mode {
        ScheduleMode::Reply(status, body) => (
            StatusCode::from_u16(status).unwrap(),
            Json(body),
        )
            .into_response(),
        ScheduleMode::Slow(delay) => {
            tokio::time::sleep(delay).await;
            Json(json!({ "eventID": "too-late" })).into_response()
        }
        ScheduleMode::NotJson => (StatusCode::OK, "<html>not json</html>").into_response(),
    }
}

async fn simulate(State(fake): State<Arc<FakeN8n>>, Json(body): Json<Value>) -> Json<Value> {
    if let Some(id) = body.get("eventID").and_then(|v| v.as_str()) {
        fake.simulated.lock().unwrap().push(id.to_string());
    }
    Json(json!({ "ok": true }))
}

/// Starts the fake webhooks and returns their address.
pub async fn spawn_fake(fake: Arc<FakeN8n>) -> SocketAddr {
    let app = Router::new()
        .route("/candidates", get(candidates))
        .route("/interviewers", get(interviewers))
        .route("/events", get(events))
        .route("/schedule", post(schedule))
        .route("/simulate", post(simulate))
        .with_state(fake);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A port nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Starts the app against webhooks at `n8n` and returns its base URL.
pub async fn spawn_app(n8n: SocketAddr, ceiling: TimeoutCeiling) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut env: HashMap<&str, String> = HashMap::new();
    env.insert("BIND_ADDRESS", addr.to_string());
    env.insert("N8N_SCHEDULE_EVENT_URL", format!("http://{}/schedule", n8n));
    env.insert("N8N_GET_CANDIDATES_URL", format!("http://{}/candidates", n8n));
    env.insert("N8N_GET_INTERVIEWERS_URL", format!("http://{}/interviewers", n8n));
    env.insert("N8N_GET_EVENTS_URL", format!("http://{}/events", n8n));
    env.insert("N8N_SIMULATE_AI_URL", format!("http://{}/simulate", n8n));
    env.insert("PROXY_ENDPOINT_URL", format!("http://{}/api/proxy-to-n8n", addr));
    let mut config = Config::from_lookup(|key| env.get(key).cloned()).unwrap();
    config.upstream_timeout = ceiling;

    let state = Arc::new(AppState::from_config(Arc::new(config)).unwrap());
    let app = router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Fake webhooks plus an app in front of them.
pub async fn start(ceiling: TimeoutCeiling) -> (Arc<FakeN8n>, String) {
    let fake = Arc::new(FakeN8n::default());
    let n8n = spawn_fake(fake.clone()).await;
    let base = spawn_app(n8n, ceiling).await;
    (fake, base)
}
