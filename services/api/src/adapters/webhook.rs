//! services/api/src/adapters/webhook.rs
//!
//! The webhook gateway client: one `reqwest` client issuing bare, unauthenticated
//! calls to the external automation endpoints. It implements every read and
//! trigger port from the `core` crate plus the raw forwarder used by the proxy.
//!
//! No timeouts are configured on this client. List reads and triggers are
//! unbounded, and the proxy handler owns the deadline for forwarded bookings.

use async_trait::async_trait;
use bytes::Bytes;
use interview_core::domain::events_from_value;
use interview_core::ports::{
    DirectoryService, EventFeedService, PortError, PortResult, ProcessingTrigger,
    UpstreamForwarder, UpstreamReply,
};
use interview_core::{Event, Person};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{Webhook, WebhookUrls};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
    urls: WebhookUrls,
}

impl WebhookClient {
    /// Creates a new `WebhookClient`.
    pub fn new(urls: WebhookUrls) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("interview-scheduler/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, urls })
    }

    /// GETs a webhook and decodes its JSON body. Non-2xx statuses are upstream
    /// errors.
    async fn get_json<T: DeserializeOwned>(&self, hook: Webhook) -> PortResult<T> {
        let url = self.urls.url(hook).clone();
        debug!("GET {} ({})", url, hook.name());
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(hook, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Upstream(format!(
                "{} webhook returned {}",
                hook.name(),
                status
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| PortError::Transport(format!("{} webhook body: {}", hook.name(), e)))
    }
}

/// Maps a `reqwest` failure onto the port taxonomy.
pub(crate) fn transport_error(hook: Webhook, e: reqwest::Error) -> PortError {
    if e.is_timeout() {
        PortError::Timeout(format!("{} webhook: {}", hook.name(), e))
    } else {
        PortError::Transport(format!("{} webhook: {}", hook.name(), e))
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl DirectoryService for WebhookClient {
    async fn get_candidates(&self) -> PortResult<Vec<Person>> {
        self.get_json(Webhook::GetCandidates).await
    }

    async fn get_interviewers(&self) -> PortResult<Vec<Person>> {
        self.get_json(Webhook::GetInterviewers).await
    }
}

#[async_trait]
impl EventFeedService for WebhookClient {
    async fn list_events(&self) -> PortResult<Vec<Event>> {
        let raw: Value = self.get_json(Webhook::GetEvents).await?;
        events_from_value(raw).map_err(|e| {
            PortError::Transport(format!("{} webhook body: {}", Webhook::GetEvents.name(), e))
        })
    }
}

#[async_trait]
impl ProcessingTrigger for WebhookClient {
    async fn trigger_processing(&self, event_id: &str) -> PortResult<()> {
        let hook = Webhook::SimulateAi;
        let response = self
            .client
            .post(self.urls.url(hook).clone())
            .json(&json!({ "eventID": event_id }))
            .send()
            .await
            .map_err(|e| transport_error(hook, e))?;
        // The reply body is ignored; only a failing status is worth a log line.
        if !response.status().is_success() {
            return Err(PortError::Upstream(format!(
                "{} webhook returned {}",
                hook.name(),
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UpstreamForwarder for WebhookClient {
    async fn forward(&self, body: Bytes) -> PortResult<UpstreamReply> {
        let hook = Webhook::ScheduleEvent;
        let response = self
            .client
            .post(self.urls.url(hook).clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error(hook, e))?;

        let status = response.status().as_u16();
        let raw = response
            .bytes()
            .await
            .map_err(|e| transport_error(hook, e))?;
        let body = serde_json::from_slice::<Value>(&raw).map_err(|e| {
            PortError::Transport(format!("{} webhook replied with non-JSON: {}", hook.name(), e))
        })?;

        Ok(UpstreamReply { status, body })
    }
}
