//! crates/interview_core/src/ports.rs
//!
//! Defines the service contracts (traits) the views and the proxy depend on.
//! Every implementation in production is an HTTP webhook call, but the core
//! only sees these traits, so tests can swap in scripted fakes.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::domain::{Event, Person, ScheduleRequest};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy shared by every outbound call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// The call did not finish before the configured ceiling.
    #[error("Request timed out: {0}")]
    Timeout(String),
    /// The upstream was reachable but reported an application-level failure.
    #[error("Upstream error: {0}")]
    Upstream(String),
    /// The upstream was unreachable or answered with something unreadable.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The request was rejected before any outbound call was made.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl PortError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PortError::Timeout(_))
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// A relayed upstream reply: its status code and its JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Value,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Reference lists for the scheduling form.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    async fn get_candidates(&self) -> PortResult<Vec<Person>>;
    async fn get_interviewers(&self) -> PortResult<Vec<Person>>;
}

/// Read-only feed of interview events.
#[async_trait]
pub trait EventFeedService: Send + Sync {
    async fn list_events(&self) -> PortResult<Vec<Event>>;
}

/// One-way command asking the automation system to (re)process an event.
///
/// Best effort: there is no delivery guarantee and callers must not depend on
/// the outcome. Implementations return errors only so they can be logged.
#[async_trait]
pub trait ProcessingTrigger: Send + Sync {
    async fn trigger_processing(&self, event_id: &str) -> PortResult<()>;
}

/// Forwards a raw JSON body to the schedule webhook. No timeout is applied
/// here; the proxy handler owns the deadline.
#[async_trait]
pub trait UpstreamForwarder: Send + Sync {
    async fn forward(&self, body: Bytes) -> PortResult<UpstreamReply>;
}

/// The scheduling view's side of the proxy hop. Implementations enforce the
/// client-side mirror of the timeout ceiling and report it as
/// [`PortError::Timeout`].
#[async_trait]
pub trait ScheduleProxy: Send + Sync {
    async fn submit(&self, request: &ScheduleRequest) -> PortResult<Value>;
}
