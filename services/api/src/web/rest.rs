//! services/api/src/web/rest.rs
//!
//! Contains the bounded proxy endpoint and the master definition for the
//! OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use interview_core::ports::{PortError, PortResult, UpstreamForwarder, UpstreamReply};
use interview_core::TimeoutCeiling;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        proxy_to_n8n_handler,
    ),
    components(
        schemas(ScheduleRequestBody, PersonBody, ScheduledResponse, ErrorBody)
    ),
    tags(
        (name = "Interview Scheduler API", description = "Bounded proxy in front of the scheduling webhook.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The JSON error body used by every non-relayed proxy response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// A candidate or interviewer as the scheduling form sends it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PersonBody {
    pub name: String,
    pub email: String,
}

/// The body the scheduling form posts. The proxy forwards whatever JSON it
/// receives; this only documents the expected shape.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScheduleRequestBody {
    pub candidate: PersonBody,
    pub interviewers: Vec<PersonBody>,
    /// RFC 3339 timestamp with offset.
    pub datetime: String,
}

/// The upstream's success reply, relayed as-is.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScheduledResponse {
    #[serde(rename = "eventID")]
    pub event_id: String,
}

//=========================================================================================
// Proxy Handler
//=========================================================================================

/// Forward a booking to the schedule webhook.
///
/// The upstream status and JSON body are relayed unchanged. The call is cut
/// off once the configured ceiling passes.
#[utoipa::path(
    post,
    path = "/api/proxy-to-n8n",
    request_body = ScheduleRequestBody,
    responses(
        (status = 200, description = "Upstream reply relayed with the upstream's own status", body = ScheduledResponse),
        (status = 400, description = "Request body is not JSON", body = ErrorBody),
        (status = 405, description = "Any method other than POST", body = ErrorBody),
        (status = 500, description = "Forwarding failed", body = ErrorBody),
        (status = 504, description = "Upstream did not answer before the ceiling", body = ErrorBody)
    )
)]
pub async fn proxy_to_n8n_handler(
    State(app_state): State<Arc<AppState>>,
    method: Method,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    if serde_json::from_slice::<serde_json::Value>(&body).is_err() {
        return error_response(StatusCode::BAD_REQUEST, "Request body must be JSON.");
    }

    let ceiling = app_state.config.upstream_timeout;
    match forward_with_deadline(app_state.forwarder.as_ref(), body, ceiling).await {
        Ok(UpstreamReply { status, body }) => {
            info!("Relaying schedule webhook reply with status {}", status);
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(body)).into_response()
        }
        Err(PortError::Timeout(message)) => {
            error!("Proxy error: {}", message);
            error_response(
                StatusCode::GATEWAY_TIMEOUT,
                format!("Upstream request timed out after {}.", ceiling.describe()),
            )
        }
        Err(e) => {
            error!("Proxy error: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to forward to n8n webhook.",
            )
        }
    }
}

/// Races the forwarder against the ceiling. On expiry the in-flight call is
/// dropped, which cancels it.
pub async fn forward_with_deadline(
    forwarder: &dyn UpstreamForwarder,
    body: Bytes,
    ceiling: TimeoutCeiling,
) -> PortResult<UpstreamReply> {
    match tokio::time::timeout(ceiling.as_duration(), forwarder.forward(body)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(PortError::Timeout(format!(
            "schedule webhook did not answer within {}",
            ceiling.describe()
        ))),
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody::new(message))).into_response()
}
