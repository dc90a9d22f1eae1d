//! services/api/src/adapters/proxy_client.rs
//!
//! The scheduling view's client for the proxy endpoint. It applies the same
//! timeout ceiling as the proxy itself, so a hung hop cannot hold a booking
//! open past the deadline even if the proxy is bypassed or stalls.

use async_trait::async_trait;
use interview_core::ports::{PortError, PortResult, ScheduleProxy};
use interview_core::{ScheduleRequest, TimeoutCeiling};
use reqwest::Client;
use serde_json::Value;
use url::Url;

pub struct ProxyHttpClient {
    client: Client,
    endpoint: Url,
}

impl ProxyHttpClient {
    pub fn new(endpoint: Url, ceiling: TimeoutCeiling) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(ceiling.as_duration()).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl ScheduleProxy for ProxyHttpClient {
    /// Posts the booking and returns the reply body whatever its status; the
    /// view classifies it.
    async fn submit(&self, request: &ScheduleRequest) -> PortResult<Value> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(map_error)?;
        response.json::<Value>().await.map_err(map_error)
    }
}

fn map_error(e: reqwest::Error) -> PortError {
    if e.is_timeout() {
        PortError::Timeout(e.to_string())
    } else {
        PortError::Transport(e.to_string())
    }
}
