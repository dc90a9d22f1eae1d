//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. The external webhooks have no defaults:
//! the service refuses to start without every one of them.

use std::net::{Ipv4Addr, SocketAddr};

use chrono_tz::Tz;
use interview_core::TimeoutCeiling;
use tracing::Level;
use url::Url;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// The external automation endpoints this service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Webhook {
    ScheduleEvent,
    GetCandidates,
    GetInterviewers,
    GetEvents,
    SimulateAi,
}

impl Webhook {
    pub const ALL: [Webhook; 5] = [
        Webhook::ScheduleEvent,
        Webhook::GetCandidates,
        Webhook::GetInterviewers,
        Webhook::GetEvents,
        Webhook::SimulateAi,
    ];

    pub fn env_var(self) -> &'static str {
        match self {
            Webhook::ScheduleEvent => "N8N_SCHEDULE_EVENT_URL",
            Webhook::GetCandidates => "N8N_GET_CANDIDATES_URL",
            Webhook::GetInterviewers => "N8N_GET_INTERVIEWERS_URL",
            Webhook::GetEvents => "N8N_GET_EVENTS_URL",
            Webhook::SimulateAi => "N8N_SIMULATE_AI_URL",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Webhook::ScheduleEvent => "schedule-event",
            Webhook::GetCandidates => "get-candidates",
            Webhook::GetInterviewers => "get-interviewers",
            Webhook::GetEvents => "get-events",
            Webhook::SimulateAi => "simulate-ai-processing",
        }
    }
}

/// One URL per [`Webhook`].
#[derive(Clone, Debug)]
pub struct WebhookUrls {
    pub schedule_event: Url,
    pub get_candidates: Url,
    pub get_interviewers: Url,
    pub get_events: Url,
    pub simulate_ai: Url,
}

impl WebhookUrls {
    pub fn url(&self, hook: Webhook) -> &Url {
        match hook {
            Webhook::ScheduleEvent => &self.schedule_event,
            Webhook::GetCandidates => &self.get_candidates,
            Webhook::GetInterviewers => &self.get_interviewers,
            Webhook::GetEvents => &self.get_events,
            Webhook::SimulateAi => &self.simulate_ai,
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub webhooks: WebhookUrls,
    /// Shared by the proxy endpoint and the scheduling view's proxy client.
    pub upstream_timeout: TimeoutCeiling,
    /// Zone for the datetime picker and for displayed event times.
    pub timezone: Tz,
    /// Where the scheduling view sends bookings.
    pub proxy_endpoint: Url,
    pub allowed_origin: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- External Webhooks (required) ---
        let webhook = |hook: Webhook| -> Result<Url, ConfigError> {
            let var = hook.env_var();
            let raw = lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVar(var.to_string()))?;
            parse_url(var, &raw)
        };
        let webhooks = WebhookUrls {
            schedule_event: webhook(Webhook::ScheduleEvent)?,
            get_candidates: webhook(Webhook::GetCandidates)?,
            get_interviewers: webhook(Webhook::GetInterviewers)?,
            get_events: webhook(Webhook::GetEvents)?,
            simulate_ai: webhook(Webhook::SimulateAi)?,
        };

        // --- Timing and Display ---
        let upstream_timeout = match lookup("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => TimeoutCeiling::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "UPSTREAM_TIMEOUT_SECS".to_string(),
                        format!("'{}' is not a positive number of seconds", raw),
                    ))
                }
            },
            None => TimeoutCeiling::default(),
        };

        let timezone_str = lookup("SCHEDULER_TIMEZONE").unwrap_or_else(|| "UTC".to_string());
        let timezone = timezone_str.parse::<Tz>().map_err(|_| {
            ConfigError::InvalidValue(
                "SCHEDULER_TIMEZONE".to_string(),
                format!("'{}' is not an IANA time zone", timezone_str),
            )
        })?;

        let proxy_endpoint = match lookup("PROXY_ENDPOINT_URL") {
            Some(raw) => parse_url("PROXY_ENDPOINT_URL", &raw)?,
            None => parse_url(
                "PROXY_ENDPOINT_URL",
                &format!("http://{}/api/proxy-to-n8n", local_reach(bind_address)),
            )?,
        };

        let allowed_origin = lookup("ALLOWED_ORIGIN").filter(|v| !v.trim().is_empty());

        Ok(Self {
            bind_address,
            log_level,
            webhooks,
            upstream_timeout,
            timezone,
            proxy_endpoint,
            allowed_origin,
        })
    }
}

/// Where this process can reach itself: the bound address, or loopback on the
/// same port when bound to every interface.
fn local_reach(bind_address: SocketAddr) -> SocketAddr {
    if bind_address.ip().is_unspecified() {
        SocketAddr::new(Ipv4Addr::LOCALHOST.into(), bind_address.port())
    } else {
        bind_address
    }
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidValue(var.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidValue(
            var.to_string(),
            format!("unsupported scheme '{}'", other),
        )),
    }
}
