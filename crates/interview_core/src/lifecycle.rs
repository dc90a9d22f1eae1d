//! crates/interview_core/src/lifecycle.rs
//!
//! The load lifecycle shared by both views, and the timeout ceiling shared by
//! the proxy and the scheduling view.

use std::time::Duration;

use tracing::warn;

use crate::ports::PortResult;

/// Where a view mount is in its one-shot data load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Loading,
    Loaded,
    /// The load failed. The view renders its empty state; nothing is shown to
    /// the user and the failure is only logged.
    LoadError,
}

/// Single-shot load tracking for one view mount.
#[derive(Debug)]
pub struct LoadLifecycle {
    phase: LoadPhase,
    started: bool,
}

impl Default for LoadLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadLifecycle {
    pub fn new() -> Self {
        Self {
            phase: LoadPhase::Loading,
            started: false,
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }

    /// Claims the load for this mount. Returns `false` if it was already
    /// claimed, in which case the caller must not fetch again.
    pub fn begin(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        true
    }

    /// Leaves the loading phase. Failures are logged and swallowed.
    pub fn finish<T>(&mut self, view: &str, outcome: PortResult<T>) -> Option<T> {
        match outcome {
            Ok(value) => {
                self.phase = LoadPhase::Loaded;
                Some(value)
            }
            Err(e) => {
                warn!("Error loading data for the {} view: {}", view, e);
                self.phase = LoadPhase::LoadError;
                None
            }
        }
    }
}

//=========================================================================================
// Timeout Ceiling
//=========================================================================================

/// The single wall-clock ceiling applied to a booking, both by the proxy
/// endpoint and by the scheduling view's own proxy client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutCeiling(Duration);

impl TimeoutCeiling {
    pub const DEFAULT_SECS: u64 = 180;

    pub fn new(duration: Duration) -> Self {
        Self(duration)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// Human wording used in timeout messages, e.g. `3 minutes`.
    pub fn describe(&self) -> String {
        let secs = self.0.as_secs();
        if secs == 0 {
            let millis = self.0.as_millis();
            return plural(millis as u64, "millisecond");
        }
        if secs % 60 == 0 {
            plural(secs / 60, "minute")
        } else {
            plural(secs, "second")
        }
    }
}

impl Default for TimeoutCeiling {
    fn default() -> Self {
        Self::from_secs(Self::DEFAULT_SECS)
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}
