//! Outcome types for a protocol run.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Shown when a round failed without any message.
pub const FALLBACK_ERROR: &str = "LLM call failed";

/// Shown when a round succeeded but left nothing to display.
pub const EMPTY_REPLY_ERROR: &str = "LLM returned no reply";

/// Steps of the two-round exchange, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Round1,
    Parse1,
    Execute,
    Round2,
    Parse2,
    Done,
}

/// Run lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// Result of one protocol run. `display` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Text to show: the formatted answer, or the error message.
    pub display: String,
    /// Proposed script from the final round, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
    /// Agent invocations made, including a failed one.
    pub rounds: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunOutcome {
    /// A blank `display` turns the outcome into a failure.
    pub fn completed(display: impl Into<String>, insert_text: Option<String>, rounds: u8) -> Self {
        let display = display.into();
        if display.trim().is_empty() {
            tracing::debug!(rounds, "completed round left nothing to display");
            return Self::failed(EMPTY_REPLY_ERROR, rounds);
        }
        Self {
            status: RunStatus::Completed,
            display,
            insert_text,
            rounds,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>, rounds: u8) -> Self {
        let mut error = error.into();
        if error.is_empty() {
            error = FALLBACK_ERROR.to_string();
        }
        Self {
            status: RunStatus::Failed,
            display: error.clone(),
            insert_text: None,
            rounds,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }
}
