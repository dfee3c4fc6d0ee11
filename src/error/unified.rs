//! Unified error classification and recovery.

use serde::{Deserialize, Serialize};

use crate::util::{cap_head, TRUNCATION_MARKER};

/// Cap on agent output carried inside an error message.
pub const MAX_DIAGNOSTIC_BYTES: usize = 32_000;

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Rejected before any process was spawned (empty prompt, bad selector).
    Data,
    /// The external agent could not be run or did not produce a usable reply.
    External,
    /// The agent's reply exceeded its size cap.
    TooLong,
    /// The worker itself failed.
    Internal,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    CheckInput,
    CheckConfiguration,
    IncreaseTimeout,
    ReduceInputSize,
    InspectAgentOutput,
    ReportBug,
}

/// Where a failure diagnostic came from.
///
/// Failure messages carry captured stderr when there is any, otherwise
/// stdout, otherwise nothing. The text is capped at [`MAX_DIAGNOSTIC_BYTES`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Diagnostic {
    #[default]
    None,
    Stderr(String),
    Stdout(String),
}

impl Diagnostic {
    /// Prefer stderr, then stdout.
    pub fn from_output(stdout: &str, stderr: &str) -> Self {
        if !stderr.is_empty() {
            Self::Stderr(cap_diagnostic(stderr))
        } else if !stdout.is_empty() {
            Self::Stdout(cap_diagnostic(stdout))
        } else {
            Self::None
        }
    }

    /// Prefer stdout, then stderr. Used when stdout was expected to carry
    /// the reply and is therefore the more useful thing to show.
    pub fn stdout_first(stdout: &str, stderr: &str) -> Self {
        if !stdout.is_empty() {
            Self::Stdout(cap_diagnostic(stdout))
        } else {
            Self::from_output(stdout, stderr)
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Stderr(text) | Self::Stdout(text) => Some(text),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// `\n\nstderr:\n...` style suffix for process failures.
    pub(crate) fn section(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Stderr(text) => format!("\n\nstderr:\n{text}"),
            Self::Stdout(text) => format!("\n\nstdout:\n{text}"),
        }
    }

    /// ` (stderr follows)\n...` style suffix for missing replies.
    pub(crate) fn follows(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Stderr(text) => format!(" (stderr follows)\n{text}"),
            Self::Stdout(text) => format!(" (stdout follows)\n{text}"),
        }
    }
}

/// Agent output trimmed to [`MAX_DIAGNOSTIC_BYTES`] plus a marker.
pub fn cap_diagnostic(text: &str) -> String {
    let (text, cut) = cap_head(text, MAX_DIAGNOSTIC_BYTES, TRUNCATION_MARKER);
    if cut {
        tracing::debug!(limit = MAX_DIAGNOSTIC_BYTES, "agent output truncated in error");
    }
    text
}
