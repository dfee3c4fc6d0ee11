//! Error types for agent-assist.

pub mod unified;

pub use unified::{
    cap_diagnostic, Diagnostic, ErrorCategory, RecoverySuggestion, MAX_DIAGNOSTIC_BYTES,
};

use std::sync::{Mutex, OnceLock};

use thiserror::Error;

/// Primary error type for all completion operations.
#[derive(Error, Debug)]
pub enum AssistError {
    #[error("Missing prompt")]
    EmptyPrompt,

    #[error("Unknown LLM provider '{0}' (expected codex|gemini)")]
    InvalidProvider(String),

    #[error("The assistant is already working on a request")]
    Busy,

    #[error("Cannot find {agent} executable (set {env_var})")]
    ExecutableNotFound { agent: String, env_var: String },

    #[error("Failed to create temp file for {agent} output: {source}")]
    TempFile {
        agent: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to run {agent} CLI: {source}")]
    Spawn {
        agent: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{agent} failed: {status} (timed out; set {env_var})")]
    Timeout {
        agent: String,
        status: String,
        env_var: String,
    },

    #[error("{agent} failed: {status}{}", .diagnostic.section())]
    ProcessFailed {
        agent: String,
        status: String,
        diagnostic: Diagnostic,
    },

    #[error("Failed to read LLM output file: {source}")]
    OutputFile {
        agent: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{agent} returned no reply{}", .diagnostic.follows())]
    EmptyReply { agent: String, diagnostic: Diagnostic },

    #[error("{agent} CLI error:\n{stderr}")]
    AgentCrashed { agent: String, stderr: String },

    #[error("{}", unparseable_message(.agent, .diagnostic))]
    Unparseable { agent: String, diagnostic: Diagnostic },

    #[error("LLM reply too long ({len} bytes; limit {limit})")]
    ReplyTooLong { len: usize, limit: usize },

    #[error("Assistant worker failed: {0}")]
    Worker(String),
}

fn unparseable_message(agent: &str, diagnostic: &Diagnostic) -> String {
    match diagnostic {
        Diagnostic::Stdout(text) => {
            format!("Failed to parse {agent} response (output follows)\n{text}")
        }
        Diagnostic::Stderr(text) => format!("{agent} returned no JSON (stderr follows)\n{text}"),
        Diagnostic::None => format!("{agent} returned no reply"),
    }
}

impl AssistError {
    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyPrompt | Self::InvalidProvider(_) | Self::Busy => ErrorCategory::Data,
            Self::ReplyTooLong { .. } => ErrorCategory::TooLong,
            Self::Worker(_) => ErrorCategory::Internal,
            _ => ErrorCategory::External,
        }
    }

    /// Whether the agent was stopped by the timeout guard.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            Self::Timeout { .. } => RecoverySuggestion::IncreaseTimeout,
            Self::ExecutableNotFound { .. } => RecoverySuggestion::CheckConfiguration,
            Self::Worker(_) => RecoverySuggestion::ReportBug,
            _ => match self.category() {
                ErrorCategory::Data => RecoverySuggestion::CheckInput,
                ErrorCategory::TooLong => RecoverySuggestion::ReduceInputSize,
                _ => RecoverySuggestion::InspectAgentOutput,
            },
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AssistError>;

static LAST_ERROR: OnceLock<Mutex<Option<String>>> = OnceLock::new();

fn last_error_slot() -> &'static Mutex<Option<String>> {
    LAST_ERROR.get_or_init(|| Mutex::new(None))
}

/// Record a message on the process-wide error channel.
///
/// Only [`crate::completion::CompletionService::complete`] writes here; code
/// running off the UI thread uses `complete_with_error` instead.
pub fn set_last_error(message: impl Into<String>) {
    let mut slot = last_error_slot()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = Some(message.into());
}

/// The most recent message recorded on the process-wide error channel.
pub fn last_error() -> Option<String> {
    last_error_slot()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

pub fn clear_last_error() {
    let mut slot = last_error_slot()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = None;
}
