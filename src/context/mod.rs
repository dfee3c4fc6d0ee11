//! Session context: what the host can tell the model about its current state.
//!
//! The host implements [`SessionContext`]. When a job starts, the context is
//! read exactly once into an immutable [`ContextSnapshot`]; tool calls during
//! that job are answered from the snapshot only.

pub mod dataset;
pub mod prompt;

pub use dataset::{dataset_block, DatasetInfo};
pub use prompt::{build_prompt, ContextToggles, PREAMBLE, TOOL_SCHEMA_INSTRUCTIONS};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::util::{cap_head, cap_tail, TRUNCATION_MARKER};

/// Cap for script text, error messages, and model summaries.
pub const MAX_CONTEXT_TEXT_BYTES: usize = 32_000;
/// Cap for the command log source text (most recent text is kept).
pub const MAX_COMMAND_LOG_BYTES: usize = 200_000;
const LOG_TRUNCATION_MARKER: &str = "...[truncated]...\n";

pub const NO_ERROR: &str = "(none)\n";
pub const NO_MODEL: &str = "(none)\n";
pub const NO_SCRIPT_EDITOR: &str = "(no active script editor)\n";
pub const NO_SELECTION: &str = "(no selection)\n";
pub const UNAVAILABLE: &str = "(unavailable)\n";

/// Level of detail for the last model summary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SummaryStyle {
    #[default]
    Simple,
    Full,
}

/// Contents of the active script editor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScriptBuffer {
    pub text: String,
    /// Selected text, `None` when nothing is selected.
    #[serde(default)]
    pub selection: Option<String>,
}

/// Read-only view of the host session.
pub trait SessionContext {
    fn dataset(&self) -> Option<DatasetInfo>;

    fn last_error(&self) -> Option<String>;

    /// Shown when there is no error message.
    fn last_warning(&self) -> Option<String> {
        None
    }

    /// `None` when no script editor is open.
    fn script_editor(&self) -> Option<ScriptBuffer>;

    fn command_log(&self) -> Option<String>;

    fn last_model_summary(&self, style: SummaryStyle) -> Option<String>;
}

/// A [`SessionContext`] backed by plain values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticContext {
    pub dataset: Option<DatasetInfo>,
    pub last_error: Option<String>,
    pub last_warning: Option<String>,
    pub script: Option<ScriptBuffer>,
    pub command_log: Option<String>,
    pub model_simple: Option<String>,
    pub model_full: Option<String>,
}

impl SessionContext for StaticContext {
    fn dataset(&self) -> Option<DatasetInfo> {
        self.dataset.clone()
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }

    fn last_warning(&self) -> Option<String> {
        self.last_warning.clone()
    }

    fn script_editor(&self) -> Option<ScriptBuffer> {
        self.script.clone()
    }

    fn command_log(&self) -> Option<String> {
        self.command_log.clone()
    }

    fn last_model_summary(&self, style: SummaryStyle) -> Option<String> {
        match style {
            SummaryStyle::Simple => self.model_simple.clone(),
            SummaryStyle::Full => self.model_full.clone(),
        }
    }
}

/// Session context frozen at job start.
///
/// `None` fields render as `(unavailable)` when a tool asks for them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub dataset: Option<String>,
    pub last_error: Option<String>,
    pub script_selection: Option<String>,
    pub script_full: Option<String>,
    pub command_log: Option<String>,
    pub last_model_simple: Option<String>,
    pub last_model_full: Option<String>,
}

impl ContextSnapshot {
    /// Read every item from `ctx` once, regardless of what the prompt
    /// includes, so tools can reach context the user did not inline.
    pub fn capture(ctx: &dyn SessionContext) -> Self {
        let script = ctx.script_editor();

        let script_selection = match &script {
            None => NO_SCRIPT_EDITOR.to_string(),
            Some(buffer) => match &buffer.selection {
                Some(selection) => cap_text("script_selection", selection),
                None => NO_SELECTION.to_string(),
            },
        };
        let script_full = match &script {
            None => NO_SCRIPT_EDITOR.to_string(),
            Some(buffer) => cap_text("script_full", &buffer.text),
        };

        let command_log = ctx.command_log().map(|log| {
            let (log, cut) = cap_tail(&log, MAX_COMMAND_LOG_BYTES, LOG_TRUNCATION_MARKER);
            if cut {
                tracing::warn!(item = "command_log", "context truncated");
            }
            log
        });

        let model = |style: SummaryStyle| {
            ctx.last_model_summary(style)
                .map(|text| cap_text("last_model_summary", &text))
                .unwrap_or_else(|| NO_MODEL.to_string())
        };

        Self {
            dataset: Some(dataset_block(ctx.dataset().as_ref())),
            last_error: Some(last_error_block(ctx)),
            script_selection: Some(script_selection),
            script_full: Some(script_full),
            command_log,
            last_model_simple: Some(model(SummaryStyle::Simple)),
            last_model_full: Some(model(SummaryStyle::Full)),
        }
    }
}

/// `[Last error]` block; falls back to the last warning, then `(none)`.
pub fn last_error_block(ctx: &dyn SessionContext) -> String {
    let message = ctx
        .last_error()
        .filter(|msg| !msg.is_empty())
        .or_else(|| ctx.last_warning().filter(|msg| !msg.is_empty()));

    match message {
        Some(msg) => format!("[Last error]\n{}\n", cap_text("last_error", &msg)),
        None => format!("[Last error]\n{NO_ERROR}"),
    }
}

fn cap_text(item: &'static str, text: &str) -> String {
    let (text, cut) = cap_head(text, MAX_CONTEXT_TEXT_BYTES, TRUNCATION_MARKER);
    if cut {
        tracing::warn!(item, "context truncated");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_session_snapshot_uses_placeholders() {
        let snap = ContextSnapshot::capture(&StaticContext::default());
        assert_eq!(snap.dataset.as_deref(), Some("[Dataset]\n(no dataset loaded)\n"));
        assert_eq!(snap.last_error.as_deref(), Some("[Last error]\n(none)\n"));
        assert_eq!(snap.script_selection.as_deref(), Some(NO_SCRIPT_EDITOR));
        assert_eq!(snap.script_full.as_deref(), Some(NO_SCRIPT_EDITOR));
        assert_eq!(snap.command_log, None);
        assert_eq!(snap.last_model_simple.as_deref(), Some(NO_MODEL));
    }

    #[test]
    fn warning_stands_in_for_missing_error() {
        let ctx = StaticContext {
            last_error: Some(String::new()),
            last_warning: Some("data contain missing values".into()),
            ..Default::default()
        };
        assert_eq!(
            last_error_block(&ctx),
            "[Last error]\ndata contain missing values\n"
        );
    }

    #[test]
    fn editor_without_selection() {
        let ctx = StaticContext {
            script: Some(ScriptBuffer {
                text: "ols y 0 x\n".into(),
                selection: None,
            }),
            ..Default::default()
        };
        let snap = ContextSnapshot::capture(&ctx);
        assert_eq!(snap.script_selection.as_deref(), Some(NO_SELECTION));
        assert_eq!(snap.script_full.as_deref(), Some("ols y 0 x\n"));
    }

    #[test]
    fn long_log_keeps_most_recent_text() {
        let log = format!("{}tail line\n", "x".repeat(MAX_COMMAND_LOG_BYTES));
        let ctx = StaticContext {
            command_log: Some(log),
            ..Default::default()
        };
        let snap = ContextSnapshot::capture(&ctx);
        let kept = snap.command_log.unwrap();
        assert!(kept.starts_with(LOG_TRUNCATION_MARKER));
        assert!(kept.ends_with("tail line\n"));
    }

    #[test]
    fn long_script_is_marked() {
        let ctx = StaticContext {
            script: Some(ScriptBuffer {
                text: "y".repeat(MAX_CONTEXT_TEXT_BYTES + 10),
                selection: None,
            }),
            ..Default::default()
        };
        let full = ContextSnapshot::capture(&ctx).script_full.unwrap();
        assert!(full.ends_with(TRUNCATION_MARKER));
        assert_eq!(full.len(), MAX_CONTEXT_TEXT_BYTES + TRUNCATION_MARKER.len());
    }
}
