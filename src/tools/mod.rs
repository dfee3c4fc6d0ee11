//! Read-only tools the model may call, and the reply schema that carries
//! those calls.
//!
//! The model is asked to answer with a single JSON object:
//!
//! ```text
//! {"assistant_text": "...", "proposed_insert": "...",
//!  "tool_calls": [{"name": "...", "args": {...}}]}
//! ```
//!
//! Parsing goes through the narrow textual reader in
//! [`crate::extract::scan`], not a JSON library.

pub mod execute;
pub mod reply;

pub use execute::{execute_tool_calls, tail_lines, MAX_TAIL_BYTES, MAX_TOOL_BLOCK_BYTES};
pub use reply::{format_for_display, ParsedReply};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::context::SummaryStyle;

/// Calls accepted from one reply, and executed per round.
pub const MAX_TOOL_CALLS: usize = 8;

/// Lines returned by the log tail tool when `n_lines` is absent or not
/// positive.
pub const DEFAULT_TAIL_LINES: i64 = 50;

/// The tools the model can ask for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    GetDatasetSummary,
    GetLastError,
    GetScriptSelection,
    GetScriptFull,
    GetCommandLogTail,
    GetLastModelSummary,
}

/// One accepted tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: ToolName,
    /// Only meaningful for [`ToolName::GetCommandLogTail`].
    pub n_lines: i64,
    /// Only meaningful for [`ToolName::GetLastModelSummary`].
    pub style: SummaryStyle,
}

impl ToolCall {
    pub fn new(name: ToolName) -> Self {
        Self {
            name,
            n_lines: DEFAULT_TAIL_LINES,
            style: SummaryStyle::Simple,
        }
    }

    pub fn with_n_lines(mut self, n_lines: i64) -> Self {
        self.n_lines = n_lines;
        self
    }

    pub fn with_style(mut self, style: SummaryStyle) -> Self {
        self.style = style;
        self
    }
}
