//! Answering tool calls from a context snapshot.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::context::{ContextSnapshot, SummaryStyle, UNAVAILABLE};
use crate::util::{cap_head, TRUNCATION_MARKER};

use super::{ToolCall, ToolName, DEFAULT_TAIL_LINES, MAX_TOOL_CALLS};

/// Cap on one log tail.
pub const MAX_TAIL_BYTES: usize = 32_000;
/// Cap on the whole tool result block.
pub const MAX_TOOL_BLOCK_BYTES: usize = 40_000;

/// Run `calls` (at most [`MAX_TOOL_CALLS`]) against `snapshot`.
///
/// Each result is framed as `--- tool:<name> ---\n<text>\n--- end ---\n`,
/// in call order. Returns `None` when there is nothing to run.
pub fn execute_tool_calls(calls: &[ToolCall], snapshot: &ContextSnapshot) -> Option<String> {
    if calls.is_empty() {
        return None;
    }

    let mut block = String::new();
    for call in calls.iter().take(MAX_TOOL_CALLS) {
        let text = resolve(call, snapshot);

        let _ = writeln!(block, "--- tool:{} ---", call.name);
        match text {
            Some(text) => {
                block.push_str(&text);
                if !block.ends_with('\n') {
                    block.push('\n');
                }
            }
            None => block.push_str(UNAVAILABLE),
        }
        block.push_str("--- end ---\n");

        tracing::debug!(tool = %call.name, bytes = block.len(), "tool call answered");
    }

    let (block, cut) = cap_head(&block, MAX_TOOL_BLOCK_BYTES, TRUNCATION_MARKER);
    if cut {
        tracing::warn!(limit = MAX_TOOL_BLOCK_BYTES, "tool results truncated");
    }
    Some(block)
}

fn resolve<'a>(call: &ToolCall, snapshot: &'a ContextSnapshot) -> Option<Cow<'a, str>> {
    let field = match call.name {
        ToolName::GetDatasetSummary => &snapshot.dataset,
        ToolName::GetLastError => &snapshot.last_error,
        ToolName::GetScriptSelection => &snapshot.script_selection,
        ToolName::GetScriptFull => &snapshot.script_full,
        ToolName::GetCommandLogTail => {
            return snapshot
                .command_log
                .as_deref()
                .map(|log| Cow::Owned(tail_lines(log, call.n_lines)));
        }
        ToolName::GetLastModelSummary => match call.style {
            SummaryStyle::Simple => &snapshot.last_model_simple,
            SummaryStyle::Full => &snapshot.last_model_full,
        },
    };
    field.as_deref().map(Cow::Borrowed)
}

/// The last `n_lines` lines of `text`, counted by newline characters from
/// the end. Non-positive counts mean [`DEFAULT_TAIL_LINES`].
pub fn tail_lines(text: &str, n_lines: i64) -> String {
    let wanted = if n_lines <= 0 {
        DEFAULT_TAIL_LINES
    } else {
        n_lines
    };

    let mut seen = 0i64;
    let mut start = 0;
    for (index, byte) in text.bytes().enumerate().rev() {
        if byte == b'\n' {
            seen += 1;
            if seen > wanted {
                start = index + 1;
                break;
            }
        }
    }

    cap_head(&text[start..], MAX_TAIL_BYTES, TRUNCATION_MARKER).0
}
