//! Parsing the model's reply object and rendering it for display.

use serde::{Deserialize, Serialize};

use crate::context::SummaryStyle;
use crate::extract::scan;

use super::{ToolCall, ToolName, MAX_TOOL_CALLS};

/// Heading placed above a proposed script in the displayed reply.
pub const PROPOSED_SCRIPT_HEADING: &str = "[Proposed script]\n";

/// The three schema fields, as far as they could be recovered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedReply {
    pub assistant_text: String,
    pub proposed_insert: String,
    pub tool_calls: Vec<ToolCall>,
}

impl ParsedReply {
    /// Parse raw model text. Never fails: when none of the schema fields is
    /// present, the whole text becomes `assistant_text`.
    ///
    /// Calls without a `name`, or naming an unknown tool, are dropped. At
    /// most [`MAX_TOOL_CALLS`] are kept.
    pub fn parse(raw: &str) -> Self {
        let assistant_text = scan::extract_string_field(raw, "assistant_text");
        let proposed_insert = scan::extract_string_field(raw, "proposed_insert");
        let calls_span = scan::field_span(raw, "tool_calls", b'[', b']');

        if assistant_text.is_none() && proposed_insert.is_none() && calls_span.is_none() {
            return Self {
                assistant_text: raw.to_string(),
                ..Self::default()
            };
        }

        Self {
            assistant_text: assistant_text.unwrap_or_default(),
            proposed_insert: proposed_insert.unwrap_or_default(),
            tool_calls: calls_span
                .map(|(start, end)| parse_tool_calls(&raw[start..=end]))
                .unwrap_or_default(),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Text the host may offer to insert into the script editor.
    pub fn insert_text(&self) -> Option<&str> {
        Some(self.proposed_insert.as_str()).filter(|text| !text.is_empty())
    }
}

/// Walk the objects of a `tool_calls` array, `array` spanning `[` to `]`.
fn parse_tool_calls(array: &str) -> Vec<ToolCall> {
    let bytes = array.as_bytes();
    let end = array.len().saturating_sub(1);
    let mut calls = Vec::new();
    let mut pos = 1;

    while pos < end {
        pos = scan::skip_ws(array, pos);
        match bytes.get(pos) {
            Some(b',') => {
                pos += 1;
                continue;
            }
            Some(b'{') => {}
            _ => break,
        }

        let Some(object_end) = scan::match_closing(array, pos, b'{', b'}') else {
            break;
        };
        let object = &array[pos..=object_end];
        pos = object_end + 1;

        let Some(raw_name) = scan::extract_string_field(object, "name") else {
            continue;
        };
        let Ok(name) = raw_name.parse::<ToolName>() else {
            tracing::debug!(tool = %raw_name, "dropping unknown tool call");
            continue;
        };

        calls.push(parse_args(ToolCall::new(name), object));
        if calls.len() == MAX_TOOL_CALLS {
            break;
        }
    }

    calls
}

fn parse_args(mut call: ToolCall, object: &str) -> ToolCall {
    let Some((start, end)) = scan::field_span(object, "args", b'{', b'}') else {
        return call;
    };
    let args = &object[start..=end];

    match call.name {
        ToolName::GetCommandLogTail => {
            if let Some(n) =
                scan::find_field_value(args, "n_lines").and_then(|pos| scan::read_int(args, pos))
            {
                call.n_lines = n;
            }
        }
        ToolName::GetLastModelSummary => {
            if scan::extract_string_field(args, "style").as_deref() == Some("full") {
                call.style = SummaryStyle::Full;
            }
        }
        _ => {}
    }

    call
}

/// Text to show the user: the assistant text, then the proposed script
/// under its own heading. Falls back to `raw` when both are empty.
pub fn format_for_display(reply: &ParsedReply, raw: &str) -> String {
    let mut out = String::new();

    if !reply.assistant_text.is_empty() {
        out.push_str(&reply.assistant_text);
    }

    if let Some(insert) = reply.insert_text() {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(PROPOSED_SCRIPT_HEADING);
        out.push_str(insert);
        if !out.ends_with('\n') {
            out.push('\n');
        }
    }

    if out.is_empty() {
        return raw.to_string();
    }
    out
}
