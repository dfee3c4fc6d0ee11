//! Prompt assembly.

use serde::{Deserialize, Serialize};

use crate::util::{cap_head, TRUNCATION_MARKER};

use super::{
    dataset_block, last_error_block, SessionContext, MAX_CONTEXT_TEXT_BYTES, NO_SCRIPT_EDITOR,
};

/// Fixed opening of every prompt.
pub const PREAMBLE: &str = "You are an assistant embedded in a desktop statistics application. \
Be concise. If you propose code, output plain script text without Markdown fences.\n\n";

/// Reply schema and tool list, included only when tools are enabled.
pub const TOOL_SCHEMA_INSTRUCTIONS: &str = "Return ONLY a single JSON object with this schema:\n\
{\"assistant_text\": \"...\", \"proposed_insert\": \"...\", \
\"tool_calls\": [{\"name\":\"...\",\"args\":{...}}]}\n\
If you do not need tools, set tool_calls to [].\n\
Available read-only tools:\n\
- get_dataset_summary\n\
- get_last_error\n\
- get_script_selection\n\
- get_script_full\n\
- get_command_log_tail (args: {\"n_lines\": 50})\n\
- get_last_model_summary (args: {\"style\": \"simple\"|\"full\"})\n\
Do not include Markdown fences.\n\n";

/// Which context blocks to inline into the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContextToggles {
    pub dataset: bool,
    pub last_error: bool,
    pub script: bool,
}

impl ContextToggles {
    pub fn all() -> Self {
        Self {
            dataset: true,
            last_error: true,
            script: true,
        }
    }
}

/// Build the round-one prompt.
///
/// Layout: preamble, schema instructions (tools only), the user's request,
/// then each toggled context block followed by a blank line.
pub fn build_prompt(
    user_prompt: &str,
    toggles: ContextToggles,
    tools_enabled: bool,
    ctx: &dyn SessionContext,
) -> String {
    let mut prompt = String::from(PREAMBLE);

    if tools_enabled {
        prompt.push_str(TOOL_SCHEMA_INSTRUCTIONS);
    }

    prompt.push_str("User request:\n");
    prompt.push_str(user_prompt);
    prompt.push_str("\n\n");

    if toggles.dataset {
        prompt.push_str(&dataset_block(ctx.dataset().as_ref()));
        prompt.push('\n');
    }
    if toggles.last_error {
        prompt.push_str(&last_error_block(ctx));
        prompt.push('\n');
    }
    if toggles.script {
        prompt.push_str(&script_block(ctx));
        prompt.push('\n');
    }

    prompt
}

/// `[Script]` block: the selection if there is one, else the whole buffer.
pub fn script_block(ctx: &dyn SessionContext) -> String {
    let Some(buffer) = ctx.script_editor() else {
        return format!("[Script]\n{NO_SCRIPT_EDITOR}");
    };

    let (label, text) = match buffer.selection {
        Some(selection) if !selection.is_empty() => ("selection", selection),
        _ => ("full", buffer.text),
    };

    let (text, cut) = cap_head(&text, MAX_CONTEXT_TEXT_BYTES, TRUNCATION_MARKER);
    let note = if cut { "; truncated" } else { "" };
    format!("[Script] ({label}{note})\n{text}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ScriptBuffer, StaticContext};
    use pretty_assertions::assert_eq;

    #[test]
    fn minimal_prompt_without_tools() {
        let prompt =
            build_prompt("ping", ContextToggles::default(), false, &StaticContext::default());
        assert_eq!(prompt, format!("{PREAMBLE}User request:\nping\n\n"));
    }

    #[test]
    fn tools_add_schema_before_request() {
        let prompt =
            build_prompt("ping", ContextToggles::default(), true, &StaticContext::default());
        assert!(prompt.starts_with(PREAMBLE));
        let schema_at = prompt.find("Return ONLY a single JSON object").unwrap();
        let request_at = prompt.find("User request:\nping").unwrap();
        assert!(schema_at < request_at);
        assert!(prompt.contains("- get_command_log_tail (args: {\"n_lines\": 50})\n"));
    }

    #[test]
    fn toggled_blocks_follow_the_request() {
        let ctx = StaticContext {
            last_error: Some("syntax error".into()),
            script: Some(ScriptBuffer {
                text: "ols y 0 x\nprint y\n".into(),
                selection: Some("print y".into()),
            }),
            ..Default::default()
        };
        let prompt = build_prompt("fix it", ContextToggles::all(), false, &ctx);
        assert!(prompt.ends_with(
            "User request:\nfix it\n\n\
             [Dataset]\n(no dataset loaded)\n\n\
             [Last error]\nsyntax error\n\n\
             [Script] (selection)\nprint y\n\n"
        ));
    }

    #[test]
    fn script_block_without_editor() {
        assert_eq!(
            script_block(&StaticContext::default()),
            "[Script]\n(no active script editor)\n"
        );
    }

    #[test]
    fn long_script_is_labelled_truncated() {
        let ctx = StaticContext {
            script: Some(ScriptBuffer {
                text: "z".repeat(MAX_CONTEXT_TEXT_BYTES + 1),
                selection: None,
            }),
            ..Default::default()
        };
        assert!(script_block(&ctx).starts_with("[Script] (full; truncated)\n"));
    }
}
