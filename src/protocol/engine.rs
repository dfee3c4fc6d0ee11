//! The bounded two-round exchange.
//!
//! ```text
//! tools off: ROUND1 -> DONE
//! tools on:  ROUND1 -> PARSE1 -> DONE                              (no calls)
//!                             -> EXECUTE -> ROUND2 -> PARSE2 -> DONE
//! ```
//!
//! Tool calls in the second reply are ignored, so a run never makes more
//! than two agent invocations.

use std::sync::Arc;

use crate::completion::{Completer, CompletionRequest, CompletionService};
use crate::config::AssistConfig;
use crate::context::ContextSnapshot;
use crate::provider::Provider;
use crate::tools::{execute_tool_calls, format_for_display, ParsedReply};

use super::types::{Phase, RunOutcome};

/// Hard cap on agent invocations per run.
pub const MAX_ROUNDS: u8 = 2;

/// Runs requests against a [`Completer`], answering tool calls from a
/// snapshot.
#[derive(Clone)]
pub struct ProtocolEngine {
    completer: Arc<dyn Completer>,
}

impl std::fmt::Debug for ProtocolEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolEngine").finish_non_exhaustive()
    }
}

impl ProtocolEngine {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self { completer }
    }

    /// Engine backed by the process-spawning [`CompletionService`].
    pub fn with_config(config: AssistConfig) -> Self {
        Self::new(Arc::new(CompletionService::new(config)))
    }

    /// Run `request` to completion. Failures become a failed outcome whose
    /// display text is the error message.
    pub async fn run(&self, request: &CompletionRequest, snapshot: &ContextSnapshot) -> RunOutcome {
        let first = match self
            .round(request.provider, &request.prompt, Phase::Round1)
            .await
        {
            Ok(reply) => reply,
            Err(error) => return RunOutcome::failed(error, 1),
        };

        if !request.tools_enabled {
            tracing::debug!(phase = %Phase::Done, rounds = 1, "protocol finished");
            return RunOutcome::completed(first, None, 1);
        }

        tracing::debug!(phase = %Phase::Parse1, reply_bytes = first.len(), "parsing reply");
        let parsed = ParsedReply::parse(&first);

        let tool_results = if parsed.has_tool_calls() {
            tracing::debug!(
                phase = %Phase::Execute,
                calls = parsed.tool_calls.len(),
                "executing tool calls"
            );
            execute_tool_calls(&parsed.tool_calls, snapshot)
        } else {
            None
        };

        let Some(tool_results) = tool_results else {
            return finish(&parsed, &first, 1);
        };

        let prompt = round_two_prompt(&request.prompt, &tool_results);
        let second = match self.round(request.provider, &prompt, Phase::Round2).await {
            Ok(reply) => reply,
            Err(error) => return RunOutcome::failed(error, MAX_ROUNDS),
        };

        tracing::debug!(phase = %Phase::Parse2, reply_bytes = second.len(), "parsing reply");
        let parsed = ParsedReply::parse(&second);
        if parsed.has_tool_calls() {
            tracing::debug!(
                calls = parsed.tool_calls.len(),
                "ignoring tool calls in final round"
            );
        }
        finish(&parsed, &second, MAX_ROUNDS)
    }

    async fn round(
        &self,
        provider: Provider,
        prompt: &str,
        phase: Phase,
    ) -> std::result::Result<String, String> {
        tracing::debug!(phase = %phase, prompt_bytes = prompt.len(), "starting round");
        self.completer
            .complete_with_error(provider, prompt)
            .await
            .map_err(|err| {
                tracing::debug!(phase = %phase, error = %err, "round failed");
                err.to_string()
            })
    }
}

fn finish(parsed: &ParsedReply, raw: &str, rounds: u8) -> RunOutcome {
    tracing::debug!(phase = %Phase::Done, rounds, "protocol finished");
    RunOutcome::completed(
        format_for_display(parsed, raw),
        parsed.insert_text().map(str::to_owned),
        rounds,
    )
}

/// Original prompt, the verbatim tool results, and a nudge to answer now.
pub fn round_two_prompt(prompt: &str, tool_results: &str) -> String {
    format!("{prompt}\n\nTool results:\n{tool_results}\n\nNow respond using the JSON schema.\n")
}
