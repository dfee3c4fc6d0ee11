//! Embedded-JSON agent: prints a JSON object with a `response` field on
//! stdout, possibly wrapped in banner or trailer text.

use std::ffi::OsString;
use std::path::Path;

use crate::config::AssistConfig;
use crate::error::{cap_diagnostic, AssistError, Result};
use crate::extract;
use crate::process::ProcessOutput;

use super::{AgentBackend, AgentKind};

/// Name that matches no MCP server or tool, disabling both. Without it the
/// agent may wait for interactive approval and hang.
pub const NONE_SENTINEL: &str = "llm-assist-none";

/// Printed on stderr when the agent crashes, sometimes with exit status 0.
pub const CRITICAL_ERROR_MARKER: &str = "An unexpected critical error occurred";

#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiBackend;

impl AgentBackend for GeminiBackend {
    fn kind(&self) -> AgentKind {
        AgentKind::Gemini
    }

    fn build_argv(
        &self,
        bin: &Path,
        prompt: &str,
        _output_file: Option<&Path>,
        _config: &AssistConfig,
    ) -> Vec<OsString> {
        vec![
            bin.into(),
            "-p".into(),
            prompt.into(),
            "--output-format".into(),
            "json".into(),
            "--allowed-mcp-server-names".into(),
            NONE_SENTINEL.into(),
            "--allowed-tools".into(),
            NONE_SENTINEL.into(),
        ]
    }

    fn extract_reply(&self, output: &ProcessOutput, _output_file: Option<&Path>) -> Result<String> {
        if output.stderr.contains(CRITICAL_ERROR_MARKER) {
            return Err(AssistError::AgentCrashed {
                agent: self.kind().name().to_string(),
                stderr: cap_diagnostic(&output.stderr),
            });
        }
        extract::extract_embedded_reply(self.kind().name(), output)
    }
}
