//! File-channel agent: the final message is written to a path passed on the
//! command line.

use std::ffi::OsString;
use std::path::Path;

use crate::config::AssistConfig;
use crate::error::{AssistError, Result};
use crate::extract;
use crate::process::ProcessOutput;

use super::{AgentBackend, AgentKind};

/// Prefix of the temp file the agent writes its last message to.
pub const OUTPUT_FILE_PREFIX: &str = "llm_assist_codex_lastmsg_";

#[derive(Debug, Clone, Copy, Default)]
pub struct CodexBackend;

impl AgentBackend for CodexBackend {
    fn kind(&self) -> AgentKind {
        AgentKind::Codex
    }

    fn uses_output_file(&self) -> bool {
        true
    }

    fn build_argv(
        &self,
        bin: &Path,
        prompt: &str,
        output_file: Option<&Path>,
        config: &AssistConfig,
    ) -> Vec<OsString> {
        let mut argv: Vec<OsString> = vec![bin.into()];

        if config.codex_dangerous() {
            argv.extend(
                ["exec", "--dangerously-bypass-approvals-and-sandbox"]
                    .into_iter()
                    .map(OsString::from),
            );
        } else {
            argv.extend(
                ["-a", "never", "exec", "-s", "read-only"]
                    .into_iter()
                    .map(OsString::from),
            );
        }

        argv.extend(
            ["--color", "never", "--skip-git-repo-check", "--output-last-message"]
                .into_iter()
                .map(OsString::from),
        );
        if let Some(path) = output_file {
            argv.push(path.into());
        }
        argv.push(prompt.into());
        argv
    }

    fn extract_reply(&self, output: &ProcessOutput, output_file: Option<&Path>) -> Result<String> {
        let path = output_file.ok_or_else(|| AssistError::OutputFile {
            agent: self.kind().name().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no output file"),
        })?;
        extract::read_reply_file(self.kind().name(), path, output)
    }
}

/// Create the temp file the agent will overwrite. It is removed when the
/// returned handle drops.
pub fn create_output_file() -> Result<tempfile::TempPath> {
    tempfile::Builder::new()
        .prefix(OUTPUT_FILE_PREFIX)
        .tempfile()
        .map(tempfile::NamedTempFile::into_temp_path)
        .map_err(|source| AssistError::TempFile {
            agent: AgentKind::Codex.name().to_string(),
            source,
        })
}
