//! Shared test helpers: a scripted completer and fake agent executables.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use agent_assist::completion::Completer;
use agent_assist::config::AssistConfig;
use agent_assist::error::{AssistError, Result};
use agent_assist::provider::{AgentKind, Provider};

/// A completer that replays queued replies and records every prompt.
#[derive(Default)]
pub struct ScriptedCompleter {
    replies: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, error: AssistError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl Completer for ScriptedCompleter {
    async fn complete_with_error(&self, _provider: Provider, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AssistError::Worker("no scripted reply left".to_string())))
    }
}

/// Write an executable `sh` script named `name` into `dir`.
#[cfg(unix)]
pub fn fake_agent(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Codex stand-in: runs `body` with `$out` set to the output file path.
#[cfg(unix)]
pub fn fake_codex(dir: &Path, body: &str) -> PathBuf {
    let script = format!(
        r#"out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--output-last-message" ]; then out="$2"; fi
  shift
done
{body}"#
    );
    fake_agent(dir, "codex", &script)
}

/// Config that ignores the process environment and points `agent` at `bin`.
pub fn config_for(agent: AgentKind, bin: &Path) -> AssistConfig {
    AssistConfig::from_lookup(|_| None)
        .with_default_agent(agent)
        .with_binary(agent, bin)
        .with_timeout_guard(false)
}
