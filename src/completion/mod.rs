//! Completion service: one prompt in, one reply out.

use std::path::Path;

use async_trait::async_trait;
use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::config::AssistConfig;
use crate::error::{self, AssistError, Result};
use crate::process::{self, ProcessRunner};
use crate::provider::{codex, resolve_executable, Provider};

/// One ask, as submitted by the host.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct CompletionRequest {
    #[builder(default)]
    pub provider: Provider,
    #[builder(into)]
    pub prompt: String,
    #[builder(default = true)]
    pub tools_enabled: bool,
}

/// Anything that can turn a prompt into a reply.
///
/// [`CompletionService`] is the real implementation; the protocol engine
/// only depends on this trait.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Run one completion, returning the error directly instead of through
    /// the process-wide channel. Safe to call from any thread.
    async fn complete_with_error(&self, provider: Provider, prompt: &str) -> Result<String>;
}

/// Resolves the agent, runs it, and extracts its reply.
#[derive(Debug, Clone)]
pub struct CompletionService {
    config: AssistConfig,
    runner: ProcessRunner,
}

impl CompletionService {
    pub fn new(config: AssistConfig) -> Self {
        let runner = ProcessRunner::new(&config);
        Self { config, runner }
    }

    /// Service configured from the environment.
    pub fn from_env() -> Self {
        Self::new(AssistConfig::global().clone())
    }

    pub fn config(&self) -> &AssistConfig {
        &self.config
    }

    /// Like [`Completer::complete_with_error`], but also records the outcome
    /// on the process-wide error channel (cleared on success). Only meant
    /// for single-threaded hosts.
    pub async fn complete(&self, provider: Provider, prompt: &str) -> Result<String> {
        let result = self.run_once(provider, prompt).await;
        match &result {
            Ok(_) => error::clear_last_error(),
            Err(err) => error::set_last_error(err.to_string()),
        }
        result
    }

    async fn run_once(&self, provider: Provider, prompt: &str) -> Result<String> {
        if prompt.is_empty() {
            return Err(AssistError::EmptyPrompt);
        }

        let agent = provider.resolve(&self.config);
        let bin = resolve_executable(agent, &self.config)?;
        let backend = agent.backend();

        // Lives until extraction is done; the file is deleted on drop.
        let output_file = if backend.uses_output_file() {
            Some(codex::create_output_file()?)
        } else {
            None
        };
        let output_path: Option<&Path> = output_file.as_deref();

        let argv = backend.build_argv(&bin, prompt, output_path, &self.config);
        tracing::debug!(
            agent = agent.name(),
            prompt_bytes = prompt.len(),
            "running completion"
        );

        let output = self.runner.run(agent, argv).await?;
        process::classify_exit(agent, &output)?;
        let reply = backend.extract_reply(&output, output_path)?;

        tracing::debug!(
            agent = agent.name(),
            reply_bytes = reply.len(),
            "completion finished"
        );
        Ok(reply)
    }
}

#[async_trait]
impl Completer for CompletionService {
    async fn complete_with_error(&self, provider: Provider, prompt: &str) -> Result<String> {
        self.run_once(provider, prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::AgentKind;

    #[tokio::test]
    async fn empty_prompt_is_rejected_before_resolving() {
        // The override points nowhere; an attempt to spawn would fail
        // with a spawn error instead.
        let config = AssistConfig::default().with_binary(AgentKind::Codex, "/nonexistent/codex");
        let service = CompletionService::new(config);
        let err = service
            .complete_with_error(Provider::None, "")
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::EmptyPrompt));
    }

    #[test]
    fn request_builder_defaults() {
        let request = CompletionRequest::builder().prompt("hi").build();
        assert_eq!(request.provider, Provider::None);
        assert!(request.tools_enabled);
    }
}
