//! Agent selection and the per-agent backend capability.
//!
//! Two external agents are supported. They differ in how they are invoked
//! and where their answer ends up:
//!
//! - [`codex`] writes its final message to a file named on the command line.
//! - [`gemini`] prints a JSON object (surrounded by noise) on stdout.
//!
//! Both are driven through the sealed [`AgentBackend`] trait so the
//! orchestration in [`crate::completion`] is written once.

pub mod codex;
pub mod gemini;

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::config::{AssistConfig, CODEX_BIN_ENV, GEMINI_BIN_ENV};
use crate::error::{AssistError, Result};
use crate::process::ProcessOutput;

/// Which agent the caller asked for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Use the configured default agent.
    #[default]
    None,
    Codex,
    Gemini,
}

impl Provider {
    /// Parse a selector, mapping failures to [`AssistError::InvalidProvider`].
    pub fn parse(raw: &str) -> Result<Self> {
        raw.trim()
            .parse()
            .map_err(|_| AssistError::InvalidProvider(raw.to_string()))
    }

    /// The concrete agent named by this selector, if any.
    pub fn agent(self) -> Option<AgentKind> {
        match self {
            Self::None => None,
            Self::Codex => Some(AgentKind::Codex),
            Self::Gemini => Some(AgentKind::Gemini),
        }
    }

    pub fn resolve(self, config: &AssistConfig) -> AgentKind {
        self.agent().unwrap_or_else(|| config.default_agent())
    }
}

impl From<AgentKind> for Provider {
    fn from(agent: AgentKind) -> Self {
        match agent {
            AgentKind::Codex => Self::Codex,
            AgentKind::Gemini => Self::Gemini,
        }
    }
}

/// A concrete external agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Codex,
    Gemini,
}

impl AgentKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Codex => "codex",
            Self::Gemini => "gemini",
        }
    }

    /// Environment variable that overrides the binary path.
    pub fn bin_env_var(self) -> &'static str {
        match self {
            Self::Codex => CODEX_BIN_ENV,
            Self::Gemini => GEMINI_BIN_ENV,
        }
    }

    pub fn executable_name(self) -> &'static str {
        self.name()
    }

    /// Per-user install location checked before searching `PATH`.
    pub fn fallback_path(self, config: &AssistConfig) -> Option<PathBuf> {
        config
            .user_bin_dir()
            .map(|dir| dir.join(self.executable_name()))
    }

    pub fn backend(self) -> &'static dyn AgentBackend {
        match self {
            Self::Codex => &codex::CodexBackend,
            Self::Gemini => &gemini::GeminiBackend,
        }
    }
}

mod private {
    pub trait Sealed {}

    impl Sealed for super::codex::CodexBackend {}
    impl Sealed for super::gemini::GeminiBackend {}
}

/// How one agent is invoked and how its reply is recovered.
///
/// Sealed: the set of agents is closed.
pub trait AgentBackend: private::Sealed + Send + Sync {
    fn kind(&self) -> AgentKind;

    /// Whether the agent delivers its reply through a caller-chosen file.
    fn uses_output_file(&self) -> bool {
        false
    }

    /// Full argument vector, binary first. `output_file` is `Some` exactly
    /// when [`AgentBackend::uses_output_file`] returns true.
    fn build_argv(
        &self,
        bin: &Path,
        prompt: &str,
        output_file: Option<&Path>,
        config: &AssistConfig,
    ) -> Vec<OsString>;

    /// Recover the reply from a process that already exited successfully.
    fn extract_reply(&self, output: &ProcessOutput, output_file: Option<&Path>) -> Result<String>;
}

/// Locate the binary for `agent`.
///
/// Order: explicit override, then the per-user fallback path if it is an
/// executable file, then a `PATH` search.
pub fn resolve_executable(agent: AgentKind, config: &AssistConfig) -> Result<PathBuf> {
    if let Some(path) = config.binary_override(agent) {
        return Ok(path.clone());
    }

    if let Some(path) = agent
        .fallback_path(config)
        .filter(|path| is_executable(path))
    {
        return Ok(path);
    }

    find_on_search_path(agent.executable_name(), config.search_path()).ok_or_else(|| {
        AssistError::ExecutableNotFound {
            agent: agent.name().to_string(),
            env_var: agent.bin_env_var().to_string(),
        }
    })
}

/// Look `name` up in a `PATH`-style list. No list means no match.
pub(crate) fn find_on_search_path(name: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_default();
    which::which_in(name, search_path, cwd).ok()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn provider_parsing_is_case_insensitive() {
        assert_eq!(Provider::parse("CODEX").unwrap(), Provider::Codex);
        assert_eq!(Provider::parse(" gemini ").unwrap(), Provider::Gemini);
        assert_eq!(Provider::parse("None").unwrap(), Provider::None);
        assert_eq!(Provider::Gemini.to_string(), "gemini");
    }

    #[test]
    fn invalid_provider_is_a_data_error() {
        let err = Provider::parse("claude").unwrap_err();
        assert!(matches!(err, AssistError::InvalidProvider(ref s) if s == "claude"));
        assert_eq!(err.category(), crate::error::ErrorCategory::Data);
    }

    #[test]
    fn none_resolves_to_configured_default() {
        let config = AssistConfig::default().with_default_agent(AgentKind::Gemini);
        assert_eq!(Provider::None.resolve(&config), AgentKind::Gemini);
        assert_eq!(Provider::Codex.resolve(&config), AgentKind::Codex);
        assert_eq!(Provider::None.resolve(&AssistConfig::default()), AgentKind::Codex);
    }

    #[test]
    fn override_wins_without_checking_the_filesystem() {
        let config =
            AssistConfig::default().with_binary(AgentKind::Gemini, "/nowhere/custom-gemini");
        assert_eq!(
            resolve_executable(AgentKind::Gemini, &config).unwrap(),
            PathBuf::from("/nowhere/custom-gemini")
        );
    }

    #[cfg(unix)]
    fn write_program(dir: &Path, name: &str, mode: u32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn executable_fallback_beats_search_path() {
        let home = tempfile::tempdir().unwrap();
        let path_dir = tempfile::tempdir().unwrap();
        let fallback = write_program(home.path(), "codex", 0o755);
        write_program(path_dir.path(), "codex", 0o755);

        let config = AssistConfig::default()
            .with_user_bin_dir(Some(home.path().to_path_buf()))
            .with_search_path(path_dir.path());
        assert_eq!(resolve_executable(AgentKind::Codex, &config).unwrap(), fallback);
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_fallback_is_skipped() {
        let home = tempfile::tempdir().unwrap();
        let path_dir = tempfile::tempdir().unwrap();
        write_program(home.path(), "gemini", 0o644);
        let on_path = write_program(path_dir.path(), "gemini", 0o755);

        let config = AssistConfig::default()
            .with_user_bin_dir(Some(home.path().to_path_buf()))
            .with_search_path(path_dir.path());
        assert_eq!(resolve_executable(AgentKind::Gemini, &config).unwrap(), on_path);
    }

    #[test]
    fn missing_everywhere_names_the_override_variable() {
        let empty = tempfile::tempdir().unwrap();
        let config = AssistConfig::default()
            .with_user_bin_dir(None)
            .with_search_path(empty.path());

        let err = resolve_executable(AgentKind::Codex, &config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot find codex executable (set LLM_ASSIST_CODEX_BIN)"
        );

        let err = resolve_executable(AgentKind::Gemini, &config).unwrap_err();
        assert!(matches!(
            err,
            AssistError::ExecutableNotFound { ref env_var, .. } if env_var == GEMINI_BIN_ENV
        ));
    }

    #[test]
    fn no_search_path_means_not_found() {
        let config = AssistConfig::default().with_user_bin_dir(None);
        assert!(matches!(
            resolve_executable(AgentKind::Codex, &config),
            Err(AssistError::ExecutableNotFound { .. })
        ));
    }

    #[test]
    fn backends_report_their_kind() {
        assert_eq!(AgentKind::Codex.backend().kind(), AgentKind::Codex);
        assert!(AgentKind::Codex.backend().uses_output_file());
        assert_eq!(AgentKind::Gemini.backend().kind(), AgentKind::Gemini);
        assert!(!AgentKind::Gemini.backend().uses_output_file());
    }
}
