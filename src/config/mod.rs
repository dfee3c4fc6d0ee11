//! Configuration (layered: code > env > `.env` file).

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::extract::scan;
use crate::provider::{AgentKind, Provider};

/// Provider selector: `codex`, `gemini` or `none`.
pub const PROVIDER_ENV: &str = "LLM_ASSIST_PROVIDER";
/// Binary override for the codex agent.
pub const CODEX_BIN_ENV: &str = "LLM_ASSIST_CODEX_BIN";
/// Binary override for the gemini agent.
pub const GEMINI_BIN_ENV: &str = "LLM_ASSIST_GEMINI_BIN";
/// Seconds before the guard program kills an agent.
pub const TIMEOUT_ENV: &str = "LLM_ASSIST_TIMEOUT_SEC";
/// Danger-mode toggles, codex only.
pub const UNSAFE_ENV: &str = "LLM_ASSIST_UNSAFE";
pub const CODEX_DANGEROUS_ENV: &str = "LLM_ASSIST_CODEX_DANGEROUS";
/// Directories searched for agents and the guard program.
pub const PATH_ENV: &str = "PATH";

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const MIN_TIMEOUT_SECS: u64 = 1;
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Global default config (lazy-initialized from env).
static DEFAULT_CONFIG: OnceLock<AssistConfig> = OnceLock::new();

/// Configuration for the completion core.
///
/// Nothing here is a credential: the external agents own their own login
/// state, this crate only decides which binary to launch and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistConfig {
    default_agent: AgentKind,
    codex_bin: Option<PathBuf>,
    gemini_bin: Option<PathBuf>,
    timeout_secs: u64,
    codex_dangerous: bool,
    use_timeout_guard: bool,
    search_path: Option<OsString>,
    user_bin_dir: Option<PathBuf>,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            default_agent: AgentKind::Codex,
            codex_bin: None,
            gemini_bin: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            codex_dangerous: false,
            use_timeout_guard: true,
            search_path: None,
            user_bin_dir: default_user_bin_dir(),
        }
    }
}

impl AssistConfig {
    /// Load from environment variables (after reading `.env` if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let default_agent = match non_empty(PROVIDER_ENV) {
            Some(raw) => match raw.trim().parse::<Provider>() {
                Ok(provider) => provider.agent().unwrap_or(AgentKind::Codex),
                Err(_) => {
                    tracing::warn!(
                        var = PROVIDER_ENV,
                        value = %raw,
                        "unknown provider selector, falling back to codex"
                    );
                    AgentKind::Codex
                }
            },
            None => AgentKind::Codex,
        };

        Self {
            default_agent,
            codex_bin: non_empty(CODEX_BIN_ENV).map(PathBuf::from),
            gemini_bin: non_empty(GEMINI_BIN_ENV).map(PathBuf::from),
            timeout_secs: parse_timeout_secs(lookup(TIMEOUT_ENV).as_deref()),
            codex_dangerous: is_toggle_set(lookup(UNSAFE_ENV).as_deref())
                || is_toggle_set(lookup(CODEX_DANGEROUS_ENV).as_deref()),
            use_timeout_guard: true,
            search_path: non_empty(PATH_ENV).map(OsString::from),
            user_bin_dir: default_user_bin_dir(),
        }
    }

    /// Get (or create) the global default config.
    pub fn global() -> &'static AssistConfig {
        DEFAULT_CONFIG.get_or_init(Self::from_env)
    }

    pub fn with_default_agent(mut self, agent: AgentKind) -> Self {
        self.default_agent = agent;
        self
    }

    pub fn with_binary(mut self, agent: AgentKind, path: impl Into<PathBuf>) -> Self {
        match agent {
            AgentKind::Codex => self.codex_bin = Some(path.into()),
            AgentKind::Gemini => self.gemini_bin = Some(path.into()),
        }
        self
    }

    /// Set the guard timeout, clamped to `[1, 3600]` seconds.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);
        self
    }

    pub fn with_codex_dangerous(mut self, dangerous: bool) -> Self {
        self.codex_dangerous = dangerous;
        self
    }

    /// Disable wrapping agents in the external `timeout` program.
    pub fn with_timeout_guard(mut self, enabled: bool) -> Self {
        self.use_timeout_guard = enabled;
        self
    }

    /// Replace the `PATH`-style list searched for executables.
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Replace the per-user install directory checked before the search path.
    pub fn with_user_bin_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.user_bin_dir = dir;
        self
    }

    /// Agent used when the caller selects [`Provider::None`].
    pub fn default_agent(&self) -> AgentKind {
        self.default_agent
    }

    /// Explicit binary override for an agent, if one was configured.
    pub fn binary_override(&self, agent: AgentKind) -> Option<&PathBuf> {
        match agent {
            AgentKind::Codex => self.codex_bin.as_ref(),
            AgentKind::Gemini => self.gemini_bin.as_ref(),
        }
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn codex_dangerous(&self) -> bool {
        self.codex_dangerous
    }

    pub fn use_timeout_guard(&self) -> bool {
        self.use_timeout_guard
    }

    pub fn search_path(&self) -> Option<&OsStr> {
        self.search_path.as_deref()
    }

    pub fn user_bin_dir(&self) -> Option<&Path> {
        self.user_bin_dir.as_deref()
    }
}

/// Parse the guard timeout like `strtol`: a leading integer is used and
/// trailing text ignored (`"45s"` is 45). Values are clamped into range;
/// text without a leading number falls back to the default.
pub fn parse_timeout_secs(raw: Option<&str>) -> u64 {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return DEFAULT_TIMEOUT_SECS;
    };

    match scan::read_int(raw, 0) {
        Some(value) => value.clamp(MIN_TIMEOUT_SECS as i64, MAX_TIMEOUT_SECS as i64) as u64,
        None => {
            tracing::warn!(var = TIMEOUT_ENV, value = %raw, "ignoring non-numeric timeout");
            DEFAULT_TIMEOUT_SECS
        }
    }
}

/// `~/.local/bin` or the platform equivalent.
fn default_user_bin_dir() -> Option<PathBuf> {
    let base = directories::BaseDirs::new()?;
    Some(
        base.executable_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| base.home_dir().join(".local").join("bin")),
    )
}

/// Boolean-ish toggle: any non-empty value other than `0`.
fn is_toggle_set(raw: Option<&str>) -> bool {
    matches!(raw, Some(value) if !value.is_empty() && value != "0")
}
