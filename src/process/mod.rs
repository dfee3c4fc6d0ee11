//! Process runner: spawn an agent, optionally under a kill-after-N-seconds
//! guard, capture its output, and classify how it exited.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

use crate::config::{AssistConfig, TIMEOUT_ENV};
use crate::error::{AssistError, Diagnostic, Result};
use crate::provider::{self, AgentKind};

/// Exit code of the guard program when the time limit expired.
pub const TIMEOUT_EXIT_CODE: i32 = 124;
/// Exit code when the child (or the guard) was killed with SIGKILL.
pub const KILLED_EXIT_CODE: i32 = 137;

/// Signal the guard sends. It signals its own process group too, so the
/// guard itself usually dies from it.
const KILL_SIGNAL: i32 = 9;

const GUARD_PROGRAM: &str = "timeout";

/// Everything captured from one finished agent process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Terminating signal (Unix only).
    pub signal: Option<i32>,
    /// Whether the process ran under the timeout guard.
    pub guarded: bool,
}

impl ProcessOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, code: Option<i32>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            code,
            signal: None,
            guarded: false,
        }
    }

    /// Mark the output as coming from a guarded run.
    pub fn with_guard(mut self, guarded: bool) -> Self {
        self.guarded = guarded;
        self
    }

    fn from_std(output: std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
            signal: exit_signal(&output.status),
            guarded: false,
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Whether the exit status is one of the guard's timeout encodings:
    /// exit code 124 or 137, or death by `SIGKILL` under the guard.
    pub fn timed_out(&self) -> bool {
        matches!(self.code, Some(TIMEOUT_EXIT_CODE | KILLED_EXIT_CODE))
            || (self.guarded && self.code.is_none() && self.signal == Some(KILL_SIGNAL))
    }

    /// Human-readable exit status.
    pub fn status_text(&self) -> String {
        match (self.code, self.signal) {
            (Some(code), _) => format!("exit status {code}"),
            (None, Some(signal)) => format!("killed by signal {signal}"),
            (None, None) => "terminated abnormally".to_string(),
        }
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Spawns agents. One runner per completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRunner {
    timeout_secs: u64,
    use_guard: bool,
    search_path: Option<OsString>,
}

impl ProcessRunner {
    pub fn new(config: &AssistConfig) -> Self {
        Self {
            timeout_secs: config.timeout_secs(),
            use_guard: config.use_timeout_guard(),
            search_path: config.search_path().map(OsString::from),
        }
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// The guard program, if enabled and present on the search path.
    pub fn guard_program(&self) -> Option<PathBuf> {
        if !self.use_guard || cfg!(not(unix)) {
            return None;
        }
        provider::find_on_search_path(GUARD_PROGRAM, self.search_path.as_deref())
    }

    /// Prefix `argv` with `timeout --signal=KILL <N>s` when the guard exists.
    /// Without it the call simply runs unguarded. The flag says which.
    pub fn wrap_argv(&self, argv: Vec<OsString>) -> (Vec<OsString>, bool) {
        match self.guard_program() {
            Some(guard) => (guard_argv(guard, self.timeout_secs, argv), true),
            None => (argv, false),
        }
    }

    /// Run `argv` to completion with stdin closed, capturing all output.
    ///
    /// Only a spawn failure is an error here; use [`classify_exit`] on the
    /// returned output to judge the exit status.
    pub async fn run(&self, agent: AgentKind, argv: Vec<OsString>) -> Result<ProcessOutput> {
        let (argv, guarded) = self.wrap_argv(argv);
        let Some((program, args)) = argv.split_first() else {
            return Err(AssistError::Spawn {
                agent: agent.name().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty argv"),
            });
        };

        tracing::debug!(
            agent = agent.name(),
            args = args.len(),
            guarded,
            "spawning agent"
        );

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| AssistError::Spawn {
                agent: agent.name().to_string(),
                source,
            })?;

        let output = ProcessOutput::from_std(output).with_guard(guarded);
        tracing::debug!(
            agent = agent.name(),
            status = %output.status_text(),
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "agent exited"
        );
        Ok(output)
    }
}

fn guard_argv(guard: PathBuf, secs: u64, argv: Vec<OsString>) -> Vec<OsString> {
    let mut wrapped = Vec::with_capacity(argv.len() + 3);
    wrapped.push(guard.into_os_string());
    wrapped.push("--signal=KILL".into());
    wrapped.push(format!("{secs}s").into());
    wrapped.extend(argv);
    wrapped
}

/// Map a finished process to success, timeout, or failure.
pub fn classify_exit(agent: AgentKind, output: &ProcessOutput) -> Result<()> {
    if output.success() {
        return Ok(());
    }

    let status = output.status_text();
    tracing::warn!(agent = agent.name(), status = %status, "agent process failed");

    if output.timed_out() {
        return Err(AssistError::Timeout {
            agent: agent.name().to_string(),
            status,
            env_var: TIMEOUT_ENV.to_string(),
        });
    }

    Err(AssistError::ProcessFailed {
        agent: agent.name().to_string(),
        status,
        diagnostic: Diagnostic::from_output(&output.stdout, &output.stderr),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn guard_prefix_shape() {
        let argv = vec![OsString::from("codex"), OsString::from("exec")];
        let wrapped = guard_argv(PathBuf::from("/usr/bin/timeout"), 42, argv);
        assert_eq!(
            wrapped,
            vec![
                OsString::from("/usr/bin/timeout"),
                OsString::from("--signal=KILL"),
                OsString::from("42s"),
                OsString::from("codex"),
                OsString::from("exec"),
            ]
        );
    }

    #[test]
    fn disabled_guard_leaves_argv_alone() {
        let runner = ProcessRunner::new(&AssistConfig::default().with_timeout_guard(false));
        let argv = vec![OsString::from("gemini")];
        assert_eq!(runner.wrap_argv(argv.clone()), (argv, false));
    }

    #[test]
    fn guard_without_search_path_runs_unguarded() {
        let runner = ProcessRunner::new(&AssistConfig::default());
        assert_eq!(runner.guard_program(), None);
    }

    #[test]
    fn sigkill_under_the_guard_is_a_timeout() {
        let killed = ProcessOutput {
            signal: Some(9),
            ..ProcessOutput::new("", "", None)
        };

        let err = classify_exit(AgentKind::Codex, &killed.clone().with_guard(true)).unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "codex failed: killed by signal 9 (timed out; set LLM_ASSIST_TIMEOUT_SEC)"
        );

        let err = classify_exit(AgentKind::Codex, &killed).unwrap_err();
        assert!(!err.is_timeout());
        assert_eq!(err.to_string(), "codex failed: killed by signal 9");
    }

    #[test]
    fn timeout_codes_mention_the_variable() {
        for code in [TIMEOUT_EXIT_CODE, KILLED_EXIT_CODE] {
            let out = ProcessOutput::new("", "", Some(code));
            let err = classify_exit(AgentKind::Codex, &out).unwrap_err();
            assert!(err.is_timeout());
            assert!(err.to_string().contains(TIMEOUT_ENV), "{err}");
        }
    }

    #[test]
    fn failure_prefers_stderr_then_stdout() {
        let out = ProcessOutput::new("out", "err", Some(2));
        let err = classify_exit(AgentKind::Gemini, &out).unwrap_err();
        assert_eq!(err.to_string(), "gemini failed: exit status 2\n\nstderr:\nerr");

        let out = ProcessOutput::new("out", "", Some(2));
        let err = classify_exit(AgentKind::Gemini, &out).unwrap_err();
        assert_eq!(err.to_string(), "gemini failed: exit status 2\n\nstdout:\nout");

        let out = ProcessOutput::new("", "", Some(2));
        let err = classify_exit(AgentKind::Gemini, &out).unwrap_err();
        assert_eq!(err.to_string(), "gemini failed: exit status 2");
    }

    #[test]
    fn zero_exit_is_success() {
        assert!(classify_exit(AgentKind::Codex, &ProcessOutput::new("", "", Some(0))).is_ok());
    }
}
