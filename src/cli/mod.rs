//! CLI entry point for agent-assist.
//!
//! A headless host: session context comes from files and flags instead of a
//! live application.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::context::{ContextToggles, DatasetInfo, ScriptBuffer, StaticContext};

/// Ask a locally installed LLM agent for help
#[derive(Parser, Debug)]
#[command(name = "agent-assist", version, about = "Completions from local LLM agents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full ask (prompt, context, optional tool round) and print the reply
    Ask(AskArgs),
    /// Run one raw completion and print the agent's reply
    Complete(CompleteArgs),
}

/// Arguments for `agent-assist ask`.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// Agent to use (codex, gemini, none)
    #[arg(short, long, default_value = "none")]
    pub provider: String,

    /// Do not let the model request context
    #[arg(long)]
    pub no_tools: bool,

    /// Inline the dataset summary
    #[arg(long)]
    pub include_dataset: bool,

    /// Inline the last error message
    #[arg(long)]
    pub include_error: bool,

    /// Inline the script (selection if given, else full text)
    #[arg(long)]
    pub include_script: bool,

    /// Dataset description as JSON (nobs, nvars, pd, sample_start, sample_end, var_names)
    #[arg(long, value_name = "FILE")]
    pub dataset_file: Option<PathBuf>,

    /// Last error message
    #[arg(long, value_name = "TEXT")]
    pub error: Option<String>,

    /// Last warning message, used when there is no error
    #[arg(long, value_name = "TEXT")]
    pub warning: Option<String>,

    /// Script editor contents
    #[arg(long, value_name = "FILE")]
    pub script_file: Option<PathBuf>,

    /// Selected part of the script
    #[arg(long, value_name = "FILE")]
    pub selection_file: Option<PathBuf>,

    /// Command log
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Last model summary, short form
    #[arg(long, value_name = "FILE")]
    pub model_file: Option<PathBuf>,

    /// Last model summary, full form
    #[arg(long, value_name = "FILE")]
    pub model_full_file: Option<PathBuf>,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,

    /// User prompt (positional)
    pub prompt: String,
}

impl AskArgs {
    pub fn toggles(&self) -> ContextToggles {
        ContextToggles {
            dataset: self.include_dataset,
            last_error: self.include_error,
            script: self.include_script,
        }
    }

    /// Build the session context from the given files and flags.
    pub fn load_context(&self) -> Result<StaticContext, Box<dyn std::error::Error>> {
        let dataset = match &self.dataset_file {
            Some(path) => Some(serde_json::from_str::<DatasetInfo>(&read(path)?)?),
            None => None,
        };

        let selection = self.selection_file.as_deref().map(read).transpose()?;
        let script = match self.script_file.as_deref().map(read).transpose()? {
            Some(text) => Some(ScriptBuffer { text, selection }),
            None => selection.map(|selection| ScriptBuffer {
                text: selection.clone(),
                selection: Some(selection),
            }),
        };

        Ok(StaticContext {
            dataset,
            last_error: self.error.clone(),
            last_warning: self.warning.clone(),
            script,
            command_log: self.log_file.as_deref().map(read).transpose()?,
            model_simple: self.model_file.as_deref().map(read).transpose()?,
            model_full: self.model_full_file.as_deref().map(read).transpose()?,
        })
    }
}

fn read(path: &Path) -> Result<String, std::io::Error> {
    std::fs::read_to_string(path)
        .map_err(|err| std::io::Error::new(err.kind(), format!("{}: {err}", path.display())))
}

/// Arguments for `agent-assist complete`.
#[derive(Args, Debug)]
pub struct CompleteArgs {
    /// Agent to use (codex, gemini, none)
    #[arg(short, long, default_value = "none")]
    pub provider: String,

    /// Prompt sent verbatim
    pub prompt: String,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_ask_with_defaults() {
        let cli = Cli::try_parse_from(["agent-assist", "ask", "why?"]).unwrap();
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.provider, "none");
                assert!(!args.no_tools);
                assert!(!args.json);
                assert_eq!(args.toggles(), ContextToggles::default());
                assert_eq!(args.prompt, "why?");
            }
            other => panic!("expected Ask, got {other:?}"),
        }
    }

    #[test]
    fn parse_ask_with_context_flags() {
        let cli = Cli::try_parse_from([
            "agent-assist",
            "ask",
            "-p",
            "gemini",
            "--no-tools",
            "--include-error",
            "--include-script",
            "--error",
            "missing series",
            "fix it",
        ])
        .unwrap();
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.provider, "gemini");
                assert!(args.no_tools);
                assert_eq!(
                    args.toggles(),
                    ContextToggles {
                        dataset: false,
                        last_error: true,
                        script: true,
                    }
                );
                assert_eq!(args.error.as_deref(), Some("missing series"));
            }
            other => panic!("expected Ask, got {other:?}"),
        }
    }

    #[test]
    fn parse_complete() {
        let cli = Cli::try_parse_from(["agent-assist", "complete", "-p", "codex", "ping"]).unwrap();
        match cli.command {
            Commands::Complete(args) => {
                assert_eq!(args.provider, "codex");
                assert_eq!(args.prompt, "ping");
            }
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn load_context_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("script.inp");
        let log = dir.path().join("session.log");
        let dataset = dir.path().join("dataset.json");
        std::fs::write(&script, "ols y 0 x\n").unwrap();
        std::fs::write(&log, "a\nb\n").unwrap();
        std::fs::write(
            &dataset,
            concat!(
                r#"{"nobs":10,"nvars":2,"pd":1,"sample_start":"1","sample_end":"10","#,
                r#""var_names":["const","y"]}"#,
            ),
        )
        .unwrap();

        let argv: Vec<std::ffi::OsString> = vec![
            "agent-assist".into(),
            "ask".into(),
            "--script-file".into(),
            script.into_os_string(),
            "--log-file".into(),
            log.into_os_string(),
            "--dataset-file".into(),
            dataset.into_os_string(),
            "hi".into(),
        ];
        let cli = Cli::try_parse_from(argv).unwrap();
        let Commands::Ask(args) = cli.command else {
            panic!("expected Ask");
        };

        let ctx = args.load_context().unwrap();
        assert_eq!(ctx.script.unwrap().text, "ols y 0 x\n");
        assert_eq!(ctx.command_log.as_deref(), Some("a\nb\n"));
        assert_eq!(ctx.dataset.unwrap().nvars, 2);
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["agent-assist"]).is_err());
    }

    #[test]
    fn parse_missing_prompt_is_error() {
        assert!(Cli::try_parse_from(["agent-assist", "ask"]).is_err());
    }
}
