//! agent-assist: completions from locally installed LLM agent CLIs.
//!
//! Spawns an agent executable (Codex or Gemini) for each completion, pulls
//! the reply out of its output, and runs a bounded two-round tool protocol
//! so the model can ask for session context it was not given up front.
//!
//! # Quick Start
//!
//! ```no_run
//! use agent_assist::prelude::*;
//!
//! # async fn example() -> agent_assist::error::Result<()> {
//! let service = CompletionService::from_env();
//! let reply = service.complete(Provider::Codex, "Reply with exactly: pong").await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

pub mod completion;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod job;
pub mod prelude;
pub mod process;
pub mod protocol;
pub mod provider;
pub mod tools;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
