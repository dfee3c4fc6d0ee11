//! Tool protocol engine.

pub mod engine;
pub mod types;

pub use engine::{round_two_prompt, ProtocolEngine, MAX_ROUNDS};
pub use types::{Phase, RunOutcome, RunStatus, EMPTY_REPLY_ERROR, FALLBACK_ERROR};
