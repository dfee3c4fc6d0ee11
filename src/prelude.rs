//! Convenience re-exports for common use.

pub use crate::completion::{Completer, CompletionRequest, CompletionService};
pub use crate::config::AssistConfig;
pub use crate::context::{ContextSnapshot, ContextToggles, SessionContext, StaticContext};
pub use crate::error::{AssistError, Result};
pub use crate::job::{AssistantSurface, Handoff, JobBridge, UiLoop};
pub use crate::protocol::{ProtocolEngine, RunOutcome, RunStatus};
pub use crate::provider::{AgentKind, Provider};
