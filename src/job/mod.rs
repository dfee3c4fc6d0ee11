//! Running asks off the UI thread and handing results back.
//!
//! The UI side owns an [`AssistantSurface`] inside a [`UiLoop`]. Asking goes
//! through a [`JobBridge`], which freezes the session context, marks the
//! surface busy, and starts a worker task. The worker owns everything it
//! needs and reports back exactly once through a [`JobTicket`]. The UI loop
//! applies the result only if the surface that started the job is still the
//! current one and still waiting on that job.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::completion::CompletionRequest;
use crate::context::{build_prompt, ContextSnapshot, ContextToggles, SessionContext};
use crate::error::{AssistError, Result};
use crate::protocol::{ProtocolEngine, RunOutcome, RunStatus};
use crate::provider::Provider;

/// Status text shown while a job is in flight.
pub const WORKING_STATUS: &str = "Working...";

pub type SurfaceId = Uuid;
pub type JobId = Uuid;

/// UI-owned assistant state. Only the UI loop mutates it.
#[derive(Debug, Clone)]
pub struct AssistantSurface {
    id: SurfaceId,
    busy: bool,
    status: String,
    pending_job: Option<JobId>,
    last_reply: Option<String>,
    last_insert: Option<String>,
    last_status: Option<RunStatus>,
    pub provider: Provider,
    pub toggles: ContextToggles,
    pub tools_enabled: bool,
}

impl AssistantSurface {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            busy: false,
            status: String::new(),
            pending_job: None,
            last_reply: None,
            last_insert: None,
            last_status: None,
            provider: Provider::None,
            toggles: ContextToggles::default(),
            tools_enabled: true,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn pending_job(&self) -> Option<JobId> {
        self.pending_job
    }

    /// Text for the reply view.
    pub fn reply(&self) -> Option<&str> {
        self.last_reply.as_deref()
    }

    /// Status of the last applied job.
    pub fn last_status(&self) -> Option<RunStatus> {
        self.last_status
    }

    /// What "insert" offers: the proposed script, or else the whole reply.
    /// The host must confirm with the user first.
    pub fn insertable_text(&self) -> Option<&str> {
        self.last_insert
            .as_deref()
            .filter(|text| !text.is_empty())
            .or_else(|| self.reply())
            .filter(|text| !text.is_empty())
    }

    /// What "copy" puts on the clipboard.
    pub fn copyable_text(&self) -> Option<&str> {
        self.reply()
    }

    fn start_job(&mut self, job_id: JobId) {
        self.busy = true;
        self.status = WORKING_STATUS.to_string();
        self.pending_job = Some(job_id);
    }

    fn finish_job(&mut self, outcome: RunOutcome) {
        self.busy = false;
        self.status.clear();
        self.pending_job = None;
        self.last_status = Some(outcome.status);
        self.last_reply = Some(outcome.display);
        self.last_insert = outcome.insert_text;
    }
}

impl Default for AssistantSurface {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable result posted by a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutcome {
    pub job_id: JobId,
    pub surface_id: SurfaceId,
    pub outcome: RunOutcome,
    pub finished_at: DateTime<Utc>,
}

/// Events delivered to the UI loop.
#[derive(Debug, Clone)]
pub enum UiEvent {
    JobFinished(JobOutcome),
}

/// Single-use right to post one job's result.
#[derive(Debug)]
pub struct JobTicket {
    job_id: JobId,
    surface_id: SurfaceId,
    events: mpsc::UnboundedSender<UiEvent>,
}

impl JobTicket {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Hand the result to the UI loop. Returns false if the loop is gone.
    pub fn post(self, outcome: RunOutcome) -> bool {
        let event = UiEvent::JobFinished(JobOutcome {
            job_id: self.job_id,
            surface_id: self.surface_id,
            outcome,
            finished_at: Utc::now(),
        });
        self.events.send(event).is_ok()
    }
}

/// Starts workers for asks.
#[derive(Debug, Clone)]
pub struct JobBridge {
    engine: Arc<ProtocolEngine>,
    runtime: Handle,
    events: mpsc::UnboundedSender<UiEvent>,
}

impl JobBridge {
    /// Create a bridge and the UI loop it reports to. Workers run on
    /// `runtime`.
    pub fn new(engine: Arc<ProtocolEngine>, runtime: Handle) -> (Self, UiLoop) {
        let (events, rx) = mpsc::unbounded_channel();
        let bridge = Self {
            engine,
            runtime,
            events,
        };
        (bridge, UiLoop::new(rx))
    }

    /// Like [`JobBridge::new`], on the runtime of the calling context.
    pub fn from_current(engine: Arc<ProtocolEngine>) -> Result<(Self, UiLoop)> {
        let runtime = Handle::try_current()
            .map_err(|err| AssistError::Worker(format!("no async runtime: {err}")))?;
        Ok(Self::new(engine, runtime))
    }

    /// Start a job for `surface`.
    ///
    /// Rejects an empty prompt and a surface that already has a job in
    /// flight. The context is read here, once, before the worker starts.
    pub fn ask(
        &self,
        surface: &mut AssistantSurface,
        prompt: &str,
        ctx: &dyn SessionContext,
    ) -> Result<JobId> {
        if surface.is_busy() {
            return Err(AssistError::Busy);
        }
        if prompt.is_empty() {
            return Err(AssistError::EmptyPrompt);
        }

        let snapshot = ContextSnapshot::capture(ctx);
        let request = CompletionRequest::builder()
            .provider(surface.provider)
            .prompt(build_prompt(prompt, surface.toggles, surface.tools_enabled, ctx))
            .tools_enabled(surface.tools_enabled)
            .build();

        let job_id = Uuid::new_v4();
        surface.start_job(job_id);

        let ticket = JobTicket {
            job_id,
            surface_id: surface.id(),
            events: self.events.clone(),
        };
        tracing::debug!(
            job_id = %job_id,
            surface_id = %surface.id(),
            tools = request.tools_enabled,
            prompt_bytes = request.prompt.len(),
            "starting job"
        );

        let engine = Arc::clone(&self.engine);
        let runtime = self.runtime.clone();
        self.runtime.spawn(async move {
            let worker = runtime.spawn(async move { engine.run(&request, &snapshot).await });
            let outcome = match worker.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    let reason = if err.is_panic() {
                        "worker panicked"
                    } else {
                        "worker was cancelled"
                    };
                    RunOutcome::failed(AssistError::Worker(reason.to_string()).to_string(), 0)
                }
            };
            if !ticket.post(outcome) {
                tracing::debug!(job_id = %job_id, "ui loop gone, dropping job result");
            }
        });

        Ok(job_id)
    }
}

/// What the UI loop did with a posted result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    Applied(JobId),
    /// The surface was closed or replaced; UI state was left untouched.
    Discarded(JobId),
}

/// UI-side owner of the surface and receiver of job results.
#[derive(Debug)]
pub struct UiLoop {
    surface: Option<AssistantSurface>,
    events: mpsc::UnboundedReceiver<UiEvent>,
}

impl UiLoop {
    fn new(events: mpsc::UnboundedReceiver<UiEvent>) -> Self {
        Self {
            surface: None,
            events,
        }
    }

    /// The open surface, creating one if needed.
    pub fn open_surface(&mut self) -> &mut AssistantSurface {
        self.surface.get_or_insert_with(AssistantSurface::new)
    }

    /// Close the surface. Results of its in-flight job will be discarded.
    pub fn close_surface(&mut self) -> Option<AssistantSurface> {
        self.surface.take()
    }

    pub fn surface(&self) -> Option<&AssistantSurface> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut AssistantSurface> {
        self.surface.as_mut()
    }

    /// Ask on the open surface (opening one if needed).
    pub fn ask(
        &mut self,
        bridge: &JobBridge,
        prompt: &str,
        ctx: &dyn SessionContext,
    ) -> Result<JobId> {
        bridge.ask(self.open_surface(), prompt, ctx)
    }

    pub fn handle(&mut self, event: UiEvent) -> Handoff {
        match event {
            UiEvent::JobFinished(result) => self.apply(result),
        }
    }

    /// Apply a job result if its surface is still current and waiting on it.
    pub fn apply(&mut self, result: JobOutcome) -> Handoff {
        let job_id = result.job_id;
        let surface = self
            .surface
            .as_mut()
            .filter(|s| s.id() == result.surface_id && s.pending_job() == Some(job_id));

        let Some(surface) = surface else {
            tracing::warn!(
                job_id = %job_id,
                surface_id = %result.surface_id,
                "discarding result for a surface that is gone"
            );
            return Handoff::Discarded(job_id);
        };

        tracing::info!(
            job_id = %job_id,
            rounds = result.outcome.rounds,
            status = %result.outcome.status,
            "job finished"
        );
        surface.finish_job(result.outcome);
        Handoff::Applied(job_id)
    }

    /// Apply every result already posted, without waiting.
    pub fn drain_pending(&mut self) -> Vec<Handoff> {
        let mut handled = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            handled.push(self.handle(event));
        }
        handled
    }

    /// Wait for the next result and apply it. `None` once every bridge is
    /// dropped and the queue is empty.
    pub async fn next(&mut self) -> Option<Handoff> {
        let event = self.events.recv().await?;
        Some(self.handle(event))
    }
}
