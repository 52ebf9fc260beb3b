//! Two-phase grid generation
//!
//! Phase 1 asks for the 8 pillar titles; phase 2 asks, pillar by pillar, for
//! that pillar's 8 tasks. Task requests are issued strictly in sequence: the
//! next pillar's request starts only after the previous pillar's tasks have
//! all been emitted.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::events::GenerationEvent;
use super::list::{GenerationError, request_list};
use super::prompts::{PILLARS_SYSTEM, TASKS_SYSTEM, pillars_prompt, tasks_prompt};
use crate::config::GenerationConfig;
use crate::domain::{GenerationState, Grid, PILLAR_COUNT, TASKS_PER_PILLAR};
use crate::llm::LlmClient;

/// Event channel capacity; one full run emits 74 events
pub const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Why a run stopped early
enum Halt {
    Cancelled,
    Failed(GenerationError),
}

/// Runs generation against an injected LLM client
pub struct Pipeline {
    client: Arc<dyn LlmClient>,
    config: GenerationConfig,
}

impl Pipeline {
    pub fn new(client: Arc<dyn LlmClient>, config: GenerationConfig) -> Self {
        debug!(?config, "Pipeline::new: called");
        Self { client, config }
    }

    /// Run one generation for `goal`, sending events in order
    ///
    /// Fails only when the goal is rejected up front; request failures are
    /// reported as an `Error` event and an error state. A cancelled run (or a
    /// dropped receiver) stops silently with state `Cancelled`.
    pub async fn run(
        &self,
        goal: &str,
        events: mpsc::Sender<GenerationEvent>,
        cancel: CancellationToken,
    ) -> Result<GenerationState, GenerationError> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(GenerationError::Validation("Goal must not be empty".to_string()));
        }

        info!(%goal, "Pipeline::run: starting generation");
        let mut state = GenerationState::new();
        state.start();

        match self.run_phases(goal, &events, &cancel, &mut state).await {
            Ok(()) => {
                info!("Pipeline::run: completed");
                state.complete();
            }
            Err(Halt::Cancelled) => {
                info!(status = ?state.status, "Pipeline::run: cancelled");
                state.cancel();
            }
            Err(Halt::Failed(err)) => {
                let message = err.to_string();
                warn!(%message, status = ?state.status, "Pipeline::run: generation failed");
                state.fail(message.clone());
                let _ = events.send(GenerationEvent::Error { message }).await;
            }
        }

        Ok(state)
    }

    /// Run generation and write every event into `grid` as it arrives
    ///
    /// `on_event` sees each event after it has been applied.
    pub async fn generate_into<F>(
        &self,
        grid: &mut Grid,
        cancel: CancellationToken,
        mut on_event: F,
    ) -> Result<GenerationState, GenerationError>
    where
        F: FnMut(&GenerationEvent, &Grid),
    {
        let goal = grid.goal.clone();
        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let consume = async {
            while let Some(event) = rx.recv().await {
                if let Err(e) = grid.apply(&event) {
                    warn!(error = %e, event = event.event_type(), "generate_into: event did not apply");
                }
                on_event(&event, grid);
            }
        };

        let (result, ()) = tokio::join!(self.run(&goal, tx, cancel), consume);
        result
    }

    async fn run_phases(
        &self,
        goal: &str,
        events: &mpsc::Sender<GenerationEvent>,
        cancel: &CancellationToken,
        state: &mut GenerationState,
    ) -> Result<(), Halt> {
        let pillars = self
            .request(cancel, PILLARS_SYSTEM, &pillars_prompt(goal), PILLAR_COUNT)
            .await?;

        for (pillar, title) in pillars.iter().enumerate() {
            let event = GenerationEvent::PillarReady {
                pillar,
                title: title.clone(),
            };
            self.emit(events, cancel, self.config.pillar_delay(), event).await?;
            state.pillar_emitted(pillar);
        }

        for (pillar, title) in pillars.iter().enumerate() {
            state.begin_tasks(pillar);
            debug!(pillar, %title, "run_phases: requesting tasks");

            let tasks = self
                .request(cancel, TASKS_SYSTEM, &tasks_prompt(goal, title), TASKS_PER_PILLAR)
                .await?;

            for (task, text) in tasks.into_iter().enumerate() {
                let event = GenerationEvent::TaskReady { pillar, task, text };
                self.emit(events, cancel, self.config.task_delay(), event).await?;
                state.task_emitted(pillar, task);
            }
        }

        self.emit(events, cancel, Duration::ZERO, GenerationEvent::Done).await
    }

    /// One list request, abandoned if the run is cancelled first
    async fn request(
        &self,
        cancel: &CancellationToken,
        system: &str,
        user: &str,
        expected: usize,
    ) -> Result<Vec<String>, Halt> {
        if cancel.is_cancelled() {
            return Err(Halt::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Halt::Cancelled),
            result = request_list(&self.client, system, user, self.config.max_tokens, expected) => {
                result.map_err(Halt::Failed)
            }
        }
    }

    /// Wait out the pacing delay, then send unless cancelled
    async fn emit(
        &self,
        events: &mpsc::Sender<GenerationEvent>,
        cancel: &CancellationToken,
        delay: Duration,
        event: GenerationEvent,
    ) -> Result<(), Halt> {
        if !delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Halt::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if cancel.is_cancelled() {
            return Err(Halt::Cancelled);
        }

        events.send(event).await.map_err(|_| {
            debug!("emit: receiver dropped, stopping run");
            Halt::Cancelled
        })
    }
}
