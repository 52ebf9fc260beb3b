//! Generation progress state machine
//!
//! `Idle -> GeneratingPillars -> GeneratingTasks -> Completed`, with `Error`
//! and `Cancelled` reachable from either generating state. Terminal states
//! stay put until the next run starts over.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::grid::PILLAR_COUNT;

/// Where a generation run is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum GenerationStatus {
    /// No run started
    Idle,
    /// Waiting for or emitting pillar titles
    GeneratingPillars,
    /// Generating tasks for `pillar`; `task` is the last emitted task, if any
    GeneratingTasks { pillar: usize, task: Option<usize> },
    /// All 64 tasks emitted
    Completed,
    /// Run aborted by a failed request or unparseable response
    Error { message: String },
    /// Run stopped by its cancellation token
    Cancelled,
}

/// Progress of one generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationState {
    pub status: GenerationStatus,
    /// Index of the most recently emitted pillar title
    pub last_pillar: Option<usize>,
}

impl Default for GenerationState {
    fn default() -> Self {
        Self {
            status: GenerationStatus::Idle,
            last_pillar: None,
        }
    }
}

impl GenerationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a run, whatever the previous state was
    pub fn start(&mut self) {
        debug!(from = ?self.status, "GenerationState::start: called");
        self.status = GenerationStatus::GeneratingPillars;
        self.last_pillar = None;
    }

    /// A pillar title was emitted
    pub fn pillar_emitted(&mut self, pillar: usize) {
        if self.status == GenerationStatus::GeneratingPillars {
            self.last_pillar = Some(pillar);
        }
    }

    /// Task generation for `pillar` is starting
    pub fn begin_tasks(&mut self, pillar: usize) {
        if self.is_active() {
            self.status = GenerationStatus::GeneratingTasks { pillar, task: None };
        }
    }

    /// A task was emitted
    pub fn task_emitted(&mut self, pillar: usize, task: usize) {
        if self.is_active() {
            self.status = GenerationStatus::GeneratingTasks {
                pillar,
                task: Some(task),
            };
        }
    }

    pub fn complete(&mut self) {
        if self.is_active() {
            self.status = GenerationStatus::Completed;
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        if self.is_active() {
            self.status = GenerationStatus::Error {
                message: message.into(),
            };
        }
    }

    pub fn cancel(&mut self) {
        if self.is_active() {
            self.status = GenerationStatus::Cancelled;
        }
    }

    /// Still generating
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            GenerationStatus::GeneratingPillars | GenerationStatus::GeneratingTasks { .. }
        )
    }

    pub fn is_completed(&self) -> bool {
        self.status == GenerationStatus::Completed
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            GenerationStatus::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Inline status message for the current phase
    pub fn status_line(&self) -> String {
        match &self.status {
            GenerationStatus::Idle => "Enter a goal to generate your grid".to_string(),
            GenerationStatus::GeneratingPillars => {
                format!("Generating your {} supporting pillars...", PILLAR_COUNT)
            }
            GenerationStatus::GeneratingTasks { pillar, .. } => {
                format!(
                    "Creating actionable tasks for pillar {}/{}...",
                    pillar + 1,
                    PILLAR_COUNT
                )
            }
            GenerationStatus::Completed => "Your Harada grid is ready".to_string(),
            GenerationStatus::Error { message } => format!("Generation failed: {}", message),
            GenerationStatus::Cancelled => "Generation cancelled".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut state = GenerationState::new();
        assert_eq!(state.status, GenerationStatus::Idle);
        assert!(!state.is_active());

        state.start();
        assert_eq!(state.status, GenerationStatus::GeneratingPillars);
        state.pillar_emitted(0);
        state.pillar_emitted(7);
        assert_eq!(state.last_pillar, Some(7));

        state.begin_tasks(0);
        assert_eq!(state.status, GenerationStatus::GeneratingTasks { pillar: 0, task: None });
        state.task_emitted(0, 0);
        assert_eq!(
            state.status,
            GenerationStatus::GeneratingTasks {
                pillar: 0,
                task: Some(0)
            }
        );

        state.complete();
        assert!(state.is_completed());
    }

    #[test]
    fn test_error_is_terminal() {
        let mut state = GenerationState::new();
        state.start();
        state.fail("boom");
        assert_eq!(state.error(), Some("boom"));

        state.begin_tasks(1);
        state.complete();
        state.cancel();
        assert_eq!(state.error(), Some("boom"));
    }

    #[test]
    fn test_idle_cannot_fail_or_complete() {
        let mut state = GenerationState::new();
        state.fail("boom");
        state.complete();
        assert_eq!(state.status, GenerationStatus::Idle);
    }

    #[test]
    fn test_restart_after_terminal_state() {
        let mut state = GenerationState::new();
        state.start();
        state.cancel();
        assert_eq!(state.status, GenerationStatus::Cancelled);

        state.start();
        assert_eq!(state.status, GenerationStatus::GeneratingPillars);
        assert_eq!(state.last_pillar, None);
    }

    #[test]
    fn test_status_lines() {
        let mut state = GenerationState::new();
        state.start();
        assert_eq!(state.status_line(), "Generating your 8 supporting pillars...");
        state.begin_tasks(2);
        assert_eq!(state.status_line(), "Creating actionable tasks for pillar 3/8...");
        state.fail("API error 401: bad key");
        assert_eq!(state.status_line(), "Generation failed: API error 401: bad key");
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_value(GenerationStatus::GeneratingTasks {
            pillar: 1,
            task: Some(2),
        })
        .unwrap();
        assert_eq!(json["status"], "generating-tasks");
        assert_eq!(json["pillar"], 1);
    }
}
