//! Events produced by a generation run

use serde::{Deserialize, Serialize};

/// One step of a generation run, delivered in strict order
///
/// All 8 `PillarReady` events arrive first (index order), then 8 `TaskReady`
/// per pillar, pillar by pillar. A run ends with exactly one `Done` or one
/// `Error`, or with no terminal event when cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationEvent {
    PillarReady { pillar: usize, title: String },
    TaskReady { pillar: usize, task: usize, text: String },
    Error { message: String },
    Done,
}

impl GenerationEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            GenerationEvent::PillarReady { .. } => "pillar_ready",
            GenerationEvent::TaskReady { .. } => "task_ready",
            GenerationEvent::Error { .. } => "error",
            GenerationEvent::Done => "done",
        }
    }

    /// Ends the run
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationEvent::Error { .. } | GenerationEvent::Done)
    }
}
