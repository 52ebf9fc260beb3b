//! The Harada grid document: one goal, 8 pillars, 8 tasks per pillar

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::edit::EditOutcome;
use crate::generation::GenerationEvent;

/// Number of pillars around the goal
pub const PILLAR_COUNT: usize = 8;

/// Number of tasks around each pillar
pub const TASKS_PER_PILLAR: usize = 8;

/// Errors from grid mutation and validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("Goal must not be empty")]
    EmptyGoal,

    #[error("No such cell: {0}")]
    SlotOutOfRange(Slot),

    #[error("Malformed grid: {0}")]
    Shape(String),
}

/// A writable cell, addressed by position rather than content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// A pillar title
    Pillar(usize),
    /// One task of a pillar
    Task { pillar: usize, task: usize },
}

impl Slot {
    pub fn pillar(&self) -> usize {
        match self {
            Slot::Pillar(p) => *p,
            Slot::Task { pillar, .. } => *pillar,
        }
    }

    fn in_range(&self) -> bool {
        match self {
            Slot::Pillar(p) => *p < PILLAR_COUNT,
            Slot::Task { pillar, task } => *pillar < PILLAR_COUNT && *task < TASKS_PER_PILLAR,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-based, as shown to users
        match self {
            Slot::Pillar(p) => write!(f, "pillar {}", p + 1),
            Slot::Task { pillar, task } => write!(f, "pillar {} task {}", pillar + 1, task + 1),
        }
    }
}

/// One of the 8 supporting categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pillar {
    /// Stable slot identifier, `pillar-<index>`
    pub id: String,
    pub title: String,
    pub tasks: Vec<String>,
}

impl Pillar {
    /// An untitled pillar with empty task slots
    pub fn empty(index: usize) -> Self {
        Self {
            id: pillar_id(index),
            title: String::new(),
            tasks: vec![String::new(); TASKS_PER_PILLAR],
        }
    }

    /// Number of non-empty tasks
    pub fn filled_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| !t.trim().is_empty()).count()
    }
}

/// Slot identifier for the pillar at `index`
pub fn pillar_id(index: usize) -> String {
    format!("pillar-{}", index)
}

/// The grid document
///
/// Serialized field names match the JSON exchange format
/// (`goal`, `pillars`, `createdAt`, `updatedAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub goal: String,
    pub pillars: Vec<Pillar>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Grid {
    /// Fresh grid for `goal` with every pillar and task slot empty
    pub fn new(goal: &str) -> Result<Self, GridError> {
        let goal = goal.trim();
        debug!(%goal, "Grid::new: called");
        if goal.is_empty() {
            return Err(GridError::EmptyGoal);
        }

        let now = Utc::now();
        Ok(Self {
            goal: goal.to_string(),
            pillars: (0..PILLAR_COUNT).map(Pillar::empty).collect(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Write a pillar title
    pub fn set_pillar_title(&mut self, pillar: usize, title: impl Into<String>) -> Result<(), GridError> {
        self.set(Slot::Pillar(pillar), title)
    }

    /// Write one task
    pub fn set_task(&mut self, pillar: usize, task: usize, text: impl Into<String>) -> Result<(), GridError> {
        self.set(Slot::Task { pillar, task }, text)
    }

    /// Write content into a slot, refreshing `updated_at`
    pub fn set(&mut self, slot: Slot, content: impl Into<String>) -> Result<(), GridError> {
        debug!(%slot, "Grid::set: called");
        if !slot.in_range() {
            return Err(GridError::SlotOutOfRange(slot));
        }

        let content = content.into();
        match slot {
            Slot::Pillar(p) => self.pillars[p].title = content,
            Slot::Task { pillar, task } => self.pillars[pillar].tasks[task] = content,
        }
        self.touch();
        Ok(())
    }

    /// Read the content of a slot
    pub fn get(&self, slot: Slot) -> Option<&str> {
        if !slot.in_range() {
            return None;
        }
        let pillar = self.pillars.get(slot.pillar())?;
        match slot {
            Slot::Pillar(_) => Some(pillar.title.as_str()),
            Slot::Task { task, .. } => pillar.tasks.get(task).map(String::as_str),
        }
    }

    /// Write the result of a finished cell edit; reverted edits leave the grid untouched
    pub fn apply_edit(&mut self, slot: Slot, outcome: &EditOutcome) -> Result<bool, GridError> {
        match outcome {
            EditOutcome::Committed(text) => {
                self.set(slot, text.clone())?;
                Ok(true)
            }
            EditOutcome::Reverted(_) => {
                debug!(%slot, "Grid::apply_edit: edit reverted");
                Ok(false)
            }
        }
    }

    /// Write a generation event into its slot
    ///
    /// Returns whether the grid changed.
    pub fn apply(&mut self, event: &GenerationEvent) -> Result<bool, GridError> {
        match event {
            GenerationEvent::PillarReady { pillar, title } => {
                self.set_pillar_title(*pillar, title.clone())?;
                Ok(true)
            }
            GenerationEvent::TaskReady { pillar, task, text } => {
                self.set_task(*pillar, *task, text.clone())?;
                Ok(true)
            }
            GenerationEvent::Error { .. } | GenerationEvent::Done => Ok(false),
        }
    }

    /// Check the 8x8 shape invariant
    pub fn validate(&self) -> Result<(), GridError> {
        if self.goal.trim().is_empty() {
            return Err(GridError::EmptyGoal);
        }
        if self.pillars.len() != PILLAR_COUNT {
            return Err(GridError::Shape(format!(
                "expected {} pillars, found {}",
                PILLAR_COUNT,
                self.pillars.len()
            )));
        }
        for (i, pillar) in self.pillars.iter().enumerate() {
            if pillar.id != pillar_id(i) {
                return Err(GridError::Shape(format!(
                    "pillar {} has id '{}', expected '{}'",
                    i,
                    pillar.id,
                    pillar_id(i)
                )));
            }
            if pillar.tasks.len() != TASKS_PER_PILLAR {
                return Err(GridError::Shape(format!(
                    "pillar {} has {} tasks, expected {}",
                    i,
                    pillar.tasks.len(),
                    TASKS_PER_PILLAR
                )));
            }
        }
        Ok(())
    }

    /// Every title and task is filled
    pub fn is_complete(&self) -> bool {
        self.pillars
            .iter()
            .all(|p| !p.title.trim().is_empty() && p.filled_tasks() == TASKS_PER_PILLAR)
    }

    /// Number of non-empty task slots across all pillars
    pub fn filled_tasks(&self) -> usize {
        self.pillars.iter().map(Pillar::filled_tasks).sum()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// The example grid: Shohei Ohtani's high-school chart
    pub fn example() -> Self {
        const EXAMPLE: [(&str, [&str; TASKS_PER_PILLAR]); PILLAR_COUNT] = [
            (
                "Body Care",
                [
                    "Take Supplements",
                    "Improve Body Flexibility",
                    "Increase Stamina",
                    "Set Clear Goals",
                    "Thrive on Adversity",
                    "Don't Make Waves",
                    "Control Emotions",
                    "Show Consideration",
                ],
            ),
            (
                "Control",
                [
                    "Consistent Release Point",
                    "Remove Insecurities",
                    "Control Mental State",
                    "Maintain Focus",
                    "Stay Composed",
                    "Trust the Process",
                    "Execute Fundamentals",
                    "Adapt to Situations",
                ],
            ),
            (
                "Sharpness",
                [
                    "Don't Overpower",
                    "Lead with Lower Body",
                    "Increase Ball Spin Rate",
                    "Perfect Mechanics",
                    "Develop Touch",
                    "Fine-tune Delivery",
                    "Quick Release",
                    "Deceptive Motion",
                ],
            ),
            (
                "Speed 100mph",
                [
                    "Core Strength Training",
                    "Lower Body Power",
                    "Shoulder Development",
                    "Explosive Movements",
                    "Flexibility Work",
                    "Proper Mechanics",
                    "Rest and Recovery",
                    "Track Velocity",
                ],
            ),
            (
                "Pitch Variance",
                [
                    "Range of Motion",
                    "Practice Changeup",
                    "Slow Curveball",
                    "Develop Slider",
                    "Command All Pitches",
                    "Deception Drills",
                    "Study Hitters",
                    "Mix Effectively",
                ],
            ),
            (
                "Personality",
                [
                    "Be Considerate to Teammates",
                    "Show Likability",
                    "Display Leadership",
                    "Stay Humble",
                    "Be Positive Energy",
                    "Respect Everyone",
                    "Build Relationships",
                    "Communicate Well",
                ],
            ),
            (
                "Karma",
                [
                    "Pick Up Trash",
                    "Show Respect to Umpires",
                    "Be Positive",
                    "Help Teammates",
                    "Give Back",
                    "Show Gratitude",
                    "Stay Humble",
                    "Support Others",
                ],
            ),
            (
                "Mental Toughness",
                [
                    "Don't Get Caught Up in the Flow",
                    "Stay Calm Under Pressure",
                    "Focus on Process",
                    "Overcome Adversity",
                    "Maintain Confidence",
                    "Control Emotions",
                    "Visualize Success",
                    "Learn from Failure",
                ],
            ),
        ];

        let now = Utc::now();
        Self {
            goal: "Get drafted 1st overall by 8 NPB teams".to_string(),
            pillars: EXAMPLE
                .iter()
                .enumerate()
                .map(|(i, (title, tasks))| Pillar {
                    id: pillar_id(i),
                    title: title.to_string(),
                    tasks: tasks.iter().map(|t| t.to_string()).collect(),
                })
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }
}
