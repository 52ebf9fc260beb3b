//! Domain types for the Harada grid
//!
//! The grid document, the cell-edit contract, and the generation state machine.

mod edit;
mod grid;
mod state;

pub use edit::{CellEdit, EditKey, EditOutcome};
pub use grid::{Grid, GridError, PILLAR_COUNT, Pillar, Slot, TASKS_PER_PILLAR, pillar_id};
pub use state::{GenerationState, GenerationStatus};
