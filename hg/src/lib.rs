//! Harada - goal decomposition into a Harada Method grid
//!
//! A goal is broken into 8 supporting pillars and 8 actionable tasks per
//! pillar. Pillars and tasks come from a streaming chat-completion service,
//! one list request at a time, and are written into the grid slot by slot.
//!
//! # Modules
//!
//! - [`domain`] - Grid document, cell edits, generation state
//! - [`llm`] - LLM client trait and OpenAI implementation
//! - [`generation`] - Prompts, list parsing, and the two-phase pipeline
//! - [`layout`] - 9x9 sectioned positional layout
//! - [`render`] - Terminal rendering
//! - [`store`] - Local persistence of grid and credential
//! - [`export`] - JSON/Markdown/text export and import
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod export;
pub mod generation;
pub mod layout;
pub mod llm;
pub mod render;
pub mod store;

// Re-export commonly used types
pub use config::{Config, GenerationConfig, LlmConfig};
pub use domain::{
    CellEdit, EditKey, EditOutcome, GenerationState, GenerationStatus, Grid, GridError, PILLAR_COUNT, Pillar, Slot,
    TASKS_PER_PILLAR,
};
pub use export::{ExportFormat, export, export_filename, import_json};
pub use generation::{GenerationError, GenerationEvent, Pipeline};
pub use llm::{LlmClient, LlmError, OpenAIClient, create_client};
pub use store::{CredentialSource, GridStore, resolve_credential};
