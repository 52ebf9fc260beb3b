//! Grid generation
//!
//! Turns a goal into pillar titles and tasks through sequential list requests,
//! reporting each result as a [`GenerationEvent`].

mod events;
mod list;
mod pipeline;
pub mod prompts;

pub use events::GenerationEvent;
pub use list::{GenerationError, parse_list, request_list};
pub use pipeline::{EVENT_CHANNEL_CAPACITY, Pipeline};
