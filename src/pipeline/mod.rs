//! Render orchestration.
//!
//! - [`RenderPipeline`] - state machine, unit scheduling, control surface
//! - [`RenderWorker`] - the same pipeline driven from a background thread
//! - [`PipelineState`] / [`CancelToken`] - lifecycle and stop flag

mod events;
mod orchestrator;
mod schedule;
mod state;
mod worker;

pub use events::{PipelineEvent, Progress};
pub use orchestrator::RenderPipeline;
pub use schedule::RenderUnit;
pub use state::{CancelToken, PipelineState, RenderState, StateEvent};
pub use worker::{RenderWorker, WorkerCommand, WorkerResult};
