//! Notifications for display collaborators.

use super::state::PipelineState;
use crate::gpu::CompileReport;

/// Per-sample progress signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Zero-based index of the sample just accumulated
    pub sample_index: u32,
    /// Wall time from the sample's first submit to its accumulation completing
    pub gpu_millis: f64,
}

#[derive(Debug, Clone)]
pub enum PipelineEvent {
    StateChanged(PipelineState),
    Progress(Progress),
    CompileFinished(CompileReport),
}
