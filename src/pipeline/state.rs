//! Pipeline state machine and per-render bookkeeping.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::util::{Error, Result};

/// Lifecycle of the compiled pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Idle,
    Compiling,
    Rendering,
    Invalid,
}

/// Inputs to [`PipelineState::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    Compile,
    CompileSucceeded,
    CompileFailed,
    Render,
    /// Sample budget exhausted or the stop request drained
    Finished,
    /// Unrecoverable failure; valid from any state
    Fail,
}

impl StateEvent {
    fn name(self) -> &'static str {
        match self {
            StateEvent::Compile => "compile",
            StateEvent::CompileSucceeded => "compile succeeded",
            StateEvent::CompileFailed => "compile failed",
            StateEvent::Render => "render",
            StateEvent::Finished => "finished",
            StateEvent::Fail => "fail",
        }
    }
}

impl PipelineState {
    pub fn name(self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Compiling => "Compiling",
            PipelineState::Rendering => "Rendering",
            PipelineState::Invalid => "Invalid",
        }
    }

    /// Next state, or [`Error::InvalidTransition`].
    pub fn on(self, event: StateEvent) -> Result<Self> {
        use PipelineState::*;
        use StateEvent::*;
        match (self, event) {
            (_, Fail) => Ok(Invalid),
            (Idle | Invalid, Compile) => Ok(Compiling),
            (Compiling, CompileSucceeded) => Ok(Idle),
            (Compiling, CompileFailed) => Ok(Invalid),
            (Idle, Render) => Ok(Rendering),
            (Rendering, Finished) => Ok(Idle),
            (state, event) => Err(Error::InvalidTransition { from: state.name(), event: event.name() }),
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared stop flag checked before every pass dispatch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Mutable render bookkeeping owned by the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    /// Samples accumulated into the final image
    pub samples: u32,
    /// Resolution the current G-buffer was allocated for
    pub width: u32,
    pub height: u32,
    /// Stop the render loop once this many samples are accumulated
    pub target_samples: Option<u32>,
    /// Start again from sample 0 once the current stop drains
    pub restart_requested: bool,
    /// Start rendering as soon as compilation finishes
    pub render_requested: bool,
    pub cancel: CancelToken,
}

impl RenderState {
    /// Forget accumulated samples.
    pub fn reset(&mut self) {
        self.samples = 0;
        self.restart_requested = false;
        self.cancel.reset();
    }

    /// Whether the sample budget (settings and explicit target) is used up.
    pub fn budget_reached(&self, max_samples: u32) -> bool {
        let settings_done = max_samples != 0 && self.samples >= max_samples;
        let target_done = self.target_samples.is_some_and(|t| self.samples >= t);
        settings_done || target_done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_transitions() {
        let s = PipelineState::Idle.on(StateEvent::Compile).unwrap();
        assert_eq!(s, PipelineState::Compiling);
        assert_eq!(s.on(StateEvent::CompileSucceeded).unwrap(), PipelineState::Idle);
        assert_eq!(s.on(StateEvent::CompileFailed).unwrap(), PipelineState::Invalid);
        // A fixed scene can be recompiled from Invalid
        assert_eq!(PipelineState::Invalid.on(StateEvent::Compile).unwrap(), PipelineState::Compiling);
    }

    #[test]
    fn test_render_transitions() {
        let s = PipelineState::Idle.on(StateEvent::Render).unwrap();
        assert_eq!(s, PipelineState::Rendering);
        assert_eq!(s.on(StateEvent::Finished).unwrap(), PipelineState::Idle);
        assert!(PipelineState::Compiling.on(StateEvent::Render).is_err());
        assert!(PipelineState::Invalid.on(StateEvent::Render).is_err());
        assert!(PipelineState::Rendering.on(StateEvent::Compile).is_err());
    }

    #[test]
    fn test_fail_from_anywhere() {
        for s in [PipelineState::Idle, PipelineState::Compiling, PipelineState::Rendering, PipelineState::Invalid] {
            assert_eq!(s.on(StateEvent::Fail).unwrap(), PipelineState::Invalid);
        }
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = PipelineState::Compiling.on(StateEvent::Render).unwrap_err();
        assert_eq!(err.to_string(), "Invalid transition from Compiling on render");
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let other = token.clone();
        other.cancel();
        assert!(token.is_cancelled());
        token.reset();
        assert!(!other.is_cancelled());
    }

    #[test]
    fn test_reset_keeps_requests_to_render() {
        let mut rs = RenderState { samples: 7, restart_requested: true, render_requested: true, ..Default::default() };
        rs.cancel.cancel();
        rs.reset();
        assert_eq!(rs.samples, 0);
        assert!(!rs.restart_requested);
        assert!(rs.render_requested);
        assert!(!rs.cancel.is_cancelled());
    }

    #[test]
    fn test_budget() {
        let mut rs = RenderState::default();
        assert!(!rs.budget_reached(0));
        rs.samples = 4;
        assert!(rs.budget_reached(4));
        assert!(!rs.budget_reached(5));
        rs.target_samples = Some(3);
        assert!(rs.budget_reached(0));
    }
}
