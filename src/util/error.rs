//! Error types for the path tracer.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tracer operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No GPU adapter matched the request
    #[error("No compatible GPU adapter found")]
    NoAdapter,

    /// Device creation failed
    #[error("Failed to create GPU device: {0}")]
    DeviceRequest(String),

    /// Generated source failed to compile for one kernel
    #[error("Kernel '{kernel}' failed to compile: {message}")]
    Compile { kernel: String, message: String },

    /// Per-pixel buffers could not be allocated at this size
    #[error("Cannot allocate buffers for {width}x{height}: {message}")]
    Allocation { width: u32, height: u32, message: String },

    /// Scene description is inconsistent
    #[error("Invalid scene: {0}")]
    Scene(String),

    /// Scene update changes the structure of the compiled scene
    #[error("Scene structure changed; recompile required")]
    LayoutMismatch,

    /// State machine rejected an event
    #[error("Invalid transition from {from} on {event}")]
    InvalidTransition { from: &'static str, event: &'static str },

    /// Operation needs something that has not been set up yet
    #[error("Not ready: {0}")]
    NotReady(&'static str),

    /// Mapping a GPU buffer back failed
    #[error("Readback failed: {0}")]
    Readback(String),

    /// Scene or settings file not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a scene validation error.
    pub fn scene(msg: impl Into<String>) -> Self {
        Self::Scene(msg.into())
    }

    /// Whether the error leaves the pipeline usable after logging.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Allocation { .. } | Self::Readback(_) | Self::NotReady(_))
    }
}

/// Result type alias for tracer operations.
pub type Result<T> = std::result::Result<T, Error>;
