//! Utility types shared across the tracer.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - [`init_tracing`] / [`init_chrome_trace`] - Subscriber and chrome trace output

mod error;
mod trace;

pub use error::*;
pub use trace::*;
