//! # sdf-tracer
//!
//! Progressive Monte Carlo path tracer for signed-distance-field scenes,
//! running entirely on the GPU through wgpu compute passes.
//!
//! ## Modules
//!
//! - [`scene`] - Scene nodes, constant-slot layout, light packing
//! - [`shader`] - WGSL composition from the shared library and per-node fragments
//! - [`gpu`] - Device context, G-buffer, kernel cache, readback
//! - [`pipeline`] - State machine, pass scheduling, background worker
//! - [`settings`] - Persistent render settings
//! - [`util`] - Errors and tracing setup
//!
//! ## Example
//!
//! ```ignore
//! use sdf_tracer::prelude::*;
//!
//! let scene = Scene::load("scene.json".as_ref())?;
//! let mut pipeline = RenderPipeline::new(GpuContext::new()?, RenderSettings::default());
//! pipeline.resize_view(640, 480)?;
//! pipeline.compile(&scene)?;
//! pipeline.render_samples(64)?;
//! let pixels = pipeline.read_final()?;
//! ```

pub mod gpu;
pub mod pipeline;
pub mod scene;
pub mod settings;
pub mod shader;
pub mod util;

// Image output (optional, enabled with "export" feature)
#[cfg(feature = "export")]
pub mod export;

// Re-export commonly used types
pub use util::{init_chrome_trace, init_tracing, Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::gpu::{GpuContext, Plane};
    pub use crate::pipeline::{PipelineEvent, PipelineState, RenderPipeline, RenderWorker};
    pub use crate::scene::{Scene, SceneLayout};
    pub use crate::settings::RenderSettings;
    pub use crate::util::{Error, Result};
}
