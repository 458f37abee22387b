//! Shading source composition.
//!
//! - [`compose`] - shared library + generated fragments, one program per [`ShaderGroup`]
//! - [`KernelId`] - pass identity used by the kernel cache

mod codegen;
mod composer;
mod header;
mod kernels;

pub use composer::{compose, ComposedShaders, KernelId, KernelList, ShaderGroup};
