//! GPU-side uniform records.

use bytemuck::{Pod, Zeroable};

use super::planes::RayPlanes;

/// Per-dispatch frame state (matches WGSL `Frame`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniform {
    /// Render width in pixels
    pub width: u32,
    /// Render height in pixels
    pub height: u32,
    /// Zero-based sample being traced
    pub sample_index: u32,
    /// Current bounce (0 = camera rays)
    pub bounce: u32,
    pub max_depth: u32,
    /// Salt mixed into every random stream
    pub seed: u32,
    pub _pad: [u32; 2],
    /// Flat background color used without a sky node
    pub background: [f32; 4],
}

impl FrameUniform {
    pub fn new(width: u32, height: u32, max_depth: u32, seed: u32, background: [f32; 4]) -> Self {
        Self { width, height, sample_index: 0, bounce: 0, max_depth, seed, _pad: [0; 2], background }
    }

    pub fn at(mut self, sample_index: u32, bounce: u32) -> Self {
        self.sample_index = sample_index;
        self.bounce = bounce;
        self
    }
}

/// Plane indices an intersection dispatch works on (matches WGSL `RaySet`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct RaySetUniform {
    pub origin: u32,
    pub direction: u32,
    pub hit: u32,
    pub normal: u32,
}

impl From<RayPlanes> for RaySetUniform {
    fn from(p: RayPlanes) -> Self {
        Self {
            origin: p.origin.index(),
            direction: p.direction.index(),
            hit: p.hit.index(),
            normal: p.normal.index(),
        }
    }
}
