//! wgpu plumbing: device, buffers, layouts and the kernel cache.

mod bindings;
mod compiler;
mod context;
mod fence;
mod gbuffer;
mod gpu_data;
mod planes;
mod readback;
mod resources;

pub use bindings::{PassLayouts, FIRST_BANK_BINDING};
pub use compiler::{CompileReport, KernelCache, KernelFailure, KernelState};
pub use context::GpuContext;
pub use fence::Fence;
pub use gbuffer::{GBuffer, RECORD_SIZE};
pub use gpu_data::{FrameUniform, RaySetUniform};
pub use planes::{Plane, RayPlanes, BANK_COUNT, PLANES_PER_BANK};
pub use readback::read_records;
pub use resources::SceneBuffers;

/// Workgroup edge (must match `@workgroup_size` in the kernels).
pub const WG_SIZE: u32 = 8;

/// Workgroup counts covering a `width` x `height` grid.
pub fn workgroups(width: u32, height: u32) -> (u32, u32) {
    (width.div_ceil(WG_SIZE), height.div_ceil(WG_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workgroups() {
        assert_eq!(workgroups(8, 8), (1, 1));
        assert_eq!(workgroups(9, 17), (2, 3));
        assert_eq!(workgroups(1, 1), (1, 1));
    }
}
