//! Per-pixel buffers.

use super::context::GpuContext;
use super::planes::{Plane, BANK_COUNT, PLANES_PER_BANK};
use crate::util::{Error, Result};

/// Bytes per vec4 record.
pub const RECORD_SIZE: u64 = 16;

/// G-buffer plane banks plus the accumulated image, sized to one resolution.
pub struct GBuffer {
    pub width: u32,
    pub height: u32,
    pub banks: Vec<wgpu::Buffer>,
    pub final_image: wgpu::Buffer,
}

impl std::fmt::Debug for GBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GBuffer").field("width", &self.width).field("height", &self.height).finish()
    }
}

impl GBuffer {
    /// Byte sizes of (one plane bank, final image) for a resolution.
    pub fn byte_sizes(width: u32, height: u32) -> (u64, u64) {
        let pixels = width as u64 * height as u64;
        (pixels * PLANES_PER_BANK as u64 * RECORD_SIZE, pixels * RECORD_SIZE)
    }

    /// Largest pixel count whose banks fit a single storage binding and buffer.
    pub fn max_pixels(limits: &wgpu::Limits) -> u64 {
        let max_binding = (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size);
        max_binding / (PLANES_PER_BANK as u64 * RECORD_SIZE)
    }

    /// Allocate buffers for `width` x `height`.
    ///
    /// Fails with [`Error::Allocation`] when the device limits or memory do not
    /// allow it; the caller keeps its previous buffers in that case.
    #[tracing::instrument(skip(ctx))]
    pub fn allocate(ctx: &GpuContext, width: u32, height: u32) -> Result<Self> {
        let alloc_err = |message: String| Error::Allocation { width, height, message };
        if width == 0 || height == 0 {
            return Err(alloc_err("empty resolution".into()));
        }

        let limits = ctx.limits();
        let pixels = width as u64 * height as u64;
        let max_pixels = Self::max_pixels(&limits);
        if pixels > max_pixels {
            return Err(alloc_err(format!(
                "{pixels} pixels exceeds the device limit of {max_pixels} ({} byte storage binding)",
                limits.max_storage_buffer_binding_size
            )));
        }
        let (bank_size, final_size) = Self::byte_sizes(width, height);

        let device = &ctx.device;
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let usage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST;
        let banks = (0..BANK_COUNT)
            .map(|bank| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("sdf_gbuffer_bank{bank}")),
                    size: bank_size,
                    usage,
                    mapped_at_creation: false,
                })
            })
            .collect();
        let final_image = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sdf_final_image"),
            size: final_size,
            usage,
            mapped_at_creation: false,
        });

        let validation = pollster::block_on(device.pop_error_scope());
        let oom = pollster::block_on(device.pop_error_scope());
        if let Some(err) = validation.or(oom) {
            tracing::warn!(width, height, "G-buffer allocation failed: {err}");
            return Err(alloc_err(err.to_string()));
        }

        tracing::debug!(width, height, bytes = bank_size * BANK_COUNT as u64 + final_size, "allocated G-buffer");
        Ok(Self { width, height, banks, final_image })
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Buffer holding `plane` and the byte offset of the plane inside it.
    pub fn plane(&self, plane: Plane) -> (&wgpu::Buffer, u64) {
        (&self.banks[plane.bank()], plane.slot() as u64 * self.pixel_count() * RECORD_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_sizes() {
        let (bank, image) = GBuffer::byte_sizes(4, 2);
        assert_eq!(image, 8 * 16);
        assert_eq!(bank, 8 * 16 * PLANES_PER_BANK as u64);
    }

    #[test]
    fn test_default_limits_fit_full_hd() {
        let limits = wgpu::Limits::default();
        let max = GBuffer::max_pixels(&limits);
        assert!(1920 * 1080 <= max);
        assert!(4096 * 4096 > max);
        let (bank, _) = GBuffer::byte_sizes(1920, 1080);
        assert!(bank <= limits.max_storage_buffer_binding_size as u64);
    }

    #[test]
    fn test_storage_buffers_within_default_limit() {
        // constants, lights, final image and the banks
        assert!(3 + BANK_COUNT as u32 <= wgpu::Limits::default().max_storage_buffers_per_shader_stage);
    }
}
