//! Copying buffer contents back to the host.

use std::sync::mpsc::channel;

use super::context::GpuContext;
use super::gbuffer::RECORD_SIZE;
use crate::util::{Error, Result};

/// Read `count` vec4 records starting at byte `offset` of `src`.
#[tracing::instrument(skip(ctx, src))]
pub fn read_records(ctx: &GpuContext, src: &wgpu::Buffer, offset: u64, count: usize) -> Result<Vec<[f32; 4]>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let size = count as u64 * RECORD_SIZE;
    let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("sdf_readback"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("sdf_readback_encoder"),
    });
    encoder.copy_buffer_to_buffer(src, offset, &staging, 0, size);
    ctx.queue.submit(Some(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    ctx.device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| Error::Readback(e.to_string()))?;
    rx.recv()
        .map_err(|_| Error::Readback("map callback dropped".into()))?
        .map_err(|e| Error::Readback(e.to_string()))?;

    let records = {
        let data = slice.get_mapped_range();
        bytemuck::cast_slice::<u8, [f32; 4]>(&data).to_vec()
    };
    staging.unmap();
    Ok(records)
}
