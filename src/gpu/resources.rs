//! Scene buffers and bind groups.

use wgpu::util::DeviceExt;

use super::bindings::{PassLayouts, FIRST_BANK_BINDING};
use super::context::GpuContext;
use super::gbuffer::GBuffer;
use super::gpu_data::{FrameUniform, RaySetUniform};
use super::planes::RayPlanes;
use crate::scene::SceneLayout;

/// Uniform, constant and light buffers for one compiled scene.
pub struct SceneBuffers {
    pub frame: wgpu::Buffer,
    pub constants: wgpu::Buffer,
    pub lights: wgpu::Buffer,
    constant_count: usize,
    light_count: usize,
    pub primary: wgpu::BindGroup,
    pub shadow: wgpu::BindGroup,
}

fn records(rows: &[[f32; 4]]) -> Vec<[f32; 4]> {
    // Storage bindings may not be empty
    if rows.is_empty() {
        vec![[0.0; 4]]
    } else {
        rows.to_vec()
    }
}

fn ray_set(ctx: &GpuContext, layouts: &PassLayouts, planes: RayPlanes, label: &str) -> wgpu::BindGroup {
    let buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(&RaySetUniform::from(planes)),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: &layouts.rays,
        entries: &[wgpu::BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() }],
    })
}

impl SceneBuffers {
    pub fn new(ctx: &GpuContext, layouts: &PassLayouts, layout: &SceneLayout) -> Self {
        let device = &ctx.device;
        let frame = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sdf_frame"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let constants = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sdf_constants"),
            contents: bytemuck::cast_slice(&records(&layout.constants)),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });
        let lights = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sdf_lights"),
            contents: bytemuck::cast_slice(&records(&layout.lights)),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            frame,
            constants,
            lights,
            constant_count: layout.constants.len(),
            light_count: layout.lights.len(),
            primary: ray_set(ctx, layouts, RayPlanes::PRIMARY, "sdf_primary_rays"),
            shadow: ray_set(ctx, layouts, RayPlanes::SHADOW, "sdf_shadow_rays"),
        }
    }

    /// Whether `layout` fits the existing buffers.
    pub fn fits(&self, layout: &SceneLayout) -> bool {
        self.constant_count == layout.constants.len() && self.light_count == layout.lights.len()
    }

    /// Upload new parameter values for a structurally identical scene.
    pub fn upload(&self, ctx: &GpuContext, layout: &SceneLayout) {
        if !layout.constants.is_empty() {
            ctx.queue.write_buffer(&self.constants, 0, bytemuck::cast_slice(&layout.constants));
        }
        ctx.queue.write_buffer(&self.lights, 0, bytemuck::cast_slice(&layout.lights));
    }

    pub fn write_frame(&self, ctx: &GpuContext, frame: &FrameUniform) {
        ctx.queue.write_buffer(&self.frame, 0, bytemuck::bytes_of(frame));
    }

    /// group(0) bind group over these buffers and a G-buffer.
    pub fn bind(&self, ctx: &GpuContext, layouts: &PassLayouts, gbuffer: &GBuffer) -> wgpu::BindGroup {
        let mut entries = vec![
            wgpu::BindGroupEntry { binding: 0, resource: self.frame.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: self.constants.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 2, resource: self.lights.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 3, resource: gbuffer.final_image.as_entire_binding() },
        ];
        entries.extend(gbuffer.banks.iter().zip(FIRST_BANK_BINDING..).map(|(bank, binding)| wgpu::BindGroupEntry {
            binding,
            resource: bank.as_entire_binding(),
        }));
        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sdf_frame_bg"),
            layout: &layouts.frame,
            entries: &entries,
        })
    }
}
