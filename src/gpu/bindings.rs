//! Bind group and pipeline layouts shared by every kernel.

use super::planes::BANK_COUNT;

/// group(0) binding of the first G-buffer bank; the rest follow in order.
pub const FIRST_BANK_BINDING: u32 = 4;

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Layouts for group(0) (frame + scene + G-buffer) and group(1) (ray set).
pub struct PassLayouts {
    pub frame: wgpu::BindGroupLayout,
    pub rays: wgpu::BindGroupLayout,
    /// group(0) only
    pub pass: wgpu::PipelineLayout,
    /// group(0) + group(1), used by intersection kernels
    pub geometry: wgpu::PipelineLayout,
}

impl PassLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let mut entries = vec![
            // @binding(0) Frame uniform
            uniform_entry(0),
            // @binding(1) Scene constants
            storage_entry(1, true),
            // @binding(2) Light records
            storage_entry(2, true),
            // @binding(3) Accumulated image
            storage_entry(3, false),
        ];
        // @binding(4..) G-buffer plane banks
        entries.extend((0..BANK_COUNT as u32).map(|bank| storage_entry(FIRST_BANK_BINDING + bank, false)));
        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf_frame_bgl"),
            entries: &entries,
        });

        let rays = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf_rays_bgl"),
            entries: &[uniform_entry(0)],
        });

        let pass = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf_pass_pl"),
            bind_group_layouts: &[&frame],
            push_constant_ranges: &[],
        });

        let geometry = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf_geometry_pl"),
            bind_group_layouts: &[&frame, &rays],
            push_constant_ranges: &[],
        });

        Self { frame, rays, pass, geometry }
    }

    pub fn pipeline_layout(&self, group: crate::shader::ShaderGroup) -> &wgpu::PipelineLayout {
        match group {
            crate::shader::ShaderGroup::Geometry => &self.geometry,
            _ => &self.pass,
        }
    }
}
