//! Headless device setup.

use std::sync::Arc;

use crate::util::{Error, Result};

/// Device and queue shared by every pass.
#[derive(Clone)]
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_info: Option<wgpu::AdapterInfo>,
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext").field("adapter", &self.adapter_name()).finish()
    }
}

impl GpuContext {
    /// Create a headless context on the best available adapter.
    pub fn new() -> Result<Self> {
        pollster::block_on(Self::new_async())
    }

    #[tracing::instrument(name = "gpu_init")]
    pub async fn new_async() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| Error::NoAdapter)?;

        let info = adapter.get_info();
        tracing::info!(adapter = %info.name, backend = ?info.backend, "using adapter");

        // Larger storage bindings raise the G-buffer size cap; take what the adapter allows.
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sdf_tracer_device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter.limits(),
                ..Default::default()
            })
            .await
            .map_err(|e| Error::DeviceRequest(e.to_string()))?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_info: Some(info),
        })
    }

    /// Wrap a device owned by a host application.
    pub fn from_parts(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self { device, queue, adapter_info: None }
    }

    pub fn adapter_name(&self) -> &str {
        self.adapter_info.as_ref().map_or("external", |i| i.name.as_str())
    }

    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }
}
