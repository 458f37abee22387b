//! Kernel compilation and the compiled-pipeline cache.
//!
//! Each [`ShaderGroup`] becomes one shader module; every kernel in it is a
//! compute pipeline on its own entry point. Failures are caught per kernel
//! with validation error scopes so siblings still compile.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::RwLock;

use super::bindings::PassLayouts;
use crate::shader::{ComposedShaders, KernelId, ShaderGroup};
use crate::util::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelState {
    Undefined,
    Compiling,
    Compiled,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelFailure {
    pub kernel: KernelId,
    pub message: String,
}

/// Outcome of compiling one or more groups.
#[derive(Debug, Clone, Default)]
pub struct CompileReport {
    pub compiled: Vec<KernelId>,
    pub failures: Vec<KernelFailure>,
}

impl CompileReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: CompileReport) {
        self.compiled.extend(other.compiled);
        self.failures.extend(other.failures);
    }

    /// First failure as an [`Error::Compile`].
    pub fn error(&self) -> Option<Error> {
        self.failures.first().map(|f| Error::Compile { kernel: f.kernel.to_string(), message: f.message.clone() })
    }
}

struct Entry {
    state: KernelState,
    pipeline: Option<Arc<wgpu::ComputePipeline>>,
}

/// Compiled pipelines keyed by pass identity.
pub struct KernelCache {
    device: Arc<wgpu::Device>,
    layouts: Arc<PassLayouts>,
    entries: RwLock<HashMap<KernelId, Entry>>,
    pending: AtomicUsize,
    generation: AtomicU64,
}

impl KernelCache {
    pub fn new(device: Arc<wgpu::Device>, layouts: Arc<PassLayouts>) -> Self {
        Self {
            device,
            layouts,
            entries: RwLock::new(HashMap::new()),
            pending: AtomicUsize::new(0),
            generation: AtomicU64::new(0),
        }
    }

    /// Groups still compiling.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn state(&self, kernel: KernelId) -> KernelState {
        self.entries.read().get(&kernel).map_or(KernelState::Undefined, |e| e.state)
    }

    /// Pipeline for a compiled kernel; `None` if it failed or is not built yet.
    pub fn get(&self, kernel: KernelId) -> Option<Arc<wgpu::ComputePipeline>> {
        self.entries.read().get(&kernel).and_then(|e| e.pipeline.clone())
    }

    /// Whether every kernel in `kernels` is ready to dispatch.
    pub fn all_compiled(&self, kernels: &[KernelId]) -> bool {
        let entries = self.entries.read();
        kernels.iter().all(|k| entries.get(k).is_some_and(|e| e.state == KernelState::Compiled))
    }

    /// Drop all pipelines and start a new compile generation.
    fn begin(&self, composed: &ComposedShaders) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let mut entries = self.entries.write();
        entries.clear();
        for kernel in &composed.kernels {
            entries.insert(*kernel, Entry { state: KernelState::Compiling, pipeline: None });
        }
        self.pending.store(ShaderGroup::ALL.len(), Ordering::Release);
        generation
    }

    fn group_done(&self, generation: u64) {
        if self.generation() == generation {
            self.pending.fetch_sub(1, Ordering::AcqRel);
        }
    }

    /// Compile every group on the calling thread.
    pub fn compile(&self, composed: &ComposedShaders) -> CompileReport {
        let generation = self.begin(composed);
        let mut report = CompileReport::default();
        for group in ShaderGroup::ALL {
            let kernels: Vec<_> = composed.kernels_in(group).collect();
            report.merge(self.compile_group(generation, group, composed.source(group), &kernels));
            self.group_done(generation);
        }
        report
    }

    /// Compile each group on its own thread. `on_group` runs on that thread
    /// after the group finished and the pending counter was decremented.
    pub fn compile_async<F>(self: &Arc<Self>, composed: ComposedShaders, on_group: F) -> u64
    where
        F: Fn(u64, ShaderGroup, CompileReport) + Send + Sync + 'static,
    {
        let generation = self.begin(&composed);
        let on_group = Arc::new(on_group);
        for group in ShaderGroup::ALL {
            let kernels: Vec<_> = composed.kernels_in(group).collect();
            let source = composed.source(group).to_string();
            let cache = Arc::clone(self);
            let callback = Arc::clone(&on_group);
            let thread_kernels = kernels.clone();
            let spawned = thread::Builder::new()
                .name(format!("sdf-compile-{}", group.name()))
                .spawn(move || {
                    let report = cache.compile_group(generation, group, &source, &thread_kernels);
                    cache.group_done(generation);
                    callback(generation, group, report);
                });
            if let Err(err) = spawned {
                let message = format!("compile thread spawn failed: {err}");
                tracing::warn!("{message}");
                let mut report = CompileReport::default();
                for kernel in kernels {
                    self.finish(generation, kernel, None);
                    report.failures.push(KernelFailure { kernel, message: message.clone() });
                }
                self.group_done(generation);
                on_group(generation, group, report);
            }
        }
        generation
    }

    #[tracing::instrument(skip_all, fields(group = group.name(), kernels = kernels.len()))]
    fn compile_group(&self, generation: u64, group: ShaderGroup, source: &str, kernels: &[KernelId]) -> CompileReport {
        let mut report = CompileReport::default();
        if kernels.is_empty() {
            return report;
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(group.name()),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            let message = err.to_string();
            tracing::warn!(group = group.name(), "shader module failed: {message}");
            for kernel in kernels {
                self.finish(generation, *kernel, None);
                report.failures.push(KernelFailure { kernel: *kernel, message: message.clone() });
            }
            return report;
        }

        let layout = self.layouts.pipeline_layout(group);
        for &kernel in kernels {
            let entry = kernel.entry_point();
            self.device.push_error_scope(wgpu::ErrorFilter::Validation);
            let pipeline = self.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(entry.as_str()),
                layout: Some(layout),
                module: &module,
                entry_point: Some(entry.as_str()),
                compilation_options: Default::default(),
                cache: None,
            });
            match pollster::block_on(self.device.pop_error_scope()) {
                None => {
                    self.finish(generation, kernel, Some(Arc::new(pipeline)));
                    report.compiled.push(kernel);
                }
                Some(err) => {
                    let message = err.to_string();
                    tracing::warn!(%kernel, "kernel failed: {message}");
                    self.finish(generation, kernel, None);
                    report.failures.push(KernelFailure { kernel, message });
                }
            }
        }
        tracing::debug!(compiled = report.compiled.len(), failed = report.failures.len(), "group compiled");
        report
    }

    fn finish(&self, generation: u64, kernel: KernelId, pipeline: Option<Arc<wgpu::ComputePipeline>>) {
        if self.generation() != generation {
            return;
        }
        let mut entries = self.entries.write();
        match pipeline {
            Some(pipeline) => {
                entries.insert(kernel, Entry { state: KernelState::Compiled, pipeline: Some(pipeline) });
            }
            None => {
                entries.insert(kernel, Entry { state: KernelState::Invalid, pipeline: None });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_merge() {
        let mut a = CompileReport { compiled: vec![KernelId::Camera], failures: vec![] };
        assert!(a.is_ok());
        a.merge(CompileReport {
            compiled: vec![],
            failures: vec![KernelFailure { kernel: KernelId::Intersect(2), message: "bad".into() }],
        });
        assert!(!a.is_ok());
        let err = a.error().unwrap();
        assert!(err.to_string().contains("intersect_2"));
    }
}
