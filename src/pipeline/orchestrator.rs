//! Render pipeline orchestrator.
//!
//! Owns the per-pixel buffers, the compiled kernels and the state machine,
//! and sequences passes across bounces and samples.
//!
//! ## Scheduling
//!
//! Work is issued one [`RenderUnit`] at a time from [`RenderPipeline::pump`].
//! A unit's final submission registers a completion callback that posts to
//! a channel; the next unit is only scheduled after that message arrives,
//! so the host loop gets control back between units. Inside a unit the
//! per-primitive intersection dispatches are separated by a [`Fence`] wait,
//! because each one reads the nearest hit the previous one wrote.
//!
//! ```ignore
//! let mut pipeline = RenderPipeline::new(GpuContext::new()?, RenderSettings::default());
//! pipeline.resize_view(640, 480)?;
//! pipeline.compile(&scene)?;
//! pipeline.render()?;
//! loop {
//!     pipeline.pump()?;
//!     // present pipeline.read_final()? when a Progress event arrives
//! }
//! ```

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::events::{PipelineEvent, Progress};
use super::schedule::RenderUnit;
use super::state::{CancelToken, PipelineState, RenderState, StateEvent};
use crate::gpu::{
    self, CompileReport, Fence, FrameUniform, GBuffer, GpuContext, KernelCache, PassLayouts, Plane, SceneBuffers,
};
use crate::scene::{Scene, SceneLayout};
use crate::settings::RenderSettings;
use crate::shader::{compose, KernelId, KernelList, ShaderGroup};
use crate::util::{Error, Result};

enum Message {
    UnitDone(RenderUnit),
    GroupCompiled { generation: u64, report: CompileReport },
}

pub struct RenderPipeline {
    ctx: GpuContext,
    settings: RenderSettings,
    layouts: Arc<PassLayouts>,
    kernels: Arc<KernelCache>,

    // Compiled scene
    scene: Option<Scene>,
    layout: Option<SceneLayout>,
    kernel_list: KernelList,
    buffers: Option<SceneBuffers>,

    // Per-pixel targets
    gbuffer: Option<GBuffer>,
    bind_group: Option<wgpu::BindGroup>,
    view_size: (u32, u32),
    render_size: Option<(u32, u32)>,

    state: PipelineState,
    render: RenderState,
    next_unit: Option<RenderUnit>,
    in_flight: Option<RenderUnit>,
    sample_started: Option<Instant>,
    fence: Fence,

    tx: Sender<Message>,
    rx: Receiver<Message>,
    events: Option<Sender<PipelineEvent>>,

    compile_report: CompileReport,
    groups_left: usize,
    progress: Option<Progress>,
    invalid_reason: Option<String>,
}

impl RenderPipeline {
    pub fn new(ctx: GpuContext, settings: RenderSettings) -> Self {
        let settings = settings.validated();
        let layouts = Arc::new(PassLayouts::new(&ctx.device));
        let kernels = Arc::new(KernelCache::new(ctx.device.clone(), layouts.clone()));
        let (tx, rx) = channel();
        let render_size = settings.render_size.map(|[w, h]| (w, h));
        Self {
            ctx,
            settings,
            layouts,
            kernels,
            scene: None,
            layout: None,
            kernel_list: KernelList::new(),
            buffers: None,
            gbuffer: None,
            bind_group: None,
            view_size: (0, 0),
            render_size,
            state: PipelineState::Idle,
            render: RenderState::default(),
            next_unit: None,
            in_flight: None,
            sample_started: None,
            fence: Fence::new(),
            tx,
            rx,
            events: None,
            compile_report: CompileReport::default(),
            groups_left: 0,
            progress: None,
            invalid_reason: None,
        }
    }

    // ---- Accessors ----

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Samples accumulated into the final image.
    pub fn sample_count(&self) -> u32 {
        self.render.samples
    }

    /// Latest `(sample_index, gpu_millis)` signal.
    pub fn progress(&self) -> Option<Progress> {
        self.progress
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    pub fn kernels(&self) -> &KernelCache {
        &self.kernels
    }

    pub fn layout(&self) -> Option<&SceneLayout> {
        self.layout.as_ref()
    }

    pub fn last_compile_report(&self) -> &CompileReport {
        &self.compile_report
    }

    pub fn invalid_reason(&self) -> Option<&str> {
        self.invalid_reason.as_deref()
    }

    /// Token observed before every dispatch; cancelling it stops the render.
    pub fn cancel_token(&self) -> CancelToken {
        self.render.cancel.clone()
    }

    /// Render resolution: the override when set, else the view size.
    pub fn render_dimensions(&self) -> (u32, u32) {
        self.render_size.unwrap_or(self.view_size)
    }

    /// Subscribe to pipeline events. A new call replaces the previous receiver.
    pub fn events(&mut self) -> Receiver<PipelineEvent> {
        let (tx, rx) = channel();
        self.events = Some(tx);
        rx
    }

    fn emit(&mut self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                self.events = None;
            }
        }
    }

    fn transition(&mut self, event: StateEvent) -> Result<()> {
        let next = self.state.on(event)?;
        if next != self.state {
            tracing::debug!(from = %self.state, to = %next, "pipeline state");
            self.state = next;
            self.emit(PipelineEvent::StateChanged(next));
        }
        Ok(())
    }

    // ---- Compilation ----

    /// Compile `scene` synchronously. Rendering in progress is stopped and
    /// restarted from sample 0 once the new kernels are ready.
    #[tracing::instrument(skip_all, fields(nodes = scene.nodes.len()))]
    pub fn compile(&mut self, scene: &Scene) -> Result<CompileReport> {
        let resume = self.halt()? | std::mem::take(&mut self.render.render_requested);
        let composed = self.prepare(scene)?;
        let report = self.kernels.compile(&composed);
        debug_assert_eq!(self.kernels.pending(), 0);
        self.finish_compile(report.clone());
        if let Some(err) = report.error() {
            return Err(err);
        }
        if resume {
            self.start()?;
        }
        Ok(report)
    }

    /// Compile `scene` on background threads; completion is picked up by [`Self::pump`].
    #[tracing::instrument(skip_all, fields(nodes = scene.nodes.len()))]
    pub fn compile_async(&mut self, scene: &Scene) -> Result<()> {
        if self.halt()? {
            self.render.render_requested = true;
        }
        let composed = self.prepare(scene)?;
        self.compile_report = CompileReport::default();
        self.groups_left = ShaderGroup::ALL.len();
        let tx = self.tx.clone();
        self.kernels.compile_async(composed, move |generation, _group, report| {
            let _ = tx.send(Message::GroupCompiled { generation, report });
        });
        Ok(())
    }

    fn prepare(&mut self, scene: &Scene) -> Result<crate::shader::ComposedShaders> {
        if self.state != PipelineState::Compiling {
            self.transition(StateEvent::Compile)?;
        }
        self.invalid_reason = None;

        let layout = match SceneLayout::build(scene, &self.settings) {
            Ok(layout) => layout,
            Err(err) => {
                self.transition(StateEvent::CompileFailed)?;
                self.invalid_reason = Some(err.to_string());
                self.show_error_color();
                return Err(err);
            }
        };
        let composed = compose(scene, &layout);

        self.buffers = Some(SceneBuffers::new(&self.ctx, &self.layouts, &layout));
        self.kernel_list = composed.kernels.clone();
        self.layout = Some(layout);
        self.scene = Some(scene.clone());
        self.rebind();
        self.render.samples = 0;
        self.next_unit = None;
        Ok(composed)
    }

    fn finish_compile(&mut self, report: CompileReport) {
        if report.is_ok() {
            tracing::info!(kernels = report.compiled.len(), "compile finished");
            let _ = self.transition(StateEvent::CompileSucceeded);
            if let Err(err) = self.ensure_targets() {
                tracing::warn!("{err}");
            }
            self.clear_final();
        } else {
            let _ = self.transition(StateEvent::CompileFailed);
            self.invalid_reason = report.error().map(|e| e.to_string());
            self.render.render_requested = false;
            self.show_error_color();
        }
        self.compile_report = report.clone();
        self.emit(PipelineEvent::CompileFinished(report));
    }

    fn group_compiled(&mut self, generation: u64, report: CompileReport) {
        if generation != self.kernels.generation() || self.state != PipelineState::Compiling {
            return;
        }
        self.compile_report.merge(report);
        self.groups_left = self.groups_left.saturating_sub(1);
        if self.groups_left == 0 {
            let report = std::mem::take(&mut self.compile_report);
            self.finish_compile(report);
            if self.state == PipelineState::Idle && std::mem::take(&mut self.render.render_requested) {
                if let Err(err) = self.start() {
                    tracing::warn!("deferred render start failed: {err}");
                }
            }
        }
    }

    /// Upload new parameter values. Structural changes fall back to a full compile.
    pub fn update_scene(&mut self, scene: &Scene) -> Result<()> {
        if !matches!(self.state, PipelineState::Idle | PipelineState::Rendering) {
            return self.compile(scene).map(|_| ());
        }
        let Some(layout) = &self.layout else {
            return self.compile(scene).map(|_| ());
        };
        match layout.refresh(scene, &self.settings) {
            Ok(next) if self.buffers.as_ref().is_some_and(|b| b.fits(&next)) => {
                let resume = self.halt()?;
                if let Some(buffers) = &self.buffers {
                    buffers.upload(&self.ctx, &next);
                }
                self.layout = Some(next);
                self.scene = Some(scene.clone());
                self.render.reset();
                self.clear_final();
                if resume {
                    self.start()?;
                }
                Ok(())
            }
            Ok(_) | Err(Error::LayoutMismatch) => {
                tracing::debug!("scene structure changed, recompiling");
                self.compile(scene).map(|_| ())
            }
            Err(err) => Err(err),
        }
    }

    // ---- Control ----

    /// Start or resume progressive rendering.
    pub fn render(&mut self) -> Result<()> {
        self.render.target_samples = None;
        self.start()
    }

    fn start(&mut self) -> Result<()> {
        match self.state {
            PipelineState::Rendering => Ok(()),
            PipelineState::Compiling => {
                self.render.render_requested = true;
                Ok(())
            }
            PipelineState::Invalid => self.transition(StateEvent::Render),
            PipelineState::Idle => {
                if self.layout.is_none() {
                    return Err(Error::NotReady("no compiled scene"));
                }
                if !self.kernels.all_compiled(&self.kernel_list) {
                    return Err(Error::NotReady("kernels not compiled"));
                }
                self.ensure_targets()?;
                let max = self.settings.max_samples;
                if max != 0 && self.render.samples >= max {
                    self.render.samples = 0;
                }
                if self.render.samples == 0 {
                    self.clear_final();
                }
                self.render.cancel.reset();
                self.render.restart_requested = false;
                self.next_unit = Some(RenderUnit::first(self.render.samples));
                self.transition(StateEvent::Render)
            }
        }
    }

    /// Discard accumulated samples and render again from sample 0.
    pub fn restart(&mut self) -> Result<()> {
        match self.state {
            PipelineState::Rendering => {
                self.render.cancel.cancel();
                self.render.restart_requested = true;
                self.render.samples = 0;
                self.clear_final();
                Ok(())
            }
            PipelineState::Compiling => {
                self.render.samples = 0;
                self.render.render_requested = true;
                Ok(())
            }
            PipelineState::Idle | PipelineState::Invalid => {
                self.render.samples = 0;
                self.render()
            }
        }
    }

    /// Stop after the unit in flight; the pipeline drains to Idle in [`Self::pump`].
    pub fn stop(&mut self) {
        self.render.render_requested = false;
        self.render.restart_requested = false;
        if self.state == PipelineState::Rendering {
            self.render.cancel.cancel();
        }
    }

    /// Force the Invalid state and show the error color.
    pub fn set_invalid(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::error!("pipeline invalid: {reason}");
        self.render.cancel.cancel();
        self.wait_in_flight();
        self.next_unit = None;
        self.render.render_requested = false;
        let _ = self.transition(StateEvent::Fail);
        self.invalid_reason = Some(reason);
        self.show_error_color();
    }

    /// New view dimensions; reallocates and restarts when the render size changes.
    pub fn resize_view(&mut self, width: u32, height: u32) -> Result<()> {
        let previous = std::mem::replace(&mut self.view_size, (width, height));
        self.apply_size().inspect_err(|_| self.view_size = previous)
    }

    /// Override the view size, or clear the override with `None`.
    pub fn set_render_size(&mut self, size: Option<(u32, u32)>) -> Result<()> {
        let previous = std::mem::replace(&mut self.render_size, size.filter(|(w, h)| *w > 0 && *h > 0));
        self.apply_size().inspect_err(|_| self.render_size = previous)
    }

    fn apply_size(&mut self) -> Result<()> {
        let (width, height) = self.render_dimensions();
        if self.gbuffer.as_ref().is_some_and(|g| g.width == width && g.height == height) {
            return Ok(());
        }
        let invalid = self.state == PipelineState::Invalid;
        if (self.layout.is_none() && !invalid) || width == 0 || height == 0 {
            return Ok(());
        }
        let resume = self.halt()?;
        let result = self.allocate(width, height);
        if result.is_ok() {
            self.render.reset();
            if invalid {
                self.show_error_color();
            } else {
                self.clear_final();
            }
        }
        if resume {
            self.start()?;
        }
        result
    }

    // ---- Scheduling ----

    /// Non-blocking step: poll the device, handle completions and schedule
    /// at most one unit. Returns whether more work is outstanding.
    pub fn pump(&mut self) -> Result<bool> {
        let _ = self.ctx.device.poll(wgpu::PollType::Poll);
        self.drain_messages();

        match self.state {
            PipelineState::Compiling => return Ok(true),
            PipelineState::Rendering => {}
            PipelineState::Idle | PipelineState::Invalid => return Ok(false),
        }
        if self.in_flight.is_some() {
            return Ok(true);
        }
        if self.render.cancel.is_cancelled() || self.render.budget_reached(self.settings.max_samples) {
            self.finish_render()?;
            return Ok(self.state == PipelineState::Rendering);
        }

        let unit = self.next_unit.unwrap_or(RenderUnit::first(self.render.samples));
        match self.submit_unit(unit) {
            Ok(()) => Ok(true),
            Err(err) if err.is_recoverable() => {
                tracing::warn!(?unit, "render unit skipped: {err}");
                self.finish_render()?;
                Err(err)
            }
            Err(err) => {
                self.set_invalid(err.to_string());
                Err(err)
            }
        }
    }

    /// Pump until nothing is rendering or compiling.
    ///
    /// With `max_samples == 0` and no sample target this only returns after
    /// [`Self::stop`] is requested from another handle of the cancel token.
    pub fn run_until_idle(&mut self) -> Result<()> {
        loop {
            let busy = self.pump()?;
            if !busy && !matches!(self.state, PipelineState::Rendering | PipelineState::Compiling) {
                return Ok(());
            }
            if self.state == PipelineState::Compiling {
                std::thread::sleep(Duration::from_millis(1));
            } else if self.in_flight.is_some() {
                let _ = self.ctx.device.poll(wgpu::PollType::wait_indefinitely());
            }
        }
    }

    /// Accumulate `count` more samples, blocking until done.
    pub fn render_samples(&mut self, count: u32) -> Result<u32> {
        if self.state == PipelineState::Rendering {
            self.stop();
            self.run_until_idle()?;
        }
        self.run_until_idle()?;
        self.start()?;
        self.render.target_samples = Some(self.render.samples + count);
        let result = self.run_until_idle();
        self.render.target_samples = None;
        result.map(|_| self.render.samples)
    }

    fn drain_messages(&mut self) {
        let messages: Vec<Message> = self.rx.try_iter().collect();
        for message in messages {
            match message {
                Message::UnitDone(unit) => self.unit_done(unit),
                Message::GroupCompiled { generation, report } => self.group_compiled(generation, report),
            }
        }
    }

    fn unit_done(&mut self, unit: RenderUnit) {
        if self.in_flight == Some(unit) {
            self.in_flight = None;
        }
        if let RenderUnit::Accumulate { sample } = unit {
            // A restart already cleared the image behind this sample
            if !self.render.restart_requested {
                self.render.samples = sample + 1;
                let gpu_millis = self.sample_started.take().map_or(0.0, |t| t.elapsed().as_secs_f64() * 1000.0);
                let progress = Progress { sample_index: sample, gpu_millis };
                tracing::debug!(sample, gpu_millis, "sample accumulated");
                self.progress = Some(progress);
                self.emit(PipelineEvent::Progress(progress));
            }
        }
        if !self.render.cancel.is_cancelled() {
            self.next_unit = Some(unit.next(self.settings.max_depth));
        }
    }

    fn finish_render(&mut self) -> Result<()> {
        self.next_unit = None;
        self.transition(StateEvent::Finished)?;
        let restart = std::mem::take(&mut self.render.restart_requested);
        self.render.cancel.reset();
        if restart {
            self.render.reset();
            self.clear_final();
            self.start()?;
        }
        Ok(())
    }

    /// Cancel a running render and wait for it to drain. Returns whether it was running.
    fn halt(&mut self) -> Result<bool> {
        if self.state != PipelineState::Rendering {
            return Ok(false);
        }
        self.render.cancel.cancel();
        self.wait_in_flight();
        self.next_unit = None;
        self.render.restart_requested = false;
        self.transition(StateEvent::Finished)?;
        self.render.cancel.reset();
        Ok(true)
    }

    fn wait_in_flight(&mut self) {
        if self.in_flight.is_none() {
            return;
        }
        let _ = self.ctx.device.poll(wgpu::PollType::wait_indefinitely());
        self.drain_messages();
        if let Some(unit) = self.in_flight.take() {
            tracing::warn!(?unit, "completion not observed after wait");
        }
    }

    // ---- Dispatch ----

    fn frame(&self, sample: u32, bounce: u32) -> FrameUniform {
        let (width, height) = self.gbuffer.as_ref().map_or((0, 0), |g| (g.width, g.height));
        FrameUniform::new(width, height, self.settings.max_depth, self.settings.seed, self.settings.background)
            .at(sample, bounce)
    }

    #[tracing::instrument(skip(self))]
    fn submit_unit(&mut self, unit: RenderUnit) -> Result<()> {
        let buffers = self.buffers.as_ref().ok_or(Error::NotReady("scene buffers"))?;
        let bounce = match unit {
            RenderUnit::Bounce { bounce, .. } => bounce,
            RenderUnit::Accumulate { .. } => 0,
        };
        buffers.write_frame(&self.ctx, &self.frame(unit.sample(), bounce));

        let submitted = match unit {
            RenderUnit::Bounce { bounce, .. } => {
                if bounce == 0 {
                    self.sample_started = Some(Instant::now());
                    self.dispatch(&[KernelId::Camera], None, None)?;
                }
                self.bounce(buffers, unit)?
            }
            RenderUnit::Accumulate { .. } => {
                self.dispatch(&[KernelId::Accumulate], None, Some(unit))?;
                true
            }
        };
        if submitted {
            self.in_flight = Some(unit);
        }
        Ok(())
    }

    /// Passes after the camera for one bounce. Returns false when cancelled midway.
    fn bounce(&self, buffers: &SceneBuffers, unit: RenderUnit) -> Result<bool> {
        if !self.intersect(&buffers.primary)? || self.render.cancel.is_cancelled() {
            return Ok(false);
        }
        self.dispatch(&[KernelId::Material], None, None)?;
        if !self.intersect(&buffers.shadow)? || self.render.cancel.is_cancelled() {
            return Ok(false);
        }
        self.dispatch(&[KernelId::Direct, KernelId::Trace], None, Some(unit))?;
        Ok(true)
    }

    /// Run every primitive's kernel against one ray set, waiting between them.
    fn intersect(&self, rays: &wgpu::BindGroup) -> Result<bool> {
        let Some(layout) = &self.layout else {
            return Err(Error::NotReady("scene layout"));
        };
        let _span = tracing::info_span!("intersect", primitives = layout.primitives.len()).entered();
        for prim in &layout.primitives {
            if self.render.cancel.is_cancelled() {
                return Ok(false);
            }
            self.dispatch(&[KernelId::Intersect(prim.index as u32)], Some(rays), None)?;
            self.fence.arm(&self.ctx.queue);
            self.fence.wait(&self.ctx.device)?;
        }
        Ok(true)
    }

    /// Record `kernels` into one compute pass and submit. With `notify`, the
    /// unit's completion is posted once the GPU finishes.
    fn dispatch(&self, kernels: &[KernelId], rays: Option<&wgpu::BindGroup>, notify: Option<RenderUnit>) -> Result<()> {
        let (Some(gbuffer), Some(bind_group)) = (&self.gbuffer, &self.bind_group) else {
            return Err(Error::NotReady("render targets"));
        };
        let (gx, gy) = gpu::workgroups(gbuffer.width, gbuffer.height);

        let mut encoder = self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("sdf_pass_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("sdf_pass"),
                timestamp_writes: None,
            });
            for &kernel in kernels {
                let pipeline = self.kernels.get(kernel).ok_or(Error::NotReady("kernel not compiled"))?;
                pass.set_pipeline(&pipeline);
                pass.set_bind_group(0, bind_group, &[]);
                if let Some(rays) = rays {
                    pass.set_bind_group(1, rays, &[]);
                }
                pass.dispatch_workgroups(gx, gy, 1);
            }
        }
        self.ctx.queue.submit(Some(encoder.finish()));

        if let Some(unit) = notify {
            let tx = self.tx.clone();
            self.ctx.queue.on_submitted_work_done(move || {
                let _ = tx.send(Message::UnitDone(unit));
            });
        }
        Ok(())
    }

    // ---- Targets ----

    fn ensure_targets(&mut self) -> Result<()> {
        let (width, height) = self.render_dimensions();
        if width == 0 || height == 0 {
            return Err(Error::NotReady("render size"));
        }
        if self.gbuffer.as_ref().is_some_and(|g| g.width == width && g.height == height) {
            return Ok(());
        }
        self.allocate(width, height)?;
        self.render.samples = 0;
        Ok(())
    }

    /// Replace the G-buffer; on failure the previous buffers stay bound.
    fn allocate(&mut self, width: u32, height: u32) -> Result<()> {
        let gbuffer = GBuffer::allocate(&self.ctx, width, height)?;
        self.gbuffer = Some(gbuffer);
        self.render.width = width;
        self.render.height = height;
        self.rebind();
        Ok(())
    }

    fn rebind(&mut self) {
        self.bind_group = match (&self.buffers, &self.gbuffer) {
            (Some(buffers), Some(gbuffer)) => Some(buffers.bind(&self.ctx, &self.layouts, gbuffer)),
            _ => None,
        };
    }

    fn clear_final(&self) {
        let Some(gbuffer) = &self.gbuffer else { return };
        let mut encoder = self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("sdf_clear_final"),
        });
        encoder.clear_buffer(&gbuffer.final_image, 0, None);
        self.ctx.queue.submit(Some(encoder.finish()));
    }

    /// Fill the final image with the error color, allocating it if needed.
    fn show_error_color(&mut self) {
        if let Err(err) = self.ensure_targets() {
            tracing::debug!("no targets for the error color: {err}");
        }
        let Some(gbuffer) = &self.gbuffer else { return };
        let pixels = vec![self.settings.error_color; gbuffer.pixel_count() as usize];
        self.ctx.queue.write_buffer(&gbuffer.final_image, 0, bytemuck::cast_slice(&pixels));
        self.ctx.queue.submit(None);
    }

    // ---- Readback ----

    /// Copy one G-buffer plane to the host, row-major.
    pub fn read_plane(&self, plane: Plane) -> Result<Vec<[f32; 4]>> {
        let gbuffer = self.gbuffer.as_ref().ok_or(Error::NotReady("render targets"))?;
        let (buffer, offset) = gbuffer.plane(plane);
        gpu::read_records(&self.ctx, buffer, offset, gbuffer.pixel_count() as usize)
    }

    /// Copy the accumulated image to the host, row-major RGBA.
    pub fn read_final(&self) -> Result<Vec<[f32; 4]>> {
        let gbuffer = self.gbuffer.as_ref().ok_or(Error::NotReady("render targets"))?;
        gpu::read_records(&self.ctx, &gbuffer.final_image, 0, gbuffer.pixel_count() as usize)
    }
}

impl Drop for RenderPipeline {
    fn drop(&mut self) {
        self.render.cancel.cancel();
        self.wait_in_flight();
    }
}
