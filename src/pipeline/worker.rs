//! Background render thread.
//!
//! Owns a [`RenderPipeline`] so the host thread never blocks on GPU waits.
//! The host sends [`WorkerCommand`]s and polls [`WorkerResult`]s.

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::events::PipelineEvent;
use super::orchestrator::RenderPipeline;
use super::state::{CancelToken, PipelineState};
use crate::gpu::GpuContext;
use crate::scene::Scene;
use crate::settings::RenderSettings;
use crate::util::Result;

/// Commands sent from the host to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    /// Compile a scene in the background.
    Compile(Box<Scene>),
    /// New parameter values; structural changes recompile.
    UpdateScene(Box<Scene>),
    Render,
    Restart,
    Stop,
    /// View dimensions changed.
    Resize { width: u32, height: u32 },
    SetRenderSize(Option<(u32, u32)>),
    /// Force the error state.
    Invalidate(String),
    /// Read the accumulated image back.
    ReadFinal,
    /// Stop the worker thread.
    Shutdown,
}

/// Results sent from the worker back to the host.
#[derive(Debug)]
pub enum WorkerResult {
    Event(PipelineEvent),
    /// Accumulated image, row-major RGBA.
    Image { width: u32, height: u32, samples: u32, pixels: Vec<[f32; 4]> },
    /// A command failed; the pipeline stays usable unless an Invalid state event follows.
    Error(String),
}

/// Handle to communicate with the render worker.
pub struct RenderWorker {
    /// Send commands to worker.
    pub tx: Sender<WorkerCommand>,
    /// Receive results from worker.
    pub rx: Receiver<WorkerResult>,
    cancel: CancelToken,
    /// Thread handle for cleanup.
    handle: Option<JoinHandle<()>>,
}

impl RenderWorker {
    /// Spawn a worker thread owning a new pipeline.
    pub fn spawn(ctx: GpuContext, settings: RenderSettings) -> Result<Self> {
        let (cmd_tx, cmd_rx) = channel::<WorkerCommand>();
        let (res_tx, res_rx) = channel::<WorkerResult>();

        let pipeline = RenderPipeline::new(ctx, settings);
        let cancel = pipeline.cancel_token();
        let handle = thread::Builder::new()
            .name("sdf-render".into())
            .spawn(move || worker_loop(pipeline, cmd_rx, res_tx))?;

        Ok(Self { tx: cmd_tx, rx: res_rx, cancel, handle: Some(handle) })
    }

    pub fn send(&self, cmd: WorkerCommand) {
        let _ = self.tx.send(cmd);
    }

    pub fn compile(&self, scene: Scene) {
        self.send(WorkerCommand::Compile(Box::new(scene)));
    }

    pub fn update_scene(&self, scene: Scene) {
        self.send(WorkerCommand::UpdateScene(Box::new(scene)));
    }

    pub fn render(&self) {
        self.send(WorkerCommand::Render);
    }

    pub fn restart(&self) {
        self.send(WorkerCommand::Restart);
    }

    /// Cancel immediately; the render loop notices before its next dispatch.
    pub fn stop_render(&self) {
        self.cancel.cancel();
        self.send(WorkerCommand::Stop);
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.send(WorkerCommand::Resize { width, height });
    }

    /// Check for ready results (non-blocking).
    pub fn try_recv(&self) -> Option<WorkerResult> {
        self.rx.try_recv().ok()
    }

    /// Stop the worker and wait for it to finish.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        let _ = self.tx.send(WorkerCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(mut pipeline: RenderPipeline, rx: Receiver<WorkerCommand>, tx: Sender<WorkerResult>) {
    let events = pipeline.events();
    loop {
        let busy = matches!(pipeline.state(), PipelineState::Rendering | PipelineState::Compiling);
        let first = if busy {
            match rx.try_recv() {
                Ok(cmd) => Some(cmd),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            }
        } else {
            match rx.recv() {
                Ok(cmd) => Some(cmd),
                Err(_) => break, // Channel closed
            }
        };

        if let Some(first) = first {
            for cmd in drain_to_latest(&rx, first) {
                if !apply(&mut pipeline, cmd, &tx) {
                    return;
                }
            }
        }

        if let Err(err) = pipeline.pump() {
            if tx.send(WorkerResult::Error(err.to_string())).is_err() {
                break;
            }
        }
        for event in events.try_iter() {
            if tx.send(WorkerResult::Event(event)).is_err() {
                return; // Host disconnected
            }
        }

        match pipeline.state() {
            PipelineState::Compiling => thread::sleep(Duration::from_millis(1)),
            PipelineState::Rendering => thread::yield_now(),
            PipelineState::Idle | PipelineState::Invalid => {}
        }
    }
}

/// Run one command. Returns false on shutdown or when the host is gone.
fn apply(pipeline: &mut RenderPipeline, cmd: WorkerCommand, tx: &Sender<WorkerResult>) -> bool {
    tracing::trace!(?cmd, "worker command");
    let result = match cmd {
        WorkerCommand::Compile(scene) => pipeline.compile_async(&scene),
        WorkerCommand::UpdateScene(scene) => pipeline.update_scene(&scene),
        WorkerCommand::Render => pipeline.render(),
        WorkerCommand::Restart => pipeline.restart(),
        WorkerCommand::Stop => {
            pipeline.stop();
            Ok(())
        }
        WorkerCommand::Resize { width, height } => pipeline.resize_view(width, height),
        WorkerCommand::SetRenderSize(size) => pipeline.set_render_size(size),
        WorkerCommand::Invalidate(reason) => {
            pipeline.set_invalid(reason);
            Ok(())
        }
        WorkerCommand::ReadFinal => pipeline.read_final().map(|pixels| {
            let (width, height) = pipeline.render_dimensions();
            let samples = pipeline.sample_count();
            let _ = tx.send(WorkerResult::Image { width, height, samples, pixels });
        }),
        WorkerCommand::Shutdown => return false,
    };
    match result {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!("worker command failed: {err}");
            tx.send(WorkerResult::Error(err.to_string())).is_ok()
        }
    }
}

/// Drain queued commands, keeping only the newest scene update and resize.
///
/// Dragging a slider or a window edge queues many of these; only the last
/// one matters. Everything else keeps its order.
fn drain_to_latest(rx: &Receiver<WorkerCommand>, first: WorkerCommand) -> Vec<WorkerCommand> {
    let mut queue = vec![first];
    queue.extend(rx.try_iter());

    let mut seen_update = false;
    let mut seen_resize = false;
    let mut latest: Vec<WorkerCommand> = queue
        .into_iter()
        .rev()
        .filter(|cmd| match cmd {
            WorkerCommand::UpdateScene(_) => !std::mem::replace(&mut seen_update, true),
            WorkerCommand::Resize { .. } => !std::mem::replace(&mut seen_resize, true),
            _ => true,
        })
        .collect();
    latest.reverse();
    latest
}
