//! CPU wait on submitted GPU work.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::util::{Error, Result};

const MAX_WAITS: usize = 1000;

/// Binary semaphore signalled from a queue completion callback.
#[derive(Clone, Default)]
pub struct Fence {
    state: Arc<(Mutex<bool>, Condvar)>,
}

impl Fence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the fence for everything submitted to `queue` so far.
    pub fn arm(&self, queue: &wgpu::Queue) {
        *self.state.0.lock() = false;
        let state = self.state.clone();
        queue.on_submitted_work_done(move || {
            *state.0.lock() = true;
            state.1.notify_all();
        });
    }

    /// Block until the armed submission has completed.
    pub fn wait(&self, device: &wgpu::Device) -> Result<()> {
        for _ in 0..MAX_WAITS {
            // Callbacks run inside poll, so the lock must not be held here
            device
                .poll(wgpu::PollType::wait_indefinitely())
                .map_err(|e| Error::other(format!("device poll failed: {e}")))?;
            let mut signaled = self.state.0.lock();
            if !*signaled {
                self.state.1.wait_for(&mut signaled, Duration::from_millis(5));
            }
            if *signaled {
                return Ok(());
            }
        }
        Err(Error::other("timed out waiting for GPU work"))
    }
}
