//! Peak resident memory sampling for a running child

use codeon_core::{MEMORY_SAMPLE_INTERVAL, SAMPLER_JOIN_TIMEOUT};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use sysinfo::{Pid, System};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Background task polling one process's resident set size
///
/// Scoped to a single run: started after spawn, stopped by [`finish`] once the
/// child has exited. It also ends by itself when the process disappears.
///
/// [`finish`]: MemorySampler::finish
pub struct MemorySampler {
    peak_bytes: Arc<AtomicU64>,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl MemorySampler {
    pub fn start(pid: u32) -> Self {
        let peak_bytes = Arc::new(AtomicU64::new(0));
        let (stop, stopped) = oneshot::channel();
        let handle = tokio::spawn(sample(Pid::from_u32(pid), Arc::clone(&peak_bytes), stopped));

        Self {
            peak_bytes,
            stop: Some(stop),
            handle,
        }
    }

    fn peak_bytes(&self) -> u64 {
        self.peak_bytes.load(Ordering::Relaxed)
    }

    /// Stop sampling and return the peak in bytes
    ///
    /// Waits at most `SAMPLER_JOIN_TIMEOUT` for the task; the peak recorded
    /// so far is returned either way.
    pub async fn finish(mut self) -> u64 {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }

        if tokio::time::timeout(SAMPLER_JOIN_TIMEOUT, &mut self.handle)
            .await
            .is_err()
        {
            tracing::debug!("memory sampler did not stop in time");
            self.handle.abort();
        }

        self.peak_bytes()
    }
}

impl Drop for MemorySampler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn sample(pid: Pid, peak_bytes: Arc<AtomicU64>, mut stopped: oneshot::Receiver<()>) {
    let mut system = System::new();
    let mut ticker = tokio::time::interval(MEMORY_SAMPLE_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut stopped => break,
            _ = ticker.tick() => {
                // The process may exit between the check and the read
                if !system.refresh_process(pid) {
                    break;
                }
                match system.process(pid) {
                    Some(process) => {
                        peak_bytes.fetch_max(process.memory(), Ordering::Relaxed);
                    }
                    None => break,
                }
            }
        }
    }
}
