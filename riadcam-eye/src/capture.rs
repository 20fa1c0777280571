//! Capture loop: device → frame store

use crate::device::CaptureDevice;
use crate::store::FrameStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Pause after a failed read before trying again.
pub const READ_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Consecutive read failures between two warnings (~5s at the retry delay).
const FAILURE_WARN_EVERY: u64 = 500;

/// Counters shared between the capture thread and the controller.
#[derive(Debug, Default)]
pub struct CaptureStats {
    frames: AtomicU64,
    read_failures: AtomicU64,
}

/// Point-in-time copy of [`CaptureStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStatsSnapshot {
    pub frames: u64,
    pub read_failures: u64,
}

impl CaptureStats {
    pub fn snapshot(&self) -> CaptureStatsSnapshot {
        CaptureStatsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
        }
    }
}

/// Read frames into `store` until `token` is cancelled, then release the device.
///
/// Read failures never end the loop; the device is retried every
/// [`READ_RETRY_DELAY`].
pub fn run_capture_loop(
    mut device: Box<dyn CaptureDevice>,
    store: Arc<FrameStore>,
    stats: Arc<CaptureStats>,
    token: CancellationToken,
) {
    info!("Capture loop started");
    let mut consecutive_failures: u64 = 0;

    while !token.is_cancelled() {
        match device.read() {
            Ok(frame) => {
                if consecutive_failures >= FAILURE_WARN_EVERY {
                    info!("Camera recovered after {} failed reads", consecutive_failures);
                }
                consecutive_failures = 0;
                store.put(frame);
                stats.frames.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                consecutive_failures += 1;
                stats.read_failures.fetch_add(1, Ordering::Relaxed);
                debug!("Camera read failed: {}", e);
                if consecutive_failures % FAILURE_WARN_EVERY == 0 {
                    warn!(
                        "Camera has failed {} reads in a row, still retrying: {}",
                        consecutive_failures, e
                    );
                }
                std::thread::sleep(READ_RETRY_DELAY);
            }
        }
    }

    device.release();
    info!("Capture loop stopped, device released");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CameraError, Result};
    use crate::frame::Frame;
    use std::sync::atomic::AtomicBool;

    /// Fails the first `fail_first` reads, then yields frames whose shade
    /// counts up. Cancels the token after `stop_after` successful reads.
    struct ScriptedDevice {
        fail_first: u32,
        stop_after: u8,
        shade: u8,
        token: CancellationToken,
        released: Arc<AtomicBool>,
    }

    impl CaptureDevice for ScriptedDevice {
        fn read(&mut self) -> Result<Frame> {
            if self.fail_first > 0 {
                self.fail_first -= 1;
                return Err(CameraError::Device("no frame".to_string()));
            }
            self.shade += 1;
            if self.shade >= self.stop_after {
                self.token.cancel();
            }
            Ok(Frame::solid(2, 2, [self.shade; 3]))
        }

        fn release(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_retries_after_failures_and_stores_latest() {
        let token = CancellationToken::new();
        let released = Arc::new(AtomicBool::new(false));
        let device = ScriptedDevice {
            fail_first: 3,
            stop_after: 4,
            shade: 0,
            token: token.clone(),
            released: released.clone(),
        };
        let store = Arc::new(FrameStore::new());
        let stats = Arc::new(CaptureStats::default());

        run_capture_loop(Box::new(device), store.clone(), stats.clone(), token);

        assert_eq!(store.get().unwrap().data[0], 4);
        assert_eq!(
            stats.snapshot(),
            CaptureStatsSnapshot { frames: 4, read_failures: 3 }
        );
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn test_cancelled_before_start_only_releases() {
        let token = CancellationToken::new();
        token.cancel();
        let released = Arc::new(AtomicBool::new(false));
        let device = ScriptedDevice {
            fail_first: 0,
            stop_after: 1,
            shade: 0,
            token: token.clone(),
            released: released.clone(),
        };
        let store = Arc::new(FrameStore::new());

        run_capture_loop(Box::new(device), store.clone(), Arc::default(), token);

        assert!(store.get().is_none());
        assert!(released.load(Ordering::SeqCst));
    }
}
