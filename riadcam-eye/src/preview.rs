//! Preview loop: frame store → window

use crate::device::{PreviewBackend, ESC_KEY};
use crate::store::FrameStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Idle time between render ticks.
pub const PREVIEW_TICK: Duration = Duration::from_millis(10);

/// Render the latest frame into `window_name` until `token` is cancelled or
/// ESC is pressed. ESC cancels `token` itself so the owner sees the preview
/// as stopped; capture is unaffected.
pub fn run_preview_loop(
    backend: Arc<dyn PreviewBackend>,
    window_name: String,
    store: Arc<FrameStore>,
    token: CancellationToken,
) {
    let mut window = match backend.create(&window_name) {
        Ok(window) => window,
        Err(e) => {
            warn!("Preview disabled, could not open window '{}': {}", window_name, e);
            token.cancel();
            return;
        }
    };
    info!("Preview '{}' started", window_name);

    while !token.is_cancelled() {
        if let Some(frame) = store.get() {
            if let Err(e) = window.show(&frame) {
                debug!("Preview render failed: {}", e);
            }
        }

        match window.poll_key() {
            Ok(Some(ESC_KEY)) => {
                info!("ESC pressed, closing preview (capture keeps running)");
                token.cancel();
                break;
            }
            Ok(_) => {}
            Err(e) => debug!("Preview key poll failed: {}", e),
        }

        std::thread::sleep(PREVIEW_TICK);
    }

    if let Err(e) = window.destroy() {
        debug!("Ignoring preview window release error: {}", e);
    }
    info!("Preview '{}' stopped", window_name);
}
