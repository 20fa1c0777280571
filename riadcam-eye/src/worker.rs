//! Background loop threads with cooperative cancellation

use std::thread::{self, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::error;

/// A spawned loop thread plus the token that stops it.
pub(crate) struct LoopHandle {
    name: &'static str,
    token: CancellationToken,
    thread: JoinHandle<()>,
}

impl LoopHandle {
    /// Spawn `body` on a named thread. The body must return once the token
    /// is cancelled.
    pub(crate) fn spawn<F>(name: &'static str, body: F) -> std::io::Result<Self>
    where
        F: FnOnce(CancellationToken) + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();
        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(child))?;
        Ok(Self { name, token, thread })
    }

    /// The loop has neither been cancelled nor returned on its own.
    pub(crate) fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.thread.is_finished()
    }

    /// Cancel and wait for the thread to exit.
    pub(crate) fn stop(self) {
        self.token.cancel();
        if self.thread.join().is_err() {
            error!("{} thread panicked", self.name);
        }
    }
}
