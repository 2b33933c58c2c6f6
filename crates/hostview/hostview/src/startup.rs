//! UI-ready rendezvous
//!
//! The emulation thread must not produce frames before a consumer exists.
//! It blocks in [`StartupWait::wait`] until the UI thread has built its view
//! and called [`StartupSignal::notify`], which hands over the
//! [`DisplayHandle`] frames are pushed through. The wait has no timeout.

use tokio::sync::oneshot;

use crate::display::DisplayHandle;
use crate::error::BridgeError;

/// Create a linked (UI side, emulation side) pair
pub fn channel() -> (StartupSignal, StartupWait) {
    let (tx, rx) = oneshot::channel();
    (StartupSignal { tx }, StartupWait { rx })
}

/// UI half: fired once the view exists
pub struct StartupSignal {
    tx: oneshot::Sender<DisplayHandle>,
}

impl StartupSignal {
    /// Release the waiting emulation thread.
    ///
    /// Dropping the signal without calling this aborts startup on the
    /// waiting side.
    pub fn notify(self, handle: DisplayHandle) {
        if self.tx.send(handle).is_err() {
            tracing::debug!("startup waiter went away before the view was ready");
        } else {
            tracing::debug!("display ready");
        }
    }
}

/// Emulation half: blocks until the UI is ready
pub struct StartupWait {
    rx: oneshot::Receiver<DisplayHandle>,
}

impl StartupWait {
    /// Block the calling thread until the view exists.
    ///
    /// Must not be called from inside an async runtime; use
    /// [`StartupWait::wait_async`] there.
    pub fn wait(self) -> Result<DisplayHandle, BridgeError> {
        self.rx
            .blocking_recv()
            .map_err(|_| BridgeError::StartupAborted)
    }

    /// Async variant of [`StartupWait::wait`]
    pub async fn wait_async(self) -> Result<DisplayHandle, BridgeError> {
        self.rx.await.map_err(|_| BridgeError::StartupAborted)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::surface_store::SurfaceStore;
    use std::sync::Arc;

    #[test]
    fn wait_returns_the_notified_handle() {
        let (signal, wait) = channel();
        let store = Arc::new(SurfaceStore::new());
        let ui = std::thread::spawn({
            let store = store.clone();
            move || signal.notify(DisplayHandle::new(store))
        });
        let handle = wait.wait().unwrap();
        ui.join().unwrap();
        assert!(Arc::ptr_eq(handle.store(), &store));
    }

    #[test]
    fn dropped_signal_aborts_startup() {
        let (signal, wait) = channel();
        drop(signal);
        assert!(matches!(wait.wait(), Err(BridgeError::StartupAborted)));
    }

    #[tokio::test]
    async fn async_wait() {
        let (signal, wait) = channel();
        signal.notify(DisplayHandle::new(Arc::new(SurfaceStore::new())));
        assert!(wait.wait_async().await.is_ok());
    }
}
