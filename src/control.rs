//! Cooperative cancellation primitives for in-flight workflow runs.
//!
//! A caller holds a [`CancelHandle`] and the executor polls the paired
//! [`CancelToken`] while awaiting node work. Cancellation is observed at
//! the node boundary: the in-flight node future is dropped, no patch is
//! applied, and the run fails with a cancelled error instead of a partial
//! response.

use tokio::sync::watch;

/// Creates a connected cancellation pair.
///
/// # Examples
///
/// ```rust
/// use supportflow::control::cancel_pair;
///
/// let (handle, token) = cancel_pair();
/// assert!(!token.is_cancelled());
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[must_use]
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Caller-side handle that requests cancellation of a run.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Executor-side token observed between and during node invocations.
#[derive(Clone, Debug)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Returns `true` once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when cancellation is requested.
    ///
    /// If the paired [`CancelHandle`] is dropped without cancelling, this
    /// future never resolves, so racing it against node work always lets
    /// the work win.
    pub async fn cancelled(&mut self) {
        if *self.rx.borrow() {
            return;
        }
        while self.rx.changed().await.is_ok() {
            if *self.rx.borrow() {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}
