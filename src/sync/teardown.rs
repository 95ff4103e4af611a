//! Idempotent teardown capability returned by activation.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use tokio::task::JoinHandle;

use super::controller::ControllerInner;

/// State shared between one session task and its teardown handles.
pub(crate) struct SessionShared {
    inner: Arc<ControllerInner>,
    task: StdMutex<Option<JoinHandle<()>>>,
    ended: AtomicBool,
    released: AtomicBool,
}

impl SessionShared {
    pub(crate) fn new(inner: Arc<ControllerInner>) -> Self {
        Self {
            inner,
            task: StdMutex::new(None),
            ended: AtomicBool::new(false),
            released: AtomicBool::new(false),
        }
    }

    pub(crate) fn inner(&self) -> &Arc<ControllerInner> {
        &self.inner
    }

    pub(crate) fn attach(&self, task: JoinHandle<()>) {
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
    }

    fn take_task(&self) -> Option<JoinHandle<()>> {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Mark the session as over. Returns whether this call ended it.
    fn end(&self) -> bool {
        !self.ended.swap(true, Ordering::AcqRel)
    }

    /// Release the session's controller resources, once.
    fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.inner.release();
        }
    }
}

/// Owned by the session task; ends and releases the session when dropped.
pub(crate) struct SessionExit {
    shared: Arc<SessionShared>,
}

impl SessionExit {
    pub(crate) fn new(shared: Arc<SessionShared>) -> Self {
        Self { shared }
    }
}

impl Drop for SessionExit {
    fn drop(&mut self) {
        self.shared.end();
        self.shared.release();
    }
}

/// Tears down one controller session.
///
/// Cloneable; only the first teardown does anything, later calls (and calls
/// after the session ended on its own through a disconnect) are no-ops.
#[derive(Clone)]
pub struct TeardownHandle {
    shared: Arc<SessionShared>,
}

impl TeardownHandle {
    pub(crate) fn new(shared: Arc<SessionShared>) -> Self {
        Self { shared }
    }

    /// Stop the session and wait until its subscriptions and poll timer
    /// are dropped. Returns whether this call did the teardown.
    pub async fn teardown(&self) -> bool {
        let ended_here = self.shared.end();
        if let Some(task) = self.shared.take_task() {
            task.abort();
            // Cancelled is the expected outcome; a finished task is fine too.
            let _ = task.await;
        }
        self.shared.release();
        ended_here
    }

    /// Stop the session without waiting for the task to unwind.
    pub(crate) fn teardown_now(&self) -> bool {
        let ended_here = self.shared.end();
        if let Some(task) = self.shared.take_task() {
            task.abort();
        }
        self.shared.release();
        ended_here
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.released.load(Ordering::Acquire)
    }
}

impl fmt::Debug for TeardownHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeardownHandle")
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}
