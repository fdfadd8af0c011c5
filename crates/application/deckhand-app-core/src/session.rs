use std::sync::Arc;

use tracing::debug;

use crate::ports::SessionHandle;

/// Owns a streaming connection and closes it exactly once: on [`close`],
/// or on drop when the owning task is cancelled or unwinds.
///
/// [`close`]: SessionGuard::close
pub struct SessionGuard {
    label: &'static str,
    handle: Arc<dyn SessionHandle>,
    closed: bool,
}

impl SessionGuard {
    pub fn new(label: &'static str, handle: Box<dyn SessionHandle>) -> Self {
        Self {
            label,
            handle: Arc::from(handle),
            closed: false,
        }
    }

    /// Shared handle for writing; holders must not close it themselves.
    pub fn writer(&self) -> Arc<dyn SessionHandle> {
        self.handle.clone()
    }

    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.handle.close();
        debug!("{} session closed", self.label);
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.close();
    }
}
