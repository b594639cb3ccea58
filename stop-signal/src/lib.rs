use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Shared flag telling a long-running loop to wind down at its next tick.
///
/// Clones observe the same flag, so one clone can live in a signal handler
/// while the loop polls another.
#[derive(Clone, Debug, Default)]
pub struct StopToken {
    stopped: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token nobody else holds, so it never fires.
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}
