use crate::{
    EventMask,
    record::{HEADER_SIZE, MAX_NAME_SIZE},
};
use std::time::Duration;

/// Smallest read buffer the kernel accepts: one header plus the longest name.
pub const MIN_BUFFER_SIZE: usize = HEADER_SIZE + MAX_NAME_SIZE;
/// Room for 1024 records with short names.
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * (HEADER_SIZE + 16);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Mask requested for every watched path.
    pub mask: EventMask,
    /// Upper bound of a single readiness wait; also how often the stop token
    /// is checked.
    pub poll_interval: Duration,
    pub buffer_size: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            mask: EventMask::DEFAULT_WATCH,
            poll_interval: DEFAULT_POLL_INTERVAL,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl WatchConfig {
    pub fn with_mask(mut self, mask: EventMask) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Buffer size actually allocated; a smaller one would make every read
    /// of a long name fail with EINVAL.
    pub fn effective_buffer_size(&self) -> usize {
        self.buffer_size.max(MIN_BUFFER_SIZE)
    }
}
