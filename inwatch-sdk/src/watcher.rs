use crate::{
    ChangeChannel, ChangeSource, EventMask, EventStream, Poller, WatchConfig, WatchError,
    WatchHandle, WatchRegistry, error::Result,
};
use std::{io, path::Path, time::Duration};
use tracing::debug;

/// The kernel side of a watch session: change source, poller and the
/// registry of watched paths, released together when dropped.
#[derive(Debug)]
pub struct EventWatcher {
    registry: WatchRegistry,
    poller: Poller,
    source: ChangeSource,
}

impl EventWatcher {
    /// Opens the change source and registers it with a fresh poller. No path
    /// is watched yet.
    pub fn open() -> Result<Self> {
        let source = ChangeSource::open()?;
        let poller = Poller::open()?;
        poller.register(&source)?;
        Ok(Self {
            registry: WatchRegistry::new(),
            poller,
            source,
        })
    }

    /// Opens a watcher and adds every path in order. If any path fails, the
    /// ones already added are revoked before the error is returned.
    pub fn with_paths<I, P>(paths: I, mask: EventMask) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut watcher = Self::open()?;
        for path in paths {
            watcher.add(path, mask)?;
        }
        if watcher.registry.is_empty() {
            return Err(WatchError::invalid(
                "no paths to watch",
                io::Error::from(io::ErrorKind::InvalidInput),
            ));
        }
        Ok(watcher)
    }

    pub fn add(&mut self, path: impl AsRef<Path>, mask: EventMask) -> Result<WatchHandle> {
        self.registry.add(&self.source, path, mask)
    }

    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }

    /// Revokes every watch now instead of at drop.
    pub fn remove_all(&mut self) {
        self.registry.remove_all(&self.source);
    }
}

impl Drop for EventWatcher {
    fn drop(&mut self) {
        debug!(watches = self.registry.len(), "tearing down watcher");
        self.registry.remove_all(&self.source);
    }
}

impl ChangeChannel for EventWatcher {
    fn wait_ready(&mut self, timeout: Duration) -> io::Result<bool> {
        self.poller.wait(timeout)
    }

    fn read_chunk(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        self.source.read(buffer)
    }

    fn describe(&self, handle: i32) -> Option<String> {
        self.registry
            .path_of(WatchHandle::from(handle))
            .map(|path| path.display().to_string())
    }
}

impl EventStream<EventWatcher> {
    /// Watches `paths` with `config.mask` and wraps the result in a ready
    /// event stream.
    pub fn watch<I, P>(paths: I, config: &WatchConfig) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let watcher = EventWatcher::with_paths(paths, config.mask)?;
        Ok(EventStream::new(watcher, config))
    }
}
