use crate::{ChangeSource, EventMask, WatchError, error::Result};
use std::{
    io,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Kernel-assigned identifier of one active watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WatchHandle(i32);

impl WatchHandle {
    pub fn raw(self) -> i32 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedPath {
    pub path: PathBuf,
    pub handle: WatchHandle,
}

/// Every path currently watched on a `ChangeSource`, in registration order.
///
/// Handles are only created and revoked here; everything else just looks
/// them up.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    watches: Vec<WatchedPath>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts watching `path` with `mask`.
    ///
    /// A path that is already registered is rejected with `InvalidArgument`
    /// and the existing watch keeps its mask. Literal repeats are caught here;
    /// the same inode through another name is refused by the kernel, and a
    /// reused handle is checked again as a fallback.
    pub fn add(
        &mut self,
        source: &ChangeSource,
        path: impl AsRef<Path>,
        mask: EventMask,
    ) -> Result<WatchHandle> {
        let path = path.as_ref();
        if self.watches.iter().any(|watch| watch.path == path) {
            return Err(already_watched(path));
        }
        let handle = source
            .add_watch(path, mask)
            .map(WatchHandle)
            .map_err(|e| WatchError::from_add_watch(path, e))?;
        if let Some(existing) = self.path_of(handle) {
            debug!(
                path = %path.display(),
                existing = %existing.display(),
                handle = handle.0,
                "kernel reused an active watch handle"
            );
            return Err(already_watched(path));
        }
        info!(path = %path.display(), handle = handle.0, "watching");
        self.watches.push(WatchedPath {
            path: path.to_path_buf(),
            handle,
        });
        Ok(handle)
    }

    /// Revokes every handle. Watches the kernel already dropped (the watched
    /// file was deleted or its filesystem unmounted) fail to remove; that is
    /// only logged. Calling this on an empty registry does nothing.
    pub fn remove_all(&mut self, source: &ChangeSource) {
        for watch in self.watches.drain(..) {
            match source.rm_watch(watch.handle.0) {
                Ok(()) => debug!(path = %watch.path.display(), "watch removed"),
                Err(e) => debug!(
                    path = %watch.path.display(),
                    error = %e,
                    "watch already gone"
                ),
            }
        }
    }

    pub fn path_of(&self, handle: WatchHandle) -> Option<&Path> {
        self.watches
            .iter()
            .find(|watch| watch.handle == handle)
            .map(|watch| watch.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchedPath> {
        self.watches.iter()
    }
}

impl From<i32> for WatchHandle {
    fn from(raw: i32) -> Self {
        WatchHandle(raw)
    }
}

fn already_watched(path: &Path) -> WatchError {
    WatchError::invalid(
        format!("cannot watch `{}`", path.display()),
        io::Error::new(io::ErrorKind::AlreadyExists, "path is already watched"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Records;
    use tempdir::TempDir;

    #[test]
    fn add_and_look_up() {
        let dir = TempDir::new("inwatch_registry").unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"hi").unwrap();

        let source = ChangeSource::open().unwrap();
        let mut registry = WatchRegistry::new();
        let dir_handle = registry
            .add(&source, dir.path(), EventMask::DEFAULT_WATCH)
            .unwrap();
        let file_handle = registry.add(&source, &file, EventMask::DEFAULT_WATCH).unwrap();
        assert_ne!(dir_handle, file_handle);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.path_of(dir_handle), Some(dir.path()));
        assert_eq!(registry.path_of(file_handle), Some(file.as_path()));
        assert_eq!(registry.path_of(WatchHandle(i32::MAX)), None);
        let paths: Vec<_> = registry.iter().map(|w| w.path.clone()).collect();
        assert_eq!(paths, vec![dir.path().to_path_buf(), file]);
    }

    #[test]
    fn missing_path_is_invalid() {
        let dir = TempDir::new("inwatch_registry").unwrap();
        let source = ChangeSource::open().unwrap();
        let mut registry = WatchRegistry::new();
        let err = registry
            .add(&source, dir.path().join("missing"), EventMask::DEFAULT_WATCH)
            .unwrap_err();
        assert!(matches!(err, WatchError::InvalidArgument { .. }), "{err}");
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_path_is_invalid() {
        let dir = TempDir::new("inwatch_registry").unwrap();
        let source = ChangeSource::open().unwrap();
        let mut registry = WatchRegistry::new();
        registry
            .add(&source, dir.path(), EventMask::DEFAULT_WATCH)
            .unwrap();
        let err = registry
            .add(&source, dir.path(), EventMask::DEFAULT_WATCH)
            .unwrap_err();
        assert!(matches!(err, WatchError::InvalidArgument { .. }), "{err}");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn same_inode_through_another_name_is_invalid() {
        let dir = TempDir::new("inwatch_registry").unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let source = ChangeSource::open().unwrap();
        let mut registry = WatchRegistry::new();
        let handle = registry
            .add(&source, &target, EventMask::DEFAULT_WATCH)
            .unwrap();
        let err = registry.add(&source, &link, EventMask::Delete).unwrap_err();
        assert!(matches!(err, WatchError::InvalidArgument { .. }), "{err}");
        assert_eq!(registry.path_of(handle), Some(target.as_path()));
        assert_eq!(registry.len(), 1);

        // The rejected call must not have narrowed the original mask.
        std::fs::create_dir(target.join("child")).unwrap();
        let mut buffer = [0u8; 4096];
        let length = source.read(&mut buffer).unwrap();
        let created = Records::new(&buffer, length).any(|record| {
            record.handle == handle.raw()
                && record.mask.contains(EventMask::Create | EventMask::IsDir)
                && record.name_bytes() == b"child"
        });
        assert!(created, "no create record in {length} bytes");
    }

    #[test]
    fn remove_all_is_idempotent() {
        let dir = TempDir::new("inwatch_registry").unwrap();
        let source = ChangeSource::open().unwrap();
        let mut registry = WatchRegistry::new();
        let handle = registry
            .add(&source, dir.path(), EventMask::DEFAULT_WATCH)
            .unwrap();
        registry.remove_all(&source);
        assert!(registry.is_empty());
        registry.remove_all(&source);
        assert!(registry.is_empty());
        // The kernel no longer knows the handle either.
        assert!(source.rm_watch(handle.raw()).is_err());
    }
}
