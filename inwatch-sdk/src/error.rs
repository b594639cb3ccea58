use std::{fmt, io, path::Path};

pub type Result<T, E = WatchError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The request can never succeed as issued: missing path, unsupported
    /// target, duplicate registration.
    #[error("invalid argument: {context}")]
    InvalidArgument {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("{limit} reached")]
    ResourceExhausted {
        limit: Limit,
        #[source]
        source: io::Error,
    },
    #[error("insufficient kernel memory")]
    OutOfMemory(#[source] io::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The specific kernel or process limit behind a `ResourceExhausted` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// `/proc/sys/fs/inotify/max_user_instances`, or the per-process
    /// descriptor limit; the kernel reports both as EMFILE.
    InotifyInstances,
    /// `/proc/sys/fs/inotify/max_user_watches`.
    InotifyWatches,
    /// `/proc/sys/fs/epoll/max_user_watches`.
    EpollWatches,
    ProcessDescriptors,
    SystemDescriptors,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Limit::InotifyInstances => {
                "inotify instance limit (fs.inotify.max_user_instances or open descriptor limit)"
            }
            Limit::InotifyWatches => "inotify watch limit (fs.inotify.max_user_watches)",
            Limit::EpollWatches => "epoll watch limit (fs.epoll.max_user_watches)",
            Limit::ProcessDescriptors => "per-process open descriptor limit",
            Limit::SystemDescriptors => "system-wide open file limit",
        })
    }
}

impl WatchError {
    pub(crate) fn invalid(context: impl Into<String>, source: io::Error) -> Self {
        WatchError::InvalidArgument {
            context: context.into(),
            source,
        }
    }

    /// Maps a failed `inotify_init1`.
    pub(crate) fn from_init(err: io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::EMFILE) => Self::exhausted(Limit::InotifyInstances, err),
            Some(libc::ENFILE) => Self::exhausted(Limit::SystemDescriptors, err),
            Some(libc::ENOMEM) => WatchError::OutOfMemory(err),
            _ => WatchError::Io(err),
        }
    }

    /// Maps a failed `epoll_create1`.
    pub(crate) fn from_epoll_create(err: io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::EMFILE) => Self::exhausted(Limit::ProcessDescriptors, err),
            Some(libc::ENFILE) => Self::exhausted(Limit::SystemDescriptors, err),
            Some(libc::ENOMEM) => WatchError::OutOfMemory(err),
            _ => WatchError::Io(err),
        }
    }

    /// Maps a failed `epoll_ctl(EPOLL_CTL_ADD)`.
    pub(crate) fn from_epoll_register(err: io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::EEXIST) => Self::invalid("change source is already registered", err),
            Some(libc::EBADF | libc::EINVAL | libc::EPERM | libc::ELOOP) => {
                Self::invalid("change source cannot be polled", err)
            }
            Some(libc::ENOSPC) => Self::exhausted(Limit::EpollWatches, err),
            Some(libc::ENOMEM) => WatchError::OutOfMemory(err),
            _ => WatchError::Io(err),
        }
    }

    /// Maps a failed `inotify_add_watch` on `path`.
    pub(crate) fn from_add_watch(path: &Path, err: io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::ENOSPC) => Self::exhausted(Limit::InotifyWatches, err),
            Some(libc::ENOMEM) => WatchError::OutOfMemory(err),
            Some(
                libc::ENOENT
                | libc::ENOTDIR
                | libc::EACCES
                | libc::EINVAL
                | libc::ENAMETOOLONG
                | libc::ELOOP
                | libc::EEXIST,
            ) => Self::invalid(format!("cannot watch `{}`", path.display()), err),
            // Paths with an interior NUL never reach the kernel.
            None if err.kind() == io::ErrorKind::InvalidInput => {
                Self::invalid(format!("cannot watch `{}`", path.display()), err)
            }
            _ => WatchError::Io(err),
        }
    }

    fn exhausted(limit: Limit, source: io::Error) -> Self {
        WatchError::ResourceExhausted { limit, source }
    }
}
