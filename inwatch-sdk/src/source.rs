use crate::{EventMask, WatchError, error::Result};
use std::{
    ffi::CString,
    io,
    os::{
        fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd},
        unix::ffi::OsStrExt,
    },
    path::Path,
};

/// Makes `inotify_add_watch` fail with EEXIST instead of replacing the mask of
/// a watch the descriptor already holds on the same inode (Linux 4.18+).
const IN_MASK_CREATE: u32 = 0x1000_0000;

/// The inotify descriptor every watch reports through.
///
/// Opened non-blocking: readiness comes from the poller, and a read that
/// finds nothing returns zero bytes instead of parking the thread.
#[derive(Debug)]
pub struct ChangeSource {
    fd: OwnedFd,
}

impl ChangeSource {
    pub fn open() -> Result<Self> {
        let fd = unsafe { libc::inotify_init1(libc::IN_NONBLOCK | libc::IN_CLOEXEC) };
        if fd == -1 {
            return Err(WatchError::from_init(io::Error::last_os_error()));
        }
        // SAFETY: `fd` was just returned by the kernel and nothing else owns it.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(Self { fd })
    }

    /// Raw `inotify_add_watch`. Ownership of the returned handle belongs to
    /// the `WatchRegistry`, which is the only caller.
    ///
    /// Never modifies an existing watch: an inode that is already watched
    /// through any name fails with EEXIST.
    pub(crate) fn add_watch(&self, path: &Path, mask: EventMask) -> io::Result<i32> {
        let path = CString::new(path.as_os_str().as_bytes())?;
        let wd = unsafe {
            libc::inotify_add_watch(
                self.fd.as_raw_fd(),
                path.as_ptr(),
                mask.bits() | IN_MASK_CREATE,
            )
        };
        match wd {
            -1 => Err(io::Error::last_os_error()),
            _ => Ok(wd),
        }
    }

    pub(crate) fn rm_watch(&self, wd: i32) -> io::Result<()> {
        let result = unsafe { libc::inotify_rm_watch(self.fd.as_raw_fd(), wd) };
        match result {
            0 => Ok(()),
            _ => Err(io::Error::last_os_error()),
        }
    }

    /// Reads whatever records are queued into `buffer`.
    ///
    /// Returns `Ok(0)` when nothing is queued. A kernel end-of-file is
    /// reported as `UnexpectedEof`, since an inotify descriptor never ends.
    pub fn read(&self, buffer: &mut [u8]) -> io::Result<usize> {
        let num_bytes = unsafe {
            libc::read(
                self.fd.as_raw_fd(),
                buffer.as_mut_ptr() as *mut libc::c_void,
                buffer.len(),
            )
        };
        match num_bytes {
            0 => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "`read` returned `0` on the change source",
            )),
            -1 => {
                let error = io::Error::last_os_error();
                if error.kind() == io::ErrorKind::WouldBlock {
                    Ok(0)
                } else {
                    Err(error)
                }
            }
            n if n < 0 => Err(io::Error::other(format!(
                "`read` returned unexpected value {n}"
            ))),
            n => Ok(n as usize),
        }
    }
}

impl AsFd for ChangeSource {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for ChangeSource {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}
