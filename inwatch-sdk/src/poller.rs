use crate::{WatchError, error::Result};
use std::{
    io,
    os::fd::{AsRawFd, FromRawFd, OwnedFd},
    time::Duration,
};
use tracing::warn;

/// Token carried by the change source's epoll registration.
const SOURCE_TOKEN: u64 = 1;
const MAX_EVENTS: usize = 8;

/// An epoll context holding the change source as its only interest.
#[derive(Debug)]
pub struct Poller {
    fd: OwnedFd,
}

impl Poller {
    pub fn open() -> Result<Self> {
        let fd = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        if fd == -1 {
            return Err(WatchError::from_epoll_create(io::Error::last_os_error()));
        }
        // SAFETY: `fd` was just returned by the kernel and nothing else owns it.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(Self { fd })
    }

    /// Adds `source` for read readiness. Registering a second time fails with
    /// `InvalidArgument`, which is what the kernel answers with EEXIST.
    pub fn register(&self, source: &impl AsRawFd) -> Result<()> {
        let mut event = libc::epoll_event {
            events: libc::EPOLLIN as u32,
            u64: SOURCE_TOKEN,
        };
        let result = unsafe {
            libc::epoll_ctl(
                self.fd.as_raw_fd(),
                libc::EPOLL_CTL_ADD,
                source.as_raw_fd(),
                &mut event,
            )
        };
        if result == -1 {
            return Err(WatchError::from_epoll_register(io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Waits up to `timeout` for the change source to become readable.
    ///
    /// `Ok(false)` means the wait timed out. Signal interruptions come back as
    /// `ErrorKind::Interrupted` for the caller to retry.
    pub fn wait(&self, timeout: Duration) -> io::Result<bool> {
        let mut events = [libc::epoll_event { events: 0, u64: 0 }; MAX_EVENTS];
        let ready = unsafe {
            libc::epoll_wait(
                self.fd.as_raw_fd(),
                events.as_mut_ptr(),
                MAX_EVENTS as libc::c_int,
                timeout_ms(timeout),
            )
        };
        if ready == -1 {
            return Err(io::Error::last_os_error());
        }
        let mut source_ready = false;
        for event in &events[..ready as usize] {
            let token = event.u64;
            if token == SOURCE_TOKEN {
                source_ready = true;
            } else {
                warn!(token, "readiness reported for an unknown token");
            }
        }
        Ok(source_ready)
    }
}

/// Whole milliseconds for `epoll_wait`, rounded up so that a non-zero
/// timeout never turns into a non-blocking poll.
fn timeout_ms(timeout: Duration) -> libc::c_int {
    timeout
        .as_nanos()
        .div_ceil(1_000_000)
        .min(libc::c_int::MAX as u128) as libc::c_int
}
