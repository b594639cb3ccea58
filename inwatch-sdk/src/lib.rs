//! Linux filesystem change watching over a single inotify descriptor,
//! multiplexed through epoll.
//!
//! [`EventStream::watch`] sets everything up; [`EventStream::run`] then
//! decodes each chunk the kernel hands over and passes one [`Notification`]
//! per recognized record to a sink, in kernel order.
mod config;
mod error;
mod event_flag;
mod event_stream;
mod notification;
mod poller;
mod record;
mod registry;
mod source;
mod watcher;

pub use config::{DEFAULT_BUFFER_SIZE, DEFAULT_POLL_INTERVAL, MIN_BUFFER_SIZE, WatchConfig};
pub use error::{Limit, Result, WatchError};
pub use event_flag::{EventKind, EventMask};
pub use event_stream::{ChangeChannel, EventStream, StreamState, Turn};
pub use notification::{Notification, UNKNOWN_NAME};
pub use poller::Poller;
pub use record::{HEADER_SIZE, RawChangeRecord, Records};
pub use registry::{WatchHandle, WatchRegistry, WatchedPath};
pub use source::ChangeSource;
pub use stop_signal::StopToken;
pub use watcher::EventWatcher;
