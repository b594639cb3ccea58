use crate::{EventMask, Notification, Records, WatchConfig, WatchError, error::Result};
use stop_signal::StopToken;
use std::{io, time::Duration};
use tracing::{debug, trace, warn};

/// A readable change channel paired with its readiness wait.
///
/// `EventWatcher` is the kernel-backed implementation; tests drive the loop
/// with scripted channels.
pub trait ChangeChannel {
    /// Blocks up to `timeout`; `Ok(false)` on timeout. May fail with
    /// `ErrorKind::Interrupted`, which the loop retries.
    fn wait_ready(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Reads queued records into `buffer`, `Ok(0)` if none are queued.
    fn read_chunk(&mut self, buffer: &mut [u8]) -> io::Result<usize>;

    /// Watched path behind a record's handle, for diagnostics only.
    fn describe(&self, _handle: i32) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Uninitialized,
    Ready,
    Waiting,
    Draining,
    Closed,
}

/// Outcome of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    /// The wait timed out, nothing was read.
    Idle,
    /// A chunk was read and this many notifications went to the sink.
    Drained(usize),
}

/// The readiness loop: wait, read one chunk, decode, classify, emit.
pub struct EventStream<C> {
    channel: C,
    buffer: Vec<u8>,
    poll_interval: Duration,
    state: StreamState,
}

impl<C: ChangeChannel> EventStream<C> {
    pub fn new(channel: C, config: &WatchConfig) -> Self {
        let mut stream = Self {
            channel,
            buffer: vec![0; config.effective_buffer_size()],
            poll_interval: config.poll_interval,
            state: StreamState::Uninitialized,
        };
        stream.set_state(StreamState::Ready);
        stream
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Blocks for at most one poll interval. Interrupted waits are retried
    /// with the full interval; any other failure closes the stream.
    pub fn wait_for_readiness(&mut self) -> Result<bool> {
        self.ensure_open()?;
        self.set_state(StreamState::Waiting);
        loop {
            match self.channel.wait_ready(self.poll_interval) {
                Ok(ready) => return Ok(ready),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    trace!("readiness wait interrupted, retrying");
                }
                Err(e) => return Err(self.fail(e)),
            }
        }
    }

    /// Reads one chunk and hands every recognized record to `sink`, in
    /// buffer order. Returns the number of notifications emitted.
    pub fn drain<F>(&mut self, sink: &mut F) -> Result<usize>
    where
        F: FnMut(Notification) -> io::Result<()>,
    {
        self.ensure_open()?;
        self.set_state(StreamState::Draining);
        let length = match self.channel.read_chunk(&mut self.buffer) {
            Ok(length) => length,
            Err(e) => return Err(self.fail(e)),
        };
        let mut records = Records::new(&self.buffer, length);
        let mut emitted = 0;
        let mut decoded = 0;
        let mut sink_error = None;
        for record in records.by_ref() {
            decoded += 1;
            if let Some(path) = self.channel.describe(record.handle) {
                trace!(handle = record.handle, %path, mask = ?record.mask, "record");
            }
            if record.mask.contains(EventMask::QueueOverflow) {
                warn!("kernel event queue overflowed, events were dropped");
            }
            let Some(notification) = Notification::classify(&record) else {
                continue;
            };
            if let Err(e) = sink(notification) {
                sink_error = Some(e);
                break;
            }
            emitted += 1;
        }
        let consumed = records.consumed();
        if let Some(e) = sink_error {
            return Err(self.fail(e));
        }
        if consumed < length {
            debug!(dropped = length - consumed, "discarded partial trailing record");
        }
        debug!(bytes = length, decoded, emitted, "drained change source");
        self.set_state(StreamState::Waiting);
        Ok(emitted)
    }

    /// One wait, followed by a drain if the channel became readable.
    pub fn turn<F>(&mut self, sink: &mut F) -> Result<Turn>
    where
        F: FnMut(Notification) -> io::Result<()>,
    {
        if self.wait_for_readiness()? {
            Ok(Turn::Drained(self.drain(sink)?))
        } else {
            Ok(Turn::Idle)
        }
    }

    /// Turns until `stop` fires or a fatal error occurs. The token is checked
    /// once per poll interval.
    pub fn run<F>(&mut self, mut sink: F, stop: &StopToken) -> Result<()>
    where
        F: FnMut(Notification) -> io::Result<()>,
    {
        while !stop.is_stopped() {
            self.turn(&mut sink)?;
        }
        debug!("stop requested");
        self.set_state(StreamState::Closed);
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == StreamState::Closed {
            return Err(WatchError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "event stream is closed",
            )));
        }
        Ok(())
    }

    fn fail(&mut self, e: io::Error) -> WatchError {
        self.set_state(StreamState::Closed);
        WatchError::Io(e)
    }

    fn set_state(&mut self, state: StreamState) {
        if self.state != state {
            trace!(from = ?self.state, to = ?state, "event stream state");
            self.state = state;
        }
    }
}
