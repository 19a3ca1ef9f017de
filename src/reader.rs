//! Background reader for an open serial handle.
//!
//! One thread per open session polls the handle for available bytes and
//! pushes each burst, unsplit, into a [`ChunkQueue`]. The queue is bounded;
//! when the consumer falls behind the oldest event is dropped and counted.

use crate::port::{PortError, SerialPortAdapter};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Sleep between polls when nothing is pending.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Events buffered between the reader and the consumer.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// While the consumer stays behind, only every this-many drops is logged.
pub const DROP_LOG_INTERVAL: u64 = 1000;

/// Handle shared by the session (writes) and the reader (reads).
pub type SharedPort = Arc<Mutex<Box<dyn SerialPortAdapter>>>;

/// What the reader hands to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    /// Bytes from one availability burst.
    Chunk(Vec<u8>),
    /// The handle failed; the reader has stopped.
    Failed(String),
}

#[derive(Debug)]
struct QueueState {
    events: VecDeque<ReaderEvent>,
    capacity: usize,
    dropped: u64,
    // set by the first drop, cleared by the next drain
    overflowing: bool,
}

/// Bounded, drop-oldest hand-off between the reader thread and the consumer.
///
/// Both sides only hold the lock for a push or a drain, so neither waits on
/// the other.
#[derive(Debug, Clone)]
pub struct ChunkQueue {
    inner: Arc<Mutex<QueueState>>,
}

impl ChunkQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(QueueState {
                events: VecDeque::with_capacity(capacity.min(64)),
                capacity,
                dropped: 0,
                overflowing: false,
            })),
        }
    }

    /// Append an event, discarding the oldest one if the queue is full.
    ///
    /// The first drop after a drain is logged, then one in every
    /// [`DROP_LOG_INTERVAL`] until the consumer catches up.
    pub fn push(&self, event: ReaderEvent) {
        let report = {
            let mut state = self.inner.lock();
            let mut report = None;
            if state.events.len() >= state.capacity {
                state.events.pop_front();
                state.dropped += 1;
                let since = state.dropped;
                if !state.overflowing || since % DROP_LOG_INTERVAL == 0 {
                    report = Some((since, state.capacity));
                }
                state.overflowing = true;
            }
            state.events.push_back(event);
            report
        };

        if let Some((dropped_total, capacity)) = report {
            warn!(dropped_total, capacity, "receive queue full, dropping oldest chunks");
        }
    }

    /// Take everything queued, oldest first.
    pub fn drain(&self) -> Vec<ReaderEvent> {
        let mut state = self.inner.lock();
        state.overflowing = false;
        state.events.drain(..).collect()
    }

    /// Discard queued chunks. A pending [`ReaderEvent::Failed`] is kept so
    /// the consumer still learns why the reader stopped.
    pub fn discard_chunks(&self) {
        self.inner
            .lock()
            .events
            .retain(|event| matches!(event, ReaderEvent::Failed(_)));
    }

    /// Whether a push has dropped an event since the last drain.
    pub fn is_overflowing(&self) -> bool {
        self.inner.lock().overflowing
    }

    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().events.is_empty()
    }

    /// Events discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.inner.lock().dropped
    }
}

impl Default for ChunkQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

/// A running reader thread bound to one handle.
///
/// Dropping it stops and joins the thread.
#[derive(Debug)]
pub struct ReaderLoop {
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ReaderLoop {
    /// Start polling `port`, delivering into `queue`.
    pub fn spawn(port: SharedPort, queue: ChunkQueue, poll_interval: Duration) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let thread_stop = Arc::clone(&stop);
        let thread_finished = Arc::clone(&finished);
        let handle = thread::Builder::new()
            .name("serial-reader".to_string())
            .spawn(move || {
                if let Err(e) = poll_port(&port, &queue, &thread_stop, poll_interval) {
                    error!(error = %e, "serial read failed, reader stopping");
                    queue.push(ReaderEvent::Failed(e.to_string()));
                }
                thread_finished.store(true, Ordering::Release);
            })?;

        Ok(Self {
            stop,
            finished,
            handle: Some(handle),
        })
    }

    /// Ask the thread to stop and wait for it. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("serial reader thread panicked");
            }
        }
    }

    /// True once the thread has exited, for whatever reason.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

impl Drop for ReaderLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Poll until `stop` is set or the handle fails.
fn poll_port(
    port: &SharedPort,
    queue: &ChunkQueue,
    stop: &AtomicBool,
    poll_interval: Duration,
) -> Result<(), PortError> {
    while !stop.load(Ordering::Acquire) {
        let chunk = {
            let mut port = port.lock();
            let available = port.bytes_to_read()?;
            if available == 0 {
                Vec::new()
            } else {
                let mut buffer = vec![0u8; available];
                let n = match port.read_bytes(&mut buffer) {
                    Ok(n) => n,
                    Err(PortError::Io(e)) if is_transient(&e) => 0,
                    Err(e) => return Err(e),
                };
                buffer.truncate(n);
                buffer
            }
        };

        if chunk.is_empty() {
            thread::sleep(poll_interval);
            continue;
        }
        // close() may have started while we were reading
        if stop.load(Ordering::Acquire) {
            break;
        }
        debug!(bytes = chunk.len(), "serial chunk received");
        queue.push(ReaderEvent::Chunk(chunk));
    }
    Ok(())
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
