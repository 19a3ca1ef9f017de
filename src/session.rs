//! The serial session: at most one open port and its reader.
//!
//! A session is either Closed or Open. Open means a valid handle plus exactly
//! one [`ReaderLoop`] bound to it. `close()` stops and joins the reader before
//! the handle is released and throws away anything still queued, so once it
//! returns nothing from that connection can reach the consumer.
//!
//! If the reader dies on a read error the session closes itself the next
//! time it is touched. The `Failed` event is kept so the consumer still
//! sees it.

use crate::error::{OpenError, WriteError};
use crate::port::{PortOpener, SerialConfig, SystemPortOpener};
use crate::reader::{
    ChunkQueue, ReaderEvent, ReaderLoop, SharedPort, DEFAULT_POLL_INTERVAL, DEFAULT_QUEUE_CAPACITY,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Read timeout passed to the OS when the handle is opened.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Tunables for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub read_timeout: Duration,
    pub poll_interval: Duration,
    pub queue_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

#[derive(Debug)]
struct OpenPort {
    device: String,
    config: SerialConfig,
    port: SharedPort,
    reader: ReaderLoop,
}

#[derive(Debug, Default)]
enum SessionState {
    #[default]
    Closed,
    Open(OpenPort),
}

/// Owner of the serial connection.
#[derive(Debug)]
pub struct SerialSession {
    opener: Box<dyn PortOpener>,
    options: SessionOptions,
    queue: ChunkQueue,
    state: SessionState,
}

impl SerialSession {
    /// A closed session that opens handles through `opener`.
    pub fn new(opener: impl PortOpener + 'static, options: SessionOptions) -> Self {
        Self {
            opener: Box::new(opener),
            options,
            queue: ChunkQueue::new(options.queue_capacity),
            state: SessionState::Closed,
        }
    }

    /// A closed session backed by real OS serial devices.
    pub fn system(options: SessionOptions) -> Self {
        Self::new(SystemPortOpener, options)
    }

    /// Open `device_id` with `config` and start the reader.
    ///
    /// Opening while already open fails with [`OpenError::AlreadyOpen`] and
    /// leaves the current connection alone.
    pub fn open(&mut self, device_id: &str, config: SerialConfig) -> Result<(), OpenError> {
        let device = device_id.trim();
        if device.is_empty() {
            return Err(OpenError::NoDeviceSelected);
        }
        if self.is_open() {
            return Err(OpenError::AlreadyOpen);
        }

        let handle = self
            .opener
            .open(device, &config, self.options.read_timeout)
            .map_err(|e| {
                warn!(device, error = %e, "failed to open serial port");
                OpenError::from(e)
            })?;
        let port: SharedPort = Arc::new(Mutex::new(handle));

        // a failure report from the previous connection survives the reopen
        self.queue.discard_chunks();
        let reader = ReaderLoop::spawn(
            Arc::clone(&port),
            self.queue.clone(),
            self.options.poll_interval,
        )
        .map_err(|e| OpenError::DeviceUnavailable(format!("cannot start reader thread: {e}")))?;

        info!(device, %config, "serial port opened");
        self.state = SessionState::Open(OpenPort {
            device: device.to_string(),
            config,
            port,
            reader,
        });
        Ok(())
    }

    /// Stop the reader, release the handle, drop undelivered chunks.
    /// Does nothing when already closed. An undelivered read failure stays
    /// queued for the next [`drain_events`](Self::drain_events).
    pub fn close(&mut self) {
        if let Some(device) = self.teardown() {
            info!(device = %device, "serial port closed");
        }
        self.queue.discard_chunks();
    }

    /// Write all of `bytes`. No framing is added.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        self.reap_failed_reader();
        let SessionState::Open(open) = &self.state else {
            return Err(WriteError::NotOpen);
        };

        open.port
            .lock()
            .write_all_bytes(bytes)
            .map_err(|e| WriteError::IoFailure(e.to_string()))?;
        debug!(device = %open.device, bytes = bytes.len(), "serial write");
        Ok(())
    }

    /// Hand queued reader events to the caller without blocking.
    pub fn drain_events(&mut self) -> Vec<ReaderEvent> {
        self.reap_failed_reader();
        self.queue.drain()
    }

    pub fn is_open(&mut self) -> bool {
        self.reap_failed_reader();
        matches!(self.state, SessionState::Open(_))
    }

    /// Device of the open connection.
    pub fn device(&self) -> Option<&str> {
        match &self.state {
            SessionState::Open(open) => Some(&open.device),
            SessionState::Closed => None,
        }
    }

    /// Framing of the open connection.
    pub fn config(&self) -> Option<SerialConfig> {
        match &self.state {
            SessionState::Open(open) => Some(open.config),
            SessionState::Closed => None,
        }
    }

    /// Chunks discarded because the consumer fell behind.
    pub fn dropped_chunks(&self) -> u64 {
        self.queue.dropped()
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    /// Close the session if its reader exited on its own.
    fn reap_failed_reader(&mut self) {
        let failed = matches!(&self.state, SessionState::Open(open) if open.reader.is_finished());
        if failed {
            if let Some(device) = self.teardown() {
                warn!(device = %device, "serial reader stopped after an error, session closed");
            }
        }
    }

    /// Join the reader, then release the handle. Returns the device that was
    /// open, if any. The queue is left as is.
    fn teardown(&mut self) -> Option<String> {
        match std::mem::take(&mut self.state) {
            SessionState::Open(mut open) => {
                open.reader.stop();
                drop(open.port);
                Some(open.device)
            }
            SessionState::Closed => None,
        }
    }
}

impl Drop for SerialSession {
    fn drop(&mut self) {
        self.close();
    }
}
