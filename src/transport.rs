//! Transport plumbing between the controller board and the frame loop
//!
//! A background thread owns the read half of the byte stream, decodes and
//! normalizes it, and pushes events into a bounded [`Mailbox`]. The frame
//! scheduler drains the mailbox without blocking and writes telemetry through
//! a [`SharedWriter`], which may be used from the scheduler thread while the
//! reader thread is blocked in `read`.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

use crate::consts::SERIAL_BAUD_RATE;
use crate::protocol::{InputEvent, LineDecoder, parse_line};

/// Back-off after a read that produced no bytes
const IDLE_BACKOFF: Duration = Duration::from_millis(5);

/// Transport failures. None of these stop the simulation.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("cannot open transport {address}: {source}")]
    Open {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot open serial port {address}: {source}")]
    Serial {
        address: String,
        #[source]
        source: serialport::Error,
    },

    #[error("transport read failed: {0}")]
    Read(#[source] io::Error),

    #[error("transport write failed: {0}")]
    Write(#[source] io::Error),

    #[error("transport writer lock poisoned")]
    Poisoned,
}

/// Cooperative stop signal shared by the reader thread and the scheduler
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Producer side of the event mailbox
#[derive(Debug, Clone)]
pub struct MailboxSender {
    tx: SyncSender<InputEvent>,
}

impl MailboxSender {
    /// Enqueue an event, waiting while the mailbox is full.
    ///
    /// Fails only when the consumer has gone away.
    pub fn send(&self, event: InputEvent) -> Result<(), InputEvent> {
        self.tx.send(event).map_err(|e| e.0)
    }
}

/// Bounded FIFO of normalized events, drained once per frame
#[derive(Debug)]
pub struct Mailbox {
    rx: Receiver<InputEvent>,
}

impl Mailbox {
    /// Create a mailbox holding up to `capacity` undelivered events
    pub fn new(capacity: usize) -> (MailboxSender, Mailbox) {
        let (tx, rx) = mpsc::sync_channel(capacity);
        (MailboxSender { tx }, Mailbox { rx })
    }

    /// Take every event queued so far, in arrival order, without blocking
    pub fn drain(&self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }
}

/// Write half of the transport, safe to call from any thread
#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl SharedWriter {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Write one complete line and flush it
    pub fn write_line(&self, line: &[u8]) -> Result<(), TransportError> {
        let mut writer = self.inner.lock().map_err(|_| TransportError::Poisoned)?;
        writer.write_all(line).map_err(TransportError::Write)?;
        writer.flush().map_err(TransportError::Write)
    }
}

impl fmt::Debug for SharedWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedWriter").finish_non_exhaustive()
    }
}

/// How to open the controller stream
#[derive(Debug, Clone, Copy)]
pub struct TransportConfig {
    /// Serial line speed (ignored for TCP)
    pub baud_rate: u32,
    /// Upper bound on a single blocking read
    pub read_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            baud_rate: SERIAL_BAUD_RATE,
            read_timeout: Duration::from_millis(100),
        }
    }
}

/// Open the controller stream: `tcp:<host>:<port>` or a serial device path.
///
/// Reads on the returned half time out after `read_timeout`, so a reader
/// loop keeps observing its stop flag on an idle line.
pub fn open_transport(
    address: &str,
    config: &TransportConfig,
) -> Result<(Box<dyn Read + Send>, SharedWriter), TransportError> {
    let timeout = config.read_timeout.max(Duration::from_millis(1));

    if let Some(endpoint) = address.strip_prefix("tcp:") {
        let open_err = |source| TransportError::Open {
            address: address.to_string(),
            source,
        };
        let stream = TcpStream::connect(endpoint).map_err(open_err)?;
        stream.set_read_timeout(Some(timeout)).map_err(open_err)?;
        stream.set_nodelay(true).map_err(open_err)?;
        let write_half = stream.try_clone().map_err(open_err)?;
        return Ok((Box::new(stream), SharedWriter::new(write_half)));
    }

    let serial_err = |source| TransportError::Serial {
        address: address.to_string(),
        source,
    };
    let port = serialport::new(address, config.baud_rate)
        .timeout(timeout)
        .open()
        .map_err(serial_err)?;
    let write_half = port.try_clone().map_err(serial_err)?;
    log::debug!("Serial port {} open at {} baud", address, config.baud_rate);
    Ok((Box::new(port), SharedWriter::new(write_half)))
}

/// Why the reader thread ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderExit {
    /// Stop flag was raised
    Stopped,
    /// The mailbox consumer went away
    Disconnected,
}

/// Reader loop configuration
#[derive(Debug, Clone, Copy)]
pub struct ReaderConfig {
    /// Maximum bytes requested per read (K)
    pub chunk_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self { chunk_size: 64 }
    }
}

/// Spawn the background reader.
///
/// The thread owns `reader` and drops it on every exit path. Read errors end
/// only this thread; the caller keeps running on local input.
pub fn spawn_reader<R>(
    reader: R,
    mailbox: MailboxSender,
    stop: StopFlag,
    config: ReaderConfig,
) -> io::Result<JoinHandle<Result<ReaderExit, TransportError>>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("transport-reader".into())
        .spawn(move || {
            let result = read_loop(reader, &mailbox, &stop, config);
            match &result {
                Ok(exit) => log::info!("Transport reader finished: {:?}", exit),
                Err(e) => log::error!("Transport reader stopped: {}", e),
            }
            result
        })
}

/// Read, decode and forward events until stopped or the stream fails
pub fn read_loop<R: Read>(
    mut reader: R,
    mailbox: &MailboxSender,
    stop: &StopFlag,
    config: ReaderConfig,
) -> Result<ReaderExit, TransportError> {
    let mut decoder = LineDecoder::new();
    let mut chunk = vec![0u8; config.chunk_size.max(1)];

    while !stop.is_stopped() {
        let n = match reader.read(&mut chunk) {
            Ok(n) => n,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) =>
            {
                0
            }
            Err(e) => return Err(TransportError::Read(e)),
        };

        if n == 0 {
            thread::sleep(IDLE_BACKOFF);
            continue;
        }

        decoder.feed(&chunk[..n]);
        for line in decoder.lines() {
            let Some(event) = parse_line(&line) else {
                continue;
            };
            log::trace!("Transport event: {:?}", event);
            if mailbox.send(event).is_err() {
                return Ok(ReaderExit::Disconnected);
            }
        }
    }

    Ok(ReaderExit::Stopped)
}
