//! Outbound status lines
//!
//! Format: `<score>|<best>|<device>|<playing>\n`, at most one line per
//! [`TELEMETRY_INTERVAL`] of simulated time.

use crate::consts::TELEMETRY_INTERVAL;
use crate::sim::{GameSession, SessionState};
use crate::transport::SharedWriter;

/// Encode one status line
pub fn encode_status(score: u32, best: u32, device_index: usize, playing: bool) -> String {
    format!("{}|{}|{}|{}\n", score, best, device_index, u8::from(playing))
}

/// Rate-limited writer of status lines to the controller board
#[derive(Debug)]
pub struct TelemetryEmitter {
    sink: Option<SharedWriter>,
    interval: f64,
    last_attempt: Option<f64>,
    sent: u64,
    failures: u64,
}

impl TelemetryEmitter {
    /// Create an emitter; `None` means no live transport, nothing is written
    pub fn new(sink: Option<SharedWriter>) -> Self {
        Self {
            sink,
            interval: f64::from(TELEMETRY_INTERVAL),
            last_attempt: None,
            sent: 0,
            failures: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.sink.is_some()
    }

    /// Lines successfully written so far
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Write attempts that failed
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Send the session status if the rate window has elapsed.
    ///
    /// Returns true when a write was attempted. A failed write still
    /// consumes the window, so the retry happens one interval later.
    pub fn maybe_emit(&mut self, session: &GameSession) -> bool {
        let Some(sink) = &self.sink else {
            return false;
        };

        let now = session.clock();
        if let Some(last) = self.last_attempt {
            if now - last < self.interval {
                return false;
            }
        }
        self.last_attempt = Some(now);

        let line = encode_status(
            session.score,
            session.best_score,
            session.device.index(),
            session.state == SessionState::Play,
        );
        match sink.write_line(line.as_bytes()) {
            Ok(()) => {
                self.sent += 1;
            }
            Err(e) => {
                self.failures += 1;
                log::warn!("Telemetry write failed: {}", e);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputDevice;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_encode_status() {
        assert_eq!(encode_status(3, 10, 2, true), "3|10|2|1\n");
        assert_eq!(encode_status(0, 0, 0, false), "0|0|0|0\n");
    }

    #[test]
    fn test_rate_limit() {
        let capture = Capture::default();
        let mut emitter = TelemetryEmitter::new(Some(SharedWriter::new(capture.clone())));
        let mut session = GameSession::new(7);

        for _ in 0..20 {
            session.advance(0.05);
            emitter.maybe_emit(&session);
        }

        let written = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        let lines = written.lines().count();
        assert!(lines <= 5, "sent {} lines in one second", lines);
        assert!(lines >= 4);
        assert_eq!(emitter.sent() as usize, lines);
    }

    #[test]
    fn test_status_reflects_session() {
        let capture = Capture::default();
        let mut emitter = TelemetryEmitter::new(Some(SharedWriter::new(capture.clone())));
        let mut session = GameSession::new(7);
        session.select_device(InputDevice::UltrasoundRange);
        session.best_score = 12;
        session.start_round();

        assert!(emitter.maybe_emit(&session));
        let written = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert_eq!(written, "0|12|3|1\n");
    }

    #[test]
    fn test_no_transport_writes_nothing() {
        let mut emitter = TelemetryEmitter::new(None);
        let session = GameSession::new(1);
        assert!(!emitter.is_connected());
        assert!(!emitter.maybe_emit(&session));
    }

    #[test]
    fn test_write_failure_is_not_fatal() {
        let mut emitter = TelemetryEmitter::new(Some(SharedWriter::new(Broken)));
        let mut session = GameSession::new(1);

        assert!(emitter.maybe_emit(&session));
        // Still inside the window: no retry yet
        session.advance(0.1);
        assert!(!emitter.maybe_emit(&session));
        session.advance(0.15);
        assert!(emitter.maybe_emit(&session));
        assert_eq!(emitter.failures(), 2);
        assert_eq!(emitter.sent(), 0);
    }
}
