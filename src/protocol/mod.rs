//! Controller board line protocol
//!
//! Inbound: newline-terminated ASCII tokens (`BTN`, `IR:12`, ...) decoded
//! from a raw byte stream and normalized into [`InputEvent`]s.
//! Outbound: rate-limited `score|best|device|state` status lines.

pub mod decoder;
pub mod event;
pub mod telemetry;

pub use decoder::{LineDecoder, Lines};
pub use event::{InputEvent, KeyBinding, Sensor, normalize_key, parse_line};
pub use telemetry::{TelemetryEmitter, encode_status};
