//! Flapic - a flappy-style arcade game for an external controller board
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bird physics, pipes, collisions, session state)
//! - `input`: Input devices and arbitration into a single control signal
//! - `protocol`: Serial line decoding, event normalization, telemetry encoding
//! - `transport`: Background reader thread, event mailbox, shared writer
//! - `scheduler`: Fixed-cadence frame loop and render snapshots
//! - `settings`: Runtime configuration

pub mod input;
pub mod protocol;
pub mod scheduler;
pub mod settings;
pub mod sim;
pub mod transport;

pub use input::{ControlSignal, InputDevice, SensorReadings};
pub use protocol::{InputEvent, KeyBinding, LineDecoder, Sensor, TelemetryEmitter};
pub use scheduler::{FrameScheduler, Snapshot};
pub use settings::{Cli, Settings};
pub use sim::{GameSession, SessionState};

/// Game configuration constants
pub mod consts {
    /// Play field dimensions (pixels)
    pub const FIELD_WIDTH: f32 = 400.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Bird defaults
    pub const BIRD_SIZE: f32 = 24.0;
    /// Fixed horizontal position of the bird's center
    pub const BIRD_X: f32 = FIELD_WIDTH * 0.25;
    /// Analog targets span `[0, FIELD_HEIGHT - BIRD_MARGIN]`
    pub const BIRD_MARGIN: f32 = 40.0;

    /// Downward acceleration (pixels/s²)
    pub const GRAVITY: f32 = 900.0;
    /// Vertical velocity set by a flap (pixels/s, negative is up)
    pub const FLAP_VY: f32 = -320.0;

    /// Pipe defaults
    pub const PIPE_WIDTH: f32 = 60.0;
    pub const GAP_HEIGHT: f32 = 160.0;
    /// Minimum distance between a gap and the field edges
    pub const GAP_MARGIN: f32 = 100.0;
    /// Horizontal pipe speed (pixels/s)
    pub const PIPE_SPEED: f32 = 140.0;
    /// Seconds between pipe spawns at steady state
    pub const PIPE_INTERVAL: f32 = 1.5;
    /// Spacing of the three pipes placed at round start
    pub const INITIAL_PIPE_SPACING: f32 = PIPE_SPEED * PIPE_INTERVAL + 60.0;
    pub const INITIAL_PIPE_COUNT: usize = 3;

    /// Background scroll (purely cosmetic)
    pub const BACKGROUND_WIDTH: f32 = 400.0;
    pub const BACKGROUND_SCROLL_SPEED: f32 = 30.0;

    /// Exponential approach rate of analog devices (1/s)
    pub const ANALOG_SMOOTHING_RATE: f32 = 8.0;
    /// Exponential approach rate of the bird tilt (1/s)
    pub const TILT_SMOOTHING_RATE: f32 = 5.0;
    /// Tilt target per unit of vertical velocity (degrees per pixel/s)
    pub const TILT_PER_VELOCITY: f32 = 0.1;
    pub const TILT_MIN_DEG: f32 = -20.0;
    pub const TILT_MAX_DEG: f32 = 60.0;

    /// Sensor ranges
    pub const IR_MAX: i32 = 30;
    pub const ENC_HALF_RANGE: i32 = 15;
    pub const ULTRA_MAX: i32 = 50;

    /// Seconds spent in game over before returning to the menu
    pub const GAME_OVER_DWELL: f32 = 3.0;
    /// Minimum seconds between two telemetry lines
    pub const TELEMETRY_INTERVAL: f32 = 0.2;

    /// Target frame rate of the scheduler
    pub const FRAME_RATE: u32 = 60;
    /// Largest dt a single tick will simulate (guards against stalls)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Serial line speed of the controller board
    pub const SERIAL_BAUD_RATE: u32 = 115_200;

    /// Unterminated input longer than this is discarded
    pub const MAX_PENDING_LINE: usize = 1024;
}

/// Exponential approach factor for a first-order lag with the given rate
#[inline]
pub fn approach_factor(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate * dt).exp()
}
