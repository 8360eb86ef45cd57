//! Fixed-cadence frame loop
//!
//! One tick: drain the mailbox → apply events → advance the simulation →
//! emit telemetry → hand a snapshot to the presenter. The loop never waits on
//! transport I/O; the only blocking call is the sleep until the next frame.

use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::consts::{FRAME_RATE, MAX_FRAME_DT};
use crate::input::InputDevice;
use crate::protocol::TelemetryEmitter;
use crate::sim::{Bird, GameSession, MenuState, Pipe, SessionState};
use crate::transport::{Mailbox, StopFlag};

/// Read-only view of one frame, enough for a renderer to draw it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub state: SessionState,
    pub menu: MenuState,
    pub bird: Bird,
    pub pipes: Vec<Pipe>,
    pub score: u32,
    pub best_score: u32,
    pub device: InputDevice,
    pub device_index: usize,
    /// Current value of the active sensor (`None` for the button)
    pub reading: Option<i32>,
    pub test_mode: bool,
    pub background_phase: f32,
    /// Simulated seconds since start
    pub clock: f64,
}

impl Snapshot {
    pub fn capture(session: &GameSession) -> Self {
        Self {
            state: session.state,
            menu: session.menu,
            bird: session.bird,
            pipes: session.pipes.clone(),
            score: session.score,
            best_score: session.best_score,
            device: session.device,
            device_index: session.device.index(),
            reading: session.readings.display_value(session.device),
            test_mode: session.test_mode,
            background_phase: session.background_phase,
            clock: session.clock(),
        }
    }
}

/// Drives the session at a fixed frame rate
pub struct FrameScheduler {
    session: GameSession,
    mailbox: Mailbox,
    telemetry: TelemetryEmitter,
    stop: StopFlag,
    frame_time: Duration,
}

impl FrameScheduler {
    pub fn new(
        session: GameSession,
        mailbox: Mailbox,
        telemetry: TelemetryEmitter,
        stop: StopFlag,
    ) -> Self {
        Self {
            session,
            mailbox,
            telemetry,
            stop,
            frame_time: Duration::from_secs_f64(1.0 / f64::from(FRAME_RATE)),
        }
    }

    /// Override the target frame rate (frames per second, at least 1)
    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_time = Duration::from_secs_f64(1.0 / f64::from(frame_rate.max(1)));
        self
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn telemetry(&self) -> &TelemetryEmitter {
        &self.telemetry
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Run one frame with the measured elapsed time
    pub fn tick(&mut self, dt: f32) -> Snapshot {
        for event in self.mailbox.drain() {
            self.session.handle_event(event);
        }

        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        self.session.advance(dt);
        self.telemetry.maybe_emit(&self.session);

        Snapshot::capture(&self.session)
    }

    /// Tick until the stop flag is raised, passing each frame to `present`
    pub fn run<F: FnMut(&Snapshot)>(&mut self, mut present: F) {
        log::info!(
            "Frame loop running at {:.0} Hz",
            1.0 / self.frame_time.as_secs_f64()
        );
        let mut last = Instant::now();

        while !self.stop.is_stopped() {
            let frame_start = Instant::now();
            let dt = frame_start.duration_since(last).as_secs_f32();
            last = frame_start;

            let snapshot = self.tick(dt);
            present(&snapshot);

            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_time {
                thread::sleep(self.frame_time - elapsed);
            }
        }

        log::info!(
            "Frame loop stopped after {:.1}s, {} telemetry lines sent",
            self.session.clock(),
            self.telemetry.sent()
        );
    }
}
