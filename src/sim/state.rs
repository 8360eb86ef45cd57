//! Session state and core simulation types
//!
//! Everything mutable for one process lifetime lives in [`GameSession`].

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::approach_factor;
use crate::consts::*;
use crate::input::{ControlSignal, InputDevice, SensorReadings};

/// Top-level session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// Main menu, device submenu or instructions overlay
    #[default]
    Menu,
    /// A round is running
    Play,
    /// Round ended, waiting for the dwell timer or a press
    GameOver,
}

/// The player's bird. Its horizontal position is fixed at [`BIRD_X`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bird {
    /// Vertical center (pixels, grows downward)
    pub y: f32,
    /// Vertical velocity (pixels/s)
    pub vy: f32,
    /// Visual tilt in degrees, positive is nose down
    pub angle: f32,
}

impl Default for Bird {
    fn default() -> Self {
        Self {
            y: FIELD_HEIGHT / 2.0,
            vy: 0.0,
            angle: 0.0,
        }
    }
}

impl Bird {
    pub fn top(&self) -> f32 {
        self.y - BIRD_SIZE / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + BIRD_SIZE / 2.0
    }

    /// Advance the bird under a control signal
    pub fn apply(&mut self, signal: ControlSignal, dt: f32) {
        match signal {
            ControlSignal::Impulse(vy) => {
                self.vy = vy;
                return;
            }
            ControlSignal::Ballistic => {
                self.vy += GRAVITY * dt;
                self.y += self.vy * dt;
            }
            ControlSignal::PositionTarget(ratio) => {
                let target = ratio.clamp(0.0, 1.0) * (FIELD_HEIGHT - BIRD_MARGIN);
                let prev = self.y;
                self.y += (target - self.y) * approach_factor(ANALOG_SMOOTHING_RATE, dt);
                self.vy = if dt > 0.0 { (self.y - prev) / dt } else { 0.0 };
            }
        }
        self.update_tilt(dt);
    }

    /// Ease the tilt toward the angle implied by the current velocity
    fn update_tilt(&mut self, dt: f32) {
        let target = (self.vy * TILT_PER_VELOCITY).clamp(TILT_MIN_DEG, TILT_MAX_DEG);
        self.angle += (target - self.angle) * approach_factor(TILT_SMOOTHING_RATE, dt);
    }
}

/// A pipe pair with a passable gap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    /// Leading (left) edge
    pub x: f32,
    /// Upper edge of the gap
    pub gap_top: f32,
    /// Set once when the bird has passed this pipe
    pub scored: bool,
}

impl Pipe {
    pub fn new(x: f32, gap_top: f32) -> Self {
        Self {
            x,
            gap_top,
            scored: false,
        }
    }

    pub fn gap_bottom(&self) -> f32 {
        self.gap_top + GAP_HEIGHT
    }

    pub fn trailing_edge(&self) -> f32 {
        self.x + PIPE_WIDTH
    }
}

/// Entries of the top-level menu, in display order
pub const MENU_OPTIONS: [&str; 3] = ["Play", "Input device", "Instructions"];

/// Menu cursor and overlays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MenuState {
    pub option_index: usize,
    pub in_device_submenu: bool,
    pub device_option_index: usize,
    pub show_instructions: bool,
}

/// All mutable game state for one process lifetime
#[derive(Debug, Clone)]
pub struct GameSession {
    pub state: SessionState,
    pub score: u32,
    pub best_score: u32,
    pub bird: Bird,
    /// Spawn order, which is also left-to-right order
    pub pipes: Vec<Pipe>,
    /// Cosmetic scroll offset in `[0, BACKGROUND_WIDTH)`
    pub background_phase: f32,
    /// Collisions never end the round (score still counts)
    pub test_mode: bool,
    /// Session clock value when the last round ended
    pub game_over_started_at: Option<f64>,
    pub menu: MenuState,
    pub device: InputDevice,
    pub readings: SensorReadings,
    /// Seed the pipe RNG was created from
    pub seed: u64,
    rng: Pcg32,
    /// Simulated seconds since the session was created
    clock: f64,
    rounds: u32,
}

impl GameSession {
    /// Create a session in the menu with the given RNG seed
    pub fn new(seed: u64) -> Self {
        Self {
            state: SessionState::Menu,
            score: 0,
            best_score: 0,
            bird: Bird::default(),
            pipes: Vec::new(),
            background_phase: 0.0,
            test_mode: false,
            game_over_started_at: None,
            menu: MenuState::default(),
            device: InputDevice::default(),
            readings: SensorReadings::new(),
            seed,
            rng: Pcg32::seed_from_u64(seed),
            clock: 0.0,
            rounds: 0,
        }
    }

    /// Simulated time in seconds
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub(crate) fn advance_clock(&mut self, dt: f32) {
        self.clock += f64::from(dt);
    }

    /// Rounds started so far
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Enter `Play` with a fresh bird and the three opening pipes
    pub fn start_round(&mut self) {
        self.state = SessionState::Play;
        self.score = 0;
        self.bird = Bird::default();
        self.game_over_started_at = None;
        self.readings.recenter();

        let mut pipes = Vec::with_capacity(INITIAL_PIPE_COUNT);
        for i in 0..INITIAL_PIPE_COUNT {
            let x = FIELD_WIDTH + i as f32 * INITIAL_PIPE_SPACING;
            pipes.push(Pipe::new(x, self.random_gap_top()));
        }
        self.pipes = pipes;

        self.rounds += 1;
        log::info!(
            "Round {} started with {} ({})",
            self.rounds,
            self.device.label(),
            if self.test_mode { "test mode" } else { "normal" }
        );
    }

    /// Leave `Play` after a terminating collision
    pub fn end_round(&mut self) {
        self.state = SessionState::GameOver;
        self.best_score = self.best_score.max(self.score);
        self.game_over_started_at = Some(self.clock);
        log::info!("Game over: score {} (best {})", self.score, self.best_score);
    }

    /// Back to the top-level menu. The menu cursor is left where it was.
    pub fn return_to_menu(&mut self) {
        self.state = SessionState::Menu;
        self.game_over_started_at = None;
        self.menu.in_device_submenu = false;
        log::debug!("Returned to menu");
    }

    /// Make `device` the active input. The bird keeps its current motion.
    pub fn select_device(&mut self, device: InputDevice) {
        self.device = device;
        self.menu.device_option_index = device.index();
        log::info!("Input device: {}", device.label());
    }

    /// Append a pipe at the right edge of the field
    pub fn spawn_pipe(&mut self) {
        let gap_top = self.random_gap_top();
        self.pipes.push(Pipe::new(FIELD_WIDTH, gap_top));
    }

    fn random_gap_top(&mut self) -> f32 {
        self.rng
            .random_range(GAP_MARGIN..=FIELD_HEIGHT - GAP_HEIGHT - GAP_MARGIN)
    }
}
