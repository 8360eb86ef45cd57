//! Deterministic simulation module
//!
//! All gameplay logic lives here. Given the same seed, events and frame
//! times, a session evolves identically:
//! - Seeded RNG only
//! - Simulated clock for every timer
//! - No rendering, transport or platform dependencies

pub mod collision;
pub mod state;
pub mod tick;

pub use collision::{CollisionReport, evaluate};
pub use state::{Bird, GameSession, MENU_OPTIONS, MenuState, Pipe, SessionState};
