//! Event handling and the per-frame simulation step
//!
//! The frame scheduler feeds every drained event to
//! [`GameSession::handle_event`] and then calls [`GameSession::advance`] once
//! with the measured frame time.

use super::collision::{self, CollisionReport};
use super::state::{GameSession, MENU_OPTIONS, SessionState};
use crate::consts::*;
use crate::input::{InputDevice, Trigger, arbitrate};
use crate::protocol::InputEvent;

/// Top-level menu entries
const OPTION_PLAY: usize = 0;
const OPTION_DEVICE: usize = 1;
const OPTION_INSTRUCTIONS: usize = 2;

impl GameSession {
    /// Apply one normalized input event
    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::BestScoreOverride(best) => {
                self.best_score = best.max(0) as u32;
                log::debug!("Best score set by controller: {}", self.best_score);
            }
            InputEvent::ToggleTestMode => {
                self.test_mode = !self.test_mode;
                log::info!("Test mode {}", if self.test_mode { "on" } else { "off" });
            }
            InputEvent::SensorReading(sensor, value) => self.readings.record(sensor, value),
            InputEvent::SensorNudge(delta) => self.nudge_active_sensor(delta),
            InputEvent::ButtonPress => match self.state {
                SessionState::Menu => self.confirm_menu(),
                SessionState::Play => {
                    if let Some(signal) = arbitrate(self.device, &self.readings, Trigger::Press) {
                        self.bird.apply(signal, 0.0);
                    }
                }
                SessionState::GameOver => self.return_to_menu(),
            },
            InputEvent::MenuConfirm => match self.state {
                SessionState::Menu => self.confirm_menu(),
                SessionState::Play => {}
                SessionState::GameOver => self.return_to_menu(),
            },
            InputEvent::MenuPrev => self.step(-1),
            InputEvent::MenuNext => self.step(1),
        }
    }

    /// Advance the session by `dt` seconds of wall time
    pub fn advance(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.advance_clock(dt);

        match self.state {
            SessionState::Menu => self.scroll_background(dt),
            SessionState::Play => {
                self.step_world(dt);
                let report = collision::evaluate(&self.bird, &self.pipes, self.test_mode);
                self.apply_report(report);
            }
            SessionState::GameOver => {
                let dwell_over = self
                    .game_over_started_at
                    .is_none_or(|t| self.clock() - t >= f64::from(GAME_OVER_DWELL));
                if dwell_over {
                    self.return_to_menu();
                }
            }
        }
    }

    /// Up/Down: move the menu cursor, or nudge the sensor while playing
    fn step(&mut self, delta: isize) {
        match self.state {
            SessionState::Menu => {
                let menu = &mut self.menu;
                if menu.in_device_submenu {
                    menu.device_option_index =
                        wrap_index(menu.device_option_index, delta, InputDevice::ALL.len());
                } else {
                    menu.option_index = wrap_index(menu.option_index, delta, MENU_OPTIONS.len());
                }
                menu.show_instructions = false;
            }
            SessionState::Play => self.nudge_active_sensor(delta as i32),
            SessionState::GameOver => {}
        }
    }

    fn confirm_menu(&mut self) {
        if self.menu.in_device_submenu {
            if let Some(device) = InputDevice::from_index(self.menu.device_option_index) {
                self.select_device(device);
            }
            self.menu.in_device_submenu = false;
            return;
        }

        match self.menu.option_index {
            OPTION_PLAY => self.start_round(),
            OPTION_DEVICE => {
                self.menu.in_device_submenu = true;
                self.menu.show_instructions = false;
            }
            OPTION_INSTRUCTIONS => self.menu.show_instructions = !self.menu.show_instructions,
            other => log::warn!("Menu cursor out of range: {}", other),
        }
    }

    fn nudge_active_sensor(&mut self, delta: i32) {
        if let Some(sensor) = self.device.sensor() {
            self.readings.nudge(sensor, delta);
        }
    }

    /// Bird, pipes and background for one frame of play
    fn step_world(&mut self, dt: f32) {
        if let Some(signal) = arbitrate(self.device, &self.readings, Trigger::Frame) {
            self.bird.apply(signal, dt);
        }

        for pipe in &mut self.pipes {
            pipe.x -= PIPE_SPEED * dt;
        }

        // Build the retained list first, then swap it in
        let retained: Vec<_> = self
            .pipes
            .iter()
            .copied()
            .filter(|pipe| pipe.trailing_edge() > 0.0)
            .collect();
        self.pipes = retained;

        let spawn_threshold = FIELD_WIDTH - PIPE_SPEED * PIPE_INTERVAL;
        if self.pipes.last().is_none_or(|last| last.x < spawn_threshold) {
            self.spawn_pipe();
        }

        self.scroll_background(dt);
    }

    fn scroll_background(&mut self, dt: f32) {
        self.background_phase =
            (self.background_phase + BACKGROUND_SCROLL_SPEED * dt).rem_euclid(BACKGROUND_WIDTH);
    }

    fn apply_report(&mut self, report: CollisionReport) {
        for &i in &report.newly_scored {
            if let Some(pipe) = self.pipes.get_mut(i) {
                pipe.scored = true;
                self.score += 1;
            }
        }
        if report.terminate {
            self.end_round();
        }
    }
}

fn wrap_index(index: usize, delta: isize, len: usize) -> usize {
    (index as isize + delta).rem_euclid(len as isize) as usize
}
