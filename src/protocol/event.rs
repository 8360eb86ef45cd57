//! Abstract input events
//!
//! Both the serial transport and local key bindings are normalized into
//! [`InputEvent`] before they reach the mailbox, so the session never knows
//! where an event came from.

use serde::{Deserialize, Serialize};

/// Continuous sensors reported by the controller board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sensor {
    Infrared,
    Encoder,
    Ultrasound,
}

/// Closed set of events consumed by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Main push button (`BTN`, Space)
    ButtonPress,
    /// Previous menu entry (`BTN1`, Up)
    MenuPrev,
    /// Next menu entry (`BTN2`, Down)
    MenuNext,
    /// Confirm the highlighted menu entry (Enter)
    MenuConfirm,
    /// Raw sensor value from the board
    SensorReading(Sensor, i32),
    /// Relative adjustment of the active sensor (Left/Right)
    SensorNudge(i32),
    /// Best score pushed by the board (`MAX:<n>`)
    BestScoreOverride(i32),
    /// Score-only debug mode toggle
    ToggleTestMode,
}

/// Classify one decoded line.
///
/// Unknown commands and non-integer payloads yield `None`; newer firmware
/// may send tokens this build does not understand.
pub fn parse_line(line: &str) -> Option<InputEvent> {
    let line = line.trim();
    match line {
        "BTN" => return Some(InputEvent::ButtonPress),
        "BTN1" => return Some(InputEvent::MenuPrev),
        "BTN2" => return Some(InputEvent::MenuNext),
        _ => {}
    }

    let (tag, payload) = line.split_once(':')?;
    let value = match payload.trim().parse::<i32>() {
        Ok(value) => value,
        Err(_) => {
            log::debug!("Discarding malformed payload: {:?}", line);
            return None;
        }
    };

    match tag {
        "IR" => Some(InputEvent::SensorReading(Sensor::Infrared, value)),
        "ENC" => Some(InputEvent::SensorReading(Sensor::Encoder, value)),
        "ULTRA" | "US" => Some(InputEvent::SensorReading(Sensor::Ultrasound, value)),
        "MAX" => Some(InputEvent::BestScoreOverride(value)),
        _ => {
            log::debug!("Discarding unknown command: {:?}", line);
            None
        }
    }
}

/// Local keys understood by the game, independent of any windowing API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyBinding {
    Space,
    Up,
    Down,
    Enter,
    Left,
    Right,
    TestMode,
}

/// Map a local key to the same event set the transport produces
pub fn normalize_key(key: KeyBinding) -> InputEvent {
    match key {
        KeyBinding::Space => InputEvent::ButtonPress,
        KeyBinding::Up => InputEvent::MenuPrev,
        KeyBinding::Down => InputEvent::MenuNext,
        KeyBinding::Enter => InputEvent::MenuConfirm,
        KeyBinding::Left => InputEvent::SensorNudge(-1),
        KeyBinding::Right => InputEvent::SensorNudge(1),
        KeyBinding::TestMode => InputEvent::ToggleTestMode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_tokens() {
        assert_eq!(parse_line("BTN"), Some(InputEvent::ButtonPress));
        assert_eq!(parse_line("BTN1"), Some(InputEvent::MenuPrev));
        assert_eq!(parse_line("BTN2"), Some(InputEvent::MenuNext));
        assert_eq!(parse_line("BTN3"), None);
    }

    #[test]
    fn test_sensor_tokens() {
        assert_eq!(
            parse_line("IR:12"),
            Some(InputEvent::SensorReading(Sensor::Infrared, 12))
        );
        assert_eq!(
            parse_line("ENC:-7"),
            Some(InputEvent::SensorReading(Sensor::Encoder, -7))
        );
        assert_eq!(
            parse_line("ULTRA:9"),
            Some(InputEvent::SensorReading(Sensor::Ultrasound, 9))
        );
        assert_eq!(
            parse_line("US:44"),
            Some(InputEvent::SensorReading(Sensor::Ultrasound, 44))
        );
        assert_eq!(parse_line("MAX:31"), Some(InputEvent::BestScoreOverride(31)));
    }

    #[test]
    fn test_malformed_tokens_are_discarded() {
        assert_eq!(parse_line("GARBAGE"), None);
        assert_eq!(parse_line("IR:"), None);
        assert_eq!(parse_line("IR:abc"), None);
        assert_eq!(parse_line("ENC:1.5"), None);
        assert_eq!(parse_line("TEMP:20"), None);
        assert_eq!(parse_line(""), None);
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(parse_line("  BTN \t"), Some(InputEvent::ButtonPress));
        assert_eq!(
            parse_line("IR: 5"),
            Some(InputEvent::SensorReading(Sensor::Infrared, 5))
        );
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(normalize_key(KeyBinding::Space), InputEvent::ButtonPress);
        assert_eq!(normalize_key(KeyBinding::Enter), InputEvent::MenuConfirm);
        assert_eq!(normalize_key(KeyBinding::Left), InputEvent::SensorNudge(-1));
        assert_eq!(normalize_key(KeyBinding::Right), InputEvent::SensorNudge(1));
        assert_eq!(
            normalize_key(KeyBinding::TestMode),
            InputEvent::ToggleTestMode
        );
    }
}
