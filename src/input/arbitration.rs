//! Input arbitration
//!
//! Every device collapses into one [`ControlSignal`] per trigger. The bird
//! only ever sees control signals, so adding a device means adding a variant
//! and its mapping below.

use serde::{Deserialize, Serialize};

use crate::consts::{ENC_HALF_RANGE, FLAP_VY, IR_MAX, ULTRA_MAX};

use super::device::{InputDevice, SensorReadings};

/// Vertical-motion instruction applied to the bird
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControlSignal {
    /// Set vertical velocity immediately (flap)
    Impulse(f32),
    /// Free fall under gravity
    Ballistic,
    /// Move toward a height expressed as a ratio of the usable field
    PositionTarget(f32),
}

/// What asks for a control signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A discrete `ButtonPress`
    Press,
    /// The per-frame physics step
    Frame,
}

/// Map the active device and readings to a control signal.
///
/// Returns `None` when the trigger means nothing for the device (analog
/// devices ignore button presses).
pub fn arbitrate(
    device: InputDevice,
    readings: &SensorReadings,
    trigger: Trigger,
) -> Option<ControlSignal> {
    match (device, trigger) {
        (InputDevice::Button, Trigger::Press) => Some(ControlSignal::Impulse(FLAP_VY)),
        (InputDevice::Button, Trigger::Frame) => Some(ControlSignal::Ballistic),
        (_, Trigger::Press) => None,
        (InputDevice::InfraredRange, Trigger::Frame) => {
            Some(ControlSignal::PositionTarget(infrared_ratio(readings.ir)))
        }
        (InputDevice::RotaryEncoder, Trigger::Frame) => {
            Some(ControlSignal::PositionTarget(encoder_ratio(readings.enc_relative())))
        }
        (InputDevice::UltrasoundRange, Trigger::Frame) => {
            Some(ControlSignal::PositionTarget(ultrasound_ratio(readings.ultra)))
        }
    }
}

fn infrared_ratio(ir: i32) -> f32 {
    ir.clamp(0, IR_MAX) as f32 / IR_MAX as f32
}

fn encoder_ratio(relative: i32) -> f32 {
    let relative = relative.clamp(-ENC_HALF_RANGE, ENC_HALF_RANGE);
    (relative + ENC_HALF_RANGE) as f32 / (2 * ENC_HALF_RANGE) as f32
}

/// Inverted scale: a near object gives a ratio near 1, which targets the
/// bottom of the field (y grows downward)
fn ultrasound_ratio(ultra: i32) -> f32 {
    1.0 - ultra.clamp(0, ULTRA_MAX) as f32 / ULTRA_MAX as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Sensor;

    fn target(device: InputDevice, readings: &SensorReadings) -> f32 {
        match arbitrate(device, readings, Trigger::Frame) {
            Some(ControlSignal::PositionTarget(r)) => r,
            other => panic!("expected position target, got {:?}", other),
        }
    }

    #[test]
    fn test_button_device() {
        let readings = SensorReadings::new();
        assert_eq!(
            arbitrate(InputDevice::Button, &readings, Trigger::Press),
            Some(ControlSignal::Impulse(FLAP_VY))
        );
        assert_eq!(
            arbitrate(InputDevice::Button, &readings, Trigger::Frame),
            Some(ControlSignal::Ballistic)
        );
    }

    #[test]
    fn test_analog_devices_ignore_presses() {
        let readings = SensorReadings::new();
        for device in [
            InputDevice::InfraredRange,
            InputDevice::RotaryEncoder,
            InputDevice::UltrasoundRange,
        ] {
            assert_eq!(arbitrate(device, &readings, Trigger::Press), None);
        }
    }

    #[test]
    fn test_infrared_ratio() {
        let mut readings = SensorReadings::new();
        readings.record(Sensor::Infrared, 15);
        assert!((target(InputDevice::InfraredRange, &readings) - 0.5).abs() < 1e-6);
        readings.record(Sensor::Infrared, 30);
        assert_eq!(target(InputDevice::InfraredRange, &readings), 1.0);
    }

    #[test]
    fn test_ultrasound_ratio_is_inverted() {
        let mut readings = SensorReadings::new();
        readings.record(Sensor::Ultrasound, 0);
        assert_eq!(target(InputDevice::UltrasoundRange, &readings), 1.0);
        readings.record(Sensor::Ultrasound, 50);
        assert_eq!(target(InputDevice::UltrasoundRange, &readings), 0.0);
        readings.record(Sensor::Ultrasound, 10);
        assert!((target(InputDevice::UltrasoundRange, &readings) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_encoder_recenter_sequence() {
        let mut readings = SensorReadings::new();
        readings.recenter();

        let expected = [0.5, 17.0 / 30.0, 13.0 / 30.0];
        for (raw, want) in [20, 22, 18].into_iter().zip(expected) {
            readings.record(Sensor::Encoder, raw);
            let got = target(InputDevice::RotaryEncoder, &readings);
            assert!((got - want).abs() < 1e-6, "raw {} gave {}", raw, got);
        }
        assert_eq!(readings.enc_center(), Some(20));
    }

    #[test]
    fn test_encoder_ratio_saturates() {
        assert_eq!(encoder_ratio(-40), 0.0);
        assert_eq!(encoder_ratio(40), 1.0);
    }
}
