//! Input devices and the latest sensor values

use serde::{Deserialize, Serialize};

use crate::consts::{ENC_HALF_RANGE, IR_MAX, ULTRA_MAX};
use crate::protocol::Sensor;

/// Modality that drives the bird, chosen in the device submenu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InputDevice {
    #[default]
    Button,
    InfraredRange,
    RotaryEncoder,
    UltrasoundRange,
}

impl InputDevice {
    /// Submenu order; the index doubles as the telemetry device id
    pub const ALL: [InputDevice; 4] = [
        InputDevice::Button,
        InputDevice::InfraredRange,
        InputDevice::RotaryEncoder,
        InputDevice::UltrasoundRange,
    ];

    pub fn index(self) -> usize {
        match self {
            InputDevice::Button => 0,
            InputDevice::InfraredRange => 1,
            InputDevice::RotaryEncoder => 2,
            InputDevice::UltrasoundRange => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            InputDevice::Button => "Push button",
            InputDevice::InfraredRange => "IR range",
            InputDevice::RotaryEncoder => "Rotary encoder",
            InputDevice::UltrasoundRange => "Ultrasound range",
        }
    }

    /// Sensor feeding this device, `None` for the discrete button
    pub fn sensor(self) -> Option<Sensor> {
        match self {
            InputDevice::Button => None,
            InputDevice::InfraredRange => Some(Sensor::Infrared),
            InputDevice::RotaryEncoder => Some(Sensor::Encoder),
            InputDevice::UltrasoundRange => Some(Sensor::Ultrasound),
        }
    }

    pub fn is_analog(self) -> bool {
        self.sensor().is_some()
    }
}

/// Latest value of every sensor
///
/// IR and ultrasound are stored clamped to their ranges. The encoder keeps
/// its raw count plus a per-round center; readings are taken relative to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    pub ir: i32,
    pub ultra: i32,
    enc_raw: Option<i32>,
    enc_center: Option<i32>,
}

impl SensorReadings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value reported by the board
    pub fn record(&mut self, sensor: Sensor, value: i32) {
        match sensor {
            Sensor::Infrared => self.ir = value.clamp(0, IR_MAX),
            Sensor::Ultrasound => self.ultra = value.clamp(0, ULTRA_MAX),
            Sensor::Encoder => {
                self.enc_raw = Some(value);
                if self.enc_center.is_none() {
                    self.enc_center = Some(value);
                }
            }
        }
    }

    /// Shift a sensor by `delta` (keyboard fallback)
    pub fn nudge(&mut self, sensor: Sensor, delta: i32) {
        match sensor {
            Sensor::Infrared => self.record(sensor, self.ir.saturating_add(delta)),
            Sensor::Ultrasound => self.record(sensor, self.ultra.saturating_add(delta)),
            Sensor::Encoder => {
                let base = self.enc_raw.or(self.enc_center).unwrap_or(0);
                if self.enc_center.is_none() {
                    self.enc_center = Some(base);
                }
                self.record(sensor, base.saturating_add(delta));
            }
        }
    }

    /// Re-establish the encoder zero for a new round.
    ///
    /// Uses the current raw count if one has been seen; otherwise the next
    /// reading becomes the center.
    pub fn recenter(&mut self) {
        self.enc_center = self.enc_raw;
    }

    pub fn enc_center(&self) -> Option<i32> {
        self.enc_center
    }

    /// Encoder count relative to the round center, clamped to ±15
    pub fn enc_relative(&self) -> i32 {
        match (self.enc_raw, self.enc_center) {
            (Some(raw), Some(center)) => {
                raw.saturating_sub(center).clamp(-ENC_HALF_RANGE, ENC_HALF_RANGE)
            }
            _ => 0,
        }
    }

    /// Value shown next to the device name
    pub fn display_value(&self, device: InputDevice) -> Option<i32> {
        match device.sensor()? {
            Sensor::Infrared => Some(self.ir),
            Sensor::Encoder => Some(self.enc_relative()),
            Sensor::Ultrasound => Some(self.ultra),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_indices_roundtrip() {
        for (i, device) in InputDevice::ALL.iter().enumerate() {
            assert_eq!(device.index(), i);
            assert_eq!(InputDevice::from_index(i), Some(*device));
        }
        assert_eq!(InputDevice::from_index(4), None);
        assert!(!InputDevice::Button.is_analog());
        assert!(InputDevice::RotaryEncoder.is_analog());
    }

    #[test]
    fn test_range_sensors_clamp() {
        let mut readings = SensorReadings::new();
        readings.record(Sensor::Infrared, 45);
        readings.record(Sensor::Ultrasound, -3);
        assert_eq!(readings.ir, IR_MAX);
        assert_eq!(readings.ultra, 0);
    }

    #[test]
    fn test_encoder_center_latches_on_first_reading() {
        let mut readings = SensorReadings::new();
        assert_eq!(readings.enc_relative(), 0);
        readings.record(Sensor::Encoder, 20);
        assert_eq!(readings.enc_center(), Some(20));
        readings.record(Sensor::Encoder, 22);
        assert_eq!(readings.enc_relative(), 2);
        readings.record(Sensor::Encoder, 60);
        assert_eq!(readings.enc_relative(), ENC_HALF_RANGE);
    }

    #[test]
    fn test_recenter_uses_current_value() {
        let mut readings = SensorReadings::new();
        readings.record(Sensor::Encoder, 5);
        readings.record(Sensor::Encoder, 9);
        readings.recenter();
        assert_eq!(readings.enc_center(), Some(9));
        assert_eq!(readings.enc_relative(), 0);
    }

    #[test]
    fn test_recenter_without_reading_waits_for_first() {
        let mut readings = SensorReadings::new();
        readings.recenter();
        assert_eq!(readings.enc_center(), None);
        readings.record(Sensor::Encoder, -4);
        assert_eq!(readings.enc_center(), Some(-4));
    }

    #[test]
    fn test_nudge() {
        let mut readings = SensorReadings::new();
        readings.nudge(Sensor::Infrared, -1);
        assert_eq!(readings.ir, 0);
        readings.nudge(Sensor::Infrared, 1);
        assert_eq!(readings.ir, 1);

        readings.nudge(Sensor::Encoder, 1);
        assert_eq!(readings.enc_center(), Some(0));
        assert_eq!(readings.enc_relative(), 1);
        readings.nudge(Sensor::Encoder, -3);
        assert_eq!(readings.enc_relative(), -2);
    }

    #[test]
    fn test_display_value() {
        let mut readings = SensorReadings::new();
        readings.record(Sensor::Ultrasound, 17);
        assert_eq!(readings.display_value(InputDevice::Button), None);
        assert_eq!(readings.display_value(InputDevice::UltrasoundRange), Some(17));
    }
}
