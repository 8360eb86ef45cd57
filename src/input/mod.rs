//! Input devices and arbitration
//!
//! Four modalities (push button, IR range, rotary encoder, ultrasound range)
//! feed a single control abstraction consumed by the bird physics.

pub mod arbitration;
pub mod device;

pub use arbitration::{ControlSignal, Trigger, arbitrate};
pub use device::{InputDevice, SensorReadings};
