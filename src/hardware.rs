//! Hardware I/O
//!
//! Narrow interface over the device's actuators and sensor: two PWM-capable
//! LEDs and a temperature/humidity sensor. The panel core only needs
//! fire-and-forget writes and a fallible read; pin-level protocol details
//! stay behind [`HardwareIo`].
//!
//! Intensity range (0..=255) is validated at the handler boundary before any
//! call lands here; implementations may assume values are in range.

use parking_lot::RwLock;
use thiserror::Error;

/// The two on-board LEDs, addressed as `led=1` / `led=2` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedId {
    Led1,
    Led2,
}

impl LedId {
    /// Parse the `led` query parameter
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "1" => Some(LedId::Led1),
            "2" => Some(LedId::Led2),
            _ => None,
        }
    }
}

/// State of a single LED
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedState {
    pub on: bool,
    pub intensity: u8,
}

/// Snapshot of both LEDs for dashboard rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedStates {
    pub led1: LedState,
    pub led2: LedState,
}

impl LedStates {
    pub fn get(&self, led: LedId) -> LedState {
        match led {
            LedId::Led1 => self.led1,
            LedId::Led2 => self.led2,
        }
    }
}

/// One sensor poll
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub temperature: f32,
    pub humidity: f32,
}

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor read failed")]
    ReadFailed,
}

/// Actuator writes and sensor reads, as the panel sees them
pub trait HardwareIo: Send + Sync {
    /// Flip the LED's on/off state; returns the new state
    fn toggle_led(&self, led: LedId) -> bool;

    /// Set the LED's PWM level. Callers validate 0..=255 before this point.
    fn set_led(&self, led: LedId, intensity: u8);

    /// Current state of both LEDs
    fn led_states(&self) -> LedStates;

    /// Poll the temperature/humidity sensor
    fn read_sensor(&self) -> Result<SensorReading, SensorError>;
}

/// In-memory hardware used when no GPIO backend is wired up, and by tests.
///
/// A device build replaces this with an implementation whose `toggle_led` /
/// `set_led` drive the actual pins; the state tracking here is the part the
/// panel itself needs either way.
pub struct SimulatedHardware {
    leds: RwLock<LedStates>,
    sensor: Option<SensorReading>,
}

impl SimulatedHardware {
    pub fn new() -> Self {
        Self {
            leds: RwLock::new(LedStates::default()),
            sensor: Some(SensorReading {
                temperature: 22.5,
                humidity: 41.0,
            }),
        }
    }

    /// Variant whose sensor reads always fail
    pub fn with_failing_sensor() -> Self {
        Self {
            leds: RwLock::new(LedStates::default()),
            sensor: None,
        }
    }
}

impl Default for SimulatedHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareIo for SimulatedHardware {
    fn toggle_led(&self, led: LedId) -> bool {
        let mut states = self.leds.write();
        let state = match led {
            LedId::Led1 => &mut states.led1,
            LedId::Led2 => &mut states.led2,
        };
        state.on = !state.on;
        tracing::debug!(led = ?led, on = state.on, "LED toggled");
        state.on
    }

    fn set_led(&self, led: LedId, intensity: u8) {
        let mut states = self.leds.write();
        let state = match led {
            LedId::Led1 => &mut states.led1,
            LedId::Led2 => &mut states.led2,
        };
        state.intensity = intensity;
        state.on = intensity > 0;
        tracing::debug!(led = ?led, intensity, "LED intensity set");
    }

    fn led_states(&self) -> LedStates {
        *self.leds.read()
    }

    fn read_sensor(&self) -> Result<SensorReading, SensorError> {
        self.sensor.ok_or(SensorError::ReadFailed)
    }
}
