//! Mapping predictions to an 8-bit output level.

use glimmer_core::Actuator;
use tracing::trace;

/// Map a prediction in roughly `[-1, 1]` to a level in `[0, 255]`.
///
/// `round((y + 1) · 127.5)`, rounding half away from zero, clamped to the
/// level range. NaN maps to 0.
///
/// ```
/// use glimmer_engine::brightness;
///
/// assert_eq!(brightness(-1.0), 0);
/// assert_eq!(brightness(0.0), 128);
/// assert_eq!(brightness(1.5), 255);
/// ```
pub fn brightness(y: f32) -> u8 {
    if y.is_nan() {
        return 0;
    }
    ((y + 1.0) * 127.5).round().clamp(0.0, 255.0) as u8
}

/// Host stand-in for a PWM-driven LED.
///
/// Remembers the last level and logs each change at `trace`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimulatedLed {
    initialized: bool,
    level: u8,
    updates: u64,
}

impl SimulatedLed {
    /// An LED that is off and not yet initialized.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `init()` has been called.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Current level.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Current level as a duty cycle in percent.
    pub fn duty_percent(&self) -> f32 {
        f32::from(self.level) * 100.0 / 255.0
    }

    /// Levels set since boot.
    pub fn updates(&self) -> u64 {
        self.updates
    }
}

impl Actuator for SimulatedLed {
    fn init(&mut self) {
        self.initialized = true;
        self.level = 0;
        trace!("led initialized");
    }

    fn set_level(&mut self, level: u8) {
        self.level = level;
        self.updates += 1;
        trace!(level, duty = self.duty_percent(), "led level");
    }
}
