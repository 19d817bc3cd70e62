//! Time-to-phase conversion.
//!
//! Elapsed time drives the model input: `phase = (rate · seconds) mod 2π`.
//! The product is formed in `f64` so that long uptimes keep millisecond
//! resolution; only the wrapped result is narrowed to `f32`.

use std::f64::consts::TAU;
use std::time::Duration;

/// Default phase rate in radians per second (one cycle every ~4 s).
pub const PHASE_RATE: f64 = 1.57;

/// Phase in `[0, 2π)` after `elapsed` at `rate` radians per second.
///
/// ```
/// use std::time::Duration;
/// use glimmer_engine::{phase, PHASE_RATE};
///
/// let p = phase(Duration::from_millis(1000), PHASE_RATE);
/// assert!((p - 1.57).abs() < 1e-6);
/// ```
pub fn phase(elapsed: Duration, rate: f64) -> f32 {
    let wrapped = (rate * elapsed.as_secs_f64()).rem_euclid(TAU) as f32;
    // Narrowing can round a value just below 2π up to it.
    if wrapped >= std::f32::consts::TAU {
        0.0
    } else {
        wrapped
    }
}

/// [`phase`] at a millisecond timestamp.
pub fn phase_ms(elapsed_ms: u64, rate: f64) -> f32 {
    phase(Duration::from_millis(elapsed_ms), rate)
}

/// A sine reference signal at a fixed phase rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SignalGenerator {
    rate: f64,
}

impl SignalGenerator {
    /// Generator advancing `rate` radians per second.
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// Radians per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Phase after `elapsed`.
    pub fn phase(&self, elapsed: Duration) -> f32 {
        phase(elapsed, self.rate)
    }

    /// Time for one full cycle.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(TAU / self.rate)
    }

    /// The true sine value at `phase`.
    pub fn reference(phase: f32) -> f32 {
        phase.sin()
    }
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self::new(PHASE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const F32_TAU: f32 = std::f32::consts::TAU;

    fn circular_distance(a: f32, b: f32) -> f32 {
        let d = (a - b).abs();
        d.min(F32_TAU - d)
    }

    #[test]
    fn boot_is_phase_zero() {
        assert_eq!(phase(Duration::ZERO, PHASE_RATE), 0.0);
    }

    #[test]
    fn four_seconds_is_almost_a_full_cycle() {
        let p = phase_ms(4000, PHASE_RATE);
        assert!((p - 6.28).abs() < 1e-5, "p={p}");
    }

    #[test]
    fn wraps_after_a_cycle() {
        let p = phase_ms(5000, PHASE_RATE);
        let expected = (7.85f64 - TAU) as f32;
        assert!((p - expected).abs() < 1e-5, "p={p}");
    }

    #[test]
    fn default_period_is_about_four_seconds() {
        let period = SignalGenerator::default().period();
        assert!((period.as_secs_f64() - 4.002).abs() < 1e-3);
    }

    #[test]
    fn reference_is_sine() {
        assert_eq!(SignalGenerator::reference(0.0), 0.0);
        assert!((SignalGenerator::reference(std::f32::consts::FRAC_PI_2) - 1.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn phase_stays_in_range(ms in any::<u32>(), rate in 0.01f64..100.0) {
            let p = phase_ms(u64::from(ms), rate);
            prop_assert!((0.0..F32_TAU).contains(&p), "p={}", p);
        }

        #[test]
        fn phase_is_periodic(ms in 0u64..1_000_000, cycles in 1u32..8) {
            let gen = SignalGenerator::default();
            let t = Duration::from_millis(ms);
            let later = t + gen.period() * cycles;
            let d = circular_distance(gen.phase(t), gen.phase(later));
            prop_assert!(d < 1e-3, "d={}", d);
        }
    }
}
