//! Energy economy and difficulty curve
//!
//! Decay grows and recovery shrinks with score; both are clamped.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Nominal energy lost per tick at `score`
pub fn energy_decay_rate(score: u64) -> f32 {
    (BASE_DECAY_RATE + score as f32 * DECAY_PER_POINT).min(MAX_DECAY_RATE)
}

/// Energy regained per successful step at `score`
pub fn energy_recover_amount(score: u64) -> f32 {
    (BASE_RECOVER_AMOUNT - score as f32 * RECOVER_LOSS_PER_POINT).max(MIN_RECOVER_AMOUNT)
}

/// Current decay/recovery, including upgrade multipliers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyModel {
    pub decay_rate: f32,
    pub recover_amount: f32,
    /// Applied on every recompute (energy master upgrade)
    pub decay_multiplier: f32,
    /// Applied on every recompute (recovery boost upgrade)
    pub recovery_multiplier: f32,
}

impl Default for EnergyModel {
    fn default() -> Self {
        Self::with_multipliers(1.0, 1.0)
    }
}

impl EnergyModel {
    pub fn with_multipliers(decay_multiplier: f32, recovery_multiplier: f32) -> Self {
        let mut model = Self {
            decay_rate: 0.0,
            recover_amount: 0.0,
            decay_multiplier,
            recovery_multiplier,
        };
        model.recompute(0);
        model
    }

    /// Refresh both rates for a new score
    pub fn recompute(&mut self, score: u64) {
        self.decay_rate = energy_decay_rate(score) * self.decay_multiplier;
        self.recover_amount = energy_recover_amount(score) * self.recovery_multiplier;
    }

    /// Energy drained this tick given the active modes
    pub fn tick_drain(&self, fever: bool, rocket: bool) -> f32 {
        if rocket {
            0.0
        } else if fever {
            self.decay_rate * FEVER_DECAY_FACTOR
        } else {
            self.decay_rate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_curve_endpoints() {
        assert!((energy_decay_rate(0) - 0.15).abs() < 1e-6);
        assert!((energy_decay_rate(450) - 0.6).abs() < 1e-5);
        assert_eq!(energy_decay_rate(100_000), MAX_DECAY_RATE);

        assert!((energy_recover_amount(0) - 8.0).abs() < 1e-6);
        assert!((energy_recover_amount(1000) - 3.0).abs() < 1e-5);
        assert_eq!(energy_recover_amount(100_000), MIN_RECOVER_AMOUNT);
    }

    #[test]
    fn test_multipliers_survive_recompute() {
        let mut model = EnergyModel::with_multipliers(ENERGY_MASTER_DECAY_FACTOR, RECOVERY_BOOST_FACTOR);
        model.recompute(100);
        assert!((model.decay_rate - energy_decay_rate(100) * 0.8).abs() < 1e-6);
        assert!((model.recover_amount - energy_recover_amount(100) * 1.3).abs() < 1e-5);
    }

    #[test]
    fn test_tick_drain_modes() {
        let model = EnergyModel::default();
        assert_eq!(model.tick_drain(false, true), 0.0);
        assert_eq!(model.tick_drain(true, true), 0.0);
        assert!((model.tick_drain(true, false) - 0.15 * 0.2).abs() < 1e-6);
        assert!((model.tick_drain(false, false) - 0.15).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_decay_non_decreasing_and_capped(a in 0u64..5_000, b in 0u64..5_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(energy_decay_rate(lo) <= energy_decay_rate(hi));
            prop_assert!(energy_decay_rate(hi) <= MAX_DECAY_RATE);
        }

        #[test]
        fn prop_recovery_non_increasing_and_floored(a in 0u64..5_000, b in 0u64..5_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(energy_recover_amount(lo) >= energy_recover_amount(hi));
            prop_assert!(energy_recover_amount(hi) >= MIN_RECOVER_AMOUNT);
        }
    }
}
