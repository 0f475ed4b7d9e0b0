//! Uncertainty multiplier model.

use crate::rng::RandomnessSource;
use fwe_core::{ConflictIntensity, Multipliers, UncertaintyCoefficients, DELIVERY_MAX, DELIVERY_MIN};
use tracing::debug;

/// Maps scenario drivers to price, delivery and margin multipliers.
#[derive(Clone, Debug, Default)]
pub struct UncertaintyModel {
    coeffs: UncertaintyCoefficients,
}

impl UncertaintyModel {
    pub fn new(coeffs: UncertaintyCoefficients) -> Self {
        Self { coeffs }
    }

    /// Compute multipliers, consuming exactly one draw for delivery jitter.
    ///
    /// `posture_index` is clamped to [-1, 1] (NaN counts as neutral).
    pub fn compute(
        &self,
        posture_index: f64,
        intensity: ConflictIntensity,
        duration_weeks: u32,
        rng: &mut RandomnessSource,
    ) -> Multipliers {
        let c = &self.coeffs;
        let pi = if posture_index.is_nan() {
            0.0
        } else {
            posture_index.clamp(-1.0, 1.0)
        };
        let ci = intensity.as_f64();
        let quarters = f64::from(duration_weeks) / 12.0;

        let decay = (-(c.alpha1 * ci + c.alpha2 * quarters + c.alpha3 * pi.abs())).exp();
        let insurance = c.gamma1 * ci + c.gamma2 * quarters + c.gamma3 * pi.abs();
        let friction = 1.0 + c.prc_fric_pi * pi.max(0.0) + c.prc_fric_ci * ci;
        let margin = 1.0 + c.zeta1 * ci + c.zeta2 * quarters + c.zeta3 * pi.abs();
        let jitter = rng.next_normal(0.0, c.delivery_jitter_sd);

        let m = Multipliers {
            delivery: (decay + jitter).clamp(DELIVERY_MIN, DELIVERY_MAX),
            insurance_delta: insurance.max(0.0),
            price_friction: friction,
            margin,
        };
        debug!(pi, ci, duration_weeks, decay, jitter, ?m, "multipliers computed");
        m
    }
}
