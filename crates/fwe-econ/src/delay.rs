//! Logistics delay simulator.

use crate::rng::RandomnessSource;
use fwe_core::{ConflictIntensity, DelayCoefficients};
use tracing::debug;

/// Expected delivery delay under a log-normal noise factor.
#[derive(Clone, Debug, Default)]
pub struct DelaySimulator {
    coeffs: DelayCoefficients,
}

impl DelaySimulator {
    pub fn new(coeffs: DelayCoefficients) -> Self {
        Self { coeffs }
    }

    /// Deterministic part of the delay in days, before noise.
    pub fn base_delay(&self, delivery: f64, intensity: ConflictIntensity, duration_weeks: u32) -> f64 {
        let c = &self.coeffs;
        c.base_days
            + c.per_intensity_days * intensity.as_f64()
            + c.per_week_days * f64::from(duration_weeks)
            + (1.0 - delivery) * c.shortfall_days
    }

    /// Estimate the delay in days, consuming exactly one draw. Never negative.
    pub fn estimate(
        &self,
        delivery: f64,
        intensity: ConflictIntensity,
        duration_weeks: u32,
        rng: &mut RandomnessSource,
    ) -> f64 {
        let base = self.base_delay(delivery, intensity, duration_weeks);
        let noise = rng.next_normal(0.0, self.coeffs.noise_sd).exp();
        let days = (base * noise).max(0.0);
        debug!(base, noise, days, "logistics delay estimated");
        days
    }
}
