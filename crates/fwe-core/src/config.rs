//! Tunable model coefficients.
//!
//! Every field has a default, so a YAML file only needs the keys it overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid config: {0}")]
    Parse(String),
    #[error("config field {field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

/// Coefficients of the uncertainty multiplier model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UncertaintyCoefficients {
    /// Delivery decay per intensity level.
    pub alpha1: f64,
    /// Delivery decay per 12 weeks of duration.
    pub alpha2: f64,
    /// Delivery decay per unit of |PI|.
    pub alpha3: f64,
    /// Insurance delta per intensity level.
    pub gamma1: f64,
    pub gamma2: f64,
    pub gamma3: f64,
    /// Margin uplift per intensity level.
    pub zeta1: f64,
    pub zeta2: f64,
    pub zeta3: f64,
    /// Price friction per unit of positive PI.
    pub prc_fric_pi: f64,
    /// Price friction per intensity level.
    pub prc_fric_ci: f64,
    /// Standard deviation of the delivery jitter draw.
    pub delivery_jitter_sd: f64,
}

impl Default for UncertaintyCoefficients {
    fn default() -> Self {
        Self {
            alpha1: 0.35,
            alpha2: 0.15,
            alpha3: 0.10,
            gamma1: 0.20,
            gamma2: 0.05,
            gamma3: 0.07,
            zeta1: 0.40,
            zeta2: 0.10,
            zeta3: 0.10,
            prc_fric_pi: 0.20,
            prc_fric_ci: 0.08,
            delivery_jitter_sd: 0.01,
        }
    }
}

/// Coefficients of the logistics delay simulator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayCoefficients {
    /// Delay with no disruption, in days.
    pub base_days: f64,
    pub per_intensity_days: f64,
    pub per_week_days: f64,
    /// Days added per unit of delivery shortfall (1 - M_deliv).
    pub shortfall_days: f64,
    /// Standard deviation of the log-normal noise draw.
    pub noise_sd: f64,
}

impl Default for DelayCoefficients {
    fn default() -> Self {
        Self {
            base_days: 3.0,
            per_intensity_days: 2.0,
            per_week_days: 0.2,
            shortfall_days: 10.0,
            noise_sd: 0.3,
        }
    }
}

/// Limits for the LP backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Pivot budget before the solve is abandoned.
    pub max_iterations: usize,
    /// Numerical tolerance for pivot and optimality tests.
    pub tolerance: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-9,
        }
    }
}

/// Full model configuration, fixed per deployment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub uncertainty: UncertaintyCoefficients,
    pub delay: DelayCoefficients,
    pub solver: SolverSettings,
}

fn check(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if !v.is_finite() {
        return Err(ConfigError::Invalid { field, reason: "must be finite" });
    }
    if v < 0.0 {
        return Err(ConfigError::Invalid { field, reason: "must be >= 0" });
    }
    Ok(())
}

impl ModelConfig {
    /// Parse a YAML document and validate it.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: ModelConfig = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Reject coefficients that would break the model's sign conventions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let u = &self.uncertainty;
        for (field, v) in [
            ("uncertainty.alpha1", u.alpha1),
            ("uncertainty.alpha2", u.alpha2),
            ("uncertainty.alpha3", u.alpha3),
            ("uncertainty.gamma1", u.gamma1),
            ("uncertainty.gamma2", u.gamma2),
            ("uncertainty.gamma3", u.gamma3),
            ("uncertainty.zeta1", u.zeta1),
            ("uncertainty.zeta2", u.zeta2),
            ("uncertainty.zeta3", u.zeta3),
            ("uncertainty.prc_fric_pi", u.prc_fric_pi),
            ("uncertainty.prc_fric_ci", u.prc_fric_ci),
            ("uncertainty.delivery_jitter_sd", u.delivery_jitter_sd),
        ] {
            check(field, v)?;
        }
        let d = &self.delay;
        for (field, v) in [
            ("delay.base_days", d.base_days),
            ("delay.per_intensity_days", d.per_intensity_days),
            ("delay.per_week_days", d.per_week_days),
            ("delay.shortfall_days", d.shortfall_days),
            ("delay.noise_sd", d.noise_sd),
        ] {
            check(field, v)?;
        }
        if self.solver.max_iterations == 0 {
            return Err(ConfigError::Invalid {
                field: "solver.max_iterations",
                reason: "must be > 0",
            });
        }
        if !(self.solver.tolerance.is_finite() && self.solver.tolerance > 0.0) {
            return Err(ConfigError::Invalid {
                field: "solver.tolerance",
                reason: "must be finite and > 0",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        ModelConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg = ModelConfig::from_yaml_str("uncertainty:\n  alpha1: 0.5\ndelay:\n  noise_sd: 0.0\n").unwrap();
        assert_eq!(cfg.uncertainty.alpha1, 0.5);
        assert_eq!(cfg.uncertainty.alpha2, 0.15);
        assert_eq!(cfg.delay.noise_sd, 0.0);
        assert_eq!(cfg.delay.base_days, 3.0);
        assert_eq!(cfg.solver, SolverSettings::default());
    }

    #[test]
    fn negative_coefficient_rejected() {
        let err = ModelConfig::from_yaml_str("uncertainty:\n  gamma2: -0.1\n").unwrap_err();
        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "uncertainty.gamma2"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_iterations_rejected() {
        assert!(ModelConfig::from_yaml_str("solver:\n  max_iterations: 0\n").is_err());
    }

    #[test]
    fn shipped_model_file_matches_defaults() {
        let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/model.yaml");
        let cfg = ModelConfig::load(path).unwrap();
        assert_eq!(cfg, ModelConfig::default());
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(ModelConfig::load("/nonexistent/model.yaml"), Err(ConfigError::Io(_))));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = ModelConfig::from_yaml_str("uncertainty: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
