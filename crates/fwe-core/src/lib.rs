#![deny(warnings)]

//! Core domain models and invariants for the FWE scenario model.
//!
//! This crate defines the serializable types exchanged between pipeline
//! stages, the boundary validation for scenario descriptors, and the
//! tunable model configuration.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

pub mod config;

pub use config::{
    ConfigError, DelayCoefficients, ModelConfig, SolverSettings, UncertaintyCoefficients,
};

/// Lower clamp for the delivery multiplier.
pub const DELIVERY_MIN: f64 = 0.1;
/// Upper clamp for the delivery multiplier.
pub const DELIVERY_MAX: f64 = 1.0;

/// Result and diagnostics key names as exposed to callers.
pub mod keys {
    pub const DAYS_OF_SUPPLY: &str = "days_of_supply_calories";
    pub const MEAN_DELAY_DAYS: &str = "mean_logistics_delay_days";
    pub const M_DELIV: &str = "M_deliv";
    pub const DELTA_INS: &str = "delta_ins";
    pub const M_PRC_FRIC: &str = "M_prc_fric";
    pub const M_MARGIN: &str = "M_margin";
    pub const TOTAL_COST_USD: &str = "total_cost_usd";
    pub const TOTAL_CALORIES: &str = "total_calories";
}

/// Ordinal severity of disruption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ConflictIntensity {
    /// No active conflict.
    Calm = 0,
    /// Localised skirmishes.
    Low = 1,
    /// Sustained regional conflict.
    Elevated = 2,
    /// Full-scale disruption.
    Severe = 3,
}

impl ConflictIntensity {
    /// All levels in ascending order.
    pub const ALL: [ConflictIntensity; 4] = [
        ConflictIntensity::Calm,
        ConflictIntensity::Low,
        ConflictIntensity::Elevated,
        ConflictIntensity::Severe,
    ];

    /// Numeric level in {0,1,2,3}.
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Level as a float for use in the model formulas.
    pub fn as_f64(self) -> f64 {
        f64::from(self.level())
    }
}

impl TryFrom<u8> for ConflictIntensity {
    type Error = ValidationError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(ConflictIntensity::Calm),
            1 => Ok(ConflictIntensity::Low),
            2 => Ok(ConflictIntensity::Elevated),
            3 => Ok(ConflictIntensity::Severe),
            other => Err(ValidationError::InvalidIntensity(other)),
        }
    }
}

impl From<ConflictIntensity> for u8 {
    fn from(ci: ConflictIntensity) -> u8 {
        ci.level()
    }
}

fn default_demand() -> u32 {
    2200
}

fn default_population() -> f64 {
    5.9
}

fn default_budget() -> f64 {
    500.0
}

/// A single what-if scenario descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInput {
    /// Posture index in [-1, 1]; 0 is neutral.
    #[serde(rename = "PI")]
    pub posture_index: f64,
    /// Conflict intensity level.
    #[serde(rename = "CI")]
    pub conflict_intensity: ConflictIntensity,
    /// Scenario duration in weeks.
    #[serde(rename = "D_weeks")]
    pub duration_weeks: u32,
    /// Caloric demand per capita per day.
    #[serde(default = "default_demand")]
    pub demand_cal_per_cap_day: u32,
    /// Population in millions.
    #[serde(rename = "population_m", default = "default_population")]
    pub population_millions: f64,
    /// Procurement budget in millions of USD.
    #[serde(default = "default_budget")]
    pub budget_musd: f64,
    /// Seed for the randomness stream; `None` draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ScenarioInput {
    /// Scenario with the default demand, population and budget.
    pub fn new(posture_index: f64, conflict_intensity: ConflictIntensity, duration_weeks: u32) -> Self {
        Self {
            posture_index,
            conflict_intensity,
            duration_weeks,
            demand_cal_per_cap_day: default_demand(),
            population_millions: default_population(),
            budget_musd: default_budget(),
            seed: None,
        }
    }

    /// Builder-style seed setter.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// A commodity with price and nutrition data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommodityRecord {
    /// Unique commodity key, e.g. "rice".
    #[serde(rename = "commodity")]
    pub name: String,
    /// Unit price in USD per ton.
    #[serde(rename = "price")]
    pub unit_price_usd: f64,
    /// Kilocalories per kilogram.
    pub kcal_per_kg: f64,
    /// Protein grams per kilogram.
    pub protein_g_per_kg: f64,
}

/// A contracted tonnage ceiling for one commodity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Commodity key referencing a [`CommodityRecord`].
    pub commodity: String,
    /// Contracted tons.
    pub tons: f64,
}

/// Uncertainty multipliers derived for one evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Multipliers {
    /// Delivery multiplier in [0.1, 1.0].
    #[serde(rename = "M_deliv")]
    pub delivery: f64,
    /// Insurance premium delta (>= 0).
    #[serde(rename = "delta_ins")]
    pub insurance_delta: f64,
    /// Price friction multiplier (>= 1).
    #[serde(rename = "M_prc_fric")]
    pub price_friction: f64,
    /// Margin multiplier (>= 1).
    #[serde(rename = "M_margin")]
    pub margin: f64,
}

impl Multipliers {
    /// Multipliers of a fully calm scenario with no jitter.
    pub const NEUTRAL: Multipliers = Multipliers {
        delivery: 1.0,
        insurance_delta: 0.0,
        price_friction: 1.0,
        margin: 1.0,
    };

    /// Named entries in diagnostics order.
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            (keys::M_DELIV, self.delivery),
            (keys::DELTA_INS, self.insurance_delta),
            (keys::M_PRC_FRIC, self.price_friction),
            (keys::M_MARGIN, self.margin),
        ]
    }
}

/// One purchase decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuyPlanLine {
    pub commodity: String,
    /// Tons purchased (>= 0).
    pub tons: f64,
    /// Adjusted unit price in USD per ton.
    pub unit_price: f64,
}

/// Output of the procurement optimizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// One line per joined commodity, in contract order.
    pub buy_plan: Vec<BuyPlanLine>,
    pub total_cost_usd: f64,
    pub total_calories: f64,
    /// Protein acquired in grams; reported, never optimized.
    pub total_protein_g: f64,
}

impl OptimizationResult {
    /// Total tons purchased across the plan.
    pub fn total_tons(&self) -> f64 {
        self.buy_plan.iter().map(|l| l.tons).sum()
    }
}

/// Final result of a scenario evaluation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub kpis: BTreeMap<String, f64>,
    pub diagnostics: BTreeMap<String, f64>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Validation errors for scenario descriptors and reference records.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Posture index outside [-1, 1].
    #[error("posture index {0} is outside [-1, 1]")]
    PostureOutOfRange(f64),
    /// Conflict intensity outside {0,1,2,3}.
    #[error("conflict intensity {0} is not one of 0, 1, 2, 3")]
    InvalidIntensity(u8),
    /// Numeric field must be finite.
    #[error("non-finite value for {0}")]
    NonFinite(&'static str),
    /// Numeric field must be strictly positive.
    #[error("{0} must be > 0")]
    NonPositive(&'static str),
    /// Numeric field must be non-negative.
    #[error("{0} must be >= 0")]
    Negative(&'static str),
    /// Record key must be non-empty.
    #[error("empty commodity name")]
    EmptyName,
    /// Record key appears twice in one table.
    #[error("duplicate commodity: {0}")]
    DuplicateCommodity(String),
}

/// Validate a scenario at the boundary, before it reaches the pipeline.
pub fn validate_scenario(s: &ScenarioInput) -> Result<(), ValidationError> {
    if !s.posture_index.is_finite() {
        return Err(ValidationError::NonFinite("PI"));
    }
    if !(-1.0..=1.0).contains(&s.posture_index) {
        return Err(ValidationError::PostureOutOfRange(s.posture_index));
    }
    if !s.population_millions.is_finite() {
        return Err(ValidationError::NonFinite("population_m"));
    }
    if s.population_millions <= 0.0 {
        return Err(ValidationError::NonPositive("population_m"));
    }
    if !s.budget_musd.is_finite() {
        return Err(ValidationError::NonFinite("budget_musd"));
    }
    if s.budget_musd <= 0.0 {
        return Err(ValidationError::NonPositive("budget_musd"));
    }
    if s.demand_cal_per_cap_day == 0 {
        return Err(ValidationError::NonPositive("demand_cal_per_cap_day"));
    }
    Ok(())
}

/// Validate a commodity record.
pub fn validate_commodity(c: &CommodityRecord) -> Result<(), ValidationError> {
    if c.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let fields = [
        ("price", c.unit_price_usd),
        ("kcal_per_kg", c.kcal_per_kg),
        ("protein_g_per_kg", c.protein_g_per_kg),
    ];
    for (name, v) in fields {
        if !v.is_finite() {
            return Err(ValidationError::NonFinite(name));
        }
        if v < 0.0 {
            return Err(ValidationError::Negative(name));
        }
    }
    Ok(())
}

/// Validate a contract record.
pub fn validate_contract(c: &ContractRecord) -> Result<(), ValidationError> {
    if c.commodity.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if !c.tons.is_finite() {
        return Err(ValidationError::NonFinite("tons"));
    }
    if c.tons < 0.0 {
        return Err(ValidationError::Negative("tons"));
    }
    Ok(())
}

/// Validate both reference tables, including key uniqueness.
pub fn validate_reference_tables(
    commodities: &[CommodityRecord],
    contracts: &[ContractRecord],
) -> Result<(), ValidationError> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for c in commodities {
        validate_commodity(c)?;
        if !seen.insert(c.name.as_str()) {
            return Err(ValidationError::DuplicateCommodity(c.name.clone()));
        }
    }
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for c in contracts {
        validate_contract(c)?;
        if !seen.insert(c.commodity.as_str()) {
            return Err(ValidationError::DuplicateCommodity(c.commodity.clone()));
        }
    }
    Ok(())
}
