#![deny(warnings)]

//! Scenario evaluation pipeline.
//!
//! Stages run in a fixed order over one shared randomness stream:
//! multipliers (one draw), procurement solve, delay (one draw), KPIs.
//! Reordering the draws changes seeded results.

use fwe_core::{
    keys, validate_scenario, ModelConfig, Multipliers, OptimizationResult, PipelineResult,
    ScenarioInput, ValidationError,
};
use fwe_data::{BaselineReferenceData, ReferenceDataProvider};
use fwe_econ::{aggregate, DelaySimulator, EconError, RandomnessSource, UncertaintyModel};
use fwe_opt::{DenseSimplex, LpError, LpSolver, OptimizeError, ProcurementOptimizer};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, info_span};

/// Static advisory notes attached to every result.
pub const NOTES: [&str; 2] = [
    "Procurement maximizes calories only; protein, cost and risk are reported, not optimized.",
    "Availability is capped across all contracts in aggregate, not per commodity.",
];

/// Failure of a pipeline run. No partial result is ever returned.
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("invalid scenario: {0}")]
    Validation(#[from] ValidationError),
    #[error("data error: {0}")]
    Data(String),
    #[error("days of supply undefined: daily caloric need is {need}")]
    Division { need: f64 },
    #[error("solver error at {context}: {source}")]
    Solver {
        context: String,
        #[source]
        source: LpError,
    },
}

impl From<OptimizeError> for PipelineError {
    fn from(e: OptimizeError) -> Self {
        match e {
            OptimizeError::Data(msg) => PipelineError::Data(msg),
            OptimizeError::Solver { context, source } => PipelineError::Solver { context, source },
        }
    }
}

impl From<EconError> for PipelineError {
    fn from(e: EconError) -> Self {
        match e {
            EconError::Division { need } => PipelineError::Division { need },
            EconError::NonFinite(what) => PipelineError::Data(format!("non-finite {what}")),
        }
    }
}

/// Everything a run produced, for boundary layers that show the buy plan.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Evaluation {
    pub result: PipelineResult,
    pub multipliers: Multipliers,
    pub optimization: OptimizationResult,
    pub delay_days: f64,
}

/// Fixed-order scenario evaluator.
///
/// Holds only immutable configuration, so one instance can serve concurrent
/// evaluations; each run creates its own [`RandomnessSource`].
#[derive(Clone, Debug)]
pub struct Pipeline<P = BaselineReferenceData, S = DenseSimplex> {
    reference: P,
    uncertainty: UncertaintyModel,
    optimizer: ProcurementOptimizer<S>,
    delay: DelaySimulator,
}

impl Pipeline<BaselineReferenceData, DenseSimplex> {
    /// Pipeline over the built-in baseline tables.
    pub fn new(config: &ModelConfig) -> Self {
        Self::with_reference(config, BaselineReferenceData)
    }
}

impl Default for Pipeline<BaselineReferenceData, DenseSimplex> {
    fn default() -> Self {
        Self::new(&ModelConfig::default())
    }
}

impl<P: ReferenceDataProvider> Pipeline<P, DenseSimplex> {
    pub fn with_reference(config: &ModelConfig, reference: P) -> Self {
        Self::from_parts(
            reference,
            UncertaintyModel::new(config.uncertainty.clone()),
            ProcurementOptimizer::new(&config.solver),
            DelaySimulator::new(config.delay.clone()),
        )
    }
}

impl<P: ReferenceDataProvider, S: LpSolver> Pipeline<P, S> {
    pub fn from_parts(
        reference: P,
        uncertainty: UncertaintyModel,
        optimizer: ProcurementOptimizer<S>,
        delay: DelaySimulator,
    ) -> Self {
        Self {
            reference,
            uncertainty,
            optimizer,
            delay,
        }
    }

    /// Evaluate one scenario.
    ///
    /// The input is not validated here; see [`run_scenario`]. A zero
    /// population or demand surfaces as [`PipelineError::Division`].
    pub fn evaluate(&self, input: &ScenarioInput) -> Result<PipelineResult, PipelineError> {
        self.evaluate_detailed(input).map(|e| e.result)
    }

    /// Evaluate and keep the intermediate stage outputs.
    pub fn evaluate_detailed(&self, input: &ScenarioInput) -> Result<Evaluation, PipelineError> {
        let span = info_span!(
            "evaluate",
            ci = input.conflict_intensity.level(),
            weeks = input.duration_weeks,
            seed = ?input.seed
        );
        let _guard = span.enter();

        let ci = input.conflict_intensity;
        let weeks = input.duration_weeks;
        let mut rng = RandomnessSource::new(input.seed);
        let tables = self.reference.tables();

        let multipliers = self
            .uncertainty
            .compute(input.posture_index, ci, weeks, &mut rng);
        let optimization = self.optimizer.solve(
            &tables.commodities,
            &tables.contracts,
            &multipliers,
            input.budget_musd,
        )?;
        debug!(
            cost = optimization.total_cost_usd,
            calories = optimization.total_calories,
            "procurement done"
        );
        let delay_days = self.delay.estimate(multipliers.delivery, ci, weeks, &mut rng);
        let kpis = aggregate(
            optimization.total_calories,
            input.population_millions,
            input.demand_cal_per_cap_day,
            delay_days,
        )?;

        let mut diagnostics: BTreeMap<String, f64> = multipliers
            .entries()
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        diagnostics.insert(keys::TOTAL_COST_USD.to_string(), optimization.total_cost_usd);
        diagnostics.insert(keys::TOTAL_CALORIES.to_string(), optimization.total_calories);

        info!(
            days_of_supply = kpis.days_of_supply_calories,
            delay_days, "scenario evaluated"
        );
        Ok(Evaluation {
            result: PipelineResult {
                kpis: kpis.to_map(),
                diagnostics,
                notes: NOTES.iter().map(|s| s.to_string()).collect(),
            },
            multipliers,
            optimization,
            delay_days,
        })
    }
}

/// Evaluate with default coefficients and the baseline tables.
pub fn evaluate(input: &ScenarioInput) -> Result<PipelineResult, PipelineError> {
    Pipeline::new(&ModelConfig::default()).evaluate(input)
}

/// Boundary entry point: validate the scenario, then evaluate it.
pub fn run_scenario<P: ReferenceDataProvider, S: LpSolver>(
    pipeline: &Pipeline<P, S>,
    input: &ScenarioInput,
) -> Result<Evaluation, PipelineError> {
    validate_scenario(input)?;
    pipeline.evaluate_detailed(input)
}
