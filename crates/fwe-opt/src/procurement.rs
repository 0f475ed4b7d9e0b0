//! Calorie-maximising procurement under budget and delivery constraints.

use crate::lp::{LinearProgram, LpError, LpSolver};
use crate::simplex::DenseSimplex;
use fwe_core::{
    BuyPlanLine, CommodityRecord, ContractRecord, Multipliers, OptimizationResult, SolverSettings,
};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, warn};

/// Name of the spend constraint.
pub const BUDGET_CONSTRAINT: &str = "budget";
/// Name of the aggregate tonnage constraint.
pub const AVAILABILITY_CONSTRAINT: &str = "availability";

#[derive(Debug, Error, PartialEq)]
pub enum OptimizeError {
    /// Reference data or adjusted inputs are malformed.
    #[error("data error: {0}")]
    Data(String),
    /// The backend failed on a well-formed program.
    #[error("solver failed at {context}: {source}")]
    Solver {
        context: String,
        #[source]
        source: LpError,
    },
}

/// A commodity present in both reference tables, with adjusted coefficients.
#[derive(Clone, Debug, PartialEq)]
pub struct AdjustedRow<'a> {
    pub commodity: &'a CommodityRecord,
    /// Price × (1 + insurance delta) × friction, USD per ton.
    pub adj_price: f64,
    /// Contracted tons × delivery multiplier.
    pub adj_tons: f64,
}

/// Inner-join contracts with prices in contract order and apply multipliers.
///
/// Rows without a counterpart in the other table are dropped.
pub fn join_reference<'a>(
    prices: &'a [CommodityRecord],
    contracts: &[ContractRecord],
    m: &Multipliers,
) -> Result<Vec<AdjustedRow<'a>>, OptimizeError> {
    let mut by_name: BTreeMap<&str, &CommodityRecord> = BTreeMap::new();
    for p in prices {
        if by_name.insert(p.name.as_str(), p).is_some() {
            return Err(OptimizeError::Data(format!("duplicate price record: {}", p.name)));
        }
    }
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut rows = Vec::with_capacity(contracts.len());
    for c in contracts {
        if !seen.insert(c.commodity.as_str()) {
            return Err(OptimizeError::Data(format!(
                "duplicate contract record: {}",
                c.commodity
            )));
        }
        let Some(commodity) = by_name.get(c.commodity.as_str()).copied() else {
            warn!(commodity = %c.commodity, "contract has no price record; dropped");
            continue;
        };
        let adj_price =
            commodity.unit_price_usd * (1.0 + m.insurance_delta) * m.price_friction;
        let adj_tons = c.tons * m.delivery;
        if !(adj_price.is_finite() && adj_price >= 0.0) {
            return Err(OptimizeError::Data(format!(
                "adjusted price for {} is {adj_price}",
                c.commodity
            )));
        }
        if !(adj_tons.is_finite() && adj_tons >= 0.0) {
            return Err(OptimizeError::Data(format!(
                "adjusted tonnage for {} is {adj_tons}",
                c.commodity
            )));
        }
        if !commodity.kcal_per_kg.is_finite() {
            return Err(OptimizeError::Data(format!(
                "kcal_per_kg for {} is not finite",
                c.commodity
            )));
        }
        rows.push(AdjustedRow {
            commodity,
            adj_price,
            adj_tons,
        });
    }
    for p in prices {
        if !seen.contains(p.name.as_str()) {
            warn!(commodity = %p.name, "price record has no contract; dropped");
        }
    }
    Ok(rows)
}

fn map_lp_error(e: LpError) -> OptimizeError {
    match e {
        LpError::OriginInfeasible { .. } | LpError::NonFinite(_) | LpError::Malformed(_) => {
            OptimizeError::Data(e.to_string())
        }
        LpError::Unbounded { ref variable } => OptimizeError::Solver {
            context: format!("objective along {variable}"),
            source: e.clone(),
        },
        LpError::IterationLimit { .. } => OptimizeError::Solver {
            context: format!("{BUDGET_CONSTRAINT}/{AVAILABILITY_CONSTRAINT} pivoting"),
            source: e,
        },
    }
}

/// Builds and solves the procurement program.
#[derive(Clone, Debug)]
pub struct ProcurementOptimizer<S = DenseSimplex> {
    solver: S,
}

impl ProcurementOptimizer<DenseSimplex> {
    pub fn new(settings: &SolverSettings) -> Self {
        Self::with_solver(DenseSimplex::new(settings))
    }
}

impl Default for ProcurementOptimizer<DenseSimplex> {
    fn default() -> Self {
        Self::with_solver(DenseSimplex::default())
    }
}

impl<S: LpSolver> ProcurementOptimizer<S> {
    pub fn with_solver(solver: S) -> Self {
        Self { solver }
    }

    /// Maximise calories subject to spend <= budget and total tons <= Σ
    /// adjusted availability.
    ///
    /// Availability is capped in aggregate only: a single commodity may
    /// exceed its own adjusted tonnage while the sum stays within the cap.
    pub fn solve(
        &self,
        prices: &[CommodityRecord],
        contracts: &[ContractRecord],
        multipliers: &Multipliers,
        budget_musd: f64,
    ) -> Result<OptimizationResult, OptimizeError> {
        if !(budget_musd.is_finite() && budget_musd >= 0.0) {
            return Err(OptimizeError::Data(format!(
                "budget must be finite and >= 0, got {budget_musd} MUSD"
            )));
        }
        let rows = join_reference(prices, contracts, multipliers)?;
        if rows.is_empty() {
            return Err(OptimizeError::Data(
                "no commodity appears in both price and contract tables".to_string(),
            ));
        }

        let mut lp = LinearProgram::new();
        let vars: Vec<_> = rows
            .iter()
            .map(|r| lp.add_variable(r.commodity.name.as_str(), r.commodity.kcal_per_kg * 1000.0))
            .collect();
        let budget_usd = budget_musd * 1_000_000.0;
        let cap_tons: f64 = rows.iter().map(|r| r.adj_tons).sum();
        lp.add_constraint(
            BUDGET_CONSTRAINT,
            vars.iter().zip(&rows).map(|(&v, r)| (v, r.adj_price)),
            budget_usd,
        )
        .map_err(map_lp_error)?;
        lp.add_constraint(
            AVAILABILITY_CONSTRAINT,
            vars.iter().map(|&v| (v, 1.0)),
            cap_tons,
        )
        .map_err(map_lp_error)?;

        let sol = self.solver.solve(&lp).map_err(map_lp_error)?;
        debug!(
            iterations = sol.iterations,
            budget_usd, cap_tons, "procurement program solved"
        );

        let mut plan = Vec::with_capacity(rows.len());
        let mut total_cost_usd = 0.0;
        let mut total_calories = 0.0;
        let mut total_protein_g = 0.0;
        for (r, &tons) in rows.iter().zip(&sol.values) {
            total_cost_usd += tons * r.adj_price;
            total_calories += tons * r.commodity.kcal_per_kg * 1000.0;
            total_protein_g += tons * r.commodity.protein_g_per_kg * 1000.0;
            plan.push(BuyPlanLine {
                commodity: r.commodity.name.clone(),
                tons,
                unit_price: r.adj_price,
            });
        }
        Ok(OptimizationResult {
            buy_plan: plan,
            total_cost_usd,
            total_calories,
            total_protein_g,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn optimizer() -> ProcurementOptimizer {
        ProcurementOptimizer::default()
    }

    fn commodity(name: &str, price: f64, kcal: f64, protein: f64) -> CommodityRecord {
        CommodityRecord {
            name: name.to_string(),
            unit_price_usd: price,
            kcal_per_kg: kcal,
            protein_g_per_kg: protein,
        }
    }

    fn contract(name: &str, tons: f64) -> ContractRecord {
        ContractRecord {
            commodity: name.to_string(),
            tons,
        }
    }

    fn prices() -> Vec<CommodityRecord> {
        vec![
            commodity("rice", 500.0, 3600.0, 70.0),
            commodity("wheat", 330.0, 3400.0, 110.0),
            commodity("poultry_eq", 1800.0, 2390.0, 270.0),
            commodity("edible_oil", 1000.0, 8840.0, 0.0),
        ]
    }

    fn contracts() -> Vec<ContractRecord> {
        vec![
            contract("rice", 300_000.0),
            contract("wheat", 400_000.0),
            contract("poultry_eq", 80_000.0),
            contract("edible_oil", 60_000.0),
        ]
    }

    fn tons(r: &OptimizationResult, name: &str) -> f64 {
        r.buy_plan
            .iter()
            .find(|l| l.commodity == name)
            .map(|l| l.tons)
            .unwrap()
    }

    #[test]
    fn baseline_allocation_is_exact() {
        // Both constraints bind: oil + wheat = 840k t, 1000·oil + 330·wheat = 500M.
        let opt = optimizer();
        let r = opt
            .solve(&prices(), &contracts(), &Multipliers::NEUTRAL, 500.0)
            .unwrap();
        let oil = 222_800_000.0 / 670.0;
        assert_eq!(r.buy_plan.len(), 4);
        assert!((tons(&r, "edible_oil") - oil).abs() < 1e-4);
        assert!((tons(&r, "wheat") - (840_000.0 - oil)).abs() < 1e-4);
        assert!(tons(&r, "rice").abs() < 1e-6);
        assert!(tons(&r, "poultry_eq").abs() < 1e-6);
        assert!((r.total_cost_usd - 500_000_000.0).abs() < 1e-2);
        let expected_cal = oil * 8_840_000.0 + (840_000.0 - oil) * 3_400_000.0;
        assert!((r.total_calories - expected_cal).abs() / expected_cal < 1e-9);
        let expected_protein = (840_000.0 - oil) * 110_000.0;
        assert!((r.total_protein_g - expected_protein).abs() / expected_protein < 1e-9);
    }

    #[test]
    fn edible_oil_exceeds_own_contract_under_aggregate_cap() {
        let opt = optimizer();
        let r = opt
            .solve(&prices(), &contracts(), &Multipliers::NEUTRAL, 500.0)
            .unwrap();
        assert!(tons(&r, "edible_oil") > 60_000.0);
        assert!(r.total_tons() <= 840_000.0 + 1e-6);
    }

    #[test]
    fn small_budget_buys_cheapest_calories() {
        let opt = optimizer();
        let r = opt
            .solve(&prices(), &contracts(), &Multipliers::NEUTRAL, 1.0)
            .unwrap();
        assert!((tons(&r, "wheat") - 1_000_000.0 / 330.0).abs() < 1e-6);
        assert!(tons(&r, "edible_oil").abs() < 1e-9);
    }

    #[test]
    fn multipliers_adjust_price_and_cap() {
        let m = Multipliers {
            delivery: 0.5,
            insurance_delta: 0.25,
            price_friction: 1.2,
            margin: 1.0,
        };
        let p = prices();
        let c = contracts();
        let rows = join_reference(&p, &c, &m).unwrap();
        assert!((rows[0].adj_price - 500.0 * 1.25 * 1.2).abs() < 1e-9);
        assert!((rows[0].adj_tons - 150_000.0).abs() < 1e-9);
        let r = optimizer()
            .solve(&prices(), &contracts(), &m, 1_000_000.0)
            .unwrap();
        assert!((r.total_tons() - 420_000.0).abs() < 1e-6);
        assert!((tons(&r, "edible_oil") - 420_000.0).abs() < 1e-6);
    }

    #[test]
    fn zero_price_commodity_fills_aggregate_cap() {
        let mut p = prices();
        p[0].unit_price_usd = 0.0;
        let r = optimizer()
            .solve(&p, &contracts(), &Multipliers::NEUTRAL, 0.0)
            .unwrap();
        assert!((tons(&r, "rice") - 840_000.0).abs() < 1e-6);
        assert!(tons(&r, "edible_oil").abs() < 1e-9);
        assert_eq!(r.total_cost_usd, 0.0);
        assert!((r.total_calories - 840_000.0 * 3_600_000.0).abs() < 1.0);
    }

    #[test]
    fn zero_budget_buys_nothing() {
        let r = optimizer()
            .solve(&prices(), &contracts(), &Multipliers::NEUTRAL, 0.0)
            .unwrap();
        assert_eq!(r.buy_plan.len(), 4);
        assert!(r.buy_plan.iter().all(|l| l.tons == 0.0));
        assert_eq!(r.total_calories, 0.0);
        assert_eq!(r.total_cost_usd, 0.0);
    }

    #[test]
    fn unmatched_rows_are_dropped() {
        let mut p = prices();
        p.push(commodity("maize", 250.0, 3650.0, 94.0));
        let mut c = contracts();
        c.push(contract("sorghum", 10_000.0));
        let r = optimizer()
            .solve(&p, &c, &Multipliers::NEUTRAL, 100.0)
            .unwrap();
        let names: Vec<&str> = r.buy_plan.iter().map(|l| l.commodity.as_str()).collect();
        assert_eq!(names, vec!["rice", "wheat", "poultry_eq", "edible_oil"]);
    }

    #[test]
    fn empty_join_is_data_error() {
        let err = optimizer()
            .solve(&prices(), &[contract("sorghum", 1.0)], &Multipliers::NEUTRAL, 10.0)
            .unwrap_err();
        assert!(matches!(err, OptimizeError::Data(_)));
    }

    #[test]
    fn negative_budget_is_data_error() {
        let err = optimizer()
            .solve(&prices(), &contracts(), &Multipliers::NEUTRAL, -1.0)
            .unwrap_err();
        assert!(matches!(err, OptimizeError::Data(_)));
    }

    #[test]
    fn duplicate_contract_is_data_error() {
        let c = vec![contract("rice", 1.0), contract("rice", 2.0)];
        let err = optimizer()
            .solve(&prices(), &c, &Multipliers::NEUTRAL, 10.0)
            .unwrap_err();
        assert!(matches!(err, OptimizeError::Data(_)));
    }

    #[test]
    fn iteration_limit_surfaces_as_solver_error() {
        let opt = ProcurementOptimizer::new(&SolverSettings {
            max_iterations: 1,
            tolerance: 1e-9,
        });
        let err = opt
            .solve(&prices(), &contracts(), &Multipliers::NEUTRAL, 500.0)
            .unwrap_err();
        assert!(matches!(err, OptimizeError::Solver { .. }));
    }

    proptest! {
        #[test]
        fn budget_and_cap_hold(budget in 0.0f64..5_000.0,
                               delivery in 0.1f64..=1.0,
                               ins in 0.0f64..2.0,
                               fric in 1.0f64..2.0) {
            let m = Multipliers { delivery, insurance_delta: ins, price_friction: fric, margin: 1.0 };
            let r = optimizer().solve(&prices(), &contracts(), &m, budget).unwrap();
            let budget_usd = budget * 1_000_000.0;
            prop_assert!(r.total_cost_usd <= budget_usd * (1.0 + 1e-9) + 1e-6);
            prop_assert!(r.total_tons() <= 840_000.0 * delivery * (1.0 + 1e-9) + 1e-6);
            prop_assert!(r.buy_plan.iter().all(|l| l.tons >= 0.0));
            prop_assert!(r.total_calories >= 0.0);
        }
    }
}
