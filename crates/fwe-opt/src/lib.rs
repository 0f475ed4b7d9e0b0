#![deny(warnings)]

//! Procurement optimization for the FWE pipeline.
//!
//! The LP model ([`LinearProgram`]) is kept separate from the backend
//! ([`LpSolver`]) so the dense simplex can be swapped without touching the
//! coefficient derivation in [`ProcurementOptimizer`].

pub mod lp;
pub mod procurement;
pub mod simplex;

pub use lp::{Constraint, LinearProgram, LpError, LpSolution, LpSolver, VarId};
pub use procurement::{
    join_reference, AdjustedRow, OptimizeError, ProcurementOptimizer, AVAILABILITY_CONSTRAINT,
    BUDGET_CONSTRAINT,
};
pub use simplex::DenseSimplex;
