//! Solver-agnostic linear program model.
//!
//! Programs are always of the form: maximize `c·x` subject to `A x <= b`,
//! `x >= 0`. Backends implement [`LpSolver`].

use thiserror::Error;

/// Handle to a decision variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub usize);

/// A `<=` constraint over sparse terms.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub terms: Vec<(VarId, f64)>,
    pub rhs: f64,
}

/// Errors from model construction or a backend solve.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LpError {
    #[error("malformed program: {0}")]
    Malformed(String),
    #[error("non-finite coefficient in {0}")]
    NonFinite(String),
    /// The origin violates this constraint; the backend needs a feasible start.
    #[error("constraint {constraint} has negative right-hand side {rhs}")]
    OriginInfeasible { constraint: String, rhs: f64 },
    #[error("objective is unbounded along variable {variable}")]
    Unbounded { variable: String },
    #[error("no optimum after {iterations} pivots")]
    IterationLimit { iterations: usize },
}

/// Optimal point of a program.
#[derive(Clone, Debug, PartialEq)]
pub struct LpSolution {
    /// Variable values, indexed by [`VarId`].
    pub values: Vec<f64>,
    pub objective: f64,
    pub iterations: usize,
}

/// A maximization program with non-negative variables.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinearProgram {
    names: Vec<String>,
    objective: Vec<f64>,
    constraints: Vec<Constraint>,
}

impl LinearProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a non-negative variable with its objective coefficient.
    pub fn add_variable(&mut self, name: impl Into<String>, objective: f64) -> VarId {
        self.names.push(name.into());
        self.objective.push(objective);
        VarId(self.names.len() - 1)
    }

    /// Add `Σ coeff·var <= rhs`. Repeated variables are summed.
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        terms: impl IntoIterator<Item = (VarId, f64)>,
        rhs: f64,
    ) -> Result<(), LpError> {
        let name = name.into();
        let terms: Vec<(VarId, f64)> = terms.into_iter().collect();
        if let Some((v, _)) = terms.iter().find(|(v, _)| v.0 >= self.names.len()) {
            return Err(LpError::Malformed(format!(
                "constraint {name} references unknown variable #{}",
                v.0
            )));
        }
        self.constraints.push(Constraint { name, terms, rhs });
        Ok(())
    }

    pub fn num_variables(&self) -> usize {
        self.names.len()
    }

    pub fn variable_name(&self, v: VarId) -> Option<&str> {
        self.names.get(v.0).map(String::as_str)
    }

    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Objective value at `x`.
    pub fn objective_value(&self, x: &[f64]) -> f64 {
        self.objective.iter().zip(x).map(|(c, v)| c * v).sum()
    }
}

/// A backend able to solve a [`LinearProgram`] exactly.
pub trait LpSolver {
    fn solve(&self, lp: &LinearProgram) -> Result<LpSolution, LpError>;
}
