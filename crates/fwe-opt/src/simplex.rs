//! Dense tableau simplex with Bland's pivoting rule.
//!
//! Supports programs whose origin is feasible (every `rhs >= 0`), which is
//! always the case for procurement: buying nothing satisfies every cap.

use crate::lp::{LinearProgram, LpError, LpSolution, LpSolver, VarId};
use fwe_core::SolverSettings;
use tracing::trace;

#[derive(Clone, Debug)]
pub struct DenseSimplex {
    max_iterations: usize,
    tolerance: f64,
}

impl Default for DenseSimplex {
    fn default() -> Self {
        Self::new(&SolverSettings::default())
    }
}

impl DenseSimplex {
    pub fn new(settings: &SolverSettings) -> Self {
        Self {
            max_iterations: settings.max_iterations,
            tolerance: settings.tolerance,
        }
    }
}

fn max_abs(xs: impl Iterator<Item = f64>) -> f64 {
    xs.fold(0.0, |acc, v| acc.max(v.abs()))
}

fn pivot(t: &mut [Vec<f64>], row: usize, col: usize) {
    let p = t[row][col];
    for v in t[row].iter_mut() {
        *v /= p;
    }
    let pivot_row = t[row].clone();
    for (i, r) in t.iter_mut().enumerate() {
        if i == row {
            continue;
        }
        let f = r[col];
        if f != 0.0 {
            for (v, pv) in r.iter_mut().zip(&pivot_row) {
                *v -= f * pv;
            }
        }
    }
}

impl LpSolver for DenseSimplex {
    fn solve(&self, lp: &LinearProgram) -> Result<LpSolution, LpError> {
        let n = lp.num_variables();
        let m = lp.constraints().len();
        if let Some(j) = lp.objective().iter().position(|c| !c.is_finite()) {
            return Err(LpError::NonFinite(format!("objective of variable #{j}")));
        }
        for con in lp.constraints() {
            if !con.rhs.is_finite() || con.terms.iter().any(|(_, a)| !a.is_finite()) {
                return Err(LpError::NonFinite(format!("constraint {}", con.name)));
            }
            if con.rhs < 0.0 {
                return Err(LpError::OriginInfeasible {
                    constraint: con.name.clone(),
                    rhs: con.rhs,
                });
            }
        }

        // Rows are equilibrated and the objective normalised; neither changes
        // the optimal point.
        let width = n + m + 1;
        let rhs = width - 1;
        let mut t = vec![vec![0.0; width]; m + 1];
        for (i, con) in lp.constraints().iter().enumerate() {
            for &(v, a) in &con.terms {
                t[i][v.0] += a;
            }
            let scale = max_abs(t[i][..n].iter().copied()).max(1.0);
            for v in t[i][..n].iter_mut() {
                *v /= scale;
            }
            t[i][n + i] = 1.0;
            t[i][rhs] = con.rhs / scale;
        }
        let obj_scale = max_abs(lp.objective().iter().copied()).max(1.0);
        for (j, c) in lp.objective().iter().enumerate() {
            t[m][j] = -c / obj_scale;
        }

        let tol = self.tolerance;
        let mut basis: Vec<usize> = (n..n + m).collect();
        let mut iterations = 0;
        loop {
            let Some(col) = (0..n + m).find(|&j| t[m][j] < -tol) else {
                break;
            };
            if iterations >= self.max_iterations {
                return Err(LpError::IterationLimit { iterations });
            }
            let mut leave: Option<(usize, f64)> = None;
            for i in 0..m {
                let a = t[i][col];
                if a <= tol {
                    continue;
                }
                let ratio = t[i][rhs] / a;
                leave = match leave {
                    None => Some((i, ratio)),
                    Some((_, best)) if ratio < best - tol => Some((i, ratio)),
                    Some((r, best)) if ratio <= best + tol && basis[i] < basis[r] => {
                        Some((i, ratio))
                    }
                    keep => keep,
                };
            }
            let Some((row, _)) = leave else {
                let variable = if col < n {
                    lp.variable_name(VarId(col)).unwrap_or("?").to_string()
                } else {
                    lp.constraints()[col - n].name.clone()
                };
                return Err(LpError::Unbounded { variable });
            };
            trace!(iterations, row, col, "simplex pivot");
            pivot(&mut t, row, col);
            basis[row] = col;
            iterations += 1;
        }

        let mut values = vec![0.0; n];
        for (i, &b) in basis.iter().enumerate() {
            if b < n {
                values[b] = t[i][rhs].max(0.0);
            }
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(LpError::NonFinite("solution".to_string()));
        }
        Ok(LpSolution {
            objective: lp.objective_value(&values),
            values,
            iterations,
        })
    }
}
