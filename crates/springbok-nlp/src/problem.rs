//! Solver-facing callback surface and the fixed F-vector assembly order.
//!
//! The external NLP solver drives iterations by repeatedly calling
//! `update_opt_vars` followed by `compute_f`. Residual rows appear in
//! one fixed order, and `f_bounds` must mirror it exactly:
//!
//! 1. for k in 1..=N: every time-independent constraint, in list order
//! 2. every time-dependent constraint, in list order, at its own knotpoint
//! 3. the single objective scalar

use nalgebra::DVector;

use crate::constraint::{ConstraintList, DerivativeInfo, TimeDependentList};
use crate::dynamics::CombinedDynamics;
use crate::error::NlpError;
use crate::objective::ObjectiveFunction;
use crate::variables::VariableManager;

/// The numeric callback contract a problem exposes to the solver:
/// flat vectors of doubles, derivative arrays as coordinate triplets.
pub trait OptimizationProblem {
    fn name(&self) -> &str;

    /// Initial point in canonical flat order.
    fn initial_opt_vars(&self) -> DVector<f64>;

    /// Variable `(lower, upper)` bounds in canonical flat order.
    fn opt_var_bounds(&self) -> (DVector<f64>, DVector<f64>);

    /// Current iterate in canonical flat order.
    fn current_opt_vars(&self) -> DVector<f64>;

    /// Accept a new iterate from the solver.
    fn update_opt_vars(&mut self, flat: &[f64]) -> Result<(), NlpError>;

    /// Evaluate the full F vector (constraints then objective) at the
    /// current iterate.
    fn compute_f(&mut self) -> Result<DVector<f64>, NlpError>;

    /// `(F_low, F_upp)` in the identical row order as [`compute_f`].
    fn f_bounds(&self) -> (DVector<f64>, DVector<f64>);

    /// Row index of the objective inside F.
    fn objective_row(&self) -> usize;

    /// Sparse constraint Jacobian. No constraint in this crate computes
    /// derivatives, so the default tells the solver to difference.
    fn sparse_jacobian(&mut self) -> DerivativeInfo {
        DerivativeInfo::Unimplemented
    }
}

/// Row index of the objective: all time-independent rows replicated
/// over the horizon, plus all time-dependent rows.
pub fn objective_row(
    n_knotpoints: usize,
    ti: &ConstraintList,
    td: &TimeDependentList,
) -> usize {
    ti.rows_per_knotpoint() * n_knotpoints + td.total_rows()
}

/// Evaluate the full F vector in the fixed assembly order.
///
/// Every residual length is checked against its constraint's declared
/// size; a mismatch aborts the evaluation rather than emitting a
/// misaligned vector.
pub fn assemble_f(
    n_knotpoints: usize,
    ti: &ConstraintList,
    td: &TimeDependentList,
    objective: &dyn ObjectiveFunction,
    vars: &VariableManager,
    model: &mut dyn CombinedDynamics,
) -> Result<DVector<f64>, NlpError> {
    let total_rows = objective_row(n_knotpoints, ti, td) + 1;
    let mut f = Vec::with_capacity(total_rows);

    for knotpoint in 1..=n_knotpoints {
        for constraint in ti.iter() {
            let residual = constraint.evaluate(knotpoint, vars, model)?;
            if residual.len() != constraint.size() {
                return Err(NlpError::DimensionMismatch {
                    context: "constraint residual",
                    expected: constraint.size(),
                    got: residual.len(),
                });
            }
            f.extend(residual.iter());
        }
    }

    for bound in td.iter() {
        let residual = bound.inner.evaluate(bound.knotpoint, vars, model)?;
        if residual.len() != bound.inner.size() {
            return Err(NlpError::DimensionMismatch {
                context: "constraint residual",
                expected: bound.inner.size(),
                got: residual.len(),
            });
        }
        f.extend(residual.iter());
    }

    f.push(objective.evaluate(vars)?);
    Ok(DVector::from_vec(f))
}

/// Assemble `(F_low, F_upp)` in the identical order as [`assemble_f`].
pub fn assemble_f_bounds(
    n_knotpoints: usize,
    ti: &ConstraintList,
    td: &TimeDependentList,
    objective: &dyn ObjectiveFunction,
) -> (DVector<f64>, DVector<f64>) {
    let total_rows = objective_row(n_knotpoints, ti, td) + 1;
    let mut low = Vec::with_capacity(total_rows);
    let mut upp = Vec::with_capacity(total_rows);

    for _knotpoint in 1..=n_knotpoints {
        for constraint in ti.iter() {
            low.extend_from_slice(constraint.lower());
            upp.extend_from_slice(constraint.upper());
        }
    }
    for bound in td.iter() {
        low.extend_from_slice(bound.inner.lower());
        upp.extend_from_slice(bound.inner.upper());
    }
    low.push(objective.lower());
    upp.push(objective.upper());

    (DVector::from_vec(low), DVector::from_vec(upp))
}
