//! Scalar objective appended as the final residual row.

use crate::error::NlpError;
use crate::variables::VariableManager;

/// A single scalar cost. By the solver convention used here, the
/// objective occupies one more row of the F vector, with free bounds,
/// at the index equal to the total constraint row count.
pub trait ObjectiveFunction {
    fn evaluate(&self, vars: &VariableManager) -> Result<f64, NlpError>;

    /// Lower bound of the objective row (free by default).
    fn lower(&self) -> f64 {
        f64::NEG_INFINITY
    }

    /// Upper bound of the objective row (free by default).
    fn upper(&self) -> f64 {
        f64::INFINITY
    }
}

/// Quadratic input-effort cost: `w * Σ_k |u_k|²` over all trajectory
/// knotpoints.
#[derive(Clone, Debug)]
pub struct InputEffortObjective {
    pub weight: f64,
}

impl InputEffortObjective {
    pub const fn new(weight: f64) -> Self {
        Self { weight }
    }
}

impl ObjectiveFunction for InputEffortObjective {
    fn evaluate(&self, vars: &VariableManager) -> Result<f64, NlpError> {
        let mut cost = 0.0;
        for k in 1..=vars.total_knotpoints() {
            let u = vars.u_states(k)?;
            cost += self.weight * u.norm_squared();
        }
        Ok(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::VarKind;
    use approx::assert_relative_eq;

    #[test]
    fn sums_squared_inputs_over_knotpoints() {
        let mut vars = VariableManager::new();
        for k in 1..=3 {
            vars.append_variable(format!("u{k}"), VarKind::Input, k, k as f64, -10.0, 10.0);
        }
        vars.set_total_knotpoints(3);
        vars.finalize_layout().unwrap();

        let obj = InputEffortObjective::new(0.5);
        let cost = obj.evaluate(&vars).unwrap();
        assert_relative_eq!(cost, 0.5 * (1.0 + 4.0 + 9.0));
    }

    #[test]
    fn objective_row_bounds_are_free() {
        let obj = InputEffortObjective::new(1.0);
        assert_eq!(obj.lower(), f64::NEG_INFINITY);
        assert_eq!(obj.upper(), f64::INFINITY);
    }
}
