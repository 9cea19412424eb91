//! Decision variables and the flat-to-structured variable mapping.
//!
//! The external solver only ever sees one flat `f64` vector. Everything
//! else in the problem (constraints, bounds, the objective) addresses
//! variables semantically, by `(knotpoint, kind, component)`. The
//! [`VariableManager`] owns both views and keeps them consistent: the
//! flat order is the append order, fixed once setup completes, and an
//! explicit index map built at append time replaces any offset
//! arithmetic at query time.

use std::collections::HashMap;

use nalgebra::DVector;

use crate::error::NlpError;

/// Semantic kind of a decision variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarKind {
    /// Generalized position / combined state component.
    State,
    /// Time derivative of a state component.
    StateRate,
    /// Actuator input (e.g. motor current).
    Input,
    /// Contact reaction-force component.
    ReactionForce,
    /// Knotpoint timestep.
    Timestep,
}

impl VarKind {
    /// Short label used in error messages and variable names.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::StateRate => "state-rate",
            Self::Input => "input",
            Self::ReactionForce => "reaction-force",
            Self::Timestep => "timestep",
        }
    }
}

/// One scalar decision variable.
///
/// Created once during problem setup; its bounds may be tightened
/// afterwards (e.g. pinning a knotpoint's state) and its `value` is
/// overwritten by every solver iterate update.
#[derive(Clone, Debug)]
pub struct DecisionVariable {
    /// Diagnostic name, unique per (kind, knotpoint, component).
    pub name: String,
    /// Semantic kind.
    pub kind: VarKind,
    /// Knotpoint index: 0 is the initial condition, 1..=N the trajectory.
    pub knotpoint: usize,
    /// Current iterate value.
    pub value: f64,
    /// Initial-guess value handed to the solver.
    pub initial: f64,
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

/// Owns all decision variables in solver (append) order plus an index
/// from `(knotpoint, kind)` to flat positions.
///
/// Invariant: the flat order exposed to the solver exactly matches the
/// order used when constructing bound and initial-value vectors. Any
/// mismatch silently misassigns physical meaning to solver iterate
/// components, so both views are derived from the single `vars` vector.
#[derive(Debug, Default)]
pub struct VariableManager {
    vars: Vec<DecisionVariable>,
    index: HashMap<(usize, VarKind), Vec<usize>>,
    /// Timestep variables in append order; entry `i` is the timestep of
    /// the interval ending at knotpoint `i + 1`.
    timestep_index: Vec<usize>,
    total_knotpoints: usize,
    /// Number of knotpoint-0 (initial condition) variables.
    initial_condition_vars: usize,
    /// Per-knotpoint variable count, fixed by [`finalize_layout`].
    vars_per_knotpoint: Option<usize>,
}

impl VariableManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one decision variable. Append order is significant: it
    /// defines the flat layout the solver sees, and is fixed once
    /// problem setup completes.
    pub fn append_variable(
        &mut self,
        name: impl Into<String>,
        kind: VarKind,
        knotpoint: usize,
        initial: f64,
        lower: f64,
        upper: f64,
    ) {
        let flat = self.vars.len();
        self.vars.push(DecisionVariable {
            name: name.into(),
            kind,
            knotpoint,
            value: initial,
            initial,
            lower,
            upper,
        });
        self.index.entry((knotpoint, kind)).or_default().push(flat);
        if kind == VarKind::Timestep {
            self.timestep_index.push(flat);
        }
        if knotpoint == 0 {
            self.initial_condition_vars += 1;
        }
    }

    /// Declare the horizon length N (trajectory knotpoints 1..=N).
    pub fn set_total_knotpoints(&mut self, n: usize) {
        self.total_knotpoints = n;
    }

    /// Horizon length N.
    pub const fn total_knotpoints(&self) -> usize {
        self.total_knotpoints
    }

    /// Fix the per-knotpoint variable count. Must be called after all
    /// variables have been appended; the semantic accessors refuse to
    /// run before it.
    ///
    /// Errors with [`NlpError::DimensionMismatch`] if the trajectory
    /// variables do not divide evenly into `total_knotpoints` blocks of
    /// the knotpoint-1 size, which means some knotpoint was given a
    /// different variable set than the others.
    pub fn finalize_layout(&mut self) -> Result<(), NlpError> {
        let per_knot: usize = [
            VarKind::State,
            VarKind::StateRate,
            VarKind::Input,
            VarKind::ReactionForce,
            VarKind::Timestep,
        ]
        .iter()
        .map(|&kind| self.index.get(&(1, kind)).map_or(0, Vec::len))
        .sum();

        let trajectory_vars = self.vars.len() - self.initial_condition_vars;
        if per_knot * self.total_knotpoints != trajectory_vars {
            return Err(NlpError::DimensionMismatch {
                context: "finalize_layout",
                expected: per_knot * self.total_knotpoints,
                got: trajectory_vars,
            });
        }
        self.vars_per_knotpoint = Some(per_knot);
        tracing::debug!(
            total = self.vars.len(),
            per_knotpoint = per_knot,
            knotpoints = self.total_knotpoints,
            "variable layout finalized"
        );
        Ok(())
    }

    /// Per-knotpoint variable count, if the layout has been finalized.
    pub const fn vars_per_knotpoint(&self) -> Option<usize> {
        self.vars_per_knotpoint
    }

    /// Number of knotpoint-0 (initial condition) variables.
    pub const fn initial_condition_vars(&self) -> usize {
        self.initial_condition_vars
    }

    /// Total number of decision variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Flat initial-guess vector in canonical (append) order.
    pub fn initial_values(&self) -> DVector<f64> {
        DVector::from_iterator(self.vars.len(), self.vars.iter().map(|v| v.initial))
    }

    /// Flat `(lower, upper)` bound vectors in canonical order.
    pub fn bounds(&self) -> (DVector<f64>, DVector<f64>) {
        let low = DVector::from_iterator(self.vars.len(), self.vars.iter().map(|v| v.lower));
        let upp = DVector::from_iterator(self.vars.len(), self.vars.iter().map(|v| v.upper));
        (low, upp)
    }

    /// Flat current-iterate vector in canonical order.
    pub fn current_values(&self) -> DVector<f64> {
        DVector::from_iterator(self.vars.len(), self.vars.iter().map(|v| v.value))
    }

    /// Overwrite every variable's current value from a solver iterate.
    ///
    /// Errors with [`NlpError::DimensionMismatch`] if the flat vector
    /// length differs from the variable count; nothing is written in
    /// that case.
    pub fn update_values(&mut self, flat: &[f64]) -> Result<(), NlpError> {
        if flat.len() != self.vars.len() {
            return Err(NlpError::DimensionMismatch {
                context: "update_values",
                expected: self.vars.len(),
                got: flat.len(),
            });
        }
        for (var, &value) in self.vars.iter_mut().zip(flat) {
            var.value = value;
        }
        Ok(())
    }

    fn check_knotpoint(&self, knotpoint: usize) -> Result<(), NlpError> {
        if knotpoint > self.total_knotpoints {
            return Err(NlpError::KnotpointOutOfRange {
                knotpoint,
                total: self.total_knotpoints,
            });
        }
        Ok(())
    }

    /// Gather the current values of all `kind` variables at `knotpoint`,
    /// in append order.
    pub fn kind_states(&self, knotpoint: usize, kind: VarKind) -> Result<DVector<f64>, NlpError> {
        self.check_knotpoint(knotpoint)?;
        if self.vars_per_knotpoint.is_none() {
            return Err(NlpError::LayoutNotFinalized);
        }
        let indices = self
            .index
            .get(&(knotpoint, kind))
            .ok_or(NlpError::MissingVariables {
                kind: kind.as_str(),
                knotpoint,
            })?;
        Ok(DVector::from_iterator(
            indices.len(),
            indices.iter().map(|&i| self.vars[i].value),
        ))
    }

    /// Combined state sub-vector x_k.
    pub fn x_states(&self, knotpoint: usize) -> Result<DVector<f64>, NlpError> {
        self.kind_states(knotpoint, VarKind::State)
    }

    /// State-rate sub-vector ẋ_k.
    pub fn xdot_states(&self, knotpoint: usize) -> Result<DVector<f64>, NlpError> {
        self.kind_states(knotpoint, VarKind::StateRate)
    }

    /// Actuator-input sub-vector u_k. Knotpoint 0 has no inputs.
    pub fn u_states(&self, knotpoint: usize) -> Result<DVector<f64>, NlpError> {
        self.kind_states(knotpoint, VarKind::Input)
    }

    /// Full reaction-force sub-vector Fr_k, segments in contact-list order.
    pub fn reaction_forces(&self, knotpoint: usize) -> Result<DVector<f64>, NlpError> {
        self.kind_states(knotpoint, VarKind::ReactionForce)
    }

    /// Timestep of trajectory interval `interval`, i.e. the duration
    /// between knotpoints `interval` and `interval + 1`.
    ///
    /// An out-of-range interval is reported in knotpoint terms, naming
    /// the knotpoint the missing interval would end at.
    pub fn knotpoint_dt(&self, interval: usize) -> Result<f64, NlpError> {
        let &flat = self
            .timestep_index
            .get(interval)
            .ok_or(NlpError::KnotpointOutOfRange {
                knotpoint: interval + 1,
                total: self.timestep_index.len(),
            })?;
        Ok(self.vars[flat].value)
    }

    /// Tighten the bounds of one variable, leaving every other variable
    /// (including the same component at other knotpoints) untouched.
    pub fn set_bounds(
        &mut self,
        knotpoint: usize,
        kind: VarKind,
        component: usize,
        lower: f64,
        upper: f64,
    ) -> Result<(), NlpError> {
        self.check_knotpoint(knotpoint)?;
        let indices = self
            .index
            .get(&(knotpoint, kind))
            .ok_or(NlpError::MissingVariables {
                kind: kind.as_str(),
                knotpoint,
            })?;
        let &flat = indices
            .get(component)
            .ok_or(NlpError::ComponentOutOfRange {
                kind: kind.as_str(),
                knotpoint,
                component,
            })?;
        self.vars[flat].lower = lower;
        self.vars[flat].upper = upper;
        Ok(())
    }

    /// Read access to one variable by flat index.
    pub fn var(&self, flat: usize) -> Option<&DecisionVariable> {
        self.vars.get(flat)
    }

    /// All variables in flat order.
    pub fn vars(&self) -> &[DecisionVariable] {
        &self.vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Two knotpoints, two states + one rate + one input + one force +
    /// one timestep each, plus a pinned initial condition.
    fn small_manager() -> VariableManager {
        let mut m = VariableManager::new();
        for i in 0..2 {
            m.append_variable(format!("x0_{i}"), VarKind::State, 0, 0.5, 0.5, 0.5);
        }
        m.append_variable("xdot0_0", VarKind::StateRate, 0, 0.0, 0.0, 0.0);
        for k in 1..=2 {
            for i in 0..2 {
                m.append_variable(format!("x{k}_{i}"), VarKind::State, k, 0.1, -1.0, 1.0);
            }
            m.append_variable(format!("xdot{k}_0"), VarKind::StateRate, k, 0.0, -10.0, 10.0);
            m.append_variable(format!("u{k}_0"), VarKind::Input, k, 0.0, -100.0, 100.0);
            m.append_variable(format!("fr{k}_0"), VarKind::ReactionForce, k, 0.0, 0.0, 1e4);
            m.append_variable(format!("h{k}"), VarKind::Timestep, k, 0.05, 0.05, 1.0);
        }
        m.set_total_knotpoints(2);
        m.finalize_layout().unwrap();
        m
    }

    #[test]
    fn flat_order_is_append_order() {
        let m = small_manager();
        assert_eq!(m.len(), 3 + 2 * 6);
        assert_eq!(m.initial_condition_vars(), 3);
        assert_eq!(m.vars_per_knotpoint(), Some(6));
        assert_eq!(m.var(0).unwrap().name, "x0_0");
        assert_eq!(m.var(3).unwrap().name, "x1_0");
        assert_eq!(m.var(8).unwrap().name, "h1");
    }

    #[test]
    fn bounds_and_initial_share_order() {
        let m = small_manager();
        let init = m.initial_values();
        let (low, upp) = m.bounds();
        assert_eq!(init.len(), m.len());
        assert_eq!(low.len(), m.len());
        // Knotpoint 0 states are pinned to 0.5.
        assert_relative_eq!(init[0], 0.5);
        assert_relative_eq!(low[0], 0.5);
        assert_relative_eq!(upp[0], 0.5);
        // Trajectory state bounds.
        assert_relative_eq!(low[3], -1.0);
        assert_relative_eq!(upp[3], 1.0);
    }

    #[test]
    fn update_round_trips() {
        let mut m = small_manager();
        let before = m.current_values();
        m.update_values(before.as_slice()).unwrap();
        let after = m.current_values();
        assert_eq!(before, after);
    }

    #[test]
    fn update_rejects_length_mismatch() {
        let mut m = small_manager();
        let err = m.update_values(&[0.0; 3]).unwrap_err();
        assert_eq!(
            err,
            NlpError::DimensionMismatch {
                context: "update_values",
                expected: 15,
                got: 3
            }
        );
        // Nothing was written.
        assert_relative_eq!(m.current_values()[0], 0.5);
    }

    #[test]
    fn semantic_accessors_reconstruct_subvectors() {
        let mut m = small_manager();
        let mut flat: Vec<f64> = m.current_values().as_slice().to_vec();
        // Knotpoint 2 block starts after 3 initial + 6 knotpoint-1 vars.
        flat[9] = 1.5;
        flat[10] = -2.5;
        flat[12] = 42.0; // u2
        flat[13] = 7.0; // fr2
        flat[14] = 0.25; // h2
        m.update_values(&flat).unwrap();

        let x2 = m.x_states(2).unwrap();
        assert_eq!(x2.len(), 2);
        assert_relative_eq!(x2[0], 1.5);
        assert_relative_eq!(x2[1], -2.5);
        assert_relative_eq!(m.u_states(2).unwrap()[0], 42.0);
        assert_relative_eq!(m.reaction_forces(2).unwrap()[0], 7.0);
        assert_relative_eq!(m.knotpoint_dt(1).unwrap(), 0.25);
    }

    #[test]
    fn knotpoint_zero_has_states_but_no_inputs() {
        let m = small_manager();
        let x0 = m.x_states(0).unwrap();
        assert_eq!(x0.len(), 2);
        assert_eq!(
            m.u_states(0).unwrap_err(),
            NlpError::MissingVariables {
                kind: "input",
                knotpoint: 0
            }
        );
    }

    #[test]
    fn knotpoint_beyond_horizon_is_rejected() {
        let m = small_manager();
        assert_eq!(
            m.x_states(3).unwrap_err(),
            NlpError::KnotpointOutOfRange {
                knotpoint: 3,
                total: 2
            }
        );
        // Interval 2 would end at knotpoint 3, past the 2-knot horizon;
        // the error speaks in knotpoint terms, not interval indices.
        assert_eq!(
            m.knotpoint_dt(2).unwrap_err(),
            NlpError::KnotpointOutOfRange {
                knotpoint: 3,
                total: 2
            }
        );
    }

    #[test]
    fn accessors_require_finalized_layout() {
        let mut m = VariableManager::new();
        m.append_variable("x1_0", VarKind::State, 1, 0.0, -1.0, 1.0);
        m.set_total_knotpoints(1);
        assert_eq!(m.x_states(1).unwrap_err(), NlpError::LayoutNotFinalized);
    }

    #[test]
    fn finalize_rejects_ragged_layout() {
        let mut m = VariableManager::new();
        m.append_variable("x1_0", VarKind::State, 1, 0.0, -1.0, 1.0);
        m.append_variable("x2_0", VarKind::State, 2, 0.0, -1.0, 1.0);
        m.append_variable("x2_1", VarKind::State, 2, 0.0, -1.0, 1.0);
        m.set_total_knotpoints(2);
        assert!(matches!(
            m.finalize_layout(),
            Err(NlpError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn set_bounds_touches_exactly_one_variable() {
        let mut m = small_manager();
        m.set_bounds(2, VarKind::State, 0, 0.7 - 1e-4, 0.7 + 1e-4)
            .unwrap();
        let (low, upp) = m.bounds();
        // Same component at knotpoint 1 untouched.
        assert_relative_eq!(low[3], -1.0);
        assert_relative_eq!(upp[3], 1.0);
        // Knotpoint 2 component 0 pinned.
        assert_relative_eq!(low[9], 0.7 - 1e-4);
        assert_relative_eq!(upp[9], 0.7 + 1e-4);
        // Neighbor component at knotpoint 2 untouched.
        assert_relative_eq!(low[10], -1.0);
    }

    #[test]
    fn set_bounds_rejects_bad_component() {
        let mut m = small_manager();
        assert_eq!(
            m.set_bounds(1, VarKind::Input, 5, 0.0, 0.0).unwrap_err(),
            NlpError::ComponentOutOfRange {
                kind: "input",
                knotpoint: 1,
                component: 5
            }
        );
    }
}
