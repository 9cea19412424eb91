//! Supplementary hard constraints for the jump problem.
//!
//! Alongside the hybrid dynamics residual, the jump problem carries a
//! backward-Euler integration constraint tying states to their rates,
//! a ground-clearance constraint on the foot, and a touchdown
//! constraint for every (knotpoint, active contact) pair.

use std::rc::Rc;

use nalgebra::DVector;

use springbok_nlp::{
    CombinedDynamics, ConstraintFunction, ContactList, NlpError, VariableManager,
};

/// Backward-Euler state integration: `x_k − x_{k−1} − h_k ẋ_k = 0`.
pub struct TimeIntegrationConstraint {
    f_low: Vec<f64>,
    f_upp: Vec<f64>,
}

impl TimeIntegrationConstraint {
    /// One equality row per combined-state component.
    pub fn new(num_states: usize) -> Self {
        Self {
            f_low: vec![0.0; num_states],
            f_upp: vec![0.0; num_states],
        }
    }
}

impl ConstraintFunction for TimeIntegrationConstraint {
    fn name(&self) -> &str {
        "back_euler_time_integration"
    }

    fn lower(&self) -> &[f64] {
        &self.f_low
    }

    fn upper(&self) -> &[f64] {
        &self.f_upp
    }

    fn evaluate(
        &self,
        knotpoint: usize,
        vars: &VariableManager,
        _model: &mut dyn CombinedDynamics,
    ) -> Result<DVector<f64>, NlpError> {
        if knotpoint == 0 {
            return Err(NlpError::KnotpointOutOfRange {
                knotpoint: 0,
                total: vars.total_knotpoints(),
            });
        }
        let h = vars.knotpoint_dt(knotpoint - 1)?;
        let x = vars.x_states(knotpoint)?;
        let x_prev = vars.x_states(knotpoint - 1)?;
        let xdot = vars.xdot_states(knotpoint)?;
        Ok(x - x_prev - h * xdot)
    }
}

/// Ground clearance: the foot height `φ(q_k)` stays in `[0, +inf)` at
/// every knotpoint, contact active or not.
pub struct PositionKinematicConstraint {
    contacts: Rc<ContactList>,
    contact_index: usize,
    f_low: Vec<f64>,
    f_upp: Vec<f64>,
}

impl PositionKinematicConstraint {
    pub fn new(contacts: Rc<ContactList>, contact_index: usize) -> Self {
        Self {
            contacts,
            contact_index,
            f_low: vec![0.0],
            f_upp: vec![f64::INFINITY],
        }
    }
}

impl ConstraintFunction for PositionKinematicConstraint {
    fn name(&self) -> &str {
        "position_kinematic"
    }

    fn lower(&self) -> &[f64] {
        &self.f_low
    }

    fn upper(&self) -> &[f64] {
        &self.f_upp
    }

    fn evaluate(
        &self,
        knotpoint: usize,
        vars: &VariableManager,
        model: &mut dyn CombinedDynamics,
    ) -> Result<DVector<f64>, NlpError> {
        let x = vars.x_states(knotpoint)?;
        let q = model.state_to_configuration(&x);
        let contact = self.contacts.get(self.contact_index)?;
        Ok(DVector::from_vec(vec![contact.height(&q)]))
    }
}

/// Touchdown: an active contact's height `φ(q_k)` is exactly zero.
/// Bound to its knotpoint by the assembler via the time-dependent list.
pub struct ActiveContactKinematicConstraint {
    contacts: Rc<ContactList>,
    contact_index: usize,
    f_low: Vec<f64>,
    f_upp: Vec<f64>,
}

impl ActiveContactKinematicConstraint {
    pub fn new(contacts: Rc<ContactList>, contact_index: usize) -> Self {
        Self {
            contacts,
            contact_index,
            f_low: vec![0.0],
            f_upp: vec![0.0],
        }
    }
}

impl ConstraintFunction for ActiveContactKinematicConstraint {
    fn name(&self) -> &str {
        "active_contact_kinematic"
    }

    fn lower(&self) -> &[f64] {
        &self.f_low
    }

    fn upper(&self) -> &[f64] {
        &self.f_upp
    }

    fn evaluate(
        &self,
        knotpoint: usize,
        vars: &VariableManager,
        model: &mut dyn CombinedDynamics,
    ) -> Result<DVector<f64>, NlpError> {
        let x = vars.x_states(knotpoint)?;
        let q = model.state_to_configuration(&x);
        let contact = self.contacts.get(self.contact_index)?;
        Ok(DVector::from_vec(vec![contact.height(&q)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foot::FootContact;
    use crate::model::HopperModel;
    use approx::assert_relative_eq;
    use springbok_nlp::VarKind;

    fn vars_two_knots(x1: [f64; 3], x2: [f64; 3], xdot2: [f64; 3], h: f64) -> VariableManager {
        let mut vars = VariableManager::new();
        for k in 1..=2 {
            let x = if k == 1 { x1 } else { x2 };
            for (i, &value) in x.iter().enumerate() {
                vars.append_variable(format!("x{k}_{i}"), VarKind::State, k, value, -10.0, 10.0);
            }
            let rate = if k == 1 { [0.0; 3] } else { xdot2 };
            for (i, &value) in rate.iter().enumerate() {
                vars.append_variable(
                    format!("xdot{k}_{i}"),
                    VarKind::StateRate,
                    k,
                    value,
                    -10.0,
                    10.0,
                );
            }
            vars.append_variable(format!("h{k}"), VarKind::Timestep, k, h, 0.05, 1.0);
        }
        vars.set_total_knotpoints(2);
        vars.finalize_layout().unwrap();
        vars
    }

    fn foot_list() -> Rc<ContactList> {
        let mut list = ContactList::new();
        list.append(Box::new(FootContact::new()));
        Rc::new(list)
    }

    #[test]
    fn integration_residual_zero_for_consistent_states() {
        // x_2 = x_1 + h * ẋ_2 exactly.
        let h = 0.2;
        let x1 = [0.5, -0.5, 0.0];
        let xdot2 = [1.0, -0.5, 0.1];
        let x2 = [0.7, -0.6, 0.02];
        let vars = vars_two_knots(x1, x2, xdot2, h);
        let mut model = HopperModel::default();

        let c = TimeIntegrationConstraint::new(3);
        let r = c.evaluate(2, &vars, &mut model).unwrap();
        assert_relative_eq!(r.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn integration_residual_measures_drift() {
        let vars = vars_two_knots([0.5, -0.5, 0.0], [0.6, -0.5, 0.0], [0.0; 3], 0.1);
        let mut model = HopperModel::default();

        let c = TimeIntegrationConstraint::new(3);
        let r = c.evaluate(2, &vars, &mut model).unwrap();
        assert_relative_eq!(r[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(r[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn integration_bounds_are_equality() {
        let c = TimeIntegrationConstraint::new(3);
        assert_eq!(c.size(), 3);
        assert!(c.lower().iter().all(|&b| b == 0.0));
        assert!(c.upper().iter().all(|&b| b == 0.0));
    }

    #[test]
    fn position_kinematic_reports_foot_height() {
        // z_virt = 0.8, z_leg = -0.5 + 0.0 → foot at 0.3.
        let vars = vars_two_knots([0.8, -0.5, 0.0], [0.8, -0.5, 0.0], [0.0; 3], 0.1);
        let mut model = HopperModel::default();

        let c = PositionKinematicConstraint::new(foot_list(), 0);
        let r = c.evaluate(1, &vars, &mut model).unwrap();
        assert_relative_eq!(r[0], 0.3, epsilon = 1e-12);
        assert_eq!(c.lower(), &[0.0]);
        assert_eq!(c.upper(), &[f64::INFINITY]);
    }

    #[test]
    fn active_contact_pins_foot_to_ground() {
        let vars = vars_two_knots([0.5, -0.48, -0.02], [0.5, -0.5, 0.0], [0.0; 3], 0.1);
        let mut model = HopperModel::default();

        let c = ActiveContactKinematicConstraint::new(foot_list(), 0);
        // q = [0.5, -0.48 + -0.02] → height 0: touching.
        let r = c.evaluate(1, &vars, &mut model).unwrap();
        assert_relative_eq!(r[0], 0.0, epsilon = 1e-12);
        assert_eq!(c.lower(), &[0.0]);
        assert_eq!(c.upper(), &[0.0]);
    }

    #[test]
    fn bad_contact_index_is_reported() {
        let vars = vars_two_knots([0.5, -0.5, 0.0], [0.5, -0.5, 0.0], [0.0; 3], 0.1);
        let mut model = HopperModel::default();
        let c = PositionKinematicConstraint::new(foot_list(), 3);
        assert_eq!(
            c.evaluate(1, &vars, &mut model).unwrap_err(),
            NlpError::ContactOutOfRange { index: 3, len: 1 }
        );
    }
}
