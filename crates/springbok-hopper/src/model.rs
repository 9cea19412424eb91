//! Combined rigid-body + series-elastic-actuator hopper dynamics.
//!
//! Combined state `x = [z_virt, z_act, δ]`: base height (the single
//! virtual degree of freedom), actuator position, and spring
//! deflection. The generalized configuration contacts see is
//! `q = [z_virt, z_leg]` with `z_leg = z_act + δ`; the leg joint sits
//! behind the series spring.
//!
//! Dynamics residual (backward-Euler discretized):
//!
//! ```text
//! M (ẋ_k − ẋ_{k−1}) / h + B ẋ_k + K x_k + g − T^T Jc^T Fr − [0, Km·u, 0]^T
//! ```
//!
//! with `M = diag(m_body, I_act, m_leg)`, damping on the actuator and
//! spring rates, spring stiffness acting on δ (reacting on the actuator
//! row), and `T = ∂q/∂x` mapping configuration-space contact forces
//! into combined coordinates.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use springbok_nlp::{CombinedDynamics, NlpError};

/// Number of virtual (floating-base) degrees of freedom.
pub const NUM_VIRTUAL_DOF: usize = 1;
/// Number of actuated joints.
pub const NUM_ACTUATED_JOINTS: usize = 1;
/// Combined state dimension: virtual dof + actuator position + deflection.
pub const NUM_STATES: usize = NUM_VIRTUAL_DOF + 2 * NUM_ACTUATED_JOINTS;
/// Generalized-velocity dimension of the configuration `q = [z_virt, z_leg]`.
pub const NUM_DOF: usize = 2;

/// Physical parameters of the hopper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HopperParams {
    /// Base (body) mass in kg.
    pub body_mass: f64,
    /// Lower-leg mass in kg.
    pub leg_mass: f64,
    /// Reflected actuator inertia at the joint in kg.
    pub actuator_inertia: f64,
    /// Viscous damping on the actuator coordinate in N·s/m.
    pub actuator_damping: f64,
    /// Viscous damping on the spring deflection rate in N·s/m.
    pub spring_damping: f64,
    /// Series spring stiffness in N/m.
    pub spring_stiffness: f64,
    /// Motor force constant Km in N/A: joint force per unit current.
    pub motor_constant: f64,
    /// Gravitational acceleration magnitude in m/s².
    pub gravity: f64,
    /// Actuator travel lower bound in m.
    pub z_act_min: f64,
    /// Actuator travel upper bound in m.
    pub z_act_max: f64,
}

impl Default for HopperParams {
    fn default() -> Self {
        Self {
            body_mass: 10.0,
            leg_mass: 1.0,
            actuator_inertia: 0.5,
            actuator_damping: 5.0,
            spring_damping: 2.0,
            spring_stiffness: 2000.0,
            motor_constant: 5.0,
            gravity: 9.81,
            z_act_min: -0.7,
            z_act_max: -0.3,
        }
    }
}

/// Concrete [`CombinedDynamics`] model for the single-leg hopper.
///
/// Holds the last iterate snapshot pushed by `update` and the stacked
/// contact Jacobian installed by the hybrid dynamics constraint.
#[derive(Clone, Debug)]
pub struct HopperModel {
    params: HopperParams,
    x: DVector<f64>,
    xdot: DVector<f64>,
    contact_jacobian: Option<DMatrix<f64>>,
}

impl HopperModel {
    pub fn new(params: HopperParams) -> Self {
        Self {
            params,
            x: DVector::zeros(NUM_STATES),
            xdot: DVector::zeros(NUM_STATES),
            contact_jacobian: None,
        }
    }

    pub const fn params(&self) -> &HopperParams {
        &self.params
    }

    fn check_state_dim(v: &DVector<f64>, context: &'static str) -> Result<(), NlpError> {
        if v.len() != NUM_STATES {
            return Err(NlpError::DimensionMismatch {
                context,
                expected: NUM_STATES,
                got: v.len(),
            });
        }
        Ok(())
    }
}

impl Default for HopperModel {
    fn default() -> Self {
        Self::new(HopperParams::default())
    }
}

impl CombinedDynamics for HopperModel {
    fn num_virtual_dof(&self) -> usize {
        NUM_VIRTUAL_DOF
    }

    fn num_actuated_joints(&self) -> usize {
        NUM_ACTUATED_JOINTS
    }

    fn num_dof(&self) -> usize {
        NUM_DOF
    }

    fn update(&mut self, x: &DVector<f64>, xdot: &DVector<f64>) {
        self.x = x.clone();
        self.xdot = xdot.clone();
    }

    fn state_to_configuration(&self, x: &DVector<f64>) -> DVector<f64> {
        // q = [z_virt, z_leg], z_leg = z_act + δ.
        DVector::from_vec(vec![x[0], x[1] + x[2]])
    }

    fn set_contact_jacobian(&mut self, jc: DMatrix<f64>) {
        self.contact_jacobian = Some(jc);
    }

    fn dynamics_residual(
        &self,
        x: &DVector<f64>,
        xdot: &DVector<f64>,
        xdot_prev: &DVector<f64>,
        u: &DVector<f64>,
        fr: &DVector<f64>,
        h: f64,
    ) -> Result<DVector<f64>, NlpError> {
        Self::check_state_dim(x, "model state")?;
        Self::check_state_dim(xdot, "model state rate")?;
        Self::check_state_dim(xdot_prev, "model previous state rate")?;
        if u.len() != NUM_ACTUATED_JOINTS {
            return Err(NlpError::DimensionMismatch {
                context: "model input",
                expected: NUM_ACTUATED_JOINTS,
                got: u.len(),
            });
        }

        let jc = self
            .contact_jacobian
            .as_ref()
            .ok_or(NlpError::Unconfigured("contact jacobian"))?;
        if jc.ncols() != NUM_DOF {
            return Err(NlpError::DimensionMismatch {
                context: "contact jacobian columns",
                expected: NUM_DOF,
                got: jc.ncols(),
            });
        }
        if fr.len() != jc.nrows() {
            return Err(NlpError::DimensionMismatch {
                context: "reaction-force vector",
                expected: jc.nrows(),
                got: fr.len(),
            });
        }

        let p = &self.params;

        // Configuration-space contact force, then into combined
        // coordinates through T^T with T = ∂q/∂x = [[1,0,0],[0,1,1]].
        let tau_q = jc.transpose() * fr; // [f_virt, f_leg]
        let contact = DVector::from_vec(vec![tau_q[0], tau_q[1], tau_q[1]]);

        let accel = (xdot - xdot_prev) / h;
        let spring = p.spring_stiffness * x[2];

        let mut residual = DVector::zeros(NUM_STATES);
        // Virtual (base) row: gravity against the contact force.
        residual[0] = p.body_mass * accel[0] + p.body_mass * p.gravity - contact[0];
        // Actuator row: motor drives against the spring reaction and
        // the contact force transmitted through the leg.
        residual[1] = p.actuator_inertia * accel[1] + p.actuator_damping * xdot[1] - spring
            - contact[1]
            - p.motor_constant * u[0];
        // Deflection row: spring carries the leg mass.
        residual[2] = p.leg_mass * accel[2]
            + p.spring_damping * xdot[2]
            + spring
            + p.leg_mass * p.gravity
            - contact[2];

        Ok(residual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn model_with_point_foot() -> HopperModel {
        let mut model = HopperModel::default();
        // ∂(z_virt + z_leg)/∂q̇ for the point foot.
        model.set_contact_jacobian(DMatrix::from_row_slice(1, 2, &[1.0, 1.0]));
        model
    }

    #[test]
    fn configuration_map_sums_actuator_and_deflection() {
        let model = HopperModel::default();
        let q = model.state_to_configuration(&DVector::from_vec(vec![0.5, -0.52, 0.02]));
        assert_relative_eq!(q[0], 0.5);
        assert_relative_eq!(q[1], -0.5);
    }

    #[test]
    fn residual_matches_hand_computation() {
        let model = model_with_point_foot();
        let x = DVector::from_vec(vec![0.5, -0.5, 0.01]);
        let xdot = DVector::from_vec(vec![0.1, -0.2, 0.02]);
        let xdot_prev = DVector::zeros(3);
        let u = DVector::from_vec(vec![2.0]);
        let fr = DVector::from_vec(vec![30.0]);

        let r = model
            .dynamics_residual(&x, &xdot, &xdot_prev, &u, &fr, 0.1)
            .unwrap();
        // Row 0: 10*(0.1/0.1) + 10*9.81 - 30
        assert_relative_eq!(r[0], 78.1, epsilon = 1e-12);
        // Row 1: 0.5*(-0.2/0.1) + 5*(-0.2) - 2000*0.01 - 30 - 5*2
        assert_relative_eq!(r[1], -62.0, epsilon = 1e-12);
        // Row 2: 1*(0.02/0.1) + 2*0.02 + 2000*0.01 + 9.81 - 30
        assert_relative_eq!(r[2], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn static_support_equilibrium_has_zero_residual() {
        let model = model_with_point_foot();
        let p = model.params().clone();

        // Stationary base: contact force carries the body weight, the
        // spring deflects under it, and the motor holds the actuator.
        let fr_z = p.body_mass * p.gravity;
        let delta = (fr_z - p.leg_mass * p.gravity) / p.spring_stiffness;
        let u_hold = (-p.spring_stiffness * delta - fr_z) / p.motor_constant;

        let x = DVector::from_vec(vec![0.5, -0.5 - delta, delta]);
        let zeros = DVector::zeros(3);
        let r = model
            .dynamics_residual(
                &x,
                &zeros,
                &zeros,
                &DVector::from_vec(vec![u_hold]),
                &DVector::from_vec(vec![fr_z]),
                0.1,
            )
            .unwrap();
        assert_relative_eq!(r.norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn input_enters_actuator_row_only() {
        let model = model_with_point_foot();
        let x = DVector::from_vec(vec![0.5, -0.5, 0.0]);
        let zeros = DVector::zeros(3);
        let fr = DVector::from_vec(vec![0.0]);

        let r0 = model
            .dynamics_residual(&x, &zeros, &zeros, &DVector::from_vec(vec![0.0]), &fr, 0.1)
            .unwrap();
        let r1 = model
            .dynamics_residual(&x, &zeros, &zeros, &DVector::from_vec(vec![3.0]), &fr, 0.1)
            .unwrap();
        assert_relative_eq!(r1[0], r0[0]);
        assert_relative_eq!(r1[1], r0[1] - model.params().motor_constant * 3.0);
        assert_relative_eq!(r1[2], r0[2]);
    }

    #[test]
    fn residual_without_jacobian_is_unconfigured() {
        let model = HopperModel::default();
        let zeros = DVector::zeros(3);
        let err = model
            .dynamics_residual(
                &zeros,
                &zeros,
                &zeros,
                &DVector::zeros(1),
                &DVector::zeros(1),
                0.1,
            )
            .unwrap_err();
        assert_eq!(err, NlpError::Unconfigured("contact jacobian"));
    }

    #[test]
    fn residual_rejects_wrong_state_dimension() {
        let model = model_with_point_foot();
        let bad = DVector::zeros(2);
        let good = DVector::zeros(3);
        assert!(matches!(
            model.dynamics_residual(
                &bad,
                &good,
                &good,
                &DVector::zeros(1),
                &DVector::zeros(1),
                0.1
            ),
            Err(NlpError::DimensionMismatch { .. })
        ));
    }
}
