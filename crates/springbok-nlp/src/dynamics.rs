//! Hybrid dynamics constraint: the central per-knotpoint residual.
//!
//! At every trajectory knotpoint k the constraint ties state, input,
//! contact Jacobian, and timestep together in an implicit
//! backward-Euler-style integrator equation, conceptually
//!
//! ```text
//! M ẍ + B ẋ + K x − Jc^T Fr − S_u u = 0,   ẍ ≈ (ẋ_k − ẋ_{k−1}) / h_k
//! ```
//!
//! The actual algebraic form lives behind [`CombinedDynamics`]; this
//! module owns the parts that make the dynamics *hybrid*: rebuilding
//! the stacked contact Jacobian in contact-list order and zeroing the
//! force segments of contacts the mode schedule marks inactive.

use std::rc::Rc;

use nalgebra::{DMatrix, DVector};

use crate::constraint::ConstraintFunction;
use crate::contact::ContactList;
use crate::error::NlpError;
use crate::schedule::ContactModeSchedule;
use crate::variables::VariableManager;

/// Combined rigid-body + actuator dynamics model.
///
/// The external collaborator seam: the NLP engine never computes mass,
/// damping, or stiffness terms itself. Exactly one model instance
/// exists per problem and a mutable handle to it is threaded through
/// every constraint evaluation, so mutation is visible in each
/// component's contract. Evaluation is strictly sequential within one
/// `compute_f` call; nothing here is safe to parallelize without
/// snapshotting the model per knotpoint.
pub trait CombinedDynamics {
    /// Number of virtual (unactuated floating-base) degrees of freedom.
    fn num_virtual_dof(&self) -> usize;

    /// Number of actuated joints.
    fn num_actuated_joints(&self) -> usize;

    /// Generalized-velocity dimension: the column count every contact
    /// Jacobian must have.
    fn num_dof(&self) -> usize;

    /// Refresh internal model state from the current iterate.
    fn update(&mut self, x: &DVector<f64>, xdot: &DVector<f64>);

    /// Map a combined-state vector to the generalized-position vector
    /// contacts are expressed in.
    fn state_to_configuration(&self, x: &DVector<f64>) -> DVector<f64>;

    /// Install the stacked contact Jacobian for the residual formula.
    fn set_contact_jacobian(&mut self, jc: DMatrix<f64>);

    /// Implicit-integration dynamics residual. Length must equal
    /// `num_virtual_dof() + 2 * num_actuated_joints()`.
    fn dynamics_residual(
        &self,
        x: &DVector<f64>,
        xdot: &DVector<f64>,
        xdot_prev: &DVector<f64>,
        u: &DVector<f64>,
        fr: &DVector<f64>,
        h: f64,
    ) -> Result<DVector<f64>, NlpError>;
}

/// Per-knotpoint hybrid dynamics equality constraint.
///
/// Stateless across knotpoints apart from the bound vectors fixed at
/// construction; only ever evaluated for k in 1..=N.
pub struct HybridDynamicsConstraint {
    contacts: Rc<ContactList>,
    schedule: Rc<ContactModeSchedule>,
    f_low: Vec<f64>,
    f_upp: Vec<f64>,
}

impl HybridDynamicsConstraint {
    /// Build the constraint with all-zero bounds sized from the model:
    /// `num_virtual_dof + 2 * num_actuated_joints` equality rows.
    pub fn new(
        model: &dyn CombinedDynamics,
        contacts: Rc<ContactList>,
        schedule: Rc<ContactModeSchedule>,
    ) -> Self {
        let rows = model.num_virtual_dof() + 2 * model.num_actuated_joints();
        Self {
            contacts,
            schedule,
            f_low: vec![0.0; rows],
            f_upp: vec![0.0; rows],
        }
    }

    /// Zero the Fr_k segments of every contact not active at
    /// `knotpoint`. Segment offsets are recomputed from list order on
    /// every call; active segments pass through untouched.
    fn mask_inactive_forces(
        &self,
        knotpoint: usize,
        fr: &mut DVector<f64>,
    ) -> Result<(), NlpError> {
        let active = self.schedule.active_contacts(knotpoint);
        for index in 0..self.contacts.len() {
            if active.binary_search(&index).is_ok() {
                continue;
            }
            let offset = self.contacts.force_offset(index)?;
            let dim = self.contacts.get(index)?.dim();
            for j in 0..dim {
                fr[offset + j] = 0.0;
            }
        }
        Ok(())
    }
}

impl ConstraintFunction for HybridDynamicsConstraint {
    fn name(&self) -> &str {
        "hybrid_dynamics"
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
        // Knotpoint 0 holds the initial condition, not a dynamics interval.
        if knotpoint == 0 {
            return Err(NlpError::KnotpointOutOfRange {
                knotpoint: 0,
                total: vars.total_knotpoints(),
            });
        }

        let h = vars.knotpoint_dt(knotpoint - 1)?;
        let x = vars.x_states(knotpoint)?;
        let xdot = vars.xdot_states(knotpoint)?;
        let xdot_prev = vars.xdot_states(knotpoint - 1)?;
        let u = vars.u_states(knotpoint)?;
        let mut fr = vars.reaction_forces(knotpoint)?;

        if fr.len() != self.contacts.total_force_dim() {
            return Err(NlpError::DimensionMismatch {
                context: "reaction-force vector",
                expected: self.contacts.total_force_dim(),
                got: fr.len(),
            });
        }

        model.update(&x, &xdot);
        let q = model.state_to_configuration(&x);
        let jc = self.contacts.stacked_jacobian(&q, model.num_dof())?;
        model.set_contact_jacobian(jc);

        self.mask_inactive_forces(knotpoint, &mut fr)?;

        let residual = model.dynamics_residual(&x, &xdot, &xdot_prev, &u, &fr, h)?;
        if residual.len() != self.size() {
            return Err(NlpError::DimensionMismatch {
                context: "dynamics residual",
                expected: self.size(),
                got: residual.len(),
            });
        }
        Ok(residual)
    }
}
