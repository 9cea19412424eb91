//! The hopper jump optimization problem.
//!
//! Wires the variable layout, contact schedule, constraint lists, and
//! objective into the solver-facing callback surface. The jump is a
//! three-phase maneuver (support, flight, support) over equal thirds
//! of the horizon, with the apex height enforced at the mid-trajectory
//! knotpoint and the landing pinned at the final one.

use std::rc::Rc;

use nalgebra::DVector;
use tracing::{debug, info};

use springbok_nlp::{
    assemble_f, assemble_f_bounds, objective_row, ConstraintList, ContactList,
    ContactModeSchedule, HybridDynamicsConstraint, InputEffortObjective, NlpError,
    OptimizationProblem, TimeDependentList, VarKind, VariableManager,
};

use crate::config::JumpConfig;
use crate::constraints::{
    ActiveContactKinematicConstraint, PositionKinematicConstraint, TimeIntegrationConstraint,
};
use crate::error::HopperError;
use crate::foot::FootContact;
use crate::model::{HopperModel, NUM_STATES};

/// Hopper jump trajectory-optimization problem.
///
/// Decision-variable order:
///
/// ```text
/// opt_init  = [x_0, ẋ_0]
/// opt_k     = [x_k, ẋ_k, u_k, Fr_k, h_k]
/// opt_vars  = [opt_init, opt_1, opt_2, ..., opt_N]
/// ```
pub struct JumpProblem {
    config: JumpConfig,
    model: HopperModel,
    vars: VariableManager,
    contacts: Rc<ContactList>,
    schedule: Rc<ContactModeSchedule>,
    ti_constraints: ConstraintList,
    td_constraints: TimeDependentList,
    objective: InputEffortObjective,
}

impl JumpProblem {
    /// Build the full problem from a validated configuration.
    pub fn new(config: JumpConfig) -> Result<Self, HopperError> {
        config.validate()?;

        let model = HopperModel::new(config.model.clone());
        let contacts = Self::build_contact_list();
        let schedule = Self::build_schedule(&config);
        let vars = Self::build_variables(&config, &contacts)?;

        let mut problem = Self {
            objective: InputEffortObjective::new(config.input_cost_weight),
            ti_constraints: ConstraintList::new(),
            td_constraints: TimeDependentList::new(),
            config,
            model,
            vars,
            contacts,
            schedule,
        };
        problem.apply_specific_bounds()?;
        problem.build_ti_constraints();
        problem.build_td_constraints();

        info!(
            variables = problem.vars.len(),
            residual_rows = problem.objective_row() + 1,
            objective_row = problem.objective_row(),
            "assembled hopper jump problem"
        );
        Ok(problem)
    }

    fn build_contact_list() -> Rc<ContactList> {
        let mut contacts = ContactList::new();
        contacts.append(Box::new(FootContact::new()));
        Rc::new(contacts)
    }

    /// Support → flight → support over equal thirds; any remainder
    /// knotpoints after the third phase stay in support.
    fn build_schedule(config: &JumpConfig) -> Rc<ContactModeSchedule> {
        let foot = 0;
        let phase = config.phase_length();
        let n = config.n_knotpoints;

        let mut schedule = ContactModeSchedule::new();
        schedule.add_mode(1, phase, vec![foot]);
        schedule.add_mode(phase + 1, 2 * phase, vec![]);
        schedule.add_mode(2 * phase + 1, n, vec![foot]);
        debug!(phase_length = phase, n_knotpoints = n, "contact schedule built");
        Rc::new(schedule)
    }

    fn build_variables(
        config: &JumpConfig,
        contacts: &ContactList,
    ) -> Result<VariableManager, NlpError> {
        let mut vars = VariableManager::new();
        let eps = config.pin_eps;

        // Knotpoint 0: the initial configuration, pinned. The leg
        // mirrors the base so the foot starts on the ground.
        let x0 = [config.initial_base_height, -config.initial_base_height, 0.0];
        let x0_names = ["x_virt_0", "x_act_0", "x_delta_0"];
        for (name, value) in x0_names.iter().zip(x0) {
            vars.append_variable(*name, VarKind::State, 0, value, value - eps, value + eps);
        }
        for name in ["xdot_virt_0", "xdot_act_0", "xdot_delta_0"] {
            vars.append_variable(name, VarKind::StateRate, 0, 0.0, -eps, eps);
        }

        // Trajectory knotpoints 1..=N.
        for k in 1..=config.n_knotpoints {
            vars.append_variable(
                format!("x_virt_{k}"),
                VarKind::State,
                k,
                config.initial_base_height,
                0.0,
                config.base_height_max,
            );
            vars.append_variable(
                format!("x_act_{k}"),
                VarKind::State,
                k,
                -config.initial_base_height,
                config.model.z_act_min,
                config.model.z_act_max,
            );
            vars.append_variable(
                format!("x_delta_{k}"),
                VarKind::State,
                k,
                0.0,
                -config.deflection_bound,
                config.deflection_bound,
            );

            for name in ["xdot_virt", "xdot_act", "xdot_delta"] {
                vars.append_variable(
                    format!("{name}_{k}"),
                    VarKind::StateRate,
                    k,
                    0.0,
                    -config.rate_bound,
                    config.rate_bound,
                );
            }

            vars.append_variable(
                format!("u_{k}"),
                VarKind::Input,
                k,
                0.0,
                -config.max_input,
                config.max_input,
            );

            for contact_index in 0..contacts.len() {
                vars.append_variable(
                    format!("fr_z{contact_index}_{k}"),
                    VarKind::ReactionForce,
                    k,
                    0.0,
                    0.0,
                    config.max_normal_force,
                );
            }

            vars.append_variable(
                format!("h_{k}"),
                VarKind::Timestep,
                k,
                config.h_min,
                config.h_min,
                config.h_max,
            );
        }

        vars.set_total_knotpoints(config.n_knotpoints);
        vars.finalize_layout()?;
        Ok(vars)
    }

    /// Problem-specific bound overrides on top of the per-knotpoint
    /// defaults: jump apex at the halfway knotpoint, landing pinned at
    /// the final one.
    fn apply_specific_bounds(&mut self) -> Result<(), NlpError> {
        let n = self.config.n_knotpoints;
        let eps = self.config.pin_eps;

        self.vars.set_bounds(
            n / 2,
            VarKind::State,
            0,
            self.config.apex_height,
            f64::INFINITY,
        )?;

        let final_height = self.config.final_height;
        self.vars.set_bounds(
            n,
            VarKind::State,
            0,
            final_height - eps,
            final_height + eps,
        )?;
        self.vars.set_bounds(n, VarKind::StateRate, 0, -eps, eps)?;
        Ok(())
    }

    fn build_ti_constraints(&mut self) {
        self.ti_constraints.append(Box::new(HybridDynamicsConstraint::new(
            &self.model,
            Rc::clone(&self.contacts),
            Rc::clone(&self.schedule),
        )));
        self.ti_constraints
            .append(Box::new(TimeIntegrationConstraint::new(NUM_STATES)));
        for contact_index in 0..self.contacts.len() {
            self.ti_constraints.append(Box::new(PositionKinematicConstraint::new(
                Rc::clone(&self.contacts),
                contact_index,
            )));
        }
    }

    /// One touchdown constraint per (knotpoint, active contact) pair.
    fn build_td_constraints(&mut self) {
        for knotpoint in 1..=self.config.n_knotpoints {
            for contact_index in self.schedule.active_contacts(knotpoint) {
                self.td_constraints.append(
                    knotpoint,
                    Box::new(ActiveContactKinematicConstraint::new(
                        Rc::clone(&self.contacts),
                        contact_index,
                    )),
                );
            }
        }
    }

    pub const fn config(&self) -> &JumpConfig {
        &self.config
    }

    pub const fn variables(&self) -> &VariableManager {
        &self.vars
    }

    pub fn schedule(&self) -> &ContactModeSchedule {
        &self.schedule
    }

    pub fn contacts(&self) -> &ContactList {
        &self.contacts
    }

    pub const fn model(&self) -> &HopperModel {
        &self.model
    }
}

impl OptimizationProblem for JumpProblem {
    fn name(&self) -> &str {
        "hopper_jump"
    }

    fn initial_opt_vars(&self) -> DVector<f64> {
        self.vars.initial_values()
    }

    fn opt_var_bounds(&self) -> (DVector<f64>, DVector<f64>) {
        self.vars.bounds()
    }

    fn current_opt_vars(&self) -> DVector<f64> {
        self.vars.current_values()
    }

    fn update_opt_vars(&mut self, flat: &[f64]) -> Result<(), NlpError> {
        self.vars.update_values(flat)
    }

    fn compute_f(&mut self) -> Result<DVector<f64>, NlpError> {
        assemble_f(
            self.config.n_knotpoints,
            &self.ti_constraints,
            &self.td_constraints,
            &self.objective,
            &self.vars,
            &mut self.model,
        )
    }

    fn f_bounds(&self) -> (DVector<f64>, DVector<f64>) {
        assemble_f_bounds(
            self.config.n_knotpoints,
            &self.ti_constraints,
            &self.td_constraints,
            &self.objective,
        )
    }

    fn objective_row(&self) -> usize {
        objective_row(
            self.config.n_knotpoints,
            &self.ti_constraints,
            &self.td_constraints,
        )
    }
}
