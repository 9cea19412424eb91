//! NLP problem assembly for hybrid-dynamics trajectory optimization.
//!
//! This crate turns a discretized legged-robot trajectory-optimization
//! problem into the flat numeric callback surface a large-scale NLP
//! solver consumes: a decision-variable vector with bounds, a residual
//! ("F") vector with bounds, and an objective row.
//!
//! The pieces:
//!
//! 1. **Variable Manager**: owns the flat decision-variable vector and
//!    its semantic decomposition into state / state-rate / input /
//!    reaction-force / timestep groups per knotpoint
//! 2. **Contact List & Mode Schedule**: candidate contact points and,
//!    per knotpoint, which of them may carry force
//! 3. **Hybrid Dynamics Constraint**: per-knotpoint implicit-integrator
//!    residual combining model dynamics, the stacked contact Jacobian,
//!    and inactive-force masking
//! 4. **Constraint / Objective lists**: produce the combined residual
//!    and bounds vectors in a fixed, solver-compatible order
//!
//! The multibody dynamics model itself is an external collaborator
//! behind the [`CombinedDynamics`] trait; a handle to it is passed
//! explicitly through every evaluation, so there is no process-wide
//! shared model state.

pub mod constraint;
pub mod contact;
pub mod dynamics;
pub mod error;
pub mod objective;
pub mod problem;
pub mod schedule;
pub mod variables;

pub use constraint::{ConstraintFunction, ConstraintList, DerivativeInfo, TimeDependentList};
pub use contact::{Contact, ContactList};
pub use dynamics::{CombinedDynamics, HybridDynamicsConstraint};
pub use error::NlpError;
pub use objective::{InputEffortObjective, ObjectiveFunction};
pub use problem::{assemble_f, assemble_f_bounds, objective_row, OptimizationProblem};
pub use schedule::{ContactMode, ContactModeSchedule};
pub use variables::{DecisionVariable, VarKind, VariableManager};
