//! Single-leg hopper jump trajectory optimization.
//!
//! Instantiates the `springbok-nlp` engine for a planar one-leg hopper
//! with a series-elastic actuator:
//!
//! 1. **Hopper model**: combined rigid-body + actuator dynamics behind
//!    the `CombinedDynamics` seam
//! 2. **Foot contact**: one point contact carrying a normal force
//! 3. **Kinematic & integration constraints**: backward-Euler state
//!    integration, ground clearance, active-contact touchdown
//! 4. **Jump problem**: three-phase contact schedule (support, flight,
//!    support), decision-variable layout, apex and landing bounds,
//!    and the solver callback surface
//!
//! The combined state is `x = [z_virt, z_act, δ]`: base height,
//! actuator position, and spring deflection.

pub mod config;
pub mod constraints;
pub mod error;
pub mod foot;
pub mod jump;
pub mod model;

pub use config::JumpConfig;
pub use constraints::{
    ActiveContactKinematicConstraint, PositionKinematicConstraint, TimeIntegrationConstraint,
};
pub use error::{ConfigError, HopperError};
pub use foot::FootContact;
pub use jump::JumpProblem;
pub use model::{HopperModel, HopperParams};
