//! Jump problem configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::HopperParams;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_n_knotpoints() -> usize {
    27
}
const fn default_h_min() -> f64 {
    0.05
}
const fn default_h_max() -> f64 {
    1.0
}
const fn default_max_normal_force() -> f64 {
    1e10
}
const fn default_max_input() -> f64 {
    100.0
}
const fn default_rate_bound() -> f64 {
    10.0
}
const fn default_base_height_max() -> f64 {
    10.0
}
const fn default_deflection_bound() -> f64 {
    0.025
}
const fn default_initial_base_height() -> f64 {
    0.5
}
const fn default_apex_height() -> f64 {
    1.25
}
const fn default_final_height() -> f64 {
    0.7
}
const fn default_pin_eps() -> f64 {
    1e-4
}
const fn default_input_cost_weight() -> f64 {
    1e-2
}

// ---------------------------------------------------------------------------
// JumpConfig
// ---------------------------------------------------------------------------

/// Configuration of the hopper jump optimization problem.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JumpConfig {
    /// Number of trajectory knotpoints N (default: 27, three phases of 9).
    #[serde(default = "default_n_knotpoints")]
    pub n_knotpoints: usize,

    /// Minimum knotpoint timestep in seconds.
    #[serde(default = "default_h_min")]
    pub h_min: f64,

    /// Maximum knotpoint timestep in seconds.
    #[serde(default = "default_h_max")]
    pub h_max: f64,

    /// Upper bound on each contact normal force in N.
    #[serde(default = "default_max_normal_force")]
    pub max_normal_force: f64,

    /// Symmetric actuator-input bound in A.
    #[serde(default = "default_max_input")]
    pub max_input: f64,

    /// Symmetric bound on every state rate.
    #[serde(default = "default_rate_bound")]
    pub rate_bound: f64,

    /// Upper bound on the base height along the trajectory in m.
    #[serde(default = "default_base_height_max")]
    pub base_height_max: f64,

    /// Symmetric bound on the spring deflection in m.
    #[serde(default = "default_deflection_bound")]
    pub deflection_bound: f64,

    /// Base height at knotpoint 0 in m; the leg starts at its mirror so
    /// the foot begins on the ground.
    #[serde(default = "default_initial_base_height")]
    pub initial_base_height: f64,

    /// Minimum base height at the mid-trajectory knotpoint in m.
    #[serde(default = "default_apex_height")]
    pub apex_height: f64,

    /// Base height the final knotpoint is pinned to in m.
    #[serde(default = "default_final_height")]
    pub final_height: f64,

    /// Half-width of pinned-variable bounds.
    #[serde(default = "default_pin_eps")]
    pub pin_eps: f64,

    /// Weight of the quadratic input-effort objective.
    #[serde(default = "default_input_cost_weight")]
    pub input_cost_weight: f64,

    /// Physical model parameters.
    #[serde(default)]
    pub model: HopperParams,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            n_knotpoints: default_n_knotpoints(),
            h_min: default_h_min(),
            h_max: default_h_max(),
            max_normal_force: default_max_normal_force(),
            max_input: default_max_input(),
            rate_bound: default_rate_bound(),
            base_height_max: default_base_height_max(),
            deflection_bound: default_deflection_bound(),
            initial_base_height: default_initial_base_height(),
            apex_height: default_apex_height(),
            final_height: default_final_height(),
            pin_eps: default_pin_eps(),
            input_cost_weight: default_input_cost_weight(),
            model: HopperParams::default(),
        }
    }
}

impl JumpConfig {
    /// Parse a TOML string; missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Check cross-field requirements the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_knotpoints < 3 {
            return Err(ConfigError::InvalidValue {
                field: "n_knotpoints",
                message: format!("must be at least 3, got {}", self.n_knotpoints),
            });
        }
        if self.h_min <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "h_min",
                message: format!("must be > 0, got {}", self.h_min),
            });
        }
        if self.h_max < self.h_min {
            return Err(ConfigError::InvalidValue {
                field: "h_max",
                message: format!("must be >= h_min ({}), got {}", self.h_min, self.h_max),
            });
        }
        if self.pin_eps <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "pin_eps",
                message: format!("must be > 0, got {}", self.pin_eps),
            });
        }
        if self.max_normal_force < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "max_normal_force",
                message: format!("must be >= 0, got {}", self.max_normal_force),
            });
        }
        if self.apex_height <= self.initial_base_height {
            return Err(ConfigError::InvalidValue {
                field: "apex_height",
                message: format!(
                    "must exceed initial_base_height ({}), got {}",
                    self.initial_base_height, self.apex_height
                ),
            });
        }
        Ok(())
    }

    /// Knotpoints per contact phase: the horizon divides into three
    /// equal support / flight / support thirds.
    pub const fn phase_length(&self) -> usize {
        self.n_knotpoints / 3
    }
}
