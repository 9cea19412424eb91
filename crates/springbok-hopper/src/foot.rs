//! Point foot contact for the hopper.

use nalgebra::{DMatrix, DVector};

use springbok_nlp::Contact;

use crate::model::NUM_DOF;

/// The hopper's single foot: a point contact carrying one normal-force
/// component. Foot height above the ground is `z_virt + z_leg`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FootContact;

impl FootContact {
    pub const fn new() -> Self {
        Self
    }
}

impl Contact for FootContact {
    fn dim(&self) -> usize {
        1
    }

    fn jacobian(&self, _q: &DVector<f64>) -> DMatrix<f64> {
        // ∂(z_virt + z_leg)/∂q̇ is constant for this kinematic chain.
        DMatrix::from_row_slice(1, NUM_DOF, &[1.0, 1.0])
    }

    fn height(&self, q: &DVector<f64>) -> f64 {
        q[0] + q[1]
    }

    fn name(&self) -> &str {
        "foot"
    }
}
