//! Candidate contact points and their ordering law.
//!
//! Contact-list insertion order defines two layouts at once: the
//! reaction-force segment order inside Fr_k and the row-block order of
//! the stacked contact Jacobian. Both are derived from the same list
//! here so they cannot drift apart.

use nalgebra::{DMatrix, DVector};

use crate::error::NlpError;

/// A point of possible ground interaction.
pub trait Contact {
    /// Number of reaction-force components this contact contributes.
    fn dim(&self) -> usize;

    /// Dense contact Jacobian at configuration `q`: `dim()` rows, one
    /// column per generalized-velocity degree of freedom.
    fn jacobian(&self, q: &DVector<f64>) -> DMatrix<f64>;

    /// Signed gap between the contact point and the ground (positive
    /// above, zero touching).
    fn height(&self, q: &DVector<f64>) -> f64;

    /// Diagnostic name.
    fn name(&self) -> &str {
        "contact"
    }
}

/// Ordered, append-only sequence of contacts. Contacts are fixed for
/// the problem's lifetime; there is no removal.
#[derive(Default)]
pub struct ContactList {
    contacts: Vec<Box<dyn Contact>>,
}

impl ContactList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a contact; the list takes ownership and the position is
    /// immutable afterwards.
    pub fn append(&mut self, contact: Box<dyn Contact>) {
        self.contacts.push(contact);
    }

    pub fn get(&self, index: usize) -> Result<&dyn Contact, NlpError> {
        self.contacts
            .get(index)
            .map(AsRef::as_ref)
            .ok_or(NlpError::ContactOutOfRange {
                index,
                len: self.contacts.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Sum of force dimensions over all contacts: the length of Fr_k
    /// and the row count of the stacked Jacobian.
    pub fn total_force_dim(&self) -> usize {
        self.contacts.iter().map(|c| c.dim()).sum()
    }

    /// Offset of contact `index`'s segment inside Fr_k, computed by
    /// summing the force dimensions of all preceding contacts. This is
    /// recomputed on every call so the offset law has a single source
    /// of truth: list order.
    pub fn force_offset(&self, index: usize) -> Result<usize, NlpError> {
        if index >= self.contacts.len() {
            return Err(NlpError::ContactOutOfRange {
                index,
                len: self.contacts.len(),
            });
        }
        Ok(self.contacts[..index].iter().map(|c| c.dim()).sum())
    }

    /// Vertically stack every contact's Jacobian at `q`, in list order.
    ///
    /// Row segment `i` spans exactly `contacts[i].dim()` rows, mirroring
    /// the Fr_k segment layout. Errors if any contact reports a Jacobian
    /// whose shape disagrees with its declared `dim()` or with `ndof`.
    pub fn stacked_jacobian(
        &self,
        q: &DVector<f64>,
        ndof: usize,
    ) -> Result<DMatrix<f64>, NlpError> {
        let mut stacked = DMatrix::zeros(self.total_force_dim(), ndof);
        let mut row = 0;
        for contact in &self.contacts {
            let block = contact.jacobian(q);
            if block.nrows() != contact.dim() {
                return Err(NlpError::DimensionMismatch {
                    context: "contact jacobian rows",
                    expected: contact.dim(),
                    got: block.nrows(),
                });
            }
            if block.ncols() != ndof {
                return Err(NlpError::DimensionMismatch {
                    context: "contact jacobian columns",
                    expected: ndof,
                    got: block.ncols(),
                });
            }
            stacked.view_mut((row, 0), (block.nrows(), ndof)).copy_from(&block);
            row += block.nrows();
        }
        Ok(stacked)
    }
}
