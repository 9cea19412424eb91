//! Constraint capability interface and typed constraint collections.

use nalgebra::DVector;

use crate::dynamics::CombinedDynamics;
use crate::error::NlpError;
use crate::variables::VariableManager;

/// Sparse-derivative information in coordinate (triplet) format.
///
/// `Unimplemented` is deliberately distinct from an empty triplet list:
/// the former tells the solver to fall back to its own differencing,
/// the latter would claim an all-zero Jacobian. Nothing in this crate
/// currently computes derivatives, so evaluation hooks default to
/// `Unimplemented`.
#[derive(Clone, Debug, PartialEq)]
pub enum DerivativeInfo {
    /// The provider does not compute derivatives.
    Unimplemented,
    /// Coordinate-format nonzeros: `values[i]` at `(rows[i], cols[i])`.
    Triplets {
        values: Vec<f64>,
        rows: Vec<usize>,
        cols: Vec<usize>,
    },
}

impl DerivativeInfo {
    pub const fn is_unimplemented(&self) -> bool {
        matches!(self, Self::Unimplemented)
    }
}

/// One named residual block of the NLP.
///
/// The bound slices are fixed at construction and their common length
/// is the constraint size; `evaluate` must return a residual of exactly
/// that length.
pub trait ConstraintFunction {
    fn name(&self) -> &str;

    /// Lower residual bounds `F_low`.
    fn lower(&self) -> &[f64];

    /// Upper residual bounds `F_upp`.
    fn upper(&self) -> &[f64];

    /// Residual length.
    fn size(&self) -> usize {
        self.lower().len()
    }

    /// Evaluate the residual at `knotpoint` against the current iterate.
    fn evaluate(
        &self,
        knotpoint: usize,
        vars: &VariableManager,
        model: &mut dyn CombinedDynamics,
    ) -> Result<DVector<f64>, NlpError>;

    /// Sparse residual Jacobian at `knotpoint`. Defaults to
    /// [`DerivativeInfo::Unimplemented`]; implementors that override
    /// this must produce correct triplets, never a silent zero.
    fn sparse_jacobian(
        &self,
        _knotpoint: usize,
        _vars: &VariableManager,
        _model: &mut dyn CombinedDynamics,
    ) -> DerivativeInfo {
        DerivativeInfo::Unimplemented
    }
}

/// Ordered collection of time-independent constraints. The problem
/// assembler replicates each of these at every trajectory knotpoint.
#[derive(Default)]
pub struct ConstraintList {
    items: Vec<Box<dyn ConstraintFunction>>,
}

impl ConstraintList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, constraint: Box<dyn ConstraintFunction>) {
        self.items.push(constraint);
    }

    pub fn get(&self, index: usize) -> Option<&dyn ConstraintFunction> {
        self.items.get(index).map(AsRef::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ConstraintFunction> {
        self.items.iter().map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total residual rows contributed per knotpoint.
    pub fn rows_per_knotpoint(&self) -> usize {
        self.items.iter().map(|c| c.size()).sum()
    }
}

/// A constraint bound to one designated knotpoint, evaluated exactly
/// once per solve.
pub struct TimeDependent {
    pub knotpoint: usize,
    pub inner: Box<dyn ConstraintFunction>,
}

/// Ordered collection of time-dependent constraints.
#[derive(Default)]
pub struct TimeDependentList {
    items: Vec<TimeDependent>,
}

impl TimeDependentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, knotpoint: usize, constraint: Box<dyn ConstraintFunction>) {
        self.items.push(TimeDependent {
            knotpoint,
            inner: constraint,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeDependent> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total residual rows over all bound constraints.
    pub fn total_rows(&self) -> usize {
        self.items.iter().map(|c| c.inner.size()).sum()
    }
}
