use thiserror::Error;

/// Errors raised while assembling or evaluating an NLP.
///
/// These are integration errors, not recoverable solve-time conditions:
/// a well-constructed problem never produces them, and when one appears
/// the evaluation must abort rather than hand the solver a stale or
/// zero residual.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NlpError {
    #[error("Knotpoint {knotpoint} out of range (horizon has knotpoints 0..={total})")]
    KnotpointOutOfRange { knotpoint: usize, total: usize },

    #[error("Contact index {index} out of range ({len} contacts)")]
    ContactOutOfRange { index: usize, len: usize },

    #[error("Dimension mismatch in {context}: expected {expected}, got {got}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("No {kind} variables registered at knotpoint {knotpoint}")]
    MissingVariables {
        kind: &'static str,
        knotpoint: usize,
    },

    #[error("Component {component} out of range for {kind} at knotpoint {knotpoint}")]
    ComponentOutOfRange {
        kind: &'static str,
        knotpoint: usize,
        component: usize,
    },

    #[error("Unconfigured dependency: {0}")]
    Unconfigured(&'static str),

    #[error("Variable layout not finalized: call finalize_layout() after appending all variables")]
    LayoutNotFinalized,
}
