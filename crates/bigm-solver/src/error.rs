use thiserror::Error;

/// Malformed input handed to the solver.
///
/// LP verdicts (infeasible, unbounded, iteration limit) are not errors; they
/// come back as a [`crate::SolutionStatus`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Dimension mismatch in {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        found: usize,
    },
    #[error("Non-finite value in {what}")]
    NonFinite { what: String },
    #[error("Tableau must have at least one row and one column")]
    EmptyTableau,
    #[error("Invalid tableau: {0}")]
    InvalidTableau(String),
}

impl SolverError {
    pub(crate) fn mismatch(what: impl Into<String>, expected: usize, found: usize) -> Self {
        SolverError::DimensionMismatch {
            what: what.into(),
            expected,
            found,
        }
    }
}
