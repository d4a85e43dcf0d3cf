use thiserror::Error;

use crate::solution::{Solution, SolutionStatus};

/// Absolute tolerance used when comparing against a reference solution
pub const DEFAULT_VERIFY_TOLERANCE: f64 = 1e-3;

/// A known-good answer to compare a solve against
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub objective: f64,
    pub values: Vec<f64>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifyError {
    #[error("Solution dimension mismatch: got {computed}, expected {expected}")]
    DimensionMismatch { computed: usize, expected: usize },
    #[error("Only optimal solutions can be verified, status is {0}")]
    NotOptimal(SolutionStatus),
}

/// How far a computed solution is from the reference
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub objective_difference: f64,
    /// Largest absolute component difference
    pub solution_difference: f64,
    pub objective_match: bool,
    pub solution_match: bool,
}

impl Verification {
    pub fn is_match(&self) -> bool {
        self.objective_match && self.solution_match
    }
}

pub fn verify(solution: &Solution, reference: &Reference, tolerance: f64) -> Result<Verification, VerifyError> {
    let (values, objective) = match (&solution.status, &solution.values, solution.objective_value) {
        (SolutionStatus::Optimal, Some(values), Some(objective)) => (values, objective),
        (status, _, _) => return Err(VerifyError::NotOptimal(*status)),
    };
    if values.len() != reference.values.len() {
        return Err(VerifyError::DimensionMismatch {
            computed: values.len(),
            expected: reference.values.len(),
        });
    }

    let objective_difference = (objective - reference.objective).abs();
    let solution_difference = values
        .iter()
        .zip(&reference.values)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);

    Ok(Verification {
        objective_difference,
        solution_difference,
        objective_match: objective_difference < tolerance,
        solution_match: solution_difference < tolerance,
    })
}
