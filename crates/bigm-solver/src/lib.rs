mod error;
mod feasibility;
mod problem;
mod simplex;
mod solution;
mod standard_form;
mod tableau;
mod verify;

pub use error::SolverError;
pub use feasibility::{DEFAULT_RANK_TOLERANCE, Feasibility, FeasibilityAnalyzer};
pub use problem::{Constraint, ConstraintOp, LpProblem, Objective, StandardForm};
pub use simplex::{DEFAULT_PIVOT_TOLERANCE, Solver, TableauOutcome};
pub use solution::{Solution, SolutionStatus};
pub use standard_form::to_standard_form;
pub use tableau::{DEFAULT_BIG_M, Tableau, TableauBuilder};
pub use verify::{DEFAULT_VERIFY_TOLERANCE, Reference, Verification, VerifyError, verify};
