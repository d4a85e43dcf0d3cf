use nalgebra::DMatrix;

use crate::error::SolverError;

/// Represents a linear programming problem in general form
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Variable names
    pub variables: Vec<String>,
    /// Objective function coefficients
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl LpProblem {
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: Objective {
                coefficients: vec![0.0; n],
                minimize: true,
            },
            constraints: Vec::new(),
        }
    }

    /// Creates a problem with variables named `x1..xn`.
    pub fn with_dimension(n: usize) -> Self {
        Self::new((1..=n).map(|i| format!("x{}", i)).collect())
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        self.objective = Objective { coefficients, minimize };
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Pairs each variable name with its value in `values`.
    pub fn assignments<'a>(&'a self, values: &'a [f64]) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        self.variables.iter().map(String::as_str).zip(values.iter().copied())
    }

    /// Checks that every coefficient vector has one entry per variable and
    /// that all numbers are finite.
    pub fn validate(&self) -> Result<(), SolverError> {
        let n = self.num_variables();
        if self.objective.coefficients.len() != n {
            return Err(SolverError::mismatch("objective", n, self.objective.coefficients.len()));
        }
        if self.objective.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(SolverError::NonFinite { what: "objective".to_string() });
        }
        for c in &self.constraints {
            if c.coefficients.len() != n {
                return Err(SolverError::mismatch(format!("constraint {}", c.name), n, c.coefficients.len()));
            }
            if !c.rhs.is_finite() || c.coefficients.iter().any(|a| !a.is_finite()) {
                return Err(SolverError::NonFinite { what: format!("constraint {}", c.name) });
            }
        }
        Ok(())
    }
}

/// An LP in standard equality form: minimize `cᵀx` subject to `Ax = b`, `x ≥ 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardForm {
    pub objective: Vec<f64>,
    pub matrix: DMatrix<f64>,
    pub rhs: Vec<f64>,
}

impl StandardForm {
    pub fn new(objective: Vec<f64>, matrix: DMatrix<f64>, rhs: Vec<f64>) -> Result<Self, SolverError> {
        if matrix.ncols() != objective.len() {
            return Err(SolverError::mismatch("constraint matrix columns", objective.len(), matrix.ncols()));
        }
        if matrix.nrows() != rhs.len() {
            return Err(SolverError::mismatch("right-hand side", matrix.nrows(), rhs.len()));
        }
        if objective.iter().chain(rhs.iter()).chain(matrix.iter()).any(|v| !v.is_finite()) {
            return Err(SolverError::NonFinite { what: "standard form".to_string() });
        }
        Ok(Self { objective, matrix, rhs })
    }

    /// Builds a standard form from row slices, mostly useful in tests and
    /// for callers that already hold `Ax = b` data.
    pub fn from_rows(objective: Vec<f64>, rows: &[Vec<f64>], rhs: Vec<f64>) -> Result<Self, SolverError> {
        let n = objective.len();
        if let Some(row) = rows.iter().find(|r| r.len() != n) {
            return Err(SolverError::mismatch("constraint row", n, row.len()));
        }
        let matrix = DMatrix::from_fn(rows.len(), n, |i, j| rows[i][j]);
        Self::new(objective, matrix, rhs)
    }

    pub fn num_rows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn num_columns(&self) -> usize {
        self.matrix.ncols()
    }

    /// Keeps only the listed rows of `A` and `b`, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> StandardForm {
        let matrix = self.matrix.select_rows(rows.iter());
        let rhs = rows.iter().map(|&i| self.rhs[i]).collect();
        StandardForm {
            objective: self.objective.clone(),
            matrix,
            rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_short_rows() {
        let mut problem = LpProblem::with_dimension(2);
        problem.set_objective(vec![1.0, 1.0], true);
        problem.add_constraint("short", vec![1.0], ConstraintOp::Le, 1.0);

        assert_eq!(
            problem.validate(),
            Err(SolverError::DimensionMismatch {
                what: "constraint short".to_string(),
                expected: 2,
                found: 1,
            })
        );
    }

    #[test]
    fn test_assignments_use_variable_names() {
        let problem = LpProblem::new(vec!["corn".to_string(), "soy".to_string()]);
        let named: Vec<_> = problem.assignments(&[1.5, 0.0]).collect();
        assert_eq!(named, vec![("corn", 1.5), ("soy", 0.0)]);

        let numbered = LpProblem::with_dimension(3);
        let names: Vec<_> = numbered.assignments(&[0.0; 3]).map(|(name, _)| name).collect();
        assert_eq!(names, vec!["x1", "x2", "x3"]);
    }

    #[test]
    fn test_validate_rejects_nan() {
        let mut problem = LpProblem::with_dimension(1);
        problem.set_objective(vec![f64::NAN], true);
        assert!(matches!(problem.validate(), Err(SolverError::NonFinite { .. })));
    }

    #[test]
    fn test_standard_form_dimensions() {
        let err = StandardForm::from_rows(vec![1.0, 2.0], &[vec![1.0, 1.0]], vec![1.0, 2.0]).unwrap_err();
        assert_eq!(err, SolverError::mismatch("right-hand side", 1, 2));

        let sf = StandardForm::from_rows(vec![1.0, 2.0], &[vec![1.0, 1.0], vec![0.0, 3.0]], vec![1.0, 2.0]).unwrap();
        assert_eq!(sf.num_rows(), 2);
        assert_eq!(sf.num_columns(), 2);
        assert_eq!(sf.matrix[(1, 1)], 3.0);
    }

    #[test]
    fn test_select_rows() {
        let sf = StandardForm::from_rows(
            vec![1.0, 1.0],
            &[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
            vec![1.0, 2.0, 3.0],
        )
        .unwrap();
        let picked = sf.select_rows(&[0, 2]);
        assert_eq!(picked.rhs, vec![1.0, 3.0]);
        assert_eq!(picked.matrix[(1, 0)], 1.0);
        assert_eq!(picked.matrix[(1, 1)], 1.0);
    }
}
