use log::debug;
use nalgebra::DMatrix;

use crate::error::SolverError;
use crate::problem::{ConstraintOp, LpProblem, StandardForm};

/// Convert a general-form problem to `min cᵀx, Ax = b, x ≥ 0`.
///
/// Maximization is turned into minimization by negating the objective. Every
/// `<=` row gets a slack column (`+1` in its own row) and every `>=` row a
/// surplus column (`-1`), appended after the original variables in row order.
/// Equality rows get no extra column. The right-hand side is passed through.
pub fn to_standard_form(problem: &LpProblem) -> Result<StandardForm, SolverError> {
    problem.validate()?;

    let n = problem.num_variables();
    let m = problem.num_constraints();

    let mut objective: Vec<f64> = if problem.objective.minimize {
        problem.objective.coefficients.clone()
    } else {
        problem.objective.coefficients.iter().map(|c| -c).collect()
    };

    let slack_rows: Vec<(usize, f64)> = problem
        .constraints
        .iter()
        .enumerate()
        .filter_map(|(i, c)| match c.op {
            ConstraintOp::Le => Some((i, 1.0)),
            ConstraintOp::Ge => Some((i, -1.0)),
            ConstraintOp::Eq => None,
        })
        .collect();

    let total_cols = n + slack_rows.len();
    let mut matrix = DMatrix::zeros(m, total_cols);
    for (i, c) in problem.constraints.iter().enumerate() {
        for (j, &coef) in c.coefficients.iter().enumerate() {
            matrix[(i, j)] = coef;
        }
    }
    for (k, &(row, sign)) in slack_rows.iter().enumerate() {
        matrix[(row, n + k)] = sign;
    }
    objective.resize(total_cols, 0.0);

    let rhs = problem.constraints.iter().map(|c| c.rhs).collect();

    debug!(
        "standard form: {} rows, {} original + {} slack/surplus columns",
        m,
        n,
        slack_rows.len()
    );

    StandardForm::new(objective, matrix, rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_inequalities() {
        // min 3x - y + 2z
        //   x + 2y - z >= 4
        //  4x - 2y + z  = 6
        //   x +  y + z <= 2
        let mut problem = LpProblem::with_dimension(3);
        problem.set_objective(vec![3.0, -1.0, 2.0], true);
        problem.add_constraint("a", vec![1.0, 2.0, -1.0], ConstraintOp::Ge, 4.0);
        problem.add_constraint("b", vec![4.0, -2.0, 1.0], ConstraintOp::Eq, 6.0);
        problem.add_constraint("c", vec![1.0, 1.0, 1.0], ConstraintOp::Le, 2.0);

        let sf = to_standard_form(&problem).unwrap();

        assert_eq!(sf.objective, vec![3.0, -1.0, 2.0, 0.0, 0.0]);
        assert_eq!(sf.rhs, vec![4.0, 6.0, 2.0]);
        assert_eq!(sf.num_columns(), 5);

        // surplus for row 0, slack for row 2, nothing for the equality
        assert_eq!(sf.matrix[(0, 3)], -1.0);
        assert_eq!(sf.matrix[(1, 3)], 0.0);
        assert_eq!(sf.matrix[(2, 3)], 0.0);
        assert_eq!(sf.matrix[(2, 4)], 1.0);
        assert_eq!(sf.matrix[(0, 4)], 0.0);
        assert_eq!(sf.matrix[(1, 4)], 0.0);
    }

    #[test]
    fn test_maximize_negates_objective() {
        let mut problem = LpProblem::with_dimension(2);
        problem.set_objective(vec![3.0, 2.0], false);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);

        let sf = to_standard_form(&problem).unwrap();

        assert_eq!(sf.objective, vec![-3.0, -2.0, 0.0]);
        // input is untouched
        assert_eq!(problem.objective.coefficients, vec![3.0, 2.0]);
    }

    #[test]
    fn test_equalities_add_no_columns() {
        let mut problem = LpProblem::with_dimension(2);
        problem.set_objective(vec![1.0, 1.0], true);
        problem.add_constraint("e1", vec![1.0, 0.0], ConstraintOp::Eq, 1.0);
        problem.add_constraint("e2", vec![0.0, 1.0], ConstraintOp::Eq, -1.0);

        let sf = to_standard_form(&problem).unwrap();

        assert_eq!(sf.num_columns(), 2);
        assert_eq!(sf.rhs, vec![1.0, -1.0]);
    }
}
