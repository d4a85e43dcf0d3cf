use log::{debug, info, trace, warn};

use crate::error::SolverError;
use crate::feasibility::{DEFAULT_RANK_TOLERANCE, Feasibility, FeasibilityAnalyzer};
use crate::problem::{LpProblem, StandardForm};
use crate::solution::{Solution, SolutionStatus};
use crate::standard_form::to_standard_form;
use crate::tableau::{DEFAULT_BIG_M, Tableau, TableauBuilder};

/// Tolerance for reduced-cost and ratio-test decisions
pub const DEFAULT_PIVOT_TOLERANCE: f64 = 1e-10;

/// Big-M tableau simplex solver using Bland's rule
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots before giving up
    max_iterations: usize,
    /// Tolerance for pivoting decisions
    pivot_tolerance: f64,
    /// Tolerance for rank and feasibility decisions
    rank_tolerance: f64,
    /// Penalty on artificial variables
    big_m: f64,
    /// Run the zero/duplicate row pass before the QR rank pass
    prune_rows: bool,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            pivot_tolerance: DEFAULT_PIVOT_TOLERANCE,
            rank_tolerance: DEFAULT_RANK_TOLERANCE,
            big_m: DEFAULT_BIG_M,
            prune_rows: true,
        }
    }
}

/// Final state of a pivot loop over a raw tableau
#[derive(Debug, Clone)]
pub struct TableauOutcome {
    pub status: SolutionStatus,
    /// The tableau as it stood when the loop stopped
    pub tableau: Tableau,
    /// Basic variable of each constraint row, in row order
    pub basis: Vec<usize>,
    /// Values of the structural columns; `None` unless optimal
    pub values: Option<Vec<f64>>,
    pub iterations: usize,
}

impl TableauOutcome {
    /// Objective value read off the tableau (`-rhs` of the objective row).
    pub fn objective_value(&self) -> f64 {
        -self.tableau.objective_rhs()
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_pivot_tolerance(mut self, tol: f64) -> Self {
        self.pivot_tolerance = tol;
        self
    }

    pub fn with_rank_tolerance(mut self, tol: f64) -> Self {
        self.rank_tolerance = tol;
        self
    }

    pub fn with_big_m(mut self, big_m: f64) -> Self {
        self.big_m = big_m;
        self
    }

    pub fn with_row_pruning(mut self, enabled: bool) -> Self {
        self.prune_rows = enabled;
        self
    }

    pub fn analyzer(&self) -> FeasibilityAnalyzer {
        FeasibilityAnalyzer::new(self.rank_tolerance).with_row_pruning(self.prune_rows)
    }

    /// Solve a general-form problem.
    ///
    /// The objective value is reported in the problem's own sense, and the
    /// values cover only the problem's variables.
    pub fn solve(&self, problem: &LpProblem) -> Result<Solution, SolverError> {
        let standard = to_standard_form(problem)?;
        let mut solution = self.solve_standard(&standard);

        if let Some(values) = solution.values.as_mut() {
            values.truncate(problem.num_variables());
        }
        if !problem.objective.minimize {
            solution.objective_value = solution.objective_value.map(|v| -v);
        }
        Ok(solution)
    }

    /// Solve `min cᵀx, Ax = b, x ≥ 0`.
    pub fn solve_standard(&self, problem: &StandardForm) -> Solution {
        let reduced = match self.analyzer().analyze(problem) {
            Feasibility::Infeasible { .. } => {
                info!("verdict: infeasible (rejected before tableau construction)");
                return Solution::infeasible(0);
            }
            Feasibility::Feasible { problem, .. } => problem,
        };

        let n = reduced.num_columns();
        let tableau = TableauBuilder::new(self.big_m).build(&reduced);
        let basis = (n..n + reduced.num_rows()).collect();
        let outcome = self.run(tableau, basis, n);

        match outcome.status {
            SolutionStatus::Optimal => {}
            SolutionStatus::Unbounded => return Solution::unbounded(outcome.iterations),
            SolutionStatus::IterationLimit => return Solution::iteration_limit(outcome.iterations),
            SolutionStatus::Infeasible => return Solution::infeasible(outcome.iterations),
        }

        // An artificial variable left basic at a positive level means the
        // penalty could not drive it out: the constraints admit no x ≥ 0.
        let scale = 1.0 + reduced.rhs.iter().fold(0.0f64, |acc, b| acc.max(b.abs()));
        let residual_artificial = outcome
            .basis
            .iter()
            .enumerate()
            .find(|&(i, &var)| var >= n && outcome.tableau.rhs(i + 1) > self.rank_tolerance * scale);
        if let Some((row, &var)) = residual_artificial {
            warn!(
                "artificial variable {} still basic in row {} at {:.3e}, reporting infeasible",
                var,
                row + 1,
                outcome.tableau.rhs(row + 1)
            );
            return Solution::infeasible(outcome.iterations);
        }

        let values = outcome.values.unwrap_or_default();
        let objective_value: f64 = reduced.objective.iter().zip(&values).map(|(c, x)| c * x).sum();
        info!("verdict: optimal, objective {} after {} pivots", objective_value, outcome.iterations);
        Solution::optimal(values, objective_value, outcome.iterations)
    }

    /// Run the pivot loop on a prepared tableau.
    ///
    /// The tableau has `m + 1` rows and `k + m + 1` columns; the last `m`
    /// variable columns form the starting basis and values are reported for
    /// the first `k` columns.
    pub fn solve_tableau(&self, tableau: Tableau) -> Result<TableauOutcome, SolverError> {
        if tableau.num_rows() == 0 || tableau.num_cols() == 0 {
            return Err(SolverError::EmptyTableau);
        }
        let m = tableau.num_constraints();
        let vars = tableau.num_variables();
        if vars < m {
            return Err(SolverError::InvalidTableau(format!(
                "{} constraint rows but only {} variable columns",
                m, vars
            )));
        }
        let structural = vars - m;
        let basis = (structural..vars).collect();
        Ok(self.run(tableau, basis, structural))
    }

    fn run(&self, mut tableau: Tableau, mut basis: Vec<usize>, structural: usize) -> TableauOutcome {
        let mut iterations = 0;

        loop {
            let Some(entering) = self.find_entering(&tableau) else {
                let values = read_values(&tableau, &basis, structural);
                debug!("optimal after {} pivots", iterations);
                return TableauOutcome {
                    status: SolutionStatus::Optimal,
                    tableau,
                    basis,
                    values: Some(values),
                    iterations,
                };
            };

            let Some(leaving) = self.find_leaving(&tableau, &basis, entering) else {
                info!("verdict: unbounded, column {} has no positive entry", entering);
                return TableauOutcome {
                    status: SolutionStatus::Unbounded,
                    tableau,
                    basis,
                    values: None,
                    iterations,
                };
            };

            if iterations >= self.max_iterations {
                warn!("iteration limit of {} reached without a verdict", self.max_iterations);
                return TableauOutcome {
                    status: SolutionStatus::IterationLimit,
                    tableau,
                    basis,
                    values: None,
                    iterations,
                };
            }

            trace!(
                "pivot {}: column {} enters, variable {} leaves row {}",
                iterations,
                entering,
                basis[leaving - 1],
                leaving
            );
            basis[leaving - 1] = entering;
            tableau.pivot(leaving, entering);
            iterations += 1;
        }
    }

    /// Bland's rule: the lowest-index column with a negative reduced cost.
    fn find_entering(&self, tableau: &Tableau) -> Option<usize> {
        tableau.reduced_costs().iter().position(|&d| d < -self.pivot_tolerance)
    }

    /// Minimum-ratio test over rows with a positive entry in `col`; ties go to
    /// the row whose basic variable has the smallest index. Returns the
    /// tableau row, or `None` when the column is unbounded.
    fn find_leaving(&self, tableau: &Tableau, basis: &[usize], col: usize) -> Option<usize> {
        let eps = self.pivot_tolerance;
        let rhs_col = tableau.rhs_col();
        let mut best: Option<(usize, f64)> = None;

        for i in 1..=tableau.num_constraints() {
            let entry = tableau[(i, col)];
            if entry <= eps {
                continue;
            }
            let ratio = tableau[(i, rhs_col)] / entry;
            best = match best {
                None => Some((i, ratio)),
                Some((row, min_ratio)) => {
                    let smaller = ratio < min_ratio - eps;
                    let tie_wins = (ratio - min_ratio).abs() < eps && basis[i - 1] < basis[row - 1];
                    if smaller || tie_wins {
                        Some((i, ratio))
                    } else {
                        Some((row, min_ratio))
                    }
                }
            };
        }

        best.map(|(row, _)| row)
    }
}

fn read_values(tableau: &Tableau, basis: &[usize], structural: usize) -> Vec<f64> {
    let mut values = vec![0.0; structural];
    for (i, &var) in basis.iter().enumerate() {
        if var < structural {
            values[var] = tableau.rhs(i + 1);
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ConstraintOp;

    fn known_feasible() -> StandardForm {
        StandardForm::from_rows(
            vec![-10.0, -12.0, -12.0, 0.0, 0.0, 0.0],
            &[
                vec![1.0, 2.0, 2.0, 1.0, 0.0, 0.0],
                vec![2.0, 1.0, 2.0, 0.0, 1.0, 0.0],
                vec![2.0, 2.0, 1.0, 0.0, 0.0, 1.0],
            ],
            vec![20.0, 20.0, 20.0],
        )
        .unwrap()
    }

    /// Beale's example: cycles under the largest-coefficient rule
    fn beale() -> Tableau {
        Tableau::from_rows(&[
            vec![-0.75, 20.0, -0.5, 6.0, 0.0, 0.0, 0.0, 3.0],
            vec![0.25, -8.0, -1.0, 9.0, 1.0, 0.0, 0.0, 0.0],
            vec![0.5, -12.0, -0.5, 3.0, 0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0],
        ])
        .unwrap()
    }

    /// Each basic column is the unit vector of its row with zero reduced cost.
    fn assert_basis_is_identity(t: &Tableau, basis: &[usize]) {
        let m = t.num_constraints();
        assert_eq!(basis.len(), m);
        for (i, &var) in basis.iter().enumerate() {
            for row in 1..=m {
                let expected = if row == i + 1 { 1.0 } else { 0.0 };
                assert!((t[(row, var)] - expected).abs() < 1e-10, "column {} row {}: {}", var, row, t[(row, var)]);
            }
            assert!(t[(0, var)].abs() < 1e-6, "basic variable {} has reduced cost {}", var, t[(0, var)]);
        }
    }

    fn assert_values(values: &[f64], expected: &[f64]) {
        assert_eq!(values.len(), expected.len());
        for (j, (v, e)) in values.iter().zip(expected).enumerate() {
            assert!((v - e).abs() < 1e-6, "x{} = {} (expected {})", j, v, e);
        }
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=11
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![3.0, 2.0], false);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_values(solution.values.as_deref().unwrap(), &[3.0, 1.0]);
        assert!((solution.objective_value.unwrap() - 11.0).abs() < 1e-6, "obj = {} (expected 11)", solution.objective_value.unwrap());
    }

    #[test]
    fn test_minimization_with_ge() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=9
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![2.0, 3.0], true);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Ge, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_values(solution.values.as_deref().unwrap(), &[3.0, 1.0]);
        assert!((solution.objective_value.unwrap() - 9.0).abs() < 1e-6, "obj = {} (expected 9)", solution.objective_value.unwrap());
    }

    #[test]
    fn test_infeasible_bounds_caught_after_pivoting() {
        // x >= 5 and x <= 3 is consistent as a linear system once slacks are
        // added, so only the artificial check can reject it
        let mut problem = LpProblem::with_dimension(1);
        problem.set_objective(vec![1.0], true);
        problem.add_constraint("lower", vec![1.0], ConstraintOp::Ge, 5.0);
        problem.add_constraint("upper", vec![1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(solution.values.is_none());
    }

    #[test]
    fn test_negative_rhs_equalities() {
        // min 2x + y ; x + y = 4 ; 2x - y = -2  ->  x = 2/3, y = 10/3
        let problem = StandardForm::from_rows(vec![2.0, 1.0], &[vec![1.0, 1.0], vec![2.0, -1.0]], vec![4.0, -2.0]).unwrap();
        let solution = Solver::new().solve_standard(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_values(solution.values.as_deref().unwrap(), &[2.0 / 3.0, 10.0 / 3.0]);
        assert!((solution.objective_value.unwrap() - 14.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_known_feasible_case() {
        let solution = Solver::new().with_big_m(1e4).solve_standard(&known_feasible());

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_values(solution.values.as_deref().unwrap(), &[4.0, 4.0, 4.0, 0.0, 0.0, 0.0]);
        assert!((solution.objective_value.unwrap() + 136.0).abs() < 1e-6, "obj = {}", solution.objective_value.unwrap());
    }

    #[test]
    fn test_known_feasible_tableau_objective() {
        let tableau = TableauBuilder::new(1e4).build(&known_feasible());
        let outcome = Solver::new().solve_tableau(tableau).unwrap();

        assert_eq!(outcome.status, SolutionStatus::Optimal);
        assert!((outcome.objective_value() + 136.0).abs() < 1e-5);
        assert_values(outcome.values.as_deref().unwrap(), &[4.0, 4.0, 4.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_redundant_rows() {
        let problem = StandardForm::from_rows(
            vec![1.0, 2.0, 3.0],
            &[vec![1.0, 2.0, 3.0], vec![2.0, 4.0, 6.0], vec![1.0, 1.0, 1.0]],
            vec![6.0, 12.0, 3.0],
        )
        .unwrap();

        for big_m in [1e4, 1e6] {
            let solution = Solver::new().with_big_m(big_m).solve_standard(&problem);
            assert_eq!(solution.status, SolutionStatus::Optimal);
            assert_values(solution.values.as_deref().unwrap(), &[0.0, 3.0, 0.0]);
            assert!((solution.objective_value.unwrap() - 6.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_unbounded_tableau() {
        let problem = StandardForm::from_rows(vec![-1.0, 0.0], &[vec![1.0, -1.0], vec![-1.0, 1.0]], vec![0.0, 0.0]).unwrap();
        let tableau = TableauBuilder::new(1e4).build(&problem);
        let outcome = Solver::new().solve_tableau(tableau).unwrap();

        assert_eq!(outcome.status, SolutionStatus::Unbounded);
        assert!(outcome.values.is_none());

        // same verdict through the full pipeline, after the duplicate row is dropped
        let solution = Solver::new().solve_standard(&problem);
        assert_eq!(solution.status, SolutionStatus::Unbounded);
        assert!(solution.values.is_none());
    }

    #[test]
    fn test_infeasible_short_circuits() {
        let problem = StandardForm::from_rows(vec![1.0, 1.0], &[vec![1.0, 1.0], vec![1.0, 1.0]], vec![1.0, 2.0]).unwrap();
        let solution = Solver::new().solve_standard(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert_eq!(solution.iterations, 0);
        assert!(solution.values.is_none());
    }

    #[test]
    fn test_blands_rule_degenerate_tableau() {
        let outcome = Solver::new().solve_tableau(beale()).unwrap();

        assert_eq!(outcome.status, SolutionStatus::Optimal);
        assert!(outcome.values.is_some());
        assert!(outcome.tableau.objective_rhs() > -3.0);
        assert!((outcome.objective_value() + 4.25).abs() < 1e-9, "obj = {}", outcome.objective_value());
        assert_eq!(outcome.basis, vec![2, 4, 0]);
        assert_values(outcome.values.as_deref().unwrap(), &[1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_basis_forms_identity_and_certifies_optimality() {
        let tableau = TableauBuilder::default().build(&known_feasible());
        let outcome = Solver::new().solve_tableau(tableau).unwrap();

        assert_eq!(outcome.status, SolutionStatus::Optimal);
        assert_basis_is_identity(&outcome.tableau, &outcome.basis);
        assert!(outcome.tableau.reduced_costs().iter().all(|&d| d >= -DEFAULT_PIVOT_TOLERANCE));
    }

    #[test]
    fn test_basis_is_identity_after_every_pivot() {
        let tableaus = [TableauBuilder::default().build(&known_feasible()), beale()];
        for tableau in tableaus {
            let total = Solver::new().solve_tableau(tableau.clone()).unwrap().iterations;
            assert!(total > 0);

            for k in 0..total {
                let outcome = Solver::new().with_max_iterations(k).solve_tableau(tableau.clone()).unwrap();
                assert_eq!(outcome.status, SolutionStatus::IterationLimit, "cap {}", k);
                assert_eq!(outcome.iterations, k);
                assert_basis_is_identity(&outcome.tableau, &outcome.basis);
            }

            let outcome = Solver::new().with_max_iterations(total).solve_tableau(tableau).unwrap();
            assert_eq!(outcome.status, SolutionStatus::Optimal);
            assert_basis_is_identity(&outcome.tableau, &outcome.basis);
        }
    }

    #[test]
    fn test_unbounded_column_wins_over_iteration_cap() {
        // x enters with a negative reduced cost and nothing bounds it
        let tableau = Tableau::from_rows(&[vec![-1.0, 0.0, 0.0], vec![-1.0, 1.0, 2.0]]).unwrap();
        let outcome = Solver::new().with_max_iterations(0).solve_tableau(tableau).unwrap();

        assert_eq!(outcome.status, SolutionStatus::Unbounded);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn test_unbounded_maximize_has_no_objective() {
        let mut problem = LpProblem::with_dimension(1);
        problem.set_objective(vec![1.0], false);
        problem.add_constraint("floor", vec![1.0], ConstraintOp::Ge, 1.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Unbounded);
        assert_eq!(solution.objective_value, None);
        assert!(solution.values.is_none());
    }

    #[test]
    fn test_scaling_a_row_keeps_objective() {
        let base = known_feasible();
        for k in [0.25, 3.0, 50.0] {
            let mut scaled = base.clone();
            for j in 0..scaled.num_columns() {
                scaled.matrix[(0, j)] *= k;
            }
            scaled.rhs[0] *= k;

            let solution = Solver::new().solve_standard(&scaled);
            assert_eq!(solution.status, SolutionStatus::Optimal);
            assert!((solution.objective_value.unwrap() + 136.0).abs() < 1e-6, "k = {}: obj = {}", k, solution.objective_value.unwrap());
        }
    }

    #[test]
    fn test_iteration_limit() {
        let solution = Solver::new().with_max_iterations(1).solve_standard(&known_feasible());

        assert_eq!(solution.status, SolutionStatus::IterationLimit);
        assert_eq!(solution.iterations, 1);
        assert!(solution.values.is_none());
    }

    #[test]
    fn test_unconstrained_problem() {
        let zero = [vec![0.0, 0.0]];

        let bounded = StandardForm::from_rows(vec![1.0, 2.0], &zero, vec![0.0]).unwrap();
        let solution = Solver::new().solve_standard(&bounded);
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.values, Some(vec![0.0, 0.0]));
        assert_eq!(solution.objective_value, Some(0.0));

        let unbounded = StandardForm::from_rows(vec![1.0, -2.0], &zero, vec![0.0]).unwrap();
        assert_eq!(Solver::new().solve_standard(&unbounded).status, SolutionStatus::Unbounded);
    }

    #[test]
    fn test_solve_tableau_rejects_too_few_columns() {
        let tableau = Tableau::from_rows(&[vec![0.0, 0.0], vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap();
        assert!(matches!(
            Solver::new().solve_tableau(tableau),
            Err(SolverError::InvalidTableau(_))
        ));
    }
}
