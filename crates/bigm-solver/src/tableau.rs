use std::fmt;
use std::ops::{Index, IndexMut};

use log::debug;

use crate::error::SolverError;
use crate::problem::StandardForm;

/// Default Big-M penalty
pub const DEFAULT_BIG_M: f64 = 1e6;

/// Dense simplex tableau stored row-major in one buffer.
///
/// Row 0 is the objective row, rows `1..=m` are constraints. The last column
/// is the right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub struct Tableau {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Tableau {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, SolverError> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.is_empty() || cols == 0 {
            return Err(SolverError::EmptyTableau);
        }
        if let Some(row) = rows.iter().find(|r| r.len() != cols) {
            return Err(SolverError::mismatch("tableau row", cols, row.len()));
        }
        if rows.iter().flatten().any(|v| !v.is_finite()) {
            return Err(SolverError::NonFinite { what: "tableau".to_string() });
        }
        Ok(Self {
            data: rows.concat(),
            rows: rows.len(),
            cols,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_cols(&self) -> usize {
        self.cols
    }

    /// Number of constraint rows
    pub fn num_constraints(&self) -> usize {
        self.rows - 1
    }

    /// Number of variable columns, excluding the right-hand side
    pub fn num_variables(&self) -> usize {
        self.cols - 1
    }

    pub fn rhs_col(&self) -> usize {
        self.cols - 1
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Reduced costs: the objective row without its right-hand side.
    pub fn reduced_costs(&self) -> &[f64] {
        &self.row(0)[..self.cols - 1]
    }

    /// Right-hand side of the objective row, the negated current objective.
    pub fn objective_rhs(&self) -> f64 {
        self[(0, self.cols - 1)]
    }

    /// Right-hand side of constraint row `i` (1-based tableau row).
    pub fn rhs(&self, i: usize) -> f64 {
        self[(i, self.cols - 1)]
    }

    /// Divide row `pivot_row` by the pivot entry and eliminate `pivot_col` from
    /// every other row, the objective row included.
    pub(crate) fn pivot(&mut self, pivot_row: usize, pivot_col: usize) {
        let cols = self.cols;
        let pivot_val = self[(pivot_row, pivot_col)];
        for v in self.row_mut(pivot_row) {
            *v /= pivot_val;
        }

        let (before, rest) = self.data.split_at_mut(pivot_row * cols);
        let (pivot, after) = rest.split_at_mut(cols);
        for row in before.chunks_exact_mut(cols).chain(after.chunks_exact_mut(cols)) {
            let factor = row[pivot_col];
            if factor == 0.0 {
                continue;
            }
            for (v, p) in row.iter_mut().zip(pivot.iter()) {
                *v -= factor * p;
            }
        }
    }
}

impl Index<(usize, usize)> for Tableau {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Tableau {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[i * self.cols + j]
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            let cells: Vec<String> = self.row(i).iter().map(|v| format!("{:>10.4}", v)).collect();
            writeln!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}

/// Builds the initial Big-M tableau with one artificial variable per row.
#[derive(Debug, Clone)]
pub struct TableauBuilder {
    big_m: f64,
}

impl Default for TableauBuilder {
    fn default() -> Self {
        Self { big_m: DEFAULT_BIG_M }
    }
}

impl TableauBuilder {
    pub fn new(big_m: f64) -> Self {
        Self { big_m }
    }

    pub fn big_m(&self) -> f64 {
        self.big_m
    }

    /// Layout: structural columns `0..n`, artificial columns `n..n+m`, RHS last.
    ///
    /// Rows with a negative right-hand side are negated so the starting basis
    /// (all artificials) is feasible. The objective row holds
    /// `c - M * sum(rows)`, which zeroes the reduced cost of every artificial.
    /// `A` must have full row rank; this is not checked.
    pub fn build(&self, problem: &StandardForm) -> Tableau {
        let m = problem.num_rows();
        let n = problem.num_columns();
        let big_m = self.big_m;
        let mut tableau = Tableau::zeros(m + 1, n + m + 1);
        let rhs_col = n + m;

        for i in 0..m {
            let sign = if problem.rhs[i] < 0.0 { -1.0 } else { 1.0 };
            for j in 0..n {
                tableau[(i + 1, j)] = sign * problem.matrix[(i, j)];
            }
            tableau[(i + 1, n + i)] = 1.0;
            tableau[(i + 1, rhs_col)] = sign * problem.rhs[i];
        }

        for j in 0..n {
            let column_sum: f64 = (1..=m).map(|i| tableau[(i, j)]).sum();
            tableau[(0, j)] = problem.objective[j] - big_m * column_sum;
        }
        tableau[(0, rhs_col)] = -big_m * problem.rhs.iter().map(|b| b.abs()).sum::<f64>();

        debug!("built {}x{} Big-M tableau (M = {:e})", m + 1, n + m + 1, big_m);
        tableau
    }
}
