use log::{debug, warn};
use nalgebra::linalg::ColPivQR;
use nalgebra::{DMatrix, DVector};

use crate::problem::StandardForm;

/// Tolerance for rank and column-space decisions
pub const DEFAULT_RANK_TOLERANCE: f64 = 1e-8;

/// Outcome of the feasibility analysis
#[derive(Debug, Clone, PartialEq)]
pub enum Feasibility {
    /// `b` is not in the column space of `A`; `residual` is `‖b - proj(b)‖`.
    Infeasible { residual: f64 },
    /// The system is consistent. `problem` has full row rank (possibly zero
    /// rows) and `kept_rows` maps its rows back to the input rows.
    Feasible {
        problem: StandardForm,
        kept_rows: Vec<usize>,
    },
}

impl Feasibility {
    pub fn is_feasible(&self) -> bool {
        matches!(self, Feasibility::Feasible { .. })
    }
}

/// Checks that `Ax = b` is consistent and reduces `A` to full row rank.
#[derive(Debug, Clone)]
pub struct FeasibilityAnalyzer {
    tolerance: f64,
    prune_rows: bool,
}

impl Default for FeasibilityAnalyzer {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_RANK_TOLERANCE,
            prune_rows: true,
        }
    }
}

impl FeasibilityAnalyzer {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }

    /// Enable or disable the zero/duplicate row pass. The QR rank pass runs
    /// either way, so disabling it only costs time.
    pub fn with_row_pruning(mut self, enabled: bool) -> Self {
        self.prune_rows = enabled;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn analyze(&self, problem: &StandardForm) -> Feasibility {
        let residual = self.column_space_residual(&problem.matrix, &problem.rhs);
        if residual > self.tolerance {
            warn!("system is infeasible: b is not in the column space of A (residual {:.3e})", residual);
            return Feasibility::Infeasible { residual };
        }

        let candidates: Vec<usize> = if self.prune_rows {
            self.prune(&problem.matrix)
        } else {
            (0..problem.num_rows()).collect()
        };
        if candidates.len() < problem.num_rows() {
            debug!("pruned {} zero or duplicate rows", problem.num_rows() - candidates.len());
        }

        if candidates.is_empty() {
            debug!("constraint matrix is empty after pruning, problem is unconstrained");
            return Feasibility::Feasible {
                problem: problem.select_rows(&[]),
                kept_rows: Vec::new(),
            };
        }

        let pruned = problem.matrix.select_rows(candidates.iter());
        let kept_rows: Vec<usize> = self
            .independent_rows(&pruned)
            .into_iter()
            .map(|i| candidates[i])
            .collect();
        if kept_rows.len() < candidates.len() {
            debug!("rank reduction dropped {} dependent rows", candidates.len() - kept_rows.len());
        }

        Feasibility::Feasible {
            problem: problem.select_rows(&kept_rows),
            kept_rows,
        }
    }

    /// Distance from `b` to the column space of `A`.
    ///
    /// The rank is the number of diagonal entries of `R` above the tolerance;
    /// column pivoting keeps those entries in front, so the first `rank`
    /// columns of `Q` span the column space.
    pub fn column_space_residual(&self, a: &DMatrix<f64>, b: &[f64]) -> f64 {
        let b = DVector::from_column_slice(b);
        let (m, n) = a.shape();
        if m == 0 {
            return 0.0;
        }
        if n == 0 {
            return b.norm();
        }

        let qr = ColPivQR::new(a.clone());
        let r = qr.r();
        let rank = (0..m.min(n)).filter(|&i| r[(i, i)].abs() > self.tolerance).count();
        debug!("numerical rank of A: {} ({}x{})", rank, m, n);
        if rank == 0 {
            return b.norm();
        }

        let q = qr.q();
        let q_r = q.columns(0, rank);
        let projection = &q_r * q_r.tr_mul(&b);
        (b - projection).norm()
    }

    /// Indices of rows that are neither zero nor a scalar multiple of an
    /// earlier row. The multiple test anchors on the first non-zero entry of
    /// the earlier row, so it can miss dependencies; the QR pass catches them.
    fn prune(&self, a: &DMatrix<f64>) -> Vec<usize> {
        let tol = self.tolerance;
        let valid: Vec<usize> = (0..a.nrows())
            .filter(|&i| a.row(i).iter().any(|v| v.abs() >= tol))
            .collect();

        let mut duplicates = vec![false; a.nrows()];
        for (k, &i) in valid.iter().enumerate() {
            let row_i = a.row(i);
            let Some(anchor) = row_i.iter().position(|v| v.abs() > tol) else {
                continue;
            };
            for &j in &valid[k + 1..] {
                let row_j = a.row(j);
                let ratio = row_j[(0, anchor)] / row_i[(0, anchor)];
                if row_j.iter().zip(row_i.iter()).all(|(x, y)| (x - ratio * y).abs() < tol) {
                    duplicates[j] = true;
                }
            }
        }

        valid.into_iter().filter(|&i| !duplicates[i]).collect()
    }

    /// Rows of `A` whose `R` diagonal entry exceeds the tolerance in a QR
    /// factorization of `Aᵀ` built one column at a time.
    ///
    /// A column with a negligible diagonal entry is skipped instead of taking
    /// a slot in `Q`, so every later row is still measured against the rows
    /// kept so far. Each column is orthogonalized twice.
    fn independent_rows(&self, a: &DMatrix<f64>) -> Vec<usize> {
        let mut q: Vec<DVector<f64>> = Vec::with_capacity(a.nrows().min(a.ncols()));
        let mut kept = Vec::new();
        for i in 0..a.nrows() {
            let mut v = a.row(i).transpose();
            for _ in 0..2 {
                for e in &q {
                    let r = e.dot(&v);
                    v.axpy(-r, e, 1.0);
                }
            }
            let r_ii = v.norm();
            if r_ii > self.tolerance {
                q.push(v / r_ii);
                kept.push(i);
            }
        }
        kept
    }
}
