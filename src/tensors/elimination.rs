//! Gaussian and Gauss-Jordan elimination with a trace of every row operation.
//!
//! Both algorithms use exact arithmetic, but select their pivots by comparing the
//! decimal approximation of the candidates (partial pivoting). This keeps the
//! entries small and makes the produced traces identical to those of a floating
//! point implementation of the same algorithm.

use std::fmt::Display;

use smartstring::{LazyCompact, SmartString};
use tracing::{debug, instrument};

use crate::domains::{rational::Rational, DEFAULT_EPSILON};

use super::matrix::{Matrix, MatrixError};

/// Settings for the elimination algorithms.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EliminationSettings {
    /// Entries whose decimal approximation is smaller than `epsilon` in absolute value
    /// are not used as pivots and are not eliminated.
    pub epsilon: f64,
}

impl Default for EliminationSettings {
    fn default() -> Self {
        EliminationSettings {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl EliminationSettings {
    /// Settings where only an exact zero is considered negligible.
    pub const fn exact() -> EliminationSettings {
        EliminationSettings { epsilon: 0. }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> EliminationSettings {
        self.epsilon = epsilon;
        self
    }

    /// Check if `e` should be treated as zero.
    #[inline]
    pub fn is_negligible(&self, e: &Rational) -> bool {
        e.is_zero() || e.is_near_zero(self.epsilon)
    }
}

/// A snapshot of the matrix after a row operation was applied.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step {
    /// The complete matrix after the operation.
    pub matrix: Matrix,
    /// A short notation of the operation, such as `R2 → R2 - (3/2)R1`.
    pub label: SmartString<LazyCompact>,
    pub description: String,
}

impl Step {
    pub const INITIAL: &'static str = "Initial";

    fn new(
        matrix: &Matrix,
        label: impl Into<SmartString<LazyCompact>>,
        description: String,
    ) -> Step {
        Step {
            matrix: matrix.clone(),
            label: label.into(),
            description,
        }
    }

    fn initial(matrix: &Matrix) -> Step {
        Step::new(matrix, Self::INITIAL, "Initial matrix".to_owned())
    }

    fn swap(matrix: &Matrix, a: u32, b: u32, col: u32) -> Step {
        Step::new(
            matrix,
            format!("R{} ↔ R{}", a + 1, b + 1),
            format!(
                "Swap row {} and row {} to use the entry of largest magnitude in column {} as pivot",
                a + 1,
                b + 1,
                col + 1
            ),
        )
    }

    fn eliminate(matrix: &Matrix, target: u32, source: u32, col: u32, factor: &Rational) -> Step {
        Step::new(
            matrix,
            format!("R{} → R{} - ({})R{}", target + 1, target + 1, factor, source + 1),
            format!(
                "Eliminate the entry in row {}, column {} by subtracting {} times row {}",
                target + 1,
                col + 1,
                factor,
                source + 1
            ),
        )
    }

    fn scale(matrix: &Matrix, row: u32, col: u32, factor: &Rational) -> Step {
        Step::new(
            matrix,
            format!("R{} → ({})R{}", row + 1, factor, row + 1),
            format!(
                "Multiply row {} by {} to make the pivot in column {} equal to 1",
                row + 1,
                factor,
                col + 1
            ),
        )
    }

    pub fn is_initial(&self) -> bool {
        self.label.as_str() == Self::INITIAL
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}\n{}", self.label, self.description, self.matrix)
    }
}

/// The result of an elimination: the final matrix and the ordered trace that led to it.
/// The first step is always the unmodified input.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Elimination {
    pub matrix: Matrix,
    pub steps: Vec<Step>,
}

impl Elimination {
    pub(crate) fn start(matrix: &Matrix) -> (Matrix, Vec<Step>) {
        (matrix.clone(), vec![Step::initial(matrix)])
    }

    /// The number of row operations, excluding the initial snapshot.
    pub fn operation_count(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }
}

impl Display for Elimination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, s) in self.steps.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", s)?;
        }
        Ok(())
    }
}

/// Find the row in `from_row..` with the largest entry in column `col`, by decimal magnitude.
/// Ties are resolved in favour of the first row.
fn select_pivot(m: &Matrix, col: u32, from_row: u32) -> u32 {
    let mut best = from_row;
    let mut best_abs = m[(from_row, col)].to_f64().abs();
    for k in from_row + 1..m.nrows {
        let v = m[(k, col)].to_f64().abs();
        if v > best_abs {
            best = k;
            best_abs = v;
        }
    }
    best
}

/// Bring the first `max_col` columns in echelon form in-place. The pivot of column `c`
/// is placed on row `c`; a column without an admissible pivot is skipped.
/// Returns the number of row swaps.
pub(crate) fn gaussian_elimination(
    m: &mut Matrix,
    max_col: u32,
    steps: &mut Vec<Step>,
    settings: &EliminationSettings,
) -> Result<u32, MatrixError> {
    let mut swaps = 0;
    for c in 0..max_col.min(m.nrows) {
        let p = select_pivot(m, c, c);
        if p != c {
            m.swap_rows(c, p);
            swaps += 1;
            steps.push(Step::swap(m, c, p, c));
        }

        let pivot = m[(c, c)];
        if settings.is_negligible(&pivot) {
            debug!("No pivot in column {}: skipping", c + 1);
            continue;
        }

        for k in c + 1..m.nrows {
            if settings.is_negligible(&m[(k, c)]) {
                continue;
            }

            let factor = m[(k, c)].checked_div(pivot)?;
            m.sub_scaled_row(k, c, &factor)?;
            steps.push(Step::eliminate(m, k, c, c, &factor));
        }
    }

    Ok(swaps)
}

/// Bring the first `max_col` columns in reduced row echelon form in-place.
/// Returns the columns that contain a pivot, in order.
pub(crate) fn gauss_jordan(
    m: &mut Matrix,
    max_col: u32,
    steps: &mut Vec<Step>,
    settings: &EliminationSettings,
) -> Result<Vec<u32>, MatrixError> {
    let mut pivots = vec![];
    let mut row = 0;
    for c in 0..max_col {
        if row >= m.nrows {
            break;
        }

        let p = select_pivot(m, c, row);
        if p != row {
            m.swap_rows(row, p);
            steps.push(Step::swap(m, row, p, c));
        }

        let pivot = m[(row, c)];
        if settings.is_negligible(&pivot) {
            debug!("Column {} has no pivot: variable is free", c + 1);
            continue;
        }

        if !pivot.is_one() {
            let inv = pivot.inv()?;
            m.scale_row(row, &inv)?;
            steps.push(Step::scale(m, row, c, &inv));
        }

        for k in 0..m.nrows {
            if k == row || settings.is_negligible(&m[(k, c)]) {
                continue;
            }

            let factor = m[(k, c)];
            m.sub_scaled_row(k, row, &factor)?;
            steps.push(Step::eliminate(m, k, row, c, &factor));
        }

        pivots.push(c);
        row += 1;
    }

    Ok(pivots)
}

impl Matrix {
    /// Bring an augmented matrix in row echelon form using Gaussian elimination
    /// with partial pivoting. The last column is treated as the right-hand side and is
    /// never used for pivoting. The rows are not normalized.
    pub fn row_echelon(&self) -> Result<Elimination, MatrixError> {
        self.row_echelon_with(&EliminationSettings::default())
    }

    #[instrument(level = "trace", skip_all, fields(matrix = %self))]
    pub fn row_echelon_with(
        &self,
        settings: &EliminationSettings,
    ) -> Result<Elimination, MatrixError> {
        let (mut m, mut steps) = Elimination::start(self);
        gaussian_elimination(&mut m, self.ncols.saturating_sub(1), &mut steps, settings)?;

        debug!("Row echelon form after {} operations: {}", steps.len() - 1, m);
        Ok(Elimination { matrix: m, steps })
    }

    /// Bring the matrix in reduced row echelon form using Gauss-Jordan elimination:
    /// every pivot becomes 1 and is the only nonzero entry in its column.
    pub fn reduced_row_echelon(&self) -> Result<Elimination, MatrixError> {
        self.reduced_row_echelon_with(&EliminationSettings::default())
    }

    #[instrument(level = "trace", skip_all, fields(matrix = %self))]
    pub fn reduced_row_echelon_with(
        &self,
        settings: &EliminationSettings,
    ) -> Result<Elimination, MatrixError> {
        let (mut m, mut steps) = Elimination::start(self);
        gauss_jordan(&mut m, self.ncols, &mut steps, settings)?;

        debug!(
            "Reduced row echelon form after {} operations: {}",
            steps.len() - 1,
            m
        );
        Ok(Elimination { matrix: m, steps })
    }
}
