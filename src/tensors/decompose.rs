use tracing::{debug, instrument};

use crate::domains::rational::Rational;

use super::{
    elimination::{gauss_jordan, gaussian_elimination, Elimination, EliminationSettings},
    matrix::{Matrix, MatrixError},
};

/// The determinant of a matrix and the elimination used to compute it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Determinant {
    pub value: Rational,
    pub elimination: Elimination,
}

/// The inverse of a matrix and the Gauss-Jordan elimination of `[A | I]` that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inverse {
    pub matrix: Matrix,
    pub elimination: Elimination,
}

/// A factorization `A = LU` with a unit lower triangular `L` and an upper triangular `U`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LuDecomposition {
    pub lower: Matrix,
    pub upper: Matrix,
}

impl Matrix {
    /// Compute the determinant of a square matrix exactly, using Gaussian elimination
    /// with partial pivoting. Every row swap flips the sign.
    #[instrument(level = "trace", skip_all, fields(matrix = %self))]
    pub fn det(&self) -> Result<Determinant, MatrixError> {
        if !self.is_square() {
            return Err(MatrixError::NotSquare);
        }

        let (mut m, mut steps) = Elimination::start(self);
        let swaps = gaussian_elimination(
            &mut m,
            self.ncols,
            &mut steps,
            &EliminationSettings::exact(),
        )?;

        let mut value = if swaps % 2 == 0 {
            Rational::one()
        } else {
            Rational::from(-1)
        };
        for i in 0..m.nrows {
            value = value.checked_mul(m[(i, i)])?;
        }

        debug!("Determinant {} after {} swaps", value, swaps);
        Ok(Determinant {
            value,
            elimination: Elimination { matrix: m, steps },
        })
    }

    /// Compute the inverse of a square matrix exactly, by reducing `[A | I]` to `[I | A^-1]`.
    /// Returns [MatrixError::Singular] if the matrix is not invertible.
    #[instrument(level = "trace", skip_all, fields(matrix = %self))]
    pub fn inv(&self) -> Result<Inverse, MatrixError> {
        if !self.is_square() {
            return Err(MatrixError::NotSquare);
        }

        let n = self.nrows;
        let augmented = self.augment(&Matrix::identity(n))?;
        let (mut m, mut steps) = Elimination::start(&augmented);
        let pivots = gauss_jordan(&mut m, n, &mut steps, &EliminationSettings::exact())?;

        if pivots.len() < n as usize {
            debug!("Only {} of {} pivots: matrix is singular", pivots.len(), n);
            return Err(MatrixError::Singular);
        }

        Ok(Inverse {
            matrix: m.columns(n..2 * n),
            elimination: Elimination { matrix: m, steps },
        })
    }

    /// Compute the LU decomposition of a square matrix using Doolittle's algorithm, without pivoting.
    ///
    /// Returns [MatrixError::ZeroPivot] if a diagonal entry of `U` that is needed as a divisor
    /// vanishes, i.e., when a leading principal minor is zero.
    pub fn lu(&self) -> Result<LuDecomposition, MatrixError> {
        if !self.is_square() {
            return Err(MatrixError::NotSquare);
        }

        let n = self.nrows;
        let mut lower = Matrix::identity(n);
        let mut upper = Matrix::new(n, n);

        for i in 0..n {
            for k in i..n {
                let mut sum = self[(i, k)];
                for j in 0..i {
                    sum = sum.checked_sub(lower[(i, j)].checked_mul(upper[(j, k)])?)?;
                }
                upper[(i, k)] = sum;
            }

            if i + 1 == n {
                break;
            }

            let pivot = upper[(i, i)];
            if pivot.is_zero() {
                return Err(MatrixError::ZeroPivot { index: i });
            }

            for k in i + 1..n {
                let mut sum = self[(k, i)];
                for j in 0..i {
                    sum = sum.checked_sub(lower[(k, j)].checked_mul(upper[(j, i)])?)?;
                }
                lower[(k, i)] = sum.checked_div(pivot)?;
            }
        }

        Ok(LuDecomposition { lower, upper })
    }

    /// Get the rank of the matrix, computed exactly.
    pub fn rank(&self) -> Result<usize, MatrixError> {
        let mut m = self.clone();
        let mut steps = vec![];
        let pivots = gauss_jordan(
            &mut m,
            self.ncols,
            &mut steps,
            &EliminationSettings::exact(),
        )?;
        Ok(pivots.len())
    }
}
