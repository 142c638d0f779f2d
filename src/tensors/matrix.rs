use std::{
    fmt::{Display, Write},
    ops::{Index, IndexMut},
    slice::Chunks,
};

use smallvec::SmallVec;
use thiserror::Error;

use crate::domains::rational::{Rational, RationalError, Scalar};

/// A dense matrix of [Rational]s, stored row by row.
///
/// Matrices up to `6x6` (a five-variable augmented system) are stored inline.
#[derive(Clone, Hash, PartialEq, Eq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Vec<Rational>>", into = "Vec<Vec<Rational>>")
)]
pub struct Matrix {
    pub(crate) data: SmallVec<[Rational; 36]>,
    pub(crate) nrows: u32,
    pub(crate) ncols: u32,
}

/// Errors that can occur when performing matrix operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("The rows of the matrix do not all have the same length")]
    NotRectangular,
    #[error("The shape of the matrix is not compatible")]
    ShapeMismatch,
    #[error("The matrix is not square")]
    NotSquare,
    #[error("The matrix is singular")]
    Singular,
    #[error("Zero pivot encountered at position {index}")]
    ZeroPivot { index: u32 },
    #[error("The matrix is not in reduced row echelon form")]
    NotReduced,
    #[error("The system is inconsistent")]
    Inconsistent,
    #[error(
        "The system is underdetermined: rank {rank} for {unknowns} unknowns, free variables {free_variables:?}"
    )]
    Underdetermined {
        rank: u32,
        unknowns: u32,
        free_variables: Vec<u32>,
    },
    #[error(transparent)]
    Arithmetic(#[from] RationalError),
}

impl Matrix {
    /// Create a new zeroed matrix with `nrows` rows and `ncols` columns.
    pub fn new(nrows: u32, ncols: u32) -> Matrix {
        Matrix {
            data: (0..nrows as usize * ncols as usize)
                .map(|_| Rational::zero())
                .collect(),
            nrows,
            ncols,
        }
    }

    /// Create a new square matrix with `nrows` rows and ones on the main diagonal and zeroes elsewhere.
    pub fn identity(nrows: u32) -> Matrix {
        let mut m = Matrix::new(nrows, nrows);
        for i in 0..nrows {
            m[(i, i)] = Rational::one();
        }
        m
    }

    /// Convert a linear representation of a matrix to a `Matrix`.
    pub fn from_linear(data: Vec<Rational>, nrows: u32, ncols: u32) -> Result<Matrix, MatrixError> {
        if data.len() != nrows as usize * ncols as usize {
            return Err(MatrixError::ShapeMismatch);
        }

        Ok(Matrix {
            data: data.into(),
            nrows,
            ncols,
        })
    }

    /// Create a new matrix from a 2-dimensional vector of rationals.
    pub fn from_nested_vec(matrix: Vec<Vec<Rational>>) -> Result<Matrix, MatrixError> {
        let nrows = matrix.len() as u32;
        let ncols = matrix.first().map(|r| r.len()).unwrap_or(0);

        let mut data = SmallVec::with_capacity(nrows as usize * ncols);
        for row in matrix {
            if row.len() != ncols {
                return Err(MatrixError::NotRectangular);
            }

            data.extend(row);
        }

        Ok(Matrix {
            data,
            nrows,
            ncols: ncols as u32,
        })
    }

    /// Create a new matrix from rows of integers, decimals or rationals.
    /// Every entry is coerced to an exact [Rational].
    pub fn from_scalars<S: Into<Scalar>>(matrix: Vec<Vec<S>>) -> Result<Matrix, MatrixError> {
        let rows = matrix
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|e| e.into().to_rational())
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Matrix::from_nested_vec(rows)
    }

    /// Return the number of rows.
    pub fn nrows(&self) -> usize {
        self.nrows as usize
    }

    /// Return the number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols as usize
    }

    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    /// Get the entries of row `r`.
    pub fn row(&self, r: u32) -> &[Rational] {
        let start = (r * self.ncols) as usize;
        &self.data[start..start + self.ncols as usize]
    }

    pub fn row_iter(&self) -> Chunks<'_, Rational> {
        self.data.chunks(self.ncols.max(1) as usize)
    }

    /// Return a transposed copy of the matrix.
    pub fn transpose(&self) -> Matrix {
        let mut m = Matrix::new(self.ncols, self.nrows);
        for r in 0..self.nrows {
            for c in 0..self.ncols {
                m[(c, r)] = self[(r, c)];
            }
        }
        m
    }

    /// Append the columns of `rhs` to the right of `self`.
    pub fn augment(&self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        if self.nrows != rhs.nrows {
            return Err(MatrixError::ShapeMismatch);
        }

        let mut data = SmallVec::with_capacity(self.data.len() + rhs.data.len());
        for r in 0..self.nrows {
            data.extend_from_slice(self.row(r));
            data.extend_from_slice(rhs.row(r));
        }

        Ok(Matrix {
            data,
            nrows: self.nrows,
            ncols: self.ncols + rhs.ncols,
        })
    }

    /// Copy the columns in `range`.
    pub fn columns(&self, range: std::ops::Range<u32>) -> Matrix {
        let width = range.end.saturating_sub(range.start);
        let mut data = SmallVec::with_capacity(self.nrows as usize * width as usize);
        for r in 0..self.nrows {
            data.extend_from_slice(&self.row(r)[range.start as usize..range.end as usize]);
        }

        Matrix {
            data,
            nrows: self.nrows,
            ncols: width,
        }
    }

    /// Interpret the matrix as an augmented system and copy the coefficient block,
    /// i.e., every column except the last.
    pub fn coefficients(&self) -> Matrix {
        self.columns(0..self.ncols.saturating_sub(1))
    }

    pub fn to_nested_vec(&self) -> Vec<Vec<Rational>> {
        (0..self.nrows).map(|r| self.row(r).to_vec()).collect()
    }

    /// Get the decimal approximation of every entry.
    pub fn to_f64(&self) -> Vec<Vec<f64>> {
        (0..self.nrows)
            .map(|r| self.row(r).iter().map(|e| e.to_f64()).collect())
            .collect()
    }

    /// Swap row `a` and row `b`.
    pub fn swap_rows(&mut self, a: u32, b: u32) {
        if a == b {
            return;
        }

        for l in 0..self.ncols {
            self.data
                .swap((self.ncols * a + l) as usize, (self.ncols * b + l) as usize);
        }
    }

    /// Multiply every entry of row `r` by `factor`.
    pub fn scale_row(&mut self, r: u32, factor: &Rational) -> Result<(), RationalError> {
        for l in 0..self.ncols {
            self[(r, l)] = self[(r, l)].checked_mul(factor)?;
        }
        Ok(())
    }

    /// Replace row `target` by `row(target) - factor * row(source)`.
    pub fn sub_scaled_row(
        &mut self,
        target: u32,
        source: u32,
        factor: &Rational,
    ) -> Result<(), RationalError> {
        for l in 0..self.ncols {
            let s = self[(source, l)].checked_mul(factor)?;
            self[(target, l)] = self[(target, l)].checked_sub(s)?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<Vec<Rational>>> for Matrix {
    type Error = MatrixError;

    fn try_from(value: Vec<Vec<Rational>>) -> Result<Self, Self::Error> {
        Matrix::from_nested_vec(value)
    }
}

impl From<Matrix> for Vec<Vec<Rational>> {
    fn from(m: Matrix) -> Self {
        m.to_nested_vec()
    }
}

impl Index<(u32, u32)> for Matrix {
    type Output = Rational;

    /// Get the `i`th row and `j`th column of the matrix, where `index=(i,j)`.
    #[inline]
    fn index(&self, index: (u32, u32)) -> &Self::Output {
        &self.data[(index.0 * self.ncols + index.1) as usize]
    }
}

impl IndexMut<(u32, u32)> for Matrix {
    /// Get the `i`th row and `j`th column of the matrix, where `index=(i,j)`.
    #[inline]
    fn index_mut(&mut self, index: (u32, u32)) -> &mut Rational {
        &mut self.data[(index.0 * self.ncols + index.1) as usize]
    }
}

impl Display for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_char('{')?;
        for r in 0..self.nrows {
            f.write_char('{')?;
            for (ci, c) in self.row(r).iter().enumerate() {
                write!(f, "{}", c)?;
                if ci + 1 < self.ncols as usize {
                    f.write_char(',')?;
                }
            }
            f.write_char('}')?;
            if r + 1 < self.nrows {
                f.write_char(',')?;
            }
        }
        f.write_char('}')
    }
}
