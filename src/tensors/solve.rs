//! Extract the solution of a linear system from its echelon forms.
//!
//! The extractors never guess: a system with free variables results in
//! [MatrixError::Underdetermined] and a contradictory system in
//! [MatrixError::Inconsistent]. Use [Matrix::solve] to get a parametrized
//! solution of an underdetermined system instead.

use tracing::{debug, instrument};

use crate::domains::rational::Rational;

use super::{
    classify::{Classification, Ranks},
    elimination::{Elimination, EliminationSettings},
    matrix::{Matrix, MatrixError},
};

/// The solution set of a linear system.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Solution {
    Unique(Vec<Rational>),
    /// A particular solution, in which every free variable is set to zero.
    Infinite {
        particular: Vec<Rational>,
        free_variables: Vec<u32>,
    },
    None,
}

impl Solution {
    pub fn classification(&self) -> Classification {
        match self {
            Solution::Unique(_) => Classification::Unique,
            Solution::Infinite { .. } => Classification::Infinite,
            Solution::None => Classification::None,
        }
    }

    /// Get a solution vector, if the system is consistent.
    pub fn values(&self) -> Option<&[Rational]> {
        match self {
            Solution::Unique(v) => Some(v),
            Solution::Infinite { particular, .. } => Some(particular),
            Solution::None => None,
        }
    }
}

/// The solution of a system together with the elimination that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolvedSystem {
    pub solution: Solution,
    pub elimination: Elimination,
}

/// For every row, the first column among the first `unknowns` that has an admissible entry.
fn pivot_columns(m: &Matrix, unknowns: u32, settings: &EliminationSettings) -> Vec<Option<u32>> {
    (0..m.nrows)
        .map(|r| (0..unknowns).find(|&c| !settings.is_negligible(&m[(r, c)])))
        .collect()
}

fn free_variables(m: &Matrix, unknowns: u32, settings: &EliminationSettings) -> Vec<u32> {
    let pivots = pivot_columns(m, unknowns, settings);
    (0..unknowns)
        .filter(|c| !pivots.contains(&Some(*c)))
        .collect()
}

impl Matrix {
    /// Read off the solution of an augmented system in reduced row echelon form:
    /// the `i`th unknown is the last entry of row `i`.
    ///
    /// Returns [MatrixError::NotReduced] if the coefficient block does not start with an identity block,
    /// or if a row below that block is not zero.
    pub fn solution_from_reduced(&self) -> Result<Vec<Rational>, MatrixError> {
        self.solution_from_reduced_with(&EliminationSettings::default())
    }

    pub fn solution_from_reduced_with(
        &self,
        settings: &EliminationSettings,
    ) -> Result<Vec<Rational>, MatrixError> {
        let ranks = Ranks::of_echelon(self, settings);
        let unknowns = ranks.unknowns;

        match ranks.classification() {
            Classification::None => {
                debug!("Refusing to extract a solution from inconsistent system {}", self);
                return Err(MatrixError::Inconsistent);
            }
            Classification::Infinite => {
                let free_variables = free_variables(self, unknowns, settings);
                debug!(
                    "Refusing to extract a solution: free variables {:?}",
                    free_variables
                );
                return Err(MatrixError::Underdetermined {
                    rank: ranks.coefficient,
                    unknowns,
                    free_variables,
                });
            }
            Classification::Unique => {}
        }

        for r in 0..unknowns {
            for c in 0..unknowns {
                let e = &self[(r, c)];
                if (r == c && !e.is_one()) || (r != c && !settings.is_negligible(e)) {
                    return Err(MatrixError::NotReduced);
                }
            }
        }

        for r in unknowns..self.nrows {
            if self.row(r).iter().any(|e| !settings.is_negligible(e)) {
                return Err(MatrixError::NotReduced);
            }
        }

        Ok((0..unknowns).map(|r| self[(r, unknowns)]).collect())
    }

    /// Solve an augmented system in row echelon form by back substitution.
    ///
    /// If a diagonal entry is negligible or the matrix is not upper triangular, the system
    /// is reduced further to decide whether it is inconsistent or underdetermined.
    pub fn back_substitute(&self) -> Result<Vec<Rational>, MatrixError> {
        self.back_substitute_with(&EliminationSettings::default())
    }

    #[instrument(level = "trace", skip_all, fields(matrix = %self))]
    pub fn back_substitute_with(
        &self,
        settings: &EliminationSettings,
    ) -> Result<Vec<Rational>, MatrixError> {
        let n = self.ncols.saturating_sub(1);

        if let Some(x) = self.try_back_substitute(n, settings)? {
            return Ok(x);
        }

        debug!("Back substitution is not possible, reducing {} further", self);
        let reduced = self.reduced_row_echelon_with(settings)?;
        reduced.matrix.solution_from_reduced_with(settings)
    }

    /// Back substitute over the diagonal. Returns `None` when the system is not
    /// a square upper triangular system with an admissible diagonal followed by zero rows.
    fn try_back_substitute(
        &self,
        n: u32,
        settings: &EliminationSettings,
    ) -> Result<Option<Vec<Rational>>, MatrixError> {
        if self.nrows < n {
            return Ok(None);
        }

        for r in n..self.nrows {
            if self.row(r).iter().any(|e| !settings.is_negligible(e)) {
                return Ok(None);
            }
        }

        let mut x = vec![Rational::zero(); n as usize];
        for i in (0..n).rev() {
            let d = self[(i, i)];
            if settings.is_negligible(&d)
                || (0..i).any(|j| !settings.is_negligible(&self[(i, j)]))
            {
                return Ok(None);
            }

            let mut sum = self[(i, n)];
            for j in i + 1..n {
                sum = sum.checked_sub(self[(i, j)].checked_mul(x[j as usize])?)?;
            }
            x[i as usize] = sum.checked_div(d)?;
        }

        Ok(Some(x))
    }

    /// Solve the augmented system `self` using Gauss-Jordan elimination.
    ///
    /// # Examples
    ///
    /// ```
    /// use rowreduce::tensors::{matrix::Matrix, solve::Solution};
    ///
    /// let system = Matrix::from_scalars(vec![vec![1, 2, 5], vec![3, 4, 6]]).unwrap();
    /// let r = system.solve().unwrap();
    /// assert_eq!(
    ///     r.solution,
    ///     Solution::Unique(vec![(-4).into(), "9/2".parse().unwrap()])
    /// );
    /// ```
    pub fn solve(&self) -> Result<SolvedSystem, MatrixError> {
        self.solve_with(&EliminationSettings::default())
    }

    #[instrument(level = "trace", skip_all, fields(matrix = %self))]
    pub fn solve_with(&self, settings: &EliminationSettings) -> Result<SolvedSystem, MatrixError> {
        let elimination = self.reduced_row_echelon_with(settings)?;
        let m = &elimination.matrix;
        let ranks = Ranks::of_echelon(m, settings);
        let unknowns = ranks.unknowns;

        let solution = match ranks.classification() {
            Classification::None => Solution::None,
            c => {
                let mut x = vec![Rational::zero(); unknowns as usize];
                for (r, p) in pivot_columns(m, unknowns, settings).into_iter().enumerate() {
                    if let Some(p) = p {
                        x[p as usize] = m[(r as u32, unknowns)].checked_div(m[(r as u32, p)])?;
                    }
                }

                if c == Classification::Unique {
                    Solution::Unique(x)
                } else {
                    Solution::Infinite {
                        particular: x,
                        free_variables: free_variables(m, unknowns, settings),
                    }
                }
            }
        };

        debug!("Solution: {:?}", solution);
        Ok(SolvedSystem {
            solution,
            elimination,
        })
    }
}

#[cfg(test)]
mod test {
    use crate::{
        domains::rational::Rational,
        tensors::{classify::Classification, matrix::Matrix},
    };

    use super::{MatrixError, Solution};

    fn rationals(v: &[i64]) -> Vec<Rational> {
        v.iter().map(|&x| x.into()).collect()
    }

    #[test]
    fn back_substitution() {
        let a = Matrix::from_scalars(vec![vec![2, 1, 3, 1], vec![3, 2, 1, 4], vec![1, -1, 2, 3]])
            .unwrap();
        let x = a.row_echelon().unwrap().matrix.back_substitute().unwrap();
        assert_eq!(x, rationals(&[3, -2, -1]));

        for r in a.row_iter() {
            let lhs = r[0] * x[0] + r[1] * x[1] + r[2] * x[2];
            assert_eq!(lhs, r[3]);
        }
    }

    #[test]
    fn back_substitution_overdetermined() {
        let a = Matrix::from_scalars(vec![vec![1, 1], vec![2, 2], vec![3, 3]]).unwrap();
        let x = a.row_echelon().unwrap().matrix.back_substitute().unwrap();
        assert_eq!(x, rationals(&[1]));
    }

    #[test]
    fn back_substitution_underdetermined() {
        let a = Matrix::from_scalars(vec![vec![1, 1, 2], vec![0, 0, 0]]).unwrap();
        assert_eq!(
            a.back_substitute(),
            Err(MatrixError::Underdetermined {
                rank: 1,
                unknowns: 2,
                free_variables: vec![1]
            })
        );

        let a = Matrix::from_scalars(vec![vec![1, 1, 2]]).unwrap();
        assert!(matches!(
            a.back_substitute(),
            Err(MatrixError::Underdetermined { .. })
        ));
    }

    #[test]
    fn back_substitution_not_triangular() {
        // the entry below the diagonal must be eliminated before substituting
        let a = Matrix::from_scalars(vec![vec![1, 0, 1], vec![1, 1, 3]]).unwrap();
        assert_eq!(a.back_substitute().unwrap(), rationals(&[1, 2]));

        let a = Matrix::from_scalars(vec![vec![1, 0, 1], vec![1, 0, 2]]).unwrap();
        assert_eq!(a.back_substitute(), Err(MatrixError::Inconsistent));
    }

    #[test]
    fn back_substitution_inconsistent() {
        let a = Matrix::from_scalars(vec![vec![1, 1, 2], vec![0, 0, 5]]).unwrap();
        assert_eq!(a.back_substitute(), Err(MatrixError::Inconsistent));
    }

    #[test]
    fn from_reduced() {
        let a = Matrix::from_scalars(vec![vec![2, 1, 3, 1], vec![3, 2, 1, 4], vec![1, -1, 2, 3]])
            .unwrap();
        let r = a.reduced_row_echelon().unwrap();
        assert_eq!(
            r.matrix.solution_from_reduced().unwrap(),
            rationals(&[3, -2, -1])
        );

        let not_reduced = Matrix::from_scalars(vec![vec![2, 0, 4], vec![0, 1, 3]]).unwrap();
        assert_eq!(
            not_reduced.solution_from_reduced(),
            Err(MatrixError::NotReduced)
        );

        let extra_row =
            Matrix::from_scalars(vec![vec![1, 0, 1], vec![0, 1, 2], vec![1, 1, 5]]).unwrap();
        assert_eq!(extra_row.solution_from_reduced(), Err(MatrixError::NotReduced));

        let zero_row =
            Matrix::from_scalars(vec![vec![1, 0, 1], vec![0, 1, 2], vec![0, 0, 0]]).unwrap();
        assert_eq!(
            zero_row.solution_from_reduced().unwrap(),
            rationals(&[1, 2])
        );

        let inconsistent = Matrix::from_scalars(vec![vec![1, 1, 0], vec![0, 0, 1]]).unwrap();
        assert_eq!(
            inconsistent.solution_from_reduced(),
            Err(MatrixError::Inconsistent)
        );
    }

    #[test]
    fn solve() {
        let a = Matrix::from_scalars(vec![vec![1, 2, 5], vec![3, 4, 6]]).unwrap();
        let r = a.solve().unwrap();
        assert_eq!(
            r.solution,
            Solution::Unique(vec![(-4).into(), Rational::new(9, 2).unwrap()])
        );
        assert_eq!(r.elimination.operation_count(), 5);
        assert_eq!(r.elimination.steps[0].matrix, a);
    }

    #[test]
    fn solve_infinite() {
        let a = Matrix::from_scalars(vec![vec![1, 2, 1, 4], vec![2, 4, 3, 9]]).unwrap();
        let r = a.solve().unwrap();
        assert_eq!(
            r.solution,
            Solution::Infinite {
                particular: rationals(&[3, 0, 1]),
                free_variables: vec![1]
            }
        );

        let x = r.solution.values().unwrap();
        for row in a.row_iter() {
            assert_eq!(row[0] * x[0] + row[1] * x[1] + row[2] * x[2], row[3]);
        }
    }

    #[test]
    fn solve_inconsistent() {
        let a = Matrix::from_scalars(vec![vec![1, 1, 2], vec![0, 0, 5]]).unwrap();
        let r = a.solve().unwrap();
        assert_eq!(r.solution, Solution::None);
        assert_eq!(r.solution.classification(), Classification::None);
        assert!(r.solution.values().is_none());
    }
}
