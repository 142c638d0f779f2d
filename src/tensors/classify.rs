use std::fmt::Display;

use tracing::debug;

use super::{
    elimination::EliminationSettings,
    matrix::{Matrix, MatrixError},
};

/// The solvability of a linear system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Classification {
    /// Exactly one solution.
    Unique,
    /// Infinitely many solutions: there are fewer pivots than unknowns.
    Infinite,
    /// No solution: some equation reduces to `0 = c` with `c` nonzero.
    None,
}

impl Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Unique => f.write_str("unique"),
            Classification::Infinite => f.write_str("infinite"),
            Classification::None => f.write_str("none"),
        }
    }
}

/// The ranks of the coefficient block and of the full augmented matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ranks {
    pub coefficient: u32,
    pub augmented: u32,
    pub unknowns: u32,
}

impl Ranks {
    /// Count the nonzero rows of an augmented matrix that is already in (reduced) row echelon form.
    ///
    /// A row counts towards the coefficient rank if it has an admissible entry
    /// outside of the last column, and towards the augmented rank if it has
    /// an admissible entry anywhere.
    pub fn of_echelon(m: &Matrix, settings: &EliminationSettings) -> Ranks {
        let unknowns = m.ncols.saturating_sub(1);

        let mut coefficient = 0;
        let mut augmented = 0;
        for r in 0..m.nrows {
            let row = m.row(r);
            let has_coefficient = row[..unknowns as usize]
                .iter()
                .any(|e| !settings.is_negligible(e));
            let has_any = has_coefficient || row.iter().any(|e| !settings.is_negligible(e));

            if has_coefficient {
                coefficient += 1;
            }
            if has_any {
                augmented += 1;
            }
        }

        Ranks {
            coefficient,
            augmented,
            unknowns,
        }
    }

    pub fn classification(&self) -> Classification {
        if self.coefficient < self.augmented {
            Classification::None
        } else if self.coefficient < self.unknowns {
            Classification::Infinite
        } else {
            Classification::Unique
        }
    }
}

impl Matrix {
    /// Classify the augmented system `self`, whose last column is the right-hand side,
    /// by first bringing it in reduced row echelon form.
    pub fn classify(&self) -> Result<Classification, MatrixError> {
        self.classify_with(&EliminationSettings::default())
    }

    pub fn classify_with(
        &self,
        settings: &EliminationSettings,
    ) -> Result<Classification, MatrixError> {
        let c = self.ranks_with(settings)?.classification();
        debug!("System {} has {} solution(s)", self, c);
        Ok(c)
    }

    /// Compute the ranks of the augmented system `self` after Gauss-Jordan elimination.
    pub fn ranks_with(&self, settings: &EliminationSettings) -> Result<Ranks, MatrixError> {
        let reduced = self.reduced_row_echelon_with(settings)?;
        Ok(Ranks::of_echelon(&reduced.matrix, settings))
    }

    /// Classify an augmented system that is already in echelon form by counting
    /// its nonzero rows, without performing any elimination.
    pub fn classify_echelon(&self) -> Classification {
        Ranks::of_echelon(self, &EliminationSettings::default()).classification()
    }
}

#[cfg(test)]
mod test {
    use crate::tensors::{elimination::EliminationSettings, matrix::Matrix};

    use super::{Classification, Ranks};

    #[test]
    fn classify() {
        let unique = Matrix::from_scalars(vec![vec![1, 0, 5], vec![0, 1, 3]]).unwrap();
        assert_eq!(unique.classify().unwrap(), Classification::Unique);

        let infinite = Matrix::from_scalars(vec![vec![1, 1, 2], vec![1, 1, 2]]).unwrap();
        assert_eq!(infinite.classify().unwrap(), Classification::Infinite);

        let none = Matrix::from_scalars(vec![vec![1, 1, 2], vec![0, 0, 5]]).unwrap();
        assert_eq!(none.classify().unwrap(), Classification::None);
    }

    #[test]
    fn classify_echelon() {
        let unique = Matrix::from_scalars(vec![vec![1, 0, 5], vec![0, 1, 3]]).unwrap();
        assert_eq!(unique.classify_echelon(), Classification::Unique);

        let infinite = Matrix::from_scalars(vec![vec![1, 1, 2], vec![0, 0, 0]]).unwrap();
        assert_eq!(infinite.classify_echelon(), Classification::Infinite);

        let none = Matrix::from_scalars(vec![vec![1, 1, 2], vec![0, 0, 5]]).unwrap();
        assert_eq!(none.classify_echelon(), Classification::None);

        // the rows are not reduced, so counting alone cannot see the dependency
        let raw = Matrix::from_scalars(vec![vec![1, 1, 2], vec![1, 1, 2]]).unwrap();
        assert_eq!(raw.classify_echelon(), Classification::Unique);
    }

    #[test]
    fn ranks() {
        let m = Matrix::from_scalars(vec![
            vec![1, 2, 3, 4],
            vec![2, 4, 6, 9],
            vec![1, 2, 3, 4],
        ])
        .unwrap();

        let ranks = m.ranks_with(&EliminationSettings::default()).unwrap();
        assert_eq!(
            ranks,
            Ranks {
                coefficient: 1,
                augmented: 2,
                unknowns: 3
            }
        );
        assert_eq!(ranks.classification(), Classification::None);
    }

    #[test]
    fn overdetermined() {
        let m = Matrix::from_scalars(vec![vec![1, 1], vec![2, 2], vec![3, 3]]).unwrap();
        assert_eq!(m.classify().unwrap(), Classification::Unique);

        let m = Matrix::from_scalars(vec![vec![1, 1], vec![2, 3]]).unwrap();
        assert_eq!(m.classify().unwrap(), Classification::None);
    }

    #[test]
    fn display() {
        assert_eq!(Classification::Unique.to_string(), "unique");
        assert_eq!(Classification::Infinite.to_string(), "infinite");
        assert_eq!(Classification::None.to_string(), "none");
    }
}
