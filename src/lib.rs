//! Rowreduce solves systems of linear equations with exact rational arithmetic
//! and records every row operation it performs.
//!
//! It can bring augmented matrices in row echelon form (Gaussian elimination with
//! partial pivoting) or reduced row echelon form (Gauss-Jordan elimination),
//! extract solutions, classify systems as having a unique solution, infinitely many or none,
//! and compute exact determinants, inverses and LU decompositions.
//!
//! For example:
//!
//! ```
//! use rowreduce::{domains::rational::Rational, tensors::matrix::Matrix};
//!
//! fn main() {
//!     let system = Matrix::from_scalars(vec![
//!         vec![2, 1, 3, 1],
//!         vec![3, 2, 1, 4],
//!         vec![1, -1, 2, 3],
//!     ])
//!     .unwrap();
//!
//!     let r = system.row_echelon().unwrap();
//!     for step in &r.steps {
//!         println!("{}", step);
//!     }
//!
//!     let x = r.matrix.back_substitute().unwrap();
//!     assert_eq!(x, [3, -2, -1].map(Rational::from));
//! }
//! ```
//!
//! The elimination functions log at the `debug` and `trace` levels through [tracing].

pub mod domains;
pub mod tensors;
pub mod utils;
