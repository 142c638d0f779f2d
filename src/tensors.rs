//! Matrices over the rationals and the linear algebra built on them.
//!
//! All algorithms work on a copy of their input and return the final matrix together with
//! an ordered trace of every row operation that was applied, see [Elimination](elimination::Elimination).

pub mod classify;
pub mod decompose;
pub mod elimination;
pub mod matrix;
pub mod solve;
