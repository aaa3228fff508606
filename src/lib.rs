//! Incremental solver for the bounded Diophantine systems arising in
//! AC/ACU unification.
//!
//! Matching a term against a pattern modulo an associative-commutative
//! operator reduces to a counting problem: given row coefficients
//! `a_0..a_{m-1}` (one per pattern variable) and column targets
//! `c_0..c_{n-1}` (one per subject constant), find every matrix of
//! non-negative integers `x[i][j]` such that
//!
//! - `Σ_i a_i · x[i][j] = c_j` for every column `j`, and
//! - `lo_i ≤ Σ_j x[i][j] ≤ hi_i` for every row `i`,
//!
//! where `[lo_i, hi_i]` bound how many subject constants a variable may
//! take. `x[i][j]` is then the multiplicity of the `j`-th constant
//! assigned to the `i`-th variable.
//!
//! # Approach
//!
//! Rows are sorted by descending coefficient and solved one at a time,
//! enumerating each row's contribution as a multiset selection over the
//! residual columns and backtracking on dead ends. The search resumes in
//! place between calls, so solutions stream out one per
//! [`solve`](DiophantineSystem::solve) call in a deterministic order.
//!
//! Two pruning devices keep the walk far below naive enumeration:
//!
//! - A **viability** predicate rejects a frontier when the columns large
//!   enough for the remaining coefficients cannot cover the remaining
//!   rows' minimum demand.
//! - When the smallest-coefficient row cannot absorb arbitrary
//!   residuals, per-row **solubility tables** (a dynamic program over
//!   residual values) reject any partial allocation whose residual no
//!   tail of rows can consume.
//!
//! # Example
//!
//! ```
//! use ac_dioph::DiophantineSystem;
//!
//! let mut system = DiophantineSystem::new(1, 2);
//! system.insert_row(1, 3, 3).unwrap();
//! system.insert_column(1).unwrap();
//! system.insert_column(2).unwrap();
//!
//! assert!(system.solve().unwrap());
//! assert_eq!(system.solution(0, 0).unwrap(), 1);
//! assert_eq!(system.solution(0, 1).unwrap(), 2);
//! assert!(!system.solve().unwrap());
//! ```
//!
//! # References
//!
//! - Steven Eker, "Single Elementary Associative-Commutative Matching",
//!   Journal of Automated Reasoning 28(1), 2002.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod arith;
mod error;
mod row;
mod soluble;
mod system;

pub use error::{SystemError, SystemResult};
pub use system::{DiophantineSystem, SolveMode, SolveStats, SystemConfig, UNBOUNDED};
