//! Error type for system construction and read-back.
//!
//! Only contract violations surface as errors. Infeasibility and
//! exhaustion are ordinary outcomes: `solve` reports them by returning
//! `Ok(false)` and latching the system in its terminal state.

use thiserror::Error;

/// Error type for misuse of a [`DiophantineSystem`](crate::DiophantineSystem).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SystemError {
    /// Insertion was attempted after the first `solve` call sealed the schema.
    #[error("system is sealed: rows and columns cannot be added after solve()")]
    Sealed,
    /// A row was inserted with a zero coefficient.
    #[error("row coefficient must be positive")]
    ZeroCoefficient,
    /// A row was inserted with inverted cardinality bounds.
    #[error("row bounds inverted: min_size {min_size} > max_size {max_size}")]
    InvertedBounds {
        /// The offending lower bound.
        min_size: u64,
        /// The offending upper bound.
        max_size: u64,
    },
    /// A column was inserted with value zero.
    #[error("column value must be positive")]
    ZeroColumnValue,
    /// A system total no longer fits in a machine word.
    #[error("arithmetic overflow while accumulating system totals")]
    Overflow,
    /// `solve` was first called on a system with no rows.
    #[error("system has no rows")]
    NoRows,
    /// `solve` was first called on a system with no columns.
    #[error("system has no columns")]
    NoColumns,
    /// Read-back was attempted without a current solution.
    #[error("no solution available: solve() has not returned true")]
    NoSolution,
    /// Read-back was attempted with an index outside the schema.
    #[error("index out of range: row {row}, column {column}")]
    IndexOutOfRange {
        /// The requested row (insertion order).
        row: usize,
        /// The requested column (insertion order).
        column: usize,
    },
}

/// Result alias for system operations.
pub type SystemResult<T> = Result<T, SystemError>;
