//! The Diophantine system: lifecycle, precompute, and the search driver.
//!
//! A system is built open (rows and columns appended freely), sealed by
//! the first `solve` call, and then enumerated one solution per call
//! until exhaustion. Precompute validates the global bounds, sorts the
//! rows by descending coefficient, accumulates the leave totals each
//! row must respect for the rows below it, and decides between the
//! simple and complex search paths. The search itself is a
//! two-directional walk over the sorted rows: advance on a successful
//! row selection, back up on failure, and absorb the final residual in
//! the last row.

use std::cmp::{max, min};
use std::fmt;

use tracing::{debug, trace};

use crate::arith::{ceil_div, floor_div};
use crate::error::{SystemError, SystemResult};
use crate::row::{ColumnVec, Row};
use crate::soluble::{self, Soluble};

/// Sentinel `max_size` meaning "no tighter bound than the column sum".
pub const UNBOUNDED: u64 = u64::MAX;

/// Which search path a sealed system uses.
///
/// A system is *simple* when its smallest-coefficient row has
/// coefficient one and can absorb the largest column value by itself;
/// any residual the other rows leave behind is then always consumable.
/// Otherwise the system is *complex* and carries solubility tables that
/// prune residuals no tail of rows can consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMode {
    /// Last sorted row absorbs arbitrary residuals; no tables needed.
    Simple,
    /// Solubility tables guide every partial allocation.
    Complex,
}

/// Configuration for a [`DiophantineSystem`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemConfig {
    /// Always take the complex path, even when the system qualifies as
    /// simple. The complex path is sound for simple systems; this knob
    /// exists to compare the two enumerations.
    pub force_complex: bool,
}

/// Counters accumulated while searching.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolveStats {
    /// Solutions produced so far.
    pub solutions: u64,
    /// Row frames opened with a find-first selection.
    pub frames_entered: u64,
    /// Frames rejected by the viability predicate before any selection.
    pub viability_prunes: u64,
    /// Selection-size escalations across all frames.
    pub size_escalations: u64,
}

/// Incremental solver for bounded non-negative integer linear systems.
///
/// Rows carry a positive coefficient and cardinality bounds; columns
/// carry positive target values. Each `solve` call yields the next
/// matrix assigning every row a count per column such that the
/// coefficient-weighted column sums hit the targets and every row total
/// stays within its bounds. See the crate docs for the full problem
/// statement.
pub struct DiophantineSystem {
    rows: Vec<Row>,
    columns: ColumnVec,
    row_permute: Vec<usize>,
    column_sum: u64,
    max_column_value: u64,
    sealed: bool,
    complex: bool,
    failed: bool,
    config: SystemConfig,
    stats: SolveStats,
}

impl DiophantineSystem {
    /// Create an open system, reserving room for the estimated schema.
    #[must_use]
    pub fn new(est_rows: usize, est_columns: usize) -> Self {
        Self::with_config(est_rows, est_columns, SystemConfig::default())
    }

    /// Create an open system with an explicit configuration.
    #[must_use]
    pub fn with_config(est_rows: usize, est_columns: usize, config: SystemConfig) -> Self {
        DiophantineSystem {
            rows: Vec::with_capacity(est_rows),
            columns: ColumnVec::with_capacity(est_columns),
            row_permute: Vec::new(),
            column_sum: 0,
            max_column_value: 0,
            sealed: false,
            complex: false,
            failed: false,
            config,
            stats: SolveStats::default(),
        }
    }

    /// Append a row with coefficient `coeff` and row-total bounds
    /// `[min_size, max_size]`. Pass [`UNBOUNDED`] to leave the upper
    /// bound open; precompute caps it by the column sum, which no row
    /// can exceed anyway.
    pub fn insert_row(&mut self, coeff: u64, min_size: u64, max_size: u64) -> SystemResult<()> {
        if self.sealed {
            return Err(SystemError::Sealed);
        }
        if coeff == 0 {
            return Err(SystemError::ZeroCoefficient);
        }
        if min_size > max_size {
            return Err(SystemError::InvertedBounds { min_size, max_size });
        }
        let name = self.rows.len();
        self.rows.push(Row::new(name, coeff, min_size, max_size));
        Ok(())
    }

    /// Append a column with target value `value`.
    pub fn insert_column(&mut self, value: u64) -> SystemResult<()> {
        if self.sealed {
            return Err(SystemError::Sealed);
        }
        if value == 0 {
            return Err(SystemError::ZeroColumnValue);
        }
        self.column_sum = self
            .column_sum
            .checked_add(value)
            .ok_or(SystemError::Overflow)?;
        self.columns.push(value);
        if value > self.max_column_value {
            self.max_column_value = value;
        }
        Ok(())
    }

    /// Number of rows inserted.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns inserted.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Which search path the sealed system uses, or `None` while open.
    #[must_use]
    pub fn mode(&self) -> Option<SolveMode> {
        if !self.sealed {
            None
        } else if self.complex {
            Some(SolveMode::Complex)
        } else {
            Some(SolveMode::Simple)
        }
    }

    /// Whether the system has reached its terminal state (infeasible at
    /// precompute, or all solutions emitted).
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.failed
    }

    /// Search counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> &SolveStats {
        &self.stats
    }

    /// Produce the next solution. Returns `Ok(true)` when one is
    /// available for read-back, `Ok(false)` when no (further) solution
    /// exists; after the first `Ok(false)` every later call returns
    /// `Ok(false)` without redoing work. The first call seals the
    /// schema.
    pub fn solve(&mut self) -> SystemResult<bool> {
        if self.failed {
            return Ok(false);
        }
        let find_first = !self.sealed;
        if find_first && !self.precompute()? {
            return Ok(false);
        }
        let found = if self.complex {
            self.solve_complex(find_first)
        } else {
            self.solve_simple(find_first)
        };
        if found {
            self.stats.solutions += 1;
            trace!(solutions = self.stats.solutions, "solution ready");
        } else {
            trace!("search exhausted");
        }
        Ok(found)
    }

    /// Read back one cell of the current solution, addressed by the
    /// insertion-order row index and column index.
    pub fn solution(&self, row: usize, column: usize) -> SystemResult<u64> {
        if !self.sealed || self.failed {
            return Err(SystemError::NoSolution);
        }
        if row >= self.rows.len() || column >= self.columns.len() {
            return Err(SystemError::IndexOutOfRange { row, column });
        }
        let sel = &self.rows[self.row_permute[row]].selection[column];
        Ok(sel.base + sel.extra)
    }

    /// Materialize the current solution as a matrix in insertion row
    /// order.
    pub fn solution_matrix(&self) -> SystemResult<Vec<Vec<u64>>> {
        if !self.sealed || self.failed {
            return Err(SystemError::NoSolution);
        }
        let n = self.columns.len();
        Ok((0..self.rows.len())
            .map(|row| {
                let r = &self.rows[self.row_permute[row]];
                (0..n).map(|j| r.selection[j].base + r.selection[j].extra).collect()
            })
            .collect())
    }

    /// Validate the schema, sort the rows, accumulate leave totals and
    /// pick the search mode. Returns `Ok(false)` (latching `failed`)
    /// when the system is trivially infeasible.
    fn precompute(&mut self) -> SystemResult<bool> {
        if self.rows.is_empty() {
            return Err(SystemError::NoRows);
        }
        if self.columns.is_empty() {
            return Err(SystemError::NoColumns);
        }
        self.sealed = true;

        let mut sum_of_min_products: u64 = 0;
        let mut sum_of_max_products: u64 = 0;
        for r in &mut self.rows {
            if r.max_size == UNBOUNDED {
                r.max_size = self.column_sum;
            }
            let (min_product, max_product) = match (
                r.min_size.checked_mul(r.coeff),
                r.max_size.checked_mul(r.coeff),
            ) {
                (Some(mn), Some(mx)) => (mn, mx),
                _ => {
                    self.failed = true;
                    return Err(SystemError::Overflow);
                }
            };
            r.min_product = min_product;
            r.max_product = max_product;
            sum_of_min_products = match sum_of_min_products.checked_add(min_product) {
                Some(s) => s,
                None => {
                    self.failed = true;
                    return Err(SystemError::Overflow);
                }
            };
            sum_of_max_products = match sum_of_max_products.checked_add(max_product) {
                Some(s) => s,
                None => {
                    self.failed = true;
                    return Err(SystemError::Overflow);
                }
            };
        }
        if sum_of_min_products > self.column_sum || sum_of_max_products < self.column_sum {
            debug!(
                min_demand = sum_of_min_products,
                max_supply = sum_of_max_products,
                column_sum = self.column_sum,
                "product sums rule the system out"
            );
            self.failed = true;
            return Ok(false);
        }

        // Descending coefficient, ascending size cap; the stable sort
        // keeps full ties in insertion order, which fixes the
        // enumeration sequence.
        self.rows
            .sort_by(|a, b| b.coeff.cmp(&a.coeff).then(a.max_size.cmp(&b.max_size)));

        self.row_permute.resize(self.rows.len(), 0);
        let n_columns = self.columns.len();
        let mut min_total: u64 = 0;
        let mut max_total: u64 = 0;
        for (i, r) in self.rows.iter_mut().enumerate().rev() {
            self.row_permute[r.name] = i;
            r.min_leave = min_total;
            r.max_leave = max_total;
            r.selection.clear();
            r.selection.resize(n_columns, Default::default());
            min_total += r.min_product;
            max_total += r.max_product;
        }

        let last = &self.rows[self.rows.len() - 1];
        let simple = !self.config.force_complex
            && last.coeff == 1
            && last.max_size >= self.max_column_value;
        if !simple {
            self.complex = true;
            soluble::build_tables(&mut self.rows, self.max_column_value);
            let top = &self.rows[0].soluble;
            for (j, &c) in self.columns.iter().enumerate() {
                if !top[c as usize].is_soluble() {
                    debug!(column = j, value = c, "column value insoluble; system ruled out");
                    self.failed = true;
                    return Ok(false);
                }
            }
        }
        debug!(
            rows = self.rows.len(),
            columns = n_columns,
            complex = self.complex,
            "system sealed"
        );
        Ok(true)
    }

    /// Pruning predicate: for every prefix of the still-unsolved rows,
    /// the columns at least as large as the prefix's smallest
    /// coefficient must add up to its minimum demand. The last row is
    /// exempt (it only absorbs).
    fn viable(&self, from: usize) -> bool {
        let mut need: u64 = 0;
        'prefixes: for r in &self.rows[from..self.rows.len() - 1] {
            if r.min_product == 0 {
                continue;
            }
            need += r.min_product;
            let mut have: u64 = 0;
            for &c in &self.columns {
                if c >= r.coeff {
                    have += c;
                    if have >= need {
                        continue 'prefixes;
                    }
                }
            }
            return false;
        }
        true
    }

    /// Open (find-first) or advance (find-next) the frame of a searched
    /// row in a simple system.
    fn solve_row_simple(&mut self, idx: usize, find_first: bool) -> bool {
        if find_first {
            self.stats.frames_entered += 1;
            if !self.viable(idx) {
                self.stats.viability_prunes += 1;
                return false;
            }
            let r = &mut self.rows[idx];
            let coeff = r.coeff;
            let mut column_total: u64 = 0;
            let mut max_sum: u64 = 0;
            for (j, sel) in r.selection.iter_mut().enumerate() {
                sel.extra = 0;
                let c = self.columns[j];
                column_total += c;
                let cap = c / coeff;
                sel.max_extra = cap;
                max_sum += cap;
            }
            let min_size = max(
                r.min_size,
                ceil_div(column_total.saturating_sub(r.max_leave), coeff),
            );
            // Later rows must be left at least their minimum demand.
            let spare = match column_total.checked_sub(r.min_leave) {
                Some(s) => s,
                None => return false,
            };
            let max_size = min(min(max_sum, r.max_size), floor_div(spare, coeff));
            if min_size > max_size {
                return false;
            }
            r.current_size = min_size;
            r.current_max_size = max_size;
        } else {
            let r = &mut self.rows[idx];
            if r.select_next(&mut self.columns) {
                return true;
            }
            if r.current_size == r.current_max_size {
                return false;
            }
            r.current_size += 1;
            self.stats.size_escalations += 1;
        }
        // A fresh selection at the current size always exists.
        self.rows[idx].select_first(&mut self.columns);
        true
    }

    /// Absorb the final residual with the unit-coefficient last row.
    fn solve_last_row_simple(&mut self) {
        let last = self.rows.len() - 1;
        let r = &mut self.rows[last];
        for (sel, &c) in r.selection.iter_mut().zip(self.columns.iter()) {
            sel.extra = c;
        }
    }

    fn solve_simple(&mut self, mut find_first: bool) -> bool {
        if self.rows.len() > 1 {
            let penultimate = self.rows.len() - 2;
            let mut i = if find_first { 0 } else { penultimate };
            loop {
                find_first = self.solve_row_simple(i, find_first);
                if find_first {
                    if i == penultimate {
                        break;
                    }
                    i += 1;
                } else {
                    if i == 0 {
                        break;
                    }
                    i -= 1;
                }
            }
        }
        if find_first {
            self.solve_last_row_simple();
        } else {
            self.failed = true;
        }
        find_first
    }

    /// Open or advance the frame of a searched row in a complex system.
    /// Opening fixes each column's base at the solubility minimum and
    /// debits it; the debits are credited back when the frame fails.
    fn solve_row_complex(&mut self, idx: usize, find_first: bool) -> bool {
        if find_first {
            self.stats.frames_entered += 1;
            if !self.viable(idx) {
                self.stats.viability_prunes += 1;
                return false;
            }
            let r = &mut self.rows[idx];
            let coeff = r.coeff;
            let mut column_total: u64 = 0;
            let mut min_sum: u64 = 0;
            let mut max_sum: u64 = 0;
            for (j, sel) in r.selection.iter_mut().enumerate() {
                let c = self.columns[j];
                let entry = r.soluble[c as usize];
                debug_assert!(entry.is_soluble(), "unsoluble residual reached a frame");
                sel.base = entry.min;
                sel.extra = 0;
                sel.max_extra = entry.max - entry.min;
                column_total += c;
                min_sum += entry.min;
                max_sum += entry.max;
            }
            let min_size = max(
                max(min_sum, r.min_size),
                ceil_div(column_total.saturating_sub(r.max_leave), coeff),
            );
            let spare = match column_total.checked_sub(r.min_leave) {
                Some(s) => s,
                None => return false,
            };
            let max_size = min(min(max_sum, r.max_size), floor_div(spare, coeff));
            if min_size > max_size {
                return false;
            }
            r.current_size = min_size - min_sum;
            r.current_max_size = max_size - min_sum;
            for (j, sel) in r.selection.iter().enumerate() {
                if sel.base > 0 {
                    self.columns[j] -= sel.base * coeff;
                }
            }
        }

        let (head, tail_rows) = self.rows.split_at_mut(idx + 1);
        let r = &mut head[idx];
        let tail: &[Soluble] = &tail_rows[0].soluble;

        if !find_first {
            if r.select_complex(&mut self.columns, tail, false) {
                return true;
            }
            r.current_size += 1;
            self.stats.size_escalations += 1;
        }
        while r.current_size <= r.current_max_size {
            if r.select_complex(&mut self.columns, tail, true) {
                return true;
            }
            r.current_size += 1;
            self.stats.size_escalations += 1;
        }

        // Frame failed: restore the columns to their entry values.
        for (j, sel) in r.selection.iter().enumerate() {
            if sel.base > 0 {
                self.columns[j] += sel.base * r.coeff;
                debug_assert!(self.columns[j] <= self.max_column_value);
            }
        }
        false
    }

    /// Absorb the final residual with the last row, reading the count
    /// off its own solubility table instead of dividing.
    fn solve_last_row_complex(&mut self) {
        let last = self.rows.len() - 1;
        let r = &mut self.rows[last];
        for (sel, &c) in r.selection.iter_mut().zip(self.columns.iter()) {
            let entry = r.soluble[c as usize];
            debug_assert!(entry.is_soluble(), "last row handed an unsoluble residual");
            sel.extra = entry.min;
        }
    }

    fn solve_complex(&mut self, mut find_first: bool) -> bool {
        if self.rows.len() > 1 {
            let penultimate = self.rows.len() - 2;
            let mut i = if find_first { 0 } else { penultimate };
            loop {
                find_first = self.solve_row_complex(i, find_first);
                if find_first {
                    if i == penultimate {
                        break;
                    }
                    i += 1;
                } else {
                    if i == 0 {
                        break;
                    }
                    i -= 1;
                }
            }
        }
        if find_first {
            self.solve_last_row_complex();
        } else {
            self.failed = true;
        }
        find_first
    }
}

impl fmt::Debug for DiophantineSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiophantineSystem")
            .field("rows", &self.rows.len())
            .field("columns", &self.columns.len())
            .field("column_sum", &self.column_sum)
            .field("max_column_value", &self.max_column_value)
            .field("mode", &self.mode())
            .field("exhausted", &self.failed)
            .field("stats", &self.stats)
            .finish()
    }
}
