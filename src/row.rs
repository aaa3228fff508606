//! Row state and multiset selection.
//!
//! Each row of the sorted system owns its selection state: how many units
//! it currently assigns to each column, and the frame bookkeeping needed
//! to resume the enumeration in place between `solve` calls. Selecting a
//! row's contribution is a multiset-selection problem over the residual
//! columns; the two selectors below enumerate selections of a fixed size
//! in a deterministic earliest-first order, one for simple systems and
//! one threaded through the next row's solubility table.

use std::cmp::min;

use smallvec::SmallVec;

use crate::soluble::Soluble;

/// Inline capacity for per-column vectors. AC unification problems
/// rarely have more columns than this.
const INLINE_COLUMNS: usize = 8;

/// Residual column values, mutated in place during search.
pub(crate) type ColumnVec = SmallVec<[u64; INLINE_COLUMNS]>;

/// One cell of a row's current selection. The row's contribution to the
/// column is `base + extra`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Select {
    /// Fixed minimum count forced by solubility (zero in simple systems).
    pub(crate) base: u64,
    /// Variable count above `base` in the current frame.
    pub(crate) extra: u64,
    /// Upper bound for `extra` in the current frame.
    pub(crate) max_extra: u64,
}

/// A row of the system together with its resumable selection state.
#[derive(Debug, Default)]
pub(crate) struct Row {
    /// Original insertion index, used for read-back.
    pub(crate) name: usize,
    /// The row's weight: each assigned unit consumes this much of a column.
    pub(crate) coeff: u64,
    /// Minimum acceptable row total.
    pub(crate) min_size: u64,
    /// Maximum acceptable row total.
    pub(crate) max_size: u64,
    /// `min_size * coeff`.
    pub(crate) min_product: u64,
    /// `max_size * coeff`.
    pub(crate) max_product: u64,
    /// Sum of `min_product` over all rows after this one in sorted order.
    pub(crate) min_leave: u64,
    /// Sum of `max_product` over all rows after this one in sorted order.
    pub(crate) max_leave: u64,
    /// Current selection size (units above the bases) in this frame.
    pub(crate) current_size: u64,
    /// Largest selection size this frame will try.
    pub(crate) current_max_size: u64,
    /// Per-column selection state.
    pub(crate) selection: SmallVec<[Select; INLINE_COLUMNS]>,
    /// Solubility table for this row downward (complex systems only).
    pub(crate) soluble: Vec<Soluble>,
}

impl Row {
    pub(crate) fn new(name: usize, coeff: u64, min_size: u64, max_size: u64) -> Self {
        Row {
            name,
            coeff,
            min_size,
            max_size,
            ..Default::default()
        }
    }

    /// Distribute `undone` units over the columns earliest-first, debiting
    /// as we go. Callers guarantee the remaining capacity suffices.
    fn make_up(&mut self, columns: &mut [u64], mut undone: u64) {
        let mut j = 0;
        while undone > 0 {
            debug_assert!(j < columns.len(), "selection overran columns");
            let t = min(undone, self.selection[j].max_extra);
            if t > 0 {
                self.selection[j].extra = t;
                undone -= t;
                columns[j] -= t * self.coeff;
            }
            j += 1;
        }
    }

    /// First selection of `current_size` units. All `extra` values must be
    /// zero on entry; always succeeds.
    pub(crate) fn select_first(&mut self, columns: &mut [u64]) {
        let undone = self.current_size;
        self.make_up(columns, undone);
    }

    /// Next selection of `current_size` units, or `false` when the size is
    /// exhausted. Scans left to right, undoing cells until one can take a
    /// single additional unit, then refills the freed units earliest-first.
    /// On failure every `extra` has been unwound and the columns restored.
    pub(crate) fn select_next(&mut self, columns: &mut [u64]) -> bool {
        if self.current_size == 0 {
            return false;
        }
        let mut undone: u64 = 0;
        for j in 0..columns.len() {
            debug_assert!(self.selection[j].extra <= self.selection[j].max_extra);
            let t = self.selection[j].extra;
            if undone > 0 && t < self.selection[j].max_extra {
                self.selection[j].extra = t + 1;
                undone -= 1;
                columns[j] -= self.coeff;
                self.make_up(columns, undone);
                return true;
            }
            if t > 0 {
                self.selection[j].extra = 0;
                undone += t;
                columns[j] += t * self.coeff;
            }
        }
        false
    }

    /// Selection for complex systems, guided by the next row's solubility
    /// table `tail`: a committed column residual must stay soluble under
    /// the remaining rows. With `find_first` the selector builds the first
    /// selection of `current_size` units; otherwise it advances from the
    /// previous one. On failure every `extra` has been unwound and the
    /// columns restored.
    ///
    /// The selector alternates between a forward phase (allocate freed
    /// units earliest-first) and a backtrack phase (scan for a cell whose
    /// `extra` can grow while keeping the residual soluble); each phase
    /// hands control back to the other until a selection survives or the
    /// scan runs off the end.
    pub(crate) fn select_complex(
        &mut self,
        columns: &mut [u64],
        tail: &[Soluble],
        find_first: bool,
    ) -> bool {
        let n = columns.len();
        let mut undone;
        let mut forwarding;
        if find_first {
            undone = self.current_size;
            forwarding = true;
        } else {
            if self.current_size == 0 {
                return false;
            }
            undone = 0;
            forwarding = false;
        }

        loop {
            if forwarding {
                // A full allocation (extra == max_extra) needs no probe: the
                // table's max entry already guarantees the residual is
                // soluble under the later rows. Only partial allocations are
                // checked.
                let mut survived = true;
                let mut j = 0;
                while undone > 0 {
                    debug_assert!(j < n, "selection overran columns");
                    let t = self.selection[j].max_extra;
                    if t <= undone {
                        if t > 0 {
                            self.selection[j].extra = t;
                            undone -= t;
                            columns[j] -= t * self.coeff;
                        }
                    } else {
                        self.selection[j].extra = undone;
                        columns[j] -= undone * self.coeff;
                        undone = 0;
                        if !tail[columns[j] as usize].is_soluble() {
                            survived = false;
                        }
                    }
                    j += 1;
                }
                if survived {
                    return true;
                }
                forwarding = false;
            } else {
                let mut resumed = false;
                'scan: for j in 0..n {
                    debug_assert!(self.selection[j].extra <= self.selection[j].max_extra);
                    let t = self.selection[j].extra;
                    if undone > 0 && t < self.selection[j].max_extra {
                        let mut c = columns[j];
                        let limit = min(undone, self.selection[j].max_extra - t);
                        for e in 1..=limit {
                            debug_assert!(c >= self.coeff, "residual underflow");
                            c -= self.coeff;
                            if tail[c as usize].is_soluble() {
                                self.selection[j].extra = t + e;
                                columns[j] = c;
                                undone -= e;
                                resumed = true;
                                break 'scan;
                            }
                        }
                    }
                    if t > 0 {
                        self.selection[j].extra = 0;
                        undone += t;
                        columns[j] += t * self.coeff;
                    }
                }
                if !resumed {
                    return false;
                }
                forwarding = true;
            }
        }
    }
}
