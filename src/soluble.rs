//! Solubility tables for complex systems.
//!
//! A system is *complex* when the last sorted row cannot absorb an
//! arbitrary residual (its coefficient exceeds one, or its size cap is
//! smaller than the largest column value). For such systems each row
//! carries a table indexed by residual column value `v`: the entry
//! records the minimum and maximum number of units the rows from this
//! one downward can jointly assign to a single column whose residual is
//! exactly `v`, respecting the rows' size caps. The search consults the
//! *next* row's table before committing a partial allocation, pruning
//! every branch whose residual no tail of rows can consume.
//!
//! Tables are built once during precompute by a dynamic program that
//! walks the sorted rows bottom-up, and are read-only afterwards.

use crate::row::Row;

/// Achievable assignment counts for one residual column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Soluble {
    /// Minimum total count consuming the residual, or [`Soluble::INSOLUBLE`].
    pub(crate) min: u64,
    /// Maximum total count consuming the residual, or [`Soluble::INSOLUBLE`].
    pub(crate) max: u64,
}

impl Soluble {
    /// Out-of-band marker for residuals no tail of rows can consume.
    /// Real counts are bounded by the column sum, far below the sentinel.
    pub(crate) const INSOLUBLE: u64 = u64::MAX;

    /// Table entry with both counts marked insoluble.
    pub(crate) const NONE: Soluble = Soluble {
        min: Self::INSOLUBLE,
        max: Self::INSOLUBLE,
    };

    /// Whether any count consumes this residual.
    #[inline]
    pub(crate) fn is_soluble(self) -> bool {
        self.min != Self::INSOLUBLE
    }
}

/// Build the per-row solubility tables for `rows` (already sorted by
/// descending coefficient), covering residuals `0..=max_column_value`.
pub(crate) fn build_tables(rows: &mut [Row], max_column_value: u64) {
    debug_assert!(!rows.is_empty());
    let len = max_column_value as usize + 1;

    // Last row: exactly the multiples of its coefficient, up to its cap.
    {
        let last = rows.len() - 1;
        let r = &mut rows[last];
        r.soluble.clear();
        r.soluble.resize(len, Soluble::NONE);
        let step = r.coeff as usize;
        let mut count: u64 = 0;
        let mut j = 0usize;
        while j < len && count <= r.max_size {
            r.soluble[j] = Soluble {
                min: count,
                max: count,
            };
            count += 1;
            j += step;
        }
    }

    // Remaining rows bottom-up. `next` is the table under construction
    // for row `i`; `prev` is the finished table of row `i + 1`.
    for i in (0..rows.len() - 1).rev() {
        let coeff = rows[i].coeff;
        let max_size = rows[i].max_size;
        let step = coeff as usize;
        let (head, tail) = rows.split_at_mut(i + 1);
        let prev = &tail[0].soluble;
        let next = &mut head[i].soluble;
        next.clear();
        next.resize(len, Soluble::NONE);

        for j in 0..len {
            let chain = if j >= step { Some(next[j - step]) } else { None };
            match chain {
                Some(t) if t.is_soluble() && t.min < max_size => {
                    let min = if prev[j].is_soluble() { 0 } else { t.min + 1 };
                    let max = if t.max < max_size {
                        t.max + 1
                    } else {
                        // The chain below is capped by max_size: walk up from
                        // the deepest multiple until the remainder becomes
                        // soluble under the later rows.
                        let mut new_max = max_size;
                        let mut k = j - (max_size as usize) * step;
                        while !prev[k].is_soluble() {
                            new_max -= 1;
                            k += step;
                        }
                        debug_assert!(new_max >= t.min + 1, "max repair undershot min");
                        new_max
                    };
                    next[j] = Soluble { min, max };
                }
                _ => {
                    if prev[j].is_soluble() {
                        next[j] = Soluble { min: 0, max: 0 };
                    }
                }
            }
        }
    }
}
