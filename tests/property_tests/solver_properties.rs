//! Engine behavior against a brute-force oracle on small systems.

use ac_dioph::{DiophantineSystem, SolveMode, SystemConfig};
use proptest::prelude::*;
use rustc_hash::FxHashSet;

type Matrix = Vec<Vec<u64>>;

#[derive(Debug, Clone)]
struct SmallSystem {
    /// (coeff, min_size, max_size) per row.
    rows: Vec<(u64, u64, u64)>,
    columns: Vec<u64>,
}

fn small_system_strategy() -> impl Strategy<Value = SmallSystem> {
    let row = (1u64..=3, 0u64..=2, 0u64..=4)
        .prop_map(|(coeff, min_size, slack)| (coeff, min_size, min_size + slack));
    (
        prop::collection::vec(row, 1..=3),
        prop::collection::vec(1u64..=5, 1..=3),
    )
        .prop_map(|(rows, columns)| SmallSystem { rows, columns })
}

fn build(case: &SmallSystem, config: SystemConfig) -> DiophantineSystem {
    let mut system =
        DiophantineSystem::with_config(case.rows.len(), case.columns.len(), config);
    for &(coeff, min_size, max_size) in &case.rows {
        system.insert_row(coeff, min_size, max_size).unwrap();
    }
    for &value in &case.columns {
        system.insert_column(value).unwrap();
    }
    system
}

fn enumerate(system: &mut DiophantineSystem, cap: usize) -> Vec<Matrix> {
    let mut out = Vec::new();
    while out.len() < cap && system.solve().unwrap() {
        out.push(system.solution_matrix().unwrap());
    }
    out
}

/// All per-row count vectors consuming exactly `target` under `coeffs`.
fn column_options(coeffs: &[u64], target: u64) -> Vec<Vec<u64>> {
    fn go(coeffs: &[u64], target: u64, acc: &mut Vec<u64>, out: &mut Vec<Vec<u64>>) {
        match coeffs.split_first() {
            None => {
                if target == 0 {
                    out.push(acc.clone());
                }
            }
            Some((&coeff, rest)) => {
                for count in 0..=target / coeff {
                    acc.push(count);
                    go(rest, target - count * coeff, acc, out);
                    acc.pop();
                }
            }
        }
    }
    let mut out = Vec::new();
    go(coeffs, target, &mut Vec::new(), &mut out);
    out
}

/// Every matrix satisfying the column equations and row bounds.
fn brute_force(case: &SmallSystem) -> FxHashSet<Matrix> {
    fn go(
        per_column: &[Vec<Vec<u64>>],
        rows: &[(u64, u64, u64)],
        col: usize,
        matrix: &mut Matrix,
        out: &mut FxHashSet<Matrix>,
    ) {
        if col == per_column.len() {
            let within_bounds = rows.iter().enumerate().all(|(i, &(_, lo, hi))| {
                let total: u64 = matrix[i].iter().sum();
                lo <= total && total <= hi
            });
            if within_bounds {
                out.insert(matrix.clone());
            }
            return;
        }
        for option in &per_column[col] {
            for (row, &count) in matrix.iter_mut().zip(option.iter()) {
                row.push(count);
            }
            go(per_column, rows, col + 1, matrix, out);
            for row in matrix.iter_mut() {
                row.pop();
            }
        }
    }

    let coeffs: Vec<u64> = case.rows.iter().map(|r| r.0).collect();
    let per_column: Vec<Vec<Vec<u64>>> = case
        .columns
        .iter()
        .map(|&value| column_options(&coeffs, value))
        .collect();
    let mut out = FxHashSet::default();
    let mut matrix = vec![Vec::new(); case.rows.len()];
    go(&per_column, &case.rows, 0, &mut matrix, &mut out);
    out
}

fn check_invariants(case: &SmallSystem, matrix: &Matrix) {
    for (j, &c) in case.columns.iter().enumerate() {
        let weighted: u64 = case
            .rows
            .iter()
            .zip(matrix.iter())
            .map(|(&(coeff, _, _), row)| coeff * row[j])
            .sum();
        assert_eq!(weighted, c, "mass balance broken in column {j}");
    }
    for (i, (&(_, lo, hi), row)) in case.rows.iter().zip(matrix.iter()).enumerate() {
        let total: u64 = row.iter().sum();
        assert!(lo <= total && total <= hi, "row {i} outside bounds");
    }
}

proptest! {
    /// The engine emits exactly the brute-force solution set, each
    /// solution once, and terminates.
    #[test]
    fn engine_matches_brute_force(case in small_system_strategy()) {
        let expected = brute_force(&case);
        let mut system = build(&case, SystemConfig::default());
        let solutions = enumerate(&mut system, expected.len() + 1);

        prop_assert_eq!(solutions.len(), expected.len(), "solution count mismatch");
        prop_assert!(system.is_exhausted());

        let mut seen: FxHashSet<Matrix> = FxHashSet::default();
        for matrix in &solutions {
            check_invariants(&case, matrix);
            prop_assert!(seen.insert(matrix.clone()), "duplicate solution");
            prop_assert!(expected.contains(matrix), "solution missed by brute force");
        }
    }

    /// Two identically built systems enumerate identical sequences.
    #[test]
    fn enumeration_is_deterministic(case in small_system_strategy()) {
        let mut first = build(&case, SystemConfig::default());
        let mut second = build(&case, SystemConfig::default());
        prop_assert_eq!(enumerate(&mut first, 400), enumerate(&mut second, 400));
    }

    /// Forcing the complex path on a simple system yields the same
    /// solution set (the order may differ).
    #[test]
    fn forced_complex_path_agrees_with_simple(case in small_system_strategy()) {
        let cap = brute_force(&case).len() + 1;
        let mut simple = build(&case, SystemConfig::default());
        let simple_solutions = enumerate(&mut simple, cap);
        if simple.mode() == Some(SolveMode::Simple) {
            let mut forced = build(
                &case,
                SystemConfig {
                    force_complex: true,
                },
            );
            prop_assert_eq!(forced.mode(), None);
            let forced_solutions = enumerate(&mut forced, cap);
            prop_assert_eq!(forced.mode(), Some(SolveMode::Complex));
            prop_assert_eq!(simple_solutions.len(), forced_solutions.len());
            let simple_set: FxHashSet<Matrix> = simple_solutions.iter().cloned().collect();
            let forced_set: FxHashSet<Matrix> = forced_solutions.iter().cloned().collect();
            prop_assert_eq!(simple_set, forced_set);
        }
    }

    /// Once `solve` reports exhaustion it keeps reporting it.
    #[test]
    fn exhaustion_latches(case in small_system_strategy()) {
        let cap = brute_force(&case).len() + 1;
        let mut system = build(&case, SystemConfig::default());
        let _ = enumerate(&mut system, cap);
        for _ in 0..3 {
            prop_assert_eq!(system.solve(), Ok(false));
        }
    }
}
