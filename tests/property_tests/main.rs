//! Property-based tests for the Diophantine search engine.
//!
//! This harness covers:
//! - Conservation invariants on every emitted solution
//! - Determinism and uniqueness of the enumeration
//! - Exhaustiveness against a brute-force enumerator
//! - Simple/complex mode equivalence

mod solver_properties;
