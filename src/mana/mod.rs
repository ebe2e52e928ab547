// src/mana/mod.rs

//! Mana-weighted candidate selection.
//!
//! - [`selector`] holds [`WeightedSelector`], a pool supporting weighted
//!   sampling without replacement.
//! - [`fenwick`] is the prefix-sum tree the selector uses for `O(log n)`
//!   picks and removals.

pub mod fenwick;
pub mod selector;

pub use fenwick::FenwickTree;
pub use selector::WeightedSelector;
