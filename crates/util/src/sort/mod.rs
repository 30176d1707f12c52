//! Sorting utilities.
//!
//! Stable in-place sorts used for sequence attributes, which are short and
//! usually nearly sorted.

mod insertion;

pub use insertion::{insertion_sort, insertion_sort_by};
