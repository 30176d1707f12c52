//! JSON equality utilities.
//!
//! Provides the deep equality used for change detection.

mod deep_equal;

pub use deep_equal::{deep_equal, deep_equal_opt};
