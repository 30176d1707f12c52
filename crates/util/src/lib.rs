//! idoc-util - JSON value helpers for the idoc form models.
//!
//! The models store every attribute as a [`serde_json::Value`]; this crate
//! provides the comparisons and array manipulations they need to behave the
//! same way the browser client does.

pub mod js_array;
pub mod json_clone;
pub mod json_equal;
pub mod sort;

// Re-exports for convenience
pub use js_array::{default_compare, js_string, relative_index};
pub use json_clone::{clone, clone_map};
pub use json_equal::{deep_equal, deep_equal_opt};
pub use sort::{insertion_sort, insertion_sort_by};
