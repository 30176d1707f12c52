//! JSON cloning utilities.
//!
//! Payloads handed to the models are copied through here so that a model
//! never aliases the data it was built from.

mod clone;

pub use clone::{clone, clone_map};
