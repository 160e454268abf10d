//! Internal support utilities for the derive.

pub mod diag;
pub mod utils;
