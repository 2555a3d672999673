//! Shared utilities.

pub mod color;
