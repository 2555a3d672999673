//! Post-processing effect passes.
//!
//! Provides the double-buffered separable blur and its bundled wgpu
//! shader passes.

pub mod blur_pass;
pub mod blur_stage;
