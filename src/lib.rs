// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Double-buffered, multi-pass separable blur for wgpu renderers.
//!
//! A [`BlurStage`] owns two equally sized textures and alternates them as
//! read source and write target while a vertical and then a horizontal
//! shader pass are applied a configurable number of times. The latest
//! result is always available through [`BlurStage::current_texture`].
//!
//! # Key entry points
//!
//! - [`BlurStage`] - the ping-pong blur, generic over a
//!   [`gpu::backend::Backend`]
//! - [`SeparableBlurPass`] - ready-made wgpu passes with a bundled shader
//! - [`gpu::wgpu_backend`] - resource allocator and draw context over wgpu
//! - [`options::Options`] - TOML configuration (iterations, sampler, clear
//!   color)
//! - [`parse_color`] - color strings used by the configuration
//!
//! # Architecture
//!
//! The stage never talks to a device directly. Textures and views come from
//! a [`gpu::backend::ResourceAllocator`], the sampler from a
//! [`gpu::sampler_registry::SamplerRegistry`], and every bind and draw goes
//! through a [`gpu::backend::DrawContext`]. The wgpu backend records each
//! draw as its own render pass on a command encoder the caller submits.

pub mod error;
pub mod gpu;
pub mod options;
pub mod renderer;
pub mod util;

pub use error::{BlurError, BlurResult};
pub use renderer::postprocess::blur_pass::{BlurDirection, SeparableBlurPass};
pub use renderer::postprocess::blur_stage::{BlurStage, RunStats};
pub use util::color::{parse_color, Color, ColorParseError};
