//! GPU resource management for the blur stage.
//!
//! Backend-neutral collaborator traits, the ping-pong buffer pair, the
//! sampler cache, and the wgpu implementation of all of them.

/// Collaborator traits and the descriptor values they exchange.
pub mod backend;
/// Two-slot front/back container.
pub mod double_buffer;
/// Shared wgpu boilerplate helpers for screen-space pipelines.
pub mod pipeline_helpers;
/// Deduplicating sampler creation.
pub mod sampler_registry;
#[cfg(test)]
pub(crate) mod testing;
/// Render-target texture with both of its views.
pub mod texture;
/// wgpu implementation of the collaborator traits.
pub mod wgpu_backend;
