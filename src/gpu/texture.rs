//! Backend-agnostic render-target texture abstraction.

use crate::gpu::backend::{
    AllocationError, Backend, ResourceAllocator, TextureDesc, ViewDesc,
};

/// A texture together with its render-target and shader-resource views.
///
/// The texture is created with render-attachment and texture-binding usage,
/// so one pass can write it and the next can sample it. Dropping the target
/// releases all three handles.
pub struct BlurTarget<B: Backend> {
    /// The underlying GPU texture.
    pub texture: B::Texture,
    /// View used when the texture is a draw output.
    pub render_target: B::RenderTargetView,
    /// View used when the texture is shader input.
    pub shader_resource: B::ShaderResourceView,
}

impl<B: Backend> BlurTarget<B> {
    /// Allocate a texture described by `desc` and both of its views.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError`] if the texture or either view is
    /// rejected. Anything created before the failure is released.
    pub fn allocate<A: ResourceAllocator<B> + ?Sized>(
        allocator: &A,
        desc: &TextureDesc,
    ) -> Result<Self, AllocationError> {
        let texture = allocator.create_texture(desc)?;
        let view = ViewDesc::of(desc);
        let render_target =
            allocator.create_render_target_view(&texture, &view)?;
        let shader_resource =
            allocator.create_shader_resource_view(&texture, &view)?;
        Ok(Self {
            texture,
            render_target,
            shader_resource,
        })
    }
}
