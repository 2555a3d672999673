//! Collaborator traits and the descriptor values exchanged with them.
//!
//! The blur stage never talks to a graphics API directly. It allocates
//! through a [`ResourceAllocator`], records draws on a [`DrawContext`], and
//! drives caller-owned [`ShaderPass`] objects. [`Backend`] ties the resource
//! types of one API together so all of these agree on what a texture or a
//! view is.
//!
//! Descriptors are plain immutable values built fresh for every allocation
//! call.

use std::fmt;

/// Resource types of one graphics backend.
pub trait Backend: Sized + 'static {
    /// Owned GPU texture.
    type Texture;
    /// View that binds a texture as a draw output.
    type RenderTargetView;
    /// Read-only view that binds a texture as shader input.
    type ShaderResourceView;
    /// Depth/stencil attachment view.
    type DepthStencilView;
    /// Sampler object.
    type Sampler;
    /// Command-recording context draws are issued against.
    type Context: DrawContext<Self>;
}

/// Creates GPU textures, views, and samplers.
///
/// Each call either returns a fully usable object or an
/// [`AllocationError`]; nothing is partially created.
pub trait ResourceAllocator<B: Backend> {
    /// Largest width or height a 2D texture may have on this device.
    fn max_dimension(&self) -> u32;

    /// Allocate a texture.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError`] if the device rejects the descriptor.
    fn create_texture(
        &self,
        desc: &TextureDesc,
    ) -> Result<B::Texture, AllocationError>;

    /// Create a render-target view over `texture`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError`] if the device rejects the view.
    fn create_render_target_view(
        &self,
        texture: &B::Texture,
        desc: &ViewDesc,
    ) -> Result<B::RenderTargetView, AllocationError>;

    /// Create a shader-resource view over `texture`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError`] if the device rejects the view.
    fn create_shader_resource_view(
        &self,
        texture: &B::Texture,
        desc: &ViewDesc,
    ) -> Result<B::ShaderResourceView, AllocationError>;

    /// Create a sampler.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError`] if the device rejects the descriptor.
    fn create_sampler(
        &self,
        desc: &SamplerDesc,
    ) -> Result<B::Sampler, AllocationError>;
}

/// Immediate-mode draw state on one command-recording context.
pub trait DrawContext<B: Backend> {
    /// Primitive topology used by subsequent draws.
    fn set_primitive_topology(&mut self, topology: wgpu::PrimitiveTopology);

    /// Bind output surfaces for subsequent draws.
    fn set_render_targets(
        &mut self,
        depth: Option<&B::DepthStencilView>,
        targets: &[&B::RenderTargetView],
    );

    /// Fill `target` with `color`.
    fn clear_render_target(
        &mut self,
        target: &B::RenderTargetView,
        color: wgpu::Color,
    );

    /// Viewport for subsequent draws.
    fn set_viewport(&mut self, viewport: Viewport);

    /// Scissor rectangle for subsequent draws.
    fn set_scissor_rect(&mut self, rect: ScissorRect);

    /// Issue a non-indexed draw with the current state.
    ///
    /// # Errors
    ///
    /// Returns [`DrawError`] if the bound state cannot be drawn with; nothing
    /// is recorded in that case.
    fn draw(
        &mut self,
        vertex_count: u32,
        start_vertex: u32,
    ) -> Result<(), DrawError>;
}

/// A caller-owned shader program plus its fixed-function state.
///
/// Passes are immutable: binding only writes into the context.
pub trait ShaderPass<B: Backend> {
    /// Format of the targets the program writes, if it is fixed.
    fn target_format(&self) -> Option<wgpu::TextureFormat> {
        None
    }

    /// Bind the blend, raster, and depth-stencil states selected by
    /// `states`.
    fn bind_pipeline_state(
        &self,
        context: &mut B::Context,
        states: PipelineStates,
    );

    /// Bind the shader program.
    fn bind_shader_program(&self, context: &mut B::Context);

    /// Bind `view` (or nothing) at the fragment texture `slot`.
    fn bind_texture(
        &self,
        context: &mut B::Context,
        slot: u32,
        view: Option<&B::ShaderResourceView>,
    );

    /// Bind `sampler` at the fragment sampler `slot`.
    fn bind_sampler(
        &self,
        context: &mut B::Context,
        slot: u32,
        sampler: &B::Sampler,
    );
}

/// Fixed-function state groups a [`ShaderPass`] should bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PipelineStates {
    /// Color blend state.
    pub blend: bool,
    /// Rasterizer state.
    pub raster: bool,
    /// Depth-stencil state.
    pub depth_stencil: bool,
}

impl PipelineStates {
    /// Every state group.
    pub const ALL: Self = Self {
        blend: true,
        raster: true,
        depth_stencil: true,
    };
}

/// Description of a single-mip 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    /// Texel format.
    pub format: wgpu::TextureFormat,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// How the texture may be bound.
    pub usage: wgpu::TextureUsages,
}

impl TextureDesc {
    /// A texture usable both as a draw output and as shader input.
    #[must_use]
    pub fn render_target(
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            format,
            width,
            height,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING,
        }
    }

    /// Whether either dimension is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Size as a wgpu extent.
    #[must_use]
    pub fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

/// Description of a 2D view over mip `mip_level` of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewDesc {
    /// View format (matches the texture for blur buffers).
    pub format: wgpu::TextureFormat,
    /// Mip the view starts at.
    pub mip_level: u32,
}

impl ViewDesc {
    /// Full view of mip 0 of a texture described by `desc`.
    #[must_use]
    pub fn of(desc: &TextureDesc) -> Self {
        Self {
            format: desc.format,
            mip_level: 0,
        }
    }
}

/// Hashable sampler description; identical descriptions may share one
/// sampler object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerDesc {
    /// Addressing along U, V, and W.
    pub address_mode: [wgpu::AddressMode; 3],
    /// Magnification filter.
    pub mag_filter: wgpu::FilterMode,
    /// Minification filter.
    pub min_filter: wgpu::FilterMode,
    /// Filter between mips.
    pub mipmap_filter: wgpu::FilterMode,
    /// Comparison function for depth samplers.
    pub compare: Option<wgpu::CompareFunction>,
}

impl SamplerDesc {
    /// ClampToEdge + Linear, the usual post-process sampler.
    pub const LINEAR_CLAMP: Self = Self {
        address_mode: [wgpu::AddressMode::ClampToEdge; 3],
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        compare: None,
    };
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self::LINEAR_CLAMP
    }
}

/// Draw viewport in target pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Near depth.
    pub min_depth: f32,
    /// Far depth.
    pub max_depth: f32,
}

impl Viewport {
    /// Viewport covering a whole `width` x `height` target.
    #[must_use]
    pub fn covering(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Scissor rectangle in target pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScissorRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ScissorRect {
    /// Scissor covering a whole `width` x `height` target.
    #[must_use]
    pub fn covering(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// A resource the device refused to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// Requested size exceeds the device limit.
    TooLarge {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// Device limit for either dimension.
        max: u32,
    },
    /// The device reported a validation or out-of-memory error.
    Rejected(String),
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { width, height, max } => {
                write!(f, "{width}x{height} exceeds device limit {max}")
            }
            Self::Rejected(msg) => write!(f, "device rejected request: {msg}"),
        }
    }
}

impl std::error::Error for AllocationError {}

/// Bound state a draw was rejected for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawError {
    /// No shader program is bound.
    NoProgram,
    /// The bound program was built for another topology.
    TopologyMismatch {
        /// Topology baked into the program.
        program: wgpu::PrimitiveTopology,
        /// Topology set on the context.
        requested: wgpu::PrimitiveTopology,
    },
    /// No render target is bound.
    NoTarget,
    /// A binding the program declares has nothing bound.
    UnboundSlot(u32),
}

impl fmt::Display for DrawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoProgram => write!(f, "no shader program bound"),
            Self::TopologyMismatch { program, requested } => write!(
                f,
                "program topology {program:?} does not match {requested:?}"
            ),
            Self::NoTarget => write!(f, "no render target bound"),
            Self::UnboundSlot(slot) => write!(f, "binding {slot} is unbound"),
        }
    }
}

impl std::error::Error for DrawError {}
