//! Double-buffered, multi-pass separable blur.
//!
//! Two equally sized textures alternate as read source and write target.
//! Each iteration swaps them first, so the previous result becomes the
//! input and the older buffer is overwritten. A run issues the vertical
//! iterations, then the horizontal ones, continuing the same ping-pong
//! chain. After any number of draws the latest image sits in the front slot,
//! which is what [`BlurStage::current_texture`] returns.

use std::ops::Range;
use std::sync::Arc;

use crate::error::{BlurError, BlurResult};
use crate::gpu::backend::{
    Backend, DrawContext, PipelineStates, ResourceAllocator, SamplerDesc,
    ScissorRect, ShaderPass, TextureDesc, Viewport,
};
use crate::gpu::double_buffer::DoubleBuffer;
use crate::gpu::sampler_registry::SamplerRegistry;
use crate::gpu::texture::BlurTarget;
use crate::options::BlurOptions;

/// Vertices of the full-screen triangle strip.
const QUAD_VERTEX_COUNT: u32 = 4;

/// Draws issued by one [`BlurStage::run`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStats {
    /// Vertical-pass draws.
    pub vertical_draws: u32,
    /// Horizontal-pass draws.
    pub horizontal_draws: u32,
}

impl RunStats {
    /// Draws across both directions.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.vertical_draws + self.horizontal_draws
    }
}

/// Ping-pong blur over a caller-supplied pair of shader passes.
///
/// The stage owns its two textures and holds a shared reference to one
/// sampler obtained from a [`SamplerRegistry`]. Shader passes are owned by
/// the caller; a direction without a pass is skipped.
pub struct BlurStage<B: Backend> {
    buffers: Option<DoubleBuffer<BlurTarget<B>>>,
    desc: TextureDesc,
    format: wgpu::TextureFormat,
    vertical: Option<Arc<dyn ShaderPass<B>>>,
    horizontal: Option<Arc<dyn ShaderPass<B>>>,
    texture_slot: u32,
    sampler_slot: u32,
    sampler: Arc<B::Sampler>,
    clear_color: Option<wgpu::Color>,
}

impl<B: Backend> BlurStage<B> {
    /// Create a stage with no buffers.
    ///
    /// `sampler_desc` is registered once here; the registry decides whether
    /// the sampler is shared. Textures are allocated on the first
    /// [`resize`](Self::resize).
    ///
    /// # Errors
    ///
    /// Returns [`BlurError::Allocation`] if the registry cannot create the
    /// sampler.
    pub fn new<R: SamplerRegistry<B> + ?Sized>(
        format: wgpu::TextureFormat,
        vertical: Option<Arc<dyn ShaderPass<B>>>,
        horizontal: Option<Arc<dyn ShaderPass<B>>>,
        texture_slot: u32,
        sampler_slot: u32,
        sampler_desc: &SamplerDesc,
        registry: &mut R,
    ) -> BlurResult<Self> {
        let sampler = registry.register_sampler(sampler_desc)?;
        Ok(Self {
            buffers: None,
            desc: TextureDesc::render_target(format, 0, 0),
            format,
            vertical,
            horizontal,
            texture_slot,
            sampler_slot,
            sampler,
            clear_color: None,
        })
    }

    /// Match the buffers to `width` x `height`.
    ///
    /// Does nothing when size and format are unchanged. Otherwise both
    /// buffers are released and reallocated together; views handed out
    /// before the call are no longer the stage's buffers. A zero dimension
    /// releases the buffers without touching the device.
    ///
    /// # Errors
    ///
    /// - [`BlurError::InvalidDimensions`] if a dimension exceeds the device
    ///   limit; the stage keeps its previous buffers.
    /// - [`BlurError::Allocation`] if the device rejects either buffer; the
    ///   stage is left empty with a 0x0 size.
    pub fn resize<A: ResourceAllocator<B> + ?Sized>(
        &mut self,
        allocator: &A,
        width: u32,
        height: u32,
    ) -> BlurResult<()> {
        let desc = TextureDesc::render_target(self.format, width, height);
        if desc == self.desc {
            return Ok(());
        }
        let max = allocator.max_dimension();
        if width > max || height > max {
            return Err(BlurError::InvalidDimensions { width, height, max });
        }

        self.buffers = None;
        if desc.is_empty() {
            log::debug!("blur buffers released for {width}x{height}");
            self.desc = desc;
            return Ok(());
        }

        match Self::allocate_pair(allocator, &desc) {
            Ok(buffers) => {
                log::debug!(
                    "blur buffers allocated: {width}x{height} {:?}",
                    self.format
                );
                self.buffers = Some(buffers);
                self.desc = desc;
                Ok(())
            }
            Err(e) => {
                log::warn!("blur buffer allocation failed: {e}");
                self.desc = TextureDesc::render_target(self.format, 0, 0);
                Err(e)
            }
        }
    }

    fn allocate_pair<A: ResourceAllocator<B> + ?Sized>(
        allocator: &A,
        desc: &TextureDesc,
    ) -> BlurResult<DoubleBuffer<BlurTarget<B>>> {
        let allocate = |label| {
            BlurTarget::allocate(allocator, desc)
                .map_err(|source| BlurError::Allocation { label, source })
        };
        let front = allocate("blur buffer 0")?;
        let back = allocate("blur buffer 1")?;
        Ok(DoubleBuffer::new(front, back))
    }

    /// Run `iterations` vertical then horizontal iterations.
    ///
    /// # Errors
    ///
    /// See [`run_from`](Self::run_from).
    pub fn run(
        &mut self,
        context: &mut B::Context,
        iterations: u32,
    ) -> BlurResult<RunStats> {
        self.run_from(context, iterations, 0, 0)
    }

    /// Apply `options` (clear color, iteration range) and run.
    ///
    /// # Errors
    ///
    /// See [`run_from`](Self::run_from).
    pub fn run_with_options(
        &mut self,
        context: &mut B::Context,
        options: &BlurOptions,
    ) -> BlurResult<RunStats> {
        self.clear_color = options.wgpu_clear_color();
        self.run_from(
            context,
            options.iterations,
            options.start_vertical,
            options.start_horizontal,
        )
    }

    /// Run the vertical pass for iterations `start_vertical..iterations`,
    /// then the horizontal pass for `start_horizontal..iterations`.
    ///
    /// The horizontal pass continues from wherever the vertical pass left
    /// the buffers. A direction with no pass or an empty range issues no
    /// binds and no draws: its sampler, program, and states are not bound
    /// and its texture slot is not reset.
    ///
    /// # Errors
    ///
    /// - [`BlurError::NotAllocated`] if any draw would be issued before a
    ///   successful [`resize`](Self::resize).
    /// - [`BlurError::FormatMismatch`] if a pass that would draw reports a
    ///   [`target_format`](ShaderPass::target_format) other than the
    ///   buffers' format. Checked before anything is bound.
    /// - [`BlurError::Draw`] if the context rejects a draw. The failing
    ///   direction's texture slot is unbound and the run stops; the buffer
    ///   contents are unspecified.
    pub fn run_from(
        &mut self,
        context: &mut B::Context,
        iterations: u32,
        start_vertical: u32,
        start_horizontal: u32,
    ) -> BlurResult<RunStats> {
        let vertical_range =
            active_range(self.vertical.as_ref(), start_vertical, iterations);
        let horizontal_range = active_range(
            self.horizontal.as_ref(),
            start_horizontal,
            iterations,
        );
        if vertical_range.is_empty() && horizontal_range.is_empty() {
            return Ok(RunStats::default());
        }

        let Self {
            buffers,
            desc,
            vertical,
            horizontal,
            texture_slot,
            sampler_slot,
            sampler,
            clear_color,
            ..
        } = self;
        let Some(buffers) = buffers.as_mut() else {
            log::warn!("blur run requested before the stage was resized");
            return Err(BlurError::NotAllocated);
        };

        for (pass, range) in [
            (vertical.as_deref(), &vertical_range),
            (horizontal.as_deref(), &horizontal_range),
        ] {
            let Some(pass) = pass.filter(|_| !range.is_empty()) else {
                continue;
            };
            if let Some(format) = pass.target_format() {
                if format != desc.format {
                    log::warn!(
                        "blur pass writes {format:?}, buffers are {:?}",
                        desc.format
                    );
                    return Err(BlurError::FormatMismatch {
                        buffers: desc.format,
                        pass: format,
                    });
                }
            }
        }

        context.set_primitive_topology(wgpu::PrimitiveTopology::TriangleStrip);
        let phase = Phase {
            desc: *desc,
            texture_slot: *texture_slot,
            sampler_slot: *sampler_slot,
            sampler: &**sampler,
            clear_color: *clear_color,
        };

        let mut stats = RunStats::default();
        if let Some(pass) = vertical.as_deref() {
            stats.vertical_draws =
                phase.run(buffers, pass, context, vertical_range)?;
        }
        if let Some(pass) = horizontal.as_deref() {
            stats.horizontal_draws =
                phase.run(buffers, pass, context, horizontal_range)?;
        }
        log::trace!(
            "blur run: {} vertical + {} horizontal draws",
            stats.vertical_draws,
            stats.horizontal_draws
        );
        Ok(stats)
    }

    /// Shader-resource view of the latest result, `None` before the first
    /// successful resize.
    #[must_use]
    pub fn current_texture(&self) -> Option<&B::ShaderResourceView> {
        self.buffers.as_ref().map(|b| &b.front().shader_resource)
    }

    /// Render-target view of the latest result, `None` before the first
    /// successful resize.
    #[must_use]
    pub fn current_target(&self) -> Option<&B::RenderTargetView> {
        self.buffers.as_ref().map(|b| &b.front().render_target)
    }

    /// Texture holding the latest result.
    #[must_use]
    pub fn current(&self) -> Option<&BlurTarget<B>> {
        self.buffers.as_ref().map(DoubleBuffer::front)
    }

    /// Buffer width in texels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.desc.width
    }

    /// Buffer height in texels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.desc.height
    }

    /// Texel format new buffers are allocated with.
    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Change the buffer format. Takes effect on the next
    /// [`resize`](Self::resize), which reallocates even at the same size.
    pub fn set_format(&mut self, format: wgpu::TextureFormat) {
        self.format = format;
    }

    /// Clear each write target to `color` before drawing into it, or leave
    /// its contents alone with `None`.
    pub fn set_clear_color(&mut self, color: Option<wgpu::Color>) {
        self.clear_color = color;
    }

    /// Whether both buffers are allocated.
    #[must_use]
    pub fn is_allocated(&self) -> bool {
        self.buffers.is_some()
    }

    /// The sampler bound for every pass.
    pub fn sampler(&self) -> &Arc<B::Sampler> {
        &self.sampler
    }
}

/// Iterations a direction will draw, empty when it has no pass.
fn active_range<P: ?Sized>(
    pass: Option<&Arc<P>>,
    start: u32,
    iterations: u32,
) -> Range<u32> {
    match pass {
        Some(_) if start < iterations => start..iterations,
        _ => 0..0,
    }
}

/// Per-run binding state shared by both directions.
struct Phase<'a, B: Backend> {
    desc: TextureDesc,
    texture_slot: u32,
    sampler_slot: u32,
    sampler: &'a B::Sampler,
    clear_color: Option<wgpu::Color>,
}

impl<B: Backend> Phase<'_, B> {
    fn run(
        &self,
        buffers: &mut DoubleBuffer<BlurTarget<B>>,
        pass: &dyn ShaderPass<B>,
        context: &mut B::Context,
        iterations: Range<u32>,
    ) -> BlurResult<u32> {
        if iterations.is_empty() {
            return Ok(0);
        }
        pass.bind_sampler(context, self.sampler_slot, self.sampler);
        pass.bind_shader_program(context);
        pass.bind_pipeline_state(context, PipelineStates::ALL);

        let mut draws = 0;
        for _ in iterations {
            buffers.swap();
            let (target, source) = buffers.pair();
            self.bind_target(context, &target.render_target);
            pass.bind_texture(
                context,
                self.texture_slot,
                Some(&source.shader_resource),
            );
            if let Err(e) = context.draw(QUAD_VERTEX_COUNT, 0) {
                log::warn!("blur draw rejected: {e}");
                pass.bind_texture(context, self.texture_slot, None);
                return Err(e.into());
            }
            draws += 1;
        }
        pass.bind_texture(context, self.texture_slot, None);
        Ok(draws)
    }

    fn bind_target(
        &self,
        context: &mut B::Context,
        target: &B::RenderTargetView,
    ) {
        let (width, height) = (self.desc.width, self.desc.height);
        if let Some(color) = self.clear_color {
            context.clear_render_target(target, color);
        }
        context.set_render_targets(None, &[target]);
        context.set_viewport(Viewport::covering(width, height));
        context.set_scissor_rect(ScissorRect::covering(width, height));
    }
}
