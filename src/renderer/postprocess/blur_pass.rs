//! Ready-made wgpu shader passes for [`BlurStage`].
//!
//! One WGSL module provides both directions of a 9-tap Gaussian; each
//! [`SeparableBlurPass`] binds the pipeline built from one of its fragment
//! entry points.

use std::borrow::Cow;
use std::sync::Arc;

use crate::error::BlurResult;
use crate::gpu::backend::{PipelineStates, SamplerDesc, ShaderPass};
use crate::gpu::pipeline_helpers::{
    create_screen_space_pipeline, filtering_sampler, texture_2d,
};
use crate::gpu::sampler_registry::SamplerRegistry;
use crate::gpu::wgpu_backend::{
    BoundProgram, SlotKind, WgpuBackend, WgpuDrawContext,
};
use crate::renderer::postprocess::blur_stage::BlurStage;

const SHADER_SOURCE: &str =
    include_str!("../../../assets/shaders/screen/separable_blur.wgsl");

/// Which axis a pass blurs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlurDirection {
    /// Along the y axis.
    Vertical,
    /// Along the x axis.
    Horizontal,
}

impl BlurDirection {
    fn entry_point(self) -> &'static str {
        match self {
            Self::Vertical => "fs_vertical",
            Self::Horizontal => "fs_horizontal",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Vertical => "Blur Vertical",
            Self::Horizontal => "Blur Horizontal",
        }
    }
}

/// One direction of the bundled Gaussian blur.
pub struct SeparableBlurPass {
    program: BoundProgram,
    format: wgpu::TextureFormat,
    blend_constant: wgpu::Color,
}

impl SeparableBlurPass {
    /// Binding the source texture is read from.
    pub const TEXTURE_SLOT: u32 = 0;
    /// Binding the sampler is read from.
    pub const SAMPLER_SLOT: u32 = 1;

    /// Build the pipeline for `direction` writing `format` targets.
    ///
    /// The pipeline only draws into `format`; a stage whose buffers change
    /// format needs new passes.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        direction: BlurDirection,
        blend: Option<wgpu::BlendState>,
    ) -> Self {
        let label = direction.label();
        let shader =
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(SHADER_SOURCE)),
            });
        let layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{label} Bind Group Layout")),
                entries: &[
                    texture_2d(Self::TEXTURE_SLOT),
                    filtering_sampler(Self::SAMPLER_SLOT),
                ],
            });
        let pipeline = create_screen_space_pipeline(
            device,
            label,
            &shader,
            direction.entry_point(),
            format,
            blend,
            &[&layout],
        );
        Self {
            program: BoundProgram {
                pipeline,
                layout,
                slots: vec![
                    (Self::TEXTURE_SLOT, SlotKind::Texture),
                    (Self::SAMPLER_SLOT, SlotKind::Sampler),
                ],
                topology: wgpu::PrimitiveTopology::TriangleStrip,
            },
            format,
            blend_constant: wgpu::Color::WHITE,
        }
    }

    /// Blend constant bound when blend state is requested.
    #[must_use]
    pub fn with_blend_constant(mut self, color: wgpu::Color) -> Self {
        self.blend_constant = color;
        self
    }

    /// A blur stage wired to a vertical and a horizontal pass, with the
    /// slots this shader expects.
    ///
    /// # Errors
    ///
    /// Returns [`BlurError::Allocation`](crate::error::BlurError::Allocation)
    /// if the sampler cannot be created.
    pub fn stage<R: SamplerRegistry<WgpuBackend> + ?Sized>(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        sampler_desc: &SamplerDesc,
        registry: &mut R,
    ) -> BlurResult<BlurStage<WgpuBackend>> {
        let vertical: Arc<dyn ShaderPass<WgpuBackend>> = Arc::new(Self::new(
            device,
            format,
            BlurDirection::Vertical,
            None,
        ));
        let horizontal: Arc<dyn ShaderPass<WgpuBackend>> = Arc::new(
            Self::new(device, format, BlurDirection::Horizontal, None),
        );
        BlurStage::new(
            format,
            Some(vertical),
            Some(horizontal),
            Self::TEXTURE_SLOT,
            Self::SAMPLER_SLOT,
            sampler_desc,
            registry,
        )
    }
}

impl ShaderPass<WgpuBackend> for SeparableBlurPass {
    fn target_format(&self) -> Option<wgpu::TextureFormat> {
        Some(self.format)
    }

    fn bind_pipeline_state(
        &self,
        context: &mut WgpuDrawContext,
        states: PipelineStates,
    ) {
        // Raster and depth state are baked into the pipeline; only the
        // dynamic parts are set here.
        if states.blend {
            context.set_blend_constant(self.blend_constant);
        }
        if states.depth_stencil {
            context.set_stencil_reference(0);
        }
    }

    fn bind_shader_program(&self, context: &mut WgpuDrawContext) {
        context.set_program(self.program.clone());
    }

    fn bind_texture(
        &self,
        context: &mut WgpuDrawContext,
        slot: u32,
        view: Option<&wgpu::TextureView>,
    ) {
        context.set_texture(slot, view);
    }

    fn bind_sampler(
        &self,
        context: &mut WgpuDrawContext,
        slot: u32,
        sampler: &wgpu::Sampler,
    ) {
        context.set_sampler(slot, sampler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlurError;
    use crate::gpu::backend::{
        AllocationError, DrawContext, DrawError, ResourceAllocator,
        TextureDesc, ViewDesc,
    };
    use crate::gpu::sampler_registry::CachedSamplerRegistry;
    use crate::gpu::texture::BlurTarget;
    use crate::gpu::wgpu_backend::WgpuAllocator;

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    fn device_from(
        instance: &wgpu::Instance,
    ) -> Option<(wgpu::Device, wgpu::Queue)> {
        let adapter = pollster::block_on(
            instance.request_adapter(&wgpu::RequestAdapterOptions::default()),
        )
        .ok()?;
        log::info!("blur tests running on {:?}", adapter.get_info().backend);
        pollster::block_on(
            adapter.request_device(&wgpu::DeviceDescriptor::default()),
        )
        .ok()
    }

    /// A hardware device when one is present, otherwise the noop backend,
    /// which validates every call without executing it.
    fn request_device() -> (wgpu::Device, wgpu::Queue) {
        let _ = env_logger::builder().is_test(true).try_init();
        if let Some(device) = device_from(&wgpu::Instance::default()) {
            return device;
        }
        let noop = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::NOOP,
            backend_options: wgpu::BackendOptions {
                noop: wgpu::NoopBackendOptions { enable: true },
                ..Default::default()
            },
            ..Default::default()
        });
        device_from(&noop).unwrap()
    }

    struct Fixture {
        device: wgpu::Device,
        queue: wgpu::Queue,
        allocator: WgpuAllocator,
        stage: BlurStage<WgpuBackend>,
    }

    fn fixture() -> Fixture {
        let (device, queue) = request_device();
        let allocator = WgpuAllocator::new(device.clone());
        let mut registry =
            CachedSamplerRegistry::<WgpuBackend, _>::new(allocator.clone());
        let stage = SeparableBlurPass::stage(
            &device,
            FORMAT,
            &SamplerDesc::LINEAR_CLAMP,
            &mut registry,
        )
        .unwrap();
        Fixture {
            device,
            queue,
            allocator,
            stage,
        }
    }

    /// Submit `context` and return the first validation error, if any.
    fn submit(fixture: &Fixture, context: WgpuDrawContext) -> Option<String> {
        let _ = fixture.queue.submit([context.finish()]);
        pollster::block_on(fixture.device.pop_error_scope())
            .map(|e| e.to_string())
    }

    #[test]
    fn bundled_shader_validates() {
        let module = naga::front::wgsl::parse_str(SHADER_SOURCE).unwrap();
        let _info = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap();
        let entries: Vec<&str> =
            module.entry_points.iter().map(|e| e.name.as_str()).collect();
        for name in ["vs_main", "fs_vertical", "fs_horizontal"] {
            assert!(entries.contains(&name), "missing entry point {name}");
        }
    }

    #[test]
    fn blur_runs_on_a_device() {
        let mut fx = fixture();
        fx.stage.resize(&fx.allocator, 64, 64).unwrap();
        fx.stage.set_clear_color(Some(wgpu::Color::BLACK));

        fx.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut context = WgpuDrawContext::new(&fx.device, "Blur Test");
        let stats = fx.stage.run(&mut context, 2).unwrap();
        assert_eq!(stats.total(), 4);
        assert_eq!(context.draw_count(), 4);
        assert!(!context.has_texture(SeparableBlurPass::TEXTURE_SLOT));
        let error = submit(&fx, context);
        assert!(error.is_none(), "validation error: {error:?}");
    }

    #[test]
    fn format_change_is_rejected_before_recording() {
        let mut fx = fixture();
        fx.stage.set_format(wgpu::TextureFormat::Rgba16Float);
        fx.stage.resize(&fx.allocator, 64, 64).unwrap();

        fx.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut context = WgpuDrawContext::new(&fx.device, "Blur Test");
        let err = fx.stage.run(&mut context, 1).unwrap_err();
        assert!(matches!(
            err,
            BlurError::FormatMismatch {
                buffers: wgpu::TextureFormat::Rgba16Float,
                pass: FORMAT,
            }
        ));
        assert_eq!(context.draw_count(), 0);
        let error = submit(&fx, context);
        assert!(error.is_none(), "validation error: {error:?}");
    }

    /// Binds resources but never a program.
    struct ProgramlessPass;

    impl ShaderPass<WgpuBackend> for ProgramlessPass {
        fn bind_pipeline_state(
            &self,
            _context: &mut WgpuDrawContext,
            _states: PipelineStates,
        ) {
        }

        fn bind_shader_program(&self, _context: &mut WgpuDrawContext) {}

        fn bind_texture(
            &self,
            context: &mut WgpuDrawContext,
            slot: u32,
            view: Option<&wgpu::TextureView>,
        ) {
            context.set_texture(slot, view);
        }

        fn bind_sampler(
            &self,
            context: &mut WgpuDrawContext,
            slot: u32,
            sampler: &wgpu::Sampler,
        ) {
            context.set_sampler(slot, sampler);
        }
    }

    #[test]
    fn draw_without_program_is_an_error() {
        let (device, _queue) = request_device();
        let allocator = WgpuAllocator::new(device.clone());
        let mut registry =
            CachedSamplerRegistry::<WgpuBackend, _>::new(allocator.clone());
        let pass: Arc<dyn ShaderPass<WgpuBackend>> = Arc::new(ProgramlessPass);
        let mut stage = BlurStage::new(
            FORMAT,
            Some(pass),
            None,
            SeparableBlurPass::TEXTURE_SLOT,
            SeparableBlurPass::SAMPLER_SLOT,
            &SamplerDesc::LINEAR_CLAMP,
            &mut registry,
        )
        .unwrap();
        stage.resize(&allocator, 16, 16).unwrap();

        let mut context = WgpuDrawContext::new(&device, "Blur Test");
        let err = stage.run(&mut context, 1).unwrap_err();
        assert!(matches!(err, BlurError::Draw(DrawError::NoProgram)));
        assert_eq!(context.draw_count(), 0);
        assert!(!context.has_texture(SeparableBlurPass::TEXTURE_SLOT));
    }

    #[test]
    fn context_reports_missing_target_and_slots() {
        let fx = fixture();
        let pass = SeparableBlurPass::new(
            &fx.device,
            FORMAT,
            BlurDirection::Horizontal,
            None,
        );
        let mut context = WgpuDrawContext::new(&fx.device, "Blur Test");
        pass.bind_shader_program(&mut context);
        assert!(matches!(
            context.draw(4, 0),
            Err(DrawError::TopologyMismatch { .. })
        ));
        context.set_primitive_topology(wgpu::PrimitiveTopology::TriangleStrip);
        assert_eq!(context.draw(4, 0), Err(DrawError::NoTarget));

        let desc = TextureDesc::render_target(FORMAT, 8, 8);
        let target = BlurTarget::allocate(&fx.allocator, &desc).unwrap();
        context.set_render_targets(None, &[&target.render_target]);
        assert_eq!(
            context.draw(4, 0),
            Err(DrawError::UnboundSlot(SeparableBlurPass::TEXTURE_SLOT))
        );
        assert_eq!(context.draw_count(), 0);
    }

    #[test]
    fn oversized_resize_fails_before_touching_the_device() {
        let mut fx = fixture();
        let too_big = fx.allocator.max_dimension() + 1;
        let err = fx.stage.resize(&fx.allocator, too_big, 16).unwrap_err();
        assert!(matches!(err, BlurError::InvalidDimensions { .. }));
        assert!(!fx.stage.is_allocated());
    }

    #[test]
    fn allocator_surfaces_device_rejection() {
        let fx = fixture();
        let desc = TextureDesc::render_target(FORMAT, 8, 8);
        let texture = fx.allocator.create_texture(&desc).unwrap();
        // Not the texture's format and not among its view formats.
        let view = ViewDesc {
            format: wgpu::TextureFormat::Rgba16Float,
            mip_level: 0,
        };
        let err = fx
            .allocator
            .create_shader_resource_view(&texture, &view)
            .unwrap_err();
        assert!(matches!(err, AllocationError::Rejected(_)));
    }
}
