//! wgpu implementation of the collaborator traits.
//!
//! wgpu has no immediate-mode context: state lives in pipelines and bind
//! groups, and draws happen inside render passes. [`WgpuDrawContext`]
//! records the bound state and turns every `draw` into one render pass whose
//! bind group is assembled from the texture and sampler slots bound at that
//! moment.

use rustc_hash::FxHashMap;

use crate::gpu::backend::{
    AllocationError, Backend, DrawContext, DrawError, ResourceAllocator,
    SamplerDesc, ScissorRect, TextureDesc, ViewDesc, Viewport,
};

/// Marker type selecting wgpu resources.
#[derive(Debug, Clone, Copy, Default)]
pub struct WgpuBackend;

impl Backend for WgpuBackend {
    type Texture = wgpu::Texture;
    type RenderTargetView = wgpu::TextureView;
    type ShaderResourceView = wgpu::TextureView;
    type DepthStencilView = wgpu::TextureView;
    type Sampler = wgpu::Sampler;
    type Context = WgpuDrawContext;
}

/// Allocates textures, views, and samplers on a `wgpu::Device`.
///
/// Every allocation runs inside validation and out-of-memory error scopes so
/// a rejected request comes back as an [`AllocationError`] instead of
/// reaching the device's uncaptured-error handler.
#[derive(Debug, Clone)]
pub struct WgpuAllocator {
    device: wgpu::Device,
}

impl WgpuAllocator {
    /// Allocate on `device`.
    #[must_use]
    pub fn new(device: wgpu::Device) -> Self {
        Self { device }
    }

    /// The device allocations are made on.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    fn scoped<T>(
        &self,
        create: impl FnOnce(&wgpu::Device) -> T,
    ) -> Result<T, AllocationError> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(&self.device);
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        match validation.or(out_of_memory) {
            Some(e) => Err(AllocationError::Rejected(e.to_string())),
            None => Ok(value),
        }
    }

    fn create_view(
        &self,
        texture: &wgpu::Texture,
        desc: &ViewDesc,
        label: &str,
    ) -> Result<wgpu::TextureView, AllocationError> {
        self.scoped(|_| {
            texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some(label),
                format: Some(desc.format),
                dimension: Some(wgpu::TextureViewDimension::D2),
                base_mip_level: desc.mip_level,
                mip_level_count: Some(1),
                ..Default::default()
            })
        })
    }
}

impl ResourceAllocator<WgpuBackend> for WgpuAllocator {
    fn max_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    fn create_texture(
        &self,
        desc: &TextureDesc,
    ) -> Result<wgpu::Texture, AllocationError> {
        let max = self.max_dimension();
        if desc.width > max || desc.height > max {
            return Err(AllocationError::TooLarge {
                width: desc.width,
                height: desc.height,
                max,
            });
        }
        self.scoped(|device| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Blur Target"),
                size: desc.extent(),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: desc.format,
                usage: desc.usage,
                view_formats: &[],
            })
        })
    }

    fn create_render_target_view(
        &self,
        texture: &wgpu::Texture,
        desc: &ViewDesc,
    ) -> Result<wgpu::TextureView, AllocationError> {
        self.create_view(texture, desc, "Blur Target RTV")
    }

    fn create_shader_resource_view(
        &self,
        texture: &wgpu::Texture,
        desc: &ViewDesc,
    ) -> Result<wgpu::TextureView, AllocationError> {
        self.create_view(texture, desc, "Blur Target SRV")
    }

    fn create_sampler(
        &self,
        desc: &SamplerDesc,
    ) -> Result<wgpu::Sampler, AllocationError> {
        let [address_mode_u, address_mode_v, address_mode_w] =
            desc.address_mode;
        self.scoped(|device| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("Blur Sampler"),
                address_mode_u,
                address_mode_v,
                address_mode_w,
                mag_filter: desc.mag_filter,
                min_filter: desc.min_filter,
                mipmap_filter: desc.mipmap_filter,
                compare: desc.compare,
                ..Default::default()
            })
        })
    }
}

/// Kind of resource a bind group layout expects at one binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Sampled texture.
    Texture,
    /// Sampler.
    Sampler,
}

/// Pipeline plus the layout its group-0 bind group is built against.
#[derive(Debug, Clone)]
pub struct BoundProgram {
    /// Render pipeline; must be built with `topology`.
    pub pipeline: wgpu::RenderPipeline,
    /// Layout of bind group 0.
    pub layout: wgpu::BindGroupLayout,
    /// Bindings the layout declares.
    pub slots: Vec<(u32, SlotKind)>,
    /// Topology baked into `pipeline`.
    pub topology: wgpu::PrimitiveTopology,
}

/// Immediate-mode draw context recording into a `wgpu::CommandEncoder`.
pub struct WgpuDrawContext {
    device: wgpu::Device,
    encoder: wgpu::CommandEncoder,
    topology: wgpu::PrimitiveTopology,
    targets: Vec<wgpu::TextureView>,
    depth: Option<wgpu::TextureView>,
    viewport: Option<Viewport>,
    scissor: Option<ScissorRect>,
    program: Option<BoundProgram>,
    blend_constant: Option<wgpu::Color>,
    stencil_reference: Option<u32>,
    textures: FxHashMap<u32, wgpu::TextureView>,
    samplers: FxHashMap<u32, wgpu::Sampler>,
    draw_count: u32,
}

impl WgpuDrawContext {
    /// Start recording on a fresh encoder.
    #[must_use]
    pub fn new(device: &wgpu::Device, label: &str) -> Self {
        let encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(label),
            });
        Self {
            device: device.clone(),
            encoder,
            topology: wgpu::PrimitiveTopology::TriangleList,
            targets: Vec::new(),
            depth: None,
            viewport: None,
            scissor: None,
            program: None,
            blend_constant: None,
            stencil_reference: None,
            textures: FxHashMap::default(),
            samplers: FxHashMap::default(),
            draw_count: 0,
        }
    }

    /// Bind a pipeline and its bind group layout.
    pub fn set_program(&mut self, program: BoundProgram) {
        self.program = Some(program);
    }

    /// Bind (or unbind, with `None`) a texture view at `slot`.
    pub fn set_texture(&mut self, slot: u32, view: Option<&wgpu::TextureView>) {
        match view {
            Some(view) => {
                let _ = self.textures.insert(slot, view.clone());
            }
            None => {
                let _ = self.textures.remove(&slot);
            }
        }
    }

    /// Bind a sampler at `slot`.
    pub fn set_sampler(&mut self, slot: u32, sampler: &wgpu::Sampler) {
        let _ = self.samplers.insert(slot, sampler.clone());
    }

    /// Blend constant applied to subsequent draws.
    pub fn set_blend_constant(&mut self, color: wgpu::Color) {
        self.blend_constant = Some(color);
    }

    /// Stencil reference applied to subsequent draws.
    pub fn set_stencil_reference(&mut self, reference: u32) {
        self.stencil_reference = Some(reference);
    }

    /// Whether a texture is currently bound at `slot`.
    #[must_use]
    pub fn has_texture(&self, slot: u32) -> bool {
        self.textures.contains_key(&slot)
    }

    /// Draws recorded so far.
    #[must_use]
    pub fn draw_count(&self) -> u32 {
        self.draw_count
    }

    /// Finish recording.
    #[must_use]
    pub fn finish(self) -> wgpu::CommandBuffer {
        self.encoder.finish()
    }

    fn bind_group(
        &self,
        program: &BoundProgram,
    ) -> Result<wgpu::BindGroup, DrawError> {
        let mut entries = Vec::with_capacity(program.slots.len());
        for &(binding, kind) in &program.slots {
            let unbound = || DrawError::UnboundSlot(binding);
            let resource = match kind {
                SlotKind::Texture => wgpu::BindingResource::TextureView(
                    self.textures.get(&binding).ok_or_else(unbound)?,
                ),
                SlotKind::Sampler => wgpu::BindingResource::Sampler(
                    self.samplers.get(&binding).ok_or_else(unbound)?,
                ),
            };
            entries.push(wgpu::BindGroupEntry { binding, resource });
        }
        Ok(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Blur Draw Bind Group"),
            layout: &program.layout,
            entries: &entries,
        }))
    }
}

impl DrawContext<WgpuBackend> for WgpuDrawContext {
    fn set_primitive_topology(&mut self, topology: wgpu::PrimitiveTopology) {
        self.topology = topology;
    }

    fn set_render_targets(
        &mut self,
        depth: Option<&wgpu::TextureView>,
        targets: &[&wgpu::TextureView],
    ) {
        self.depth = depth.cloned();
        self.targets = targets.iter().map(|&view| view.clone()).collect();
    }

    fn clear_render_target(
        &mut self,
        target: &wgpu::TextureView,
        color: wgpu::Color,
    ) {
        let _pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Blur Clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    fn set_scissor_rect(&mut self, rect: ScissorRect) {
        self.scissor = Some(rect);
    }

    fn draw(
        &mut self,
        vertex_count: u32,
        start_vertex: u32,
    ) -> Result<(), DrawError> {
        let program = self.program.as_ref().ok_or(DrawError::NoProgram)?;
        if program.topology != self.topology {
            return Err(DrawError::TopologyMismatch {
                program: program.topology,
                requested: self.topology,
            });
        }
        if self.targets.is_empty() {
            return Err(DrawError::NoTarget);
        }
        let bind_group = self.bind_group(program)?;

        let color_attachments: Vec<_> = self
            .targets
            .iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect();
        let depth_stencil_attachment = self.depth.as_ref().map(|view| {
            wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }
        });

        let mut pass =
            self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Blur Draw"),
                color_attachments: &color_attachments,
                depth_stencil_attachment,
                ..Default::default()
            });
        pass.set_pipeline(&program.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        if let Some(v) = self.viewport {
            pass.set_viewport(
                v.x,
                v.y,
                v.width,
                v.height,
                v.min_depth,
                v.max_depth,
            );
        }
        if let Some(r) = self.scissor {
            pass.set_scissor_rect(r.x, r.y, r.width, r.height);
        }
        if let Some(color) = self.blend_constant {
            pass.set_blend_constant(color);
        }
        if let Some(reference) = self.stencil_reference {
            pass.set_stencil_reference(reference);
        }
        pass.draw(start_vertex..start_vertex + vertex_count, 0..1);
        drop(pass);
        self.draw_count += 1;
        Ok(())
    }
}
