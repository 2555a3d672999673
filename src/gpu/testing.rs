//! Recording backend for exercising the blur stage without a GPU.

use std::cell::Cell;

use crate::gpu::backend::{
    AllocationError, Backend, DrawContext, DrawError, PipelineStates,
    ResourceAllocator, SamplerDesc, ScissorRect, ShaderPass, TextureDesc,
    ViewDesc, Viewport,
};

pub(crate) struct RecordingBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MockTexture {
    pub(crate) id: u32,
    pub(crate) desc: TextureDesc,
}

/// Render-target view; carries the id of its texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MockRtv(pub(crate) u32);

/// Shader-resource view; carries the id of its texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MockSrv(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MockDsv(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MockSampler {
    pub(crate) id: u32,
    pub(crate) desc: SamplerDesc,
}

impl Backend for RecordingBackend {
    type Texture = MockTexture;
    type RenderTargetView = MockRtv;
    type ShaderResourceView = MockSrv;
    type DepthStencilView = MockDsv;
    type Sampler = MockSampler;
    type Context = RecordingContext;
}

/// Allocator handing out sequential ids.
///
/// `fail_texture_at` makes the n-th texture allocation (1-based) fail.
pub(crate) struct MockAllocator {
    next_id: Cell<u32>,
    textures_created: Cell<u32>,
    samplers_created: Cell<u32>,
    fail_texture_at: Option<u32>,
    fail_samplers: bool,
    max_dimension: u32,
}

impl Default for MockAllocator {
    fn default() -> Self {
        Self {
            next_id: Cell::new(1),
            textures_created: Cell::new(0),
            samplers_created: Cell::new(0),
            fail_texture_at: None,
            fail_samplers: false,
            max_dimension: 8192,
        }
    }
}

impl MockAllocator {
    pub(crate) fn failing_texture_at(n: u32) -> Self {
        Self {
            fail_texture_at: Some(n),
            ..Self::default()
        }
    }

    pub(crate) fn failing_samplers() -> Self {
        Self {
            fail_samplers: true,
            ..Self::default()
        }
    }

    pub(crate) fn textures_created(&self) -> u32 {
        self.textures_created.get()
    }

    pub(crate) fn samplers_created(&self) -> u32 {
        self.samplers_created.get()
    }

    fn next_id(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl ResourceAllocator<RecordingBackend> for MockAllocator {
    fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    fn create_texture(
        &self,
        desc: &TextureDesc,
    ) -> Result<MockTexture, AllocationError> {
        let attempt = self.textures_created.get() + 1;
        self.textures_created.set(attempt);
        if self.fail_texture_at == Some(attempt) {
            return Err(AllocationError::Rejected("out of memory".to_owned()));
        }
        Ok(MockTexture {
            id: self.next_id(),
            desc: *desc,
        })
    }

    fn create_render_target_view(
        &self,
        texture: &MockTexture,
        _desc: &ViewDesc,
    ) -> Result<MockRtv, AllocationError> {
        Ok(MockRtv(texture.id))
    }

    fn create_shader_resource_view(
        &self,
        texture: &MockTexture,
        _desc: &ViewDesc,
    ) -> Result<MockSrv, AllocationError> {
        Ok(MockSrv(texture.id))
    }

    fn create_sampler(
        &self,
        desc: &SamplerDesc,
    ) -> Result<MockSampler, AllocationError> {
        if self.fail_samplers {
            return Err(AllocationError::Rejected("no samplers".to_owned()));
        }
        self.samplers_created.set(self.samplers_created.get() + 1);
        Ok(MockSampler {
            id: self.next_id(),
            desc: *desc,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Topology(wgpu::PrimitiveTopology),
    RenderTargets {
        depth: Option<u32>,
        targets: Vec<u32>,
    },
    Clear {
        target: u32,
        color: wgpu::Color,
    },
    Viewport(Viewport),
    Scissor(ScissorRect),
    Draw {
        vertex_count: u32,
        start_vertex: u32,
    },
    PipelineState {
        pass: &'static str,
        states: PipelineStates,
    },
    ShaderProgram {
        pass: &'static str,
    },
    Texture {
        pass: &'static str,
        slot: u32,
        view: Option<u32>,
    },
    Sampler {
        pass: &'static str,
        slot: u32,
        sampler: u32,
    },
}

/// Resolved state at the moment of one draw.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DrawRecord {
    pub(crate) pass: &'static str,
    pub(crate) target: u32,
    pub(crate) source: Option<u32>,
    pub(crate) viewport: Option<Viewport>,
    pub(crate) scissor: Option<ScissorRect>,
    pub(crate) topology: Option<wgpu::PrimitiveTopology>,
    pub(crate) vertex_count: u32,
    pub(crate) start_vertex: u32,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingContext {
    pub(crate) calls: Vec<Call>,
}

impl RecordingContext {
    /// Replay the call log and resolve the bound state of every draw.
    pub(crate) fn draws(&self) -> Vec<DrawRecord> {
        let mut records = Vec::new();
        let mut pass = "";
        let mut target = None;
        let mut source = None;
        let mut viewport = None;
        let mut scissor = None;
        let mut topology = None;
        for call in &self.calls {
            match call {
                Call::Topology(t) => topology = Some(*t),
                Call::RenderTargets { targets, .. } => {
                    target = targets.first().copied();
                }
                Call::Viewport(v) => viewport = Some(*v),
                Call::Scissor(s) => scissor = Some(*s),
                Call::ShaderProgram { pass: p } => pass = *p,
                Call::Texture { view, .. } => source = *view,
                Call::Draw {
                    vertex_count,
                    start_vertex,
                } => records.push(DrawRecord {
                    pass,
                    target: target.unwrap_or_default(),
                    source,
                    viewport,
                    scissor,
                    topology,
                    vertex_count: *vertex_count,
                    start_vertex: *start_vertex,
                }),
                _ => {}
            }
        }
        records
    }

    pub(crate) fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Draw { .. }))
            .count()
    }
}

impl DrawContext<RecordingBackend> for RecordingContext {
    fn set_primitive_topology(&mut self, topology: wgpu::PrimitiveTopology) {
        self.calls.push(Call::Topology(topology));
    }

    fn set_render_targets(
        &mut self,
        depth: Option<&MockDsv>,
        targets: &[&MockRtv],
    ) {
        self.calls.push(Call::RenderTargets {
            depth: depth.map(|d| d.0),
            targets: targets.iter().map(|t| t.0).collect(),
        });
    }

    fn clear_render_target(&mut self, target: &MockRtv, color: wgpu::Color) {
        self.calls.push(Call::Clear {
            target: target.0,
            color,
        });
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.calls.push(Call::Viewport(viewport));
    }

    fn set_scissor_rect(&mut self, rect: ScissorRect) {
        self.calls.push(Call::Scissor(rect));
    }

    fn draw(
        &mut self,
        vertex_count: u32,
        start_vertex: u32,
    ) -> Result<(), DrawError> {
        let has_program = self
            .calls
            .iter()
            .any(|c| matches!(c, Call::ShaderProgram { .. }));
        if !has_program {
            return Err(DrawError::NoProgram);
        }
        self.calls.push(Call::Draw {
            vertex_count,
            start_vertex,
        });
        Ok(())
    }
}

/// Named pass that logs every bind into the context.
pub(crate) struct RecordingPass {
    pub(crate) name: &'static str,
    /// Reported by `target_format`.
    pub(crate) format: Option<wgpu::TextureFormat>,
    /// When false, `bind_shader_program` binds nothing.
    pub(crate) binds_program: bool,
}

impl RecordingPass {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            format: None,
            binds_program: true,
        }
    }
}

impl ShaderPass<RecordingBackend> for RecordingPass {
    fn target_format(&self) -> Option<wgpu::TextureFormat> {
        self.format
    }

    fn bind_pipeline_state(
        &self,
        context: &mut RecordingContext,
        states: PipelineStates,
    ) {
        context.calls.push(Call::PipelineState {
            pass: self.name,
            states,
        });
    }

    fn bind_shader_program(&self, context: &mut RecordingContext) {
        if self.binds_program {
            context.calls.push(Call::ShaderProgram { pass: self.name });
        }
    }

    fn bind_texture(
        &self,
        context: &mut RecordingContext,
        slot: u32,
        view: Option<&MockSrv>,
    ) {
        context.calls.push(Call::Texture {
            pass: self.name,
            slot,
            view: view.map(|v| v.0),
        });
    }

    fn bind_sampler(
        &self,
        context: &mut RecordingContext,
        slot: u32,
        sampler: &MockSampler,
    ) {
        context.calls.push(Call::Sampler {
            pass: self.name,
            slot,
            sampler: sampler.id,
        });
    }
}
