//! A backend that records calls instead of drawing.
//!
//! [`RecordingContext`] hands out sequential handles for every resource and
//! appends a [`GpuCall`] for every call it receives. Tests inspect the trace to
//! check what was bound and in which order; it also lets a scene run headless.
//!
//! ```
//! use vantage::{GpuCall, GraphicsContext, RecordingContext};
//!
//! let mut ctx = RecordingContext::new();
//! ctx.clear([0.0; 4], 1.0, 0);
//! ctx.draw_indexed(36, 0, 0);
//! assert_eq!(ctx.draw_calls().count(), 1);
//! assert!(matches!(ctx.calls()[0], GpuCall::Clear { .. }));
//! ```

use crate::error::GraphicsError;
use crate::graphics::{
    BufferId, DepthStencilDesc, DepthStencilStateId, GraphicsContext, RasterizerDesc,
    RasterizerStateId, SamplerDesc, SamplerId, ShaderDesc, ShaderId, ShaderStage, TextureData,
    TextureId,
};
use crate::mesh::Vertex3d;

/// One recorded backend call.
#[derive(Clone, Debug, PartialEq)]
pub enum GpuCall {
    CreateVertexBuffer {
        buffer: BufferId,
        vertex_count: usize,
    },
    CreateIndexBuffer {
        buffer: BufferId,
        index_count: usize,
    },
    CreateTexture {
        texture: TextureId,
        label: String,
    },
    CreateSampler {
        sampler: SamplerId,
        desc: SamplerDesc,
    },
    LoadShader {
        shader: ShaderId,
        label: String,
        stage: ShaderStage,
    },
    CreateRasterizerState {
        state: RasterizerStateId,
        desc: RasterizerDesc,
    },
    CreateDepthStencilState {
        state: DepthStencilStateId,
        desc: DepthStencilDesc,
    },
    SetShader(ShaderId),
    SetUniform {
        shader: ShaderId,
        name: String,
        bytes: Vec<u8>,
    },
    SetTexture {
        shader: ShaderId,
        name: String,
        texture: Option<TextureId>,
    },
    SetSampler {
        shader: ShaderId,
        name: String,
        sampler: SamplerId,
    },
    Commit(ShaderId),
    SetVertexBuffer {
        buffer: BufferId,
        stride: u32,
    },
    SetIndexBuffer(BufferId),
    DrawIndexed {
        index_count: u32,
        start_index: u32,
        base_vertex: i32,
    },
    SetRasterizerState(Option<RasterizerStateId>),
    SetDepthStencilState(Option<DepthStencilStateId>),
    Clear {
        color: [f32; 4],
        depth: f32,
        stencil: u32,
    },
    Present,
    BindRenderTargets,
}

/// Records every call made through [`GraphicsContext`].
#[derive(Debug, Default)]
pub struct RecordingContext {
    calls: Vec<GpuCall>,
    shaders: Vec<ShaderDesc>,
    buffers: usize,
    textures: usize,
    samplers: usize,
    rasterizer_states: usize,
    depth_states: usize,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> &[GpuCall] {
        &self.calls
    }

    /// Forget the calls recorded so far. Handles stay valid.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// The description a shader handle was created from.
    pub fn shader_desc(&self, shader: ShaderId) -> Option<&ShaderDesc> {
        self.shaders.get(shader.0)
    }

    /// The `(index_count, start_index, base_vertex)` of every draw.
    pub fn draw_calls(&self) -> impl Iterator<Item = (u32, u32, i32)> + '_ {
        self.calls.iter().filter_map(|call| match *call {
            GpuCall::DrawIndexed {
                index_count,
                start_index,
                base_vertex,
            } => Some((index_count, start_index, base_vertex)),
            _ => None,
        })
    }

    /// Names passed to `set_texture`, in order.
    pub fn texture_bindings(&self) -> impl Iterator<Item = &str> + '_ {
        self.calls.iter().filter_map(|call| match call {
            GpuCall::SetTexture { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    /// The most recent bytes written to `shader`'s `name` uniform.
    pub fn last_uniform(&self, shader: ShaderId, name: &str) -> Option<&[u8]> {
        self.calls.iter().rev().find_map(|call| match call {
            GpuCall::SetUniform {
                shader: s,
                name: n,
                bytes,
            } if *s == shader && n == name => Some(bytes.as_slice()),
            _ => None,
        })
    }

    fn record(&mut self, call: GpuCall) {
        log::trace!("{call:?}");
        self.calls.push(call);
    }
}

impl GraphicsContext for RecordingContext {
    fn create_vertex_buffer(&mut self, vertices: &[Vertex3d]) -> Result<BufferId, GraphicsError> {
        let buffer = BufferId(self.buffers);
        self.buffers += 1;
        self.record(GpuCall::CreateVertexBuffer {
            buffer,
            vertex_count: vertices.len(),
        });
        Ok(buffer)
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> Result<BufferId, GraphicsError> {
        let buffer = BufferId(self.buffers);
        self.buffers += 1;
        self.record(GpuCall::CreateIndexBuffer {
            buffer,
            index_count: indices.len(),
        });
        Ok(buffer)
    }

    fn create_texture(&mut self, data: &TextureData) -> Result<TextureId, GraphicsError> {
        let texture = TextureId(self.textures);
        self.textures += 1;
        self.record(GpuCall::CreateTexture {
            texture,
            label: data.label.clone(),
        });
        Ok(texture)
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<SamplerId, GraphicsError> {
        let sampler = SamplerId(self.samplers);
        self.samplers += 1;
        self.record(GpuCall::CreateSampler {
            sampler,
            desc: *desc,
        });
        Ok(sampler)
    }

    fn load_shader(&mut self, desc: &ShaderDesc) -> Result<ShaderId, GraphicsError> {
        let shader = ShaderId(self.shaders.len());
        self.shaders.push(desc.clone());
        self.record(GpuCall::LoadShader {
            shader,
            label: desc.label.clone(),
            stage: desc.stage,
        });
        Ok(shader)
    }

    fn create_rasterizer_state(
        &mut self,
        desc: &RasterizerDesc,
    ) -> Result<RasterizerStateId, GraphicsError> {
        let state = RasterizerStateId(self.rasterizer_states);
        self.rasterizer_states += 1;
        self.record(GpuCall::CreateRasterizerState { state, desc: *desc });
        Ok(state)
    }

    fn create_depth_stencil_state(
        &mut self,
        desc: &DepthStencilDesc,
    ) -> Result<DepthStencilStateId, GraphicsError> {
        let state = DepthStencilStateId(self.depth_states);
        self.depth_states += 1;
        self.record(GpuCall::CreateDepthStencilState { state, desc: *desc });
        Ok(state)
    }

    fn set_shader(&mut self, shader: ShaderId) {
        self.record(GpuCall::SetShader(shader));
    }

    fn set_uniform(&mut self, shader: ShaderId, name: &str, bytes: &[u8]) {
        self.record(GpuCall::SetUniform {
            shader,
            name: name.to_string(),
            bytes: bytes.to_vec(),
        });
    }

    fn set_texture(&mut self, shader: ShaderId, name: &str, texture: Option<TextureId>) {
        self.record(GpuCall::SetTexture {
            shader,
            name: name.to_string(),
            texture,
        });
    }

    fn set_sampler(&mut self, shader: ShaderId, name: &str, sampler: SamplerId) {
        self.record(GpuCall::SetSampler {
            shader,
            name: name.to_string(),
            sampler,
        });
    }

    fn commit(&mut self, shader: ShaderId) {
        self.record(GpuCall::Commit(shader));
    }

    fn set_vertex_buffer(&mut self, buffer: BufferId, stride: u32) {
        self.record(GpuCall::SetVertexBuffer { buffer, stride });
    }

    fn set_index_buffer(&mut self, buffer: BufferId) {
        self.record(GpuCall::SetIndexBuffer(buffer));
    }

    fn draw_indexed(&mut self, index_count: u32, start_index: u32, base_vertex: i32) {
        self.record(GpuCall::DrawIndexed {
            index_count,
            start_index,
            base_vertex,
        });
    }

    fn set_rasterizer_state(&mut self, state: Option<RasterizerStateId>) {
        self.record(GpuCall::SetRasterizerState(state));
    }

    fn set_depth_stencil_state(&mut self, state: Option<DepthStencilStateId>) {
        self.record(GpuCall::SetDepthStencilState(state));
    }

    fn clear(&mut self, color: [f32; 4], depth: f32, stencil: u32) {
        self.record(GpuCall::Clear {
            color,
            depth,
            stencil,
        });
    }

    fn present(&mut self) {
        self.record(GpuCall::Present);
    }

    fn bind_render_targets(&mut self) {
        self.record(GpuCall::BindRenderTargets);
    }
}
