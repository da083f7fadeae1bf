//! CPU-side state recorded between `clear` and `present`.
//!
//! Nothing here touches the device: uniform blocks, the per-frame uniform
//! ring and draw records are plain data, replayed by the context at present.

use crate::graphics::{
    BufferId, DepthStencilStateId, RasterizerStateId, SamplerId, ShaderDesc, ShaderId, TextureId,
};

/// A shader program's uniform block as laid out by its [`ShaderDesc`].
#[derive(Debug)]
pub(crate) struct UniformBlock {
    bytes: Vec<u8>,
}

/// Outcome of writing a named field.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum UniformWrite {
    Written,
    /// The byte count did not match the field; the overlapping prefix was written.
    SizeMismatch { expected: u32, actual: usize },
    UnknownField,
}

impl UniformBlock {
    pub(crate) fn new(desc: &ShaderDesc) -> Self {
        Self {
            bytes: vec![0; desc.uniform_block_size() as usize],
        }
    }

    pub(crate) fn write(&mut self, desc: &ShaderDesc, name: &str, bytes: &[u8]) -> UniformWrite {
        let Some(field) = desc.find_uniform(name) else {
            return UniformWrite::UnknownField;
        };
        let start = field.offset as usize;
        let len = bytes.len().min(field.size as usize);
        self.bytes[start..start + len].copy_from_slice(&bytes[..len]);

        if bytes.len() == field.size as usize {
            UniformWrite::Written
        } else {
            UniformWrite::SizeMismatch {
                expected: field.size,
                actual: bytes.len(),
            }
        }
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Every committed uniform block of one frame, each at an aligned offset.
#[derive(Debug)]
pub(crate) struct UniformRing {
    bytes: Vec<u8>,
    alignment: usize,
}

impl UniformRing {
    pub(crate) fn new(alignment: u32) -> Self {
        Self {
            bytes: Vec::new(),
            alignment: alignment.max(1) as usize,
        }
    }

    /// Append a block and return its dynamic offset.
    pub(crate) fn push(&mut self, block: &[u8]) -> u32 {
        let offset = self.bytes.len().next_multiple_of(self.alignment);
        self.bytes.resize(offset, 0);
        self.bytes.extend_from_slice(block);
        offset as u32
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn clear(&mut self) {
        self.bytes.clear();
    }
}

/// A texture or sampler bound to one of a program's resource slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Bound {
    Texture(TextureId),
    Sampler(SamplerId),
}

/// Everything that selects a render pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub vertex_shader: ShaderId,
    pub pixel_shader: ShaderId,
    pub rasterizer_state: Option<RasterizerStateId>,
    pub depth_state: Option<DepthStencilStateId>,
}

/// One `draw_indexed`, with the state it captured.
#[derive(Clone, Debug)]
pub(crate) struct DrawRecord {
    pub key: PipelineKey,
    pub vertex_offset: Option<u32>,
    pub pixel_offset: Option<u32>,
    /// The pixel program's resource slots at the time of the draw.
    pub resources: Vec<Option<Bound>>,
    pub vertex_buffer: BufferId,
    pub index_buffer: BufferId,
    pub start_index: u32,
    pub index_count: u32,
    pub base_vertex: i32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ClearRequest {
    pub color: [f32; 4],
    pub depth: f32,
    pub stencil: u32,
}

/// Bindings that persist from call to call, like a classic device context.
#[derive(Debug, Default)]
pub(crate) struct BindState {
    pub vertex_shader: Option<ShaderId>,
    pub pixel_shader: Option<ShaderId>,
    pub vertex_buffer: Option<(BufferId, u32)>,
    pub index_buffer: Option<BufferId>,
    pub rasterizer_state: Option<RasterizerStateId>,
    pub depth_state: Option<DepthStencilStateId>,
}
