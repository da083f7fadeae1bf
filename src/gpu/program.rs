//! Compiled shader programs and their bind group layouts.

use std::num::NonZeroU64;

use crate::error::GraphicsError;
use crate::graphics::{ResourceKind, ShaderDesc, ShaderSource, ShaderStage};

use super::frame::{Bound, UniformBlock};
use super::resources::view_dimension;

/// A shader module plus the CPU state behind its named uniforms and resources.
pub(crate) struct Program {
    pub desc: ShaderDesc,
    pub module: wgpu::ShaderModule,
    /// Group 0 for vertex programs, group 1 for pixel programs.
    pub uniform_layout: wgpu::BindGroupLayout,
    /// Group 2; only pixel programs declare resources.
    pub resource_layout: Option<wgpu::BindGroupLayout>,
    pub block: UniformBlock,
    /// Offset of this frame's latest commit in the uniform ring.
    pub committed: Option<u32>,
    /// One entry per `desc.resources` slot.
    pub bound: Vec<Option<Bound>>,
    /// Binds `block`-sized windows of the current ring buffer.
    pub uniform_bind_group: Option<wgpu::BindGroup>,
}

impl Program {
    pub(crate) fn new(device: &wgpu::Device, desc: &ShaderDesc) -> Result<Self, GraphicsError> {
        let source = match &desc.source {
            ShaderSource::Wgsl(source) => source.clone(),
            ShaderSource::File(path) => std::fs::read_to_string(path)
                .map_err(|source| GraphicsError::Io {
                    path: path.clone(),
                    source,
                })?
                .into(),
        };

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&desc.label),
            source: wgpu::ShaderSource::Wgsl(source),
        });

        let visibility = match desc.stage {
            ShaderStage::Vertex => wgpu::ShaderStages::VERTEX,
            ShaderStage::Pixel => wgpu::ShaderStages::FRAGMENT,
        };

        let block = UniformBlock::new(desc);
        let uniform_entries: Vec<_> = if block.is_empty() {
            Vec::new()
        } else {
            vec![wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(block.bytes().len() as u64),
                },
                count: None,
            }]
        };
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} Uniform Layout", desc.label)),
            entries: &uniform_entries,
        });

        let resource_layout = match desc.stage {
            ShaderStage::Pixel => Some(resource_layout(device, desc)),
            ShaderStage::Vertex => {
                if !desc.resources.is_empty() {
                    log::warn!("Vertex program {} declares resources; ignoring them", desc.label);
                }
                None
            }
        };

        log::debug!(
            "Loaded {:?} program {} ({} uniform bytes, {} resources)",
            desc.stage,
            desc.label,
            block.bytes().len(),
            desc.resources.len()
        );

        Ok(Self {
            desc: desc.clone(),
            module,
            uniform_layout,
            resource_layout,
            block,
            committed: None,
            bound: vec![None; desc.resources.len()],
            uniform_bind_group: None,
        })
    }

    pub(crate) fn slot(&self, name: &str) -> Option<usize> {
        self.desc.resources.iter().position(|r| r.name == name)
    }

    /// (Re)bind the uniform window to `ring`. No-op for programs without uniforms.
    pub(crate) fn bind_ring(&mut self, device: &wgpu::Device, ring: &wgpu::Buffer) {
        if self.block.is_empty() {
            self.uniform_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{} Uniforms", self.desc.label)),
                layout: &self.uniform_layout,
                entries: &[],
            }));
            return;
        }

        self.uniform_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Uniforms", self.desc.label)),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: ring,
                    offset: 0,
                    size: NonZeroU64::new(self.block.bytes().len() as u64),
                }),
            }],
        }));
    }
}

fn resource_layout(device: &wgpu::Device, desc: &ShaderDesc) -> wgpu::BindGroupLayout {
    let entries: Vec<_> = desc
        .resources
        .iter()
        .map(|slot| wgpu::BindGroupLayoutEntry {
            binding: slot.binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: match slot.kind {
                ResourceKind::Texture { kind, .. } => wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: view_dimension(kind),
                    multisampled: false,
                },
                ResourceKind::Sampler => {
                    wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                }
            },
            count: None,
        })
        .collect();

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("{} Resource Layout", desc.label)),
        entries: &entries,
    })
}
