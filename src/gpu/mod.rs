//! The wgpu implementation of [`GraphicsContext`].
//!
//! [`GpuContext`] owns the device, queue and window surface, plus every
//! resource created through the trait. Per-frame calls are recorded on the CPU
//! and replayed in one render pass when [`present`](GraphicsContext::present)
//! is called:
//!
//! 1. every `commit` appends the program's uniform block to a ring buffer at
//!    the device's dynamic-offset alignment
//! 2. every `draw_indexed` captures the bound programs, their committed
//!    offsets, the pixel program's textures and samplers, the buffers and the
//!    render states
//! 3. `present` uploads the ring, builds missing pipelines and resource bind
//!    groups, encodes the pass with the requested clear, submits and presents
//!
//! Pipelines are cached by vertex program, pixel program, rasterizer state and
//! depth state.
//!
//! # Bind groups
//!
//! | Group | Contents |
//! |-------|----------|
//! | 0     | vertex program uniforms (dynamic offset) |
//! | 1     | pixel program uniforms (dynamic offset) |
//! | 2     | pixel program textures and samplers |

mod frame;
mod program;
mod resources;

use std::collections::HashMap;
use std::sync::Arc;

use winit::window::Window;

use crate::error::GraphicsError;
use crate::graphics::{
    BufferId, DepthStencilDesc, DepthStencilStateId, GraphicsContext, RasterizerDesc,
    RasterizerStateId, ResourceKind, SamplerDesc, SamplerId, ShaderDesc, ShaderId, ShaderStage,
    TextureData, TextureId, TextureKind,
};
use crate::mesh::Vertex3d;

use frame::{BindState, Bound, ClearRequest, DrawRecord, PipelineKey, UniformRing, UniformWrite};
use program::Program;
use resources::{DepthTarget, GpuTexture};

const MIN_RING_SIZE: u64 = 64 * 1024;

/// GPU backend rendering to a window through wgpu.
pub struct GpuContext {
    /// The surface for presenting rendered frames to the window.
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Current surface configuration (format, size, present mode).
    pub config: wgpu::SurfaceConfiguration,
    wireframe_supported: bool,

    depth: DepthTarget,
    buffers: Vec<wgpu::Buffer>,
    textures: Vec<GpuTexture>,
    samplers: Vec<wgpu::Sampler>,
    programs: Vec<Program>,
    rasterizer_states: Vec<RasterizerDesc>,
    depth_states: Vec<DepthStencilDesc>,
    fallbacks: HashMap<(crate::graphics::Fallback, TextureKind), GpuTexture>,
    default_sampler: wgpu::Sampler,
    empty_layout: wgpu::BindGroupLayout,
    empty_bind_group: wgpu::BindGroup,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    ring: UniformRing,
    ring_buffer: wgpu::Buffer,
    bind: BindState,
    draws: Vec<DrawRecord>,
    clear: Option<ClearRequest>,
}

impl GpuContext {
    /// Create the device and configure the window surface.
    ///
    /// Picks an sRGB surface format and Fifo presentation. Wireframe fill is
    /// enabled when the adapter supports it.
    pub fn new(window: Arc<Window>) -> Result<Self, GraphicsError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| GraphicsError::Surface(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| GraphicsError::Adapter(e.to_string()))?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let wireframe_supported = adapter
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE);
        let required_features = if wireframe_supported {
            wgpu::Features::POLYGON_MODE_LINE
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Vantage Device"),
            required_features,
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))
        .map_err(|e| GraphicsError::Device(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| GraphicsError::Surface("surface supports no formats".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let alignment = device.limits().min_uniform_buffer_offset_alignment;
        let depth = DepthTarget::new(&device, config.width, config.height);
        let fallbacks = resources::create_fallbacks(&device, &queue);
        let default_sampler = resources::create_sampler(&device, &SamplerDesc::default());
        let empty_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Empty Layout"),
            entries: &[],
        });
        let empty_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Empty Bind Group"),
            layout: &empty_layout,
            entries: &[],
        });
        let ring_buffer = create_ring_buffer(&device, MIN_RING_SIZE);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            wireframe_supported,
            depth,
            buffers: Vec::new(),
            textures: Vec::new(),
            samplers: Vec::new(),
            programs: Vec::new(),
            rasterizer_states: Vec::new(),
            depth_states: Vec::new(),
            fallbacks,
            default_sampler,
            empty_layout,
            empty_bind_group,
            pipelines: HashMap::new(),
            ring: UniformRing::new(alignment),
            ring_buffer,
            bind: BindState::default(),
            draws: Vec::new(),
            clear: None,
        })
    }

    /// Resize the surface. Zero-sized dimensions (a minimized window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// Width over height of the surface.
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    fn program_mut(&mut self, shader: ShaderId) -> Option<&mut Program> {
        let program = self.programs.get_mut(shader.0);
        if program.is_none() {
            log::warn!("Unknown shader {shader:?}");
        }
        program
    }

    fn ensure_depth_target(&mut self) {
        let size = (self.config.width, self.config.height);
        if self.depth.size != size {
            log::debug!("Resizing depth target to {}x{}", size.0, size.1);
            self.depth = DepthTarget::new(&self.device, size.0, size.1);
        }
    }

    fn reset_frame(&mut self) {
        self.ring.clear();
        self.draws.clear();
        self.clear = None;
        for program in &mut self.programs {
            program.committed = None;
        }
    }

    /// Upload the ring, growing the buffer (and rebinding every program to it)
    /// when this frame's uniforms no longer fit.
    fn upload_ring(&mut self) {
        let needed = self.ring.bytes().len() as u64;
        if needed > self.ring_buffer.size() {
            let size = needed.next_power_of_two().max(MIN_RING_SIZE);
            log::debug!("Growing uniform ring to {size} bytes");
            self.ring_buffer = create_ring_buffer(&self.device, size);
            for program in &mut self.programs {
                program.uniform_bind_group = None;
            }
        }
        for program in &mut self.programs {
            if program.uniform_bind_group.is_none() {
                program.bind_ring(&self.device, &self.ring_buffer);
            }
        }
        if needed > 0 {
            self.queue.write_buffer(&self.ring_buffer, 0, self.ring.bytes());
        }
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let vs = &self.programs[key.vertex_shader.0];
        let ps = &self.programs[key.pixel_shader.0];

        let raster = key
            .rasterizer_state
            .and_then(|id| self.rasterizer_states.get(id.0).copied())
            .unwrap_or_default();
        let depth = key
            .depth_state
            .and_then(|id| self.depth_states.get(id.0).copied())
            .unwrap_or_default();

        let label = format!("{} + {} Pipeline", vs.desc.label, ps.desc.label);
        let layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&label),
            bind_group_layouts: &[
                &vs.uniform_layout,
                &ps.uniform_layout,
                ps.resource_layout.as_ref().unwrap_or(&self.empty_layout),
            ],
            push_constant_ranges: &[],
        });

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &vs.module,
                entry_point: Some(vs.desc.entry_point.as_str()),
                buffers: &[Vertex3d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &ps.module,
                entry_point: Some(ps.desc.entry_point.as_str()),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: resources::primitive_state(&raster, self.wireframe_supported),
            depth_stencil: Some(resources::depth_stencil_state(&depth)),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        log::debug!("Built pipeline {label}");
        self.pipelines.insert(key, pipeline);
    }

    fn resource_bind_group(&self, draw: &DrawRecord) -> Option<wgpu::BindGroup> {
        let ps = &self.programs[draw.key.pixel_shader.0];
        let layout = ps.resource_layout.as_ref()?;

        let entries: Vec<_> = ps
            .desc
            .resources
            .iter()
            .zip(&draw.resources)
            .map(|(slot, bound)| {
                let resource = match slot.kind {
                    ResourceKind::Texture { kind, fallback } => {
                        let texture = match bound {
                            Some(Bound::Texture(id)) => self
                                .textures
                                .get(id.0)
                                .filter(|t| t.kind == kind),
                            _ => None,
                        };
                        let view = match texture {
                            Some(texture) => &texture.view,
                            None => &self.fallbacks[&(fallback, kind)].view,
                        };
                        wgpu::BindingResource::TextureView(view)
                    }
                    ResourceKind::Sampler => {
                        let sampler = match bound {
                            Some(Bound::Sampler(id)) => self.samplers.get(id.0),
                            _ => None,
                        };
                        wgpu::BindingResource::Sampler(sampler.unwrap_or(&self.default_sampler))
                    }
                };
                wgpu::BindGroupEntry {
                    binding: slot.binding,
                    resource,
                }
            })
            .collect();

        Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Resources", ps.desc.label)),
            layout,
            entries: &entries,
        }))
    }

    fn encode(
        &self,
        view: &wgpu::TextureView,
        resource_groups: &[Option<wgpu::BindGroup>],
    ) -> wgpu::CommandBuffer {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let (color_load, depth_load, stencil_load) = match self.clear {
            Some(clear) => (
                wgpu::LoadOp::Clear(wgpu::Color {
                    r: clear.color[0] as f64,
                    g: clear.color[1] as f64,
                    b: clear.color[2] as f64,
                    a: clear.color[3] as f64,
                }),
                wgpu::LoadOp::Clear(clear.depth),
                wgpu::LoadOp::Clear(clear.stencil),
            ),
            None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load, wgpu::LoadOp::Load),
        };

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Frame Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: stencil_load,
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for (draw, resources) in self.draws.iter().zip(resource_groups) {
                let Some(pipeline) = self.pipelines.get(&draw.key) else {
                    continue;
                };
                let vs = &self.programs[draw.key.vertex_shader.0];
                let ps = &self.programs[draw.key.pixel_shader.0];
                let Some(vs_group) = vs.uniform_bind_group.as_ref() else {
                    continue;
                };
                let Some(ps_group) = ps.uniform_bind_group.as_ref() else {
                    continue;
                };

                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, vs_group, dynamic_offsets(&draw.vertex_offset));
                pass.set_bind_group(1, ps_group, dynamic_offsets(&draw.pixel_offset));
                pass.set_bind_group(2, resources.as_ref().unwrap_or(&self.empty_bind_group), &[]);
                pass.set_vertex_buffer(0, self.buffers[draw.vertex_buffer.0].slice(..));
                pass.set_index_buffer(
                    self.buffers[draw.index_buffer.0].slice(..),
                    wgpu::IndexFormat::Uint32,
                );
                pass.draw_indexed(
                    draw.start_index..draw.start_index + draw.index_count,
                    draw.base_vertex,
                    0..1,
                );
            }
        }

        encoder.finish()
    }
}

impl GraphicsContext for GpuContext {
    fn create_vertex_buffer(&mut self, vertices: &[Vertex3d]) -> Result<BufferId, GraphicsError> {
        let buffer = resources::create_buffer(
            &self.device,
            "Vertex Buffer",
            bytemuck::cast_slice(vertices),
            wgpu::BufferUsages::VERTEX,
        );
        self.buffers.push(buffer);
        Ok(BufferId(self.buffers.len() - 1))
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> Result<BufferId, GraphicsError> {
        let buffer = resources::create_buffer(
            &self.device,
            "Index Buffer",
            bytemuck::cast_slice(indices),
            wgpu::BufferUsages::INDEX,
        );
        self.buffers.push(buffer);
        Ok(BufferId(self.buffers.len() - 1))
    }

    fn create_texture(&mut self, data: &TextureData) -> Result<TextureId, GraphicsError> {
        log::debug!(
            "Uploading texture {} ({}x{}, {:?})",
            data.label,
            data.width,
            data.height,
            data.kind
        );
        self.textures
            .push(resources::upload_texture(&self.device, &self.queue, data));
        Ok(TextureId(self.textures.len() - 1))
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<SamplerId, GraphicsError> {
        self.samplers.push(resources::create_sampler(&self.device, desc));
        Ok(SamplerId(self.samplers.len() - 1))
    }

    fn load_shader(&mut self, desc: &ShaderDesc) -> Result<ShaderId, GraphicsError> {
        let mut program = Program::new(&self.device, desc)?;
        program.bind_ring(&self.device, &self.ring_buffer);
        self.programs.push(program);
        Ok(ShaderId(self.programs.len() - 1))
    }

    fn create_rasterizer_state(
        &mut self,
        desc: &RasterizerDesc,
    ) -> Result<RasterizerStateId, GraphicsError> {
        if desc.fill == crate::graphics::FillMode::Wireframe && !self.wireframe_supported {
            log::warn!("Wireframe fill is not supported by this adapter; using solid fill");
        }
        self.rasterizer_states.push(*desc);
        Ok(RasterizerStateId(self.rasterizer_states.len() - 1))
    }

    fn create_depth_stencil_state(
        &mut self,
        desc: &DepthStencilDesc,
    ) -> Result<DepthStencilStateId, GraphicsError> {
        self.depth_states.push(*desc);
        Ok(DepthStencilStateId(self.depth_states.len() - 1))
    }

    fn set_shader(&mut self, shader: ShaderId) {
        let Some(stage) = self.program_mut(shader).map(|p| p.desc.stage) else {
            return;
        };
        match stage {
            ShaderStage::Vertex => self.bind.vertex_shader = Some(shader),
            ShaderStage::Pixel => self.bind.pixel_shader = Some(shader),
        }
    }

    fn set_uniform(&mut self, shader: ShaderId, name: &str, bytes: &[u8]) {
        let Some(program) = self.program_mut(shader) else {
            return;
        };
        match program.block.write(&program.desc, name, bytes) {
            UniformWrite::Written => {}
            UniformWrite::SizeMismatch { expected, actual } => log::warn!(
                "Uniform {name} of {} expects {expected} bytes, got {actual}",
                program.desc.label
            ),
            UniformWrite::UnknownField => {
                log::debug!("{} has no uniform named {name}", program.desc.label)
            }
        }
    }

    fn set_texture(&mut self, shader: ShaderId, name: &str, texture: Option<TextureId>) {
        let Some(program) = self.program_mut(shader) else {
            return;
        };
        match program.slot(name) {
            Some(slot) => program.bound[slot] = texture.map(Bound::Texture),
            None => log::debug!("{} has no texture named {name}", program.desc.label),
        }
    }

    fn set_sampler(&mut self, shader: ShaderId, name: &str, sampler: SamplerId) {
        let Some(program) = self.program_mut(shader) else {
            return;
        };
        match program.slot(name) {
            Some(slot) => program.bound[slot] = Some(Bound::Sampler(sampler)),
            None => log::debug!("{} has no sampler named {name}", program.desc.label),
        }
    }

    fn commit(&mut self, shader: ShaderId) {
        let Some(program) = self.programs.get_mut(shader.0) else {
            log::warn!("Unknown shader {shader:?}");
            return;
        };
        if !program.block.is_empty() {
            program.committed = Some(self.ring.push(program.block.bytes()));
        }
    }

    fn set_vertex_buffer(&mut self, buffer: BufferId, stride: u32) {
        if stride != Vertex3d::STRIDE {
            log::warn!(
                "Vertex stride {stride} does not match the {} byte vertex",
                Vertex3d::STRIDE
            );
        }
        self.bind.vertex_buffer = Some((buffer, stride));
    }

    fn set_index_buffer(&mut self, buffer: BufferId) {
        self.bind.index_buffer = Some(buffer);
    }

    fn draw_indexed(&mut self, index_count: u32, start_index: u32, base_vertex: i32) {
        let (Some(vertex_shader), Some(pixel_shader)) =
            (self.bind.vertex_shader, self.bind.pixel_shader)
        else {
            log::warn!("Draw without both shader programs bound; skipping");
            return;
        };
        let (Some((vertex_buffer, _)), Some(index_buffer)) =
            (self.bind.vertex_buffer, self.bind.index_buffer)
        else {
            log::warn!("Draw without vertex and index buffers bound; skipping");
            return;
        };

        // Programs never committed this frame publish their current block.
        for shader in [vertex_shader, pixel_shader] {
            if self.programs[shader.0].committed.is_none() {
                self.commit(shader);
            }
        }

        self.draws.push(DrawRecord {
            key: PipelineKey {
                vertex_shader,
                pixel_shader,
                rasterizer_state: self.bind.rasterizer_state,
                depth_state: self.bind.depth_state,
            },
            vertex_offset: self.programs[vertex_shader.0].committed,
            pixel_offset: self.programs[pixel_shader.0].committed,
            resources: self.programs[pixel_shader.0].bound.clone(),
            vertex_buffer,
            index_buffer,
            start_index,
            index_count,
            base_vertex,
        });
    }

    fn set_rasterizer_state(&mut self, state: Option<RasterizerStateId>) {
        self.bind.rasterizer_state = state;
    }

    fn set_depth_stencil_state(&mut self, state: Option<DepthStencilStateId>) {
        self.bind.depth_state = state;
    }

    fn clear(&mut self, color: [f32; 4], depth: f32, stencil: u32) {
        self.clear = Some(ClearRequest {
            color,
            depth,
            stencil,
        });
    }

    fn present(&mut self) {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::info!("Surface lost or outdated; reconfiguring and dropping the frame");
                self.surface.configure(&self.device, &self.config);
                self.reset_frame();
                return;
            }
            Err(e) => {
                log::warn!("Dropping frame: {e}");
                self.reset_frame();
                return;
            }
        };

        self.ensure_depth_target();
        self.upload_ring();

        let keys: Vec<PipelineKey> = self.draws.iter().map(|d| d.key).collect();
        for key in keys {
            self.ensure_pipeline(key);
        }
        let resource_groups: Vec<_> = self
            .draws
            .iter()
            .map(|draw| self.resource_bind_group(draw))
            .collect();

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let commands = self.encode(&view, &resource_groups);
        self.queue.submit(std::iter::once(commands));
        output.present();

        self.reset_frame();
    }

    fn bind_render_targets(&mut self) {
        self.ensure_depth_target();
    }
}

fn create_ring_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Uniform Ring"),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn dynamic_offsets(offset: &Option<u32>) -> &[u32] {
    match offset {
        Some(offset) => std::slice::from_ref(offset),
        None => &[],
    }
}
