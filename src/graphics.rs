//! The GPU backend contract.
//!
//! Everything the scene does to the GPU goes through [`GraphicsContext`]. The
//! trait is deliberately close to a classic immediate-mode API: bind a shader,
//! write named uniforms, bind textures by name, commit, bind buffers, draw.
//!
//! Two implementations ship with the crate:
//!
//! - [`GpuContext`](crate::GpuContext) renders through wgpu.
//! - [`RecordingContext`](crate::RecordingContext) records every call, for
//!   tests and headless runs.
//!
//! # Named uniforms
//!
//! Every shader program owns a CPU-side uniform block described by its
//! [`ShaderDesc`]. [`set_uniform`](GraphicsContext::set_uniform) writes bytes at
//! the named field and [`commit`](GraphicsContext::commit) publishes the block
//! for the draws that follow. Written values persist until overwritten, so data
//! set once per frame (lights) survives every per-object commit.
//!
//! The byte size passed to `set_uniform` must match the shader's field,
//! padding included. Use [`set_data`] with a `#[repr(C)]` [`bytemuck::Pod`]
//! type to get that right.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::error::GraphicsError;
use crate::mesh::Vertex3d;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Wrap a backend-specific index.
            pub fn from_index(index: usize) -> Self {
                Self(index)
            }

            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

handle!(
    /// A compiled vertex or pixel shader program.
    ShaderId
);
handle!(
    /// A 2D texture or cube map.
    TextureId
);
handle!(
    /// A sampler configuration.
    SamplerId
);
handle!(
    /// An immutable vertex or index buffer.
    BufferId
);
handle!(
    /// A culling/fill configuration.
    RasterizerStateId
);
handle!(
    /// A depth test configuration.
    DepthStencilStateId
);

/// Pipeline stage a shader program runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

/// Where a shader's WGSL comes from.
#[derive(Clone, Debug)]
pub enum ShaderSource {
    Wgsl(Cow<'static, str>),
    File(PathBuf),
}

/// A named field in a shader's uniform block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformField {
    pub name: String,
    pub offset: u32,
    pub size: u32,
}

/// Texture dimensionality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    D2,
    /// Six square faces in +X, -X, +Y, -Y, +Z, -Z order.
    Cube,
}

/// What a texture slot samples before anything is bound to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fallback {
    White,
    Black,
    /// Tangent-space (0, 0, 1).
    FlatNormal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture { kind: TextureKind, fallback: Fallback },
    Sampler,
}

/// A named texture or sampler binding in a shader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceSlot {
    pub name: String,
    pub binding: u32,
    pub kind: ResourceKind,
}

/// Everything a backend needs to build a shader program: its source, entry
/// point, and the layout of its uniforms and resources.
#[derive(Clone, Debug)]
pub struct ShaderDesc {
    pub label: String,
    pub stage: ShaderStage,
    pub source: ShaderSource,
    pub entry_point: String,
    pub uniforms: Vec<UniformField>,
    pub resources: Vec<ResourceSlot>,
}

impl ShaderDesc {
    /// A vertex program with entry point `vs_main`.
    pub fn vertex(label: impl Into<String>, source: ShaderSource) -> Self {
        Self::new(label, ShaderStage::Vertex, source, "vs_main")
    }

    /// A pixel program with entry point `fs_main`.
    pub fn pixel(label: impl Into<String>, source: ShaderSource) -> Self {
        Self::new(label, ShaderStage::Pixel, source, "fs_main")
    }

    fn new(
        label: impl Into<String>,
        stage: ShaderStage,
        source: ShaderSource,
        entry: &str,
    ) -> Self {
        Self {
            label: label.into(),
            stage,
            source,
            entry_point: entry.to_string(),
            uniforms: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Declare a uniform field at `offset` bytes into the block.
    pub fn uniform(mut self, name: impl Into<String>, offset: u32, size: u32) -> Self {
        self.uniforms.push(UniformField {
            name: name.into(),
            offset,
            size,
        });
        self
    }

    pub fn texture(
        mut self,
        name: impl Into<String>,
        binding: u32,
        kind: TextureKind,
        fallback: Fallback,
    ) -> Self {
        self.resources.push(ResourceSlot {
            name: name.into(),
            binding,
            kind: ResourceKind::Texture { kind, fallback },
        });
        self
    }

    pub fn sampler(mut self, name: impl Into<String>, binding: u32) -> Self {
        self.resources.push(ResourceSlot {
            name: name.into(),
            binding,
            kind: ResourceKind::Sampler,
        });
        self
    }

    pub fn find_uniform(&self, name: &str) -> Option<&UniformField> {
        self.uniforms.iter().find(|u| u.name == name)
    }

    pub fn find_resource(&self, name: &str) -> Option<&ResourceSlot> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Size of the uniform block, rounded up to 16 bytes. Zero if the program
    /// has no uniforms.
    pub fn uniform_block_size(&self) -> u32 {
        let end = self
            .uniforms
            .iter()
            .map(|u| u.offset + u.size)
            .max()
            .unwrap_or(0);
        end.div_ceil(16) * 16
    }
}

/// How texel values are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    /// Color data (albedo, sky).
    Srgb,
    /// Non-color data (normal, roughness and metalness maps).
    Linear,
}

/// RGBA8 pixels ready for upload.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub kind: TextureKind,
    pub color_space: ColorSpace,
    /// Layer-major RGBA8: one `width * height` image per layer.
    pub pixels: Vec<u8>,
}

impl TextureData {
    pub fn new_2d(
        label: impl Into<String>,
        width: u32,
        height: u32,
        color_space: ColorSpace,
        pixels: Vec<u8>,
    ) -> Result<Self, GraphicsError> {
        Self::checked(
            label.into(),
            width,
            height,
            TextureKind::D2,
            color_space,
            pixels,
        )
    }

    /// Six square `size x size` faces, concatenated in +X, -X, +Y, -Y, +Z, -Z order.
    pub fn new_cube(
        label: impl Into<String>,
        size: u32,
        color_space: ColorSpace,
        pixels: Vec<u8>,
    ) -> Result<Self, GraphicsError> {
        Self::checked(
            label.into(),
            size,
            size,
            TextureKind::Cube,
            color_space,
            pixels,
        )
    }

    fn checked(
        label: String,
        width: u32,
        height: u32,
        kind: TextureKind,
        color_space: ColorSpace,
        pixels: Vec<u8>,
    ) -> Result<Self, GraphicsError> {
        let data = Self {
            label,
            width,
            height,
            kind,
            color_space,
            pixels,
        };
        let expected = data.expected_len();
        if data.pixels.len() != expected {
            return Err(GraphicsError::TextureSize {
                expected,
                actual: data.pixels.len(),
            });
        }
        Ok(data)
    }

    /// A 1x1 texture of one color.
    pub fn solid(label: impl Into<String>, rgba: [u8; 4], color_space: ColorSpace) -> Self {
        Self {
            label: label.into(),
            width: 1,
            height: 1,
            kind: TextureKind::D2,
            color_space,
            pixels: rgba.to_vec(),
        }
    }

    /// Decode an image file into a 2D texture.
    pub fn from_file(path: &Path, color_space: ColorSpace) -> Result<Self, GraphicsError> {
        let image = image::open(path)?.to_rgba8();
        let (width, height) = image.dimensions();
        Self::new_2d(
            path.display().to_string(),
            width,
            height,
            color_space,
            image.into_raw(),
        )
    }

    /// Decode a cube map stored as six square faces stacked vertically.
    pub fn cube_from_file(path: &Path) -> Result<Self, GraphicsError> {
        let image = image::open(path)?.to_rgba8();
        let (width, height) = image.dimensions();
        if width == 0 || height != width * 6 {
            return Err(GraphicsError::InvalidCubeMap { width, height });
        }
        Self::new_cube(
            path.display().to_string(),
            width,
            ColorSpace::Srgb,
            image.into_raw(),
        )
    }

    pub fn layer_count(&self) -> u32 {
        match self.kind {
            TextureKind::D2 => 1,
            TextureKind::Cube => 6,
        }
    }

    fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4 * self.layer_count() as usize
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AddressMode {
    #[default]
    Wrap,
    Clamp,
    Mirror,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

/// Sampler configuration. Defaults to wrapping, linear filtering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SamplerDesc {
    pub address_mode: AddressMode,
    pub filter: FilterMode,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FillMode {
    #[default]
    Solid,
    Wireframe,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    #[default]
    Back,
}

/// Rasterizer configuration. The default is solid fill, back-face culling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RasterizerDesc {
    pub fill: FillMode,
    pub cull: CullMode,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    Never,
    #[default]
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Depth configuration. The default tests `Less` and writes depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DepthStencilDesc {
    pub depth_test: bool,
    pub depth_write: bool,
    pub compare: CompareFunction,
}

impl Default for DepthStencilDesc {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_write: true,
            compare: CompareFunction::Less,
        }
    }
}

/// A GPU backend.
///
/// Resource creation can fail and returns a [`Result`]. Per-frame calls never
/// fail: a backend logs what it cannot honor and carries on, and the next
/// frame supersedes a bad one.
pub trait GraphicsContext {
    fn create_vertex_buffer(&mut self, vertices: &[Vertex3d]) -> Result<BufferId, GraphicsError>;

    fn create_index_buffer(&mut self, indices: &[u32]) -> Result<BufferId, GraphicsError>;

    fn create_texture(&mut self, data: &TextureData) -> Result<TextureId, GraphicsError>;

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<SamplerId, GraphicsError>;

    fn load_shader(&mut self, desc: &ShaderDesc) -> Result<ShaderId, GraphicsError>;

    fn create_rasterizer_state(
        &mut self,
        desc: &RasterizerDesc,
    ) -> Result<RasterizerStateId, GraphicsError>;

    fn create_depth_stencil_state(
        &mut self,
        desc: &DepthStencilDesc,
    ) -> Result<DepthStencilStateId, GraphicsError>;

    /// Decode an image file and upload it as a 2D texture.
    fn load_texture(
        &mut self,
        path: &Path,
        color_space: ColorSpace,
    ) -> Result<TextureId, GraphicsError> {
        let data = TextureData::from_file(path, color_space)?;
        self.create_texture(&data)
    }

    /// Decode a vertical-strip cube map file and upload it.
    fn load_cube_map(&mut self, path: &Path) -> Result<TextureId, GraphicsError> {
        let data = TextureData::cube_from_file(path)?;
        self.create_texture(&data)
    }

    /// Make `shader` the active program for its stage.
    fn set_shader(&mut self, shader: ShaderId);

    /// Write `bytes` into the named field of `shader`'s uniform block.
    fn set_uniform(&mut self, shader: ShaderId, name: &str, bytes: &[u8]);

    /// Bind a texture to the named slot. `None` restores the slot's fallback.
    fn set_texture(&mut self, shader: ShaderId, name: &str, texture: Option<TextureId>);

    fn set_sampler(&mut self, shader: ShaderId, name: &str, sampler: SamplerId);

    /// Publish `shader`'s uniform block to subsequent draws.
    fn commit(&mut self, shader: ShaderId);

    fn set_vertex_buffer(&mut self, buffer: BufferId, stride: u32);

    fn set_index_buffer(&mut self, buffer: BufferId);

    fn draw_indexed(&mut self, index_count: u32, start_index: u32, base_vertex: i32);

    /// `None` restores the default rasterizer state.
    fn set_rasterizer_state(&mut self, state: Option<RasterizerStateId>);

    /// `None` restores the default depth state.
    fn set_depth_stencil_state(&mut self, state: Option<DepthStencilStateId>);

    fn clear(&mut self, color: [f32; 4], depth: f32, stencil: u32);

    fn present(&mut self);

    /// Re-establish the color and depth targets after [`present`](Self::present).
    fn bind_render_targets(&mut self);
}

/// Upload a `Pod` value as a named uniform, using its exact byte size.
pub fn set_data<C, T>(ctx: &mut C, shader: ShaderId, name: &str, value: &T)
where
    C: GraphicsContext + ?Sized,
    T: bytemuck::Pod,
{
    ctx.set_uniform(shader, name, bytemuck::bytes_of(value));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_size_rounds_to_16() {
        let desc = ShaderDesc::pixel("test", ShaderSource::Wgsl("".into()))
            .uniform("a", 0, 48)
            .uniform("b", 48, 12)
            .uniform("c", 60, 4);
        assert_eq!(desc.uniform_block_size(), 64);

        let desc = ShaderDesc::pixel("test", ShaderSource::Wgsl("".into())).uniform("a", 0, 12);
        assert_eq!(desc.uniform_block_size(), 16);

        let desc = ShaderDesc::pixel("empty", ShaderSource::Wgsl("".into()));
        assert_eq!(desc.uniform_block_size(), 0);
    }

    #[test]
    fn shader_desc_lookups() {
        let desc = ShaderDesc::vertex("vs", ShaderSource::Wgsl("".into()))
            .uniform("world", 16, 64)
            .texture("albedo", 0, TextureKind::D2, Fallback::White)
            .sampler("sampler", 1);
        assert_eq!(desc.entry_point, "vs_main");
        assert_eq!(desc.find_uniform("world").map(|u| u.offset), Some(16));
        assert!(desc.find_uniform("view").is_none());
        assert_eq!(
            desc.find_resource("sampler").map(|r| r.kind),
            Some(ResourceKind::Sampler)
        );
    }

    #[test]
    fn texture_data_checks_length() {
        let srgb = ColorSpace::Srgb;
        assert!(TextureData::new_2d("ok", 2, 2, srgb, vec![0; 16]).is_ok());
        let err = TextureData::new_2d("short", 2, 2, srgb, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::TextureSize {
                expected: 16,
                actual: 15
            }
        ));
        assert!(TextureData::new_cube("cube", 2, srgb, vec![0; 96]).is_ok());
        assert!(TextureData::new_cube("cube", 2, srgb, vec![0; 16]).is_err());
    }

    #[test]
    fn missing_texture_file_is_an_error() {
        let result = TextureData::from_file(Path::new("does/not/exist.png"), ColorSpace::Srgb);
        assert!(matches!(result, Err(GraphicsError::Image(_))));
    }
}
