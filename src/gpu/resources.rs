//! Conversions from backend descriptors to wgpu objects.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::graphics::{
    AddressMode, ColorSpace, CompareFunction, CullMode, DepthStencilDesc, Fallback, FillMode,
    FilterMode, RasterizerDesc, SamplerDesc, TextureData, TextureKind,
};

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// An uploaded texture and the view shaders sample.
#[derive(Debug)]
pub(crate) struct GpuTexture {
    #[allow(dead_code)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub kind: TextureKind,
}

pub(crate) fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    data: &TextureData,
) -> GpuTexture {
    let format = match data.color_space {
        ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
    };

    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(&data.label),
            size: wgpu::Extent3d {
                width: data.width,
                height: data.height,
                depth_or_array_layers: data.layer_count(),
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &data.pixels,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some(&data.label),
        dimension: Some(view_dimension(data.kind)),
        ..Default::default()
    });

    GpuTexture {
        texture,
        view,
        kind: data.kind,
    }
}

pub(crate) fn view_dimension(kind: TextureKind) -> wgpu::TextureViewDimension {
    match kind {
        TextureKind::D2 => wgpu::TextureViewDimension::D2,
        TextureKind::Cube => wgpu::TextureViewDimension::Cube,
    }
}

/// One 1x1 texture per fallback color and texture kind.
pub(crate) fn create_fallbacks(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> HashMap<(Fallback, TextureKind), GpuTexture> {
    let mut fallbacks = HashMap::new();
    for fallback in [Fallback::White, Fallback::Black, Fallback::FlatNormal] {
        let (texel, color_space) = match fallback {
            Fallback::White => ([255, 255, 255, 255], ColorSpace::Srgb),
            Fallback::Black => ([0, 0, 0, 255], ColorSpace::Srgb),
            Fallback::FlatNormal => ([128, 128, 255, 255], ColorSpace::Linear),
        };
        for kind in [TextureKind::D2, TextureKind::Cube] {
            let mut data = TextureData::solid(format!("fallback {fallback:?}"), texel, color_space);
            data.kind = kind;
            data.pixels = texel.repeat(data.layer_count() as usize);
            fallbacks.insert((fallback, kind), upload_texture(device, queue, &data));
        }
    }
    fallbacks
}

pub(crate) fn create_sampler(device: &wgpu::Device, desc: &SamplerDesc) -> wgpu::Sampler {
    let address_mode = match desc.address_mode {
        AddressMode::Wrap => wgpu::AddressMode::Repeat,
        AddressMode::Clamp => wgpu::AddressMode::ClampToEdge,
        AddressMode::Mirror => wgpu::AddressMode::MirrorRepeat,
    };
    let filter = match desc.filter {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    };

    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Surface Sampler"),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

pub(crate) fn create_buffer(
    device: &wgpu::Device,
    label: &str,
    contents: &[u8],
    usage: wgpu::BufferUsages,
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents,
        usage,
    })
}

/// `wireframe_supported` reflects `POLYGON_MODE_LINE`; without it wireframe
/// falls back to solid fill.
pub(crate) fn primitive_state(
    desc: &RasterizerDesc,
    wireframe_supported: bool,
) -> wgpu::PrimitiveState {
    let polygon_mode = match desc.fill {
        FillMode::Wireframe if wireframe_supported => wgpu::PolygonMode::Line,
        _ => wgpu::PolygonMode::Fill,
    };
    let cull_mode = match desc.cull {
        CullMode::None => None,
        CullMode::Front => Some(wgpu::Face::Front),
        CullMode::Back => Some(wgpu::Face::Back),
    };

    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        front_face: wgpu::FrontFace::Cw,
        cull_mode,
        polygon_mode,
        ..Default::default()
    }
}

pub(crate) fn depth_stencil_state(desc: &DepthStencilDesc) -> wgpu::DepthStencilState {
    let depth_compare = if desc.depth_test {
        compare_function(desc.compare)
    } else {
        wgpu::CompareFunction::Always
    };

    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: desc.depth_test && desc.depth_write,
        depth_compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

fn compare_function(compare: CompareFunction) -> wgpu::CompareFunction {
    match compare {
        CompareFunction::Never => wgpu::CompareFunction::Never,
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::Equal => wgpu::CompareFunction::Equal,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Greater => wgpu::CompareFunction::Greater,
        CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

/// The depth-stencil target and the size it was created for.
pub(crate) struct DepthTarget {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub size: (u32, u32),
}

impl DepthTarget {
    pub(crate) fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Stencil Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            size: (width, height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rasterizer_culls_back_faces_clockwise_front() {
        let state = primitive_state(&RasterizerDesc::default(), true);
        assert_eq!(state.cull_mode, Some(wgpu::Face::Back));
        assert_eq!(state.front_face, wgpu::FrontFace::Cw);
        assert_eq!(state.polygon_mode, wgpu::PolygonMode::Fill);
    }

    #[test]
    fn wireframe_needs_device_support() {
        let desc = RasterizerDesc {
            fill: FillMode::Wireframe,
            cull: CullMode::None,
        };
        assert_eq!(
            primitive_state(&desc, true).polygon_mode,
            wgpu::PolygonMode::Line
        );
        assert_eq!(
            primitive_state(&desc, false).polygon_mode,
            wgpu::PolygonMode::Fill
        );
        assert_eq!(primitive_state(&desc, true).cull_mode, None);
    }

    #[test]
    fn sky_depth_state_tests_without_writing() {
        let state = depth_stencil_state(&DepthStencilDesc {
            depth_test: true,
            depth_write: false,
            compare: CompareFunction::LessEqual,
        });
        assert!(!state.depth_write_enabled);
        assert_eq!(state.depth_compare, wgpu::CompareFunction::LessEqual);
        assert_eq!(state.format, DEPTH_FORMAT);
    }

    #[test]
    fn disabled_depth_test_always_passes_and_never_writes() {
        let state = depth_stencil_state(&DepthStencilDesc {
            depth_test: false,
            depth_write: true,
            compare: CompareFunction::Less,
        });
        assert!(!state.depth_write_enabled);
        assert_eq!(state.depth_compare, wgpu::CompareFunction::Always);
    }
}
