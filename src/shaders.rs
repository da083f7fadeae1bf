//! Built-in shader programs and the names they bind by.
//!
//! The entity shaders share one vertex program layout and two pixel program
//! layouts (with and without normal mapping). Both pixel layouts receive the
//! full light set, so the scene uploads lights to each of them.
//!
//! | Program | Group | Contents |
//! |---------|-------|----------|
//! | vertex  | 0     | [`names::COLOR_TINT`], [`names::WORLD`], [`names::VIEW`], [`names::PROJECTION`] |
//! | pixel   | 1     | lights, [`names::CAMERA_POSITION`], [`names::SPECULAR`] |
//! | pixel   | 2     | textures and sampler |

use crate::graphics::{Fallback, ShaderDesc, ShaderSource, TextureKind};
use crate::lights::{DirectionalLight, MAX_DIRECTIONAL_LIGHTS, MAX_POINT_LIGHTS, PointLight};

/// Uniform and resource names shared by the scene and the shaders.
pub mod names {
    pub const COLOR_TINT: &str = "color_tint";
    pub const WORLD: &str = "world";
    pub const VIEW: &str = "view";
    pub const PROJECTION: &str = "projection";

    pub const CAMERA_POSITION: &str = "camera_position";
    pub const SPECULAR: &str = "specular";
    pub const SURFACE_SAMPLER: &str = "surface_sampler";
    pub const ALBEDO: &str = "albedo";
    pub const ROUGHNESS_MAP: &str = "roughness_map";
    pub const METALNESS_MAP: &str = "metalness_map";
    pub const NORMAL_MAP: &str = "normal_map";

    pub const CUBE_MAP: &str = "cube_map";
    pub const SKY_SAMPLER: &str = "sky_sampler";

    /// Uniform name of the `index`th (zero-based) directional light.
    pub fn directional_light(index: usize) -> String {
        format!("directional_light_{}", index + 1)
    }

    /// Uniform name of the `index`th (zero-based) point light.
    pub fn point_light(index: usize) -> String {
        format!("point_light_{}", index + 1)
    }
}

const MAT4: u32 = 64;

/// Vertex program for lit entities.
pub fn lit_vertex() -> ShaderDesc {
    ShaderDesc::vertex(
        "lit_vs",
        ShaderSource::Wgsl(include_str!("shaders/lit_vs.wgsl").into()),
    )
    .uniform(names::COLOR_TINT, 0, 16)
    .uniform(names::WORLD, 16, MAT4)
    .uniform(names::VIEW, 80, MAT4)
    .uniform(names::PROJECTION, 144, MAT4)
}

/// Pixel program for lit entities without normal mapping.
pub fn lit_pixel() -> ShaderDesc {
    with_lighting(ShaderDesc::pixel(
        "lit_ps",
        ShaderSource::Wgsl(
            concat!(
                include_str!("shaders/lighting.wgsl"),
                include_str!("shaders/lit_ps.wgsl")
            )
            .into(),
        ),
    ))
}

/// Pixel program for lit entities with a tangent-space normal map.
pub fn normal_map_pixel() -> ShaderDesc {
    with_lighting(ShaderDesc::pixel(
        "normal_map_ps",
        ShaderSource::Wgsl(
            concat!(
                include_str!("shaders/lighting.wgsl"),
                include_str!("shaders/normal_map_ps.wgsl")
            )
            .into(),
        ),
    ))
    .texture(names::NORMAL_MAP, 4, TextureKind::D2, Fallback::FlatNormal)
}

/// Vertex program for the sky: view and projection only.
pub fn sky_vertex() -> ShaderDesc {
    ShaderDesc::vertex(
        "sky_vs",
        ShaderSource::Wgsl(include_str!("shaders/sky_vs.wgsl").into()),
    )
    .uniform(names::VIEW, 0, MAT4)
    .uniform(names::PROJECTION, MAT4, MAT4)
}

/// Pixel program for the sky: one cube map.
pub fn sky_pixel() -> ShaderDesc {
    ShaderDesc::pixel(
        "sky_ps",
        ShaderSource::Wgsl(include_str!("shaders/sky_ps.wgsl").into()),
    )
    .texture(names::CUBE_MAP, 0, TextureKind::Cube, Fallback::Black)
    .sampler(names::SKY_SAMPLER, 1)
}

// Mirrors `PixelUniforms` in lit_ps.wgsl and normal_map_ps.wgsl.
fn with_lighting(mut desc: ShaderDesc) -> ShaderDesc {
    let directional = size_of::<DirectionalLight>() as u32;
    let point = size_of::<PointLight>() as u32;

    let mut offset = 0;
    for i in 0..MAX_DIRECTIONAL_LIGHTS {
        desc = desc.uniform(names::directional_light(i), offset, directional);
        offset += directional;
    }
    for i in 0..MAX_POINT_LIGHTS {
        desc = desc.uniform(names::point_light(i), offset, point);
        offset += point;
    }

    desc.uniform(names::CAMERA_POSITION, offset, 12)
        .uniform(names::SPECULAR, offset + 12, 4)
        .texture(names::ALBEDO, 0, TextureKind::D2, Fallback::White)
        .texture(names::ROUGHNESS_MAP, 1, TextureKind::D2, Fallback::White)
        .texture(names::METALNESS_MAP, 2, TextureKind::D2, Fallback::Black)
        .sampler(names::SURFACE_SAMPLER, 3)
}
