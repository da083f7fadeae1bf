//! Procedural textures, used when no image files are available.
//!
//! Every surface is generated from one per-texel sample: a base color, a
//! height, a roughness and a metalness. The normal map is derived from the
//! height field, so albedo and bumps always line up.

use crate::graphics::{ColorSpace, TextureData};

/// The material surfaces the generator knows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Surface {
    Cobblestone,
    Wood,
    Bronze,
    Scratched,
    Paint,
    Floor,
}

impl Surface {
    pub const ALL: [Surface; 6] = [
        Surface::Cobblestone,
        Surface::Wood,
        Surface::Bronze,
        Surface::Scratched,
        Surface::Paint,
        Surface::Floor,
    ];

    /// File-name stem used for on-disk textures, e.g. `cobblestone_albedo.png`.
    pub fn name(self) -> &'static str {
        match self {
            Surface::Cobblestone => "cobblestone",
            Surface::Wood => "wood",
            Surface::Bronze => "bronze",
            Surface::Scratched => "scratched",
            Surface::Paint => "paint",
            Surface::Floor => "floor",
        }
    }
}

/// The four maps of one generated surface.
#[derive(Clone, Debug)]
pub struct SurfaceTextures {
    pub albedo: TextureData,
    pub normal: TextureData,
    pub roughness: TextureData,
    pub metalness: TextureData,
}

#[derive(Clone, Copy)]
struct Texel {
    color: [u8; 3],
    height: f32,
    roughness: f32,
    metalness: f32,
}

/// Generate all four maps of `surface` at `size x size` texels.
pub fn surface(surface: Surface, size: u32, seed: u32) -> SurfaceTextures {
    let size = size.max(1);
    let texels: Vec<Texel> = (0..size * size)
        .map(|i| sample(surface, i % size, i / size, size, seed))
        .collect();

    let name = surface.name();
    let rgba = |f: &dyn Fn(&Texel) -> [u8; 4]| -> Vec<u8> {
        texels.iter().flat_map(f).collect()
    };

    let albedo = rgba(&|t: &Texel| [t.color[0], t.color[1], t.color[2], 255]);
    let roughness = rgba(&|t: &Texel| {
        let v = unorm(t.roughness);
        [v, v, v, 255]
    });
    let metalness = rgba(&|t: &Texel| {
        let v = unorm(t.metalness);
        [v, v, v, 255]
    });
    let heights: Vec<f32> = texels.iter().map(|t| t.height).collect();

    SurfaceTextures {
        albedo: texture(format!("{name}_albedo"), size, ColorSpace::Srgb, albedo),
        normal: texture(
            format!("{name}_normals"),
            size,
            ColorSpace::Linear,
            normal_map(&heights, size, 4.0),
        ),
        roughness: texture(
            format!("{name}_roughness"),
            size,
            ColorSpace::Linear,
            roughness,
        ),
        metalness: texture(format!("{name}_metal"), size, ColorSpace::Linear, metalness),
    }
}

/// A star field cube map: six `size x size` faces of dark sky with scattered
/// stars.
pub fn starfield_cube(size: u32, seed: u32) -> TextureData {
    let size = size.max(1);
    let mut pixels = Vec::with_capacity((size * size * 4 * 6) as usize);
    for face in 0..6u32 {
        for y in 0..size {
            for x in 0..size {
                let h = hash(x, y, seed.wrapping_add(face.wrapping_mul(7919)));
                // +Y is the darkest face, -Y the lightest.
                let base = match face {
                    2 => [2, 3, 10],
                    3 => [8, 10, 20],
                    _ => [4, 6, 16],
                };
                let pixel = if h % 97 == 0 {
                    let brightness = 160 + (hash(x + 31, y + 17, seed) % 96) as u8;
                    [brightness, brightness, brightness.saturating_sub(20), 255]
                } else {
                    [base[0], base[1], base[2], 255]
                };
                pixels.extend_from_slice(&pixel);
            }
        }
    }

    TextureData {
        label: "starfield".to_string(),
        width: size,
        height: size,
        kind: crate::graphics::TextureKind::Cube,
        color_space: ColorSpace::Srgb,
        pixels,
    }
}

fn sample(surface: Surface, x: u32, y: u32, size: u32, seed: u32) -> Texel {
    let noise = (hash(x, y, seed) % 1024) as f32 / 1023.0;
    let jitter = |base: [u8; 3], amount: i32| -> [u8; 3] {
        let v = (hash(x + 1000, y + 1000, seed) % (2 * amount as u32 + 1)) as i32 - amount;
        base.map(|c| (c as i32 + v).clamp(0, 255) as u8)
    };
    let u = x as f32 / size as f32;
    let v = y as f32 / size as f32;

    match surface {
        Surface::Cobblestone => {
            // Stones on an offset grid of eight per side, separated by mortar.
            let cell = (size / 8).max(2);
            let row = y / cell;
            let shifted = x + if row % 2 == 0 { 0 } else { cell / 2 };
            let (cx, cy) = (shifted % cell, y % cell);
            let stone = hash(shifted / cell, row, seed);
            let in_mortar = cx == 0 || cy == 0;

            let grays: [[u8; 3]; 4] = [
                [128, 126, 122],
                [104, 102, 100],
                [146, 142, 136],
                [92, 90, 88],
            ];
            let edge = cx.min(cell - cx).min(cy).min(cell - cy) as f32 / (cell as f32 / 2.0);
            if in_mortar {
                Texel {
                    color: jitter([70, 66, 60], 6),
                    height: 0.0,
                    roughness: 1.0,
                    metalness: 0.0,
                }
            } else {
                Texel {
                    color: jitter(grays[(stone % 4) as usize], 10),
                    height: edge.sqrt() * 0.8 + noise * 0.2,
                    roughness: 0.85 + noise * 0.15,
                    metalness: 0.0,
                }
            }
        }
        Surface::Wood => {
            let plank_count = 4;
            let plank = (u * plank_count as f32) as u32;
            let grain = ((v * 40.0 + hash(plank, 0, seed) as f32 % 7.0).sin() * 0.5 + 0.5) * 0.6
                + noise * 0.4;
            let tone = hash(plank, 1, seed) % 30;
            let base = [120 + tone as u8, 78 + (tone / 2) as u8, 42];
            let seam = (u * plank_count as f32).fract() < 0.03;
            Texel {
                color: if seam {
                    [50, 32, 18]
                } else {
                    jitter(scale(base, 0.75 + grain * 0.25), 4)
                },
                height: if seam { 0.0 } else { 0.6 + grain * 0.4 },
                roughness: 0.6 + grain * 0.2,
                metalness: 0.0,
            }
        }
        Surface::Bronze => Texel {
            color: jitter([176, 120, 64], 6),
            height: noise * 0.1,
            roughness: 0.35 + noise * 0.1,
            metalness: 1.0,
        },
        Surface::Scratched => {
            // Brushed steel with a handful of long diagonal scratches.
            let brushed = (hash(0, y, seed) % 64) as f32 / 63.0;
            let diagonal = (x + y) % size.max(1);
            let scratch = hash(diagonal, 0, seed.wrapping_add(77)) % 23 == 0;
            Texel {
                color: jitter(scale([180, 182, 186], 0.85 + brushed * 0.15), 3),
                height: if scratch { 0.0 } else { 0.5 + brushed * 0.1 },
                roughness: if scratch { 0.7 } else { 0.25 + brushed * 0.1 },
                metalness: 1.0,
            }
        }
        Surface::Paint => {
            // Painted metal with chips showing through.
            let chip = hash(x / 3, y / 3, seed.wrapping_add(5)) % 41 == 0;
            if chip {
                Texel {
                    color: jitter([140, 140, 145], 8),
                    height: 0.0,
                    roughness: 0.4,
                    metalness: 1.0,
                }
            } else {
                Texel {
                    color: jitter([40, 90, 160], 5),
                    height: 0.3 + noise * 0.05,
                    roughness: 0.55,
                    metalness: 0.0,
                }
            }
        }
        Surface::Floor => {
            let tiles = 4.0;
            let (tu, tv) = ((u * tiles).fract(), (v * tiles).fract());
            let grout = tu < 0.04 || tv < 0.04;
            let checker = ((u * tiles) as u32 + (v * tiles) as u32) % 2 == 0;
            let base = if checker { [200, 196, 188] } else { [60, 58, 56] };
            Texel {
                color: if grout { [110, 106, 100] } else { jitter(base, 5) },
                height: if grout { 0.0 } else { 0.7 },
                roughness: if grout { 0.95 } else { 0.3 + noise * 0.1 },
                metalness: 0.0,
            }
        }
    }
}

/// Tangent-space normals from a wrapping height field, encoded as RGBA8.
fn normal_map(heights: &[f32], size: u32, strength: f32) -> Vec<u8> {
    let at = |x: i64, y: i64| {
        let s = size as i64;
        heights[(y.rem_euclid(s) * s + x.rem_euclid(s)) as usize]
    };

    let mut pixels = Vec::with_capacity(heights.len() * 4);
    for y in 0..size as i64 {
        for x in 0..size as i64 {
            let dx = (at(x + 1, y) - at(x - 1, y)) * strength;
            let dy = (at(x, y + 1) - at(x, y - 1)) * strength;
            let n = glam::Vec3::new(-dx, -dy, 1.0).normalize();
            pixels.extend_from_slice(&[
                unorm(n.x * 0.5 + 0.5),
                unorm(n.y * 0.5 + 0.5),
                unorm(n.z * 0.5 + 0.5),
                255,
            ]);
        }
    }
    pixels
}

fn texture(label: String, size: u32, color_space: ColorSpace, pixels: Vec<u8>) -> TextureData {
    TextureData {
        label,
        width: size,
        height: size,
        kind: crate::graphics::TextureKind::D2,
        color_space,
        pixels,
    }
}

fn scale(color: [u8; 3], factor: f32) -> [u8; 3] {
    color.map(|c| (c as f32 * factor).clamp(0.0, 255.0) as u8)
}

fn unorm(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_add(x.wrapping_mul(374761393));
    h = h.wrapping_add(y.wrapping_mul(668265263));
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::TextureKind;

    #[test]
    fn every_surface_has_four_full_maps() {
        for kind in Surface::ALL {
            let maps = surface(kind, 16, 3);
            for map in [&maps.albedo, &maps.normal, &maps.roughness, &maps.metalness] {
                assert_eq!(map.pixels.len(), 16 * 16 * 4, "{}", map.label);
                assert_eq!(map.kind, TextureKind::D2);
            }
            assert_eq!(maps.albedo.color_space, ColorSpace::Srgb);
            assert_eq!(maps.normal.color_space, ColorSpace::Linear);
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let a = surface(Surface::Cobblestone, 8, 42);
        let b = surface(Surface::Cobblestone, 8, 42);
        assert_eq!(a.albedo.pixels, b.albedo.pixels);
        assert_eq!(a.normal.pixels, b.normal.pixels);
    }

    #[test]
    fn flat_height_field_points_straight_out() {
        let pixels = normal_map(&[0.5; 16], 4, 4.0);
        for texel in pixels.chunks_exact(4) {
            assert_eq!(texel, [128, 128, 255, 255]);
        }
    }

    #[test]
    fn metals_are_metallic() {
        let bronze = surface(Surface::Bronze, 4, 1);
        assert!(bronze.metalness.pixels.chunks_exact(4).all(|t| t[0] == 255));
        let wood = surface(Surface::Wood, 4, 1);
        assert!(wood.metalness.pixels.chunks_exact(4).all(|t| t[0] == 0));
    }

    #[test]
    fn starfield_has_six_faces() {
        let cube = starfield_cube(8, 9);
        assert_eq!(cube.kind, TextureKind::Cube);
        assert_eq!(cube.layer_count(), 6);
        assert_eq!(cube.pixels.len(), 8 * 8 * 4 * 6);
    }
}
