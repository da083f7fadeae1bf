//! Vertex format, CPU-side geometry and uploaded meshes.
//!
//! - [`Vertex3d`]: position, normal and UV, 32 bytes per vertex
//! - [`MeshData`]: vertices and indices on the CPU, with built-in primitives
//! - [`Mesh`]: buffer handles and the index count needed to draw
//!
//! ```
//! use vantage::{MeshData, Mesh, RecordingContext};
//!
//! let mut ctx = RecordingContext::new();
//! let sphere = Mesh::new(&mut ctx, &MeshData::sphere(32, 16)).unwrap();
//! assert_eq!(sphere.index_count(), 32 * 16 * 6);
//! ```
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |
//!
//! # Winding Order
//!
//! The primitives are authored counter-clockwise in right-handed coordinates,
//! which is clockwise as seen through the crate's left-handed camera. The
//! default rasterizer state treats clockwise faces as front faces.

use std::f32::consts::{PI, TAU};

use crate::error::GraphicsError;
use crate::graphics::{BufferId, GraphicsContext};

/// A vertex with position, normal and texture coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// Size of one vertex in bytes.
    pub const STRIDE: u32 = std::mem::size_of::<Vertex3d>() as u32;

    /// The wgpu vertex buffer layout for this vertex type.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: Self::STRIDE as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Geometry waiting to be uploaded.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// A unit cube centered at the origin, four vertices per face.
    pub fn cube() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            // Front face (Z+)
            Vertex3d::new([-0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0], [0.0, 1.0]),
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0], [1.0, 1.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0], [1.0, 0.0]),
            Vertex3d::new([-0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0], [0.0, 0.0]),
            // Back face (Z-)
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0], [0.0, 1.0]),
            Vertex3d::new([-0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0], [1.0, 1.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0], [0.0, 0.0]),
            // Top face (Y+)
            Vertex3d::new([-0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0], [0.0, 1.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0], [0.0, 0.0]),
            // Bottom face (Y-)
            Vertex3d::new([-0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0], [0.0, 1.0]),
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([-0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0], [0.0, 0.0]),
            // Right face (X+)
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 1.0,  0.0,  0.0], [0.0, 1.0]),
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 1.0,  0.0,  0.0], [0.0, 0.0]),
            // Left face (X-)
            Vertex3d::new([-0.5, -0.5, -0.5], [-1.0,  0.0,  0.0], [0.0, 1.0]),
            Vertex3d::new([-0.5, -0.5,  0.5], [-1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-0.5,  0.5,  0.5], [-1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [-1.0,  0.0,  0.0], [0.0, 0.0]),
        ];

        let indices = (0..6u32)
            .flat_map(|face| [0, 1, 2, 2, 3, 0].map(|i| face * 4 + i))
            .collect();

        Self::new(vertices, indices)
    }

    /// A UV sphere of radius 0.5 centered at the origin.
    ///
    /// `segments` divides the equator, `rings` divides pole to pole.
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
        let mut indices = Vec::with_capacity((segments * rings * 6) as usize);

        for ring in 0..=rings {
            let phi = PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for seg in 0..=segments {
                let theta = TAU * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                vertices.push(Vertex3d::new(
                    [x * 0.5, y * 0.5, z * 0.5],
                    [x, y, z],
                    [seg as f32 / segments as f32, ring as f32 / rings as f32],
                ));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;
                indices.extend_from_slice(&[current, current + 1, next]);
                indices.extend_from_slice(&[current + 1, next + 1, next]);
            }
        }

        Self::new(vertices, indices)
    }

    /// A closed cylinder of radius 0.5 and height 1 around the Y axis.
    pub fn cylinder(segments: u32) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        // Side wall, with a duplicated seam column so UVs wrap cleanly.
        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let theta = TAU * u;
            let (x, z) = (theta.cos(), theta.sin());
            vertices.push(Vertex3d::new(
                [x * 0.5, -0.5, z * 0.5],
                [x, 0.0, z],
                [u, 1.0],
            ));
            vertices.push(Vertex3d::new(
                [x * 0.5, 0.5, z * 0.5],
                [x, 0.0, z],
                [u, 0.0],
            ));
        }
        for seg in 0..segments {
            let bottom = seg * 2;
            let top = bottom + 1;
            let next_bottom = bottom + 2;
            let next_top = bottom + 3;
            indices.extend_from_slice(&[bottom, top, next_bottom]);
            indices.extend_from_slice(&[next_bottom, top, next_top]);
        }

        // Caps: a center vertex plus a rim per cap.
        for (y, normal_y) in [(0.5f32, 1.0f32), (-0.5, -1.0)] {
            let center = vertices.len() as u32;
            vertices.push(Vertex3d::new(
                [0.0, y, 0.0],
                [0.0, normal_y, 0.0],
                [0.5, 0.5],
            ));
            for seg in 0..=segments {
                let theta = TAU * seg as f32 / segments as f32;
                let (x, z) = (theta.cos(), theta.sin());
                vertices.push(Vertex3d::new(
                    [x * 0.5, y, z * 0.5],
                    [0.0, normal_y, 0.0],
                    [0.5 + x * 0.5, 0.5 - z * 0.5],
                ));
            }
            for seg in 0..segments {
                let rim = center + 1 + seg;
                if normal_y > 0.0 {
                    indices.extend_from_slice(&[center, rim + 1, rim]);
                } else {
                    indices.extend_from_slice(&[center, rim, rim + 1]);
                }
            }
        }

        Self::new(vertices, indices)
    }

    /// A square plane on XZ facing +Y.
    pub fn plane(size: f32) -> Self {
        let half = size * 0.5;
        let vertices = vec![
            Vertex3d::new([-half, 0.0, -half], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([-half, 0.0, half], [0.0, 1.0, 0.0], [0.0, 1.0]),
            Vertex3d::new([half, 0.0, half], [0.0, 1.0, 0.0], [1.0, 1.0]),
            Vertex3d::new([half, 0.0, -half], [0.0, 1.0, 0.0], [1.0, 0.0]),
        ];
        Self::new(vertices, vec![0, 1, 2, 2, 3, 0])
    }
}

/// Uploaded geometry: immutable vertex and index buffers plus what it takes to
/// draw them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mesh {
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    index_count: u32,
    stride: u32,
}

impl Mesh {
    /// Upload `data` to the backend.
    pub fn new<C>(ctx: &mut C, data: &MeshData) -> Result<Self, GraphicsError>
    where
        C: GraphicsContext + ?Sized,
    {
        let vertex_buffer = ctx.create_vertex_buffer(&data.vertices)?;
        let index_buffer = ctx.create_index_buffer(&data.indices)?;
        log::debug!(
            "uploaded mesh: {} vertices, {} indices",
            data.vertices.len(),
            data.indices.len()
        );
        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
            stride: Vertex3d::STRIDE,
        })
    }

    pub fn vertex_buffer(&self) -> BufferId {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> BufferId {
        self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Bytes per vertex.
    pub fn stride(&self) -> u32 {
        self.stride
    }
}
