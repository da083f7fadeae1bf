//! A cube-mapped sky drawn behind everything else.
//!
//! The sky is a unit cube seen from the inside. Its vertex program drops the
//! view translation and pushes every vertex to the far plane, so it renders
//! with front faces culled and a `LessEqual` depth test that never writes.

use std::path::Path;

use crate::assets::Assets;
use crate::camera::Camera;
use crate::drawable::{Drawable, submit_indexed};
use crate::error::GraphicsError;
use crate::graphics::{
    CompareFunction, CullMode, DepthStencilDesc, DepthStencilStateId, FillMode, GraphicsContext,
    RasterizerDesc, RasterizerStateId, SamplerId, ShaderDesc, ShaderId, TextureId, set_data,
};
use crate::mesh::Mesh;
use crate::shaders::names;

pub struct Sky {
    mesh: Mesh,
    cube_map: TextureId,
    sampler: SamplerId,
    vertex_shader: ShaderId,
    pixel_shader: ShaderId,
    rasterizer_state: RasterizerStateId,
    depth_state: DepthStencilStateId,
}

impl Sky {
    /// Build a sky from a cube-map image on disk.
    ///
    /// Creates the sky's render states, loads the cube map and compiles both
    /// shader programs, in that order.
    pub fn new(
        ctx: &mut dyn GraphicsContext,
        mesh: Mesh,
        sampler: SamplerId,
        cube_map: &Path,
        vertex_shader: &ShaderDesc,
        pixel_shader: &ShaderDesc,
    ) -> Result<Self, GraphicsError> {
        let (rasterizer_state, depth_state) = Self::create_states(ctx)?;
        let cube_map = ctx.load_cube_map(cube_map)?;
        log::info!("Loaded sky cube map");
        Self::assemble(
            ctx,
            mesh,
            sampler,
            cube_map,
            vertex_shader,
            pixel_shader,
            rasterizer_state,
            depth_state,
        )
    }

    /// Build a sky around an already uploaded cube-map texture.
    pub fn from_texture(
        ctx: &mut dyn GraphicsContext,
        mesh: Mesh,
        sampler: SamplerId,
        cube_map: TextureId,
        vertex_shader: &ShaderDesc,
        pixel_shader: &ShaderDesc,
    ) -> Result<Self, GraphicsError> {
        let (rasterizer_state, depth_state) = Self::create_states(ctx)?;
        Self::assemble(
            ctx,
            mesh,
            sampler,
            cube_map,
            vertex_shader,
            pixel_shader,
            rasterizer_state,
            depth_state,
        )
    }

    fn create_states(
        ctx: &mut dyn GraphicsContext,
    ) -> Result<(RasterizerStateId, DepthStencilStateId), GraphicsError> {
        let rasterizer = ctx.create_rasterizer_state(&RasterizerDesc {
            fill: FillMode::Solid,
            cull: CullMode::Front,
        })?;
        let depth = ctx.create_depth_stencil_state(&DepthStencilDesc {
            depth_test: true,
            depth_write: false,
            compare: CompareFunction::LessEqual,
        })?;
        Ok((rasterizer, depth))
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        ctx: &mut dyn GraphicsContext,
        mesh: Mesh,
        sampler: SamplerId,
        cube_map: TextureId,
        vertex_shader: &ShaderDesc,
        pixel_shader: &ShaderDesc,
        rasterizer_state: RasterizerStateId,
        depth_state: DepthStencilStateId,
    ) -> Result<Self, GraphicsError> {
        let vertex_shader = ctx.load_shader(vertex_shader)?;
        let pixel_shader = ctx.load_shader(pixel_shader)?;
        Ok(Self {
            mesh,
            cube_map,
            sampler,
            vertex_shader,
            pixel_shader,
            rasterizer_state,
            depth_state,
        })
    }

    pub fn cube_map(&self) -> TextureId {
        self.cube_map
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}

impl Drawable for Sky {
    fn draw(&mut self, ctx: &mut dyn GraphicsContext, camera: &Camera, _assets: &Assets) {
        ctx.set_rasterizer_state(Some(self.rasterizer_state));
        ctx.set_depth_stencil_state(Some(self.depth_state));

        ctx.set_shader(self.vertex_shader);
        ctx.set_shader(self.pixel_shader);

        ctx.set_texture(self.pixel_shader, names::CUBE_MAP, Some(self.cube_map));
        ctx.set_sampler(self.pixel_shader, names::SKY_SAMPLER, self.sampler);
        ctx.commit(self.pixel_shader);

        set_data(
            ctx,
            self.vertex_shader,
            names::VIEW,
            &camera.view_matrix().to_cols_array(),
        );
        set_data(
            ctx,
            self.vertex_shader,
            names::PROJECTION,
            &camera.projection_matrix().to_cols_array(),
        );
        ctx.commit(self.vertex_shader);

        submit_indexed(ctx, &self.mesh);

        // Later draws get the default states back.
        ctx.set_rasterizer_state(None);
        ctx.set_depth_stencil_state(None);
    }
}
