//! A placed mesh with a material.
//!
//! Drawing an entity follows a fixed sequence against the backend:
//!
//! 1. bind the material's vertex and pixel programs
//! 2. vertex uniforms: tint, world, view, projection
//! 3. pixel uniforms and resources: camera position, specularity, sampler,
//!    albedo, roughness and metalness maps, and the normal map only if the
//!    material has one
//! 4. commit both programs
//! 5. bind the mesh's buffers and draw every index

use crate::assets::{Assets, MaterialId, MeshId};
use crate::camera::Camera;
use crate::drawable::{Drawable, submit_indexed};
use crate::graphics::{GraphicsContext, set_data};
use crate::shaders::names;
use crate::transform::Transform;

/// An object in the scene: its own transform plus shared geometry and material.
#[derive(Clone, Debug)]
pub struct Entity {
    transform: Transform,
    mesh: MeshId,
    material: MaterialId,
}

impl Entity {
    pub fn new(mesh: MeshId, material: MaterialId) -> Self {
        Self {
            transform: Transform::new(),
            mesh,
            material,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }
}

impl Drawable for Entity {
    fn draw(&mut self, ctx: &mut dyn GraphicsContext, camera: &Camera, assets: &Assets) {
        let material = assets.material(self.material);
        let vs = material.vertex_shader();
        let ps = material.pixel_shader();

        ctx.set_shader(vs);
        ctx.set_shader(ps);

        set_data(
            ctx,
            vs,
            names::COLOR_TINT,
            &material.color_tint().to_array(),
        );
        set_data(
            ctx,
            vs,
            names::WORLD,
            &self.transform.world_matrix().to_cols_array(),
        );
        set_data(ctx, vs, names::VIEW, &camera.view_matrix().to_cols_array());
        set_data(
            ctx,
            vs,
            names::PROJECTION,
            &camera.projection_matrix().to_cols_array(),
        );

        set_data(
            ctx,
            ps,
            names::CAMERA_POSITION,
            &camera.position().to_array(),
        );
        set_data(ctx, ps, names::SPECULAR, &material.specularity());
        ctx.set_sampler(ps, names::SURFACE_SAMPLER, material.sampler());
        ctx.set_texture(ps, names::ALBEDO, Some(material.albedo()));
        ctx.set_texture(ps, names::ROUGHNESS_MAP, material.roughness_map());
        ctx.set_texture(ps, names::METALNESS_MAP, material.metalness_map());
        if let Some(normal_map) = material.normal_map() {
            ctx.set_texture(ps, names::NORMAL_MAP, Some(normal_map));
        }

        ctx.commit(vs);
        ctx.commit(ps);

        submit_indexed(ctx, assets.mesh(self.mesh));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraSettings;
    use crate::graphics::{ColorSpace, SamplerDesc, TextureData};
    use crate::material::Material;
    use crate::mesh::{Mesh, MeshData};
    use crate::recording::{GpuCall, RecordingContext};
    use crate::shaders;
    use glam::{Mat4, Vec3};

    struct Fixture {
        ctx: RecordingContext,
        assets: Assets,
        camera: Camera,
        material: MaterialId,
        mesh: MeshId,
    }

    fn fixture(with_normal_map: bool) -> Fixture {
        let mut ctx = RecordingContext::new();
        let vs = ctx.load_shader(&shaders::lit_vertex()).unwrap();
        let ps = ctx.load_shader(&shaders::normal_map_pixel()).unwrap();
        let white = TextureData::solid("white", [255; 4], ColorSpace::Srgb);
        let albedo = ctx.create_texture(&white).unwrap();
        let normal = ctx.create_texture(&white).unwrap();
        let sampler = ctx.create_sampler(&SamplerDesc::default()).unwrap();

        let mut material = Material::new(vs, ps, albedo, sampler).with_specularity(0.75);
        if with_normal_map {
            material = material.with_normal_map(normal);
        }

        let mut assets = Assets::new();
        let mesh = assets.add_mesh(Mesh::new(&mut ctx, &MeshData::cube()).unwrap());
        let material = assets.add_material(material);
        ctx.clear_calls();

        let camera = Camera::new(
            Vec3::new(0.0, 0.0, -2.0),
            Vec3::ZERO,
            1.5,
            CameraSettings::default(),
        );
        Fixture {
            ctx,
            assets,
            camera,
            material,
            mesh,
        }
    }

    #[test]
    fn draw_follows_the_bind_upload_commit_submit_sequence() {
        let mut f = fixture(true);
        let mut entity = Entity::new(f.mesh, f.material);
        entity.draw(&mut f.ctx, &f.camera, &f.assets);

        let material = f.assets.material(f.material);
        let (vs, ps) = (material.vertex_shader(), material.pixel_shader());
        let mesh = f.assets.mesh(f.mesh);

        let summary: Vec<String> = f
            .ctx
            .calls()
            .iter()
            .map(|call| match call {
                GpuCall::SetShader(s) => format!("shader {}", s.index()),
                GpuCall::SetUniform { shader, name, .. } => {
                    format!("uniform {} {name}", shader.index())
                }
                GpuCall::SetTexture { shader, name, .. } => {
                    format!("texture {} {name}", shader.index())
                }
                GpuCall::SetSampler { shader, name, .. } => {
                    format!("sampler {} {name}", shader.index())
                }
                GpuCall::Commit(s) => format!("commit {}", s.index()),
                GpuCall::SetVertexBuffer { .. } => "vertex buffer".into(),
                GpuCall::SetIndexBuffer(_) => "index buffer".into(),
                GpuCall::DrawIndexed { .. } => "draw".into(),
                other => format!("{other:?}"),
            })
            .collect();

        let (v, p) = (vs.index(), ps.index());
        let expected = vec![
            format!("shader {v}"),
            format!("shader {p}"),
            format!("uniform {v} color_tint"),
            format!("uniform {v} world"),
            format!("uniform {v} view"),
            format!("uniform {v} projection"),
            format!("uniform {p} camera_position"),
            format!("uniform {p} specular"),
            format!("sampler {p} surface_sampler"),
            format!("texture {p} albedo"),
            format!("texture {p} roughness_map"),
            format!("texture {p} metalness_map"),
            format!("texture {p} normal_map"),
            format!("commit {v}"),
            format!("commit {p}"),
            "vertex buffer".to_string(),
            "index buffer".to_string(),
            "draw".to_string(),
        ];
        assert_eq!(summary, expected);

        assert_eq!(
            f.ctx.draw_calls().collect::<Vec<_>>(),
            vec![(mesh.index_count(), 0, 0)]
        );
        assert!(f.ctx.calls().contains(&GpuCall::SetVertexBuffer {
            buffer: mesh.vertex_buffer(),
            stride: 32,
        }));
    }

    #[test]
    fn missing_normal_map_is_never_bound() {
        let mut f = fixture(false);
        let mut entity = Entity::new(f.mesh, f.material);
        entity.draw(&mut f.ctx, &f.camera, &f.assets);

        let mut bound = f.ctx.texture_bindings();
        assert!(bound.all(|name| name != names::NORMAL_MAP));
        assert_eq!(f.ctx.draw_calls().count(), 1);
    }

    #[test]
    fn unset_optional_maps_bind_as_none() {
        let mut f = fixture(false);
        let mut entity = Entity::new(f.mesh, f.material);
        entity.draw(&mut f.ctx, &f.camera, &f.assets);

        let roughness = f.ctx.calls().iter().find_map(|call| match call {
            GpuCall::SetTexture { name, texture, .. } if name == names::ROUGHNESS_MAP => {
                Some(*texture)
            }
            _ => None,
        });
        assert_eq!(roughness, Some(None));
    }

    #[test]
    fn uploads_carry_the_current_matrices() {
        let mut f = fixture(false);
        let mut transform = Transform::from_position([1.0, 2.0, 3.0]);
        transform.set_scale([2.0, 2.0, 2.0]);
        let mut entity = Entity::new(f.mesh, f.material).with_transform(transform);
        entity.draw(&mut f.ctx, &f.camera, &f.assets);

        let material = f.assets.material(f.material);
        let vs = material.vertex_shader();
        let ps = material.pixel_shader();

        let world: Vec<f32> =
            bytemuck::pod_collect_to_vec(f.ctx.last_uniform(vs, names::WORLD).unwrap());
        let expected = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            glam::Quat::IDENTITY,
            Vec3::new(1.0, 2.0, 3.0),
        );
        assert_eq!(world, expected.to_cols_array().as_slice());

        let projection: Vec<f32> =
            bytemuck::pod_collect_to_vec(f.ctx.last_uniform(vs, names::PROJECTION).unwrap());
        assert_eq!(
            projection,
            f.camera.projection_matrix().to_cols_array().as_slice()
        );

        assert_eq!(
            f.ctx.last_uniform(ps, names::CAMERA_POSITION).unwrap().len(),
            12
        );
        assert_eq!(
            f.ctx.last_uniform(ps, names::SPECULAR),
            Some(0.75f32.to_ne_bytes().as_slice())
        );

        // Moving the entity shows up in the next draw.
        entity.transform_mut().move_absolute([1.0, 0.0, 0.0]);
        entity.draw(&mut f.ctx, &f.camera, &f.assets);
        let world: Vec<f32> =
            bytemuck::pod_collect_to_vec(f.ctx.last_uniform(vs, names::WORLD).unwrap());
        assert_eq!(world[12], 2.0);
    }
}
