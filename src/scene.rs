//! The frame orchestrator.
//!
//! A [`Scene`] owns everything one frame touches: the asset store, the
//! entities, the camera, the lights and the optional sky. Each frame runs two
//! phases in a fixed order.
//!
//! **Update**: the camera consumes the input snapshot, every entity's transform
//! is advanced by the scene's animation, and the quit control is checked.
//!
//! **Draw**: clear, upload the light set to every lit pixel shader, draw the
//! entities in spawn order, draw the sky last, present, rebind the targets.
//!
//! ```
//! use vantage::{
//!     Camera, CameraSettings, FrameStatus, FrameTime, GraphicsContext, InputState,
//!     RecordingContext, Scene,
//! };
//!
//! let mut ctx = RecordingContext::new();
//! let camera = Camera::new([0.0, 0.0, -2.0], [0.0, 0.0, 0.0], 16.0 / 9.0, CameraSettings::default());
//! let mut scene = Scene::new(camera);
//!
//! let status = scene.frame(&mut ctx, FrameTime::new(0.016, 0.016), &InputState::new());
//! assert_eq!(status, FrameStatus::Continue);
//! ```

use crate::assets::{Assets, MaterialId, MeshId};
use crate::camera::Camera;
use crate::drawable::Drawable;
use crate::entity::Entity;
use crate::graphics::{GraphicsContext, ShaderId, set_data};
use crate::input::{Control, InputState};
use crate::lights::LightSet;
use crate::shaders::names;
use crate::sky::Sky;
use crate::transform::Transform;

/// Elapsed time for one frame, in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTime {
    /// Time since the previous frame.
    pub delta: f32,
    /// Time since the scene started.
    pub total: f32,
}

impl FrameTime {
    pub fn new(delta: f32, total: f32) -> Self {
        Self { delta, total }
    }
}

/// What the runner should do after a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    Continue,
    Quit,
}

/// Per-entity transform animation, a function of the frame time only.
pub type Animation = Box<dyn FnMut(&mut Transform, FrameTime)>;

/// A tiny circular drift plus a roll of one radian per second.
pub fn drift_and_spin(transform: &mut Transform, time: FrameTime) {
    transform.move_absolute([
        time.total.sin() * 1e-5,
        time.total.cos() * 1e-5,
        0.0,
    ]);
    transform.rotate([0.0, 0.0, time.delta]);
}

pub struct Scene {
    assets: Assets,
    entities: Vec<Entity>,
    camera: Camera,
    lights: LightSet,
    lit_shaders: Vec<ShaderId>,
    sky: Option<Sky>,
    clear_color: [f32; 4],
    animation: Option<Animation>,
}

impl Scene {
    /// An empty scene: no entities, lights, sky or animation, black clear color.
    pub fn new(camera: Camera) -> Self {
        Self {
            assets: Assets::new(),
            entities: Vec::new(),
            camera,
            lights: LightSet::new(),
            lit_shaders: Vec::new(),
            sky: None,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            animation: None,
        }
    }

    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Add an entity; entities draw in the order they were spawned.
    pub fn spawn(&mut self, mesh: MeshId, material: MaterialId, transform: Transform) -> usize {
        self.entities
            .push(Entity::new(mesh, material).with_transform(transform));
        self.entities.len() - 1
    }

    /// Register a pixel shader that consumes the light set. Registering twice
    /// has no effect.
    pub fn register_lit_shader(&mut self, shader: ShaderId) {
        if !self.lit_shaders.contains(&shader) {
            self.lit_shaders.push(shader);
        }
    }

    pub fn set_sky(&mut self, sky: Sky) {
        self.sky = Some(sky);
    }

    pub fn set_animation(&mut self, animation: impl FnMut(&mut Transform, FrameTime) + 'static) {
        self.animation = Some(Box::new(animation));
    }

    /// Advance the camera and every entity, then check for quit.
    pub fn update(&mut self, time: FrameTime, input: &InputState) -> FrameStatus {
        self.camera.update(time.delta, input);

        if let Some(animation) = self.animation.as_mut() {
            for entity in &mut self.entities {
                animation(entity.transform_mut(), time);
            }
        }

        if input.is_active(Control::Quit) || input.was_pressed(Control::Quit) {
            log::info!("Quit requested");
            return FrameStatus::Quit;
        }
        FrameStatus::Continue
    }

    /// Issue one frame of draw calls.
    pub fn draw(&mut self, ctx: &mut dyn GraphicsContext) {
        ctx.clear(self.clear_color, 1.0, 0);

        self.upload_lights(ctx);

        for entity in &mut self.entities {
            entity.draw(ctx, &self.camera, &self.assets);
        }

        if let Some(sky) = self.sky.as_mut() {
            sky.draw(ctx, &self.camera, &self.assets);
        }

        ctx.present();
        ctx.bind_render_targets();
    }

    /// Update, then draw. A quit request still finishes the frame; the caller
    /// stops at the frame boundary.
    pub fn frame(
        &mut self,
        ctx: &mut dyn GraphicsContext,
        time: FrameTime,
        input: &InputState,
    ) -> FrameStatus {
        let status = self.update(time, input);
        self.draw(ctx);
        status
    }

    /// Rebuild the projection for a new render target size. A zero height
    /// (minimized window) leaves the camera untouched.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera
            .update_projection_matrix(width as f32 / height as f32);
    }

    fn upload_lights(&self, ctx: &mut dyn GraphicsContext) {
        let directional = self.lights.directional_slots();
        let point = self.lights.point_slots();
        for &shader in &self.lit_shaders {
            for (i, light) in directional.iter().enumerate() {
                set_data(ctx, shader, &names::directional_light(i), light);
            }
            for (i, light) in point.iter().enumerate() {
                set_data(ctx, shader, &names::point_light(i), light);
            }
        }
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut Assets {
        &mut self.assets
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn lights(&self) -> &LightSet {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut LightSet {
        &mut self.lights
    }

    pub fn sky(&self) -> Option<&Sky> {
        self.sky.as_ref()
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraSettings;
    use crate::graphics::{ColorSpace, SamplerDesc, TextureData};
    use crate::lights::{DirectionalLight, PointLight};
    use crate::material::Material;
    use crate::mesh::{Mesh, MeshData};
    use crate::recording::{GpuCall, RecordingContext};
    use crate::shaders;
    use approx::assert_abs_diff_eq;
    use glam::Vec3;

    struct Built {
        ctx: RecordingContext,
        scene: Scene,
        lit: ShaderId,
        normal_mapped: ShaderId,
    }

    fn camera() -> Camera {
        Camera::new(
            [0.0, 0.0, -2.0],
            Vec3::ZERO,
            16.0 / 9.0,
            CameraSettings::default(),
        )
    }

    fn build(entity_count: usize, with_sky: bool) -> Built {
        let mut ctx = RecordingContext::new();
        let vs = ctx.load_shader(&shaders::lit_vertex()).unwrap();
        let lit = ctx.load_shader(&shaders::lit_pixel()).unwrap();
        let normal_mapped = ctx.load_shader(&shaders::normal_map_pixel()).unwrap();
        let albedo = TextureData::solid("albedo", [200, 180, 160, 255], ColorSpace::Srgb);
        let albedo = ctx.create_texture(&albedo).unwrap();
        let sampler = ctx.create_sampler(&SamplerDesc::default()).unwrap();

        let mut scene = Scene::new(camera()).with_clear_color([0.4, 0.6, 0.75, 0.0]);
        let cube = scene
            .assets_mut()
            .add_mesh(Mesh::new(&mut ctx, &MeshData::cube()).unwrap());
        let plain = scene
            .assets_mut()
            .add_material(Material::new(vs, lit, albedo, sampler));
        let bumpy = scene.assets_mut().add_material(
            Material::new(vs, normal_mapped, albedo, sampler).with_normal_map(albedo),
        );
        for i in 0..entity_count {
            let material = if i % 2 == 0 { plain } else { bumpy };
            scene.spawn(
                cube,
                material,
                Transform::from_position([i as f32, 0.0, 1.0]),
            );
        }
        scene.register_lit_shader(lit);
        scene.register_lit_shader(normal_mapped);

        if with_sky {
            let mesh = Mesh::new(&mut ctx, &MeshData::cube()).unwrap();
            let cube_map = ctx
                .create_texture(&crate::procedural::starfield_cube(4, 7))
                .unwrap();
            let sky = Sky::from_texture(
                &mut ctx,
                mesh,
                sampler,
                cube_map,
                &shaders::sky_vertex(),
                &shaders::sky_pixel(),
            )
            .unwrap();
            scene.set_sky(sky);
        }

        ctx.clear_calls();
        Built {
            ctx,
            scene,
            lit,
            normal_mapped,
        }
    }

    #[test]
    fn draws_every_entity_then_the_sky_last() {
        let entity_count = 5;
        let mut b = build(entity_count, true);
        b.scene.draw(&mut b.ctx);

        let draws: Vec<_> = b.ctx.draw_calls().collect();
        assert_eq!(draws.len(), entity_count + 1);

        let sky_count = b.scene.sky().unwrap().mesh().index_count();
        let entity_count_indices = MeshData::cube().indices.len() as u32;
        assert_eq!(draws.last(), Some(&(sky_count, 0, 0)));
        let entity_draws = &draws[..entity_count];
        assert!(entity_draws.iter().all(|d| d.0 == entity_count_indices));

        // Nothing but state restoration follows the sky's draw.
        let last_draw = b
            .ctx
            .calls()
            .iter()
            .rposition(|call| matches!(call, GpuCall::DrawIndexed { .. }))
            .unwrap();
        let sky_cube_binding = b
            .ctx
            .calls()
            .iter()
            .rposition(|call| match call {
                GpuCall::SetTexture { name, .. } => name == names::CUBE_MAP,
                _ => false,
            })
            .unwrap();
        let previous_draw = b.ctx.calls()[..last_draw]
            .iter()
            .rposition(|call| matches!(call, GpuCall::DrawIndexed { .. }))
            .unwrap();
        assert!(previous_draw < sky_cube_binding);
        assert!(sky_cube_binding < last_draw);
    }

    #[test]
    fn frame_starts_with_clear_and_ends_with_present_and_rebind() {
        let mut b = build(2, true);
        b.scene.draw(&mut b.ctx);

        let calls = b.ctx.calls();
        assert_eq!(
            calls.first(),
            Some(&GpuCall::Clear {
                color: [0.4, 0.6, 0.75, 0.0],
                depth: 1.0,
                stencil: 0,
            })
        );
        assert_eq!(
            &calls[calls.len() - 2..],
            &[GpuCall::Present, GpuCall::BindRenderTargets]
        );
    }

    #[test]
    fn draws_without_a_sky() {
        let mut b = build(3, false);
        b.scene.draw(&mut b.ctx);
        assert_eq!(b.ctx.draw_calls().count(), 3);
        let sets_rasterizer = |call: &GpuCall| matches!(call, GpuCall::SetRasterizerState(_));
        assert!(!b.ctx.calls().iter().any(sets_rasterizer));
    }

    #[test]
    fn lights_are_uploaded_to_every_lit_shader_before_any_draw() {
        let mut b = build(2, false);
        let sun = DirectionalLight::new([0.01, 0.01, 0.02], [0.3, 0.3, 0.4], [1.0, 1.0, -1.0]);
        let lamp = PointLight::new(Vec3::ONE, [-5.0, 100.0, 0.0]);
        b.scene.lights_mut().add_directional(sun).unwrap();
        b.scene.lights_mut().add_point(lamp).unwrap();
        b.scene.draw(&mut b.ctx);

        let first_draw = b
            .ctx
            .calls()
            .iter()
            .position(|call| matches!(call, GpuCall::DrawIndexed { .. }))
            .unwrap();
        for shader in [b.lit, b.normal_mapped] {
            assert_eq!(
                b.ctx.last_uniform(shader, "directional_light_1"),
                Some(bytemuck::bytes_of(&sun))
            );
            assert_eq!(
                b.ctx.last_uniform(shader, "directional_light_3"),
                Some(bytemuck::bytes_of(&DirectionalLight::default()))
            );
            assert_eq!(
                b.ctx.last_uniform(shader, "point_light_1"),
                Some(bytemuck::bytes_of(&lamp))
            );

            let upload = b
                .ctx
                .calls()
                .iter()
                .position(|call| {
                    matches!(call, GpuCall::SetUniform { shader: s, name, .. }
                        if *s == shader && name == "point_light_1")
                })
                .unwrap();
            assert!(upload < first_draw);
        }
    }

    #[test]
    fn registering_a_lit_shader_twice_uploads_once() {
        let mut b = build(0, false);
        b.scene.register_lit_shader(b.lit);
        b.scene.draw(&mut b.ctx);

        let uploads = b
            .ctx
            .calls()
            .iter()
            .filter(|call| {
                matches!(call, GpuCall::SetUniform { shader, name, .. }
                    if *shader == b.lit && name == "directional_light_1")
            })
            .count();
        assert_eq!(uploads, 1);
    }

    #[test]
    fn quit_control_finishes_the_frame_then_quits() {
        let mut b = build(2, true);
        let input = InputState::new().with_pressed(Control::Quit);
        let status = b.scene.frame(&mut b.ctx, FrameTime::new(0.016, 1.0), &input);

        assert_eq!(status, FrameStatus::Quit);
        assert_eq!(b.ctx.draw_calls().count(), 3);
        let calls = b.ctx.calls();
        assert!(matches!(calls.first(), Some(GpuCall::Clear { .. })));
        assert_eq!(
            &calls[calls.len() - 2..],
            &[GpuCall::Present, GpuCall::BindRenderTargets]
        );
    }

    #[test]
    fn held_quit_control_also_quits() {
        let mut scene = Scene::new(camera());
        let input = InputState::new().with_active(Control::Quit);
        assert_eq!(
            scene.update(FrameTime::new(0.016, 0.016), &input),
            FrameStatus::Quit
        );
    }

    #[test]
    fn frame_updates_then_draws() {
        let mut b = build(1, false);
        let input = InputState::new().with_active(Control::MoveForward);
        let before = b.scene.camera().position();
        let status = b.scene.frame(&mut b.ctx, FrameTime::new(0.5, 0.5), &input);

        assert_eq!(status, FrameStatus::Continue);
        assert_abs_diff_eq!(
            b.scene.camera().position().z,
            before.z + 0.5,
            epsilon = 1e-5
        );

        let camera_position = b.scene.camera().position().to_array();
        let ps = b.scene.assets().material(b.scene.entities()[0].material()).pixel_shader();
        assert_eq!(
            b.ctx.last_uniform(ps, names::CAMERA_POSITION),
            Some(bytemuck::bytes_of(&camera_position))
        );
    }

    #[test]
    fn animation_runs_for_every_entity() {
        let mut b = build(3, false);
        b.scene.set_animation(drift_and_spin);
        let time = FrameTime::new(0.25, 0.0);
        b.scene.update(time, &InputState::new());

        for (i, entity) in b.scene.entities().iter().enumerate() {
            // sin(0) = 0, cos(0) = 1
            assert_abs_diff_eq!(entity.transform().position().x, i as f32, epsilon = 1e-6);
            assert_abs_diff_eq!(entity.transform().position().y, 1e-5, epsilon = 1e-9);
            assert_abs_diff_eq!(entity.transform().rotation().z, 0.25, epsilon = 1e-6);
        }
    }

    #[test]
    fn drift_stays_tiny_at_any_time() {
        let mut transform = Transform::new();
        drift_and_spin(&mut transform, FrameTime::new(0.016, 1.0));

        let p = transform.position();
        assert_abs_diff_eq!(p.x, 1.0f32.sin() * 1e-5, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, 1.0f32.cos() * 1e-5, epsilon = 1e-9);
        assert_eq!(p.z, 0.0);

        for frame in 1..60 {
            drift_and_spin(
                &mut transform,
                FrameTime::new(0.016, 1.0 + frame as f32 * 0.016),
            );
        }
        assert!(transform.position().length() < 1e-3);
    }

    #[test]
    fn no_animation_leaves_entities_in_place() {
        let mut b = build(2, false);
        b.scene.update(FrameTime::new(1.0, 10.0), &InputState::new());
        assert_eq!(
            b.scene.entities()[1].transform().position(),
            Vec3::new(1.0, 0.0, 1.0)
        );
    }

    #[test]
    fn resize_updates_aspect_and_ignores_zero_height() {
        let mut scene = Scene::new(camera());
        scene.resize(800, 400);
        assert_abs_diff_eq!(scene.camera().aspect_ratio(), 2.0);

        let projection = scene.camera().projection_matrix();
        scene.resize(800, 0);
        assert_eq!(scene.camera().projection_matrix(), projection);
    }
}
