//! # Vantage
//!
//! **A small forward renderer: a free-look camera, textured lit entities and a
//! cube-mapped sky, one frame at a time.**
//!
//! A [`Scene`] owns the camera, the lights, the entities and their shared
//! meshes and materials. Every frame it updates (camera input, entity
//! animation, quit check) and then draws through a [`GraphicsContext`]: clear,
//! lights, entities, sky, present.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vantage::*;
//!
//! fn main() -> Result<(), AppError> {
//!     run(AppConfig::new().title("One cube"), |gpu, config| {
//!         let camera = Camera::new([0.0, 0.0, -2.0], [0.0, 0.0, 0.0], gpu.aspect(), config.camera);
//!         let mut scene = Scene::new(camera).with_clear_color(config.clear_color);
//!
//!         let vs = gpu.load_shader(&shaders::lit_vertex())?;
//!         let ps = gpu.load_shader(&shaders::lit_pixel())?;
//!         scene.register_lit_shader(ps);
//!
//!         let white = gpu.create_texture(&TextureData::solid("white", [255; 4], ColorSpace::Srgb))?;
//!         let sampler = gpu.create_sampler(&SamplerDesc::default())?;
//!
//!         let cube = Mesh::new(gpu, &MeshData::cube())?;
//!         let cube = scene.assets_mut().add_mesh(cube);
//!         let material = scene.assets_mut().add_material(Material::new(vs, ps, white, sampler));
//!
//!         scene.lights_mut().add_directional(DirectionalLight::new(
//!             [0.05, 0.05, 0.05],
//!             [0.8, 0.8, 0.8],
//!             [1.0, 1.0, -1.0],
//!         ))?;
//!         scene.spawn(cube, material, Transform::from_position([0.0, 0.0, 1.0]));
//!         Ok(scene)
//!     })
//! }
//! ```
//!
//! Every draw call goes through the [`GraphicsContext`] trait, so scenes run the
//! same against [`GpuContext`] and the call-recording [`RecordingContext`].

mod app;
mod assets;
mod camera;
mod config;
mod drawable;
mod entity;
mod error;
mod gpu;
mod graphics;
mod input;
mod lights;
mod material;
mod mesh;
pub mod procedural;
mod recording;
mod scene;
pub mod shaders;
mod sky;
mod transform;

pub use app::run;
pub use assets::{Assets, MaterialId, MeshId};
pub use camera::{Camera, CameraSettings, LookGating};
pub use config::AppConfig;
pub use drawable::{Drawable, submit_indexed};
pub use entity::Entity;
pub use error::{AppError, ConfigError, GraphicsError, SceneError};
pub use gpu::GpuContext;
pub use graphics::{
    AddressMode, BufferId, ColorSpace, CompareFunction, CullMode, DepthStencilDesc,
    DepthStencilStateId, Fallback, FillMode, FilterMode, GraphicsContext, RasterizerDesc,
    RasterizerStateId, ResourceKind, ResourceSlot, SamplerDesc, SamplerId, ShaderDesc, ShaderId,
    ShaderSource, ShaderStage, TextureData, TextureId, TextureKind, UniformField, set_data,
};
pub use input::{Binding, Control, Input, InputState, KeyBindings};
pub use lights::{DirectionalLight, LightSet, MAX_DIRECTIONAL_LIGHTS, MAX_POINT_LIGHTS, PointLight};
pub use material::Material;
pub use mesh::{Mesh, MeshData, Vertex3d};
pub use recording::{GpuCall, RecordingContext};
pub use scene::{Animation, FrameStatus, FrameTime, Scene, drift_and_spin};
pub use sky::Sky;
pub use transform::Transform;

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;
