//! Material showcase: three rows of cubes, spheres and cylinders, one column
//! per material, under three directional lights and a point light.
//!
//! Textures are read from `assets/textures/` (`<surface>_albedo.png`,
//! `_normals.png`, `_roughness.png`, `_metal.png`, and `sky.png` as a vertical
//! strip of six faces). Anything missing is generated procedurally.

use std::path::{Path, PathBuf};

use vantage::procedural::{self, Surface};
use vantage::*;

const CONFIG_PATH: &str = "vantage.toml";
const TEXTURE_DIR: &str = "assets/textures";
const PROCEDURAL_SIZE: u32 = 256;

fn main() {
    env_logger::init();

    if let Err(e) = run(load_config(), build_scene) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn load_config() -> AppConfig {
    if !Path::new(CONFIG_PATH).exists() {
        return AppConfig::new().title("Vantage material showcase");
    }
    match AppConfig::load(CONFIG_PATH) {
        Ok(config) => {
            log::info!("Loaded {CONFIG_PATH}");
            config
        }
        Err(e) => {
            log::warn!("{e}; using the default configuration");
            AppConfig::new()
        }
    }
}

fn build_scene(gpu: &mut GpuContext, config: &AppConfig) -> Result<Scene, AppError> {
    let camera = Camera::new(
        [0.0, 0.0, -2.0],
        [0.0, 0.0, 0.0],
        gpu.aspect(),
        config.camera,
    );
    let mut scene = Scene::new(camera).with_clear_color(config.clear_color);

    let vertex_shader = gpu.load_shader(&shaders::lit_vertex())?;
    let pixel_shader = gpu.load_shader(&shaders::normal_map_pixel())?;
    scene.register_lit_shader(pixel_shader);

    let sampler = gpu.create_sampler(&SamplerDesc {
        address_mode: AddressMode::Wrap,
        filter: FilterMode::Linear,
    })?;

    let mut materials = Vec::with_capacity(Surface::ALL.len());
    for (seed, surface) in Surface::ALL.into_iter().enumerate() {
        let maps = load_surface(gpu, surface, seed as u32)?;
        let specularity = match surface {
            Surface::Cobblestone => 1.0,
            Surface::Bronze => 0.0,
            _ => 0.5,
        };
        let material = Material::new(vertex_shader, pixel_shader, maps[0], sampler)
            .with_normal_map(maps[1])
            .with_roughness_map(maps[2])
            .with_metalness_map(maps[3])
            .with_specularity(specularity);
        materials.push(scene.assets_mut().add_material(material));
    }

    let cube = Mesh::new(gpu, &MeshData::cube())?;
    let sky_mesh = cube.clone();
    let rows = [
        (cube, -1.0, 0.7),
        (Mesh::new(gpu, &MeshData::sphere(32, 16))?, 1.0, 1.0),
        (Mesh::new(gpu, &MeshData::cylinder(32))?, 3.0, 1.0),
    ];
    for (mesh, y, scale) in rows {
        let mesh = scene.assets_mut().add_mesh(mesh);
        for (column, &material) in materials.iter().enumerate() {
            let mut transform = Transform::from_position([-5.0 + 2.0 * column as f32, y, 1.0]);
            transform.set_scale([scale; 3]);
            scene.spawn(mesh, material, transform);
        }
    }

    let lights = scene.lights_mut();
    lights.add_directional(DirectionalLight::new(
        [0.01, 0.01, 0.02],
        [0.3, 0.3, 0.4],
        [1.0, 1.0, -1.0],
    ))?;
    lights.add_directional(DirectionalLight::new(
        [0.01; 3],
        [0.01; 3],
        [0.0, 1.0, 0.0],
    ))?;
    lights.add_directional(DirectionalLight::new(
        [0.01; 3],
        [0.01, 0.02, 0.01],
        [0.0, 1.0, -1.0],
    ))?;
    lights.add_point(PointLight::new([1.0; 3], [-5.0, 100.0, 0.0]))?;

    scene.set_animation(drift_and_spin);
    scene.set_sky(load_sky(gpu, sky_mesh, sampler)?);

    Ok(scene)
}

fn texture_path(name: &str) -> PathBuf {
    Path::new(TEXTURE_DIR).join(format!("{name}.png"))
}

/// Albedo, normal, roughness and metalness maps for `surface`, in that order.
fn load_surface(
    gpu: &mut GpuContext,
    surface: Surface,
    seed: u32,
) -> Result<[TextureId; 4], GraphicsError> {
    let name = surface.name();
    let map_path = |map: &str| texture_path(&format!("{name}_{map}"));
    let files = [
        ("albedo", ColorSpace::Srgb),
        ("normals", ColorSpace::Linear),
        ("roughness", ColorSpace::Linear),
        ("metal", ColorSpace::Linear),
    ]
    .map(|(map, space)| (map_path(map), space));

    if files.iter().all(|(path, _)| path.exists()) {
        let loaded: Result<Vec<_>, _> = files
            .iter()
            .map(|(path, space)| TextureData::from_file(path, *space))
            .collect();
        match loaded {
            Ok(maps) => {
                log::info!("Loaded {name} textures from {TEXTURE_DIR}");
                return Ok([
                    gpu.create_texture(&maps[0])?,
                    gpu.create_texture(&maps[1])?,
                    gpu.create_texture(&maps[2])?,
                    gpu.create_texture(&maps[3])?,
                ]);
            }
            Err(e) => log::warn!("Failed to load {name} textures ({e}); generating them"),
        }
    } else {
        log::warn!("No {name} textures in {TEXTURE_DIR}; generating them");
    }

    let maps = procedural::surface(surface, PROCEDURAL_SIZE, seed);
    Ok([
        gpu.create_texture(&maps.albedo)?,
        gpu.create_texture(&maps.normal)?,
        gpu.create_texture(&maps.roughness)?,
        gpu.create_texture(&maps.metalness)?,
    ])
}

fn load_sky(gpu: &mut GpuContext, mesh: Mesh, sampler: SamplerId) -> Result<Sky, GraphicsError> {
    let vertex_shader = shaders::sky_vertex();
    let pixel_shader = shaders::sky_pixel();

    let path = texture_path("sky");
    if path.exists() {
        match TextureData::cube_from_file(&path) {
            Ok(data) => {
                let cube_map = gpu.create_texture(&data)?;
                return Sky::from_texture(
                    gpu,
                    mesh,
                    sampler,
                    cube_map,
                    &vertex_shader,
                    &pixel_shader,
                );
            }
            Err(e) => log::warn!(
                "Failed to load {} ({e}); using a starfield",
                path.display()
            ),
        }
    } else {
        log::warn!("No sky cube map at {}; using a starfield", path.display());
    }

    let cube_map = gpu.create_texture(&procedural::starfield_cube(PROCEDURAL_SIZE, 7))?;
    Sky::from_texture(gpu, mesh, sampler, cube_map, &vertex_shader, &pixel_shader)
}
