//! Light types and the per-frame light set.
//!
//! Both light structs are uploaded byte-for-byte into the lit shaders' uniform
//! blocks, so their field order and padding must match the WGSL structs:
//!
//! ```text
//! DirectionalLight (48 bytes)        PointLight (32 bytes)
//!   0  ambient_color  vec3             0  color     vec3
//!  12  pad            f32             12  pad       f32
//!  16  diffuse_color  vec3            16  position  vec3
//!  28  pad            f32             28  pad       f32
//!  32  direction      vec3
//!  44  pad            f32
//! ```

use glam::Vec3;

use crate::error::SceneError;

/// Directional lights the lit shaders accept.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 3;
/// Point lights the lit shaders accept.
pub const MAX_POINT_LIGHTS: usize = 1;

/// A light infinitely far away, shining along `direction`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLight {
    pub ambient_color: [f32; 3],
    _pad0: f32,
    pub diffuse_color: [f32; 3],
    _pad1: f32,
    pub direction: [f32; 3],
    _pad2: f32,
}

impl DirectionalLight {
    pub fn new(
        ambient_color: impl Into<Vec3>,
        diffuse_color: impl Into<Vec3>,
        direction: impl Into<Vec3>,
    ) -> Self {
        Self {
            ambient_color: ambient_color.into().to_array(),
            diffuse_color: diffuse_color.into().to_array(),
            direction: direction.into().to_array(),
            ..Default::default()
        }
    }
}

/// A light radiating from `position`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLight {
    pub color: [f32; 3],
    _pad0: f32,
    pub position: [f32; 3],
    _pad1: f32,
}

impl PointLight {
    pub fn new(color: impl Into<Vec3>, position: impl Into<Vec3>) -> Self {
        Self {
            color: color.into().to_array(),
            position: position.into().to_array(),
            ..Default::default()
        }
    }
}

/// The lights uploaded to every lit shader each frame.
///
/// Slots without a light upload zeroes, which contribute nothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LightSet {
    directional: Vec<DirectionalLight>,
    point: Vec<PointLight>,
}

impl LightSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_directional(&mut self, light: DirectionalLight) -> Result<(), SceneError> {
        if self.directional.len() == MAX_DIRECTIONAL_LIGHTS {
            return Err(SceneError::TooManyLights {
                kind: "directional",
                max: MAX_DIRECTIONAL_LIGHTS,
            });
        }
        self.directional.push(light);
        Ok(())
    }

    pub fn add_point(&mut self, light: PointLight) -> Result<(), SceneError> {
        if self.point.len() == MAX_POINT_LIGHTS {
            return Err(SceneError::TooManyLights {
                kind: "point",
                max: MAX_POINT_LIGHTS,
            });
        }
        self.point.push(light);
        Ok(())
    }

    pub fn directional(&self) -> &[DirectionalLight] {
        &self.directional
    }

    pub fn directional_mut(&mut self) -> &mut [DirectionalLight] {
        &mut self.directional
    }

    pub fn point(&self) -> &[PointLight] {
        &self.point
    }

    pub fn point_mut(&mut self) -> &mut [PointLight] {
        &mut self.point
    }

    /// Every directional slot, padded with zeroed lights.
    pub fn directional_slots(&self) -> [DirectionalLight; MAX_DIRECTIONAL_LIGHTS] {
        let mut slots = [DirectionalLight::default(); MAX_DIRECTIONAL_LIGHTS];
        slots[..self.directional.len()].copy_from_slice(&self.directional);
        slots
    }

    /// Every point slot, padded with zeroed lights.
    pub fn point_slots(&self) -> [PointLight; MAX_POINT_LIGHTS] {
        let mut slots = [PointLight::default(); MAX_POINT_LIGHTS];
        slots[..self.point.len()].copy_from_slice(&self.point);
        slots
    }
}
