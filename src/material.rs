//! Surface appearance shared by many entities.

use glam::Vec4;

use crate::graphics::{SamplerId, ShaderId, TextureId};

/// Shader programs, a tint, a specularity and the textures to sample.
///
/// Materials are built once and then only read; the tint is the one value
/// that may change afterwards.
///
/// ```
/// use vantage::{Material, SamplerId, ShaderId, TextureId, Vec4};
///
/// let material = Material::new(
///     ShaderId::from_index(0),
///     ShaderId::from_index(1),
///     TextureId::from_index(0),
///     SamplerId::from_index(0),
/// )
/// .with_specularity(0.5)
/// .with_roughness_map(TextureId::from_index(1));
///
/// assert_eq!(material.color_tint(), Vec4::ONE);
/// assert!(material.normal_map().is_none());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    vertex_shader: ShaderId,
    pixel_shader: ShaderId,
    color_tint: Vec4,
    specularity: f32,
    albedo: TextureId,
    sampler: SamplerId,
    normal_map: Option<TextureId>,
    roughness_map: Option<TextureId>,
    metalness_map: Option<TextureId>,
}

impl Material {
    /// White tint, specularity 0.5, no normal, roughness or metalness maps.
    pub fn new(
        vertex_shader: ShaderId,
        pixel_shader: ShaderId,
        albedo: TextureId,
        sampler: SamplerId,
    ) -> Self {
        Self {
            vertex_shader,
            pixel_shader,
            color_tint: Vec4::ONE,
            specularity: 0.5,
            albedo,
            sampler,
            normal_map: None,
            roughness_map: None,
            metalness_map: None,
        }
    }

    pub fn with_color_tint(mut self, tint: impl Into<Vec4>) -> Self {
        self.color_tint = tint.into();
        self
    }

    /// Clamped to `[0, 1]`.
    pub fn with_specularity(mut self, specularity: f32) -> Self {
        self.specularity = specularity.clamp(0.0, 1.0);
        self
    }

    pub fn with_normal_map(mut self, texture: TextureId) -> Self {
        self.normal_map = Some(texture);
        self
    }

    pub fn with_roughness_map(mut self, texture: TextureId) -> Self {
        self.roughness_map = Some(texture);
        self
    }

    pub fn with_metalness_map(mut self, texture: TextureId) -> Self {
        self.metalness_map = Some(texture);
        self
    }

    pub fn set_color_tint(&mut self, tint: impl Into<Vec4>) {
        self.color_tint = tint.into();
    }

    pub fn vertex_shader(&self) -> ShaderId {
        self.vertex_shader
    }

    pub fn pixel_shader(&self) -> ShaderId {
        self.pixel_shader
    }

    pub fn color_tint(&self) -> Vec4 {
        self.color_tint
    }

    pub fn specularity(&self) -> f32 {
        self.specularity
    }

    pub fn albedo(&self) -> TextureId {
        self.albedo
    }

    pub fn sampler(&self) -> SamplerId {
        self.sampler
    }

    /// `None` is a valid state: the normal-map binding is skipped entirely.
    pub fn normal_map(&self) -> Option<TextureId> {
        self.normal_map
    }

    pub fn roughness_map(&self) -> Option<TextureId> {
        self.roughness_map
    }

    pub fn metalness_map(&self) -> Option<TextureId> {
        self.metalness_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> Material {
        Material::new(
            ShaderId(0),
            ShaderId(1),
            TextureId(0),
            SamplerId(0),
        )
    }

    #[test]
    fn specularity_is_clamped() {
        assert_eq!(material().with_specularity(1.5).specularity(), 1.0);
        assert_eq!(material().with_specularity(-0.5).specularity(), 0.0);
        assert_eq!(material().with_specularity(0.25).specularity(), 0.25);
    }

    #[test]
    fn tint_is_the_only_mutable_value() {
        let mut material = material().with_color_tint([1.0, 0.5, 0.5, 1.0]);
        let before = material.clone();
        material.set_color_tint(Vec4::new(0.2, 0.2, 0.2, 1.0));

        assert_eq!(material.color_tint(), Vec4::new(0.2, 0.2, 0.2, 1.0));
        assert_eq!(material.albedo(), before.albedo());
        assert_eq!(material.specularity(), before.specularity());
    }

    #[test]
    fn optional_maps() {
        let material = material()
            .with_normal_map(TextureId(3))
            .with_metalness_map(TextureId(4));
        assert_eq!(material.normal_map(), Some(TextureId(3)));
        assert_eq!(material.roughness_map(), None);
        assert_eq!(material.metalness_map(), Some(TextureId(4)));
    }
}
