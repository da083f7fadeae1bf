//! Position, rotation and scale for one object, with a lazily cached world matrix.
//!
//! Rotation is stored as Euler angles in radians: `x` is pitch, `y` is yaw and
//! `z` is roll. The orientation applies roll first, then pitch, then yaw. The
//! world matrix applies **Scale → Rotate → Translate** to points.
//!
//! ```
//! use vantage::{Transform, Vec3};
//!
//! let mut transform = Transform::from_position(Vec3::new(0.0, 0.0, 5.0));
//! transform.rotate(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));
//!
//! // Forward now points along +X.
//! transform.move_relative(Vec3::Z);
//! assert!((transform.position().x - 1.0).abs() < 1e-4);
//! ```

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Spatial state of a camera or entity.
///
/// The world matrix is cached and only rebuilt on the first read after a
/// mutation. The direction vectors ([`forward`](Self::forward),
/// [`right`](Self::right), [`up`](Self::up)) are never cached.
#[derive(Clone, Debug)]
pub struct Transform {
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
    world: Mat4,
    dirty: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            world: Mat4::IDENTITY,
            dirty: true,
        }
    }
}

impl Transform {
    /// Identity transform: origin, no rotation, unit scale.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(position: impl Into<Vec3>) -> Self {
        let mut transform = Self::default();
        transform.set_position(position);
        transform
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Euler angles in radians as `(pitch, yaw, roll)`.
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// The current rotation as a quaternion (roll, then pitch, then yaw).
    pub fn orientation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.rotation.y,
            self.rotation.x,
            self.rotation.z,
        )
    }

    pub fn set_position(&mut self, position: impl Into<Vec3>) {
        self.position = position.into();
        self.dirty = true;
    }

    pub fn set_rotation(&mut self, rotation: impl Into<Vec3>) {
        self.rotation = rotation.into();
        self.dirty = true;
    }

    pub fn set_scale(&mut self, scale: impl Into<Vec3>) {
        self.scale = scale.into();
        self.dirty = true;
    }

    /// Translate along the world axes.
    pub fn move_absolute(&mut self, offset: impl Into<Vec3>) {
        self.position += offset.into();
        self.dirty = true;
    }

    /// Translate along the object's own axes, using the rotation at call time.
    pub fn move_relative(&mut self, offset: impl Into<Vec3>) {
        self.position += self.orientation() * offset.into();
        self.dirty = true;
    }

    /// Add to the Euler angles.
    pub fn rotate(&mut self, delta: impl Into<Vec3>) {
        self.rotation += delta.into();
        self.dirty = true;
    }

    /// Multiply the current scale component-wise.
    pub fn scale_by(&mut self, factors: impl Into<Vec3>) {
        self.scale *= factors.into();
        self.dirty = true;
    }

    /// Returns the world matrix, rebuilding it only if something changed since
    /// the last call.
    pub fn world_matrix(&mut self) -> Mat4 {
        if self.dirty {
            self.world = Mat4::from_scale_rotation_translation(
                self.scale,
                self.orientation(),
                self.position,
            );
            self.dirty = false;
        }
        self.world
    }

    /// Rotate a local-space direction into world space.
    pub fn local_to_world(&self, direction: impl Into<Vec3>) -> Vec3 {
        self.orientation() * direction.into()
    }

    /// Local +Z in world space.
    pub fn forward(&self) -> Vec3 {
        self.local_to_world(Vec3::Z)
    }

    /// Local +X in world space.
    pub fn right(&self) -> Vec3 {
        self.local_to_world(Vec3::X)
    }

    /// Local +Y in world space.
    pub fn up(&self) -> Vec3 {
        self.local_to_world(Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn reference_matrix(position: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
        let rotation = Mat4::from_rotation_y(rotation.y)
            * Mat4::from_rotation_x(rotation.x)
            * Mat4::from_rotation_z(rotation.z);
        Mat4::from_translation(position) * rotation * Mat4::from_scale(scale)
    }

    #[test]
    fn world_matrix_tracks_every_mutation() {
        let mut transform = Transform::new();
        assert_eq!(transform.world_matrix(), Mat4::IDENTITY);

        transform.set_position([1.0, -2.0, 3.0]);
        transform.set_rotation([0.3, -1.1, 0.7]);
        transform.set_scale([2.0, 0.5, 1.5]);
        let expected = reference_matrix(
            Vec3::new(1.0, -2.0, 3.0),
            Vec3::new(0.3, -1.1, 0.7),
            Vec3::new(2.0, 0.5, 1.5),
        );
        assert!(transform.world_matrix().abs_diff_eq(expected, 1e-5));

        transform.move_absolute([0.5, 0.5, 0.5]);
        transform.rotate([0.1, 0.2, 0.3]);
        transform.scale_by([2.0, 2.0, 2.0]);
        transform.move_relative([0.0, 0.0, 1.0]);
        let expected = reference_matrix(
            transform.position(),
            Vec3::new(0.4, -0.9, 1.0),
            Vec3::new(4.0, 1.0, 3.0),
        );
        assert!(transform.world_matrix().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn world_matrix_is_stable_without_mutation() {
        let mut transform = Transform::from_position([4.0, 5.0, 6.0]);
        transform.rotate([0.25, 1.5, -0.75]);
        let first = transform.world_matrix();
        let second = transform.world_matrix();
        assert_eq!(first.to_cols_array(), second.to_cols_array());
    }

    #[test]
    fn move_relative_with_identity_rotation_matches_move_absolute() {
        let mut relative = Transform::from_position([1.0, 2.0, 3.0]);
        let mut absolute = relative.clone();

        relative.move_relative([0.5, -1.5, 2.5]);
        absolute.move_absolute([0.5, -1.5, 2.5]);

        assert_eq!(relative.position(), absolute.position());
        assert_eq!(relative.world_matrix(), absolute.world_matrix());
    }

    #[test]
    fn move_relative_follows_current_yaw() {
        let mut transform = Transform::new();
        transform.world_matrix();
        transform.rotate([0.0, FRAC_PI_2, 0.0]);
        transform.move_relative([0.0, 0.0, 1.0]);

        assert!(transform.position().abs_diff_eq(Vec3::X, 1e-4));
        // The move is visible through the cache too.
        let translation = transform.world_matrix().w_axis.truncate();
        assert!(translation.abs_diff_eq(Vec3::X, 1e-4));
    }

    #[test]
    fn direction_vectors_follow_rotation() {
        let mut transform = Transform::new();
        assert_eq!(transform.forward(), Vec3::Z);
        assert_eq!(transform.right(), Vec3::X);
        assert_eq!(transform.up(), Vec3::Y);

        transform.set_rotation([0.0, FRAC_PI_2, 0.0]);
        assert!(transform.forward().abs_diff_eq(Vec3::X, 1e-5));
        assert!(transform.right().abs_diff_eq(-Vec3::Z, 1e-5));
        assert!(transform.up().abs_diff_eq(Vec3::Y, 1e-5));

        // Positive pitch tips forward downwards.
        transform.set_rotation([FRAC_PI_2, 0.0, 0.0]);
        assert!(transform.forward().abs_diff_eq(-Vec3::Y, 1e-5));
    }

    #[test]
    fn scale_by_multiplies() {
        let mut transform = Transform::new();
        transform.set_scale([2.0, 3.0, 4.0]);
        transform.scale_by([0.5, 2.0, 0.25]);
        assert_eq!(transform.scale(), Vec3::new(1.0, 6.0, 1.0));
    }
}
