//! A free-look camera with WASD movement and mouse look.
//!
//! The camera owns a [`Transform`] and derives a left-handed view matrix from
//! its position and forward vector, plus a perspective projection from the
//! field of view, aspect ratio and clip planes.
//!
//! # Controls
//!
//! | Control | Default binding | Effect |
//! |---------|-----------------|--------|
//! | Forward / back | W / S | move along the camera's own Z |
//! | Strafe | A / D | move along the camera's own X (A towards +X) |
//! | Ascend / descend | Q / E | move along world Y |
//! | Look | right mouse button | turn with the pointer |
//!
//! Movement covers `movement_speed * dt` units per frame; mouse look turns by
//! `pixels * look_speed * dt` radians.
//!
//! # Example
//!
//! ```
//! use vantage::{Camera, CameraSettings, Control, InputState, Vec3};
//!
//! let mut camera = Camera::new(
//!     Vec3::new(0.0, 0.0, -2.0),
//!     Vec3::ZERO,
//!     16.0 / 9.0,
//!     CameraSettings::default(),
//! );
//!
//! let input = InputState::new().with_active(Control::MoveForward);
//! camera.update(0.5, &input);
//! assert!((camera.position().z - -1.5).abs() < 1e-5);
//! ```

use glam::{Mat4, Vec2, Vec3};
use serde::Deserialize;

use crate::input::{Control, InputState};
use crate::transform::Transform;

/// When pointer movement turns the camera.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookGating {
    /// Turn while the look control is held, or if it was pressed at any point
    /// since the previous frame.
    #[default]
    Lenient,
    /// Turn only while the look control is held.
    Held,
}

impl LookGating {
    fn allows(self, input: &InputState) -> bool {
        match self {
            LookGating::Lenient => {
                input.is_active(Control::Look) || input.was_pressed(Control::Look)
            }
            LookGating::Held => input.is_active(Control::Look),
        }
    }
}

/// Lens and motion parameters.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Units per second.
    pub movement_speed: f32,
    /// Radians per pixel per second.
    pub look_speed: f32,
    pub near: f32,
    pub far: f32,
    pub look_gating: LookGating,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 80.0,
            movement_speed: 1.0,
            look_speed: 2.0,
            near: 0.1,
            far: 50.0,
            look_gating: LookGating::default(),
        }
    }
}

/// The active viewer of a scene.
#[derive(Clone, Debug)]
pub struct Camera {
    transform: Transform,
    settings: CameraSettings,
    aspect_ratio: f32,
    view: Mat4,
    projection: Mat4,
    previous_pointer: Vec2,
}

impl Camera {
    /// Create a camera and derive both matrices.
    ///
    /// `rotation` is `(pitch, yaw, roll)` in radians.
    pub fn new(
        position: impl Into<Vec3>,
        rotation: impl Into<Vec3>,
        aspect_ratio: f32,
        settings: CameraSettings,
    ) -> Self {
        let mut transform = Transform::from_position(position);
        transform.set_rotation(rotation);

        let mut camera = Self {
            transform,
            settings,
            aspect_ratio,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            previous_pointer: Vec2::ZERO,
        };
        camera.update_view_matrix();
        camera.update_projection_matrix(aspect_ratio);
        camera
    }

    /// Rebuild the projection for a new aspect ratio (width / height).
    pub fn update_projection_matrix(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
        self.projection = Mat4::perspective_lh(
            self.settings.fov_degrees.to_radians(),
            aspect_ratio,
            self.settings.near,
            self.settings.far,
        );
    }

    /// Rebuild the view from the transform's position and forward vector.
    pub fn update_view_matrix(&mut self) {
        self.view = Mat4::look_to_lh(
            self.transform.position(),
            self.transform.forward(),
            Vec3::Y,
        );
    }

    /// Apply one frame of movement and mouse look, then rebuild the view.
    pub fn update(&mut self, dt: f32, input: &InputState) {
        let step = self.settings.movement_speed * dt;

        if input.is_active(Control::MoveForward) {
            self.transform.move_relative([0.0, 0.0, step]);
        }
        if input.is_active(Control::MoveBackward) {
            self.transform.move_relative([0.0, 0.0, -step]);
        }
        if input.is_active(Control::StrafeLeft) {
            self.transform.move_relative([step, 0.0, 0.0]);
        }
        if input.is_active(Control::StrafeRight) {
            self.transform.move_relative([-step, 0.0, 0.0]);
        }
        if input.is_active(Control::Ascend) {
            self.transform.move_absolute([0.0, step, 0.0]);
        }
        if input.is_active(Control::Descend) {
            self.transform.move_absolute([0.0, -step, 0.0]);
        }

        let pointer = input.pointer();
        if self.settings.look_gating.allows(input) {
            let offset = (self.previous_pointer - pointer) * self.settings.look_speed * dt;
            self.transform.rotate([offset.y, offset.x, 0.0]);
        }
        self.previous_pointer = pointer;

        self.update_view_matrix();
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Direct access to the transform. Call [`update_view_matrix`](Self::update_view_matrix)
    /// afterwards if the view is needed before the next [`update`](Self::update).
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn camera() -> Camera {
        Camera::new(
            Vec3::new(0.0, 0.0, -2.0),
            Vec3::ZERO,
            16.0 / 9.0,
            CameraSettings::default(),
        )
    }

    #[test]
    fn projection_uses_half_fov_in_degrees() {
        let camera = camera();
        let projection = camera.projection_matrix().to_cols_array_2d();
        assert_abs_diff_eq!(
            projection[1][1],
            1.0 / 40f32.to_radians().tan(),
            epsilon = 1e-5
        );
        assert_abs_diff_eq!(
            projection[0][0],
            projection[1][1] * 9.0 / 16.0,
            epsilon = 1e-5
        );
    }

    #[test]
    fn projection_changes_only_with_aspect_ratio() {
        let mut camera = camera();
        let before = camera.projection_matrix();

        camera.update_projection_matrix(16.0 / 9.0);
        assert_eq!(camera.projection_matrix(), before);

        camera.update(0.1, &InputState::new().with_active(Control::MoveForward));
        assert_eq!(camera.projection_matrix(), before);

        camera.update_projection_matrix(4.0 / 3.0);
        assert_ne!(camera.projection_matrix(), before);
        assert_eq!(camera.aspect_ratio(), 4.0 / 3.0);
    }

    #[test]
    fn view_changes_only_with_transform() {
        let mut camera = camera();
        let before = camera.view_matrix();

        camera.update_view_matrix();
        assert_eq!(camera.view_matrix(), before);

        camera.update(0.1, &InputState::new());
        assert_eq!(camera.view_matrix(), before);

        camera.transform_mut().move_absolute([1.0, 0.0, 0.0]);
        camera.update_view_matrix();
        assert_ne!(camera.view_matrix(), before);

        let moved = camera.view_matrix();
        camera.transform_mut().rotate([0.0, 0.5, 0.0]);
        camera.update_view_matrix();
        assert_ne!(camera.view_matrix(), moved);
    }

    #[test]
    fn view_maps_camera_position_to_origin() {
        let camera = camera();
        let eye = camera.view_matrix().transform_point3(camera.position());
        assert!(eye.abs_diff_eq(Vec3::ZERO, 1e-5));

        // One unit ahead of the camera lands on +Z in view space.
        let ahead = camera
            .view_matrix()
            .transform_point3(camera.position() + Vec3::Z);
        assert!(ahead.abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn movement_controls_scale_with_speed_and_dt() {
        let settings = CameraSettings {
            movement_speed: 2.0,
            ..Default::default()
        };
        let mut camera = Camera::new(Vec3::ZERO, Vec3::ZERO, 1.0, settings);

        camera.update(0.5, &InputState::new().with_active(Control::MoveForward));
        assert!(near(camera.position(), [0.0, 0.0, 1.0]));

        camera.update(0.5, &InputState::new().with_active(Control::StrafeLeft));
        assert!(near(camera.position(), [1.0, 0.0, 1.0]));

        camera.update(0.25, &InputState::new().with_active(Control::Ascend));
        assert!(near(camera.position(), [1.0, 0.5, 1.0]));

        let all = InputState::new()
            .with_active(Control::MoveForward)
            .with_active(Control::MoveBackward)
            .with_active(Control::StrafeLeft)
            .with_active(Control::StrafeRight)
            .with_active(Control::Ascend)
            .with_active(Control::Descend);
        camera.update(1.0, &all);
        assert!(near(camera.position(), [1.0, 0.5, 1.0]));
    }

    fn near(actual: Vec3, expected: [f32; 3]) -> bool {
        actual.abs_diff_eq(Vec3::from(expected), 1e-5)
    }

    #[test]
    fn vertical_movement_ignores_orientation() {
        let mut camera = Camera::new(
            Vec3::ZERO,
            Vec3::new(0.7, 0.3, 0.0),
            1.0,
            Default::default(),
        );
        camera.update(1.0, &InputState::new().with_active(Control::Descend));
        assert!(near(camera.position(), [0.0, -1.0, 0.0]));
    }

    #[test]
    fn look_turns_by_pointer_delta() {
        let mut camera = Camera::new(Vec3::ZERO, Vec3::ZERO, 1.0, Default::default());
        camera.update(0.1, &InputState::new().with_pointer(100.0, 100.0));

        let look = InputState::new()
            .with_active(Control::Look)
            .with_pointer(90.0, 105.0);
        camera.update(0.1, &look);

        // (previous - current) * look_speed * dt = (10, -5) * 0.2
        let rotation = camera.transform().rotation();
        assert_abs_diff_eq!(rotation.x, -1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(rotation.y, 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(rotation.z, 0.0);
    }

    #[test]
    fn pointer_is_tracked_while_not_looking() {
        let mut camera = Camera::new(Vec3::ZERO, Vec3::ZERO, 1.0, Default::default());
        camera.update(0.1, &InputState::new().with_pointer(500.0, 300.0));
        assert_eq!(camera.transform().rotation(), Vec3::ZERO);

        // Only the movement since the last frame counts, not since the last look.
        camera.update(
            0.1,
            &InputState::new()
                .with_active(Control::Look)
                .with_pointer(500.0, 300.0),
        );
        assert_eq!(camera.transform().rotation(), Vec3::ZERO);
    }

    #[test]
    fn lenient_gating_accepts_a_press_released_within_the_frame() {
        let click = InputState::new()
            .with_pressed(Control::Look)
            .with_pointer(10.0, 0.0);

        let mut lenient = Camera::new(Vec3::ZERO, Vec3::ZERO, 1.0, Default::default());
        lenient.update(1.0, &click);
        assert_ne!(lenient.transform().rotation(), Vec3::ZERO);

        let settings = CameraSettings {
            look_gating: LookGating::Held,
            ..Default::default()
        };
        let mut strict = Camera::new(Vec3::ZERO, Vec3::ZERO, 1.0, settings);
        strict.update(1.0, &click);
        assert_eq!(strict.transform().rotation(), Vec3::ZERO);
    }
}
