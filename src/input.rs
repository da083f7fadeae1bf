//! Keyboard and mouse input.
//!
//! [`Input`] accumulates winit window events. Once per frame it is reduced to an
//! [`InputState`] snapshot through a set of [`KeyBindings`]; the camera and the
//! scene only ever see the snapshot.

use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// A named control the scene reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Control {
    MoveForward,
    MoveBackward,
    StrafeLeft,
    StrafeRight,
    Ascend,
    Descend,
    /// Hold to turn the camera with the pointer.
    Look,
    Quit,
}

/// A physical key or mouse button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Binding {
    Key(KeyCode),
    Mouse(MouseButton),
}

/// Maps each [`Control`] to the physical inputs that drive it.
#[derive(Clone, Debug)]
pub struct KeyBindings {
    bindings: Vec<(Control, Binding)>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            bindings: vec![
                (Control::MoveForward, Binding::Key(KeyCode::KeyW)),
                (Control::MoveBackward, Binding::Key(KeyCode::KeyS)),
                (Control::StrafeLeft, Binding::Key(KeyCode::KeyA)),
                (Control::StrafeRight, Binding::Key(KeyCode::KeyD)),
                (Control::Ascend, Binding::Key(KeyCode::KeyQ)),
                (Control::Descend, Binding::Key(KeyCode::KeyE)),
                (Control::Look, Binding::Mouse(MouseButton::Right)),
                (Control::Quit, Binding::Key(KeyCode::Escape)),
            ],
        }
    }
}

impl KeyBindings {
    /// Bindings with nothing mapped.
    pub fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Add another physical input for `control`. Existing bindings are kept.
    pub fn bind(mut self, control: Control, binding: Binding) -> Self {
        self.bindings.push((control, binding));
        self
    }

    /// Drop every binding for `control`.
    pub fn unbind(mut self, control: Control) -> Self {
        self.bindings.retain(|(c, _)| *c != control);
        self
    }

    pub fn bindings_for(&self, control: Control) -> impl Iterator<Item = Binding> + '_ {
        self.bindings
            .iter()
            .filter(move |(c, _)| *c == control)
            .map(|(_, b)| *b)
    }
}

/// One frame's view of the controls and the pointer.
#[derive(Clone, Debug, Default)]
pub struct InputState {
    active: HashSet<Control>,
    pressed: HashSet<Control>,
    pointer: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `control` as held.
    pub fn with_active(mut self, control: Control) -> Self {
        self.active.insert(control);
        self
    }

    /// Mark `control` as pressed since the previous snapshot.
    pub fn with_pressed(mut self, control: Control) -> Self {
        self.pressed.insert(control);
        self
    }

    pub fn with_pointer(mut self, x: f32, y: f32) -> Self {
        self.pointer = Vec2::new(x, y);
        self
    }

    /// Returns true while the control is held.
    pub fn is_active(&self, control: Control) -> bool {
        self.active.contains(&control)
    }

    /// Returns true if the control went down since the previous snapshot, even
    /// if it has been released again.
    pub fn was_pressed(&self, control: Control) -> bool {
        self.pressed.contains(&control)
    }

    /// Pointer position in window pixels.
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }
}

/// Tracks keyboard and mouse state from window events.
#[derive(Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    mouse_buttons_down: HashSet<MouseButton>,
    mouse_buttons_pressed: HashSet<MouseButton>,
    mouse_position: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call once the frame's snapshot has been taken.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_buttons_pressed.clear();
    }

    /// Process a window event and update input state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            if self.keys_down.insert(key) {
                                self.keys_pressed.insert(key);
                            }
                        }
                        ElementState::Released => {
                            self.keys_down.remove(&key);
                        }
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    if self.mouse_buttons_down.insert(*button) {
                        self.mouse_buttons_pressed.insert(*button);
                    }
                }
                ElementState::Released => {
                    self.mouse_buttons_down.remove(button);
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = Vec2::new(position.x as f32, position.y as f32);
            }
            WindowEvent::Focused(false) => {
                // Releases are not delivered to an unfocused window.
                self.keys_down.clear();
                self.mouse_buttons_down.clear();
            }
            _ => {}
        }
    }

    /// Returns true if the key is currently held down.
    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Returns true if the mouse button is currently held down.
    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons_down.contains(&button)
    }

    /// Current mouse position in window coordinates.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    fn binding_down(&self, binding: Binding) -> bool {
        match binding {
            Binding::Key(key) => self.keys_down.contains(&key),
            Binding::Mouse(button) => self.mouse_buttons_down.contains(&button),
        }
    }

    fn binding_pressed(&self, binding: Binding) -> bool {
        match binding {
            Binding::Key(key) => self.keys_pressed.contains(&key),
            Binding::Mouse(button) => self.mouse_buttons_pressed.contains(&button),
        }
    }

    /// Reduce the tracked state to the controls named by `bindings`.
    pub fn snapshot(&self, bindings: &KeyBindings) -> InputState {
        let mut state = InputState {
            pointer: self.mouse_position,
            ..Default::default()
        };
        for &(control, binding) in &bindings.bindings {
            if self.binding_down(binding) {
                state.active.insert(control);
            }
            if self.binding_pressed(binding) {
                state.pressed.insert(control);
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_cover_every_control() {
        let bindings = KeyBindings::default();
        for control in [
            Control::MoveForward,
            Control::MoveBackward,
            Control::StrafeLeft,
            Control::StrafeRight,
            Control::Ascend,
            Control::Descend,
            Control::Look,
            Control::Quit,
        ] {
            assert_eq!(bindings.bindings_for(control).count(), 1, "{control:?}");
        }
        assert_eq!(
            bindings.bindings_for(Control::Look).next(),
            Some(Binding::Mouse(MouseButton::Right))
        );
    }

    #[test]
    fn rebinding_replaces_and_extends() {
        let bindings = KeyBindings::default()
            .unbind(Control::Quit)
            .bind(Control::Quit, Binding::Key(KeyCode::KeyX))
            .bind(Control::MoveForward, Binding::Key(KeyCode::ArrowUp));

        let quit: Vec<_> = bindings.bindings_for(Control::Quit).collect();
        assert_eq!(quit, vec![Binding::Key(KeyCode::KeyX)]);
        assert_eq!(bindings.bindings_for(Control::MoveForward).count(), 2);
    }

    #[test]
    fn snapshot_maps_held_and_pressed_bindings() {
        let mut input = Input::new();
        input.keys_down.insert(KeyCode::KeyW);
        input.keys_pressed.insert(KeyCode::KeyW);
        input.mouse_buttons_down.insert(MouseButton::Right);
        input.mouse_position = Vec2::new(12.0, 34.0);

        let state = input.snapshot(&KeyBindings::default());
        assert!(state.is_active(Control::MoveForward));
        assert!(state.was_pressed(Control::MoveForward));
        assert!(state.is_active(Control::Look));
        assert!(!state.was_pressed(Control::Look));
        assert!(!state.is_active(Control::Quit));
        assert_eq!(state.pointer(), Vec2::new(12.0, 34.0));

        input.begin_frame();
        let state = input.snapshot(&KeyBindings::default());
        assert!(state.is_active(Control::MoveForward));
        assert!(!state.was_pressed(Control::MoveForward));
    }

    #[test]
    fn snapshot_ignores_unbound_keys() {
        let mut input = Input::new();
        input.keys_down.insert(KeyCode::KeyW);
        let state = input.snapshot(&KeyBindings::empty());
        assert!(!state.is_active(Control::MoveForward));
    }
}
