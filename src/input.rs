//! Keyboard and mouse state for the viewer.
//!
//! [`Input`] folds raw winit window events into per-frame state: keys and
//! buttons pressed this frame, buttons held, and the cursor position both
//! in pixels and normalized to the window. [`ControlAction::for_key`] maps
//! the keyboard shortcuts onto control-surface actions.

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

use crate::archetype::ShapeArchetype;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl From<WinitMouseButton> for MouseButton {
    fn from(btn: WinitMouseButton) -> Self {
        match btn {
            WinitMouseButton::Right => MouseButton::Right,
            WinitMouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Left,
        }
    }
}

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    C,
    R,
    Space,
    Escape,
    Other,
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::Digit1 | WinitKeyCode::Numpad1 => KeyCode::Key1,
            WinitKeyCode::Digit2 | WinitKeyCode::Numpad2 => KeyCode::Key2,
            WinitKeyCode::Digit3 | WinitKeyCode::Numpad3 => KeyCode::Key3,
            WinitKeyCode::Digit4 | WinitKeyCode::Numpad4 => KeyCode::Key4,
            WinitKeyCode::Digit5 | WinitKeyCode::Numpad5 => KeyCode::Key5,
            WinitKeyCode::Digit6 | WinitKeyCode::Numpad6 => KeyCode::Key6,
            WinitKeyCode::KeyC => KeyCode::C,
            WinitKeyCode::KeyR => KeyCode::R,
            WinitKeyCode::Space => KeyCode::Space,
            WinitKeyCode::Escape => KeyCode::Escape,
            _ => KeyCode::Other,
        }
    }
}

/// Something the user asked the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Switch the target archetype.
    Select(ShapeArchetype),
    /// Submit the archetype's preset prompt and switch to it.
    LoadPreset(ShapeArchetype),
    /// Cycle to the next palette colour.
    NextColor,
    /// Drop every cached cloud.
    ResetCache,
    TogglePause,
    Quit,
}

impl ControlAction {
    /// Keyboard shortcut table.
    ///
    /// | Key | Action |
    /// |-----|--------|
    /// | 1-4 | Heart, Flower, Saturn, Fireworks |
    /// | 5 | Load the Buddha preset |
    /// | 6 | Custom AI shape |
    /// | C | Next colour |
    /// | R | Reset the shape cache |
    /// | Space | Pause |
    /// | Esc | Quit |
    pub fn for_key(key: KeyCode) -> Option<Self> {
        let action = match key {
            KeyCode::Key1 => ControlAction::Select(ShapeArchetype::Heart),
            KeyCode::Key2 => ControlAction::Select(ShapeArchetype::Flower),
            KeyCode::Key3 => ControlAction::Select(ShapeArchetype::Saturn),
            KeyCode::Key4 => ControlAction::Select(ShapeArchetype::Fireworks),
            KeyCode::Key5 => ControlAction::LoadPreset(ShapeArchetype::AiPrimary),
            KeyCode::Key6 => ControlAction::Select(ShapeArchetype::AiCustom),
            KeyCode::C => ControlAction::NextColor,
            KeyCode::R => ControlAction::ResetCache,
            KeyCode::Space => ControlAction::TogglePause,
            KeyCode::Escape => ControlAction::Quit,
            KeyCode::Other => return None,
        };
        Some(action)
    }
}

/// Input state tracking for keyboard and mouse.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: Vec<KeyCode>,

    mouse_held: HashSet<MouseButton>,

    mouse_position: Vec2,
    mouse_delta: Vec2,
    cursor_moved: bool,

    window_size: (u32, u32),
}

impl Input {
    pub fn new() -> Self {
        Self {
            window_size: (800, 600),
            ..Default::default()
        }
    }

    // ========== Key Queries ==========

    /// Keys that went down this frame, in press order. Auto-repeat is
    /// ignored.
    pub fn keys_pressed(&self) -> &[KeyCode] {
        &self.keys_pressed
    }

    // ========== Mouse Queries ==========

    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    /// Cursor position in pixels.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Cursor movement since last frame in pixels.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Cursor position in `[0, 1]²`, origin top-left.
    pub fn cursor_normalized(&self) -> Vec2 {
        let (w, h) = self.window_size;
        if w == 0 || h == 0 {
            return Vec2::splat(0.5);
        }
        (self.mouse_position / Vec2::new(w as f32, h as f32)).clamp(Vec2::ZERO, Vec2::ONE)
    }

    /// Whether the cursor moved this frame.
    pub fn cursor_moved(&self) -> bool {
        self.cursor_moved
    }

    // ========== Frame Bookkeeping ==========

    /// Clear per-frame state. Call after the frame has consumed it.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_delta = Vec2::ZERO;
        self.cursor_moved = false;
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    let key = KeyCode::from(keycode);
                    match event.state {
                        ElementState::Pressed => {
                            if self.keys_held.insert(key) {
                                self.keys_pressed.push(key);
                            }
                        }
                        ElementState::Released => {
                            self.keys_held.remove(&key);
                        }
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let btn = MouseButton::from(*button);
                match state {
                    ElementState::Pressed => {
                        self.mouse_held.insert(btn);
                    }
                    ElementState::Released => {
                        self.mouse_held.remove(&btn);
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let new_pos = Vec2::new(position.x as f32, position.y as f32);
                self.mouse_delta += new_pos - self.mouse_position;
                self.mouse_position = new_pos;
                self.cursor_moved = true;
            }

            WindowEvent::Resized(size) => self.set_window_size(size.width, size.height),

            WindowEvent::Focused(false) => {
                self.keys_held.clear();
                self.mouse_held.clear();
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut input = Input::new();
        assert!(!input.keys_held.contains(&KeyCode::Space));
        assert!(input.keys_pressed().is_empty());

        input.keys_pressed.push(KeyCode::Space);
        input.keys_held.insert(KeyCode::Space);
        assert!(input.keys_held.contains(&KeyCode::Space));
        assert_eq!(input.keys_pressed(), &[KeyCode::Space]);

        input.end_frame();
        assert!(input.keys_held.contains(&KeyCode::Space));
        assert!(input.keys_pressed().is_empty());
    }

    #[test]
    fn test_cursor_normalized() {
        let mut input = Input::new();
        input.set_window_size(800, 600);

        input.mouse_position = Vec2::new(400.0, 150.0);
        let n = input.cursor_normalized();
        assert!((n.x - 0.5).abs() < 1e-6);
        assert!((n.y - 0.25).abs() < 1e-6);

        input.mouse_position = Vec2::new(-20.0, 900.0);
        assert_eq!(input.cursor_normalized(), Vec2::new(0.0, 1.0));

        input.set_window_size(0, 0);
        assert_eq!(input.cursor_normalized(), Vec2::splat(0.5));
    }

    #[test]
    fn test_shortcuts() {
        assert_eq!(
            ControlAction::for_key(KeyCode::Key3),
            Some(ControlAction::Select(ShapeArchetype::Saturn))
        );
        assert_eq!(
            ControlAction::for_key(KeyCode::Key5),
            Some(ControlAction::LoadPreset(ShapeArchetype::AiPrimary))
        );
        assert_eq!(ControlAction::for_key(KeyCode::R), Some(ControlAction::ResetCache));
        assert_eq!(ControlAction::for_key(KeyCode::Other), None);
        assert_eq!(KeyCode::from(WinitKeyCode::Digit6), KeyCode::Key6);
        assert_eq!(KeyCode::from(WinitKeyCode::KeyQ), KeyCode::Other);
    }
}
