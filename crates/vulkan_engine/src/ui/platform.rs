//! GLFW platform glue for imgui
//!
//! Window events are first translated into [`InputEvent`]s, which carry
//! everything imgui needs and can be inspected without a live context,
//! then applied to imgui IO.

use std::time::Duration;

use glfw::{Action, Modifiers, WindowEvent};
use imgui::{Io, Key, MouseButton};

use crate::render::window::Window;

/// Input forwarded to imgui
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Cursor moved, in window coordinates
    MousePos([f32; 2]),
    /// Mouse button pressed or released
    MouseButton(MouseButton, bool),
    /// Wheel scrolled (horizontal, vertical)
    MouseWheel([f32; 2]),
    /// Key pressed or released, with the modifier state at that time
    Key {
        /// Mapped imgui key, if the GLFW key has one
        key: Option<Key>,
        /// Pressed or held
        down: bool,
        /// Modifier state reported with the event
        modifiers: Modifiers,
    },
    /// Text input
    Char(char),
    /// Window lost keyboard focus
    FocusLost,
}

/// Map a GLFW key to an imgui key
pub const fn map_key(key: glfw::Key) -> Option<Key> {
    use glfw::Key as G;
    Some(match key {
        G::Tab => Key::Tab,
        G::Left => Key::LeftArrow,
        G::Right => Key::RightArrow,
        G::Up => Key::UpArrow,
        G::Down => Key::DownArrow,
        G::PageUp => Key::PageUp,
        G::PageDown => Key::PageDown,
        G::Home => Key::Home,
        G::End => Key::End,
        G::Insert => Key::Insert,
        G::Delete => Key::Delete,
        G::Backspace => Key::Backspace,
        G::Space => Key::Space,
        G::Enter => Key::Enter,
        G::Escape => Key::Escape,
        G::Apostrophe => Key::Apostrophe,
        G::Comma => Key::Comma,
        G::Minus => Key::Minus,
        G::Period => Key::Period,
        G::Slash => Key::Slash,
        G::Semicolon => Key::Semicolon,
        G::Equal => Key::Equal,
        G::LeftBracket => Key::LeftBracket,
        G::Backslash => Key::Backslash,
        G::RightBracket => Key::RightBracket,
        G::GraveAccent => Key::GraveAccent,
        G::CapsLock => Key::CapsLock,
        G::ScrollLock => Key::ScrollLock,
        G::NumLock => Key::NumLock,
        G::PrintScreen => Key::PrintScreen,
        G::Pause => Key::Pause,
        G::Kp0 => Key::Keypad0,
        G::Kp1 => Key::Keypad1,
        G::Kp2 => Key::Keypad2,
        G::Kp3 => Key::Keypad3,
        G::Kp4 => Key::Keypad4,
        G::Kp5 => Key::Keypad5,
        G::Kp6 => Key::Keypad6,
        G::Kp7 => Key::Keypad7,
        G::Kp8 => Key::Keypad8,
        G::Kp9 => Key::Keypad9,
        G::KpDecimal => Key::KeypadDecimal,
        G::KpDivide => Key::KeypadDivide,
        G::KpMultiply => Key::KeypadMultiply,
        G::KpSubtract => Key::KeypadSubtract,
        G::KpAdd => Key::KeypadAdd,
        G::KpEnter => Key::KeypadEnter,
        G::KpEqual => Key::KeypadEqual,
        G::LeftShift => Key::LeftShift,
        G::LeftControl => Key::LeftCtrl,
        G::LeftAlt => Key::LeftAlt,
        G::LeftSuper => Key::LeftSuper,
        G::RightShift => Key::RightShift,
        G::RightControl => Key::RightCtrl,
        G::RightAlt => Key::RightAlt,
        G::RightSuper => Key::RightSuper,
        G::Menu => Key::Menu,
        G::Num0 => Key::Alpha0,
        G::Num1 => Key::Alpha1,
        G::Num2 => Key::Alpha2,
        G::Num3 => Key::Alpha3,
        G::Num4 => Key::Alpha4,
        G::Num5 => Key::Alpha5,
        G::Num6 => Key::Alpha6,
        G::Num7 => Key::Alpha7,
        G::Num8 => Key::Alpha8,
        G::Num9 => Key::Alpha9,
        G::A => Key::A,
        G::B => Key::B,
        G::C => Key::C,
        G::D => Key::D,
        G::E => Key::E,
        G::F => Key::F,
        G::G => Key::G,
        G::H => Key::H,
        G::I => Key::I,
        G::J => Key::J,
        G::K => Key::K,
        G::L => Key::L,
        G::M => Key::M,
        G::N => Key::N,
        G::O => Key::O,
        G::P => Key::P,
        G::Q => Key::Q,
        G::R => Key::R,
        G::S => Key::S,
        G::T => Key::T,
        G::U => Key::U,
        G::V => Key::V,
        G::W => Key::W,
        G::X => Key::X,
        G::Y => Key::Y,
        G::Z => Key::Z,
        G::F1 => Key::F1,
        G::F2 => Key::F2,
        G::F3 => Key::F3,
        G::F4 => Key::F4,
        G::F5 => Key::F5,
        G::F6 => Key::F6,
        G::F7 => Key::F7,
        G::F8 => Key::F8,
        G::F9 => Key::F9,
        G::F10 => Key::F10,
        G::F11 => Key::F11,
        G::F12 => Key::F12,
        _ => return None,
    })
}

/// Map a GLFW mouse button to an imgui mouse button
pub const fn map_mouse_button(button: glfw::MouseButton) -> Option<MouseButton> {
    match button {
        glfw::MouseButton::Button1 => Some(MouseButton::Left),
        glfw::MouseButton::Button2 => Some(MouseButton::Right),
        glfw::MouseButton::Button3 => Some(MouseButton::Middle),
        glfw::MouseButton::Button4 => Some(MouseButton::Extra1),
        glfw::MouseButton::Button5 => Some(MouseButton::Extra2),
        _ => None,
    }
}

/// Translate a GLFW window event into imgui input
#[allow(clippy::cast_possible_truncation)]
pub fn translate_event(event: &WindowEvent) -> Option<InputEvent> {
    match *event {
        WindowEvent::CursorPos(x, y) => Some(InputEvent::MousePos([x as f32, y as f32])),
        WindowEvent::MouseButton(button, action, _) => {
            map_mouse_button(button).map(|b| InputEvent::MouseButton(b, action != Action::Release))
        }
        WindowEvent::Scroll(x, y) => Some(InputEvent::MouseWheel([x as f32, y as f32])),
        WindowEvent::Key(key, _, action, modifiers) => Some(InputEvent::Key {
            key: map_key(key),
            down: action != Action::Release,
            modifiers,
        }),
        WindowEvent::Char(c) => Some(InputEvent::Char(c)),
        WindowEvent::Focus(false) => Some(InputEvent::FocusLost),
        _ => None,
    }
}

/// Framebuffer-to-window scale, `[1, 1]` for a zero-sized window
#[allow(clippy::cast_precision_loss)]
pub fn framebuffer_scale(window_size: (u32, u32), framebuffer_size: (u32, u32)) -> [f32; 2] {
    if window_size.0 == 0 || window_size.1 == 0 {
        return [1.0, 1.0];
    }
    [
        framebuffer_size.0 as f32 / window_size.0 as f32,
        framebuffer_size.1 as f32 / window_size.1 as f32,
    ]
}

/// Forwards GLFW window state and events to imgui
#[derive(Debug)]
pub struct GlfwPlatform {
    modifiers: Modifiers,
}

impl GlfwPlatform {
    /// Create the platform glue
    pub const fn new() -> Self {
        Self {
            modifiers: Modifiers::empty(),
        }
    }

    /// Forward one window event
    pub fn handle_event(&mut self, io: &mut Io, event: &WindowEvent) {
        if let Some(input) = translate_event(event) {
            self.apply(io, input);
        }
    }

    /// Apply translated input to imgui IO
    pub fn apply(&mut self, io: &mut Io, input: InputEvent) {
        match input {
            InputEvent::MousePos(pos) => io.add_mouse_pos_event(pos),
            InputEvent::MouseButton(button, down) => io.add_mouse_button_event(button, down),
            InputEvent::MouseWheel(wheel) => io.add_mouse_wheel_event(wheel),
            InputEvent::Key { key, down, modifiers } => {
                self.update_modifiers(io, modifiers);
                if let Some(key) = key {
                    io.add_key_event(key, down);
                }
            }
            InputEvent::Char(c) => io.add_input_character(c),
            InputEvent::FocusLost => self.update_modifiers(io, Modifiers::empty()),
        }
    }

    fn update_modifiers(&mut self, io: &mut Io, modifiers: Modifiers) {
        if modifiers == self.modifiers {
            return;
        }
        io.add_key_event(Key::ModCtrl, modifiers.contains(Modifiers::Control));
        io.add_key_event(Key::ModShift, modifiers.contains(Modifiers::Shift));
        io.add_key_event(Key::ModAlt, modifiers.contains(Modifiers::Alt));
        io.add_key_event(Key::ModSuper, modifiers.contains(Modifiers::Super));
        self.modifiers = modifiers;
    }

    /// Set display size, framebuffer scale and frame delta before a new frame
    #[allow(clippy::cast_precision_loss)]
    pub fn prepare_frame(&self, io: &mut Io, window: &Window, delta: Duration) {
        let size = window.size();
        io.display_size = [size.0 as f32, size.1 as f32];
        io.display_framebuffer_scale = framebuffer_scale(size, window.framebuffer_size());
        io.update_delta_time(delta);
    }

    /// Modifier state last forwarded to imgui
    pub const fn modifiers(&self) -> Modifiers {
        self.modifiers
    }
}

impl Default for GlfwPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_keys_map() {
        assert_eq!(map_key(glfw::Key::Tab), Some(Key::Tab));
        assert_eq!(map_key(glfw::Key::Left), Some(Key::LeftArrow));
        assert_eq!(map_key(glfw::Key::KpEnter), Some(Key::KeypadEnter));
        assert_eq!(map_key(glfw::Key::LeftControl), Some(Key::LeftCtrl));
    }

    #[test]
    fn test_letters_and_digits_map() {
        assert_eq!(map_key(glfw::Key::A), Some(Key::A));
        assert_eq!(map_key(glfw::Key::Z), Some(Key::Z));
        assert_eq!(map_key(glfw::Key::Num0), Some(Key::Alpha0));
    }

    #[test]
    fn test_unmapped_key() {
        assert_eq!(map_key(glfw::Key::F25), None);
        assert_eq!(map_key(glfw::Key::Unknown), None);
    }

    #[test]
    fn test_mouse_buttons_map() {
        assert_eq!(map_mouse_button(glfw::MouseButton::Button1), Some(MouseButton::Left));
        assert_eq!(map_mouse_button(glfw::MouseButton::Button2), Some(MouseButton::Right));
        assert_eq!(map_mouse_button(glfw::MouseButton::Button3), Some(MouseButton::Middle));
        assert_eq!(map_mouse_button(glfw::MouseButton::Button8), None);
    }

    #[test]
    fn test_translate_cursor_and_scroll() {
        assert_eq!(
            translate_event(&WindowEvent::CursorPos(10.5, 20.0)),
            Some(InputEvent::MousePos([10.5, 20.0]))
        );
        assert_eq!(
            translate_event(&WindowEvent::Scroll(0.0, -1.0)),
            Some(InputEvent::MouseWheel([0.0, -1.0]))
        );
    }

    #[test]
    fn test_translate_key_repeat_is_down() {
        let event = WindowEvent::Key(glfw::Key::Backspace, 0, Action::Repeat, Modifiers::Shift);
        assert_eq!(
            translate_event(&event),
            Some(InputEvent::Key {
                key: Some(Key::Backspace),
                down: true,
                modifiers: Modifiers::Shift,
            })
        );
    }

    #[test]
    fn test_translate_mouse_release() {
        let event = WindowEvent::MouseButton(glfw::MouseButton::Button1, Action::Release, Modifiers::empty());
        assert_eq!(translate_event(&event), Some(InputEvent::MouseButton(MouseButton::Left, false)));
    }

    #[test]
    fn test_translate_focus_and_text() {
        assert_eq!(translate_event(&WindowEvent::Focus(false)), Some(InputEvent::FocusLost));
        assert_eq!(translate_event(&WindowEvent::Focus(true)), None);
        assert_eq!(translate_event(&WindowEvent::Char('ж')), Some(InputEvent::Char('ж')));
    }

    #[test]
    fn test_framebuffer_scale() {
        assert_eq!(framebuffer_scale((1280, 720), (2560, 1440)), [2.0, 2.0]);
        assert_eq!(framebuffer_scale((0, 0), (0, 0)), [1.0, 1.0]);
    }
}
