//! Raw input collection from winit events

use std::collections::HashSet;

use winit::event::{DeviceEvent, ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::PhysicalKey;

use super::events::KeyCode;
use super::state::InputState;

/// Pixels per wheel line for touchpads reporting pixel deltas
const PIXELS_PER_LINE: f32 = 20.0;

/// Collects raw input from winit events and maintains InputState
pub struct InputCollector {
    state: InputState,
    /// Keys pressed and released within the same frame; released on advance
    pending_release: HashSet<KeyCode>,
}

impl InputCollector {
    /// Creates a new input collector
    pub fn new() -> Self {
        Self {
            state: InputState::new(),
            pending_release: HashSet::new(),
        }
    }

    /// Handle a winit window event
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.move_cursor(position.x as f32, position.y as f32);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
                self.scroll(lines);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                // OS auto-repeat never counts as a new press
                if event.repeat {
                    return;
                }
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let key = KeyCode::from(code);
                if key == KeyCode::Other {
                    return;
                }
                match event.state {
                    ElementState::Pressed => self.press_key(key),
                    ElementState::Released => self.release_key(key),
                }
            }

            WindowEvent::Focused(false) => self.release_all(),

            _ => {}
        }
    }

    /// Handle a winit device event
    ///
    /// Pointer motion keeps arriving while the cursor is grabbed, even when it
    /// sits at the window edge or no longer produces `CursorMoved`.
    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.move_mouse(delta.0 as f32, delta.1 as f32);
        }
    }

    pub fn press_key(&mut self, key: KeyCode) {
        self.pending_release.remove(&key);
        self.state.keyboard.press(key);
    }

    pub fn release_key(&mut self, key: KeyCode) {
        // Keep the press edge visible for this frame
        if self.state.keyboard.get(key).is_just_pressed() {
            self.pending_release.insert(key);
        } else {
            self.state.keyboard.release(key);
        }
    }

    pub fn move_cursor(&mut self, x: f32, y: f32) {
        self.state.mouse.position = Some([x, y]);
    }

    pub fn move_mouse(&mut self, dx: f32, dy: f32) {
        let motion = &mut self.state.mouse.motion;
        motion[0] += dx;
        motion[1] += dy;
    }

    pub fn scroll(&mut self, lines: f32) {
        self.state.mouse.scroll_delta += lines;
    }

    /// Releases every held key, e.g. when the window loses focus
    pub fn release_all(&mut self) {
        let held: Vec<KeyCode> = self
            .state
            .keyboard
            .iter()
            .filter(|(_, state)| state.is_down())
            .map(|(key, _)| key)
            .collect();
        for key in held {
            self.release_key(key);
        }
    }

    /// Advance to next frame (transitions edge states to steady states)
    pub fn advance_frame(&mut self) {
        self.state.advance_frame();
        for key in self.pending_release.drain() {
            self.state.keyboard.release(key);
        }
    }

    /// Get current input state
    pub fn state(&self) -> &InputState {
        &self.state
    }

    /// Clone current state for processing
    ///
    /// Cloned rather than taken so held keys and the cursor position carry over
    pub fn clone_state(&self) -> InputState {
        self.state.clone()
    }
}

impl Default for InputCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::input::ButtonState;

    #[test]
    fn test_tap_within_one_frame_keeps_press_edge() {
        let mut collector = InputCollector::new();
        collector.press_key(KeyCode::F1);
        collector.release_key(KeyCode::F1);
        assert!(collector.state().keyboard.get(KeyCode::F1).is_just_pressed());

        collector.advance_frame();
        assert!(collector.state().keyboard.get(KeyCode::F1).is_just_released());

        collector.advance_frame();
        assert_eq!(collector.state().keyboard.get(KeyCode::F1), ButtonState::Released);
    }

    #[test]
    fn test_scroll_accumulates_within_frame() {
        let mut collector = InputCollector::new();
        collector.scroll(1.0);
        collector.scroll(0.5);
        assert_eq!(collector.state().mouse.scroll_delta, 1.5);

        collector.advance_frame();
        assert_eq!(collector.state().mouse.scroll_delta, 0.0);
    }

    #[test]
    fn test_motion_accumulates_within_frame() {
        let mut collector = InputCollector::new();
        collector.handle_device_event(&DeviceEvent::MouseMotion { delta: (3.0, -1.0) });
        collector.handle_device_event(&DeviceEvent::MouseMotion { delta: (2.0, 4.0) });
        assert_eq!(collector.state().mouse.motion, [5.0, 3.0]);

        collector.advance_frame();
        assert_eq!(collector.state().mouse.motion, [0.0, 0.0]);
    }

    #[test]
    fn test_focus_loss_releases_keys() {
        let mut collector = InputCollector::new();
        collector.press_key(KeyCode::W);
        collector.advance_frame();
        collector.release_all();
        assert!(!collector.state().keyboard.is_down(KeyCode::W));
    }
}
