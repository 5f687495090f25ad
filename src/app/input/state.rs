//! Raw input state

use std::collections::HashMap;

use super::events::KeyCode;

/// Raw input state snapshot for a single frame
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub mouse: MouseState,
    pub keyboard: KeyboardState,
}

/// Mouse input state
#[derive(Debug, Clone, Default)]
pub struct MouseState {
    /// Cursor position in window coordinates (physical pixels)
    pub position: Option<[f32; 2]>,
    /// Relative pointer motion accumulated this frame
    pub motion: [f32; 2],
    /// Vertical wheel offset this frame, in lines
    pub scroll_delta: f32,
}

/// Button press state with edge detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Released,
    /// Pressed this frame (edge)
    JustPressed,
    /// Held down (multiple frames)
    Pressed,
    /// Released this frame (edge)
    JustReleased,
}

impl ButtonState {
    /// Advance state for next frame (transitions edges to steady states)
    pub fn advance(self) -> Self {
        match self {
            Self::JustPressed => Self::Pressed,
            Self::JustReleased => Self::Released,
            state => state,
        }
    }

    /// Returns true if button is currently down (just pressed or held)
    pub fn is_down(self) -> bool {
        matches!(self, Self::JustPressed | Self::Pressed)
    }

    /// Returns true if button was just pressed this frame
    pub fn is_just_pressed(self) -> bool {
        matches!(self, Self::JustPressed)
    }

    /// Returns true if button was just released this frame
    pub fn is_just_released(self) -> bool {
        matches!(self, Self::JustReleased)
    }
}

/// Keyboard input state; keys absent from the map are released
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    keys: HashMap<KeyCode, ButtonState>,
}

impl KeyboardState {
    pub fn get(&self, key: KeyCode) -> ButtonState {
        self.keys.get(&key).copied().unwrap_or_default()
    }

    pub fn is_down(&self, key: KeyCode) -> bool {
        self.get(key).is_down()
    }

    /// Records a press; a key that is already down stays as it is
    pub fn press(&mut self, key: KeyCode) {
        let state = self.keys.entry(key).or_default();
        if !state.is_down() {
            *state = ButtonState::JustPressed;
        }
    }

    pub fn release(&mut self, key: KeyCode) {
        if let Some(state) = self.keys.get_mut(&key)
            && state.is_down()
        {
            *state = ButtonState::JustReleased;
        }
    }

    /// Keys with a state other than released, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (KeyCode, ButtonState)> + '_ {
        self.keys.iter().map(|(key, state)| (*key, *state))
    }

    fn advance(&mut self) {
        self.keys.retain(|_, state| {
            *state = state.advance();
            *state != ButtonState::Released
        });
    }
}

impl InputState {
    /// Creates a new empty input state
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance all button states for next frame
    pub fn advance_frame(&mut self) {
        self.keyboard.advance();
        self.mouse.scroll_delta = 0.0;
        self.mouse.motion = [0.0, 0.0];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_is_an_edge_once() {
        let mut state = InputState::new();
        state.keyboard.press(KeyCode::Space);
        assert!(state.keyboard.get(KeyCode::Space).is_just_pressed());

        state.advance_frame();
        state.keyboard.press(KeyCode::Space);
        assert_eq!(state.keyboard.get(KeyCode::Space), ButtonState::Pressed);
    }

    #[test]
    fn test_release_then_advance_forgets_key() {
        let mut state = InputState::new();
        state.keyboard.press(KeyCode::W);
        state.advance_frame();
        state.keyboard.release(KeyCode::W);
        assert!(state.keyboard.get(KeyCode::W).is_just_released());

        state.advance_frame();
        assert_eq!(state.keyboard.get(KeyCode::W), ButtonState::Released);
        assert_eq!(state.keyboard.iter().count(), 0);
    }

    #[test]
    fn test_scroll_is_per_frame() {
        let mut state = InputState::new();
        state.mouse.scroll_delta = 2.0;
        state.mouse.position = Some([4.0, 5.0]);
        state.advance_frame();
        assert_eq!(state.mouse.scroll_delta, 0.0);
        assert_eq!(state.mouse.position, Some([4.0, 5.0]));
    }
}
