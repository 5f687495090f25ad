//! Keyboard and mouse mapping for the night scene

use super::events::{InputEvent, KeyCode};
use super::handler::InputHandler;
use super::state::InputState;
use crate::scene::Movement;

/// Direction of an exposure change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureChange {
    Up,
    Down,
}

/// What the scene should do in response to input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneAction {
    Quit,
    ToggleOverlay,
    ToggleHdr,
    /// One frame of movement; scaled by the frame delta when applied
    Move(Movement),
    /// Pointer offset, y pointing up
    Look { dx: f32, dy: f32 },
    /// Wheel offset in lines
    Zoom(f32),
    /// One exposure step
    Exposure(ExposureChange),
}

const MOVEMENT_KEYS: [(KeyCode, Movement); 4] = [
    (KeyCode::W, Movement::Forward),
    (KeyCode::S, Movement::Backward),
    (KeyCode::A, Movement::Left),
    (KeyCode::D, Movement::Right),
];

const EXPOSURE_KEYS: [(KeyCode, ExposureChange); 2] = [
    (KeyCode::Q, ExposureChange::Down),
    (KeyCode::E, ExposureChange::Up),
];

/// Turns input events into [`SceneAction`]s for the frame
#[derive(Debug, Default)]
pub struct SceneInputHandler {
    actions: Vec<SceneAction>,
    /// Reference point for mouse-look; unset until the first sample
    last_cursor: Option<[f32; 2]>,
    /// Set once raw pointer motion arrives; cursor positions then only
    /// update the reference point
    relative_motion: bool,
}

impl SceneInputHandler {
    pub const NAME: &'static str = "scene";

    pub fn new() -> Self {
        Self::default()
    }

    /// Offset from the previous cursor sample, y inverted
    ///
    /// The first sample only records the reference point and yields zero.
    pub fn look_delta(&mut self, pos: [f32; 2]) -> [f32; 2] {
        let delta = match self.last_cursor {
            Some([last_x, last_y]) => [pos[0] - last_x, last_y - pos[1]],
            None => [0.0, 0.0],
        };
        self.last_cursor = Some(pos);
        delta
    }

    /// Forgets the reference point, e.g. when the cursor is re-captured
    pub fn reset_cursor(&mut self) {
        self.last_cursor = None;
    }

    /// Actions collected since the last call
    pub fn drain_actions(&mut self) -> Vec<SceneAction> {
        std::mem::take(&mut self.actions)
    }
}

impl InputHandler for SceneInputHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> u32 {
        50
    }

    fn handle_event(&mut self, event: &InputEvent, _state: &InputState) -> bool {
        let action = match *event {
            InputEvent::KeyPress { key: KeyCode::Escape } => SceneAction::Quit,
            InputEvent::KeyPress { key: KeyCode::F1 } => SceneAction::ToggleOverlay,
            InputEvent::KeyPress { key: KeyCode::Space } => SceneAction::ToggleHdr,
            InputEvent::MouseMove { pos } => {
                let [dx, dy] = self.look_delta(pos);
                if self.relative_motion {
                    return true;
                }
                SceneAction::Look { dx, dy }
            }
            InputEvent::MouseMotion { delta: [dx, dy] } => {
                self.relative_motion = true;
                SceneAction::Look { dx, dy: -dy }
            }
            InputEvent::Scroll { delta } => SceneAction::Zoom(delta),
            _ => return false,
        };
        self.actions.push(action);
        true
    }

    fn update(&mut self, state: &InputState) {
        for (key, movement) in MOVEMENT_KEYS {
            if state.keyboard.is_down(key) {
                self.actions.push(SceneAction::Move(movement));
            }
        }
        for (key, change) in EXPOSURE_KEYS {
            if state.keyboard.is_down(key) {
                self.actions.push(SceneAction::Exposure(change));
            }
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_is_zero() {
        let mut handler = SceneInputHandler::new();
        assert_eq!(handler.look_delta([400.0, 300.0]), [0.0, 0.0]);
        assert_eq!(handler.look_delta([410.0, 290.0]), [10.0, 10.0]);

        handler.reset_cursor();
        assert_eq!(handler.look_delta([0.0, 0.0]), [0.0, 0.0]);
    }

    #[test]
    fn test_raw_motion_replaces_cursor_deltas() {
        let mut handler = SceneInputHandler::new();
        let state = InputState::new();

        handler.handle_event(&InputEvent::MouseMove { pos: [400.0, 300.0] }, &state);
        handler.handle_event(&InputEvent::MouseMotion { delta: [6.0, 2.0] }, &state);
        handler.handle_event(&InputEvent::MouseMove { pos: [406.0, 302.0] }, &state);

        assert_eq!(
            handler.drain_actions(),
            vec![
                SceneAction::Look { dx: 0.0, dy: 0.0 },
                SceneAction::Look { dx: 6.0, dy: -2.0 },
            ]
        );
    }

    #[test]
    fn test_held_keys_repeat_every_frame() {
        let mut handler = SceneInputHandler::new();
        let mut state = InputState::new();
        state.keyboard.press(KeyCode::W);
        state.keyboard.press(KeyCode::E);

        handler.update(&state);
        state.advance_frame();
        handler.update(&state);

        let actions = handler.drain_actions();
        let moves = actions
            .iter()
            .filter(|a| **a == SceneAction::Move(Movement::Forward))
            .count();
        let steps = actions
            .iter()
            .filter(|a| **a == SceneAction::Exposure(ExposureChange::Up))
            .count();
        assert_eq!((moves, steps), (2, 2));
    }

    #[test]
    fn test_unmapped_keys_pass_through() {
        let mut handler = SceneInputHandler::new();
        let state = InputState::new();
        assert!(!handler.handle_event(&InputEvent::KeyPress { key: KeyCode::Other }, &state));
        assert!(!handler.handle_event(&InputEvent::KeyRelease { key: KeyCode::Space }, &state));
        assert!(handler.drain_actions().is_empty());
    }
}
