//! Program state and its plain-text persistence
//!
//! The state file holds ten whitespace-separated tokens in a fixed order:
//! clear color (r, g, b), the UI flag, camera position (x, y, z) and camera
//! front (x, y, z). There is no header and no version marker.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::SplitWhitespace;

use glam::Vec3;
use thiserror::Error;
use tracing::debug;

use super::camera::FlyCamera;
use super::light::DirectionalLight;
use super::object::ObjectKind;

/// Errors raised while reading or writing the state file
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read program state from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write program state to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("program state ended before field `{field}`")]
    MissingField { field: &'static str },

    #[error("invalid value {token:?} for field `{field}`")]
    InvalidField { field: &'static str, token: String },
}

/// Position and uniform scale of one object category
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub scale: f32,
}

impl Placement {
    pub const fn new(position: Vec3, scale: f32) -> Self {
        Self { position, scale }
    }
}

/// Placements for every object category
#[derive(Debug, Clone, PartialEq)]
pub struct Placements {
    pub tree: Placement,
    pub pumpkin: Placement,
    pub bat: Placement,
    pub moon: Placement,
    pub ground: Placement,
}

impl Placements {
    pub fn get(&self, kind: ObjectKind) -> &Placement {
        match kind {
            ObjectKind::Tree => &self.tree,
            ObjectKind::Pumpkin => &self.pumpkin,
            ObjectKind::Bat => &self.bat,
            ObjectKind::Moon => &self.moon,
            ObjectKind::Ground => &self.ground,
        }
    }
}

impl Default for Placements {
    fn default() -> Self {
        Self {
            tree: Placement::new(Vec3::new(20.0, -13.0, 8.0), 5.5),
            pumpkin: Placement::new(Vec3::new(8.0, -10.0, 14.0), 0.04),
            bat: Placement::new(Vec3::new(26.0, 27.0, 0.0), 1.2),
            moon: Placement::new(Vec3::new(-6.0, 29.0, 0.0), 2.0),
            ground: Placement::new(Vec3::new(0.0, -16.0, 0.0), 10.0),
        }
    }
}

/// Mutable application state shared by input handling and rendering
///
/// Values loaded from disk are taken as-is; nothing is range checked.
#[derive(Debug, Clone)]
pub struct ProgramState {
    pub clear_color: Vec3,
    pub ui_enabled: bool,
    pub camera: FlyCamera,
    pub camera_mouse_enabled: bool,
    pub placements: Placements,
    pub directional_light: DirectionalLight,
}

impl Default for ProgramState {
    fn default() -> Self {
        Self {
            clear_color: Vec3::ZERO,
            ui_enabled: false,
            camera: FlyCamera::default(),
            camera_mouse_enabled: true,
            placements: Placements::default(),
            directional_light: DirectionalLight::default(),
        }
    }
}

impl ProgramState {
    /// Loads state from `path`, falling back to defaults
    ///
    /// Never fails: a missing file leaves every field at its default, and a
    /// short or malformed file keeps the fields read before the bad token.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut state = Self::default();

        match state.read_from(path) {
            Ok(()) => debug!(path = %path.display(), "Program state loaded"),
            Err(e) => debug!(path = %path.display(), error = %e, "Using default program state"),
        }

        state
    }

    /// Reads the state file over the current values, stopping at the first bad token
    pub fn read_from(&mut self, path: &Path) -> Result<(), StateError> {
        let contents = fs::read_to_string(path).map_err(|source| StateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.apply_tokens(&contents)
    }

    /// Writes the ten persisted fields to `path`, replacing the file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StateError> {
        let path = path.as_ref();
        fs::write(path, self.to_text()).map_err(|source| StateError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "Program state saved");
        Ok(())
    }

    /// Serialized form, one token per line
    pub fn to_text(&self) -> String {
        let camera = &self.camera;
        let mut lines: Vec<String> = self.clear_color.to_array().iter().map(f32::to_string).collect();
        lines.push(u8::from(self.ui_enabled).to_string());
        lines.extend(
            camera
                .position
                .to_array()
                .into_iter()
                .chain(camera.front.to_array())
                .map(|value| value.to_string()),
        );

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    fn apply_tokens(&mut self, contents: &str) -> Result<(), StateError> {
        let mut tokens = Tokens::new(contents);

        self.clear_color.x = tokens.next_f32("clear_color.r")?;
        self.clear_color.y = tokens.next_f32("clear_color.g")?;
        self.clear_color.z = tokens.next_f32("clear_color.b")?;
        self.ui_enabled = tokens.next_bool("ui_enabled")?;
        self.camera.position.x = tokens.next_f32("camera.position.x")?;
        self.camera.position.y = tokens.next_f32("camera.position.y")?;
        self.camera.position.z = tokens.next_f32("camera.position.z")?;

        let mut front = self.camera.front;
        let result = read_front(&mut tokens, &mut front);
        if front != self.camera.front {
            self.camera.set_front(front);
        }

        result
    }
}

/// Front components are applied one by one, so a short file still moves the ones it has
fn read_front(tokens: &mut Tokens<'_>, front: &mut Vec3) -> Result<(), StateError> {
    front.x = tokens.next_f32("camera.front.x")?;
    front.y = tokens.next_f32("camera.front.y")?;
    front.z = tokens.next_f32("camera.front.z")?;
    Ok(())
}

/// Sequential reader over whitespace-separated tokens
struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(contents: &'a str) -> Self {
        Self {
            inner: contents.split_whitespace(),
        }
    }

    fn next_token(&mut self, field: &'static str) -> Result<&'a str, StateError> {
        self.inner.next().ok_or(StateError::MissingField { field })
    }

    fn next_f32(&mut self, field: &'static str) -> Result<f32, StateError> {
        let token = self.next_token(field)?;
        token.parse().map_err(|_| StateError::InvalidField {
            field,
            token: token.to_string(),
        })
    }

    fn next_bool(&mut self, field: &'static str) -> Result<bool, StateError> {
        let token = self.next_token(field)?;
        match token {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(StateError::InvalidField {
                field,
                token: token.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_layout() {
        let mut state = ProgramState::default();
        state.clear_color = Vec3::new(0.25, 0.5, 1.0);
        state.ui_enabled = true;

        let text = state.to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(&lines[..4], &["0.25", "0.5", "1", "1"]);
        assert_eq!(&lines[4..7], &["0", "0", "3"]);
    }

    #[test]
    fn test_short_input_keeps_prefix() {
        let mut state = ProgramState::default();
        let result = state.apply_tokens("0.1 0.2 0.3 1 5");

        assert!(matches!(
            result,
            Err(StateError::MissingField {
                field: "camera.position.y"
            })
        ));
        assert_eq!(state.clear_color, Vec3::new(0.1, 0.2, 0.3));
        assert!(state.ui_enabled);
        assert_eq!(state.camera.position, Vec3::new(5.0, 0.0, 3.0));
    }

    #[test]
    fn test_malformed_token_stops_reading() {
        let mut state = ProgramState::default();
        let result = state.apply_tokens("0.5 abc 0.5 1 1 1 1 0 0 -1");

        assert!(matches!(
            result,
            Err(StateError::InvalidField {
                field: "clear_color.g",
                ..
            })
        ));
        assert_eq!(state.clear_color, Vec3::new(0.5, 0.0, 0.0));
        assert!(!state.ui_enabled);
    }

    #[test]
    fn test_bool_accepts_words() {
        let mut state = ProgramState::default();
        state
            .apply_tokens("0 0 0 true 0 0 3 0 0 -1")
            .expect("valid state");
        assert!(state.ui_enabled);
    }

    #[test]
    fn test_loaded_front_updates_orientation() {
        let mut state = ProgramState::default();
        state
            .apply_tokens("0 0 0 0 1 2 3 1 0 0")
            .expect("valid state");

        assert_eq!(state.camera.front, Vec3::X);
        assert!(state.camera.yaw.abs() < 1e-5);
    }

    #[test]
    fn test_placement_lookup() {
        let placements = Placements::default();
        assert_eq!(placements.get(ObjectKind::Moon).scale, 2.0);
        assert_eq!(
            placements.get(ObjectKind::Ground).position,
            Vec3::new(0.0, -16.0, 0.0)
        );
    }
}
