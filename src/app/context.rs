//! Application context shared by input handling, the frame update and rendering

use tracing::{debug, info};

use super::config::HdrConfig;
use super::input::{ExposureChange, SceneAction};
use crate::scene::{FrameClock, ProgramState};

/// Tonemap state; not persisted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HdrSettings {
    pub enabled: bool,
    pub exposure: f32,
    /// Exposure change per frame while an exposure key is held
    pub exposure_step: f32,
}

impl HdrSettings {
    pub fn step(&mut self, change: ExposureChange) {
        self.exposure = match change {
            ExposureChange::Up => self.exposure + self.exposure_step,
            ExposureChange::Down => (self.exposure - self.exposure_step).max(0.0),
        };
    }
}

impl From<&HdrConfig> for HdrSettings {
    fn from(config: &HdrConfig) -> Self {
        Self {
            enabled: config.enabled,
            exposure: config.exposure.max(0.0),
            exposure_step: config.exposure_step,
        }
    }
}

impl Default for HdrSettings {
    fn default() -> Self {
        Self::from(&HdrConfig::default())
    }
}

/// Side effects the window owner has to carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEffect {
    Exit,
    /// Grab and hide the cursor (`true`) or release it (`false`)
    CaptureCursor(bool),
}

/// Everything the frame loop mutates
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    pub state: ProgramState,
    pub hdr: HdrSettings,
    pub clock: FrameClock,
}

impl AppContext {
    pub fn new(state: ProgramState, hdr: HdrSettings) -> Self {
        Self {
            state,
            hdr,
            clock: FrameClock::new(),
        }
    }

    /// Whether the cursor should currently be grabbed
    pub fn wants_cursor_captured(&self) -> bool {
        !self.state.ui_enabled
    }

    /// Applies one action; movement uses the current frame delta
    pub fn apply(&mut self, action: SceneAction) -> Option<AppEffect> {
        match action {
            SceneAction::Quit => {
                info!("Quit requested");
                return Some(AppEffect::Exit);
            }
            SceneAction::ToggleOverlay => {
                self.state.ui_enabled = !self.state.ui_enabled;
                self.state.camera_mouse_enabled = !self.state.ui_enabled;
                debug!(ui_enabled = self.state.ui_enabled, "Overlay toggled");
                return Some(AppEffect::CaptureCursor(!self.state.ui_enabled));
            }
            SceneAction::ToggleHdr => {
                self.hdr.enabled = !self.hdr.enabled;
                debug!(hdr = self.hdr.enabled, "HDR toggled");
            }
            SceneAction::Move(movement) => {
                self.state
                    .camera
                    .process_keyboard(movement, self.clock.delta());
            }
            SceneAction::Look { dx, dy } => {
                if self.state.camera_mouse_enabled {
                    self.state.camera.process_mouse_movement(dx, dy, true);
                }
            }
            SceneAction::Zoom(lines) => self.state.camera.process_mouse_scroll(lines),
            SceneAction::Exposure(change) => self.hdr.step(change),
        }
        None
    }

    /// Applies a frame's actions in order, returning the effects they raised
    pub fn apply_all(&mut self, actions: impl IntoIterator<Item = SceneAction>) -> Vec<AppEffect> {
        actions.into_iter().filter_map(|a| self.apply(a)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Movement;

    #[test]
    fn test_exposure_floor_is_zero() {
        let mut hdr = HdrSettings {
            enabled: true,
            exposure: 0.0015,
            exposure_step: 0.001,
        };
        hdr.step(ExposureChange::Down);
        hdr.step(ExposureChange::Down);
        assert_eq!(hdr.exposure, 0.0);
    }

    #[test]
    fn test_overlay_toggle_flips_mouse_look() {
        let mut ctx = AppContext::default();
        assert!(ctx.wants_cursor_captured());

        let effect = ctx.apply(SceneAction::ToggleOverlay);
        assert_eq!(effect, Some(AppEffect::CaptureCursor(false)));
        assert!(ctx.state.ui_enabled);
        assert!(!ctx.state.camera_mouse_enabled);

        let effect = ctx.apply(SceneAction::ToggleOverlay);
        assert_eq!(effect, Some(AppEffect::CaptureCursor(true)));
        assert!(ctx.state.camera_mouse_enabled);
    }

    #[test]
    fn test_look_ignored_while_mouse_disabled() {
        let mut ctx = AppContext::default();
        ctx.state.camera_mouse_enabled = false;
        let yaw = ctx.state.camera.yaw;

        ctx.apply(SceneAction::Look { dx: 50.0, dy: 0.0 });
        assert_eq!(ctx.state.camera.yaw, yaw);
    }

    #[test]
    fn test_movement_scaled_by_delta() {
        let mut ctx = AppContext::default();
        ctx.clock.advance_to(0.5);
        let start = ctx.state.camera.position;

        ctx.apply(SceneAction::Move(Movement::Forward));
        let travelled = (ctx.state.camera.position - start).length();
        assert!((travelled - 1.25).abs() < 1e-5);
    }
}
