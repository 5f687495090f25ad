//! Application configuration
//!
//! Profiles (debug, release) live in `config/<profile>.toml`; any field can be
//! overridden from the environment, e.g. `APP_HDR__EXPOSURE=2.0`.

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use winit::dpi::LogicalSize;
use winit::window::{Fullscreen, WindowAttributes};

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width; also fixes the projection aspect ratio
    pub width: f64,
    /// Window height
    pub height: f64,
    /// Whether the window should be fullscreen
    pub fullscreen: bool,
    /// Whether the window should be resizable
    pub resizable: bool,
    /// Whether the window should be decorated (has title bar, borders, etc.)
    pub decorated: bool,
    /// Whether to enable vsync
    pub vsync: bool,
}

impl WindowConfig {
    /// Width over height of the configured window
    pub fn aspect(&self) -> f32 {
        if self.height <= 0.0 {
            return 1.0;
        }
        (self.width / self.height) as f32
    }

    /// winit attributes for the main window
    pub fn attributes(&self) -> WindowAttributes {
        let mut attrs = WindowAttributes::default()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(self.width, self.height))
            .with_resizable(self.resizable)
            .with_decorations(self.decorated);

        if self.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        attrs
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Hollow Night".to_string(),
            width: 800.0,
            height: 600.0,
            fullscreen: false,
            resizable: true,
            decorated: true,
            vsync: true,
        }
    }
}

/// Asset and state file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Directory holding `objects/` and `textures/`
    pub asset_root: PathBuf,
    /// Program state file, read at startup and written at exit
    pub state_file: PathBuf,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("resources"),
            state_file: PathBuf::from("resources/program_state.txt"),
        }
    }
}

/// Projection clip planes
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Initial tonemap settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct HdrConfig {
    /// Tonemapping on at startup
    pub enabled: bool,
    /// Starting exposure
    pub exposure: f32,
    /// Exposure change per frame while Q or E is held
    pub exposure_step: f32,
}

impl Default for HdrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exposure: 1.0,
            exposure_step: 0.001,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// The active profile (debug, release, etc.)
    pub profile: String,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub hdr: HdrConfig,
}

impl AppConfig {
    /// Loads configuration based on the specified profile
    ///
    /// Sources, later ones winning:
    /// 1. config/{profile}.toml, next to the executable or in the current directory
    /// 2. Environment variables with prefix APP_ (e.g., APP_WINDOW__WIDTH=1920)
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        builder = match Self::find_config_dir() {
            Some(dir) => {
                let profile_path = dir.join(profile);
                builder.add_source(File::from(profile_path.as_path()).required(false))
            }
            None => builder.add_source(File::with_name(&format!("config/{profile}")).required(false)),
        };

        // __ separates nested fields (APP_HDR__EXPOSURE_STEP)
        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.set_override("profile", profile)?.build()?.try_deserialize()
    }

    fn find_config_dir() -> Option<PathBuf> {
        if let Ok(exe_path) = std::env::current_exe()
            && let Some(exe_dir) = exe_path.parent()
        {
            let config_dir = exe_dir.join("config");
            if config_dir.exists() {
                return Some(config_dir);
            }
        }

        let cwd_config = PathBuf::from("config");
        cwd_config.exists().then_some(cwd_config)
    }

    /// Loads configuration using the APP_PROFILE environment variable,
    /// defaulting to "release"
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let profile = std::env::var("APP_PROFILE").unwrap_or_else(|_| "release".to_string());
        Self::load(&profile)
    }

    /// Built-in settings, used when no profile can be loaded
    pub fn fallback() -> Self {
        Self {
            profile: "release".to_string(),
            window: WindowConfig::default(),
            scene: SceneConfig::default(),
            camera: CameraConfig::default(),
            hdr: HdrConfig::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::load("release").unwrap_or_else(|_| Self::fallback())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_matches_release_defaults() {
        let config = AppConfig::fallback();
        assert_eq!(config.profile, "release");
        assert_eq!(config.window.width, 800.0);
        assert_eq!(config.camera.near, 0.1);
        assert_eq!(config.camera.far, 100.0);
        assert!(config.hdr.enabled);
        assert_eq!(config.hdr.exposure, 1.0);
        assert_eq!(config.hdr.exposure_step, 0.001);
    }

    #[test]
    fn test_aspect_uses_configured_size() {
        let window = WindowConfig {
            width: 1600.0,
            height: 900.0,
            ..WindowConfig::default()
        };
        assert!((window.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_profile_uses_section_defaults() {
        let config = AppConfig::load("no-such-profile").expect("profile override only");
        assert_eq!(config.profile, "no-such-profile");
        assert_eq!(config.scene.state_file, PathBuf::from("resources/program_state.txt"));
    }
}
