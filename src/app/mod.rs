//! Windowed application: configuration, input, rendering and the overlay

pub mod config;
pub mod context;
pub mod input;
pub mod overlay;
pub mod renderer;
mod runner;

pub use config::{AppConfig, CameraConfig, HdrConfig, SceneConfig, WindowConfig};
pub use context::{AppContext, AppEffect, HdrSettings};
pub use runner::App;
