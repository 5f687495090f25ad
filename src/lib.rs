//! Hollow Night
//!
//! A night scene rendered with winit and wgpu: textured meshes under a
//! skybox, drawn into a floating-point target and tonemapped to the screen.

/// Window, input, rendering and overlay
pub mod app;

/// Compile-time build metadata
pub mod build_info;

/// Scene description, camera and persisted program state
pub mod scene;
