//! egui overlay shown while the UI flag is on

use std::collections::VecDeque;

use sysinfo::System;

use super::context::AppContext;
use crate::build_info;

const FRAME_HISTORY: usize = 100;

/// Renderer facts shown in the overlay
#[derive(Debug, Clone)]
pub struct RendererSummary {
    pub adapter: String,
    pub backend: String,
    pub surface_size: [u32; 2],
    pub surface_format: String,
}

impl RendererSummary {
    pub fn new(info: &wgpu::AdapterInfo, config: &wgpu::SurfaceConfiguration) -> Self {
        Self {
            adapter: info.name.clone(),
            backend: format!("{:?}", info.backend),
            surface_size: [config.width, config.height],
            surface_format: format!("{:?}", config.format),
        }
    }
}

/// Host facts, gathered once
#[derive(Debug, Clone)]
struct SystemSummary {
    os: String,
    logical_cores: usize,
    memory_gb: f64,
}

impl SystemSummary {
    fn collect() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_all();

        let name = System::name().unwrap_or_else(|| "Unknown".to_string());
        let version = System::os_version().unwrap_or_else(|| "Unknown".to_string());

        Self {
            os: format!("{name} {version}"),
            logical_cores: sys.cpus().len(),
            memory_gb: sys.total_memory() as f64 / 1_073_741_824.0,
        }
    }
}

/// Overlay state: section toggles and frame timing history
#[derive(Debug, Clone)]
pub struct Overlay {
    pub show_camera: bool,
    pub show_renderer: bool,
    pub show_system: bool,
    frame_times: VecDeque<f32>,
    system: Option<SystemSummary>,
}

impl Default for Overlay {
    fn default() -> Self {
        Self {
            show_camera: true,
            show_renderer: false,
            show_system: false,
            frame_times: VecDeque::with_capacity(FRAME_HISTORY),
            system: None,
        }
    }
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one frame's duration in seconds
    pub fn record_frame(&mut self, delta: f32) {
        if self.frame_times.len() == FRAME_HISTORY {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(delta);
    }

    /// Average frames per second over the recorded history
    pub fn fps(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let avg = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }

    /// Draws the overlay window; the clear colour is editable
    pub fn render(&mut self, ctx: &egui::Context, app: &mut AppContext, renderer: &RendererSummary) {
        egui::Window::new("Hollow Night")
            .default_pos([10.0, 10.0])
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                ui.label(format!("FPS: {:.1}", self.fps()));
                ui.label(format!(
                    "Frame time: {:.2}ms",
                    self.frame_times.back().copied().unwrap_or(0.0) * 1000.0
                ));
                ui.separator();

                ui.heading("Tonemapping");
                ui.label(format!(
                    "HDR: {}",
                    if app.hdr.enabled { "on" } else { "off" }
                ));
                ui.label(format!("Exposure: {:.3}", app.hdr.exposure));

                let mut clear = app.state.clear_color.to_array();
                ui.horizontal(|ui| {
                    ui.label("Clear colour");
                    if ui.color_edit_button_rgb(&mut clear).changed() {
                        app.state.clear_color = clear.into();
                    }
                });
                ui.separator();

                ui.checkbox(&mut self.show_camera, "Camera");
                ui.checkbox(&mut self.show_renderer, "Renderer");
                ui.checkbox(&mut self.show_system, "System");

                if self.show_camera {
                    let camera = &app.state.camera;
                    ui.heading("Camera");
                    ui.label(format!(
                        "Position: ({:.2}, {:.2}, {:.2})",
                        camera.position.x, camera.position.y, camera.position.z
                    ));
                    ui.label(format!(
                        "Front: ({:.2}, {:.2}, {:.2})",
                        camera.front.x, camera.front.y, camera.front.z
                    ));
                    ui.label(format!(
                        "Yaw {:.1}  Pitch {:.1}  Zoom {:.1}",
                        camera.yaw, camera.pitch, camera.zoom
                    ));
                    ui.separator();
                }

                if self.show_renderer {
                    ui.heading("Renderer");
                    ui.label(format!("Adapter: {}", renderer.adapter));
                    ui.label(format!("Backend: {}", renderer.backend));
                    ui.label(format!(
                        "Surface: {}x{} {}",
                        renderer.surface_size[0], renderer.surface_size[1], renderer.surface_format
                    ));
                    ui.separator();
                }

                if self.show_system {
                    let system = self.system.get_or_insert_with(SystemSummary::collect);
                    ui.heading("System");
                    ui.label(format!("OS: {}", system.os));
                    ui.label(format!("Logical cores: {}", system.logical_cores));
                    ui.label(format!("Memory: {:.1} GB", system.memory_gb));
                    ui.separator();
                }

                ui.collapsing("Build", |ui| {
                    ui.label(build_info::version_string());
                    ui.label(build_info::detailed_info());
                });

                ui.collapsing("Keys", |ui| {
                    ui.label("W A S D  move");
                    ui.label("Mouse  look, wheel zooms");
                    ui.label("Q / E  exposure down / up");
                    ui.label("Space  toggle HDR");
                    ui.label("F1  toggle this overlay");
                    ui.label("Esc  quit");
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_averages_history() {
        let mut overlay = Overlay::new();
        assert_eq!(overlay.fps(), 0.0);

        overlay.record_frame(0.01);
        overlay.record_frame(0.03);
        assert!((overlay.fps() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut overlay = Overlay::new();
        for _ in 0..FRAME_HISTORY * 2 {
            overlay.record_frame(0.5);
        }
        overlay.record_frame(0.0);
        assert_eq!(overlay.frame_times.len(), FRAME_HISTORY);
        assert_eq!(overlay.frame_times.back().copied(), Some(0.0));
    }
}
