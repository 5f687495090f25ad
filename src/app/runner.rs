//! Main application handler for the night scene

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::window::{CursorGrabMode, Window, WindowId};

use super::config::AppConfig;
use super::context::{AppContext, AppEffect, HdrSettings};
use super::input::{InputCollector, InputContext, SceneInputHandler};
use super::overlay::{Overlay, RendererSummary};
use super::renderer::Renderer;
use super::renderer::plan::FramePlan;
use crate::scene::{ProgramState, Scene};

/// Main application
pub struct App {
    config: AppConfig,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    scene: Scene,
    context: AppContext,
    overlay: Overlay,
    started: Option<Instant>,
    input_collector: InputCollector,
    input_context: InputContext,
}

impl App {
    /// Creates the application and restores the saved program state
    pub fn new(config: AppConfig) -> Self {
        info!(profile = %config.profile, "Starting hollow-night");
        info!(?config.window, "Window configuration");

        let mut state = ProgramState::load(&config.scene.state_file);
        state.camera_mouse_enabled = !state.ui_enabled;

        let context = AppContext::new(state, HdrSettings::from(&config.hdr));

        let mut input_context = InputContext::new();
        input_context.register_handler(Box::new(SceneInputHandler::new()));

        Self {
            config,
            window: None,
            renderer: None,
            scene: Scene::night(),
            context,
            overlay: Overlay::new(),
            started: None,
            input_collector: InputCollector::new(),
            input_context,
        }
    }

    /// Creates the application with configuration loaded from the environment
    pub fn from_env() -> Self {
        let config = AppConfig::load_from_env().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using default configuration");
            AppConfig::fallback()
        });
        Self::new(config)
    }

    fn scene_handler(&mut self) -> Option<&mut SceneInputHandler> {
        self.input_context
            .get_handler_mut(SceneInputHandler::NAME)?
            .as_any_mut()
            .downcast_mut::<SceneInputHandler>()
    }

    fn capture_cursor(&mut self, capture: bool) {
        let Some(window) = &self.window else {
            return;
        };

        let grab = if capture {
            window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked))
        } else {
            window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(e) = grab {
            warn!(error = %e, capture, "Cursor grab not supported");
        }
        window.set_cursor_visible(!capture);

        // Avoid a jump from the last position seen before the grab changed
        if let Some(handler) = self.scene_handler() {
            handler.reset_cursor();
        }
    }

    /// Runs input handlers and applies their actions to the context
    fn process_input(&mut self, event_loop: &ActiveEventLoop) {
        // Clone before advancing so JustPressed edges reach the handlers
        let input_state = self.input_collector.clone_state();
        self.input_context.update_state(input_state);
        self.input_context.process();
        self.input_collector.advance_frame();

        let actions = match self.scene_handler() {
            Some(handler) => handler.drain_actions(),
            None => return,
        };

        for effect in self.context.apply_all(actions) {
            match effect {
                AppEffect::Exit => event_loop.exit(),
                AppEffect::CaptureCursor(capture) => self.capture_cursor(capture),
            }
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(self.config.window.attributes()) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!(error = %e, "Failed to create window");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        info!(
            window.width = size.width,
            window.height = size.height,
            "Window created successfully"
        );

        // winit's event loop is synchronous; block on the async wgpu setup
        let renderer = tokio::runtime::Runtime::new()
            .map_err(anyhow::Error::from)
            .and_then(|rt| {
                rt.block_on(Renderer::new(window.clone(), &self.config, &self.scene))
            });

        match renderer {
            Ok(renderer) => {
                info!("Renderer initialized successfully");
                self.renderer = Some(renderer);
                self.window = Some(window);
                self.started = Some(Instant::now());
                self.capture_cursor(self.context.wants_cursor_captured());
            }
            Err(e) => {
                error!(error = %e, "Failed to initialize renderer");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(started) = self.started else {
            return;
        };

        self.context
            .clock
            .advance_to(started.elapsed().as_secs_f32());
        self.overlay.record_frame(self.context.clock.delta());

        self.process_input(event_loop);

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Raw input first, egui second
        self.input_collector.handle_window_event(&event);

        if let (Some(renderer), Some(window)) = (&mut self.renderer, &self.window) {
            let _ = renderer.handle_event(window, &event);
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(new_size);
                }
            }
            WindowEvent::RedrawRequested => {
                let (Some(renderer), Some(window)) = (&mut self.renderer, &self.window) else {
                    return;
                };

                let plan = FramePlan::build(
                    &self.scene,
                    &self.context,
                    &self.config.camera,
                    self.config.window.aspect(),
                );
                let summary = RendererSummary::new(renderer.adapter_info(), renderer.config());
                let overlay = &mut self.overlay;
                let context = &mut self.context;

                match renderer.draw(window, &plan, |ctx| overlay.render(ctx, context, &summary)) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        warn!("Surface lost, reconfiguring");
                        renderer.resize(window.inner_size());
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        error!("Out of memory, exiting");
                        event_loop.exit();
                    }
                    Err(e) => {
                        error!(error = %e, "Render error");
                    }
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        self.input_collector.handle_device_event(&event);
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        let path = &self.config.scene.state_file;
        match self.context.state.save(path) {
            Ok(()) => info!(path = %path.display(), "Program state saved"),
            Err(e) => error!(error = %e, path = %path.display(), "Failed to save program state"),
        }
    }
}
