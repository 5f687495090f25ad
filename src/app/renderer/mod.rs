//! wgpu renderer: offscreen HDR scene pass, tonemap resolve and egui overlay
//!
//! ## Architecture
//!
//! - `plan`: GPU-free per-frame draw list and uniform blocks
//! - `programs`: per-category object programs, meshes and materials
//! - `skybox`: cubemap skybox drawn last in the offscreen pass
//! - `hdr`: floating-point offscreen target and the tonemap pass
//! - `mesh`, `texture`: asset loading and upload

use std::sync::Arc;

use anyhow::Context as _;
use egui::Context;
use tracing::{info, warn};
use wgpu::{Device, Queue, Surface, SurfaceConfiguration};
use winit::event::WindowEvent;
use winit::window::Window;

use crate::app::config::AppConfig;
use crate::scene::Scene;

pub mod hdr;
pub mod mesh;
pub mod plan;
pub mod programs;
pub mod skybox;
pub mod texture;

use hdr::{DEPTH_FORMAT, HDR_FORMAT, HdrTarget, TonemapPass};
use plan::{DrawStep, FramePlan};
use programs::ObjectPass;
use skybox::SkyboxPass;

/// Renderer owns the GPU context, every pass and the egui integration
pub struct Renderer {
    surface: Surface<'static>,
    device: Device,
    queue: Queue,
    config: SurfaceConfiguration,
    adapter_info: wgpu::AdapterInfo,
    egui_ctx: Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    target: HdrTarget,
    tonemap: TonemapPass,
    skybox: SkyboxPass,
    objects: ObjectPass,
}

impl Renderer {
    /// Returns a reference to the surface configuration
    pub fn config(&self) -> &SurfaceConfiguration {
        &self.config
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    /// Creates the renderer and uploads every scene asset
    pub async fn new(window: Arc<Window>, app_config: &AppConfig, scene: &Scene) -> anyhow::Result<Self> {
        info!("Initializing wgpu renderer");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;

        let adapter_info = adapter.get_info();
        info!(
            adapter.name = adapter_info.name,
            adapter.backend = ?adapter_info.backend,
            "Found GPU adapter"
        );

        if !HdrTarget::is_supported(&adapter) {
            warn!(format = ?HDR_FORMAT, "Adapter cannot render to the HDR format");
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Main Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                experimental_features: Default::default(),
            })
            .await
            .context("failed to create GPU device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let present_mode = if app_config.window.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        info!(
            surface.width = config.width,
            surface.height = config.height,
            surface.format = ?config.format,
            surface.present_mode = ?config.present_mode,
            "Surface configured"
        );

        let egui_ctx = Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &device,
            config.format,
            egui_wgpu::RendererOptions {
                depth_stencil_format: None,
                msaa_samples: 1,
                ..Default::default()
            },
        );

        let asset_root = &app_config.scene.asset_root;
        let target = HdrTarget::new(&device, config.width, config.height);
        let tonemap = TonemapPass::new(&device, config.format, &target);
        let skybox = SkyboxPass::new(&device, &queue, asset_root);
        let objects = ObjectPass::new(&device, &queue, scene, asset_root);

        info!(
            hdr.format = ?HDR_FORMAT,
            depth.format = ?DEPTH_FORMAT,
            "Render passes initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            adapter_info,
            egui_ctx,
            egui_state,
            egui_renderer,
            target,
            tonemap,
            skybox,
            objects,
        })
    }

    /// Handles window events for egui
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        response.consumed
    }

    /// Resizes the surface and recreates the HDR target to match
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);

            self.target = HdrTarget::new(&self.device, new_size.width, new_size.height);
            self.tonemap.set_source(&self.device, &self.target);

            info!(
                width = new_size.width,
                height = new_size.height,
                "Surface resized"
            );
        }
    }

    /// Renders a frame: scene into the HDR target, then tonemap and overlay onto the surface
    ///
    /// `render_ui` runs only when the plan asks for the overlay.
    pub fn draw(
        &mut self,
        window: &Window,
        plan: &FramePlan,
        mut render_ui: impl FnMut(&Context),
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.objects.prepare(&self.queue, plan);
        for step in &plan.steps {
            if let DrawStep::Skybox { uniforms, .. } = step {
                self.skybox.update(&self.queue, uniforms);
            }
        }
        self.tonemap.update(&self.queue, &plan.tonemap);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("HDR Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(plan.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.target.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for step in &plan.steps {
                match step {
                    DrawStep::Object { .. } => self.objects.draw(&mut rpass, step),
                    DrawStep::Skybox { .. } => self.skybox.draw(&mut rpass, step),
                }
            }
        }

        // egui always consumes its input so events do not pile up while hidden
        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if plan.overlay {
                render_ui(ctx);
            }
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &tris,
            &screen_descriptor,
        );

        // forget_lifetime() for egui_wgpu compatibility
        {
            let mut rpass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Tonemap Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();

            self.tonemap.draw(&mut rpass);
            self.egui_renderer
                .render(&mut rpass, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
