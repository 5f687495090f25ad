//! Per-frame draw list
//!
//! Building the plan touches no GPU state, so everything a frame will draw
//! (matrices, lights, depth states, tonemap settings) can be inspected in tests.

use glam::{Mat3, Mat4, Vec3};

use crate::app::config::CameraConfig;
use crate::app::context::AppContext;
use crate::scene::{DirectionalLight, ObjectKind, ObjectStyle, Scene};

/// Depth test and write settings baked into a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthState {
    pub compare: wgpu::CompareFunction,
    pub write: bool,
}

impl DepthState {
    /// Scene geometry
    pub const OPAQUE: Self = Self {
        compare: wgpu::CompareFunction::Less,
        write: true,
    };

    /// Skybox at the far plane: passes where nothing was drawn, never writes
    pub const SKYBOX: Self = Self {
        compare: wgpu::CompareFunction::LessEqual,
        write: false,
    };

    pub fn stencil_state(self, format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format,
            depth_write_enabled: self.write,
            depth_compare: self.compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

/// Uniform block shared by every object program (group 0, binding 0)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_position: [f32; 4],
    pub light_direction: [f32; 4],
    pub light_ambient: [f32; 4],
    pub light_diffuse: [f32; 4],
    pub light_specular: [f32; 4],
    /// shininess, specular strength, alpha, unused
    pub material: [f32; 4],
}

impl ObjectUniforms {
    pub fn new(
        model: Mat4,
        camera: &CameraMatrices,
        light: &DirectionalLight,
        style: &ObjectStyle,
    ) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            view: camera.view.to_cols_array_2d(),
            projection: camera.projection.to_cols_array_2d(),
            view_position: camera.position.extend(1.0).to_array(),
            light_direction: light.direction.extend(0.0).to_array(),
            light_ambient: light.ambient.extend(0.0).to_array(),
            light_diffuse: light.diffuse.extend(0.0).to_array(),
            light_specular: light.specular.extend(0.0).to_array(),
            material: [style.shininess, style.specular_strength, style.alpha, 0.0],
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model)
    }
}

/// Skybox uniform: projection times the view with its translation removed
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyboxUniforms {
    pub view_projection: [[f32; 4]; 4],
}

impl SkyboxUniforms {
    pub fn new(camera: &CameraMatrices) -> Self {
        let rotation_only = Mat4::from_mat3(Mat3::from_mat4(camera.view));
        Self {
            view_projection: (camera.projection * rotation_only).to_cols_array_2d(),
        }
    }
}

/// Tonemap program uniforms
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TonemapUniforms {
    pub exposure: f32,
    /// 1 when tonemapping, 0 to pass colour through
    pub hdr: u32,
    pub _padding: [u32; 2],
}

impl TonemapUniforms {
    pub fn new(enabled: bool, exposure: f32) -> Self {
        Self {
            exposure,
            hdr: u32::from(enabled),
            _padding: [0; 2],
        }
    }
}

/// Camera matrices for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
}

/// One draw in the offscreen pass
#[derive(Debug, Clone, PartialEq)]
pub enum DrawStep {
    Object {
        /// Index into the scene's instance list
        index: usize,
        kind: ObjectKind,
        uniforms: ObjectUniforms,
        depth: DepthState,
    },
    Skybox {
        uniforms: SkyboxUniforms,
        depth: DepthState,
    },
}

impl DrawStep {
    pub fn depth(&self) -> DepthState {
        match self {
            DrawStep::Object { depth, .. } | DrawStep::Skybox { depth, .. } => *depth,
        }
    }
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub clear_color: wgpu::Color,
    pub steps: Vec<DrawStep>,
    pub tonemap: TonemapUniforms,
    pub overlay: bool,
}

impl FramePlan {
    /// Objects in scene order, then the skybox
    pub fn build(scene: &Scene, ctx: &AppContext, camera_config: &CameraConfig, aspect: f32) -> Self {
        let state = &ctx.state;
        let t = ctx.clock.elapsed();

        let camera = CameraMatrices {
            view: state.camera.view_matrix(),
            projection: state
                .camera
                .projection_matrix(aspect, camera_config.near, camera_config.far),
            position: state.camera.position,
        };

        let mut steps = Vec::with_capacity(scene.objects().len() + 1);
        for (index, object) in scene.objects().iter().enumerate() {
            let Some(style) = scene.style(object.kind) else {
                continue;
            };
            let light = style.light.resolve(&state.directional_light);
            let model = object.model_matrix(&state.placements, t);
            steps.push(DrawStep::Object {
                index,
                kind: object.kind,
                uniforms: ObjectUniforms::new(model, &camera, &light, style),
                depth: DepthState::OPAQUE,
            });
        }

        steps.push(DrawStep::Skybox {
            uniforms: SkyboxUniforms::new(&camera),
            depth: DepthState::SKYBOX,
        });

        let clear = state.clear_color;
        Self {
            clear_color: wgpu::Color {
                r: f64::from(clear.x),
                g: f64::from(clear.y),
                b: f64::from(clear.z),
                a: 1.0,
            },
            steps,
            tonemap: TonemapUniforms::new(ctx.hdr.enabled, ctx.hdr.exposure),
            overlay: state.ui_enabled,
        }
    }

    pub fn object_steps(&self) -> impl Iterator<Item = (usize, ObjectKind, &ObjectUniforms)> {
        self.steps.iter().filter_map(|step| match step {
            DrawStep::Object {
                index,
                kind,
                uniforms,
                ..
            } => Some((*index, *kind, uniforms)),
            DrawStep::Skybox { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<ObjectUniforms>(), 288);
        assert_eq!(std::mem::size_of::<SkyboxUniforms>(), 64);
        assert_eq!(std::mem::size_of::<TonemapUniforms>(), 16);
    }

    #[test]
    fn test_skybox_view_drops_translation() {
        let camera = CameraMatrices {
            view: Mat4::from_translation(Vec3::new(5.0, -2.0, 7.0)),
            projection: Mat4::IDENTITY,
            position: Vec3::ZERO,
        };
        let uniforms = SkyboxUniforms::new(&camera);
        assert_eq!(Mat4::from_cols_array_2d(&uniforms.view_projection), Mat4::IDENTITY);
    }

    #[test]
    fn test_plan_ends_with_skybox() {
        let scene = Scene::night();
        let ctx = AppContext::default();
        let plan = FramePlan::build(&scene, &ctx, &CameraConfig::default(), 4.0 / 3.0);

        assert_eq!(plan.steps.len(), scene.objects().len() + 1);
        assert!(matches!(plan.steps.last(), Some(DrawStep::Skybox { .. })));
        assert_eq!(plan.object_steps().count(), scene.objects().len());
    }

    #[test]
    fn test_material_values_follow_style() {
        let scene = Scene::night();
        let ctx = AppContext::default();
        let plan = FramePlan::build(&scene, &ctx, &CameraConfig::default(), 1.0);

        let (_, _, moon) = plan
            .object_steps()
            .find(|(_, kind, _)| *kind == ObjectKind::Moon)
            .expect("moon in plan");
        assert_eq!(moon.material, [256.0, 1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_tonemap_flag() {
        assert_eq!(TonemapUniforms::new(true, 2.0).hdr, 1);
        assert_eq!(TonemapUniforms::new(false, 2.0).hdr, 0);
    }
}
