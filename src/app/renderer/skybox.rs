//! Cubemap skybox drawn last in the offscreen pass

use std::path::Path;

use image::RgbaImage;
use tracing::warn;
use wgpu::util::DeviceExt;

use super::hdr::{DEPTH_FORMAT, HDR_FORMAT};
use super::plan::{DepthState, DrawStep, SkyboxUniforms};
use super::texture::{AssetError, load_rgba};
use crate::scene::SKYBOX_FACES;

const SKYBOX_SHADER: &str = r#"
struct Skybox {
    view_projection: mat4x4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) direction: vec3<f32>,
}

@group(0) @binding(0) var<uniform> skybox: Skybox;
@group(0) @binding(1) var sky_texture: texture_cube<f32>;
@group(0) @binding(2) var sky_sampler: sampler;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    let clip = skybox.view_projection * vec4<f32>(position, 1.0);
    // z = w puts every fragment on the far plane
    out.clip_position = clip.xyww;
    out.direction = position;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(sky_texture, sky_sampler, in.direction);
}
"#;

#[rustfmt::skip]
const CUBE: [[f32; 3]; 36] = [
    [-1.0,  1.0, -1.0], [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0],

    [-1.0, -1.0,  1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0],
    [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0], [-1.0, -1.0,  1.0],

    [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0],

    [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0],

    [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0],

    [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0],
];

/// Loads the six faces in +X, -X, +Y, -Y, +Z, -Z order
///
/// Faces must be square and share one size.
pub fn load_faces(asset_root: &Path) -> Result<Vec<RgbaImage>, AssetError> {
    let mut faces = Vec::with_capacity(SKYBOX_FACES.len());
    let mut expected = None;

    for relative in SKYBOX_FACES {
        let path = asset_root.join(relative);
        let face = load_rgba(&path)?;
        let (width, height) = face.dimensions();
        let size = *expected.get_or_insert(width);
        if width != size || height != size {
            return Err(AssetError::SkyboxFace {
                path,
                width,
                height,
                expected: size,
            });
        }
        faces.push(face);
    }

    Ok(faces)
}

/// Skybox pipeline, cube geometry and cubemap
pub struct SkyboxPass {
    pipeline: wgpu::RenderPipeline,
    cube: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl SkyboxPass {
    /// Far-plane test without writes, so objects drawn earlier stay in front
    pub const DEPTH: DepthState = DepthState::SKYBOX;

    /// Builds the pass; a skybox that fails to load falls back to a black cubemap
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, asset_root: &Path) -> Self {
        let (size, data) = match load_faces(asset_root) {
            Ok(faces) => {
                let size = faces[0].width();
                let data: Vec<u8> = faces.iter().flat_map(|f| f.as_raw().iter().copied()).collect();
                (size, data)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load skybox, using a black sky");
                (1, [0u8, 0, 0, 255].repeat(6))
            }
        };

        let cubemap = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("Skybox Cubemap"),
                size: wgpu::Extent3d {
                    width: size,
                    height: size,
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data,
        );
        let cube_view = cubemap.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Skybox Cubemap View"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Skybox Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let cube = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Skybox Cube"),
            contents: bytemuck::cast_slice(&CUBE),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Skybox Uniform Buffer"),
            size: std::mem::size_of::<SkyboxUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Skybox Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Skybox Bind Group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&cube_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Skybox Shader"),
            source: wgpu::ShaderSource::Wgsl(SKYBOX_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Skybox Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Skybox Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            // Seen from inside, so no culling
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(Self::DEPTH.stencil_state(DEPTH_FORMAT)),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            cube,
            uniform_buffer,
            bind_group,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, uniforms: &SkyboxUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    pub fn draw(&self, rpass: &mut wgpu::RenderPass<'_>, step: &DrawStep) {
        debug_assert_eq!(step.depth(), Self::DEPTH, "skybox step depth differs from its pipeline");
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.cube.slice(..));
        rpass.draw(0..CUBE.len() as u32, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_faces(root: &Path, sizes: [u32; 6]) {
        for (relative, size) in SKYBOX_FACES.iter().zip(sizes) {
            let path = root.join(relative);
            std::fs::create_dir_all(path.parent().expect("face dir")).expect("mkdir");
            RgbaImage::new(size, size).save(&path).expect("write face");
        }
    }

    #[test]
    fn test_faces_load_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_faces(dir.path(), [4; 6]);

        let faces = load_faces(dir.path()).expect("six faces");
        assert_eq!(faces.len(), 6);
        assert!(faces.iter().all(|f| f.dimensions() == (4, 4)));
    }

    #[test]
    fn test_mismatched_face_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_faces(dir.path(), [4, 4, 4, 8, 4, 4]);

        let err = load_faces(dir.path()).expect_err("size mismatch");
        assert!(matches!(err, AssetError::SkyboxFace { expected: 4, width: 8, .. }));
    }

    #[test]
    fn test_cube_covers_all_faces() {
        for axis in 0..3 {
            for sign in [-1.0, 1.0] {
                let triangles = CUBE
                    .chunks_exact(3)
                    .filter(|tri| tri.iter().all(|v| v[axis] == sign))
                    .count();
                assert_eq!(triangles, 2, "axis {axis} sign {sign}");
            }
        }
    }
}
