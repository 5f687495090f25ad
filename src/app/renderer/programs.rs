//! Object programs, meshes and materials
//!
//! Each object category gets its own WGSL program built from a shared
//! prelude (uniform block, texture slots, vertex stage, lighting) and a
//! category-specific fragment stage.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::hdr::{DEPTH_FORMAT, HDR_FORMAT};
use super::mesh::{GpuMesh, MaterialTextures, MeshData, SubMesh, Vertex};
use super::plan::{DepthState, DrawStep, FramePlan, ObjectUniforms};
use super::texture::{GpuTexture, load_rgba};
use crate::scene::{ObjectKind, ObjectStyle, Scene, TextureSet, TextureSlot};

const PRELUDE: &str = r#"
struct Object {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    view_position: vec4<f32>,
    light_direction: vec4<f32>,
    light_ambient: vec4<f32>,
    light_diffuse: vec4<f32>,
    light_specular: vec4<f32>,
    // shininess, specular strength, alpha
    material: vec4<f32>,
}

@group(0) @binding(0) var<uniform> object: Object;

@group(1) @binding(0) var diffuse_map: texture_2d<f32>;
@group(1) @binding(1) var specular_map: texture_2d<f32>;
@group(1) @binding(2) var normal_map: texture_2d<f32>;
@group(1) @binding(3) var emissive_map: texture_2d<f32>;
@group(1) @binding(4) var height_map: texture_2d<f32>;
@group(1) @binding(5) var material_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tex_coords: vec2<f32>,
    @location(3) tangent: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tex_coords: vec2<f32>,
    @location(3) tangent: vec3<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = object.model * vec4<f32>(in.position, 1.0);
    // Scales are uniform, so the model's upper 3x3 transforms normals too
    let basis = mat3x3<f32>(object.model[0].xyz, object.model[1].xyz, object.model[2].xyz);
    out.world_position = world.xyz;
    out.normal = basis * in.normal;
    out.tangent = basis * in.tangent;
    out.tex_coords = in.tex_coords;
    out.clip_position = object.projection * object.view * world;
    return out;
}

fn surface_normal(in: VertexOutput) -> vec3<f32> {
    let mapped = textureSample(normal_map, material_sampler, in.tex_coords).xyz * 2.0 - 1.0;
    let n = normalize(in.normal);
    let t_raw = in.tangent - n * dot(n, in.tangent);
    let has_tangent = length(t_raw) > 1e-4;
    let t = normalize(select(vec3<f32>(1.0, 0.0, 0.0), t_raw, has_tangent));
    let b = cross(n, t);
    return select(n, normalize(mat3x3<f32>(t, b, n) * mapped), has_tangent);
}

// Directional light with Phong specular; occlusion scales the ambient term
fn shade(in: VertexOutput, occlusion: f32) -> vec4<f32> {
    let albedo = textureSample(diffuse_map, material_sampler, in.tex_coords);
    let specular_mask = textureSample(specular_map, material_sampler, in.tex_coords).r;
    let normal = surface_normal(in);

    let light_dir = normalize(-object.light_direction.xyz);
    let view_dir = normalize(object.view_position.xyz - in.world_position);
    let diff = max(dot(normal, light_dir), 0.0);
    let reflect_dir = reflect(-light_dir, normal);
    let spec = pow(max(dot(view_dir, reflect_dir), 0.0), object.material.x);

    let ambient = object.light_ambient.rgb * albedo.rgb * occlusion;
    let diffuse = object.light_diffuse.rgb * diff * albedo.rgb;
    let specular = object.light_specular.rgb * spec * (specular_mask + object.material.y);

    return vec4<f32>(ambient + diffuse + specular, albedo.a * object.material.z);
}
"#;

const PLAIN_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return shade(in, 1.0);
}
"#;

const TREE_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    // Bark crevices (low height) get less ambient light
    let height = textureSample(height_map, material_sampler, in.tex_coords).r;
    return shade(in, mix(0.4, 1.0, height));
}
"#;

const PUMPKIN_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let glow = textureSample(emissive_map, material_sampler, in.tex_coords).rgb;
    let lit = shade(in, 1.0);
    return vec4<f32>(lit.rgb + glow, lit.a);
}
"#;

/// Full WGSL source of a category's program
pub fn program_source(kind: ObjectKind) -> String {
    let fragment = match kind {
        ObjectKind::Tree => TREE_FRAGMENT,
        ObjectKind::Pumpkin => PUMPKIN_FRAGMENT,
        ObjectKind::Bat | ObjectKind::Moon | ObjectKind::Ground => PLAIN_FRAGMENT,
    };
    format!("{PRELUDE}{fragment}")
}

/// Textures for the five slots; unset slots fall back to placeholders
#[derive(Default)]
struct SlotTextures {
    loaded: HashMap<TextureSlot, GpuTexture>,
}

impl SlotTextures {
    /// Loads `path` into `slot`; on failure the slot keeps its current texture
    fn load(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, slot: TextureSlot, path: &Path) {
        match load_rgba(path) {
            Ok(image) => {
                let label = path.display().to_string();
                let texture = GpuTexture::from_image(device, queue, &image, slot, &label);
                self.loaded.insert(slot, texture);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to load texture"),
        }
    }
}

/// Shared GPU state for building material bind groups
struct MaterialFactory {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    /// One per slot, in `TextureSlot::ALL` order
    placeholders: Vec<GpuTexture>,
}

impl MaterialFactory {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let mut entries: Vec<wgpu::BindGroupLayoutEntry> = TextureSlot::ALL
            .iter()
            .map(|slot| wgpu::BindGroupLayoutEntry {
                binding: slot.binding(),
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            })
            .collect();
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: TextureSlot::ALL.len() as u32,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &entries,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let placeholders = TextureSlot::ALL
            .iter()
            .map(|slot| GpuTexture::placeholder(device, queue, *slot))
            .collect();

        Self {
            layout,
            sampler,
            placeholders,
        }
    }

    fn bind_group(&self, device: &wgpu::Device, textures: &SlotTextures, label: &str) -> wgpu::BindGroup {
        let mut entries: Vec<wgpu::BindGroupEntry> = TextureSlot::ALL
            .iter()
            .zip(&self.placeholders)
            .map(|(slot, placeholder)| wgpu::BindGroupEntry {
                binding: slot.binding(),
                resource: wgpu::BindingResource::TextureView(
                    &textures.loaded.get(slot).unwrap_or(placeholder).view,
                ),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: TextureSlot::ALL.len() as u32,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
        });

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.layout,
            entries: &entries,
        })
    }
}

/// Uniform buffer and bind group for one scene instance
struct InstanceBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Draws every scene object into the offscreen target
pub struct ObjectPass {
    pipelines: HashMap<ObjectKind, wgpu::RenderPipeline>,
    meshes: HashMap<ObjectKind, GpuMesh>,
    instances: Vec<InstanceBinding>,
}

impl ObjectPass {
    /// Depth state every object pipeline is built with
    pub const DEPTH: DepthState = DepthState::OPAQUE;

    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene, asset_root: &Path) -> Self {
        let materials = MaterialFactory::new(device, queue);

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Object Pipeline Layout"),
            bind_group_layouts: &[&object_layout, &materials.layout],
            push_constant_ranges: &[],
        });

        let pipelines = scene
            .styles()
            .iter()
            .map(|style| (style.kind, create_pipeline(device, &pipeline_layout, style.kind)))
            .collect();

        let meshes: HashMap<ObjectKind, GpuMesh> = scene
            .styles()
            .iter()
            .filter_map(|style| {
                load_mesh(device, queue, &materials, style, asset_root).map(|m| (style.kind, m))
            })
            .collect();

        let instances = scene
            .objects()
            .iter()
            .map(|object| {
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("{} Uniform Buffer", object.kind.name())),
                    size: std::mem::size_of::<ObjectUniforms>() as wgpu::BufferAddress,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{} Bind Group", object.kind.name())),
                    layout: &object_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                });
                InstanceBinding { buffer, bind_group }
            })
            .collect();

        info!(
            programs = scene.styles().len(),
            meshes = meshes.len(),
            instances = scene.objects().len(),
            "Object pass ready"
        );

        Self {
            pipelines,
            meshes,
            instances,
        }
    }

    /// Uploads this frame's per-instance uniforms
    pub fn prepare(&self, queue: &wgpu::Queue, plan: &FramePlan) {
        for (index, _, uniforms) in plan.object_steps() {
            if let Some(instance) = self.instances.get(index) {
                queue.write_buffer(&instance.buffer, 0, bytemuck::bytes_of(uniforms));
            }
        }
    }

    /// Draws one object step; steps whose category has no mesh are skipped
    pub fn draw(&self, rpass: &mut wgpu::RenderPass<'_>, step: &DrawStep) {
        let DrawStep::Object {
            index, kind, depth, ..
        } = step
        else {
            return;
        };
        debug_assert_eq!(*depth, Self::DEPTH, "object step depth differs from its pipeline");
        let (Some(pipeline), Some(mesh), Some(instance)) = (
            self.pipelines.get(kind),
            self.meshes.get(kind),
            self.instances.get(*index),
        ) else {
            return;
        };

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &instance.bind_group, &[]);
        mesh.draw(rpass);
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    kind: ObjectKind,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{} Shader", kind.name())),
        source: wgpu::ShaderSource::Wgsl(program_source(kind).into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{} Pipeline", kind.name())),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: HDR_FORMAT,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(ObjectPass::DEPTH.stencil_state(DEPTH_FORMAT)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Loads and uploads a category's mesh with its textures; `None` skips the category
fn load_mesh(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    materials: &MaterialFactory,
    style: &ObjectStyle,
    asset_root: &Path,
) -> Option<GpuMesh> {
    let path = asset_root.join(style.mesh);
    let data = match MeshData::load(&path) {
        Ok(data) => data,
        Err(e) => {
            warn!(kind = style.kind.name(), error = %e, "Skipping object category");
            return None;
        }
    };
    let dir = path.parent().unwrap_or(asset_root);
    let label = style.kind.name();

    let mesh = match &style.textures {
        TextureSet::Files(files) => {
            let mut textures = SlotTextures::default();
            for (slot, file) in files {
                textures.load(device, queue, *slot, &dir.join(file));
            }
            let group = materials.bind_group(device, &textures, label);
            GpuMesh::new(device, &data, label, |_| group.clone())
        }
        TextureSet::FromMaterials => {
            let groups: Vec<wgpu::BindGroup> = data
                .materials
                .iter()
                .map(|mtl| {
                    let mut textures = SlotTextures::default();
                    for (slot, path) in material_files(mtl) {
                        textures.load(device, queue, slot, &path);
                    }
                    materials.bind_group(device, &textures, label)
                })
                .collect();
            let fallback = materials.bind_group(device, &SlotTextures::default(), label);
            GpuMesh::new(device, &data, label, |sub: &SubMesh| {
                sub.material
                    .and_then(|id| groups.get(id))
                    .unwrap_or(&fallback)
                    .clone()
            })
        }
    };

    Some(mesh)
}

/// Slots named by an MTL material
fn material_files(mtl: &MaterialTextures) -> Vec<(TextureSlot, PathBuf)> {
    [
        (TextureSlot::Diffuse, &mtl.diffuse),
        (TextureSlot::Specular, &mtl.specular),
        (TextureSlot::Normal, &mtl.normal),
    ]
    .into_iter()
    .filter_map(|(slot, path)| path.clone().map(|p| (slot, p)))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_program_has_both_stages() {
        for kind in ObjectKind::ALL {
            let source = program_source(kind);
            assert_eq!(source.matches("@vertex").count(), 1, "{kind:?}");
            assert_eq!(source.matches("@fragment").count(), 1, "{kind:?}");
        }
    }

    #[test]
    fn test_category_fragments() {
        assert!(program_source(ObjectKind::Tree).contains("height_map, material_sampler"));
        assert!(program_source(ObjectKind::Pumpkin).contains("emissive_map, material_sampler"));
        assert!(!program_source(ObjectKind::Moon).contains("emissive_map, material_sampler"));
    }

    #[test]
    fn test_material_files_skip_missing_slots() {
        let mtl = MaterialTextures {
            diffuse: Some(PathBuf::from("bat/diffuse.png")),
            specular: None,
            normal: Some(PathBuf::from("bat/normal.png")),
        };
        let files = material_files(&mtl);
        assert_eq!(
            files,
            vec![
                (TextureSlot::Diffuse, PathBuf::from("bat/diffuse.png")),
                (TextureSlot::Normal, PathBuf::from("bat/normal.png")),
            ]
        );
    }
}
