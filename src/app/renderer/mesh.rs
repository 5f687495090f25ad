//! OBJ meshes: CPU-side vertex data and GPU buffers

use std::ops::Range;
use std::path::{Path, PathBuf};

use glam::{Vec2, Vec3};
use tracing::{debug, warn};
use wgpu::util::DeviceExt;

use super::texture::AssetError;

/// Vertex layout shared by every object program
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub tangent: [f32; 3],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x3,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Texture files named by an MTL material, resolved against the mesh directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialTextures {
    pub diffuse: Option<PathBuf>,
    pub specular: Option<PathBuf>,
    pub normal: Option<PathBuf>,
}

impl MaterialTextures {
    fn from_mtl(material: &tobj::Material, dir: &Path) -> Self {
        let resolve = |name: &Option<String>| {
            name.as_deref()
                .filter(|n| !n.trim().is_empty())
                .map(|n| dir.join(n.trim().replace('\\', "/")))
        };
        Self {
            diffuse: resolve(&material.diffuse_texture),
            specular: resolve(&material.specular_texture),
            normal: resolve(&material.normal_texture),
        }
    }
}

/// A run of indices drawn with one material
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    pub indices: Range<u32>,
    pub material: Option<usize>,
}

/// A whole OBJ file merged into one vertex and index list
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<SubMesh>,
    pub materials: Vec<MaterialTextures>,
}

impl MeshData {
    /// Loads an OBJ file and its MTL library
    ///
    /// A missing or broken MTL file is logged and the mesh loads without materials.
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let (models, materials) =
            tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS).map_err(|source| AssetError::Mesh {
                path: path.to_path_buf(),
                source,
            })?;

        let materials = materials.unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Failed to load materials");
            Vec::new()
        });

        let dir = path.parent().unwrap_or(Path::new("."));
        let mesh = Self::from_models(&models, &materials, dir);
        if mesh.indices.is_empty() {
            return Err(AssetError::EmptyMesh {
                path: path.to_path_buf(),
            });
        }

        debug!(
            path = %path.display(),
            vertices = mesh.vertices.len(),
            submeshes = mesh.submeshes.len(),
            "Mesh loaded"
        );
        Ok(mesh)
    }

    /// Merges tobj models into one buffer pair, flipping V for top-left texture origin
    pub fn from_models(models: &[tobj::Model], materials: &[tobj::Material], dir: &Path) -> Self {
        let mut mesh = Self {
            materials: materials
                .iter()
                .map(|m| MaterialTextures::from_mtl(m, dir))
                .collect(),
            ..Self::default()
        };

        for model in models {
            let src = &model.mesh;
            let base = mesh.vertices.len() as u32;
            let count = src.positions.len() / 3;

            let mut normals: Vec<Vec3> = (0..count)
                .map(|i| vec3_at(&src.normals, i).unwrap_or(Vec3::ZERO))
                .collect();
            if src.normals.len() < count * 3 {
                normals = smooth_normals(src, count);
            }

            let positions: Vec<Vec3> = (0..count)
                .map(|i| vec3_at(&src.positions, i).unwrap_or(Vec3::ZERO))
                .collect();
            let uvs: Vec<Vec2> = (0..count)
                .map(|i| match src.texcoords.get(i * 2..i * 2 + 2) {
                    Some(uv) => Vec2::new(uv[0], 1.0 - uv[1]),
                    None => Vec2::ZERO,
                })
                .collect();
            let tangents = tangents(&positions, &normals, &uvs, &src.indices);

            mesh.vertices.extend((0..count).map(|i| Vertex {
                position: positions[i].to_array(),
                normal: normals[i].to_array(),
                tex_coords: uvs[i].to_array(),
                tangent: tangents[i].to_array(),
            }));

            let start = mesh.indices.len() as u32;
            mesh.indices.extend(src.indices.iter().map(|i| base + i));
            let end = mesh.indices.len() as u32;

            if end > start {
                mesh.submeshes.push(SubMesh {
                    indices: start..end,
                    material: src.material_id.filter(|id| *id < materials.len()),
                });
            }
        }

        mesh
    }
}

fn vec3_at(data: &[f32], i: usize) -> Option<Vec3> {
    data.get(i * 3..i * 3 + 3).map(Vec3::from_slice)
}

fn smooth_normals(src: &tobj::Mesh, count: usize) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; count];
    for tri in src.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (Some(pa), Some(pb), Some(pc)) = (
            vec3_at(&src.positions, a),
            vec3_at(&src.positions, b),
            vec3_at(&src.positions, c),
        ) else {
            continue;
        };
        let face = (pb - pa).cross(pc - pa);
        for i in [a, b, c] {
            normals[i] += face;
        }
    }
    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
        .collect()
}

/// Per-vertex tangents from UV gradients, orthogonalised against the normal
fn tangents(positions: &[Vec3], normals: &[Vec3], uvs: &[Vec2], indices: &[u32]) -> Vec<Vec3> {
    let mut sums = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let edge1 = positions[b] - positions[a];
        let edge2 = positions[c] - positions[a];
        let duv1 = uvs[b] - uvs[a];
        let duv2 = uvs[c] - uvs[a];

        let det = duv1.x * duv2.y - duv2.x * duv1.y;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let tangent = (edge1 * duv2.y - edge2 * duv1.y) / det;
        for i in [a, b, c] {
            sums[i] += tangent;
        }
    }

    sums.into_iter()
        .zip(normals)
        .map(|(t, n)| {
            (t - *n * n.dot(t))
                .try_normalize()
                .unwrap_or_else(|| n.any_orthonormal_vector())
        })
        .collect()
}

/// Uploaded mesh with one bind group per sub-mesh
pub struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    submeshes: Vec<(Range<u32>, wgpu::BindGroup)>,
}

impl GpuMesh {
    pub fn new(
        device: &wgpu::Device,
        data: &MeshData,
        label: &str,
        mut material_group: impl FnMut(&SubMesh) -> wgpu::BindGroup,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let submeshes = data
            .submeshes
            .iter()
            .map(|sub| (sub.indices.clone(), material_group(sub)))
            .collect();

        Self {
            vertex_buffer,
            index_buffer,
            submeshes,
        }
    }

    /// Issues one indexed draw per sub-mesh; group 0 must already be bound
    pub fn draw(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        rpass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        for (indices, material) in &self.submeshes {
            rpass.set_bind_group(1, material, &[]);
            rpass.draw_indexed(indices.clone(), 0, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD_OBJ: &str = "\
mtllib quad.mtl
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl bark
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    const QUAD_MTL: &str = "\
newmtl bark
map_Kd textures\\bark.png
map_Bump bark_normal.png
";

    fn parse(obj: &str, mtl: &'static str) -> MeshData {
        let (models, materials) = tobj::load_obj_buf(
            &mut obj.as_bytes(),
            &tobj::GPU_LOAD_OPTIONS,
            |_| tobj::load_mtl_buf(&mut mtl.as_bytes()),
        )
        .expect("valid obj");
        let materials = materials.expect("valid mtl");
        MeshData::from_models(&models, &materials, Path::new("objects/quad"))
    }

    #[test]
    fn test_quad_is_triangulated_with_flipped_v() {
        let mesh = parse(QUAD_OBJ, QUAD_MTL);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
        assert_eq!(mesh.submeshes, vec![SubMesh {
            indices: 0..6,
            material: Some(0),
        }]);
        assert_eq!(mesh.vertices[0].tex_coords, [0.0, 1.0]);
        assert_eq!(mesh.vertices[2].tex_coords, [1.0, 0.0]);
    }

    #[test]
    fn test_material_paths_resolve_against_mesh_dir() {
        let mesh = parse(QUAD_OBJ, QUAD_MTL);
        let material = &mesh.materials[0];
        assert_eq!(
            material.diffuse,
            Some(PathBuf::from("objects/quad/textures/bark.png"))
        );
        assert_eq!(material.specular, None);
    }

    #[test]
    fn test_tangent_follows_u_axis() {
        let mesh = parse(QUAD_OBJ, QUAD_MTL);
        for vertex in &mesh.vertices {
            let tangent = Vec3::from_array(vertex.tangent);
            assert!(tangent.abs_diff_eq(Vec3::X, 1e-5), "{tangent:?}");
        }
    }

    #[test]
    fn test_missing_normals_are_generated() {
        let obj = "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let mesh = parse(obj, "");
        for vertex in &mesh.vertices {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        }
        assert_eq!(mesh.submeshes[0].material, None);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = MeshData::load(Path::new("does/not/exist.obj"));
        assert!(matches!(result, Err(AssetError::Mesh { .. })));
    }
}
