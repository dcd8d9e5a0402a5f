//! Scene builder and the committed, frozen scene store.
//!
//! Geometry is buffered through `SceneBuilder` and flattened by `commit`
//! into contiguous arrays that stay immutable for the lifetime of the
//! render. Commit also derives the per-axis triangle extent tables used by
//! the kd-tree builder, the padded scene bounds, and the scene-scale
//! epsilon.

use glint_math::{Aabb, Ray, Vec2, Vec3};
use thiserror::Error;

use crate::material::{Light, Material, MaterialId, TextureId};
use crate::mesh::MeshData;
use crate::texture::Texture;
use crate::triangle::Triangle;

/// Errors surfaced while assembling a scene. All of these are fatal for the
/// caller; rendering never starts on a partially valid scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("mesh has {normals} normals for {vertices} vertices")]
    NormalCountMismatch { vertices: usize, normals: usize },

    #[error("mesh has {attributes} {name} for {vertices} vertices")]
    AttributeCountMismatch {
        name: &'static str,
        vertices: usize,
        attributes: usize,
    },

    #[error("triangle index {index} out of range for {vertices} vertices")]
    IndexOutOfRange { index: u32, vertices: usize },

    #[error("material index {0} does not exist")]
    UnknownMaterial(MaterialId),

    #[error("material '{name}' references texture {texture} which does not exist")]
    UnknownTexture { name: String, texture: TextureId },
}

/// Mutable buffers collecting geometry before commit.
#[derive(Default)]
pub struct SceneBuilder {
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    tangents: Vec<Vec3>,
    texcoords: Vec<Vec2>,
    triangles: Vec<Triangle>,
    materials: Vec<Material>,
    textures: Vec<Texture>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a material and return its index. The material's texture
    /// references are validated against the textures added so far.
    pub fn load_material(&mut self, material: Material) -> Result<MaterialId, SceneError> {
        if let Some(texture) = material.max_texture_index() {
            if texture >= self.textures.len() {
                return Err(SceneError::UnknownTexture {
                    name: material.name.clone(),
                    texture,
                });
            }
        }
        self.materials.push(material);
        Ok(self.materials.len() - 1)
    }

    /// Add a texture to the scene-owned table and return its index.
    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.push(texture);
        self.textures.len() - 1
    }

    /// Append a mesh to the buffers.
    ///
    /// Faces with a trailing partial index triple are skipped with a
    /// warning; out-of-range indices and attribute count mismatches are
    /// errors.
    pub fn add_mesh(&mut self, mesh: &MeshData) -> Result<(), SceneError> {
        let n_verts = mesh.positions.len();
        if mesh.normals.len() != n_verts {
            return Err(SceneError::NormalCountMismatch {
                vertices: n_verts,
                normals: mesh.normals.len(),
            });
        }
        if let Some(tangents) = &mesh.tangents {
            if tangents.len() != n_verts {
                return Err(SceneError::AttributeCountMismatch {
                    name: "tangents",
                    vertices: n_verts,
                    attributes: tangents.len(),
                });
            }
        }
        if let Some(texcoords) = &mesh.texcoords {
            if texcoords.len() != n_verts {
                return Err(SceneError::AttributeCountMismatch {
                    name: "texcoords",
                    vertices: n_verts,
                    attributes: texcoords.len(),
                });
            }
        }
        if mesh.material >= self.materials.len() {
            return Err(SceneError::UnknownMaterial(mesh.material));
        }
        for &index in &mesh.indices {
            if index as usize >= n_verts {
                return Err(SceneError::IndexOutOfRange {
                    index,
                    vertices: n_verts,
                });
            }
        }

        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&mesh.positions);
        self.normals.extend_from_slice(&mesh.normals);
        match &mesh.tangents {
            Some(tangents) => self.tangents.extend_from_slice(tangents),
            None => self.tangents.extend(std::iter::repeat(Vec3::ZERO).take(n_verts)),
        }
        match &mesh.texcoords {
            Some(texcoords) => self.texcoords.extend_from_slice(texcoords),
            None => self.texcoords.extend(std::iter::repeat(Vec2::ZERO).take(n_verts)),
        }

        let mut faces = mesh.indices.chunks_exact(3);
        for face in &mut faces {
            self.triangles.push(Triangle::new(
                face[0] + offset,
                face[1] + offset,
                face[2] + offset,
                mesh.material as u32,
            ));
        }
        if !faces.remainder().is_empty() {
            log::warn!(
                "mesh leaves {} dangling indices, skipping the partial face",
                faces.remainder().len()
            );
        }

        Ok(())
    }

    /// Flatten the buffers into a frozen `Scene`.
    ///
    /// Computes triangle planes (skipping zero-area triangles with a
    /// warning), fills the per-axis extent tables, and derives the scene
    /// bounds and epsilon from the geometry's diagonal.
    pub fn commit(self) -> Result<Scene, SceneError> {
        let SceneBuilder {
            vertices,
            normals,
            tangents,
            texcoords,
            triangles,
            materials,
            textures,
        } = self;

        let mut committed = Vec::with_capacity(triangles.len());
        for mut tri in triangles {
            if tri.compute_plane(&vertices) {
                committed.push(tri);
            } else {
                log::warn!(
                    "skipping zero-area triangle ({}, {}, {})",
                    tri.va,
                    tri.vb,
                    tri.vc
                );
            }
        }

        let n_triangles = committed.len();
        let mut events = [
            vec![0.0f32; 2 * n_triangles],
            vec![0.0f32; 2 * n_triangles],
            vec![0.0f32; 2 * n_triangles],
        ];
        for (axis, table) in events.iter_mut().enumerate() {
            for (i, tri) in committed.iter().enumerate() {
                let a = vertices[tri.va as usize][axis];
                let b = vertices[tri.vb as usize][axis];
                let c = vertices[tri.vc as usize][axis];
                table[2 * i] = a.min(b).min(c);
                table[2 * i + 1] = a.max(b).max(c);
            }
        }

        let (bounds_min, bounds_max) = if n_triangles > 0 {
            let mut min = Vec3::splat(f32::INFINITY);
            let mut max = Vec3::splat(f32::NEG_INFINITY);
            for axis in 0..3 {
                for &value in &events[axis] {
                    min[axis] = min[axis].min(value);
                    max[axis] = max[axis].max(value);
                }
            }
            (min, max)
        } else {
            (Vec3::ZERO, Vec3::ZERO)
        };

        let diameter = (bounds_max - bounds_min).length();
        let epsilon = 1e-5 * diameter;
        let bounds = Aabb::from_points(bounds_min, bounds_max).padded(epsilon);

        log::info!(
            "committed {} vertices, {} normals, {} triangles, {} materials, {} textures",
            vertices.len(),
            normals.len(),
            n_triangles,
            materials.len(),
            textures.len()
        );
        log::debug!("scene epsilon: {epsilon}");

        Ok(Scene {
            vertices,
            normals,
            tangents,
            texcoords,
            triangles: committed,
            materials,
            textures,
            lights: Vec::new(),
            events,
            bounds,
            epsilon,
        })
    }
}

/// The committed scene: flat geometry arrays, materials, textures, lights.
///
/// Geometry is immutable after commit; the struct offers no mutators apart
/// from light installation, which does not touch geometry.
pub struct Scene {
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    tangents: Vec<Vec3>,
    texcoords: Vec<Vec2>,
    triangles: Vec<Triangle>,
    materials: Vec<Material>,
    textures: Vec<Texture>,
    lights: Vec<Light>,
    /// Per-axis `(min, max)` extents, two entries per triangle. Consumed by
    /// the kd-tree builder.
    events: [Vec<f32>; 3],
    bounds: Aabb,
    epsilon: f32,
}

impl Scene {
    /// Install point lights. Lights are not part of the geometry commit and
    /// may be added any time before rendering.
    pub fn add_point_lights(&mut self, lights: Vec<Light>) {
        self.lights.extend(lights);
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle(&self, index: u32) -> &Triangle {
        &self.triangles[index as usize]
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn material_of(&self, tri: &Triangle) -> &Material {
        &self.materials[tri.mat as usize]
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn texture(&self, id: TextureId) -> &Texture {
        &self.textures[id]
    }

    /// Scene bounds enlarged by epsilon on every side.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Scene-scale offset: `1e-5` times the length of the bounds diagonal.
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// The `(min, max)` extent table for one axis, two entries per triangle.
    pub fn axis_events(&self, axis: usize) -> &[f32] {
        &self.events[axis]
    }

    pub fn triangle_vertices(&self, index: u32) -> [Vec3; 3] {
        let tri = &self.triangles[index as usize];
        [
            self.vertices[tri.va as usize],
            self.vertices[tri.vb as usize],
            self.vertices[tri.vc as usize],
        ]
    }

    pub fn triangle_normals(&self, index: u32) -> [Vec3; 3] {
        let tri = &self.triangles[index as usize];
        [
            self.normals[tri.va as usize],
            self.normals[tri.vb as usize],
            self.normals[tri.vc as usize],
        ]
    }

    pub fn triangle_tangents(&self, index: u32) -> [Vec3; 3] {
        let tri = &self.triangles[index as usize];
        [
            self.tangents[tri.va as usize],
            self.tangents[tri.vb as usize],
            self.tangents[tri.vc as usize],
        ]
    }

    pub fn triangle_texcoords(&self, index: u32) -> [Vec2; 3] {
        let tri = &self.triangles[index as usize];
        [
            self.texcoords[tri.va as usize],
            self.texcoords[tri.vb as usize],
            self.texcoords[tri.vc as usize],
        ]
    }

    /// Intersect a ray with one triangle, returning `(t, u, v)` on a hit.
    pub fn intersect_triangle(&self, index: u32, ray: &Ray) -> Option<(f32, f32, f32)> {
        self.triangles[index as usize].intersect(self.triangle_vertices(index), ray)
    }
}
