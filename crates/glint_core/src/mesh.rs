//! Mesh ingestion type handed to the scene builder by asset loaders.

use glint_math::{Vec2, Vec3};

use crate::material::MaterialId;

/// Geometry for one mesh, already triangulated and transformed into world
/// space by the loader.
///
/// Normals are required and indexed like positions. Tangents and texture
/// coordinates are optional; when present they must also cover every vertex.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Option<Vec<Vec3>>,
    pub texcoords: Option<Vec<Vec2>>,
    /// Triangle indices, three per face, local to this mesh.
    pub indices: Vec<u32>,
    pub material: MaterialId,
}

impl MeshData {
    pub fn new(
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        indices: Vec<u32>,
        material: MaterialId,
    ) -> Self {
        Self {
            positions,
            normals,
            tangents: None,
            texcoords: None,
            indices,
            material,
        }
    }

    /// Attach per-vertex tangents (needed for bump mapping).
    pub fn with_tangents(mut self, tangents: Vec<Vec3>) -> Self {
        self.tangents = Some(tangents);
        self
    }

    /// Attach per-vertex texture coordinates.
    pub fn with_texcoords(mut self, texcoords: Vec<Vec2>) -> Self {
        self.texcoords = Some(texcoords);
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_counts() {
        let mesh = MeshData::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
            vec![Vec3::Z; 4],
            vec![0, 1, 2, 0, 2, 3],
            0,
        );
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.texcoords.is_none());
    }
}
