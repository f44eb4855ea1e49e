//! Conversion between [`IndexedMesh`] and Bevy's render mesh.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology, VertexAttributeValues};
use bevy::prelude::*;

use crate::half_edge::{HalfEdgeError, HalfEdgeMesh};
use crate::indexed::IndexedMesh;

impl IndexedMesh {
    /// Read positions, normals, uvs, tangents and indices from a Bevy mesh.
    ///
    /// Bevy meshes have no per-triangle annotations, so every tag is 0.
    pub fn from_bevy_mesh(mesh: &Mesh) -> Result<Self, HalfEdgeError> {
        let positions = mesh
            .attribute(Mesh::ATTRIBUTE_POSITION)
            .and_then(|attr| attr.as_float3())
            .ok_or(HalfEdgeError::NoPositions)?
            .to_vec();

        let normals = mesh
            .attribute(Mesh::ATTRIBUTE_NORMAL)
            .and_then(|attr| attr.as_float3())
            .map(|n| n.to_vec())
            .unwrap_or_default();

        let uvs = mesh
            .attribute(Mesh::ATTRIBUTE_UV_0)
            .and_then(|attr| match attr {
                VertexAttributeValues::Float32x2(v) => Some(v.clone()),
                _ => None,
            });

        let tangents = mesh
            .attribute(Mesh::ATTRIBUTE_TANGENT)
            .and_then(|attr| match attr {
                VertexAttributeValues::Float32x4(v) => Some(v.clone()),
                _ => None,
            });

        let indices: Vec<u32> = match mesh.indices() {
            Some(Indices::U16(idx)) => idx.iter().map(|&i| i as u32).collect(),
            Some(Indices::U32(idx)) => idx.to_vec(),
            None => return Err(HalfEdgeError::NoIndices),
        };

        let indexed = Self {
            positions,
            normals,
            uvs,
            tangents,
            indices,
            face_tags: Vec::new(),
        };
        indexed.validate()?;
        Ok(indexed)
    }

    /// Build a triangle-list Bevy mesh with shared vertices.
    pub fn to_bevy_mesh(&self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions.clone());
        if !self.normals.is_empty() {
            mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals.clone());
        }
        if let Some(uvs) = &self.uvs {
            mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs.clone());
        }
        if let Some(tangents) = &self.tangents {
            mesh.insert_attribute(Mesh::ATTRIBUTE_TANGENT, tangents.clone());
        }
        mesh.insert_indices(Indices::U32(self.indices.clone()));
        mesh
    }
}

impl HalfEdgeMesh {
    /// Build a half-edge mesh from a Bevy mesh
    pub fn from_bevy_mesh(mesh: &Mesh) -> Result<Self, HalfEdgeError> {
        Self::from_indexed(&IndexedMesh::from_bevy_mesh(mesh)?)
    }

    /// Convert back to a Bevy mesh
    pub fn to_bevy_mesh(&self) -> Mesh {
        self.to_indexed().to_bevy_mesh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bevy_round_trip() {
        let source = IndexedMesh::triangle_lattice(4, 4, 0.5);
        let mesh = HalfEdgeMesh::from_bevy_mesh(&source.to_bevy_mesh()).unwrap();
        assert_eq!(mesh.vertex_count(), 16);
        let exported = mesh.to_indexed();
        assert_eq!(exported.indices.len(), source.indices.len());
    }
}
