//! Indexed triangle list exchanged with the rendering side.
//!
//! This is the shape meshes take when they enter and leave the sculpting
//! engine: flat attribute arrays, a triangle index list and one tag per
//! triangle (material or group id). [`PackedVertex`] interleaves the vertex
//! attributes for direct upload into a GPU vertex buffer.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::half_edge::HalfEdgeError;

/// Indexed triangle mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexedMesh {
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex normals. May be empty, normals are recomputed on import.
    pub normals: Vec<[f32; 3]>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub tangents: Option<Vec<[f32; 4]>>,
    /// Triangle list, three indices per face
    pub indices: Vec<u32>,
    /// One tag per triangle. Empty means every triangle has tag 0.
    #[serde(default)]
    pub face_tags: Vec<u32>,
}

/// Interleaved vertex layout for GPU upload (32 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PackedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl IndexedMesh {
    /// Number of triangles in the index list
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Tag of a triangle, 0 when no tags are present
    pub fn face_tag(&self, triangle: usize) -> u32 {
        self.face_tags.get(triangle).copied().unwrap_or(0)
    }

    /// Check attribute lengths and index ranges.
    pub fn validate(&self) -> Result<(), HalfEdgeError> {
        if self.positions.is_empty() {
            return Err(HalfEdgeError::NoPositions);
        }
        if self.indices.is_empty() {
            return Err(HalfEdgeError::NoIndices);
        }
        if self.indices.len() % 3 != 0 {
            return Err(HalfEdgeError::InvalidTopology(
                "Index count not divisible by 3".to_string(),
            ));
        }

        let vertex_count = self.positions.len();
        check_len("normals", &self.normals, vertex_count, true)?;
        if let Some(uvs) = &self.uvs {
            check_len("uvs", uvs, vertex_count, false)?;
        }
        if let Some(tangents) = &self.tangents {
            check_len("tangents", tangents, vertex_count, false)?;
        }
        check_len("face_tags", &self.face_tags, self.triangle_count(), true)?;

        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(HalfEdgeError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        Ok(())
    }

    /// Interleave positions, normals and uvs.
    pub fn packed_vertices(&self) -> Vec<PackedVertex> {
        (0..self.positions.len())
            .map(|i| PackedVertex {
                position: self.positions[i],
                normal: self.normals.get(i).copied().unwrap_or([0.0, 0.0, 0.0]),
                uv: self
                    .uvs
                    .as_ref()
                    .and_then(|uvs| uvs.get(i).copied())
                    .unwrap_or([0.0, 0.0]),
            })
            .collect()
    }

    /// Interleaved vertex buffer as raw bytes.
    pub fn vertex_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice::<PackedVertex, u8>(&self.packed_vertices()).to_vec()
    }
}

fn check_len<T>(
    attribute: &'static str,
    values: &[T],
    expected: usize,
    may_be_empty: bool,
) -> Result<(), HalfEdgeError> {
    if values.len() == expected || (may_be_empty && values.is_empty()) {
        return Ok(());
    }
    Err(HalfEdgeError::AttributeLength {
        attribute,
        expected,
        actual: values.len(),
    })
}
