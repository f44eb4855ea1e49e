//! Validation methods for HalfEdgeMesh.
//!
//! - [`HalfEdgeMesh::validate`]: twin symmetry, face cycles, `edge_map` agreement
//! - [`HalfEdgeMesh::check_manifold`]: edge and vertex-fan manifoldness
//!
//! Removed elements (half-edges with `face = None`) are skipped throughout.

use super::HalfEdgeMesh;
use super::types::{FaceId, HalfEdgeError, HalfEdgeId, VertexId};

impl HalfEdgeMesh {
    /// Validate the mesh connectivity.
    pub fn validate(&self) -> Result<(), HalfEdgeError> {
        for he in self.half_edges.iter().filter(|he| he.face.is_some()) {
            if let Some(twin_id) = he.twin {
                let twin = self
                    .half_edge(twin_id)
                    .ok_or(HalfEdgeError::InvalidTopology("Invalid twin reference".into()))?;
                if twin.twin != Some(he.id) || twin.face.is_none() {
                    return Err(HalfEdgeError::InvalidTopology(format!(
                        "Twin symmetry violated at {:?}",
                        he.id
                    )));
                }
            }

            let next = self
                .half_edge(he.next)
                .ok_or(HalfEdgeError::InvalidTopology("Invalid next reference".into()))?;
            if next.prev != he.id || next.face != he.face {
                return Err(HalfEdgeError::InvalidTopology(format!(
                    "Broken face cycle at {:?}",
                    he.id
                )));
            }

            if self.edge_map.get(&(he.origin, next.origin)) != Some(&he.id) {
                return Err(HalfEdgeError::InvalidTopology(format!(
                    "Edge map out of sync for {:?}",
                    he.id
                )));
            }
        }

        for i in 0..self.faces.len() {
            let face_id = FaceId(i as u32);
            if !self.is_face_live(face_id) {
                continue;
            }
            let [h0, _, h2] = self
                .face_half_edges(face_id)
                .ok_or(HalfEdgeError::InvalidTopology("Invalid face loop".into()))?;
            if self.half_edge(h2).map(|he| he.next) != Some(h0) {
                return Err(HalfEdgeError::InvalidTopology(format!(
                    "Face {:?} is not a triangle",
                    face_id
                )));
            }
        }

        for v in &self.vertices {
            if let Some(he_id) = v.outgoing_half_edge {
                let he = self
                    .half_edge(he_id)
                    .ok_or(HalfEdgeError::InvalidTopology("Invalid outgoing reference".into()))?;
                if he.origin != v.id || he.face.is_none() {
                    return Err(HalfEdgeError::InvalidTopology(format!(
                        "Vertex {:?} has a stale outgoing half-edge",
                        v.id
                    )));
                }
            }
        }

        Ok(())
    }

    /// Check if the mesh is manifold.
    ///
    /// Every edge must have one or two faces on opposite sides, and the faces
    /// around each vertex must form a single fan: an interior vertex has as
    /// many neighbours as faces, a boundary vertex one more.
    pub fn check_manifold(&self) -> Result<(), ManifoldError> {
        for he in self.half_edges.iter().filter(|he| he.face.is_some()) {
            let Some(twin_id) = he.twin else {
                continue;
            };
            let Some(twin) = self.half_edge(twin_id) else {
                return Err(ManifoldError::NonManifoldEdge {
                    edge_id: he.id,
                    reason: "missing twin".to_string(),
                });
            };
            if self.get_half_edge_dest(he.id) != Some(twin.origin) {
                return Err(ManifoldError::NonManifoldEdge {
                    edge_id: he.id,
                    reason: "twin direction mismatch".to_string(),
                });
            }
        }

        for vertex in self.live_vertices() {
            let ring_vertices = self.get_adjacent_vertices(vertex.id).len();
            let ring_faces = self.get_vertex_faces(vertex.id).len();
            let is_boundary = self.is_boundary_vertex(vertex.id);
            let expected = if is_boundary { ring_faces + 1 } else { ring_faces };
            if ring_vertices != expected {
                return Err(ManifoldError::NonManifoldVertex {
                    vertex_id: vertex.id,
                    ring_vertices,
                    ring_faces,
                    is_boundary,
                });
            }
        }

        // Fans reachable from the outgoing half-edge must cover every face
        // that references the vertex, otherwise it is a bowtie.
        let mut face_corners = vec![0usize; self.vertices.len()];
        for i in 0..self.faces.len() {
            if let Some(tri) = self.face_triangle(FaceId(i as u32)) {
                for v in tri {
                    face_corners[v.0 as usize] += 1;
                }
            }
        }
        for vertex in &self.vertices {
            let ring_faces = self.get_vertex_faces(vertex.id).len();
            let corners = face_corners[vertex.id.0 as usize];
            if corners != ring_faces {
                return Err(ManifoldError::DisconnectedFan {
                    vertex_id: vertex.id,
                    fan_faces: ring_faces,
                    total_faces: corners,
                });
            }
        }

        Ok(())
    }
}

/// Error types for manifold validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ManifoldError {
    #[error("Non-manifold edge {edge_id:?}: {reason}")]
    NonManifoldEdge { edge_id: HalfEdgeId, reason: String },
    #[error(
        "Non-manifold vertex {vertex_id:?}: {ring_vertices} ring vertices, {ring_faces} ring faces (boundary={is_boundary})"
    )]
    NonManifoldVertex {
        vertex_id: VertexId,
        ring_vertices: usize,
        ring_faces: usize,
        is_boundary: bool,
    },
    #[error("Vertex {vertex_id:?} fan reaches {fan_faces} of its {total_faces} faces")]
    DisconnectedFan {
        vertex_id: VertexId,
        fan_faces: usize,
        total_faces: usize,
    },
}
