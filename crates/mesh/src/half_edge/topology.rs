//! Topology query methods for HalfEdgeMesh.

use glam::Vec3;

use super::HalfEdgeMesh;
use super::types::{Face, FaceId, HalfEdge, HalfEdgeId, Vertex, VertexId};

/// Upper bound on ring walks, guards against corrupted connectivity.
const MAX_RING_WALK: usize = 1024;

impl HalfEdgeMesh {
    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get vertex by ID
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.0 as usize)
    }

    /// Get mutable vertex by ID
    pub fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        self.vertices.get_mut(id.0 as usize)
    }

    /// Get half-edge by ID
    pub fn half_edge(&self, id: HalfEdgeId) -> Option<&HalfEdge> {
        self.half_edges.get(id.0 as usize)
    }

    /// Get face by ID
    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id.0 as usize)
    }

    /// Get all vertex slots, including removed ones
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Get all half-edge slots, including removed ones
    pub fn half_edges(&self) -> &[HalfEdge] {
        &self.half_edges
    }

    /// Get all face slots, including removed ones
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Number of vertex slots. Equal to the live count right after [`Self::compact`].
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of face slots. Equal to the live count right after [`Self::compact`].
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of live edges (interior edges counted once, boundary edges once)
    pub fn edge_count(&self) -> usize {
        self.half_edges
            .iter()
            .filter(|he| self.is_canonical(he))
            .count()
    }

    /// Number of vertices that still belong to at least one face.
    pub fn live_vertex_count(&self) -> usize {
        self.vertices
            .iter()
            .filter(|v| v.outgoing_half_edge.is_some())
            .count()
    }

    /// Number of faces that have not been removed.
    pub fn live_face_count(&self) -> usize {
        (0..self.faces.len())
            .filter(|&i| self.is_face_live(FaceId(i as u32)))
            .count()
    }

    /// Iterate over vertices that still belong to at least one face.
    pub fn live_vertices(&self) -> impl Iterator<Item = &Vertex> + '_ {
        self.vertices
            .iter()
            .filter(|v| v.outgoing_half_edge.is_some())
    }

    // ========================================================================
    // Liveness
    // ========================================================================

    /// A vertex is live while it has an outgoing half-edge.
    pub fn is_vertex_live(&self, id: VertexId) -> bool {
        self.vertex(id)
            .is_some_and(|v| v.outgoing_half_edge.is_some())
    }

    /// A half-edge is live while it belongs to a face.
    pub fn is_half_edge_live(&self, id: HalfEdgeId) -> bool {
        self.half_edge(id).is_some_and(|he| he.face.is_some())
    }

    /// A face is live while its half-edge still points back to it.
    pub fn is_face_live(&self, id: FaceId) -> bool {
        self.face(id)
            .and_then(|f| self.half_edge(f.half_edge))
            .is_some_and(|he| he.face == Some(id))
    }

    // ========================================================================
    // Topology Queries
    // ========================================================================

    /// All live half-edges leaving a vertex.
    ///
    /// Walks the fan in both directions so boundary vertices are fully
    /// covered: first `prev -> twin` until the fan closes or hits a boundary,
    /// then `twin -> next` from the starting half-edge.
    pub fn outgoing_half_edges(&self, vertex_id: VertexId) -> Vec<HalfEdgeId> {
        let Some(start) = self.vertex(vertex_id).and_then(|v| v.outgoing_half_edge) else {
            return Vec::new();
        };
        if !self.is_half_edge_live(start) {
            return Vec::new();
        }

        let mut result = vec![start];
        let mut current = start;
        let mut closed = false;

        for _ in 0..MAX_RING_WALK {
            let Some(prev) = self.half_edge(current).map(|he| he.prev) else {
                break;
            };
            let Some(next_out) = self.half_edge(prev).and_then(|he| he.twin) else {
                break;
            };
            if next_out == start {
                closed = true;
                break;
            }
            result.push(next_out);
            current = next_out;
        }

        if !closed {
            current = start;
            for _ in 0..MAX_RING_WALK {
                let Some(twin) = self.half_edge(current).and_then(|he| he.twin) else {
                    break;
                };
                let Some(next_out) = self.half_edge(twin).map(|he| he.next) else {
                    break;
                };
                if next_out == start || result.contains(&next_out) {
                    break;
                }
                result.push(next_out);
                current = next_out;
            }
        }

        result
    }

    /// Get all faces adjacent to a vertex
    pub fn get_vertex_faces(&self, vertex_id: VertexId) -> Vec<FaceId> {
        self.outgoing_half_edges(vertex_id)
            .into_iter()
            .filter_map(|he| self.half_edge(he).and_then(|he| he.face))
            .collect()
    }

    /// Get all vertices connected to a vertex by an edge
    pub fn get_adjacent_vertices(&self, vertex_id: VertexId) -> Vec<VertexId> {
        let mut result = Vec::new();
        for he_id in self.outgoing_half_edges(vertex_id) {
            let Some(he) = self.half_edge(he_id) else {
                continue;
            };
            let dest = self.get_half_edge_dest(he_id);
            let prev_origin = self.half_edge(he.prev).map(|p| p.origin);
            for neighbor in [dest, prev_origin].into_iter().flatten() {
                if !result.contains(&neighbor) {
                    result.push(neighbor);
                }
            }
        }
        result
    }

    /// Number of edges incident to a vertex.
    pub fn valence(&self, vertex_id: VertexId) -> usize {
        self.get_adjacent_vertices(vertex_id).len()
    }

    /// Get the three half-edges of a live face
    pub fn face_half_edges(&self, face_id: FaceId) -> Option<[HalfEdgeId; 3]> {
        if !self.is_face_live(face_id) {
            return None;
        }
        let he0 = self.face(face_id)?.half_edge;
        let he1 = self.half_edge(he0)?.next;
        let he2 = self.half_edge(he1)?.next;
        Some([he0, he1, he2])
    }

    /// Get the three vertices of a live face, in winding order
    pub fn face_triangle(&self, face_id: FaceId) -> Option<[VertexId; 3]> {
        let [h0, h1, h2] = self.face_half_edges(face_id)?;
        Some([
            self.half_edge(h0)?.origin,
            self.half_edge(h1)?.origin,
            self.half_edge(h2)?.origin,
        ])
    }

    /// Get the vertices of a face (empty for removed faces)
    pub fn get_face_vertices(&self, face_id: FaceId) -> Vec<VertexId> {
        self.face_triangle(face_id)
            .map(|tri| tri.to_vec())
            .unwrap_or_default()
    }

    /// Get the destination vertex of a half-edge
    pub fn get_half_edge_dest(&self, he_id: HalfEdgeId) -> Option<VertexId> {
        let he = self.half_edge(he_id)?;
        self.half_edge(he.next).map(|next| next.origin)
    }

    /// Find the half-edge running from one vertex to another
    pub fn find_half_edge(&self, from: VertexId, to: VertexId) -> Option<HalfEdgeId> {
        self.edge_map.get(&(from, to)).copied()
    }

    /// Find the edge between two vertices in either direction.
    ///
    /// Returns the canonical half-edge of the pair.
    pub fn find_edge(&self, a: VertexId, b: VertexId) -> Option<HalfEdgeId> {
        self.find_half_edge(a, b)
            .or_else(|| self.find_half_edge(b, a))
            .map(|he| self.canonical_edge(he))
    }

    /// The half-edge that stands for the whole edge: the boundary half-edge,
    /// or the lower id of an interior pair.
    pub fn canonical_edge(&self, he_id: HalfEdgeId) -> HalfEdgeId {
        match self.half_edge(he_id).and_then(|he| he.twin) {
            Some(twin) if twin.0 < he_id.0 => twin,
            _ => he_id,
        }
    }

    fn is_canonical(&self, he: &HalfEdge) -> bool {
        he.face.is_some() && he.twin.is_none_or(|twin| he.id.0 < twin.0)
    }

    /// All live edges, one canonical half-edge per edge, in id order.
    pub fn edges(&self) -> Vec<HalfEdgeId> {
        self.half_edges
            .iter()
            .filter(|he| self.is_canonical(he))
            .map(|he| he.id)
            .collect()
    }

    /// Endpoints of an edge as (origin, destination).
    pub fn edge_vertices(&self, he_id: HalfEdgeId) -> Option<(VertexId, VertexId)> {
        let he = self.half_edge(he_id)?;
        he.face?;
        Some((he.origin, self.get_half_edge_dest(he_id)?))
    }

    /// Faces on either side of a half-edge
    pub fn get_edge_faces(&self, he_id: HalfEdgeId) -> (Option<FaceId>, Option<FaceId>) {
        let Some(he) = self.half_edge(he_id) else {
            return (None, None);
        };
        let twin_face = he
            .twin
            .and_then(|t| self.half_edge(t))
            .and_then(|t| t.face);
        (he.face, twin_face)
    }

    /// Euclidean length of an edge
    pub fn edge_length(&self, he_id: HalfEdgeId) -> Option<f32> {
        let (a, b) = self.edge_vertices(he_id)?;
        Some(self.vertex(a)?.position.distance(self.vertex(b)?.position))
    }

    /// Mean length over all live edges, 0 for a mesh without edges.
    pub fn average_edge_length(&self) -> f32 {
        let lengths: Vec<f32> = self
            .edges()
            .into_iter()
            .filter_map(|e| self.edge_length(e))
            .collect();
        if lengths.is_empty() {
            return 0.0;
        }
        lengths.iter().sum::<f32>() / lengths.len() as f32
    }

    /// Check if a half-edge lies on the mesh boundary
    pub fn is_boundary_edge(&self, he_id: HalfEdgeId) -> bool {
        self.half_edge(he_id).is_some_and(|he| he.twin.is_none())
    }

    /// Check if a vertex lies on the mesh boundary
    pub fn is_boundary_vertex(&self, vertex_id: VertexId) -> bool {
        self.outgoing_half_edges(vertex_id).into_iter().any(|he_id| {
            let Some(he) = self.half_edge(he_id) else {
                return false;
            };
            he.twin.is_none() || self.half_edge(he.prev).is_some_and(|p| p.twin.is_none())
        })
    }

    /// Axis-aligned bounds of the live vertices as (min, max).
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut live = self.live_vertices().map(|v| v.position);
        let first = live.next()?;
        Some(live.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_meshes::*;
    use super::*;

    #[test]
    fn test_interior_vertex_ring() {
        let mesh = hexagon_fan();
        let center = VertexId(0);
        assert_eq!(mesh.get_vertex_faces(center).len(), 6);
        assert_eq!(mesh.valence(center), 6);
        assert!(!mesh.is_boundary_vertex(center));
    }

    #[test]
    fn test_boundary_vertex_ring_is_complete() {
        let mesh = quad();
        // Vertex 0 touches both triangles but sits on the boundary
        let faces = mesh.get_vertex_faces(VertexId(0));
        assert_eq!(faces.len(), 2);
        let mut neighbors = mesh.get_adjacent_vertices(VertexId(0));
        neighbors.sort();
        assert_eq!(neighbors, vec![VertexId(1), VertexId(2), VertexId(3)]);
        assert!(mesh.is_boundary_vertex(VertexId(0)));
    }

    #[test]
    fn test_find_edge_is_canonical() {
        let mesh = quad();
        let forward = mesh.find_edge(VertexId(0), VertexId(2)).unwrap();
        let backward = mesh.find_edge(VertexId(2), VertexId(0)).unwrap();
        assert_eq!(forward, backward);
        assert!(mesh.edges().contains(&forward));
    }

    #[test]
    fn test_edge_lengths() {
        let mesh = quad();
        let diagonal = mesh.find_edge(VertexId(0), VertexId(2)).unwrap();
        assert!((mesh.edge_length(diagonal).unwrap() - 2.0_f32.sqrt()).abs() < 1e-6);

        let expected = (4.0 + 2.0_f32.sqrt()) / 5.0;
        assert!((mesh.average_edge_length() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_bounds() {
        let mesh = quad();
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vec3::ZERO);
        assert_eq!(max, Vec3::new(1.0, 1.0, 0.0));
        assert!(HalfEdgeMesh::new().bounds().is_none());
    }
}
