//! Edge split.
//!
//! Splitting an edge inserts a vertex at its midpoint and re-triangulates
//! the faces that shared the edge.
//!
//! ```text
//!     interior:                     boundary:
//!        C            C                C            C
//!       / \          /|\              / \          /|\
//!      /   \        / | \            /   \        / | \
//!     A-----B  ->  A--M--B          A-----B  ->  A--M--B
//!      \   /        \ | /
//!       \ /          \|/
//!        D            D
//! ```
//!
//! An interior edge turns its two triangles into the quad A-D-B-C and fans
//! it from M into four triangles. A boundary edge has a single triangle,
//! which becomes two.

use glam::Vec3;
use mesh::{HalfEdgeId, HalfEdgeMesh, SplitOutcome};
use tracing::trace;

/// Why a split was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitRejection {
    /// The edge no longer exists
    MissingEdge,
    /// The kernel could not re-triangulate the neighbourhood
    KernelRefused,
}

/// Midpoint of the edge.
pub fn calculate_split_position(mesh: &HalfEdgeMesh, edge_id: HalfEdgeId) -> Option<Vec3> {
    let (a, b) = mesh.edge_vertices(edge_id)?;
    Some(mesh.vertex(a)?.position.lerp(mesh.vertex(b)?.position, 0.5))
}

/// Split an edge at its midpoint.
pub fn split_edge(
    mesh: &mut HalfEdgeMesh,
    edge_id: HalfEdgeId,
) -> Result<SplitOutcome, SplitRejection> {
    let midpoint = calculate_split_position(mesh, edge_id).ok_or(SplitRejection::MissingEdge)?;
    let outcome = mesh
        .split_edge_topology(edge_id, midpoint)
        .ok_or(SplitRejection::KernelRefused)?;
    trace!(
        "split_edge: {:?} -> vertex {:?}, {} faces",
        edge_id,
        outcome.vertex,
        outcome.new_faces.len()
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh::{IndexedMesh, VertexId};

    fn lattice(spacing: f32) -> HalfEdgeMesh {
        HalfEdgeMesh::from_indexed(&IndexedMesh::triangle_lattice(5, 5, spacing)).unwrap()
    }

    #[test]
    fn test_split_interior_edge() {
        let mut mesh = lattice(1.4);
        let center = VertexId(12);
        let neighbor = mesh.get_adjacent_vertices(center)[0];
        let edge = mesh.find_edge(center, neighbor).unwrap();
        let edges_before = mesh.edge_count();
        let faces_before = mesh.live_face_count();

        let outcome = split_edge(&mut mesh, edge).unwrap();
        let m = outcome.vertex;
        assert_eq!(outcome.new_faces.len(), 4);
        assert_eq!(mesh.edge_count(), edges_before + 3);
        assert_eq!(mesh.live_face_count(), faces_before + 2);
        assert_eq!(mesh.valence(m), 4);
        assert!(mesh.find_edge(center, neighbor).is_none());

        for end in [center, neighbor] {
            let half = mesh.edge_length(mesh.find_edge(m, end).unwrap()).unwrap();
            assert!((half - 0.7).abs() < 1e-5);
        }
        assert!(mesh.validate().is_ok());
        assert!(mesh.check_manifold().is_ok());
    }

    #[test]
    fn test_split_boundary_edge() {
        let mut mesh = lattice(1.0);
        let edge = mesh
            .edges()
            .into_iter()
            .find(|&e| mesh.is_boundary_edge(e))
            .unwrap();
        let edges_before = mesh.edge_count();

        let outcome = split_edge(&mut mesh, edge).unwrap();
        assert_eq!(outcome.new_faces.len(), 2);
        assert_eq!(mesh.edge_count(), edges_before + 2);
        assert!(mesh.is_boundary_vertex(outcome.vertex));
        assert_eq!(mesh.valence(outcome.vertex), 3);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_split_keeps_face_tags() {
        let mut indexed = IndexedMesh::triangle_lattice(3, 3, 1.0);
        indexed.face_tags = vec![7; indexed.triangle_count()];
        let mut mesh = HalfEdgeMesh::from_indexed(&indexed).unwrap();
        let edge = mesh.edges()[0];
        split_edge(&mut mesh, edge).unwrap();
        assert_eq!(mesh.faces_with_tag(7).len(), mesh.live_face_count());
    }

    #[test]
    fn test_split_removed_edge() {
        let mut mesh = lattice(1.0);
        let edge = mesh.edges()[0];
        split_edge(&mut mesh, edge).unwrap();
        assert_eq!(split_edge(&mut mesh, edge).unwrap_err(), SplitRejection::MissingEdge);
    }
}
