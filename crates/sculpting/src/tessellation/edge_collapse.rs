//! Edge collapse.
//!
//! Collapsing an edge merges its two endpoints into one vertex placed at the
//! midpoint of the edge. The faces sharing the edge disappear.
//!
//! ```text
//!     Before:              After:
//!        C                    C
//!       /|\                   |
//!      / | \                  |
//!     A--+--B      ->         M
//!      \ | /                  |
//!       \|/                   |
//!        D                    D
//! ```
//!
//! ## Safety
//!
//! A collapse is only attempted when:
//! - the endpoints share exactly the opposite vertices of the edge
//!   (two for an interior edge, one on the boundary), the link condition;
//! - an interior edge does not join two boundary vertices, which would pinch
//!   the surface into a bowtie;
//! - each opposite vertex keeps enough neighbours to stay a proper fan;
//! - no surviving face around the endpoints turns over or degenerates.

use glam::Vec3;
use mesh::{CollapseOutcome, HalfEdgeId, HalfEdgeMesh, VertexId};
use std::collections::HashSet;
use tracing::trace;

use super::metrics::is_degenerate_triangle;

/// Why a collapse was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollapseRejection {
    /// The edge no longer exists
    MissingEdge,
    /// Endpoints share a different number of neighbours than the edge has
    /// opposite vertices
    LinkCondition { common: usize, expected: usize },
    /// Interior edge between two boundary vertices
    BoundaryPinch,
    /// An opposite vertex would drop below its minimum valence
    LowValence { vertex: VertexId, valence: usize },
    /// A face would invert or collapse to zero area
    FaceFlip,
    /// The kernel could not rebuild the neighbourhood
    KernelRefused,
}

/// Outcome of a collapse check
pub type CollapseCheck = Result<(), CollapseRejection>;

/// Check whether an edge can be collapsed to its midpoint.
pub fn can_collapse_edge(mesh: &HalfEdgeMesh, edge_id: HalfEdgeId) -> CollapseCheck {
    let (a, b) = mesh
        .edge_vertices(edge_id)
        .ok_or(CollapseRejection::MissingEdge)?;
    let boundary_edge = mesh.is_boundary_edge(edge_id);

    let opposite = opposite_vertices(mesh, edge_id);
    let expected = if boundary_edge { 1 } else { 2 };

    let a_ring: HashSet<VertexId> = mesh.get_adjacent_vertices(a).into_iter().collect();
    let common = mesh
        .get_adjacent_vertices(b)
        .into_iter()
        .filter(|v| *v != a && a_ring.contains(v))
        .count();
    if common != expected || opposite.len() != expected {
        return Err(CollapseRejection::LinkCondition { common, expected });
    }

    if !boundary_edge && mesh.is_boundary_vertex(a) && mesh.is_boundary_vertex(b) {
        return Err(CollapseRejection::BoundaryPinch);
    }

    // Each opposite vertex loses one neighbour
    for &vertex in &opposite {
        let valence = mesh.valence(vertex);
        let minimum = if mesh.is_boundary_vertex(vertex) { 3 } else { 4 };
        if valence < minimum {
            return Err(CollapseRejection::LowValence { vertex, valence });
        }
    }

    let midpoint =
        calculate_collapse_position(mesh, edge_id).ok_or(CollapseRejection::MissingEdge)?;
    if would_cause_flip(mesh, a, b, midpoint) {
        return Err(CollapseRejection::FaceFlip);
    }
    Ok(())
}

/// Collapse an edge to its midpoint after checking it is safe.
pub fn collapse_edge(
    mesh: &mut HalfEdgeMesh,
    edge_id: HalfEdgeId,
) -> Result<CollapseOutcome, CollapseRejection> {
    if let Err(rejection) = can_collapse_edge(mesh, edge_id) {
        trace!("collapse_edge: {:?} rejected: {:?}", edge_id, rejection);
        return Err(rejection);
    }
    let midpoint =
        calculate_collapse_position(mesh, edge_id).ok_or(CollapseRejection::MissingEdge)?;
    mesh.collapse_edge_topology(edge_id, midpoint)
        .ok_or(CollapseRejection::KernelRefused)
}

/// Midpoint of the edge.
pub fn calculate_collapse_position(mesh: &HalfEdgeMesh, edge_id: HalfEdgeId) -> Option<Vec3> {
    let (a, b) = mesh.edge_vertices(edge_id)?;
    Some((mesh.vertex(a)?.position + mesh.vertex(b)?.position) * 0.5)
}

/// Check if moving `a` and `b` to `new_pos` would flip a face.
///
/// Only faces that survive the collapse are checked, that is faces around
/// either endpoint that do not contain both.
pub fn would_cause_flip(mesh: &HalfEdgeMesh, a: VertexId, b: VertexId, new_pos: Vec3) -> bool {
    let mut faces = mesh.get_vertex_faces(a);
    faces.extend(mesh.get_vertex_faces(b));

    for face_id in faces {
        let Some(tri) = mesh.face_triangle(face_id) else {
            continue;
        };
        if tri.contains(&a) && tri.contains(&b) {
            continue;
        }
        let mut before = [Vec3::ZERO; 3];
        let mut after = [Vec3::ZERO; 3];
        for (i, vid) in tri.iter().enumerate() {
            let Some(vertex) = mesh.vertex(*vid) else {
                return true;
            };
            before[i] = vertex.position;
            after[i] = if *vid == a || *vid == b {
                new_pos
            } else {
                vertex.position
            };
        }

        if is_degenerate_triangle(after[0], after[1], after[2]) {
            return true;
        }
        let current_normal = (before[1] - before[0]).cross(before[2] - before[0]);
        let new_normal = (after[1] - after[0]).cross(after[2] - after[0]);
        if current_normal.dot(new_normal) < 0.0 {
            return true;
        }
    }
    false
}

/// Third vertices of the faces on either side of an edge.
fn opposite_vertices(mesh: &HalfEdgeMesh, edge_id: HalfEdgeId) -> Vec<VertexId> {
    let mut opposite = Vec::with_capacity(2);
    let Some(he) = mesh.half_edge(edge_id) else {
        return opposite;
    };
    for side in [Some(edge_id), he.twin].into_iter().flatten() {
        let Some(side) = mesh.half_edge(side) else {
            continue;
        };
        if side.face.is_none() {
            continue;
        }
        if let Some(prev) = mesh.half_edge(side.prev) {
            opposite.push(prev.origin);
        }
    }
    opposite
}
