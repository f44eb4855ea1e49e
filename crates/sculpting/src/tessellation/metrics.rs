//! Edge length metrics for remesh decisions.
//!
//! Edges are classified against `[minEdgeLength, maxEdgeLength]` with a
//! relative tolerance, so an edge that sits on a bound is left alone instead
//! of flickering between collapse and split because of rounding.

use glam::Vec3;
use mesh::{HalfEdgeId, HalfEdgeMesh};

use crate::params::Parameters;
use crate::tessellation::RemeshDecision;

/// Relative slack applied to both edge length bounds
pub const EDGE_LENGTH_TOLERANCE: f32 = 1e-4;

/// Result of evaluating an edge.
#[derive(Debug, Clone, Copy)]
pub struct EdgeEvaluation {
    pub length: f32,
    pub decision: RemeshDecision,
}

/// Classify an edge length against the parameter bounds.
pub fn evaluate_length(length: f32, params: &Parameters) -> RemeshDecision {
    if length < params.min_edge_length() * (1.0 - EDGE_LENGTH_TOLERANCE) {
        RemeshDecision::Collapse
    } else if length > params.max_edge_length() * (1.0 + EDGE_LENGTH_TOLERANCE) {
        RemeshDecision::Split
    } else {
        RemeshDecision::None
    }
}

/// Evaluate an edge of the mesh. `None` for a removed edge.
pub fn evaluate_edge(
    mesh: &HalfEdgeMesh,
    edge_id: HalfEdgeId,
    params: &Parameters,
) -> Option<EdgeEvaluation> {
    let length = mesh.edge_length(edge_id)?;
    Some(EdgeEvaluation {
        length,
        decision: evaluate_length(length, params),
    })
}

/// Ratio of the longest edge to the shortest altitude, scaled so an
/// equilateral triangle scores 1.0. Degenerate triangles score infinity.
pub fn calculate_triangle_aspect_ratio(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    let doubled_area = (b - a).cross(c - a).length();
    if is_degenerate_triangle(a, b, c) {
        return f32::INFINITY;
    }
    let longest = a.distance(b).max(b.distance(c)).max(c.distance(a));
    let min_altitude = doubled_area / longest;
    longest / min_altitude * (3.0_f32.sqrt() / 2.0)
}

pub fn is_degenerate_triangle(a: Vec3, b: Vec3, c: Vec3) -> bool {
    (b - a).cross(c - a).length_squared() <= f32::EPSILON * f32::EPSILON
}

/// Summary of edge lengths over a whole mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeshQuality {
    pub edge_count: usize,
    pub min_edge_length: f32,
    pub max_edge_length: f32,
    pub mean_edge_length: f32,
    /// Edges that would be collapsed
    pub too_short: usize,
    /// Edges that would be split
    pub too_long: usize,
    pub worst_aspect_ratio: f32,
}

impl MeshQuality {
    /// True when every edge lies within the bounds.
    pub fn is_quasi_uniform(&self) -> bool {
        self.too_short == 0 && self.too_long == 0
    }
}

pub fn calculate_mesh_quality(mesh: &HalfEdgeMesh, params: &Parameters) -> MeshQuality {
    let mut quality = MeshQuality {
        min_edge_length: f32::INFINITY,
        ..Default::default()
    };
    let mut total = 0.0;
    for edge_id in mesh.edges() {
        let Some(eval) = evaluate_edge(mesh, edge_id, params) else {
            continue;
        };
        quality.edge_count += 1;
        total += eval.length;
        quality.min_edge_length = quality.min_edge_length.min(eval.length);
        quality.max_edge_length = quality.max_edge_length.max(eval.length);
        match eval.decision {
            RemeshDecision::Collapse => quality.too_short += 1,
            RemeshDecision::Split => quality.too_long += 1,
            RemeshDecision::None => {}
        }
    }
    if quality.edge_count == 0 {
        quality.min_edge_length = 0.0;
        return quality;
    }
    quality.mean_edge_length = total / quality.edge_count as f32;

    for face in mesh.faces() {
        let Some([a, b, c]) = mesh.face_triangle(face.id) else {
            continue;
        };
        let (Some(a), Some(b), Some(c)) = (mesh.vertex(a), mesh.vertex(b), mesh.vertex(c)) else {
            continue;
        };
        let ratio = calculate_triangle_aspect_ratio(a.position, b.position, c.position);
        quality.worst_aspect_ratio = quality.worst_aspect_ratio.max(ratio);
    }
    quality
}
