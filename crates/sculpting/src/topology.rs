//! Joining two vertex neighbourhoods.
//!
//! When a deformation drives two separate parts of the surface into each
//! other, the one-rings around the contact vertices can be zipped together
//! with new triangles. [`TopologicalHandler::join_vertex_rings`] does this on
//! a best-effort basis:
//!
//! - every vertex `u` of the first ring is matched with the two nearest
//!   vertices of the second ring that are not yet used twice;
//! - the triangle `(nearest2, nearest1, u)` is added if the kernel accepts it.
//!
//! The zipper is only expected to be sound for rings of equal size. Unequal
//! rings are reported in [`JoinReport::ring_match`] and processed the same
//! way; the result may leave gaps.
//!
//! Nothing calls this during a sculpting tick. Genus changes surface as
//! [`crate::TopologyOutcome::Unhandled`] and the host decides whether to join.

use mesh::{FaceId, HalfEdgeMesh, VertexId};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::SculptError;

/// Each second-ring vertex joins at most this many new faces
pub const MAX_RING_USES: usize = 2;

/// Whether the two rings have the same number of vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RingMatch {
    #[default]
    Equal,
    Unequal { ring1: usize, ring2: usize },
}

/// What a join did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinReport {
    pub ring_match: RingMatch,
    /// Faces added to the mesh
    pub added: Vec<FaceId>,
    /// Triangles the kernel refused, usually because an edge already
    /// runs in that direction
    pub rejected: Vec<[VertexId; 3]>,
    /// First-ring vertices that found fewer than two free partners
    pub unmatched: Vec<VertexId>,
}

/// Stitches vertex rings together.
#[derive(Debug, Default, Clone, Copy)]
pub struct TopologicalHandler;

impl TopologicalHandler {
    /// Join the one-ring of `v1` to the one-ring of `v2`.
    pub fn join_vertex_rings(
        mesh: &mut HalfEdgeMesh,
        v1: VertexId,
        v2: VertexId,
    ) -> Result<JoinReport, SculptError> {
        for v in [v1, v2] {
            if !mesh.is_vertex_live(v) {
                return Err(SculptError::MissingVertex(v));
            }
        }

        let ring1 = mesh.get_adjacent_vertices(v1);
        let ring2 = mesh.get_adjacent_vertices(v2);
        let mut report = JoinReport::default();
        if ring1.len() != ring2.len() {
            warn!(
                "join_vertex_rings: ring sizes differ ({} around {:?}, {} around {:?}), stitching may leave gaps",
                ring1.len(),
                v1,
                ring2.len(),
                v2
            );
            report.ring_match = RingMatch::Unequal {
                ring1: ring1.len(),
                ring2: ring2.len(),
            };
        }

        let mut uses: HashMap<VertexId, usize> = HashMap::new();
        let mut touched = Vec::new();
        for &u in &ring1 {
            let Some(position) = mesh.vertex(u).map(|v| v.position) else {
                continue;
            };
            let mut free: Vec<(f32, VertexId)> = ring2
                .iter()
                .filter(|w| uses.get(w).copied().unwrap_or(0) < MAX_RING_USES)
                .filter_map(|&w| Some((mesh.vertex(w)?.position.distance(position), w)))
                .collect();
            free.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            let &[(_, nearest1), (_, nearest2), ..] = free.as_slice() else {
                report.unmatched.push(u);
                continue;
            };
            let triangle = [nearest2, nearest1, u];
            match mesh.add_face(triangle) {
                Some(face) => {
                    *uses.entry(nearest1).or_default() += 1;
                    *uses.entry(nearest2).or_default() += 1;
                    report.added.push(face);
                    touched.extend(triangle);
                }
                None => {
                    debug!("join_vertex_rings: kernel refused {:?}", triangle);
                    report.rejected.push(triangle);
                }
            }
        }

        if !touched.is_empty() {
            mesh.recalculate_normals_around(&touched);
        }
        debug!(
            "join_vertex_rings: {:?} + {:?}: {} added, {} rejected, {} unmatched",
            v1,
            v2,
            report.added.len(),
            report.rejected.len(),
            report.unmatched.len()
        );
        Ok(report)
    }
}
