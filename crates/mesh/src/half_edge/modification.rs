//! Modification methods for HalfEdgeMesh.
//!
//! Surgery is expressed with two primitives, [`HalfEdgeMesh::add_face`] and
//! [`HalfEdgeMesh::remove_face`]. Both keep `edge_map`, twins and outgoing
//! half-edges consistent, so collapse and split only decide which triangles
//! to replace.

use glam::{Vec2, Vec3};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

use super::HalfEdgeMesh;
use super::types::{
    Corner, Face, FaceId, HalfEdge, HalfEdgeId, NO_SOURCE_INDEX, Vertex, VertexId,
};

/// Result of mesh compaction - maps old IDs to new IDs.
///
/// Removed faces, their half-edges and vertices left without faces stay in
/// the arenas until compaction drops them and renumbers the survivors.
/// Relative order of surviving elements is preserved.
#[derive(Debug, Default)]
pub struct CompactionMap {
    pub vertex_map: HashMap<VertexId, VertexId>,
    pub half_edge_map: HashMap<HalfEdgeId, HalfEdgeId>,
    pub face_map: HashMap<FaceId, FaceId>,
    /// Number of vertex slots dropped
    pub removed_vertices: usize,
    /// Number of face slots dropped
    pub removed_faces: usize,
}

impl CompactionMap {
    /// New id of a vertex, `None` if it was dropped.
    pub fn vertex(&self, old: VertexId) -> Option<VertexId> {
        self.vertex_map.get(&old).copied()
    }

    /// True when every surviving vertex kept its id.
    pub fn vertices_unchanged(&self) -> bool {
        self.removed_vertices == 0
    }
}

/// Outcome of a successful edge collapse.
#[derive(Debug, Clone)]
pub struct CollapseOutcome {
    /// Vertex that absorbed the edge
    pub survivor: VertexId,
    /// Vertex that no longer has faces
    pub removed: VertexId,
    /// Faces rebuilt around the survivor
    pub new_faces: Vec<FaceId>,
}

/// Outcome of a successful edge split.
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    /// Vertex inserted on the edge
    pub vertex: VertexId,
    /// Triangles that replaced the faces adjacent to the edge
    pub new_faces: Vec<FaceId>,
}

/// A face as surgery sees it: enough to remove it and add it back.
#[derive(Debug, Clone, Copy)]
struct FaceRecord {
    triangle: [VertexId; 3],
    tag: u32,
    corners: [Option<Corner>; 3],
}

impl HalfEdgeMesh {
    /// Set the position of a vertex
    pub fn set_vertex_position(&mut self, vertex_id: VertexId, position: Vec3) {
        if let Some(v) = self.vertex_mut(vertex_id) {
            v.position = position;
        }
    }

    /// Add a new vertex to the mesh.
    ///
    /// The vertex is not live until a face references it.
    pub fn add_vertex(&mut self, position: Vec3, normal: Vec3, uv: Option<Vec2>) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Vertex {
            id,
            position,
            normal,
            uv,
            outgoing_half_edge: None,
            source_index: NO_SOURCE_INDEX,
        });
        id
    }

    /// Add a triangle with tag 0. See [`Self::add_face_tagged`].
    pub fn add_face(&mut self, vertices: [VertexId; 3]) -> Option<FaceId> {
        self.add_face_tagged(vertices, 0)
    }

    /// Add a counter-clockwise triangle.
    ///
    /// Returns `None` without touching the mesh if a vertex is repeated or
    /// missing, or if one of the three directed edges already exists (the
    /// edge would end up with two faces on the same side).
    pub fn add_face_tagged(&mut self, vertices: [VertexId; 3], tag: u32) -> Option<FaceId> {
        self.add_face_with_corners(vertices, tag, [None; 3])
    }

    /// Add a counter-clockwise triangle with per-corner attributes.
    ///
    /// `corners[i]` belongs to `vertices[i]`. Refuses the same inputs as
    /// [`Self::add_face_tagged`].
    pub fn add_face_with_corners(
        &mut self,
        vertices: [VertexId; 3],
        tag: u32,
        corners: [Option<Corner>; 3],
    ) -> Option<FaceId> {
        let [a, b, c] = vertices;
        if a == b || b == c || a == c {
            return None;
        }
        if vertices.iter().any(|&v| self.vertex(v).is_none()) {
            return None;
        }
        let directed = [(a, b), (b, c), (c, a)];
        if let Some(existing) = directed.iter().find(|key| self.edge_map.contains_key(key)) {
            trace!(
                "add_face: rejected {:?}, directed edge {:?} already used",
                vertices, existing
            );
            return None;
        }

        let face_id = FaceId(self.faces.len() as u32);
        let base = self.half_edges.len() as u32;
        let ids = [HalfEdgeId(base), HalfEdgeId(base + 1), HalfEdgeId(base + 2)];

        for (i, &(origin, dest)) in directed.iter().enumerate() {
            let twin = self.edge_map.get(&(dest, origin)).copied();
            self.half_edges.push(HalfEdge {
                id: ids[i],
                origin,
                twin,
                next: ids[(i + 1) % 3],
                prev: ids[(i + 2) % 3],
                face: Some(face_id),
                corner: corners[i],
            });
            if let Some(twin_id) = twin {
                self.half_edges[twin_id.0 as usize].twin = Some(ids[i]);
            }
            self.edge_map.insert((origin, dest), ids[i]);

            let vertex = &mut self.vertices[origin.0 as usize];
            if vertex.outgoing_half_edge.is_none() {
                vertex.outgoing_half_edge = Some(ids[i]);
            }
        }

        let normal = self.triangle_normal(vertices);
        self.faces.push(Face {
            id: face_id,
            half_edge: ids[0],
            normal,
            tag,
        });
        Some(face_id)
    }

    /// Remove a face, leaving tombstoned slots until [`Self::compact`].
    ///
    /// Neighbouring half-edges lose their twin (they become boundary) and
    /// vertices whose outgoing half-edge belonged to the face are pointed at a
    /// surviving neighbour, or left without one if the face was their last.
    pub fn remove_face(&mut self, face_id: FaceId) -> bool {
        let Some(hes) = self.face_half_edges(face_id) else {
            return false;
        };

        let twins = hes.map(|he| self.half_edges[he.0 as usize].twin);
        let twin_nexts = twins.map(|t| t.map(|t| self.half_edges[t.0 as usize].next));

        for (i, &he_id) in hes.iter().enumerate() {
            let origin = self.half_edges[he_id.0 as usize].origin;
            let dest = self.half_edges[hes[(i + 1) % 3].0 as usize].origin;
            self.edge_map.remove(&(origin, dest));
            if let Some(twin_id) = twins[i] {
                self.half_edges[twin_id.0 as usize].twin = None;
            }
        }

        for &he_id in &hes {
            let he = &mut self.half_edges[he_id.0 as usize];
            he.face = None;
            he.twin = None;
        }

        for (i, &he_id) in hes.iter().enumerate() {
            let origin = self.half_edges[he_id.0 as usize].origin;
            if self.vertices[origin.0 as usize].outgoing_half_edge != Some(he_id) {
                continue;
            }
            // Outgoing half-edges of `origin` in the two neighbouring faces
            let replacement = twins[(i + 2) % 3].or(twin_nexts[i]);
            self.vertices[origin.0 as usize].outgoing_half_edge = replacement;
        }

        true
    }

    /// Collapse an edge, merging its destination into its origin.
    ///
    /// Faces containing both endpoints disappear; every other face around the
    /// removed vertex is rebuilt on the survivor, which moves to `position`.
    /// Faces inherit their tag. If a rebuilt face cannot be added the mesh is
    /// restored and `None` is returned. Safety (link condition, flips) is the
    /// caller's responsibility.
    pub fn collapse_edge_topology(
        &mut self,
        edge_id: HalfEdgeId,
        position: Vec3,
    ) -> Option<CollapseOutcome> {
        trace!("collapse_edge_topology: START edge_id={:?}", edge_id);
        let (keep, gone) = self.edge_vertices(edge_id)?;

        let mut originals = Vec::new();
        let mut replacements = Vec::new();
        for face_id in self.get_vertex_faces(gone) {
            let record = self.face_record(face_id)?;
            originals.push((face_id, record));
            if record.triangle.contains(&keep) {
                continue;
            }
            let mut rebuilt = record;
            for (vertex, corner) in rebuilt.triangle.iter_mut().zip(&mut rebuilt.corners) {
                if *vertex == gone {
                    *vertex = keep;
                    // Keep the uv the face had at this corner, drop its identity
                    *corner = corner.map(|c| Corner {
                        source_index: NO_SOURCE_INDEX,
                        normal: None,
                        ..c
                    });
                }
            }
            replacements.push(rebuilt);
        }

        let old_position = self.vertices[keep.0 as usize].position;
        self.vertices[keep.0 as usize].position = position;

        for &(face_id, _) in &originals {
            self.remove_face(face_id);
        }

        let mut new_faces = Vec::with_capacity(replacements.len());
        for record in &replacements {
            match self.add_record(record) {
                Some(face_id) => new_faces.push(face_id),
                None => {
                    debug!(
                        "collapse_edge_topology: rebuilding {:?} failed, restoring edge {:?}",
                        record.triangle, edge_id
                    );
                    self.vertices[keep.0 as usize].position = old_position;
                    self.restore_faces(&new_faces, &originals);
                    return None;
                }
            }
        }

        self.vertices[gone.0 as usize].outgoing_half_edge = None;
        self.recalculate_normals_around(&[keep]);

        trace!(
            "collapse_edge_topology: END {:?} -> {:?}, {} faces removed, {} rebuilt",
            gone,
            keep,
            originals.len(),
            new_faces.len()
        );
        Some(CollapseOutcome {
            survivor: keep,
            removed: gone,
            new_faces,
        })
    }

    /// Split an edge at `position`.
    ///
    /// ```text
    ///   interior edge AB             boundary edge AB
    ///
    ///        C                            C
    ///       /|\                          /|\
    ///      / | \                        / | \
    ///     A--M--B        or            A--M--B
    ///      \ | /
    ///       \|/
    ///        D
    /// ```
    ///
    /// For an interior edge the two adjacent triangles form a quad A-D-B-C and
    /// the new vertex M is connected to all four corners. A boundary edge only
    /// has triangle ABC, which becomes AMC and MBC.
    pub fn split_edge_topology(
        &mut self,
        edge_id: HalfEdgeId,
        position: Vec3,
    ) -> Option<SplitOutcome> {
        trace!("split_edge_topology: START edge_id={:?}", edge_id);

        // ===== Gather (read-only, fail early) =====
        let he = self.half_edge(edge_id)?.clone();
        let face_ab = he.face?;
        let (a, b) = self.edge_vertices(edge_id)?;
        let he_next = self.half_edge(he.next)?;
        let he_prev = self.half_edge(he.prev)?;
        let c = he_prev.origin;
        // Corners of A, B and C in face ABC
        let abc = [he.corner, he_next.corner, he_prev.corner];
        let record_ab = self.face_record(face_ab)?;

        let twin_side = match he.twin {
            Some(twin_id) => {
                let twin = self.half_edge(twin_id)?;
                let face_ba = twin.face?;
                let twin_next = self.half_edge(twin.next)?;
                let twin_prev = self.half_edge(twin.prev)?;
                // Corners of B, A and D in face BAD
                let bad = [twin.corner, twin_next.corner, twin_prev.corner];
                Some((face_ba, twin_prev.origin, bad, self.face_record(face_ba)?))
            }
            None => None,
        };

        let va = self.vertex(a)?;
        let vb = self.vertex(b)?;
        let normal = (va.normal + vb.normal).normalize_or_zero();
        let (uv_a, uv_b) = (va.uv, vb.uv);
        let uv = match (uv_a, uv_b) {
            (Some(ua), Some(ub)) => Some(ua.lerp(ub, 0.5)),
            _ => None,
        };

        let mut originals = vec![(face_ab, record_ab)];
        let mut replacements = Vec::with_capacity(4);

        // ===== Mutate =====
        let m = self.add_vertex(position, normal, uv);
        let m_abc = midpoint_corner((abc[0], uv_a), (abc[1], uv_b));
        let tag_ab = record_ab.tag;
        replacements.push(FaceRecord {
            triangle: [a, m, c],
            tag: tag_ab,
            corners: [abc[0], m_abc, abc[2]],
        });
        replacements.push(FaceRecord {
            triangle: [m, b, c],
            tag: tag_ab,
            corners: [m_abc, abc[1], abc[2]],
        });
        if let Some((face_ba, d, bad, record_ba)) = twin_side {
            let m_bad = midpoint_corner((bad[0], uv_b), (bad[1], uv_a));
            originals.push((face_ba, record_ba));
            replacements.push(FaceRecord {
                triangle: [b, m, d],
                tag: record_ba.tag,
                corners: [bad[0], m_bad, bad[2]],
            });
            replacements.push(FaceRecord {
                triangle: [m, a, d],
                tag: record_ba.tag,
                corners: [m_bad, bad[1], bad[2]],
            });
        }

        for &(face_id, _) in &originals {
            self.remove_face(face_id);
        }

        let mut new_faces = Vec::with_capacity(replacements.len());
        for record in &replacements {
            match self.add_record(record) {
                Some(face_id) => new_faces.push(face_id),
                None => {
                    debug!(
                        "split_edge_topology: adding {:?} failed, restoring edge {:?}",
                        record.triangle, edge_id
                    );
                    self.restore_faces(&new_faces, &originals);
                    return None;
                }
            }
        }

        self.recalculate_normals_around(&[m]);
        trace!(
            "split_edge_topology: END new vertex {:?}, {} faces",
            m,
            new_faces.len()
        );
        Some(SplitOutcome {
            vertex: m,
            new_faces,
        })
    }

    fn face_record(&self, face_id: FaceId) -> Option<FaceRecord> {
        let hes = self.face_half_edges(face_id)?;
        let triangle = self.face_triangle(face_id)?;
        Some(FaceRecord {
            triangle,
            tag: self.face(face_id)?.tag,
            corners: hes.map(|he| self.half_edges[he.0 as usize].corner),
        })
    }

    fn add_record(&mut self, record: &FaceRecord) -> Option<FaceId> {
        self.add_face_with_corners(record.triangle, record.tag, record.corners)
    }

    /// Undo a partially applied surgery step.
    fn restore_faces(&mut self, added: &[FaceId], originals: &[(FaceId, FaceRecord)]) {
        for &face_id in added {
            self.remove_face(face_id);
        }
        for (_, record) in originals {
            if self.add_record(record).is_none() {
                debug!("restore_faces: could not restore {:?}", record.triangle);
            }
        }
    }

    // ========================================================================
    // Normals
    // ========================================================================

    pub(crate) fn triangle_normal(&self, [a, b, c]: [VertexId; 3]) -> Vec3 {
        let p0 = self.vertices[a.0 as usize].position;
        let p1 = self.vertices[b.0 as usize].position;
        let p2 = self.vertices[c.0 as usize].position;
        (p1 - p0).cross(p2 - p0).normalize_or_zero()
    }

    /// Update face normals after vertex positions change
    pub fn recalculate_face_normals(&mut self) {
        for i in 0..self.faces.len() {
            if let Some(tri) = self.face_triangle(FaceId(i as u32)) {
                self.faces[i].normal = self.triangle_normal(tri);
            }
        }
    }

    /// Recalculate vertex normals from adjacent face normals
    pub fn recalculate_vertex_normals(&mut self) {
        for i in 0..self.vertices.len() {
            self.update_vertex_normal(VertexId(i as u32));
        }
    }

    /// Recalculate all face normals, then all vertex normals.
    pub fn recalculate_normals(&mut self) {
        self.recalculate_face_normals();
        self.recalculate_vertex_normals();
    }

    /// Recalculate normals touched by moving the given vertices: their faces,
    /// and the vertex normals of every corner of those faces.
    pub fn recalculate_normals_around(&mut self, vertices: &[VertexId]) {
        let mut faces: HashSet<FaceId> = HashSet::new();
        for &v in vertices {
            faces.extend(self.get_vertex_faces(v));
        }

        let mut corners: HashSet<VertexId> = HashSet::new();
        for &face_id in &faces {
            if let Some(tri) = self.face_triangle(face_id) {
                self.faces[face_id.0 as usize].normal = self.triangle_normal(tri);
                corners.extend(tri);
            }
        }

        for v in corners {
            self.update_vertex_normal(v);
        }
    }

    /// Smooth normal from the adjacent faces. Imported corner normals of the
    /// vertex no longer describe the surface and are dropped.
    fn update_vertex_normal(&mut self, vertex_id: VertexId) {
        let faces = self.get_vertex_faces(vertex_id);
        if faces.is_empty() {
            return;
        }
        let normal: Vec3 = faces
            .iter()
            .filter_map(|f| self.face(*f))
            .map(|f| f.normal)
            .sum();
        self.vertices[vertex_id.0 as usize].normal = normal.normalize_or_zero();

        for he in self.outgoing_half_edges(vertex_id) {
            if let Some(corner) = self.half_edges[he.0 as usize].corner.as_mut() {
                corner.normal = None;
            }
        }
    }

    // ========================================================================
    // Compaction
    // ========================================================================

    /// Remove dead faces, half-edges, and vertices from arrays and remap all IDs.
    ///
    /// Liveness follows reachability: live faces own live half-edges, and a
    /// vertex survives iff some live half-edge starts at it. Every handle held
    /// from before the call is invalid afterwards unless translated through the
    /// returned map.
    pub fn compact(&mut self) -> CompactionMap {
        debug!(
            "compact: START ({} verts, {} half-edges, {} faces)",
            self.vertices.len(),
            self.half_edges.len(),
            self.faces.len()
        );

        let live_faces: Vec<bool> = (0..self.faces.len())
            .map(|i| self.is_face_live(FaceId(i as u32)))
            .collect();
        let live_half_edges: Vec<bool> = self
            .half_edges
            .iter()
            .map(|he| he.face.is_some_and(|f| live_faces[f.0 as usize]))
            .collect();
        let mut live_vertices = vec![false; self.vertices.len()];
        for (he, _) in self
            .half_edges
            .iter()
            .zip(&live_half_edges)
            .filter(|(_, live)| **live)
        {
            live_vertices[he.origin.0 as usize] = true;
        }

        let vertex_map = renumber(&live_vertices, VertexId);
        let half_edge_map = renumber(&live_half_edges, HalfEdgeId);
        let face_map = renumber(&live_faces, FaceId);

        let removed_vertices = self.vertices.len() - vertex_map.len();
        let removed_half_edges = self.half_edges.len() - half_edge_map.len();
        let removed_faces = self.faces.len() - face_map.len();

        let outgoing_is_live = self.vertices.iter().all(|v| {
            v.outgoing_half_edge
                .is_none_or(|he| live_half_edges[he.0 as usize])
        });
        if removed_vertices == 0 && removed_half_edges == 0 && removed_faces == 0 && outgoing_is_live
        {
            return CompactionMap {
                vertex_map,
                half_edge_map,
                face_map,
                removed_vertices,
                removed_faces,
            };
        }

        trace!(
            "compact: removing {} vertices, {} half-edges, {} faces",
            removed_vertices, removed_half_edges, removed_faces
        );

        let mut new_vertices: Vec<Vertex> = Vec::with_capacity(vertex_map.len());
        for v in &self.vertices {
            let Some(&new_id) = vertex_map.get(&v.id) else {
                continue;
            };
            new_vertices.push(Vertex {
                id: new_id,
                outgoing_half_edge: v
                    .outgoing_half_edge
                    .and_then(|he| half_edge_map.get(&he).copied()),
                ..v.clone()
            });
        }

        let mut new_half_edges: Vec<HalfEdge> = Vec::with_capacity(half_edge_map.len());
        for he in &self.half_edges {
            let Some(&new_id) = half_edge_map.get(&he.id) else {
                continue;
            };
            // Live half-edges only reference live elements
            let (Some(&origin), Some(&next), Some(&prev)) = (
                vertex_map.get(&he.origin),
                half_edge_map.get(&he.next),
                half_edge_map.get(&he.prev),
            ) else {
                continue;
            };
            new_half_edges.push(HalfEdge {
                id: new_id,
                origin,
                twin: he.twin.and_then(|t| half_edge_map.get(&t).copied()),
                next,
                prev,
                face: he.face.and_then(|f| face_map.get(&f).copied()),
                corner: he.corner,
            });
        }

        let mut new_faces: Vec<Face> = Vec::with_capacity(face_map.len());
        for f in &self.faces {
            let (Some(&new_id), Some(&half_edge)) =
                (face_map.get(&f.id), half_edge_map.get(&f.half_edge))
            else {
                continue;
            };
            new_faces.push(Face {
                id: new_id,
                half_edge,
                normal: f.normal,
                tag: f.tag,
            });
        }

        let mut new_edge_map = HashMap::with_capacity(new_half_edges.len());
        for he in &new_half_edges {
            let dest = new_half_edges[he.next.0 as usize].origin;
            new_edge_map.insert((he.origin, dest), he.id);
        }

        self.vertices = new_vertices;
        self.half_edges = new_half_edges;
        self.faces = new_faces;
        self.edge_map = new_edge_map;

        // Vertices whose outgoing half-edge died while they kept other faces
        for i in 0..self.half_edges.len() {
            let origin = self.half_edges[i].origin;
            let vertex = &mut self.vertices[origin.0 as usize];
            if vertex.outgoing_half_edge.is_none() {
                vertex.outgoing_half_edge = Some(HalfEdgeId(i as u32));
            }
        }

        debug!(
            "compact: END ({} vertices, {} half-edges, {} faces)",
            self.vertices.len(),
            self.half_edges.len(),
            self.faces.len()
        );

        CompactionMap {
            vertex_map,
            half_edge_map,
            face_map,
            removed_vertices,
            removed_faces,
        }
    }
}

/// Corner for a vertex inserted halfway along an edge, from the corners of
/// the edge's endpoints in one face and the endpoints' vertex uvs.
///
/// `None` when neither endpoint carries corner attributes in that face.
fn midpoint_corner(
    (a, a_uv): (Option<Corner>, Option<Vec2>),
    (b, b_uv): (Option<Corner>, Option<Vec2>),
) -> Option<Corner> {
    if a.is_none() && b.is_none() {
        return None;
    }
    let uv = match (a.and_then(|c| c.uv).or(a_uv), b.and_then(|c| c.uv).or(b_uv)) {
        (Some(ua), Some(ub)) => Some(ua.lerp(ub, 0.5)),
        _ => None,
    };
    Some(Corner {
        source_index: NO_SOURCE_INDEX,
        uv,
        normal: None,
    })
}

/// Order-preserving renumbering of the live slots of an arena.
fn renumber<T: std::hash::Hash + Eq>(live: &[bool], id: fn(u32) -> T) -> HashMap<T, T> {
    let mut map = HashMap::with_capacity(live.len());
    let mut next = 0u32;
    for (i, &is_live) in live.iter().enumerate() {
        if is_live {
            map.insert(id(i as u32), id(next));
            next += 1;
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::super::test_meshes::*;
    use super::*;

    #[test]
    fn test_add_face_rejects_duplicate_directed_edge() {
        let mut mesh = quad();
        // 0 -> 1 is already used by the first triangle
        let extra = mesh.add_vertex(Vec3::new(0.5, -1.0, 0.0), Vec3::Z, None);
        assert!(mesh.add_face([VertexId(0), VertexId(1), extra]).is_none());
        // Opposite winding is fine and pairs with the existing boundary edge
        let face = mesh.add_face([VertexId(1), VertexId(0), extra]);
        assert!(face.is_some());
        let edge = mesh.find_edge(VertexId(0), VertexId(1)).unwrap();
        assert!(!mesh.is_boundary_edge(edge));
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_remove_face_tombstones_and_repairs() {
        let mut mesh = quad();
        let face = FaceId(0);
        assert!(mesh.remove_face(face));
        assert!(!mesh.is_face_live(face));
        assert!(!mesh.remove_face(face));

        // Vertex 1 only belonged to the removed face
        assert!(!mesh.is_vertex_live(VertexId(1)));
        assert!(mesh.is_vertex_live(VertexId(0)));
        let diagonal = mesh.find_edge(VertexId(0), VertexId(2)).unwrap();
        assert!(mesh.is_boundary_edge(diagonal));
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_split_interior_edge() {
        let mut mesh = quad();
        let diagonal = mesh.find_edge(VertexId(0), VertexId(2)).unwrap();
        let outcome = mesh
            .split_edge_topology(diagonal, Vec3::new(0.5, 0.5, 0.0))
            .unwrap();
        assert_eq!(outcome.new_faces.len(), 4);
        assert_eq!(mesh.valence(outcome.vertex), 4);

        mesh.compact();
        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(mesh.face_count(), 4);
        assert_eq!(mesh.edge_count(), 8);
        assert!(mesh.validate().is_ok());
        assert!(mesh.check_manifold().is_ok());
    }

    #[test]
    fn test_split_boundary_edge() {
        let mut mesh = quad();
        let bottom = mesh.find_edge(VertexId(0), VertexId(1)).unwrap();
        let outcome = mesh
            .split_edge_topology(bottom, Vec3::new(0.5, 0.0, 0.0))
            .unwrap();
        assert_eq!(outcome.new_faces.len(), 2);
        assert!(mesh.is_boundary_vertex(outcome.vertex));

        mesh.compact();
        assert_eq!(mesh.face_count(), 3);
        assert_eq!(mesh.edge_count(), 7);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_split_keeps_face_tags() {
        let mut mesh = HalfEdgeMesh::new();
        let v: Vec<VertexId> = [Vec3::ZERO, Vec3::X, Vec3::Y]
            .into_iter()
            .map(|p| mesh.add_vertex(p, Vec3::Z, None))
            .collect();
        mesh.add_face_tagged([v[0], v[1], v[2]], 7).unwrap();
        let edge = mesh.find_edge(v[0], v[1]).unwrap();
        let outcome = mesh.split_edge_topology(edge, Vec3::X * 0.5).unwrap();
        for face in outcome.new_faces {
            assert_eq!(mesh.face(face).unwrap().tag, 7);
        }
    }

    #[test]
    fn test_collapse_interior_edge() {
        let mut mesh = hexagon_fan();
        let spoke = mesh.find_edge(VertexId(0), VertexId(1)).unwrap();
        let (keep, gone) = mesh.edge_vertices(spoke).unwrap();
        let midpoint = mesh.vertex(keep).unwrap().position.lerp(mesh.vertex(gone).unwrap().position, 0.5);

        let outcome = mesh.collapse_edge_topology(spoke, midpoint).unwrap();
        assert_eq!(outcome.survivor, keep);
        assert!(!mesh.is_vertex_live(gone));
        assert!((mesh.vertex(keep).unwrap().position - midpoint).length() < 1e-6);

        let map = mesh.compact();
        assert_eq!(map.removed_vertices, 1);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.face_count(), 4);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_compact_preserves_order() {
        let mut mesh = quad();
        mesh.remove_face(FaceId(0));
        let map = mesh.compact();
        assert_eq!(map.vertex(VertexId(0)), Some(VertexId(0)));
        assert_eq!(map.vertex(VertexId(1)), None);
        assert_eq!(map.vertex(VertexId(2)), Some(VertexId(1)));
        assert_eq!(map.vertex(VertexId(3)), Some(VertexId(2)));
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.edge_count(), 3);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_compact_without_changes_is_identity() {
        let mut mesh = quad();
        let map = mesh.compact();
        assert!(map.vertices_unchanged());
        assert_eq!(map.removed_faces, 0);
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn test_normals_follow_winding() {
        let mut mesh = quad();
        mesh.recalculate_normals();
        for v in mesh.live_vertices() {
            assert!((v.normal - Vec3::Z).length() < 1e-6);
        }
    }
}
