//! Construction methods for HalfEdgeMesh.

use glam::{Vec2, Vec3};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

use super::HalfEdgeMesh;
use super::types::{Corner, FaceId, HalfEdgeError, NO_SOURCE_INDEX, Vertex, VertexId};
use crate::indexed::IndexedMesh;

impl HalfEdgeMesh {
    /// Build a half-edge mesh from an indexed triangle list.
    ///
    /// Positionally identical vertices are welded first (exporters duplicate
    /// vertices along UV seams, which would otherwise turn the seam into a
    /// boundary). Corners of welded vertices remember which duplicate they
    /// used, see [`Corner`]. Triangles that become degenerate after welding are dropped,
    /// and triangles that would give an edge a second face on the same side
    /// are skipped with a warning. Missing normals are computed from faces.
    pub fn from_indexed(source: &IndexedMesh) -> Result<Self, HalfEdgeError> {
        source.validate()?;

        let quantize = |p: &[f32; 3]| -> [i64; 3] {
            [
                (p[0] * 1_000_000.0) as i64,
                (p[1] * 1_000_000.0) as i64,
                (p[2] * 1_000_000.0) as i64,
            ]
        };

        let mut position_to_canonical: HashMap<[i64; 3], usize> = HashMap::new();
        let canonical_map: Vec<usize> = source
            .positions
            .iter()
            .enumerate()
            .map(|(i, pos)| *position_to_canonical.entry(quantize(pos)).or_insert(i))
            .collect();

        let mut welded = vec![false; source.positions.len()];
        for (i, &canonical) in canonical_map.iter().enumerate() {
            if canonical != i {
                welded[canonical] = true;
            }
        }
        let corner = |index: u32| -> Option<Corner> {
            let i = index as usize;
            welded[canonical_map[i]].then(|| Corner {
                source_index: index,
                uv: source.uvs.as_ref().map(|uvs| Vec2::from_array(uvs[i])),
                normal: source.normals.get(i).map(|n| Vec3::from_array(*n)),
            })
        };

        let welded_count = source.positions.len() - position_to_canonical.len();
        if welded_count > 0 {
            debug!(
                "from_indexed: welded {} duplicate vertices ({} unique of {} total)",
                welded_count,
                position_to_canonical.len(),
                source.positions.len()
            );
        }

        let mut mesh = HalfEdgeMesh::new();
        mesh.vertices = source
            .positions
            .iter()
            .enumerate()
            .map(|(i, pos)| Vertex {
                id: VertexId(i as u32),
                position: Vec3::from_array(*pos),
                normal: source
                    .normals
                    .get(i)
                    .map(|n| Vec3::from_array(*n))
                    .unwrap_or(Vec3::ZERO),
                uv: source
                    .uvs
                    .as_ref()
                    .map(|uvs| Vec2::from_array(uvs[i])),
                outgoing_half_edge: None,
                source_index: i as u32,
            })
            .collect();

        let mut degenerate = 0usize;
        let mut rejected = 0usize;
        for (triangle, tri) in source.indices.chunks_exact(3).enumerate() {
            let vertices = [
                VertexId(canonical_map[tri[0] as usize] as u32),
                VertexId(canonical_map[tri[1] as usize] as u32),
                VertexId(canonical_map[tri[2] as usize] as u32),
            ];
            if vertices[0] == vertices[1] || vertices[1] == vertices[2] || vertices[0] == vertices[2]
            {
                degenerate += 1;
                continue;
            }
            let corners = [corner(tri[0]), corner(tri[1]), corner(tri[2])];
            if mesh
                .add_face_with_corners(vertices, source.face_tag(triangle), corners)
                .is_none()
            {
                rejected += 1;
            }
        }

        if degenerate > 0 {
            debug!("from_indexed: dropped {} degenerate triangles", degenerate);
        }
        if rejected > 0 {
            warn!(
                "from_indexed: skipped {} triangles with non-manifold or inconsistently wound edges",
                rejected
            );
        }
        if mesh.faces.is_empty() {
            return Err(HalfEdgeError::InvalidTopology(
                "No usable triangles".to_string(),
            ));
        }

        mesh.compact();
        if source.normals.is_empty() {
            mesh.recalculate_normals();
        } else {
            mesh.recalculate_face_normals();
        }
        Ok(mesh)
    }

    /// Export live elements as an indexed triangle list with shared vertices.
    ///
    /// Every live vertex is written once, in order. A vertex whose face
    /// corners disagree (a welded seam) gets one extra copy per distinct
    /// corner, appended after all vertices, so an untouched import exports
    /// the vertex count it was built from. Tangents are not tracked through
    /// surgery and are left for the renderer to regenerate.
    pub fn to_indexed(&self) -> IndexedMesh {
        let primary_count = self.live_vertices().count();
        let mut slots: HashMap<(VertexId, CornerKey), u32> = HashMap::new();
        let mut positions = Vec::with_capacity(primary_count);
        let mut normals = Vec::with_capacity(primary_count);
        let mut uvs = Vec::with_capacity(primary_count);
        let mut seam_copies: Vec<(Vec3, Vec3, Option<Vec2>)> = Vec::new();

        for v in self.live_vertices() {
            let corners: Vec<(CornerKey, Option<Corner>)> = self
                .outgoing_half_edges(v.id)
                .into_iter()
                .filter_map(|he| self.half_edge(he))
                .map(|he| (CornerKey::of(v, he.corner), he.corner))
                .collect();
            // The vertex's own attributes go in its slot when some corner uses them
            let primary = corners
                .iter()
                .find(|(key, _)| *key == CornerKey::Vertex)
                .or(corners.first())
                .copied()
                .unwrap_or((CornerKey::Vertex, None));

            for (n, (key, corner)) in std::iter::once(primary).chain(corners).enumerate() {
                if slots.contains_key(&(v.id, key)) {
                    continue;
                }
                let (normal, uv) = match (key, corner) {
                    (CornerKey::Vertex, _) | (_, None) => (v.normal, v.uv),
                    (_, Some(c)) => (c.normal.unwrap_or(v.normal), c.uv.or(v.uv)),
                };
                if n == 0 {
                    slots.insert((v.id, key), positions.len() as u32);
                    positions.push(v.position.to_array());
                    normals.push(normal.to_array());
                    uvs.push(uv);
                } else {
                    slots.insert((v.id, key), (primary_count + seam_copies.len()) as u32);
                    seam_copies.push((v.position, normal, uv));
                }
            }
        }
        if !seam_copies.is_empty() {
            trace!("to_indexed: {} seam copies", seam_copies.len());
        }
        for (position, normal, uv) in seam_copies {
            positions.push(position.to_array());
            normals.push(normal.to_array());
            uvs.push(uv);
        }

        let mut indices = Vec::with_capacity(self.faces.len() * 3);
        let mut face_tags = Vec::with_capacity(self.faces.len());
        for face in &self.faces {
            let Some(hes) = self.face_half_edges(face.id) else {
                continue;
            };
            let Some(mapped) = hes
                .iter()
                .map(|&he_id| {
                    let he = self.half_edge(he_id)?;
                    let vertex = self.vertex(he.origin)?;
                    slots.get(&(he.origin, CornerKey::of(vertex, he.corner))).copied()
                })
                .collect::<Option<Vec<u32>>>()
            else {
                continue;
            };
            indices.extend(mapped);
            face_tags.push(face.tag);
        }

        let has_uvs = uvs.iter().any(Option::is_some);
        IndexedMesh {
            positions,
            normals,
            uvs: has_uvs.then(|| {
                uvs.iter()
                    .map(|uv| uv.unwrap_or(Vec2::ZERO).to_array())
                    .collect()
            }),
            tangents: None,
            indices,
            face_tags,
        }
    }

    /// Faces that came from the given imported triangle tag.
    pub fn faces_with_tag(&self, tag: u32) -> Vec<FaceId> {
        self.faces
            .iter()
            .filter(|f| f.tag == tag && self.is_face_live(f.id))
            .map(|f| f.id)
            .collect()
    }
}

/// Which exported copy of a vertex a face corner maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CornerKey {
    /// The vertex's own attributes
    Vertex,
    /// Another imported duplicate of the vertex
    Source(u32),
    /// A corner made by surgery on a seam, keyed by its uv bits
    Uv([u32; 2]),
}

impl CornerKey {
    fn of(vertex: &Vertex, corner: Option<Corner>) -> Self {
        let Some(corner) = corner else {
            return CornerKey::Vertex;
        };
        if corner.source_index == NO_SOURCE_INDEX {
            return match corner.uv {
                Some(uv) if Some(uv) != vertex.uv => CornerKey::Uv(uv.to_array().map(f32::to_bits)),
                _ => CornerKey::Vertex,
            };
        }
        if corner.source_index == vertex.source_index {
            CornerKey::Vertex
        } else {
            CornerKey::Source(corner.source_index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_with_seam() -> IndexedMesh {
        // Vertex 4 duplicates vertex 2, as exporters do along UV seams
        IndexedMesh {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
            ],
            normals: vec![[0.0, 0.0, 1.0]; 5],
            uvs: None,
            tangents: None,
            indices: vec![0, 1, 2, 0, 4, 3],
            face_tags: vec![1, 2],
        }
    }

    #[test]
    fn test_from_indexed_welds_seam() {
        let mesh = HalfEdgeMesh::from_indexed(&quad_with_seam()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        let diagonal = mesh.find_edge(VertexId(0), VertexId(2)).unwrap();
        assert!(!mesh.is_boundary_edge(diagonal));
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_face_tags_survive_import() {
        let mesh = HalfEdgeMesh::from_indexed(&quad_with_seam()).unwrap();
        assert_eq!(mesh.faces_with_tag(1).len(), 1);
        assert_eq!(mesh.faces_with_tag(2).len(), 1);
        assert_eq!(mesh.to_indexed().face_tags, vec![1, 2]);
    }

    #[test]
    fn test_round_trip_counts() {
        let source = IndexedMesh::icosahedron(1.0);
        let mesh = HalfEdgeMesh::from_indexed(&source).unwrap();
        let exported = mesh.to_indexed();
        assert_eq!(exported.positions.len(), source.positions.len());
        assert_eq!(exported.indices.len(), source.indices.len());
        for (a, b) in exported.positions.iter().zip(&source.positions) {
            assert!((Vec3::from_array(*a) - Vec3::from_array(*b)).length() < 1e-6);
        }
    }

    /// Two equilateral triangles sharing edge 1-2. Vertex 3 duplicates
    /// vertex 2 with its own uv and normal, as on a texture seam.
    ///
    /// ```text
    ///     2/3 --- 4
    ///     / \    /
    ///    /   \  /
    ///   0 --- 1
    /// ```
    fn rhombus_with_seam() -> IndexedMesh {
        let h = 3.0_f32.sqrt() / 2.0;
        IndexedMesh {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.5, h, 0.0],
                [0.5, h, 0.0],
                [1.5, h, 0.0],
            ],
            normals: vec![
                [0.0, 0.0, 1.0],
                [0.0, 0.0, 1.0],
                [0.0, 0.0, 1.0],
                [0.0, 0.6, 0.8],
                [0.0, 0.0, 1.0],
            ],
            uvs: Some(vec![[0.0, 0.0], [1.0, 0.0], [0.5, 1.0], [0.9, 0.1], [1.5, 1.0]]),
            tangents: None,
            indices: vec![0, 1, 2, 1, 4, 3],
            face_tags: vec![],
        }
    }

    #[test]
    fn test_seam_round_trip_restores_duplicates() {
        let source = rhombus_with_seam();
        let mesh = HalfEdgeMesh::from_indexed(&source).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        let shared = mesh.find_edge(VertexId(1), VertexId(2)).unwrap();
        assert!(!mesh.is_boundary_edge(shared));

        let out = mesh.to_indexed();
        assert_eq!(out.positions.len(), source.positions.len());
        assert_eq!(out.indices.len(), source.indices.len());
        let uvs = out.uvs.as_ref().unwrap();

        // First triangle still sees the original uv, second the seam copy
        let first = out.indices[2] as usize;
        let second = out.indices[5] as usize;
        assert_ne!(first, second);
        assert_eq!(out.positions[first], out.positions[second]);
        assert_eq!(uvs[first], [0.5, 1.0]);
        assert_eq!(uvs[second], [0.9, 0.1]);
        assert_eq!(out.normals[second], [0.0, 0.6, 0.8]);

        // Re-importing welds the copy again
        let again = HalfEdgeMesh::from_indexed(&out).unwrap();
        assert_eq!(again.vertex_count(), 4);
        assert_eq!(again.to_indexed().positions.len(), 5);
    }

    #[test]
    fn test_split_carries_seam_to_new_vertex() {
        let mut mesh = HalfEdgeMesh::from_indexed(&rhombus_with_seam()).unwrap();
        let shared = mesh.find_edge(VertexId(1), VertexId(2)).unwrap();
        let outcome = mesh
            .split_edge_topology(shared, Vec3::new(0.75, 3.0_f32.sqrt() / 4.0, 0.0))
            .unwrap();
        assert_eq!(outcome.new_faces.len(), 4);
        mesh.compact();

        // 5 vertices, plus one seam copy each for vertex 2 and the new vertex
        let out = mesh.to_indexed();
        assert_eq!(out.positions.len(), 7);
        assert_eq!(out.triangle_count(), 4);
        let uvs = out.uvs.unwrap();
        let near = |target: [f32; 2]| {
            uvs.iter()
                .any(|uv| (Vec2::from_array(*uv) - Vec2::from_array(target)).length() < 1e-6)
        };
        assert!(near([0.75, 0.5]));
        assert!(near([0.95, 0.05]));
    }

    #[test]
    fn test_collapse_keeps_uv_of_merged_corner() {
        let mut mesh = HalfEdgeMesh::from_indexed(&rhombus_with_seam()).unwrap();
        // Merge seam vertex 2 into vertex 3 (imported index 4). The triangle
        // 0-1-2 survives as 0-1-3 and keeps the uv it had at that corner.
        let edge = mesh.find_half_edge(VertexId(3), VertexId(2)).unwrap();
        let position = mesh.vertex(VertexId(2)).unwrap().position;
        let outcome = mesh.collapse_edge_topology(edge, position).unwrap();
        assert_eq!(outcome.survivor, VertexId(3));
        assert_eq!(outcome.new_faces.len(), 1);
        mesh.compact();

        let out = mesh.to_indexed();
        assert_eq!(out.positions.len(), 3);
        assert_eq!(out.indices.len(), 3);
        let uvs = out.uvs.unwrap();
        assert!(uvs.contains(&[0.5, 1.0]));
        assert!(!uvs.contains(&[1.5, 1.0]));
    }

    #[test]
    fn test_non_manifold_triangle_is_skipped() {
        let mut source = quad_with_seam();
        // Same winding as the first triangle on edge 0 -> 1
        source.positions.push([0.5, -1.0, 0.0]);
        source.normals.push([0.0, 0.0, 1.0]);
        source.indices.extend([0, 1, 5]);
        source.face_tags.push(3);
        let mesh = HalfEdgeMesh::from_indexed(&source).unwrap();
        assert_eq!(mesh.face_count(), 2);
        assert!(mesh.check_manifold().is_ok());
    }

    #[test]
    fn test_missing_normals_are_computed() {
        let mut source = quad_with_seam();
        source.normals.clear();
        let mesh = HalfEdgeMesh::from_indexed(&source).unwrap();
        for v in mesh.live_vertices() {
            assert!((v.normal - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(
            HalfEdgeMesh::from_indexed(&IndexedMesh::default()),
            Err(HalfEdgeError::NoPositions)
        ));
    }
}
