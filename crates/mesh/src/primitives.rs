//! Procedural meshes.
//!
//! The lattice and the icosahedron have every edge the same length, which
//! makes them convenient starting surfaces for a remesher driven by
//! edge-length bounds. The quad and the fan are the smallest patches with a
//! shared diagonal and an interior vertex.

use glam::Vec3;

use crate::indexed::IndexedMesh;

impl IndexedMesh {
    /// Flat patch of equilateral triangles in the XY plane, facing +Z.
    ///
    /// Vertex `(i, j)` sits at `x = (i + 0.5 * (j % 2)) * spacing`,
    /// `y = j * spacing * sqrt(3) / 2` and has index `j * cols + i`.
    ///
    /// ```text
    ///   j=2   o---o---o
    ///          \ / \ / \
    ///   j=1     o---o---o
    ///          / \ / \ /
    ///   j=0   o---o---o
    /// ```
    pub fn triangle_lattice(cols: u32, rows: u32, spacing: f32) -> Self {
        let row_height = spacing * 3.0_f32.sqrt() / 2.0;
        let width = (cols.max(1) as f32 - 0.5) * spacing;
        let height = (rows.max(2) - 1) as f32 * row_height;

        let mut positions = Vec::with_capacity((cols * rows) as usize);
        let mut uvs = Vec::with_capacity((cols * rows) as usize);
        for j in 0..rows {
            for i in 0..cols {
                let x = (i as f32 + 0.5 * (j % 2) as f32) * spacing;
                let y = j as f32 * row_height;
                positions.push([x, y, 0.0]);
                uvs.push([x / width, y / height]);
            }
        }

        let index = |i: u32, j: u32| j * cols + i;
        let mut indices = Vec::new();
        for j in 0..rows.saturating_sub(1) {
            for i in 0..cols.saturating_sub(1) {
                if j % 2 == 0 {
                    indices.extend([index(i, j), index(i + 1, j), index(i, j + 1)]);
                    indices.extend([index(i + 1, j), index(i + 1, j + 1), index(i, j + 1)]);
                } else {
                    indices.extend([index(i, j), index(i + 1, j + 1), index(i, j + 1)]);
                    indices.extend([index(i, j), index(i + 1, j), index(i + 1, j + 1)]);
                }
            }
        }

        let vertex_count = positions.len();
        IndexedMesh {
            positions,
            normals: vec![[0.0, 0.0, 1.0]; vertex_count],
            uvs: Some(uvs),
            tangents: None,
            indices,
            face_tags: Vec::new(),
        }
    }

    /// Two triangles sharing the diagonal 0-2 of a unit square, facing +Z.
    ///
    /// ```text
    ///   3 ----- 2
    ///   |     / |
    ///   |   /   |
    ///   | /     |
    ///   0 ----- 1
    /// ```
    pub fn quad() -> Self {
        let positions = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let uvs = positions.iter().map(|p| [p[0], p[1]]).collect();
        IndexedMesh {
            positions,
            normals: vec![[0.0, 0.0, 1.0]; 4],
            uvs: Some(uvs),
            tangents: None,
            indices: vec![0, 1, 2, 0, 2, 3],
            face_tags: Vec::new(),
        }
    }

    /// Six unit triangles around vertex 0, facing +Z. Ring vertex `i` sits
    /// at angle `i * 60` degrees.
    pub fn hexagon_fan() -> Self {
        let mut positions = vec![[0.0, 0.0, 0.0]];
        positions.extend((0..6).map(|i| {
            let angle = i as f32 * std::f32::consts::TAU / 6.0;
            [angle.cos(), angle.sin(), 0.0]
        }));
        let uvs = positions
            .iter()
            .map(|p| [0.5 + 0.5 * p[0], 0.5 + 0.5 * p[1]])
            .collect();
        let indices = (0..6u32).flat_map(|i| [0, i + 1, (i + 1) % 6 + 1]).collect();
        IndexedMesh {
            positions,
            normals: vec![[0.0, 0.0, 1.0]; 7],
            uvs: Some(uvs),
            tangents: None,
            indices,
            face_tags: Vec::new(),
        }
    }

    /// Regular icosahedron centred at the origin, wound outward.
    ///
    /// Edge length is about `1.0515 * radius`.
    pub fn icosahedron(radius: f32) -> Self {
        let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let corners = [
            Vec3::new(-1.0, phi, 0.0),
            Vec3::new(1.0, phi, 0.0),
            Vec3::new(-1.0, -phi, 0.0),
            Vec3::new(1.0, -phi, 0.0),
            Vec3::new(0.0, -1.0, phi),
            Vec3::new(0.0, 1.0, phi),
            Vec3::new(0.0, -1.0, -phi),
            Vec3::new(0.0, 1.0, -phi),
            Vec3::new(phi, 0.0, -1.0),
            Vec3::new(phi, 0.0, 1.0),
            Vec3::new(-phi, 0.0, -1.0),
            Vec3::new(-phi, 0.0, 1.0),
        ];
        let normals: Vec<[f32; 3]> = corners.iter().map(|c| c.normalize().to_array()).collect();
        let positions: Vec<[f32; 3]> = corners
            .iter()
            .map(|c| (c.normalize() * radius).to_array())
            .collect();

        #[rustfmt::skip]
        let indices = vec![
            0, 11, 5,   0, 5, 1,    0, 1, 7,    0, 7, 10,   0, 10, 11,
            1, 5, 9,    5, 11, 4,   11, 10, 2,  10, 7, 6,   7, 1, 8,
            3, 9, 4,    3, 4, 2,    3, 2, 6,    3, 6, 8,    3, 8, 9,
            4, 9, 5,    2, 4, 11,   6, 2, 10,   8, 6, 7,    9, 8, 1,
        ];

        IndexedMesh {
            positions,
            normals,
            uvs: None,
            tangents: None,
            indices,
            face_tags: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::half_edge::{HalfEdgeMesh, VertexId};

    #[test]
    fn test_small_patches() {
        let quad = HalfEdgeMesh::from_indexed(&IndexedMesh::quad()).unwrap();
        assert_eq!(quad.vertex_count(), 4);
        assert_eq!(quad.edge_count(), 5);

        let fan = HalfEdgeMesh::from_indexed(&IndexedMesh::hexagon_fan()).unwrap();
        assert_eq!(fan.face_count(), 6);
        assert_eq!(fan.valence(VertexId(0)), 6);
        assert!(!fan.is_boundary_vertex(VertexId(0)));
        for edge in fan.edges() {
            assert!((fan.edge_length(edge).unwrap() - 1.0).abs() < 1e-5);
        }
        for face in fan.faces() {
            assert!((face.normal - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_lattice_edges_are_uniform() {
        let source = IndexedMesh::triangle_lattice(5, 4, 1.0);
        assert!(source.validate().is_ok());
        assert_eq!(source.triangle_count(), 2 * 4 * 3);

        let mesh = HalfEdgeMesh::from_indexed(&source).unwrap();
        for edge in mesh.edges() {
            assert!((mesh.edge_length(edge).unwrap() - 1.0).abs() < 1e-5);
        }
        assert!(mesh.check_manifold().is_ok());
        for face in mesh.faces() {
            assert!(face.normal.z > 0.99);
        }
    }

    #[test]
    fn test_icosahedron_is_closed() {
        let mesh = HalfEdgeMesh::from_indexed(&IndexedMesh::icosahedron(1.0)).unwrap();
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.face_count(), 20);
        assert_eq!(mesh.edge_count(), 30);
        for v in mesh.live_vertices() {
            assert!(!mesh.is_boundary_vertex(v.id));
            assert_eq!(mesh.valence(v.id), 5);
            // Outward winding
            assert!(v.normal.dot(v.position) > 0.0);
        }
        assert!(mesh.check_manifold().is_ok());
    }
}
