//! Octree over vertex positions for brush-radius queries.
//!
//! The field builder asks one question per interaction tick: which live
//! vertices lie strictly inside a ball. A full scan is O(V); the octree
//! answers in time proportional to the vertices near the ball.
//!
//! The tree does not follow the mesh on its own. Callers move entries with
//! [`VertexOctree::update`] after a deformation and rebuild after surgery
//! that renumbers vertices.

use glam::Vec3;
use mesh::{HalfEdgeMesh, VertexId};

/// Configuration for octree construction.
#[derive(Debug, Clone)]
pub struct OctreeConfig {
    /// Maximum depth of the octree.
    pub max_depth: u32,
    /// Maximum items per leaf node before splitting.
    pub max_items_per_leaf: usize,
    /// Minimum node size (prevents infinite subdivision).
    pub min_node_size: f32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_items_per_leaf: 16,
            min_node_size: 0.01,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }

    /// Grow by a relative margin plus a small absolute one, so flat meshes
    /// still get a box with volume.
    fn padded(self, relative: f32, absolute: f32) -> Self {
        let padding = self.size() * relative + Vec3::splat(absolute);
        Self::new(self.min - padding, self.max + padding)
    }

    /// Get the octant index for a point (0-7).
    fn octant_for_point(&self, point: Vec3) -> usize {
        let center = self.center();
        (point.x >= center.x) as usize
            | ((point.y >= center.y) as usize) << 1
            | ((point.z >= center.z) as usize) << 2
    }

    /// Get the bounds for a specific octant.
    fn octant_bounds(&self, octant: usize) -> Aabb {
        let center = self.center();
        let pick = |bit: usize, low: f32, mid: f32, high: f32| {
            if octant & bit != 0 { (mid, high) } else { (low, mid) }
        };
        let (x0, x1) = pick(1, self.min.x, center.x, self.max.x);
        let (y0, y1) = pick(2, self.min.y, center.y, self.max.y);
        let (z0, z1) = pick(4, self.min.z, center.z, self.max.z);
        Aabb::new(Vec3::new(x0, y0, z0), Vec3::new(x1, y1, z1))
    }
}

/// An item stored in the octree: vertex ID and position.
#[derive(Debug, Clone, Copy)]
struct OctreeItem {
    vertex_id: VertexId,
    position: Vec3,
}

/// A node in the octree (either internal or leaf).
#[derive(Debug)]
enum OctreeNode {
    Leaf {
        bounds: Aabb,
        items: Vec<OctreeItem>,
    },
    Internal {
        bounds: Aabb,
        children: Box<[Option<OctreeNode>; 8]>,
    },
}

/// A spatial octree over vertex positions.
#[derive(Debug)]
pub struct VertexOctree {
    root: OctreeNode,
    bounds: Aabb,
    config: OctreeConfig,
    len: usize,
}

impl VertexOctree {
    /// Create a new empty octree covering `bounds`.
    pub fn new(bounds: Aabb) -> Self {
        Self::with_config(bounds, OctreeConfig::default())
    }

    /// Create a new octree with custom configuration.
    pub fn with_config(bounds: Aabb, config: OctreeConfig) -> Self {
        Self {
            root: OctreeNode::Leaf {
                bounds,
                items: Vec::new(),
            },
            bounds,
            config,
            len: 0,
        }
    }

    /// Index every live vertex of a mesh. The root box is the mesh bounds
    /// with `margin` added on every side, leaving room for vertices to move.
    pub fn from_mesh(mesh: &HalfEdgeMesh, margin: f32) -> Self {
        let (min, max) = mesh.bounds().unwrap_or((Vec3::ZERO, Vec3::ZERO));
        let bounds = Aabb::new(min - Vec3::splat(margin), max + Vec3::splat(margin))
            .padded(0.01, 0.001);

        let mut octree = Self::new(bounds);
        for v in mesh.live_vertices() {
            octree.insert(v.id, v.position);
        }
        octree
    }

    /// Root bounds. Positions outside are not indexed.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Whether a position can be stored.
    pub fn covers(&self, position: Vec3) -> bool {
        self.bounds.contains_point(position)
    }

    /// Insert a vertex. Returns false if the position lies outside the root bounds.
    pub fn insert(&mut self, vertex_id: VertexId, position: Vec3) -> bool {
        if !self.covers(position) {
            return false;
        }
        let config = self.config.clone();
        Self::insert_into_node(&mut self.root, vertex_id, position, 0, &config);
        self.len += 1;
        true
    }

    fn insert_into_node(
        node: &mut OctreeNode,
        vertex_id: VertexId,
        position: Vec3,
        depth: u32,
        config: &OctreeConfig,
    ) {
        match node {
            OctreeNode::Leaf { bounds, items } => {
                items.push(OctreeItem {
                    vertex_id,
                    position,
                });

                if items.len() > config.max_items_per_leaf
                    && depth < config.max_depth
                    && bounds.size().max_element() > config.min_node_size * 2.0
                {
                    let old_items = std::mem::take(items);
                    let old_bounds = *bounds;
                    *node = OctreeNode::Internal {
                        bounds: old_bounds,
                        children: Box::new([None, None, None, None, None, None, None, None]),
                    };
                    for item in old_items {
                        Self::insert_into_node(node, item.vertex_id, item.position, depth, config);
                    }
                }
            }
            OctreeNode::Internal { bounds, children } => {
                let octant = bounds.octant_for_point(position);
                let child = children[octant].get_or_insert_with(|| OctreeNode::Leaf {
                    bounds: bounds.octant_bounds(octant),
                    items: Vec::new(),
                });
                Self::insert_into_node(child, vertex_id, position, depth + 1, config);
            }
        }
    }

    /// All vertices strictly inside the ball, with their distance to `center`.
    pub fn query_ball(&self, center: Vec3, radius: f32) -> Vec<(VertexId, f32)> {
        let mut results = Vec::new();
        Self::query_ball_node(&self.root, center, radius, &mut results);
        results
    }

    fn query_ball_node(
        node: &OctreeNode,
        center: Vec3,
        radius: f32,
        results: &mut Vec<(VertexId, f32)>,
    ) {
        match node {
            OctreeNode::Leaf { bounds, items } => {
                if !bounds.intersects_sphere(center, radius) {
                    return;
                }
                for item in items {
                    let distance = item.position.distance(center);
                    if distance < radius {
                        results.push((item.vertex_id, distance));
                    }
                }
            }
            OctreeNode::Internal { bounds, children } => {
                if !bounds.intersects_sphere(center, radius) {
                    return;
                }
                for child in children.iter().flatten() {
                    Self::query_ball_node(child, center, radius, results);
                }
            }
        }
    }

    /// Number of indexed vertices.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Move a vertex. Returns false if the new position is outside the root
    /// bounds, in which case the vertex is no longer indexed.
    pub fn update(&mut self, vertex_id: VertexId, old_position: Vec3, new_position: Vec3) -> bool {
        self.remove(vertex_id, old_position);
        self.insert(vertex_id, new_position)
    }

    /// Remove a vertex stored at `position`.
    pub fn remove(&mut self, vertex_id: VertexId, position: Vec3) -> bool {
        let removed = Self::remove_from_node(&mut self.root, vertex_id, position);
        if removed {
            self.len -= 1;
        }
        removed
    }

    fn remove_from_node(node: &mut OctreeNode, vertex_id: VertexId, position: Vec3) -> bool {
        match node {
            OctreeNode::Leaf { bounds, items } => {
                if !bounds.contains_point(position) {
                    return false;
                }
                match items.iter().position(|item| item.vertex_id == vertex_id) {
                    Some(idx) => {
                        items.swap_remove(idx);
                        true
                    }
                    None => false,
                }
            }
            OctreeNode::Internal { bounds, children } => {
                if !bounds.contains_point(position) {
                    return false;
                }
                let octant = bounds.octant_for_point(position);
                children[octant]
                    .as_mut()
                    .is_some_and(|child| Self::remove_from_node(child, vertex_id, position))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_ball_is_strict() {
        let mut octree = VertexOctree::new(Aabb::new(Vec3::ZERO, Vec3::splat(10.0)));
        octree.insert(VertexId(0), Vec3::new(1.0, 1.0, 1.0));
        octree.insert(VertexId(1), Vec3::new(2.0, 1.0, 1.0));
        octree.insert(VertexId(2), Vec3::new(8.0, 8.0, 8.0));
        assert_eq!(octree.len(), 3);

        // Vertex 1 sits exactly on the sphere and is excluded
        let results = octree.query_ball(Vec3::new(1.0, 1.0, 1.0), 1.0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, VertexId(0));
        assert!(results[0].1.abs() < 1e-6);
    }

    #[test]
    fn test_many_items_split_leaves() {
        let mut octree = VertexOctree::new(Aabb::new(Vec3::ZERO, Vec3::splat(10.0)));
        for i in 0..200u32 {
            let t = i as f32 / 20.0;
            octree.insert(VertexId(i), Vec3::new(t, (t * 3.0) % 10.0, 5.0));
        }
        assert_eq!(octree.len(), 200);
        let near: Vec<_> = octree.query_ball(Vec3::new(0.0, 0.0, 5.0), 0.5);
        let expected = (0..200u32)
            .filter(|i| {
                let t = *i as f32 / 20.0;
                Vec3::new(t, (t * 3.0) % 10.0, 5.0).distance(Vec3::new(0.0, 0.0, 5.0)) < 0.5
            })
            .count();
        assert_eq!(near.len(), expected);
    }

    #[test]
    fn test_update_and_out_of_bounds() {
        let mut octree = VertexOctree::new(Aabb::new(Vec3::ZERO, Vec3::splat(10.0)));
        octree.insert(VertexId(0), Vec3::splat(1.0));
        assert!(octree.update(VertexId(0), Vec3::splat(1.0), Vec3::splat(9.0)));
        assert!(octree.query_ball(Vec3::splat(1.0), 0.5).is_empty());
        assert_eq!(octree.query_ball(Vec3::splat(9.0), 0.5).len(), 1);

        assert!(!octree.update(VertexId(0), Vec3::splat(9.0), Vec3::splat(20.0)));
        assert!(octree.is_empty());
    }

    #[test]
    fn test_from_mesh_indexes_live_vertices() {
        let source = mesh::IndexedMesh::triangle_lattice(4, 4, 1.0);
        let mesh = HalfEdgeMesh::from_indexed(&source).unwrap();
        let octree = VertexOctree::from_mesh(&mesh, 0.5);
        assert_eq!(octree.len(), 16);
        // Flat mesh still gets a box with depth
        assert!(octree.bounds().size().z > 0.0);
    }
}
