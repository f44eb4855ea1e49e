//! Influence field: the part of the mesh one brush tick acts on.
//!
//! The field is a ball query in embedding space. Vertices strictly closer
//! than `radius` to the pick point are in; the closest of them is the center;
//! an edge is in when both endpoints are. Vertices that are close in space but
//! far along the surface (a nearby fold) are included too.
//!
//! Handles in a field are only valid until the mesh is next remeshed.

use std::collections::{HashMap, HashSet};

use glam::Vec3;
use mesh::{HalfEdgeId, HalfEdgeMesh, VertexId};
use sculpt_config::FieldQuery;
use tracing::{debug, trace};

use crate::spatial::VertexOctree;

/// A vertex inside the field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldVertex {
    pub vertex: VertexId,
    /// Distance to the pick point
    pub distance: f32,
}

/// Vertices and edges affected by one brush tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfluenceField {
    /// Field vertices in vertex id order
    pub vertices: Vec<FieldVertex>,
    /// Canonical edges with both endpoints in the field, in id order
    pub edges: Vec<HalfEdgeId>,
    /// Closest field vertex to the pick point
    pub center: Option<VertexId>,
    pub pick_point: Vec3,
    pub radius: f32,
}

impl InfluenceField {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn contains(&self, vertex: VertexId) -> bool {
        self.vertices
            .binary_search_by_key(&vertex, |fv| fv.vertex)
            .is_ok()
    }

    /// Distance of a field vertex to the pick point
    pub fn distance(&self, vertex: VertexId) -> Option<f32> {
        self.vertices
            .binary_search_by_key(&vertex, |fv| fv.vertex)
            .ok()
            .map(|i| self.vertices[i].distance)
    }

    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertices.iter().map(|fv| fv.vertex).collect()
    }

    /// Assemble a field from ball-query hits.
    fn from_hits(
        mut vertices: Vec<FieldVertex>,
        edges: Vec<HalfEdgeId>,
        pick_point: Vec3,
        radius: f32,
    ) -> Self {
        vertices.sort_by_key(|fv| fv.vertex);
        let center = vertices
            .iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
            .map(|fv| fv.vertex);
        Self {
            vertices,
            edges,
            center,
            pick_point,
            radius,
        }
    }
}

/// Field by full scan: every vertex, then every edge. O(V + E).
pub fn build_field_linear(mesh: &HalfEdgeMesh, pick_point: Vec3, radius: f32) -> InfluenceField {
    let vertices: Vec<FieldVertex> = mesh
        .live_vertices()
        .filter_map(|v| {
            let distance = v.position.distance(pick_point);
            (distance < radius).then_some(FieldVertex {
                vertex: v.id,
                distance,
            })
        })
        .collect();

    let in_field: HashSet<VertexId> = vertices.iter().map(|fv| fv.vertex).collect();
    let edges = mesh
        .edges()
        .into_iter()
        .filter(|&e| {
            mesh.edge_vertices(e)
                .is_some_and(|(a, b)| in_field.contains(&a) && in_field.contains(&b))
        })
        .collect();

    InfluenceField::from_hits(vertices, edges, pick_point, radius)
}

/// Field from an octree. Edges come from the rings of the field vertices.
pub fn build_field_indexed(
    mesh: &HalfEdgeMesh,
    octree: &VertexOctree,
    pick_point: Vec3,
    radius: f32,
) -> InfluenceField {
    let vertices: Vec<FieldVertex> = octree
        .query_ball(pick_point, radius)
        .into_iter()
        .filter(|&(v, _)| mesh.is_vertex_live(v))
        .map(|(vertex, distance)| FieldVertex { vertex, distance })
        .collect();

    let in_field: HashSet<VertexId> = vertices.iter().map(|fv| fv.vertex).collect();
    let mut edges: Vec<HalfEdgeId> = Vec::new();
    for fv in &vertices {
        for he in mesh.outgoing_half_edges(fv.vertex) {
            let Some((a, b)) = mesh.edge_vertices(he) else {
                continue;
            };
            if in_field.contains(&a) && in_field.contains(&b) {
                edges.push(mesh.canonical_edge(he));
            }
            // Incoming boundary half-edge has no outgoing twin at this vertex
            let Some(prev) = mesh.half_edge(he).map(|h| h.prev) else {
                continue;
            };
            if mesh.is_boundary_edge(prev)
                && mesh
                    .edge_vertices(prev)
                    .is_some_and(|(a, b)| in_field.contains(&a) && in_field.contains(&b))
            {
                edges.push(prev);
            }
        }
    }
    edges.sort();
    edges.dedup();

    InfluenceField::from_hits(vertices, edges, pick_point, radius)
}

/// Builds influence fields with the configured strategy.
///
/// The octree is built on first use and kept in step with the mesh: moved
/// vertices are re-inserted, vertices added by splits are inserted, and any
/// renumbering (collapses) or escape from the indexed box drops the tree so
/// the next query rebuilds it.
#[derive(Debug)]
pub struct FieldBuilder {
    query: FieldQuery,
    octree: Option<VertexOctree>,
    /// Vertex slots present when the octree was last synced
    indexed_vertex_count: usize,
    rebuilds: usize,
}

impl FieldBuilder {
    pub fn new(query: FieldQuery) -> Self {
        Self {
            query,
            octree: None,
            indexed_vertex_count: 0,
            rebuilds: 0,
        }
    }

    pub fn query(&self) -> FieldQuery {
        self.query
    }

    /// Number of times the octree has been (re)built
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    pub fn is_indexed(&self) -> bool {
        self.octree.is_some()
    }

    /// Gather the field around `pick_point`.
    pub fn build(&mut self, mesh: &HalfEdgeMesh, pick_point: Vec3, radius: f32) -> InfluenceField {
        let field = match self.query {
            FieldQuery::LinearScan => build_field_linear(mesh, pick_point, radius),
            FieldQuery::Octree => {
                let octree = self.octree_for(mesh);
                build_field_indexed(mesh, octree, pick_point, radius)
            }
        };
        trace!(
            "FieldBuilder::build: {} vertices, {} edges, center={:?}",
            field.vertices.len(),
            field.edges.len(),
            field.center
        );
        field
    }

    fn octree_for(&mut self, mesh: &HalfEdgeMesh) -> &VertexOctree {
        if self.octree.is_none() {
            self.indexed_vertex_count = mesh.vertex_count();
            self.rebuilds += 1;
            debug!(
                "FieldBuilder: rebuilding octree over {} vertices",
                mesh.vertex_count()
            );
        }
        self.octree.get_or_insert_with(|| {
            let margin = mesh
                .bounds()
                .map(|(min, max)| (max - min).length() * 0.25)
                .unwrap_or(0.0);
            VertexOctree::from_mesh(mesh, margin)
        })
    }

    /// Drop the index; the next query rebuilds it.
    pub fn invalidate(&mut self) {
        self.octree = None;
    }

    /// Re-index vertices moved by a deformation.
    pub fn track_displacements(
        &mut self,
        mesh: &HalfEdgeMesh,
        original_positions: &HashMap<VertexId, Vec3>,
    ) {
        let Some(octree) = self.octree.as_mut() else {
            return;
        };
        for (&vertex, &old_position) in original_positions {
            let Some(new_position) = mesh.vertex(vertex).map(|v| v.position) else {
                continue;
            };
            if !octree.update(vertex, old_position, new_position) {
                debug!("FieldBuilder: {:?} left the indexed bounds", vertex);
                self.octree = None;
                return;
            }
        }
    }

    /// Bring the index in line after a remesh pass.
    pub fn track_remesh(&mut self, mesh: &HalfEdgeMesh, vertices_renumbered: bool) {
        if vertices_renumbered {
            self.invalidate();
            return;
        }
        let Some(octree) = self.octree.as_mut() else {
            return;
        };
        for v in mesh.vertices().iter().skip(self.indexed_vertex_count) {
            if v.outgoing_half_edge.is_some() && !octree.insert(v.id, v.position) {
                self.octree = None;
                return;
            }
        }
        self.indexed_vertex_count = mesh.vertex_count();
    }
}
