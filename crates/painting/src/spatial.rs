//! Bounding volume hierarchy over mesh faces.
//!
//! The tile tool casts a ray (or looks up the nearest surface point) on every
//! pointer event, so faces are fan-triangulated once into a flat BVH. The tree
//! has no incremental update: any topology change rebuilds it from the mesh.
//!
//! All queries run in mesh-local space.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::BVH_LEAF_SIZE;
use crate::mesh::{EditableMesh, FaceId};
use crate::raycast::{Ray, closest_point_on_triangle, ray_triangle_intersection};

/// Slack on slab overlap so flat boxes (single planar faces) are not missed
const SLAB_EPSILON: f32 = 1e-5;

/// A surface hit from a ray cast or nearest-point query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceHit {
    /// Hit position
    pub position: Vec3,
    /// Normal of the hit face
    pub normal: Vec3,
    /// Face that was hit
    pub face: FaceId,
    /// Distance from the ray origin or query point
    pub distance: f32,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    pub fn include_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn include_aabb(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Squared distance from a point to the box (zero inside)
    pub fn distance_squared(&self, point: Vec3) -> f32 {
        point.clamp(self.min, self.max).distance_squared(point)
    }

    /// Slab test. Returns the entry distance if the ray hits within `max_t`.
    ///
    /// Axes the ray does not move along only require the origin to lie
    /// inside that slab, so axis-aligned rays grazing a face stay exact.
    pub fn ray_entry(&self, origin: Vec3, direction: Vec3, max_t: f32) -> Option<f32> {
        let mut t_near = 0.0f32;
        let mut t_far = max_t;
        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            if d.abs() < f32::EPSILON {
                if o < self.min[axis] || o > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let t0 = (self.min[axis] - o) * inv;
            let t1 = (self.max[axis] - o) * inv;
            t_near = t_near.max(t0.min(t1));
            t_far = t_far.min(t0.max(t1));
            if t_near > t_far + SLAB_EPSILON {
                return None;
            }
        }
        Some(t_near)
    }
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    face: FaceId,
    vertices: [Vec3; 3],
    normal: Vec3,
    centroid: Vec3,
}

impl Triangle {
    fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        for v in self.vertices {
            bounds.include_point(v);
        }
        bounds
    }
}

#[derive(Debug, Clone)]
enum BvhNode {
    Leaf {
        bounds: Aabb,
        start: usize,
        count: usize,
    },
    Internal {
        bounds: Aabb,
        left: usize,
        right: usize,
    },
}

impl BvhNode {
    fn bounds(&self) -> &Aabb {
        match self {
            BvhNode::Leaf { bounds, .. } | BvhNode::Internal { bounds, .. } => bounds,
        }
    }
}

/// Spatial index for ray casts and nearest-point lookups against a mesh
#[derive(Debug, Clone, Default)]
pub struct MeshBvh {
    nodes: Vec<BvhNode>,
    triangles: Vec<Triangle>,
}

impl MeshBvh {
    /// Build the hierarchy from every face of the mesh
    pub fn build<M: EditableMesh + ?Sized>(mesh: &M) -> Self {
        let mut triangles = Vec::with_capacity(mesh.face_count() * 2);

        for face_idx in 0..mesh.face_count() {
            let face = FaceId(face_idx as u32);
            let Some(positions) = mesh.face_positions(face) else {
                continue;
            };
            if positions.len() < 3 {
                continue;
            }
            let face_normal = mesh.face_normal(face).unwrap_or(Vec3::ZERO);

            // Fan triangulation
            for i in 1..positions.len() - 1 {
                let vertices = [positions[0], positions[i], positions[i + 1]];
                let normal = if face_normal.length_squared() > 0.0 {
                    face_normal
                } else {
                    (vertices[1] - vertices[0])
                        .cross(vertices[2] - vertices[0])
                        .normalize_or_zero()
                };
                triangles.push(Triangle {
                    face,
                    vertices,
                    normal,
                    centroid: (vertices[0] + vertices[1] + vertices[2]) / 3.0,
                });
            }
        }

        let mut bvh = Self {
            nodes: Vec::new(),
            triangles,
        };
        if !bvh.triangles.is_empty() {
            let count = bvh.triangles.len();
            bvh.build_node(0, count);
        }
        bvh
    }

    /// Recursively build the node covering `triangles[start..start + count]`
    fn build_node(&mut self, start: usize, count: usize) -> usize {
        let slice = &mut self.triangles[start..start + count];

        let mut bounds = Aabb::empty();
        let mut centroid_bounds = Aabb::empty();
        for tri in slice.iter() {
            bounds.include_aabb(&tri.bounds());
            centroid_bounds.include_point(tri.centroid);
        }

        let node_index = self.nodes.len();
        if count <= BVH_LEAF_SIZE {
            self.nodes.push(BvhNode::Leaf {
                bounds,
                start,
                count,
            });
            return node_index;
        }

        // Median split along the longest centroid axis
        let extent = centroid_bounds.size();
        let axis = if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        };
        let mid = count / 2;
        slice.select_nth_unstable_by(mid, |a, b| a.centroid[axis].total_cmp(&b.centroid[axis]));

        // Reserve this slot, children are pushed after it
        self.nodes.push(BvhNode::Leaf {
            bounds,
            start,
            count,
        });
        let left = self.build_node(start, mid);
        let right = self.build_node(start + mid, count - mid);
        self.nodes[node_index] = BvhNode::Internal {
            bounds,
            left,
            right,
        };
        node_index
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Cast a ray and return the closest hit in front of its origin.
    ///
    /// `distance` is measured in the ray's own space (the direction is
    /// normalized before testing).
    pub fn raycast(&self, origin: Vec3, direction: Vec3) -> Option<SurfaceHit> {
        if self.nodes.is_empty() {
            return None;
        }
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        let ray = Ray::new(origin, dir);

        let mut best: Option<(f32, usize)> = None;
        let mut stack = vec![0usize];
        while let Some(node_index) = stack.pop() {
            let max_t = best.map_or(f32::INFINITY, |(t, _)| t);
            let node = &self.nodes[node_index];
            if node.bounds().ray_entry(origin, dir, max_t).is_none() {
                continue;
            }
            match node {
                BvhNode::Leaf { start, count, .. } => {
                    for tri_index in *start..*start + *count {
                        let [v0, v1, v2] = self.triangles[tri_index].vertices;
                        if let Some(hit) = ray_triangle_intersection(&ray, v0, v1, v2) {
                            if best.is_none_or(|(t, _)| hit.t < t) {
                                best = Some((hit.t, tri_index));
                            }
                        }
                    }
                }
                BvhNode::Internal { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }

        best.map(|(t, tri_index)| {
            let tri = &self.triangles[tri_index];
            SurfaceHit {
                position: ray.at(t),
                normal: tri.normal,
                face: tri.face,
                distance: t,
            }
        })
    }

    /// Find the closest point on the surface to `point`
    pub fn nearest_point(&self, point: Vec3) -> Option<SurfaceHit> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut best: Option<(f32, Vec3, usize)> = None;
        let mut stack = vec![0usize];
        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index];
            let best_dist_sq = best.map_or(f32::INFINITY, |(d, _, _)| d);
            if node.bounds().distance_squared(point) > best_dist_sq {
                continue;
            }
            match node {
                BvhNode::Leaf { start, count, .. } => {
                    for tri_index in *start..*start + *count {
                        let [a, b, c] = self.triangles[tri_index].vertices;
                        let closest = closest_point_on_triangle(point, a, b, c);
                        let dist_sq = closest.distance_squared(point);
                        if best.is_none_or(|(d, _, _)| dist_sq < d) {
                            best = Some((dist_sq, closest, tri_index));
                        }
                    }
                }
                BvhNode::Internal { left, right, .. } => {
                    // Visit the nearer child first for tighter pruning
                    let left_dist = self.nodes[*left].bounds().distance_squared(point);
                    let right_dist = self.nodes[*right].bounds().distance_squared(point);
                    if left_dist <= right_dist {
                        stack.push(*right);
                        stack.push(*left);
                    } else {
                        stack.push(*left);
                        stack.push(*right);
                    }
                }
            }
        }

        best.map(|(dist_sq, closest, tri_index)| {
            let tri = &self.triangles[tri_index];
            SurfaceHit {
                position: closest,
                normal: tri.normal,
                face: tri.face,
                distance: dist_sq.sqrt(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::PolyMesh;

    const EPS: f32 = 1e-5;

    /// A row of unit quads along +X in the XY plane, facing +Z
    fn quad_strip(count: u32) -> PolyMesh {
        let mut positions = Vec::new();
        let mut polygons = Vec::new();
        for i in 0..count {
            let x = i as f32;
            let base = positions.len() as u32;
            positions.extend([
                Vec3::new(x, 0.0, 0.0),
                Vec3::new(x + 1.0, 0.0, 0.0),
                Vec3::new(x + 1.0, 1.0, 0.0),
                Vec3::new(x, 1.0, 0.0),
            ]);
            polygons.push(vec![base, base + 1, base + 2, base + 3]);
        }
        PolyMesh::from_polygons(&positions, &polygons).unwrap()
    }

    #[test]
    fn test_build_triangulates_faces() {
        let bvh = MeshBvh::build(&quad_strip(10));
        assert_eq!(bvh.triangle_count(), 20);
        assert!(!bvh.is_empty());
    }

    #[test]
    fn test_raycast_hits_correct_face() {
        let bvh = MeshBvh::build(&quad_strip(10));
        let hit = bvh
            .raycast(Vec3::new(6.5, 0.5, 4.0), Vec3::new(0.0, 0.0, -2.0))
            .unwrap();
        assert_eq!(hit.face, FaceId(6));
        assert!((hit.position - Vec3::new(6.5, 0.5, 0.0)).length() < EPS);
        assert!((hit.distance - 4.0).abs() < EPS);
        assert!((hit.normal - Vec3::Z).length() < EPS);
    }

    #[test]
    fn test_raycast_picks_closest_of_stacked_faces() {
        let mesh = PolyMesh::from_polygons(
            &[
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(0.0, 1.0, 1.0),
            ],
            &[vec![0, 1, 2, 3], vec![4, 5, 6, 7]],
        )
        .unwrap();
        let bvh = MeshBvh::build(&mesh);

        let from_above = bvh.raycast(Vec3::new(0.5, 0.5, 5.0), -Vec3::Z).unwrap();
        assert_eq!(from_above.face, FaceId(1));
        let from_below = bvh.raycast(Vec3::new(0.5, 0.5, -5.0), Vec3::Z).unwrap();
        assert_eq!(from_below.face, FaceId(0));
    }

    #[test]
    fn test_raycast_from_surface_is_zero_distance_hit() {
        let bvh = MeshBvh::build(&quad_strip(1));
        let hit = bvh.raycast(Vec3::new(0.3, 0.6, 0.0), -Vec3::Z).unwrap();
        assert_eq!(hit.face, FaceId(0));
        assert_eq!(hit.distance, 0.0);
        assert!((hit.position - Vec3::new(0.3, 0.6, 0.0)).length() < EPS);
    }

    #[test]
    fn test_raycast_miss() {
        let bvh = MeshBvh::build(&quad_strip(4));
        assert!(bvh.raycast(Vec3::new(0.5, 3.0, 1.0), -Vec3::Z).is_none());
        assert!(bvh.raycast(Vec3::new(0.5, 0.5, 1.0), Vec3::Z).is_none());
        assert!(bvh.raycast(Vec3::new(0.5, 0.5, 1.0), Vec3::ZERO).is_none());
    }

    #[test]
    fn test_nearest_point() {
        let bvh = MeshBvh::build(&quad_strip(8));
        let hit = bvh.nearest_point(Vec3::new(3.25, 0.75, 2.0)).unwrap();
        assert_eq!(hit.face, FaceId(3));
        assert!((hit.position - Vec3::new(3.25, 0.75, 0.0)).length() < EPS);
        assert!((hit.distance - 2.0).abs() < EPS);

        // Off the end of the strip snaps to the boundary
        let hit = bvh.nearest_point(Vec3::new(10.0, 0.5, 0.0)).unwrap();
        assert_eq!(hit.face, FaceId(7));
        assert!((hit.position - Vec3::new(8.0, 0.5, 0.0)).length() < EPS);
    }

    #[test]
    fn test_nearest_point_on_surface_has_zero_distance() {
        let bvh = MeshBvh::build(&quad_strip(2));
        let hit = bvh.nearest_point(Vec3::new(0.5, 0.5, 0.0)).unwrap();
        assert!(hit.distance.abs() < EPS);
    }

    #[test]
    fn test_empty_mesh_queries_return_none() {
        let bvh = MeshBvh::build(&PolyMesh::new());
        assert!(bvh.is_empty());
        assert!(bvh.raycast(Vec3::Z, -Vec3::Z).is_none());
        assert!(bvh.nearest_point(Vec3::ZERO).is_none());
    }
}
