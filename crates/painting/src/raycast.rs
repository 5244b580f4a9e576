//! Ray primitives for grid and mesh picking.
//!
//! This module provides ray-plane and ray-triangle intersection (Moller-Trumbore)
//! plus closest-point-on-triangle queries used by the spatial index.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::{RAY_EPSILON, RAY_PARALLEL_EPSILON};

/// A ray with an origin and a (not necessarily normalized) direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t` along the ray
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Transform the ray by an affine matrix.
    ///
    /// The direction is mapped as the difference of two transformed points so
    /// non-uniform scale is handled the same way as positions.
    pub fn transformed(&self, matrix: &Mat4) -> Ray {
        let origin = matrix.transform_point3(self.origin);
        let target = matrix.transform_point3(self.origin + self.direction);
        Ray::new(origin, target - origin)
    }
}

/// Result of a ray-triangle intersection test
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Distance along the ray in units of the ray direction
    pub t: f32,
    /// Barycentric coordinate u (weight for vertex 1)
    pub u: f32,
    /// Barycentric coordinate v (weight for vertex 2)
    pub v: f32,
}

/// Intersect a ray with an infinite plane.
///
/// Returns `None` when the ray is parallel to the plane (denominator below
/// [`RAY_PARALLEL_EPSILON`]) or the intersection lies behind the ray origin.
pub fn ray_plane_intersection(ray: &Ray, plane_point: Vec3, plane_normal: Vec3) -> Option<Vec3> {
    let denom = plane_normal.dot(ray.direction);
    if denom.abs() < RAY_PARALLEL_EPSILON {
        return None;
    }

    let t = (plane_point - ray.origin).dot(plane_normal) / denom;
    if t < 0.0 {
        return None;
    }

    Some(ray.at(t))
}

/// Signed distance from a point to a plane (positive on the normal side)
pub fn distance_point_to_plane(point: Vec3, plane_point: Vec3, plane_normal: Vec3) -> f32 {
    (point - plane_point).dot(plane_normal.normalize_or_zero())
}

/// Moller-Trumbore ray-triangle intersection algorithm.
///
/// Both triangle sides are hit. Only intersections at or in front of the ray
/// origin are reported.
pub fn ray_triangle_intersection(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<TriangleHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let pvec = ray.direction.cross(edge2);
    let det = edge1.dot(pvec);

    // Ray lies in the triangle's plane or misses
    if det.abs() < RAY_EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = ray.origin - v0;

    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = ray.direction.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    // Origins lying on the surface report a zero-distance hit
    let t = edge2.dot(qvec) * inv_det;
    if t < -RAY_EPSILON {
        return None;
    }

    Some(TriangleHit { t: t.max(0.0), u, v })
}

/// Closest point on a triangle to `point` (Ericson, Real-Time Collision Detection 5.1.5)
pub fn closest_point_on_triangle(point: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = point - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = point - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = point - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    // Inside the face region
    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_ray_plane_hit() {
        let ray = Ray::new(Vec3::new(1.0, 2.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = ray_plane_intersection(&ray, Vec3::ZERO, Vec3::Z).unwrap();
        assert!((hit - Vec3::new(1.0, 2.0, 0.0)).length() < EPS);
    }

    #[test]
    fn test_ray_plane_hit_from_back_side() {
        // The plane normal's orientation does not matter
        let ray = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::new(0.0, 0.0, 2.0));
        let hit = ray_plane_intersection(&ray, Vec3::ZERO, Vec3::Z).unwrap();
        assert!(hit.length() < EPS);
    }

    #[test]
    fn test_ray_plane_parallel_returns_none() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::X);
        assert!(ray_plane_intersection(&ray, Vec3::ZERO, Vec3::Z).is_none());
    }

    #[test]
    fn test_ray_plane_behind_returns_none() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::Z);
        assert!(ray_plane_intersection(&ray, Vec3::ZERO, Vec3::Z).is_none());
    }

    #[test]
    fn test_distance_point_to_plane() {
        let d = distance_point_to_plane(Vec3::new(3.0, 1.0, -2.0), Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0));
        assert!((d + 2.0).abs() < EPS);
    }

    #[test]
    fn test_ray_triangle_hit() {
        let v0 = Vec3::new(0.0, 0.0, 0.0);
        let v1 = Vec3::new(1.0, 0.0, 0.0);
        let v2 = Vec3::new(0.0, 1.0, 0.0);

        let ray = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = ray_triangle_intersection(&ray, v0, v1, v2).unwrap();
        assert!((hit.t - 1.0).abs() < EPS);
        assert!((hit.u - 0.25).abs() < EPS);
        assert!((hit.v - 0.25).abs() < EPS);
    }

    #[test]
    fn test_ray_triangle_miss() {
        let v0 = Vec3::new(0.0, 0.0, 0.0);
        let v1 = Vec3::new(1.0, 0.0, 0.0);
        let v2 = Vec3::new(0.0, 1.0, 0.0);

        let ray = Ray::new(Vec3::new(2.0, 2.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(ray_triangle_intersection(&ray, v0, v1, v2).is_none());
    }

    #[test]
    fn test_ray_triangle_behind() {
        let v0 = Vec3::new(0.0, 0.0, 0.0);
        let v1 = Vec3::new(1.0, 0.0, 0.0);
        let v2 = Vec3::new(0.0, 1.0, 0.0);

        let ray = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(ray_triangle_intersection(&ray, v0, v1, v2).is_none());
    }

    #[test]
    fn test_ray_triangle_origin_on_surface() {
        let v0 = Vec3::new(0.0, 0.0, 0.0);
        let v1 = Vec3::new(1.0, 0.0, 0.0);
        let v2 = Vec3::new(0.0, 1.0, 0.0);

        let ray = Ray::new(Vec3::new(0.25, 0.25, 0.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = ray_triangle_intersection(&ray, v0, v1, v2).unwrap();
        assert_eq!(hit.t, 0.0);
    }

    #[test]
    fn test_closest_point_regions() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(2.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 2.0, 0.0);

        // Above the interior projects straight down
        let p = closest_point_on_triangle(Vec3::new(0.5, 0.5, 3.0), a, b, c);
        assert!((p - Vec3::new(0.5, 0.5, 0.0)).length() < EPS);

        // Vertex region
        let p = closest_point_on_triangle(Vec3::new(-1.0, -1.0, 0.0), a, b, c);
        assert!((p - a).length() < EPS);

        // Edge region of the hypotenuse
        let p = closest_point_on_triangle(Vec3::new(2.0, 2.0, 0.0), a, b, c);
        assert!((p - Vec3::new(1.0, 1.0, 0.0)).length() < EPS);
    }

    #[test]
    fn test_ray_transformed() {
        let matrix = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            glam::Quat::IDENTITY,
            Vec3::new(1.0, 0.0, 0.0),
        );
        let ray = Ray::new(Vec3::ZERO, Vec3::Z).transformed(&matrix);
        assert!((ray.origin - Vec3::X).length() < EPS);
        assert!((ray.direction - Vec3::new(0.0, 0.0, 2.0)).length() < EPS);
    }
}
