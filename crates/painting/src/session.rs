//! The mesh being painted together with its spatial index.
//!
//! [`MeshSession`] owns the editable mesh, the BVH built from it and the
//! object's world transform. The index is never rebuilt implicitly: geometry
//! edits made through the session rebuild it before returning, and edits made
//! through [`MeshSession::mesh_mut`] drop it until [`MeshSession::rebuild`] is
//! called. Queries against a missing index report no hit.

use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::MeshError;
use crate::mesh::{EditableMesh, FaceId, MeshChanges};
use crate::raycast::Ray;
use crate::spatial::{MeshBvh, SurfaceHit};
use crate::uv::{UvLayout, map_face_uv};

/// Vertex order used for a synthesized quad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winding {
    /// (P1, P2, P3, P4): origin, +up, +right+up, +right
    Forward,
    /// (P1, P4, P3, P2): origin, +right, +right+up, +up
    Reversed,
}

impl Winding {
    /// Pick the winding that keeps a new quad facing along the paint normal.
    ///
    /// `right_edge`/`up_edge` are the cell edges, possibly flipped into the
    /// sample's quadrant. When both edges agree in sign with the paint basis
    /// (quadrants I and III) the quad is emitted reversed, otherwise forward.
    pub fn for_cell(right_edge: Vec3, up_edge: Vec3, paint_right: Vec3, paint_up: Vec3) -> Self {
        let x_positive = paint_right.dot(right_edge.normalize_or_zero()) > 0.0;
        let y_positive = paint_up.dot(up_edge.normalize_or_zero()) > 0.0;
        if x_positive == y_positive {
            Winding::Reversed
        } else {
            Winding::Forward
        }
    }

    /// Indices into `[P1, P2, P3, P4]` in emission order
    pub fn order(self) -> [usize; 4] {
        match self {
            Winding::Forward => [0, 1, 2, 3],
            Winding::Reversed => [0, 3, 2, 1],
        }
    }
}

/// Editable mesh, its spatial index and its placement in the world
#[derive(Debug)]
pub struct MeshSession<M> {
    mesh: M,
    index: Option<MeshBvh>,
    world: Mat4,
    world_inverse: Mat4,
    normal_matrix: Mat3,
}

impl<M: EditableMesh> MeshSession<M> {
    /// Take ownership of a mesh and build its spatial index
    pub fn new(mesh: M, world: Mat4) -> Self {
        let mut session = Self {
            mesh,
            index: None,
            world: Mat4::IDENTITY,
            world_inverse: Mat4::IDENTITY,
            normal_matrix: Mat3::IDENTITY,
        };
        session.set_transform(world);
        session.rebuild();
        session
    }

    pub fn mesh(&self) -> &M {
        &self.mesh
    }

    /// Mutable access for external edits (undo/redo, host tools).
    ///
    /// Drops the spatial index; call [`rebuild`](Self::rebuild) once the
    /// edit is complete.
    pub fn mesh_mut(&mut self) -> &mut M {
        self.invalidate();
        &mut self.mesh
    }

    pub fn into_mesh(self) -> M {
        self.mesh
    }

    pub fn index(&self) -> Option<&MeshBvh> {
        self.index.as_ref()
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    /// Rebuild the spatial index from the current mesh
    pub fn rebuild(&mut self) {
        let bvh = MeshBvh::build(&self.mesh);
        debug!(
            "Rebuilt spatial index: {} faces, {} triangles",
            self.mesh.face_count(),
            bvh.triangle_count()
        );
        self.index = Some(bvh);
    }

    /// Mark the spatial index stale
    pub fn invalidate(&mut self) {
        self.index = None;
    }

    /// Drop the spatial index at the end of a session
    pub fn release(&mut self) {
        self.index = None;
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    pub fn world_transform(&self) -> Mat4 {
        self.world
    }

    pub fn set_transform(&mut self, world: Mat4) {
        self.world = world;
        self.world_inverse = world.inverse();
        self.normal_matrix = Mat3::from_mat4(self.world_inverse).transpose();
    }

    pub fn to_local_point(&self, point: Vec3) -> Vec3 {
        self.world_inverse.transform_point3(point)
    }

    pub fn to_world_point(&self, point: Vec3) -> Vec3 {
        self.world.transform_point3(point)
    }

    pub fn to_local_vector(&self, vector: Vec3) -> Vec3 {
        self.world_inverse.transform_vector3(vector)
    }

    pub fn to_world_normal(&self, normal: Vec3) -> Vec3 {
        (self.normal_matrix * normal).normalize_or_zero()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Ray cast in mesh-local space
    pub fn raycast_local(&self, origin: Vec3, direction: Vec3) -> Option<SurfaceHit> {
        self.index.as_ref()?.raycast(origin, direction)
    }

    /// Nearest surface point in mesh-local space
    pub fn nearest_point_local(&self, point: Vec3) -> Option<SurfaceHit> {
        self.index.as_ref()?.nearest_point(point)
    }

    /// Ray cast a world-space ray; the hit is returned in world space
    pub fn raycast_world(&self, ray: &Ray) -> Option<SurfaceHit> {
        let local = ray.transformed(&self.world_inverse);
        let hit = self.raycast_local(local.origin, local.direction)?;
        let position = self.to_world_point(hit.position);
        Some(SurfaceHit {
            position,
            normal: self.to_world_normal(hit.normal),
            face: hit.face,
            distance: position.distance(ray.origin),
        })
    }

    /// World-space positions of a face's vertices
    pub fn face_world_positions(&self, face: FaceId) -> Option<Vec<Vec3>> {
        let positions = self.mesh.face_positions(face)?;
        Some(positions.into_iter().map(|p| self.to_world_point(p)).collect())
    }

    // ========================================================================
    // Face attributes (never touch geometry, so the index stays valid)
    // ========================================================================

    /// Project a face onto a tile of the atlas; see [`map_face_uv`]
    pub fn map_face_uv(
        &mut self,
        face: FaceId,
        right: Vec3,
        up: Vec3,
        tile: [u32; 2],
        layout: &UvLayout,
    ) -> bool {
        map_face_uv(&mut self.mesh, face, &self.world, right, up, tile, layout)
    }

    /// Assign a material index to a face
    pub fn assign_material(&mut self, face: FaceId, material: u32) -> bool {
        match self.mesh.set_face_material(face, material) {
            Ok(()) => {
                self.mesh.notify_changed(MeshChanges::MATERIALS);
                true
            }
            Err(e) => {
                warn!("Material assignment skipped: {}", e);
                false
            }
        }
    }

    // ========================================================================
    // Face synthesis
    // ========================================================================

    /// Append a quad at `origin` spanned by `right_edge` and `up_edge`.
    ///
    /// All inputs are in mesh-local space. The spatial index is dropped before
    /// the mesh is touched and rebuilt once the face exists, so callers never
    /// observe a stale index.
    pub fn build_face(
        &mut self,
        origin: Vec3,
        right_edge: Vec3,
        up_edge: Vec3,
        winding: Winding,
    ) -> Result<FaceId, MeshError> {
        self.invalidate();

        let corners = [
            origin,
            origin + up_edge,
            origin + right_edge + up_edge,
            origin + right_edge,
        ];
        let ids = corners.map(|p| self.mesh.add_vertex(p));
        let ordered = winding.order().map(|i| ids[i]);

        let result = self.mesh.add_face(&ordered).and_then(|face| {
            self.mesh.update_face_normal(face)?;
            Ok(face)
        });
        self.mesh.notify_changed(MeshChanges::GEOMETRY);
        self.rebuild();

        let face = result?;
        debug!("Built face {:?} at {:?} ({:?})", face, origin, winding);
        Ok(face)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::PolyMesh;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_winding_quadrant_one() {
        let winding = Winding::for_cell(Vec3::X, Vec3::Y, Vec3::X, Vec3::Y);
        assert_eq!(winding, Winding::Reversed);
        assert_eq!(winding.order(), [0, 3, 2, 1]);
    }

    #[test]
    fn test_winding_quadrant_three() {
        let winding = Winding::for_cell(-Vec3::X, -Vec3::Y, Vec3::X, Vec3::Y);
        assert_eq!(winding, Winding::Reversed);
    }

    #[test]
    fn test_winding_quadrant_two_and_four() {
        let winding = Winding::for_cell(Vec3::X, Vec3::Y, -Vec3::X, Vec3::Y);
        assert_eq!(winding, Winding::Forward);
        assert_eq!(winding.order(), [0, 1, 2, 3]);
        assert_eq!(
            Winding::for_cell(Vec3::X, -Vec3::Y, Vec3::X, Vec3::Y),
            Winding::Forward
        );
    }

    #[test]
    fn test_build_face_vertex_order() {
        let mut session = MeshSession::new(PolyMesh::new(), Mat4::IDENTITY);
        let origin = Vec3::new(1.0, 2.0, 0.0);

        let face = session
            .build_face(origin, Vec3::X, Vec3::Y, Winding::Reversed)
            .unwrap();
        let positions = session.mesh().face_positions(face).unwrap();
        assert_eq!(
            positions,
            vec![
                origin,
                origin + Vec3::X,
                origin + Vec3::X + Vec3::Y,
                origin + Vec3::Y,
            ]
        );

        let face = session
            .build_face(origin, Vec3::X, Vec3::Y, Winding::Forward)
            .unwrap();
        let positions = session.mesh().face_positions(face).unwrap();
        assert_eq!(
            positions,
            vec![
                origin,
                origin + Vec3::Y,
                origin + Vec3::X + Vec3::Y,
                origin + Vec3::X,
            ]
        );
    }

    #[test]
    fn test_build_face_rebuilds_index() {
        let mut session = MeshSession::new(PolyMesh::new(), Mat4::IDENTITY);
        assert!(session.raycast_local(Vec3::new(0.5, 0.5, 1.0), -Vec3::Z).is_none());

        let face = session
            .build_face(Vec3::ZERO, Vec3::X, Vec3::Y, Winding::Reversed)
            .unwrap();
        assert!(session.is_indexed());

        let hit = session.raycast_local(Vec3::new(0.5, 0.5, 1.0), -Vec3::Z).unwrap();
        assert_eq!(hit.face, face);
        // Quadrant I quad faces +Z
        assert!((hit.normal - Vec3::Z).length() < EPS);
        assert!(session.mesh().pending_changes().geometry);
    }

    #[test]
    fn test_mesh_mut_invalidates_index() {
        let mut session = MeshSession::new(PolyMesh::new(), Mat4::IDENTITY);
        session
            .build_face(Vec3::ZERO, Vec3::X, Vec3::Y, Winding::Reversed)
            .unwrap();

        session.mesh_mut();
        assert!(!session.is_indexed());
        assert!(session.raycast_local(Vec3::new(0.5, 0.5, 1.0), -Vec3::Z).is_none());
        assert!(session.nearest_point_local(Vec3::ZERO).is_none());

        session.rebuild();
        assert!(session.raycast_local(Vec3::new(0.5, 0.5, 1.0), -Vec3::Z).is_some());
    }

    #[test]
    fn test_raycast_world_with_transform() {
        let world = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let mut session = MeshSession::new(PolyMesh::new(), world);
        session
            .build_face(Vec3::ZERO, Vec3::X, Vec3::Y, Winding::Reversed)
            .unwrap();

        let ray = Ray::new(Vec3::new(10.5, 0.5, 3.0), -Vec3::Z);
        let hit = session.raycast_world(&ray).unwrap();
        assert!((hit.position - Vec3::new(10.5, 0.5, 0.0)).length() < EPS);
        assert!((hit.distance - 3.0).abs() < EPS);

        // The untransformed location misses
        let ray = Ray::new(Vec3::new(0.5, 0.5, 3.0), -Vec3::Z);
        assert!(session.raycast_world(&ray).is_none());
    }

    #[test]
    fn test_attribute_edits_keep_index() {
        let mut session = MeshSession::new(PolyMesh::new(), Mat4::IDENTITY);
        let face = session
            .build_face(Vec3::ZERO, Vec3::X, Vec3::Y, Winding::Reversed)
            .unwrap();

        assert!(session.assign_material(face, 3));
        assert!(!session.assign_material(FaceId(9), 3));
        assert!(session.is_indexed());
        assert_eq!(session.mesh().face_material(face), Some(3));
        assert!(session.mesh().pending_changes().materials);
    }

    #[test]
    fn test_world_normal_under_rotation() {
        let world = Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2);
        let session = MeshSession::new(PolyMesh::new(), world);
        let normal = session.to_world_normal(Vec3::Z);
        assert!((normal - -Vec3::Y).length() < EPS);
    }
}
