//! Editable polygon mesh access
//!
//! The tile tool never owns the host's scene data. It talks to the target mesh
//! through [`EditableMesh`], which covers exactly what painting and building
//! need: appending vertices and faces, per-loop UVs, per-face material indices
//! and a change hook the host drains to re-sync its own copy.
//!
//! [`PolyMesh`] is the in-memory implementation used by hosts that do not
//! bring their own mesh type (and by the tests).

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::MeshError;

/// Type-safe vertex identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexId(pub u32);

/// Type-safe face identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceId(pub u32);

/// Which parts of the mesh changed since the host last synchronized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshChanges {
    pub geometry: bool,
    pub uvs: bool,
    pub materials: bool,
}

impl MeshChanges {
    pub const GEOMETRY: Self = Self {
        geometry: true,
        uvs: false,
        materials: false,
    };
    pub const UVS: Self = Self {
        geometry: false,
        uvs: true,
        materials: false,
    };
    pub const MATERIALS: Self = Self {
        geometry: false,
        uvs: false,
        materials: true,
    };
    pub fn is_empty(&self) -> bool {
        !(self.geometry || self.uvs || self.materials)
    }

    pub fn merge(&mut self, other: MeshChanges) {
        self.geometry |= other.geometry;
        self.uvs |= other.uvs;
        self.materials |= other.materials;
    }
}

/// Mesh operations the tile tool needs from its host
pub trait EditableMesh {
    fn vertex_count(&self) -> usize;

    fn face_count(&self) -> usize;

    /// Append a vertex at a local-space position
    fn add_vertex(&mut self, position: Vec3) -> VertexId;

    /// Append a face from an ordered loop of existing vertices
    fn add_face(&mut self, vertices: &[VertexId]) -> Result<FaceId, MeshError>;

    fn vertex_position(&self, vertex: VertexId) -> Option<Vec3>;

    /// Ordered vertex loop of a face
    fn face_vertices(&self, face: FaceId) -> Option<&[VertexId]>;

    /// UV of one loop corner of a face
    fn loop_uv(&self, face: FaceId, corner: usize) -> Option<Vec2>;

    fn set_loop_uv(&mut self, face: FaceId, corner: usize, uv: Vec2) -> Result<(), MeshError>;

    fn face_material(&self, face: FaceId) -> Option<u32>;

    fn set_face_material(&mut self, face: FaceId, material: u32) -> Result<(), MeshError>;

    /// Cached face normal
    fn face_normal(&self, face: FaceId) -> Option<Vec3>;

    /// Recompute the cached normal of a face from its vertex positions
    fn update_face_normal(&mut self, face: FaceId) -> Result<(), MeshError>;

    /// Record that part of the mesh changed and the host must re-sync
    fn notify_changed(&mut self, changes: MeshChanges);

    /// Local-space positions of a face's vertex loop
    fn face_positions(&self, face: FaceId) -> Option<Vec<Vec3>> {
        self.face_vertices(face)?
            .iter()
            .map(|&v| self.vertex_position(v))
            .collect()
    }

    /// Median center of a face
    fn face_center(&self, face: FaceId) -> Option<Vec3> {
        let positions = self.face_positions(face)?;
        if positions.is_empty() {
            return None;
        }
        let sum: Vec3 = positions.iter().copied().sum();
        Some(sum / positions.len() as f32)
    }
}

/// A polygon face with one UV per loop corner
#[derive(Debug, Clone)]
pub struct PolyFace {
    pub vertices: Vec<VertexId>,
    pub uvs: Vec<Vec2>,
    pub material: u32,
    pub normal: Vec3,
}

/// In-memory polygon mesh
#[derive(Debug, Clone, Default)]
pub struct PolyMesh {
    positions: Vec<Vec3>,
    faces: Vec<PolyFace>,
    pending: MeshChanges,
}

impl PolyMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from positions and polygon loops
    pub fn from_polygons(positions: &[Vec3], polygons: &[Vec<u32>]) -> Result<Self, MeshError> {
        let mut mesh = Self::new();
        for &p in positions {
            mesh.add_vertex(p);
        }
        for polygon in polygons {
            let ids: Vec<VertexId> = polygon.iter().map(|&i| VertexId(i)).collect();
            mesh.add_face(&ids)?;
        }
        mesh.pending = MeshChanges::default();
        Ok(mesh)
    }

    pub fn face(&self, face: FaceId) -> Option<&PolyFace> {
        self.faces.get(face.0 as usize)
    }

    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &PolyFace)> {
        self.faces
            .iter()
            .enumerate()
            .map(|(i, f)| (FaceId(i as u32), f))
    }

    /// Pending change flags without clearing them
    pub fn pending_changes(&self) -> MeshChanges {
        self.pending
    }

    /// Drain the pending change flags
    pub fn take_changes(&mut self) -> MeshChanges {
        std::mem::take(&mut self.pending)
    }

    fn face_mut(&mut self, face: FaceId) -> Result<&mut PolyFace, MeshError> {
        self.faces
            .get_mut(face.0 as usize)
            .ok_or(MeshError::FaceOutOfRange(face))
    }
}

/// Newell's method, robust for slightly non-planar polygons
pub fn polygon_normal(positions: &[Vec3]) -> Vec3 {
    let mut normal = Vec3::ZERO;
    for (i, current) in positions.iter().enumerate() {
        let next = positions[(i + 1) % positions.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal.normalize_or_zero()
}

impl EditableMesh for PolyMesh {
    fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn add_vertex(&mut self, position: Vec3) -> VertexId {
        self.positions.push(position);
        self.pending.merge(MeshChanges::GEOMETRY);
        VertexId((self.positions.len() - 1) as u32)
    }

    fn add_face(&mut self, vertices: &[VertexId]) -> Result<FaceId, MeshError> {
        if vertices.len() < 3 {
            return Err(MeshError::DegenerateFace(vertices.len()));
        }
        if let Some(&bad) = vertices
            .iter()
            .find(|v| (v.0 as usize) >= self.positions.len())
        {
            return Err(MeshError::InvalidVertex(bad));
        }

        let positions: Vec<Vec3> = vertices
            .iter()
            .map(|v| self.positions[v.0 as usize])
            .collect();

        self.faces.push(PolyFace {
            vertices: vertices.to_vec(),
            uvs: vec![Vec2::ZERO; vertices.len()],
            material: 0,
            normal: polygon_normal(&positions),
        });
        self.pending.merge(MeshChanges::GEOMETRY);
        Ok(FaceId((self.faces.len() - 1) as u32))
    }

    fn vertex_position(&self, vertex: VertexId) -> Option<Vec3> {
        self.positions.get(vertex.0 as usize).copied()
    }

    fn face_vertices(&self, face: FaceId) -> Option<&[VertexId]> {
        self.faces.get(face.0 as usize).map(|f| f.vertices.as_slice())
    }

    fn loop_uv(&self, face: FaceId, corner: usize) -> Option<Vec2> {
        self.faces.get(face.0 as usize)?.uvs.get(corner).copied()
    }

    fn set_loop_uv(&mut self, face: FaceId, corner: usize, uv: Vec2) -> Result<(), MeshError> {
        let target = self
            .face_mut(face)?
            .uvs
            .get_mut(corner)
            .ok_or(MeshError::CornerOutOfRange { face, corner })?;
        *target = uv;
        Ok(())
    }

    fn face_material(&self, face: FaceId) -> Option<u32> {
        self.faces.get(face.0 as usize).map(|f| f.material)
    }

    fn set_face_material(&mut self, face: FaceId, material: u32) -> Result<(), MeshError> {
        self.face_mut(face)?.material = material;
        Ok(())
    }

    fn face_normal(&self, face: FaceId) -> Option<Vec3> {
        self.faces.get(face.0 as usize).map(|f| f.normal)
    }

    fn update_face_normal(&mut self, face: FaceId) -> Result<(), MeshError> {
        let positions = self
            .face_positions(face)
            .ok_or(MeshError::FaceOutOfRange(face))?;
        self.face_mut(face)?.normal = polygon_normal(&positions);
        Ok(())
    }

    fn notify_changed(&mut self, changes: MeshChanges) {
        self.pending.merge(changes);
    }
}
