//! Conversions between [`PolyMesh`] and Bevy's render mesh.

use std::collections::HashMap;

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology, VertexAttributeValues};
use bevy::prelude::Mesh;
use glam::{Vec2, Vec3};

use crate::error::MeshError;
use crate::mesh::{EditableMesh, PolyMesh, VertexId};

impl PolyMesh {
    /// Import a triangle-list Bevy mesh.
    ///
    /// Positionally identical vertices are welded so faces share vertices
    /// across UV seams; UVs are kept per loop corner.
    pub fn from_bevy_mesh(mesh: &Mesh) -> Result<Self, MeshError> {
        let positions = mesh
            .attribute(Mesh::ATTRIBUTE_POSITION)
            .and_then(|attr| attr.as_float3())
            .ok_or(MeshError::NoPositions)?;

        let uvs: Option<&Vec<[f32; 2]>> = mesh
            .attribute(Mesh::ATTRIBUTE_UV_0)
            .and_then(|attr| match attr {
                VertexAttributeValues::Float32x2(v) => Some(v),
                _ => None,
            });

        let indices: Vec<u32> = match mesh.indices() {
            Some(Indices::U16(idx)) => idx.iter().map(|&i| i as u32).collect(),
            Some(Indices::U32(idx)) => idx.to_vec(),
            None => return Err(MeshError::NoIndices),
        };
        if indices.len() % 3 != 0 {
            return Err(MeshError::InvalidTopology(
                "Index count not divisible by 3".to_string(),
            ));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(MeshError::InvalidVertex(VertexId(bad)));
        }

        // Weld on quantized positions
        let quantize = |p: &[f32; 3]| -> [i64; 3] {
            [
                (p[0] * 1_000_000.0) as i64,
                (p[1] * 1_000_000.0) as i64,
                (p[2] * 1_000_000.0) as i64,
            ]
        };

        let mut result = PolyMesh::new();
        let mut welded: HashMap<[i64; 3], VertexId> = HashMap::new();
        let mut remap: Vec<VertexId> = Vec::with_capacity(positions.len());
        for p in positions {
            let id = *welded
                .entry(quantize(p))
                .or_insert_with(|| result.add_vertex(Vec3::from_array(*p)));
            remap.push(id);
        }

        let mut skipped = 0;
        for tri in indices.chunks_exact(3) {
            let ids = [
                remap[tri[0] as usize],
                remap[tri[1] as usize],
                remap[tri[2] as usize],
            ];
            if ids[0] == ids[1] || ids[1] == ids[2] || ids[0] == ids[2] {
                skipped += 1;
                continue;
            }
            let face = result.add_face(&ids)?;
            if let Some(uvs) = uvs {
                for (corner, &index) in tri.iter().enumerate() {
                    if let Some(uv) = uvs.get(index as usize) {
                        result.set_loop_uv(face, corner, Vec2::from_array(*uv))?;
                    }
                }
            }
        }

        tracing::debug!(
            "from_bevy_mesh: {} vertices welded to {}, {} faces ({} degenerate skipped)",
            positions.len(),
            result.vertex_count(),
            result.face_count(),
            skipped
        );

        result.take_changes();
        Ok(result)
    }

    /// Export as a triangle-list Bevy mesh with flat face normals.
    ///
    /// Faces are fan-triangulated and vertices are duplicated per face so each
    /// loop keeps its own UV.
    pub fn to_bevy_mesh(&self) -> Mesh {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut uvs: Vec<[f32; 2]> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();

        for (id, face) in self.faces() {
            let Some(face_positions) = self.face_positions(id) else {
                continue;
            };
            if face_positions.len() < 3 {
                continue;
            }

            let base = positions.len() as u32;
            for (corner, position) in face_positions.iter().enumerate() {
                positions.push(position.to_array());
                normals.push(face.normal.to_array());
                uvs.push(self.loop_uv(id, corner).unwrap_or(Vec2::ZERO).to_array());
            }

            for i in 1..(face_positions.len() as u32 - 1) {
                indices.extend_from_slice(&[base, base + i, base + i + 1]);
            }
        }

        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
        mesh.insert_indices(Indices::U32(indices));
        mesh
    }
}
