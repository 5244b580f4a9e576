//! Tile atlas UV projection.
//!
//! Faces are mapped by projecting each loop vertex onto the painting basis,
//! scaling from world units to tile cells, recentering on the cell and then
//! offsetting into the selected tile of the atlas texture.

use glam::{Mat4, UVec2, Vec2, Vec3};
use tessella_config::TileGrid;
use tracing::{trace, warn};

use crate::mesh::{EditableMesh, FaceId, MeshChanges};

/// Scale factors from world space to atlas UV space for one tile grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvLayout {
    /// Size of one tile in UV units
    pub uv_unit: Vec2,
    /// Size of one tile in world units
    pub world_convert: Vec2,
}

impl UvLayout {
    /// Derive the layout for a grid drawn from a texture of `texture_size` pixels.
    ///
    /// # Arguments
    /// * `grid` - Active tile grid (cell size in pixels)
    /// * `texture_size` - Atlas size in pixels
    /// * `world_pixels` - Texture pixels per world unit
    ///
    /// # Returns
    /// `None` when the texture or the scale is empty.
    pub fn new(grid: &TileGrid, texture_size: UVec2, world_pixels: f32) -> Option<Self> {
        if texture_size.x == 0 || texture_size.y == 0 || world_pixels <= 0.0 {
            return None;
        }
        let cell = Vec2::new(grid.cell_size[0] as f32, grid.cell_size[1] as f32);
        Some(Self {
            uv_unit: cell / texture_size.as_vec2(),
            world_convert: cell / world_pixels,
        })
    }

    /// UV of a point at `offset` (painting-basis coordinates in world units)
    /// from the face center, inside tile `(column, row)`.
    pub fn uv_for(&self, offset: Vec2, tile: [u32; 2]) -> Vec2 {
        let tile_origin = Vec2::new(tile[0] as f32, tile[1] as f32) * self.uv_unit;
        (offset / self.world_convert + Vec2::splat(0.5)) * self.uv_unit + tile_origin
    }
}

/// Re-map every loop UV of `face` onto a tile of the atlas.
///
/// `right` and `up` are the world-space painting basis; `to_world` places the
/// mesh in the world. Returns `false` (and leaves the mesh untouched) when the
/// face does not exist.
pub fn map_face_uv<M: EditableMesh + ?Sized>(
    mesh: &mut M,
    face: FaceId,
    to_world: &Mat4,
    right: Vec3,
    up: Vec3,
    tile: [u32; 2],
    layout: &UvLayout,
) -> bool {
    let Some(positions) = mesh.face_positions(face) else {
        warn!("UV projection skipped: face {:?} out of range", face);
        return false;
    };
    if positions.is_empty() {
        return false;
    }

    let world: Vec<Vec3> = positions
        .iter()
        .map(|&p| to_world.transform_point3(p))
        .collect();
    let center = world.iter().copied().sum::<Vec3>() / world.len() as f32;

    for (corner, position) in world.iter().enumerate() {
        let offset = *position - center;
        let uv = layout.uv_for(Vec2::new(right.dot(offset), up.dot(offset)), tile);
        if let Err(e) = mesh.set_loop_uv(face, corner, uv) {
            warn!("UV projection stopped on face {:?}: {}", face, e);
            mesh.notify_changed(MeshChanges::UVS);
            return false;
        }
    }

    trace!("Mapped face {:?} to tile {:?}", face, tile);
    mesh.notify_changed(MeshChanges::UVS);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::PolyMesh;

    const EPS: f32 = 1e-6;

    fn layout_32_on_256() -> UvLayout {
        let grid = TileGrid::new(0, "tiles", 32);
        UvLayout::new(&grid, UVec2::splat(256), 32.0).unwrap()
    }

    fn quad_at(origin: Vec3, size: f32) -> PolyMesh {
        PolyMesh::from_polygons(
            &[
                origin,
                origin + Vec3::new(size, 0.0, 0.0),
                origin + Vec3::new(size, size, 0.0),
                origin + Vec3::new(0.0, size, 0.0),
            ],
            &[vec![0, 1, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_layout_units() {
        let layout = layout_32_on_256();
        assert_eq!(layout.uv_unit, Vec2::splat(0.125));
        assert_eq!(layout.world_convert, Vec2::ONE);
    }

    #[test]
    fn test_layout_rejects_empty_texture() {
        let grid = TileGrid::new(0, "tiles", 32);
        assert!(UvLayout::new(&grid, UVec2::new(0, 256), 32.0).is_none());
    }

    #[test]
    fn test_center_maps_to_tile_center() {
        let layout = layout_32_on_256();
        let uv = layout.uv_for(Vec2::ZERO, [2, 1]);
        assert!((uv - Vec2::new(0.3125, 0.1875)).length() < EPS);
    }

    #[test]
    fn test_map_face_covers_one_tile() {
        let layout = layout_32_on_256();
        let mut mesh = quad_at(Vec3::new(4.0, -3.0, 1.0), 1.0);
        assert!(map_face_uv(
            &mut mesh,
            FaceId(0),
            &Mat4::IDENTITY,
            Vec3::X,
            Vec3::Y,
            [2, 1],
            &layout
        ));

        let expected = [
            Vec2::new(0.25, 0.125),
            Vec2::new(0.375, 0.125),
            Vec2::new(0.375, 0.25),
            Vec2::new(0.25, 0.25),
        ];
        for (corner, uv) in expected.iter().enumerate() {
            let actual = mesh.loop_uv(FaceId(0), corner).unwrap();
            assert!((actual - *uv).length() < EPS, "corner {corner}: {actual:?}");
        }
        assert!(mesh.pending_changes().uvs);
    }

    #[test]
    fn test_map_face_uses_world_transform() {
        let layout = layout_32_on_256();
        // Half-size quad scaled up to one world unit
        let mut mesh = quad_at(Vec3::ZERO, 0.5);
        let to_world = Mat4::from_scale(Vec3::splat(2.0));
        map_face_uv(&mut mesh, FaceId(0), &to_world, Vec3::X, Vec3::Y, [0, 0], &layout);

        assert!((mesh.loop_uv(FaceId(0), 0).unwrap() - Vec2::ZERO).length() < EPS);
        assert!((mesh.loop_uv(FaceId(0), 2).unwrap() - Vec2::splat(0.125)).length() < EPS);
    }

    #[test]
    fn test_out_of_range_face_is_noop() {
        let layout = layout_32_on_256();
        let mut mesh = quad_at(Vec3::ZERO, 1.0);
        assert!(!map_face_uv(
            &mut mesh,
            FaceId(5),
            &Mat4::IDENTITY,
            Vec3::X,
            Vec3::Y,
            [0, 0],
            &layout
        ));
        assert!(mesh.pending_changes().is_empty());
    }
}
