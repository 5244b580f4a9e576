//! Reference cursor snapping while the snap modifier is held

use glam::{Vec2, Vec3};
use tessella_config::CursorSnapMode;
use tracing::trace;

use super::{TileTool, ToolContext};
use crate::mesh::EditableMesh;
use crate::raycast::{Ray, ray_plane_intersection};

impl<M: EditableMesh> TileTool<M> {
    /// Move the reference cursor to the grid corner or mesh vertex under the pointer
    pub(super) fn cursor_snap(&mut self, pointer: Vec2, ctx: &mut ToolContext) {
        self.refresh_view_axis(ctx);
        if !self.session.is_indexed() || ctx.view.gui_owns_pointer() {
            return;
        }
        let ray = ctx.view.ray_from_pointer(pointer);

        let target = match ctx.settings.cursor_snap {
            CursorSnapMode::Grid => self.snap_to_grid(&ray, ctx),
            CursorSnapMode::Vertex => self.snap_to_vertex(&ray),
        };
        if let Some(location) = target {
            trace!("Cursor snapped to {:?}", location);
            ctx.view.set_cursor_location(location);
        }
    }

    /// Corner of the grid cell under the pointer
    fn snap_to_grid(&self, ray: &Ray, ctx: &ToolContext) -> Option<Vec3> {
        let origin = ctx.view.cursor_location();
        let location = ray_plane_intersection(ray, origin, self.plane.normal)?;
        let grid = ctx.grids.grid(self.grid_id)?;
        let frame = self
            .plane
            .frame(origin, grid.cell_size, ctx.settings.world_pixels_f32())?;
        Some(frame.cell_at(location).position)
    }

    /// Vertex of the face under the pointer closest to the hit
    fn snap_to_vertex(&self, ray: &Ray) -> Option<Vec3> {
        let hit = self.session.raycast_world(ray)?;
        let nearest = self
            .session
            .nearest_point_local(self.session.to_local_point(hit.position))?;

        let closest = self
            .session
            .mesh()
            .face_positions(nearest.face)?
            .into_iter()
            .min_by(|a, b| {
                a.distance_squared(nearest.position)
                    .total_cmp(&b.distance_squared(nearest.position))
            })?;
        Some(self.session.to_world_point(closest))
    }
}
