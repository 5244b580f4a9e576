//! Paint and build strokes

use glam::{Vec2, Vec3};
use tessella_config::TileGrid;
use tracing::{debug, trace, warn};

use super::{TileTool, ToolContext, ToolState};
use crate::cursor::SampleOutcome;
use crate::mesh::{EditableMesh, FaceId};
use crate::raycast::{Ray, distance_point_to_plane, ray_plane_intersection};
use crate::session::Winding;
use crate::spatial::SurfaceHit;
use crate::uv::UvLayout;

impl<M: EditableMesh> TileTool<M> {
    /// Run the active stroke for one pointer position
    pub(super) fn execute_tool(&mut self, pointer: Vec2, ctx: &mut ToolContext) {
        self.refresh_view_axis(ctx);
        if !self.session.is_indexed() {
            return;
        }
        let grids = ctx.grids;
        let Some(grid) = grids.grid(self.grid_id) else {
            warn!("Tile grid {} no longer exists", self.grid_id);
            return;
        };

        let ray = ctx.view.ray_from_pointer(pointer);
        trace!("Stroke ray {:?} -> {:?}", ray.origin, ray.direction);

        match self.state {
            ToolState::Painting => self.execute_paint(&ray, grid, ctx),
            ToolState::Building => self.execute_build(&ray, grid, ctx),
            ToolState::Idle | ToolState::Snapping => {}
        }
    }

    /// Re-map the face under the pointer
    fn execute_paint(&mut self, ray: &Ray, grid: &TileGrid, ctx: &mut ToolContext) {
        let Some(hit) = self.session.raycast_world(ray) else {
            return;
        };
        self.record_sample(hit.position);
        self.paint_face(hit.face, grid, ctx);
    }

    /// Build a grid-aligned face on the paint plane, or paint the face already there
    fn execute_build(&mut self, ray: &Ray, grid: &TileGrid, ctx: &mut ToolContext) {
        let plane = self.plane;
        let origin = ctx.view.cursor_location();

        if let Some(hit) = self.session.raycast_world(ray) {
            if self.lies_on_plane(&hit, origin, ctx) {
                debug!("Hit face {:?} lies on the paint plane, painting it", hit.face);
                self.record_sample(hit.position);
                self.paint_face(hit.face, grid, ctx);
                self.flow_cursor(hit.face, hit.position, ctx);
                return;
            }
        }

        let Some(plane_hit) = ray_plane_intersection(ray, origin, plane.normal) else {
            return;
        };
        let Some(frame) = plane.frame(origin, grid.cell_size, ctx.settings.world_pixels_f32())
        else {
            warn!(
                "Grid {} cell size {:?} at {} pixels per unit gives no usable cells, nothing built",
                grid.id, grid.cell_size, ctx.settings.world_pixels
            );
            return;
        };
        let cell = frame.cell_at(plane_hit);
        self.record_sample(plane_hit);

        let winding = Winding::for_cell(cell.right_edge, cell.up_edge, plane.right(), plane.up);
        let face = match self.session.build_face(
            self.session.to_local_point(cell.position),
            self.session.to_local_vector(cell.right_edge),
            self.session.to_local_vector(cell.up_edge),
            winding,
        ) {
            Ok(face) => face,
            Err(e) => {
                warn!("Failed to build face at {:?}: {}", cell.position, e);
                return;
            }
        };

        self.paint_face(face, grid, ctx);
        self.flow_cursor(face, plane_hit, ctx);
    }

    /// Face normal (anti-)parallel to the plane normal and hit point on the plane
    fn lies_on_plane(&self, hit: &SurfaceHit, origin: Vec3, ctx: &ToolContext) -> bool {
        let tolerances = &ctx.settings.tolerances;
        let alignment = 1.0 - self.plane.normal.dot(hit.normal).abs();
        let distance = distance_point_to_plane(hit.position, origin, self.plane.normal);
        trace!("Hit alignment {}, plane distance {}", alignment, distance);
        alignment < tolerances.normal_alignment && distance.abs() < tolerances.coplanar_distance
    }

    fn record_sample(&mut self, position: Vec3) {
        if self.virtual_cursor.add_sample(position) == SampleOutcome::Reset {
            debug!("Stroke reversed, virtual cursor reset at {:?}", position);
        }
    }

    /// Apply the selected tile and the grid's material to a face
    fn paint_face(&mut self, face: FaceId, grid: &TileGrid, ctx: &ToolContext) {
        let layout = grid
            .texture
            .as_deref()
            .and_then(|name| ctx.grids.texture_size(name))
            .and_then(|size| UvLayout::new(grid, size, ctx.settings.world_pixels_f32()));

        match layout {
            Some(layout) => {
                self.session.map_face_uv(
                    face,
                    self.plane.right(),
                    self.plane.up,
                    grid.tile_selection,
                    &layout,
                );
            }
            None => warn!("Grid {} has no usable texture, UVs left unchanged", grid.id),
        }

        if let Some(name) = grid.material.as_deref() {
            match ctx.grids.material_index(name) {
                Some(index) => {
                    self.session.assign_material(face, index);
                }
                None => warn!("Unknown material '{}' on grid {}", name, grid.id),
            }
        }
    }

    /// Move the reference cursor to the face corner ahead of the stroke
    fn flow_cursor(&mut self, face: FaceId, position: Vec3, ctx: &mut ToolContext) {
        if !ctx.settings.cursor_flow {
            return;
        }
        let Some(vertices) = self.session.face_world_positions(face) else {
            return;
        };
        if let Some(next) = self.virtual_cursor.predict_next_on_face(&vertices, position) {
            trace!("Cursor flowed to {:?}", next);
            ctx.view.set_cursor_location(next);
        }
    }
}
