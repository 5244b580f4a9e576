//! The paint plane: axis-aligned normal and up vector derived from the view.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tessella_config::{NormalMode, ToolSettings};

use crate::axis::{normal_mode_of, snap_to_nearest_axis};
use crate::grid::GridFrame;

/// Result of re-deriving the plane from the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisRefresh {
    /// Snapped normal and up were not perpendicular; the plane was kept
    Degenerate,
    /// Plane updated; `mode_changed` is set when the normal moved to another world axis
    Updated { mode_changed: bool },
}

/// Orientation of the virtual paint grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaintPlane {
    pub normal: Vec3,
    pub up: Vec3,
    pub mode: NormalMode,
}

impl PaintPlane {
    pub fn new(normal: Vec3, up: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            up: up.normalize_or_zero(),
            mode: normal_mode_of(normal),
        }
    }

    /// Plane stored in the tool settings
    pub fn from_settings(settings: &ToolSettings) -> Self {
        Self::new(
            Vec3::from_array(settings.paint_normal),
            Vec3::from_array(settings.paint_up),
        )
    }

    /// `up × normal`
    pub fn right(&self) -> Vec3 {
        self.up.cross(self.normal).normalize_or_zero()
    }

    /// Snap the plane to the view.
    ///
    /// The normal faces the viewer (mirrored forward axis), the up vector
    /// follows the view's up axis.
    pub fn refresh(&mut self, view_forward: Vec3, view_up: Vec3) -> AxisRefresh {
        let normal = snap_to_nearest_axis(view_forward, true);
        let up = snap_to_nearest_axis(view_up, false);

        // Snapped axes are exact, so any overlap means both landed on one axis
        if normal.dot(up) != 0.0 {
            return AxisRefresh::Degenerate;
        }

        self.normal = normal;
        self.up = up;
        let mode = normal_mode_of(normal);
        let mode_changed = mode != self.mode;
        self.mode = mode;
        AxisRefresh::Updated { mode_changed }
    }

    /// Grid frame anchored at `origin` with cells sized from pixels, `None` for empty cells
    pub fn frame(
        &self,
        origin: Vec3,
        cell_pixels: [u32; 2],
        world_pixels: f32,
    ) -> Option<GridFrame> {
        GridFrame::from_pixels(origin, self.normal, self.up, cell_pixels, world_pixels)
    }
}
