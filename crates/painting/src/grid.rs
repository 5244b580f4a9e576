//! Grid math for the virtual paint grid.
//!
//! The grid is infinite and indexed from a floating origin (the host's
//! reference cursor). Cells are addressed per quadrant: before snapping, the
//! right/up basis is re-signed to point toward the sample, so cell indices are
//! always non-negative and the returned edge vectors point away from the
//! origin into the sample's quadrant.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::GRID_SNAP_EPSILON;

/// The local coordinate system of one paintable plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridFrame {
    /// Grid origin in world space
    pub origin: Vec3,
    /// Unit vector along cell columns
    pub right: Vec3,
    /// Unit vector along cell rows
    pub up: Vec3,
    /// Unit plane normal
    pub normal: Vec3,
    /// Width of one cell in world units
    pub cell_width: f32,
    /// Height of one cell in world units
    pub cell_height: f32,
}

/// A snapped grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    /// World-space corner of the cell nearest the grid origin
    pub position: Vec3,
    /// Right basis scaled to one cell width, signed toward the sample
    pub right_edge: Vec3,
    /// Up basis scaled to one cell height, signed toward the sample
    pub up_edge: Vec3,
}

impl GridFrame {
    /// Build a frame from a plane normal and up vector.
    ///
    /// `right` is derived as `up × normal`, giving a right-handed
    /// (right, up, normal) basis.
    pub fn new(origin: Vec3, normal: Vec3, up: Vec3, cell_width: f32, cell_height: f32) -> Self {
        let normal = normal.normalize_or_zero();
        let up = up.normalize_or_zero();
        Self {
            origin,
            right: up.cross(normal).normalize_or_zero(),
            up,
            normal,
            cell_width,
            cell_height,
        }
    }

    /// Build a frame whose cell size comes from a tile grid's pixel size.
    ///
    /// `world_pixels` is the number of texture pixels per world unit. Returns
    /// `None` unless both cell sizes come out positive and finite.
    pub fn from_pixels(
        origin: Vec3,
        normal: Vec3,
        up: Vec3,
        cell_pixels: [u32; 2],
        world_pixels: f32,
    ) -> Option<Self> {
        let cell_width = cell_pixels[0] as f32 / world_pixels;
        let cell_height = cell_pixels[1] as f32 / world_pixels;
        let usable = |size: f32| size.is_finite() && size > 0.0;
        if !usable(cell_width) || !usable(cell_height) {
            return None;
        }
        Some(Self::new(origin, normal, up, cell_width, cell_height))
    }

    /// Signed perpendicular distance from a point to the frame's plane
    pub fn distance_to_plane(&self, point: Vec3) -> f32 {
        (point - self.origin).dot(self.normal)
    }

    /// Snap a world-space sample to its grid cell
    pub fn cell_at(&self, sample: Vec3) -> GridCell {
        compute_grid_position(sample, self)
    }
}

/// Snap a world-space sample to the corner of its grid cell.
///
/// The right/up vectors are flipped so each has a non-negative dot product
/// with the direction from the origin to the sample. The sample is then
/// projected onto them and floored to whole cells.
///
/// Snapping a returned `position` again yields the same position. The edges
/// agree as well, except for corners on a grid line through the origin: there
/// the offset has no component to re-sign against and the frame's own
/// direction is used.
pub fn compute_grid_position(sample: Vec3, frame: &GridFrame) -> GridCell {
    let offset = sample - frame.origin;
    let direction = offset.normalize_or_zero();

    let mut right = frame.right;
    let mut up = frame.up;
    if right.dot(direction) < 0.0 {
        right = -right;
    }
    if up.dot(direction) < 0.0 {
        up = -up;
    }

    // Rounding slack in world units, scaled with the coordinates involved
    let scale = frame
        .origin
        .abs()
        .max_element()
        .max(sample.abs().max_element())
        .max(1.0);
    let slack = GRID_SNAP_EPSILON * scale;
    let x_cells = ((offset.dot(right) + slack) / frame.cell_width).floor();
    let y_cells = ((offset.dot(up) + slack) / frame.cell_height).floor();

    let right_edge = right * frame.cell_width;
    let up_edge = up * frame.cell_height;

    GridCell {
        position: frame.origin + right_edge * x_cells + up_edge * y_cells,
        right_edge,
        up_edge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn xy_frame(cell: f32) -> GridFrame {
        GridFrame::new(Vec3::ZERO, Vec3::Z, Vec3::Y, cell, cell)
    }

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert!((a - b).length() < EPS, "{a:?} != {b:?}");
    }

    #[test]
    fn test_frame_basis() {
        let frame = xy_frame(1.0);
        assert_vec_eq(frame.right, Vec3::X);
        assert_vec_eq(frame.up, Vec3::Y);
    }

    #[test]
    fn test_from_pixels() {
        let frame = GridFrame::from_pixels(Vec3::ZERO, Vec3::Z, Vec3::Y, [16, 32], 32.0).unwrap();
        assert_eq!(frame.cell_width, 0.5);
        assert_eq!(frame.cell_height, 1.0);
    }

    #[test]
    fn test_from_pixels_rejects_empty_cells() {
        assert!(GridFrame::from_pixels(Vec3::ZERO, Vec3::Z, Vec3::Y, [32, 32], 0.0).is_none());
        assert!(GridFrame::from_pixels(Vec3::ZERO, Vec3::Z, Vec3::Y, [0, 32], 32.0).is_none());
        assert!(GridFrame::from_pixels(Vec3::ZERO, Vec3::Z, Vec3::Y, [32, 0], 32.0).is_none());
        assert!(GridFrame::from_pixels(Vec3::ZERO, Vec3::Z, Vec3::Y, [32, 32], f32::NAN).is_none());
    }

    #[test]
    fn test_snap_positive_quadrant() {
        let frame = xy_frame(1.0);
        let cell = compute_grid_position(Vec3::new(2.5, 1.2, 0.0), &frame);
        assert_vec_eq(cell.position, Vec3::new(2.0, 1.0, 0.0));
        assert_vec_eq(cell.right_edge, Vec3::X);
        assert_vec_eq(cell.up_edge, Vec3::Y);
    }

    #[test]
    fn test_snap_negative_quadrant_flips_basis() {
        let frame = xy_frame(1.0);
        let cell = compute_grid_position(Vec3::new(-2.5, -0.3, 0.0), &frame);
        // Cell corner is measured outward from the origin
        assert_vec_eq(cell.position, Vec3::new(-2.0, 0.0, 0.0));
        assert_vec_eq(cell.right_edge, -Vec3::X);
        assert_vec_eq(cell.up_edge, -Vec3::Y);
    }

    #[test]
    fn test_snap_uses_cell_size() {
        let frame = GridFrame::new(Vec3::new(1.0, 1.0, 0.0), Vec3::Z, Vec3::Y, 0.5, 0.25);
        let cell = compute_grid_position(Vec3::new(2.3, 1.6, 0.0), &frame);
        assert_vec_eq(cell.position, Vec3::new(2.0, 1.5, 0.0));
        assert_vec_eq(cell.right_edge, Vec3::new(0.5, 0.0, 0.0));
        assert_vec_eq(cell.up_edge, Vec3::new(0.0, 0.25, 0.0));
    }

    #[test]
    fn test_snap_is_idempotent() {
        let frames = [
            xy_frame(1.0),
            GridFrame::new(Vec3::new(0.3, -1.7, 2.0), Vec3::X, Vec3::Z, 0.25, 0.5),
            GridFrame::new(Vec3::new(-4.0, 2.0, 1.0), -Vec3::Y, Vec3::X, 1.0 / 3.0, 0.1),
        ];
        let samples = [
            Vec3::new(2.7, 3.1, 0.0),
            Vec3::new(-1.4, 0.6, 0.0),
            Vec3::new(-0.2, -5.9, 1.0),
            Vec3::new(0.3, -1.2, 2.6),
            Vec3::new(-3.1, 2.0, 0.05),
            Vec3::new(7.77, -3.33, 4.44),
        ];

        for frame in &frames {
            for &sample in &samples {
                let first = compute_grid_position(sample, frame);
                let second = compute_grid_position(first.position, frame);
                assert_vec_eq(second.position, first.position);

                let offset = first.position - frame.origin;
                if offset.dot(frame.right).abs() > EPS && offset.dot(frame.up).abs() > EPS {
                    assert_vec_eq(second.right_edge, first.right_edge);
                    assert_vec_eq(second.up_edge, first.up_edge);
                }
            }
        }
    }

    #[test]
    fn test_resnap_on_grid_line_uses_frame_direction() {
        let frame = xy_frame(1.0);
        let first = compute_grid_position(Vec3::new(2.5, -0.3, 0.0), &frame);
        assert_vec_eq(first.position, Vec3::new(2.0, 0.0, 0.0));
        assert_vec_eq(first.up_edge, -Vec3::Y);

        let second = compute_grid_position(first.position, &frame);
        assert_vec_eq(second.position, first.position);
        assert_vec_eq(second.right_edge, Vec3::X);
        assert_vec_eq(second.up_edge, Vec3::Y);
    }

    #[test]
    fn test_sample_just_below_boundary_stays_in_cell() {
        let frame = xy_frame(1.0);
        let cell = compute_grid_position(Vec3::new(0.99995, 1.99995, 0.0), &frame);
        assert_vec_eq(cell.position, Vec3::new(0.0, 1.0, 0.0));

        let cell = compute_grid_position(Vec3::new(2.0, 1.0, 0.0), &frame);
        assert_vec_eq(cell.position, Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_sample_at_origin() {
        let frame = xy_frame(1.0);
        let cell = compute_grid_position(Vec3::ZERO, &frame);
        assert_vec_eq(cell.position, Vec3::ZERO);
        assert_vec_eq(cell.right_edge, Vec3::X);
        assert_vec_eq(cell.up_edge, Vec3::Y);
    }

    #[test]
    fn test_distance_to_plane() {
        let frame = GridFrame::new(Vec3::new(0.0, 0.0, 2.0), Vec3::Z, Vec3::Y, 1.0, 1.0);
        assert!((frame.distance_to_plane(Vec3::new(5.0, 5.0, 3.0)) - 1.0).abs() < EPS);
        assert!((frame.distance_to_plane(Vec3::new(5.0, 5.0, 2.0))).abs() < EPS);
    }
}
