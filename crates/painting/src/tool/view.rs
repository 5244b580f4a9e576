//! Viewport access for the tile tool.
//!
//! [`ViewContext`] is the host-facing seam: pointer rays, view axes, the
//! reference cursor and the overlay flag. [`ViewState`] is a plain perspective
//! camera that implements it for hosts without their own viewport type.

use glam::{Mat3, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::raycast::Ray;

/// What the tool needs from the host viewport
pub trait ViewContext {
    /// World-space ray through region pixel coordinates (origin bottom-left)
    fn ray_from_pointer(&self, pointer: Vec2) -> Ray;

    /// Whether pointer coordinates lie inside the viewport region
    fn contains_pointer(&self, pointer: Vec2) -> bool;

    /// Unit view direction through the region center
    fn view_forward(&self) -> Vec3;

    /// Unit up direction of the view
    fn view_up(&self) -> Vec3;

    /// The host's reference cursor (grid origin)
    fn cursor_location(&self) -> Vec3;

    fn set_cursor_location(&mut self, location: Vec3);

    /// True while an on-screen overlay owns the pointer
    fn gui_owns_pointer(&self) -> bool;
}

/// Perspective viewport with a reference cursor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    /// Camera position in world space
    pub position: Vec3,
    /// Camera orientation; the camera looks down its local -Z with +Y up
    pub rotation: Quat,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Region size in pixels
    pub viewport: Vec2,
    /// Reference cursor location
    pub cursor: Vec3,
    /// Overlay-owns-pointer flag
    pub gui_owns_pointer: bool,
}

impl ViewState {
    /// Camera at `eye` looking at `target`
    ///
    /// # Arguments
    /// * `eye` - Camera position in world space
    /// * `target` - Point the camera looks at
    /// * `up` - Approximate up direction (must not be parallel to the view)
    /// * `fov_y` - Vertical field of view in radians
    /// * `viewport` - Region size in pixels
    pub fn looking_at(eye: Vec3, target: Vec3, up: Vec3, fov_y: f32, viewport: Vec2) -> Self {
        let forward = (target - eye).normalize_or_zero();
        let right = forward.cross(up).normalize_or_zero();
        let up = right.cross(forward);
        let rotation = Quat::from_mat3(&Mat3::from_cols(right, up, -forward));
        Self {
            position: eye,
            rotation,
            fov_y,
            viewport,
            cursor: Vec3::ZERO,
            gui_owns_pointer: false,
        }
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Width over height, falling back to 1 for an empty region
    pub fn aspect_ratio(&self) -> f32 {
        if self.viewport.y > 0.0 {
            self.viewport.x / self.viewport.y
        } else {
            1.0
        }
    }
}

impl ViewContext for ViewState {
    fn ray_from_pointer(&self, pointer: Vec2) -> Ray {
        let size = self.viewport.max(Vec2::ONE);
        // Region pixels to NDC (-1 to 1)
        let ndc = pointer / size * 2.0 - Vec2::ONE;
        let half_fov = (self.fov_y * 0.5).tan();

        let direction = self.view_forward()
            + self.right() * ndc.x * self.aspect_ratio() * half_fov
            + self.view_up() * ndc.y * half_fov;
        Ray::new(self.position, direction.normalize_or_zero())
    }

    fn contains_pointer(&self, pointer: Vec2) -> bool {
        pointer.x >= 0.0
            && pointer.y >= 0.0
            && pointer.x <= self.viewport.x
            && pointer.y <= self.viewport.y
    }

    fn view_forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    fn view_up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    fn cursor_location(&self) -> Vec3 {
        self.cursor
    }

    fn set_cursor_location(&mut self, location: Vec3) {
        self.cursor = location;
    }

    fn gui_owns_pointer(&self) -> bool {
        self.gui_owns_pointer
    }
}
