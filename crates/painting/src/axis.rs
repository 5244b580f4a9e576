//! Snapping arbitrary directions to principal world axes.

use glam::Vec3;
use tessella_config::NormalMode;

/// World axes in tie-break priority order
const AXES: [Vec3; 3] = [Vec3::X, Vec3::Y, Vec3::Z];

/// Snap a direction to the closest world axis.
///
/// The axis with the smallest `1 - |dot|` wins; exact ties go to the first
/// axis in X, Y, Z order. The result points the same way as `direction` along
/// that axis, or the opposite way when `mirrored` is set.
///
/// A zero-length direction snaps to +X.
pub fn snap_to_nearest_axis(direction: Vec3, mirrored: bool) -> Vec3 {
    let dir = direction.normalize_or_zero();

    let mut best = AXES[0];
    let mut best_score = f32::INFINITY;
    for axis in AXES {
        let score = 1.0 - dir.dot(axis).abs();
        if score < best_score {
            best_score = score;
            best = axis;
        }
    }

    let along = dir.dot(best);
    if (!mirrored && along < 0.0) || (mirrored && along > 0.0) {
        -best
    } else {
        best
    }
}

/// Which world axis an axis-aligned normal lies on
pub fn normal_mode_of(normal: Vec3) -> NormalMode {
    if normal.x.abs() > 0.0 {
        NormalMode::X
    } else if normal.y.abs() > 0.0 {
        NormalMode::Y
    } else {
        NormalMode::Z
    }
}
