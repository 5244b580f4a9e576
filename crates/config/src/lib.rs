//! Shared configuration for Tessella
//!
//! This crate provides the plain-data records the host application owns and
//! the tile painting core reads: tool settings, interaction tolerances, and
//! the library of tile grids with their textures and materials.
//!
//! Nothing here is persisted by the core. Hosts are free to serialize these
//! records (they all derive serde) alongside their own scene data.

mod grid;

pub use grid::{GridLibrary, TextureInfo, TileGrid};

use serde::{Deserialize, Serialize};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

/// Default number of texture pixels covered by one world unit
pub const DEFAULT_WORLD_PIXELS: u32 = 32;

/// Default maximum distance from the reference plane still treated as on-plane
pub const DEFAULT_COPLANAR_DISTANCE: f32 = 0.05;

/// Default tolerance on `1 - |dot|` when comparing a face normal to the plane normal
pub const DEFAULT_NORMAL_ALIGNMENT: f32 = 0.05;

/// Default minimum world-space motion before a new virtual cursor sample is accepted
pub const DEFAULT_MIN_CURSOR_MOTION: f32 = 0.1;

/// Cadence of the periodic view-axis refresh, in milliseconds
pub const VIEW_AXIS_INTERVAL_MS: u64 = 100;

/// What a held pointer does to the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaintMode {
    /// Re-map UVs and material of existing faces under the pointer
    #[default]
    Paint,
    /// Build new grid-aligned faces on the paint plane
    MakeFace,
}

/// How the reference cursor snaps while the snap modifier is held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CursorSnapMode {
    /// Snap to the nearest grid cell corner on the paint plane
    #[default]
    Grid,
    /// Snap to the closest vertex of the face under the pointer
    Vertex,
}

/// World axis the paint plane normal currently lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NormalMode {
    X,
    Y,
    #[default]
    Z,
}

/// Tolerances tuned for interactive feel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Perpendicular distance below which a hit point counts as on the paint plane
    pub coplanar_distance: f32,
    /// Maximum `1 - |dot(face normal, plane normal)|` for a face to count as aligned
    pub normal_alignment: f32,
    /// Minimum distance between consecutive virtual cursor samples
    pub min_cursor_motion: f32,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            coplanar_distance: DEFAULT_COPLANAR_DISTANCE,
            normal_alignment: DEFAULT_NORMAL_ALIGNMENT,
            min_cursor_motion: DEFAULT_MIN_CURSOR_MOTION,
        }
    }
}

/// Tool settings owned by the host and read by the painting core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
pub struct ToolSettings {
    /// Paint existing faces or build new ones
    pub paint_mode: PaintMode,
    /// Keep the paint plane fixed instead of following the view
    pub lock_normal: bool,
    /// Move the reference cursor along the stroke direction after each hit
    pub cursor_flow: bool,
    /// Snap behaviour while the snap modifier is held
    pub cursor_snap: CursorSnapMode,
    /// Texture pixels per world unit
    pub world_pixels: u32,
    /// Initial paint plane normal (used until the view axis is first derived)
    pub paint_normal: [f32; 3],
    /// Initial paint plane up vector
    pub paint_up: [f32; 3],
    /// Interaction tolerances
    pub tolerances: Tolerances,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            paint_mode: PaintMode::default(),
            lock_normal: false,
            cursor_flow: false,
            cursor_snap: CursorSnapMode::default(),
            world_pixels: DEFAULT_WORLD_PIXELS,
            paint_normal: [0.0, 0.0, 1.0],
            paint_up: [0.0, 1.0, 0.0],
            tolerances: Tolerances::default(),
        }
    }
}

impl ToolSettings {
    /// Create settings for the given paint mode, everything else default
    pub fn with_mode(paint_mode: PaintMode) -> Self {
        Self {
            paint_mode,
            ..Self::default()
        }
    }

    /// World pixels as f32 for calculations
    pub fn world_pixels_f32(&self) -> f32 {
        self.world_pixels as f32
    }
}
