//! Input events delivered by the host and the transitions returned for them

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One externally delivered input event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ToolEvent {
    /// Primary button pressed at region pixel coordinates (origin bottom-left)
    PointerPress { pointer: Vec2 },
    /// Pointer moved, with or without the button held
    PointerMove { pointer: Vec2 },
    /// Primary button released
    PointerRelease,
    /// Cursor-snap modifier key changed
    SnapModifier { pressed: bool },
    /// Pointer cancel or escape: leave the tool
    Cancel,
    /// Periodic timer, see [`tessella_config::VIEW_AXIS_INTERVAL_MS`]
    Tick,
    /// The mesh was changed outside the tool (undo/redo)
    GeometryChanged,
}

/// Interaction state of the tile tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToolState {
    /// No button held
    #[default]
    Idle,
    /// Button held in paint mode
    Painting,
    /// Button held in build mode
    Building,
    /// Snap modifier held, reference cursor follows the pointer
    Snapping,
}

impl ToolState {
    /// Whether a stroke is in progress
    pub fn is_stroke(&self) -> bool {
        matches!(self, ToolState::Painting | ToolState::Building)
    }
}

/// What the host should do after an event was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// Event consumed; the tool is now in the given state
    Handled(ToolState),
    /// A stroke finished; the host may push an undo step
    Commit,
    /// Event not consumed; the host should process it
    PassThrough,
    /// The tool released its session and no longer handles events
    Exit,
}
