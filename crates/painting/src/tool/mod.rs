//! Tile tool orchestrator
//!
//! [`TileTool`] is the per-session state machine the host drives with
//! [`ToolEvent`]s. It owns the target mesh together with its spatial index
//! for the duration of one interactive session and composes the grid, axis,
//! intersection, face synthesis, UV and virtual cursor utilities.
//!
//! States:
//! - `Idle` - nothing held
//! - `Painting` / `Building` - primary button held, per the paint mode at press time
//! - `Snapping` - snap modifier held, the reference cursor follows the pointer

mod events;
mod plane;
mod snap;
mod stroke;
mod view;

pub use events::{ToolEvent, ToolState, Transition};
pub use plane::{AxisRefresh, PaintPlane};
pub use view::{ViewContext, ViewState};

use glam::{Mat4, Vec2};
use tessella_config::{PaintMode, ToolSettings};
use tracing::{debug, info};

use crate::cursor::VirtualCursor;
use crate::error::ToolError;
use crate::mesh::EditableMesh;
use crate::provider::TileGridProvider;
use crate::session::MeshSession;

/// Host collaborators handed to the tool for one call
pub struct ToolContext<'a> {
    pub view: &'a mut dyn ViewContext,
    pub grids: &'a dyn TileGridProvider,
    pub settings: &'a ToolSettings,
}

impl<'a> ToolContext<'a> {
    pub fn new(
        view: &'a mut dyn ViewContext,
        grids: &'a dyn TileGridProvider,
        settings: &'a ToolSettings,
    ) -> Self {
        Self {
            view,
            grids,
            settings,
        }
    }
}

/// The object the tool is started on
#[derive(Debug)]
pub struct ActivationTarget<M> {
    /// Editable mesh data, `None` when the object is not a mesh
    pub mesh: Option<M>,
    /// Object to world transform
    pub transform: Mat4,
    pub visible: bool,
}

impl<M> ActivationTarget<M> {
    /// A visible mesh object
    pub fn mesh(mesh: M, transform: Mat4) -> Self {
        Self {
            mesh: Some(mesh),
            transform,
            visible: true,
        }
    }
}

/// Interactive tile painting session over one mesh
#[derive(Debug)]
pub struct TileTool<M> {
    session: MeshSession<M>,
    grid_id: u32,
    state: ToolState,
    plane: PaintPlane,
    virtual_cursor: VirtualCursor,
    snap_held: bool,
    active: bool,
}

impl<M: EditableMesh> TileTool<M> {
    /// Start a session on `target` painting with grid `grid_id`.
    ///
    /// Fails when the target is not a visible mesh, an overlay owns the
    /// pointer, or the grid is unknown.
    pub fn activate(
        target: ActivationTarget<M>,
        grid_id: u32,
        ctx: &ToolContext,
    ) -> Result<Self, ToolError> {
        let mesh = target.mesh.ok_or(ToolError::NotAMesh)?;
        if !target.visible {
            return Err(ToolError::TargetHidden);
        }
        if ctx.view.gui_owns_pointer() {
            return Err(ToolError::PointerCaptured);
        }
        if ctx.grids.grid(grid_id).is_none() {
            return Err(ToolError::UnknownGrid(grid_id));
        }

        let mut tool = Self {
            session: MeshSession::new(mesh, target.transform),
            grid_id,
            state: ToolState::Idle,
            plane: PaintPlane::from_settings(ctx.settings),
            virtual_cursor: VirtualCursor::new(ctx.settings.tolerances.min_cursor_motion),
            snap_held: false,
            active: true,
        };
        tool.refresh_view_axis(ctx);

        info!(
            "Tile tool started: grid {}, {} faces",
            grid_id,
            tool.session.mesh().face_count()
        );
        Ok(tool)
    }

    /// End the session and hand the mesh back to the host.
    ///
    /// Change flags recorded during the session stay on the mesh for the
    /// host to drain.
    pub fn deactivate(mut self) -> M {
        if self.active {
            self.exit();
        }
        self.session.into_mesh()
    }

    pub fn state(&self) -> ToolState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn plane(&self) -> &PaintPlane {
        &self.plane
    }

    pub fn virtual_cursor(&self) -> &VirtualCursor {
        &self.virtual_cursor
    }

    pub fn session(&self) -> &MeshSession<M> {
        &self.session
    }

    pub fn mesh(&self) -> &M {
        self.session.mesh()
    }

    pub fn grid_id(&self) -> u32 {
        self.grid_id
    }

    /// Move the object; the spatial index stays valid since it is built in local space
    pub fn set_transform(&mut self, transform: Mat4) {
        self.session.set_transform(transform);
    }

    /// Drive the state machine with one event
    pub fn handle(&mut self, event: ToolEvent, ctx: &mut ToolContext) -> Transition {
        if !self.active {
            return Transition::PassThrough;
        }

        match event {
            ToolEvent::Tick => {
                self.refresh_view_axis(ctx);
                Transition::PassThrough
            }
            ToolEvent::GeometryChanged => {
                debug!("Mesh changed externally, rebuilding spatial index");
                self.session.rebuild();
                Transition::Handled(self.state)
            }
            ToolEvent::Cancel => {
                if ctx.view.gui_owns_pointer() {
                    return Transition::PassThrough;
                }
                self.exit();
                Transition::Exit
            }
            ToolEvent::SnapModifier { pressed } => {
                self.snap_held = pressed;
                match (self.state, pressed) {
                    (ToolState::Idle, true) => self.set_state(ToolState::Snapping),
                    (ToolState::Snapping, false) => self.set_state(ToolState::Idle),
                    _ => {}
                }
                Transition::Handled(self.state)
            }
            ToolEvent::PointerPress { pointer } => {
                if !self.accepts_pointer(pointer, ctx) {
                    return Transition::PassThrough;
                }
                let state = match ctx.settings.paint_mode {
                    PaintMode::Paint => ToolState::Painting,
                    PaintMode::MakeFace => ToolState::Building,
                };
                self.set_state(state);
                if !self.session.is_indexed() {
                    self.session.rebuild();
                }
                self.execute_tool(pointer, ctx);
                Transition::Handled(self.state)
            }
            ToolEvent::PointerMove { pointer } => {
                if !self.accepts_pointer(pointer, ctx) {
                    return Transition::PassThrough;
                }
                match self.state {
                    ToolState::Painting | ToolState::Building => {
                        self.execute_tool(pointer, ctx);
                        Transition::Handled(self.state)
                    }
                    ToolState::Snapping => {
                        self.cursor_snap(pointer, ctx);
                        Transition::Handled(self.state)
                    }
                    ToolState::Idle => Transition::PassThrough,
                }
            }
            ToolEvent::PointerRelease => {
                if !self.state.is_stroke() {
                    return Transition::PassThrough;
                }
                let next = if self.snap_held {
                    ToolState::Snapping
                } else {
                    ToolState::Idle
                };
                self.set_state(next);
                Transition::Commit
            }
        }
    }

    fn accepts_pointer(&self, pointer: Vec2, ctx: &ToolContext) -> bool {
        !ctx.view.gui_owns_pointer() && ctx.view.contains_pointer(pointer)
    }

    fn set_state(&mut self, state: ToolState) {
        if state != self.state {
            info!("Tile tool: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Re-derive the paint plane from the view unless the normal is locked
    fn refresh_view_axis(&mut self, ctx: &ToolContext) {
        if ctx.settings.lock_normal {
            return;
        }
        match self
            .plane
            .refresh(ctx.view.view_forward(), ctx.view.view_up())
        {
            AxisRefresh::Degenerate => {
                debug!("View axes snapped to the same axis, keeping previous plane");
            }
            AxisRefresh::Updated { mode_changed } => {
                if mode_changed {
                    debug!("Paint plane now {:?}, virtual cursor reset", self.plane.mode);
                    self.virtual_cursor.clear();
                }
            }
        }
    }

    fn exit(&mut self) {
        self.session.release();
        self.virtual_cursor.clear();
        self.state = ToolState::Idle;
        self.snap_held = false;
        self.active = false;
        info!("Tile tool exited");
    }
}
