//! Tessella tile painting core
//!
//! This crate turns pointer rays into grid-aligned texture painting on a mesh:
//! - [`grid`] - infinite virtual grid snapping
//! - [`axis`] - snapping view directions to world axes
//! - [`raycast`] / [`spatial`] - ray/plane, ray/mesh and nearest-point queries
//! - [`session`] - the mesh with its spatial index, and quad synthesis
//! - [`cursor`] - virtual cursor history and stroke direction prediction
//! - [`uv`] - tile atlas UV projection
//! - [`tool`] - the event-driven paint/build orchestrator
//!
//! The host owns the scene, input loop and undo history. It hands the tool a
//! mesh implementing [`EditableMesh`], a [`ViewContext`] and a
//! [`TileGridProvider`], then feeds it [`ToolEvent`]s.

pub mod axis;
pub mod constants;
pub mod cursor;
pub mod error;
pub mod grid;
pub mod mesh;
pub mod provider;
pub mod raycast;
pub mod session;
pub mod spatial;
pub mod tool;
pub mod uv;

#[cfg(feature = "bevy")]
mod bevy_mesh;

pub use axis::*;
pub use constants::*;
pub use cursor::*;
pub use error::*;
pub use grid::*;
pub use mesh::*;
pub use provider::*;
pub use raycast::*;
pub use session::*;
pub use spatial::*;
pub use tool::*;
pub use uv::*;
