use thiserror::Error;

use crate::mesh::{FaceId, VertexId};

/// Errors that can occur while editing or importing a mesh
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("Vertex {0:?} does not exist")]
    InvalidVertex(VertexId),
    #[error("Face needs at least 3 vertices, got {0}")]
    DegenerateFace(usize),
    #[error("Face {0:?} does not exist")]
    FaceOutOfRange(FaceId),
    #[error("Face {face:?} has no corner {corner}")]
    CornerOutOfRange { face: FaceId, corner: usize },
    #[error("Mesh has no position attribute")]
    NoPositions,
    #[error("Mesh has no indices")]
    NoIndices,
    #[error("Invalid mesh topology: {0}")]
    InvalidTopology(String),
}

/// Reasons the tile tool refuses to start
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Active object must be a mesh")]
    NotAMesh,
    #[error("Active object must be visible")]
    TargetHidden,
    #[error("Pointer is owned by an overlay")]
    PointerCaptured,
    #[error("Tile grid {0} does not exist")]
    UnknownGrid(u32),
}
