/// Number of recent hit positions the virtual cursor remembers.
pub const VIRTUAL_CURSOR_CAPACITY: usize = 3;

/// Denominator below which a ray is treated as parallel to a plane.
pub const RAY_PARALLEL_EPSILON: f32 = 1e-6;

/// Epsilon for ray-triangle intersection determinants and hit distances.
pub const RAY_EPSILON: f32 = 1e-6;

/// Slack, relative to the magnitude of the coordinates, added before flooring
/// to cells so a point already on a cell corner never rounds down into the
/// previous cell.
pub const GRID_SNAP_EPSILON: f32 = 1e-5;

/// Maximum triangles stored in a single BVH leaf.
pub const BVH_LEAF_SIZE: usize = 4;
