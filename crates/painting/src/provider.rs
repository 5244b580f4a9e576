//! Read-only access to tile grid configuration.

use glam::UVec2;
use tessella_config::{GridLibrary, TileGrid};

/// Lookup of grids, atlas sizes and material indices owned by the host
pub trait TileGridProvider {
    /// Grid by identifier
    fn grid(&self, id: u32) -> Option<&TileGrid>;

    /// Pixel size of a texture by name
    fn texture_size(&self, name: &str) -> Option<UVec2>;

    /// Face material index for a material name
    fn material_index(&self, name: &str) -> Option<u32>;
}

impl TileGridProvider for GridLibrary {
    fn grid(&self, id: u32) -> Option<&TileGrid> {
        GridLibrary::grid(self, id)
    }

    fn texture_size(&self, name: &str) -> Option<UVec2> {
        self.texture(name).map(|t| UVec2::new(t.width, t.height))
    }

    fn material_index(&self, name: &str) -> Option<u32> {
        GridLibrary::material_index(self, name)
    }
}
