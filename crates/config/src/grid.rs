//! Tile grid records and the library that owns them.

use serde::{Deserialize, Serialize};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

/// One tile grid: how a texture atlas is cut into cells and which cell is selected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    /// Identifier the painted object refers to
    pub id: u32,
    /// Display name
    pub name: String,
    /// Cell size in texture pixels (width, height)
    pub cell_size: [u32; 2],
    /// Name of the atlas texture, if one is assigned
    pub texture: Option<String>,
    /// Selected tile (column, row)
    pub tile_selection: [u32; 2],
    /// Name of the material faces painted with this grid receive
    pub material: Option<String>,
}

impl TileGrid {
    /// Create a grid with square cells and no texture or material assigned
    pub fn new(id: u32, name: impl Into<String>, cell_pixels: u32) -> Self {
        Self {
            id,
            name: name.into(),
            cell_size: [cell_pixels, cell_pixels],
            texture: None,
            tile_selection: [0, 0],
            material: None,
        }
    }

    /// Assign the atlas texture by name
    pub fn with_texture(mut self, texture: impl Into<String>) -> Self {
        self.texture = Some(texture.into());
        self
    }

    /// Assign the material by name
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    /// Select the tile at (column, row)
    pub fn select_tile(&mut self, column: u32, row: u32) {
        self.tile_selection = [column, row];
    }
}

/// Size of an atlas texture in pixels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl TextureInfo {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }
}

/// All tile grids, textures and material names known to the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
pub struct GridLibrary {
    pub grids: Vec<TileGrid>,
    pub textures: Vec<TextureInfo>,
    /// Material names, indexed the way the mesh stores face material indices
    pub materials: Vec<String>,
}

impl GridLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a grid by its identifier
    pub fn grid(&self, id: u32) -> Option<&TileGrid> {
        self.grids.iter().find(|g| g.id == id)
    }

    /// Find a grid by its identifier for editing (e.g. changing the tile selection)
    pub fn grid_mut(&mut self, id: u32) -> Option<&mut TileGrid> {
        self.grids.iter_mut().find(|g| g.id == id)
    }

    /// Find a texture by name
    pub fn texture(&self, name: &str) -> Option<&TextureInfo> {
        self.textures.iter().find(|t| t.name == name)
    }

    /// Index of a material by name
    pub fn material_index(&self, name: &str) -> Option<u32> {
        self.materials
            .iter()
            .position(|m| m == name)
            .map(|idx| idx as u32)
    }

    pub fn add_grid(&mut self, grid: TileGrid) -> &mut Self {
        self.grids.push(grid);
        self
    }

    pub fn add_texture(&mut self, texture: TextureInfo) -> &mut Self {
        self.textures.push(texture);
        self
    }

    /// Register a material name, returning its index
    pub fn add_material(&mut self, name: impl Into<String>) -> u32 {
        let name = name.into();
        if let Some(idx) = self.material_index(&name) {
            return idx;
        }
        self.materials.push(name);
        (self.materials.len() - 1) as u32
    }
}
