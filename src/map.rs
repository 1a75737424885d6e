use std::path::Path;

use macroquad::math::{uvec2, vec2, UVec2, Vec2};
use tracing::{info, warn};

use crate::error::Result;
use crate::layer::{LayerNode, TileLayer};
use crate::loader::json_loader::{decode_map_file, decode_map_str, tileset_path_for};
use crate::render::cull::CullBounds;
use crate::render::surface::Surface;
use crate::render::Renderer;
use crate::tileset::{Tileset, TilesetCollection};

/// Horizontal flip flag of a global tile id.
pub const FLIP_H: u32 = 0x8000_0000; // bit 31
/// Vertical flip flag.
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
/// Diagonal flip flag.
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
/// Id bits of a global tile id.
pub const GID_MASK: u32 = 0x1FFF_FFFF; // keep lower 29 bits

/// Points a range of global tile ids at a tileset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilesetRef {
    /// First global id served by the tileset.
    pub firstgid: u32,
    /// Tileset file as written in the map.
    pub source: String,
}

impl TilesetRef {
    /// Reference to `source` starting at `firstgid`.
    pub fn new(firstgid: u32, source: impl Into<String>) -> Self {
        Self {
            firstgid,
            source: source.into(),
        }
    }

    /// Key of the referenced tileset: `source` without directories or extension.
    pub fn tileset_name(&self) -> &str {
        Path::new(&self.source)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.source)
    }
}

/// A tile grid anchored at `position`, made of a tree of layers.
#[derive(Debug, Clone)]
pub struct TileMap {
    /// World position of the map's centre.
    pub position: Vec2,
    /// Grid cell width.
    pub tile_width: u32,
    /// Grid cell height.
    pub tile_height: u32,
    /// Columns.
    pub width: u32,
    /// Rows.
    pub height: u32,
    /// Layer tree in draw order.
    pub layers: Vec<LayerNode>,
    tileset_refs: Vec<TilesetRef>,
}

impl TileMap {
    /// Map centred on the world origin. `tileset_refs` may come in any order.
    pub fn new(
        tile_width: u32,
        tile_height: u32,
        width: u32,
        height: u32,
        mut tileset_refs: Vec<TilesetRef>,
        layers: Vec<LayerNode>,
    ) -> Self {
        tileset_refs.sort_by_key(|r| r.firstgid);
        Self {
            position: Vec2::ZERO,
            tile_width,
            tile_height,
            width,
            height,
            layers,
            tileset_refs,
        }
    }

    /// Builder-style anchor setter.
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Reads a Tiled JSON map file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let map = decode_map_file(path.as_ref())?;
        map.report_malformed();
        Ok(map)
    }

    /// Parses a Tiled JSON map held in memory.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let map = decode_map_str(json)?;
        map.report_malformed();
        Ok(map)
    }

    /// Tileset references sorted by `firstgid`.
    pub fn tileset_refs(&self) -> &[TilesetRef] {
        &self.tileset_refs
    }

    /// Grid cell size.
    pub fn tile_size(&self) -> UVec2 {
        uvec2(self.tile_width, self.tile_height)
    }

    /// Whole map size in world units.
    pub fn pixel_size(&self) -> Vec2 {
        vec2(
            self.width as f32 * self.tile_width as f32,
            self.height as f32 * self.tile_height as f32,
        )
    }

    /// World position of the top-left corner of cell `index` (row-major).
    pub fn cell_position(&self, index: usize) -> Vec2 {
        let width = self.width.max(1) as usize;
        let col = (index % width) as f32;
        let row = (index / width) as f32;
        self.position - self.pixel_size() / 2.0
            + vec2(col * self.tile_width as f32, row * self.tile_height as f32)
    }

    /// The tileset reference serving `gid` and the tileset-local index.
    ///
    /// Flip flags are ignored. `None` for the empty id `0` and for ids below
    /// every `firstgid`.
    pub fn resolve(&self, gid: u32) -> Option<(&TilesetRef, u32)> {
        let gid = gid & GID_MASK;
        if gid == 0 {
            return None;
        }
        self.tileset_refs
            .iter()
            .rev()
            .find(|r| r.firstgid <= gid)
            .map(|r| (r, gid - r.firstgid))
    }

    /// Draws every visible layer, bottom to top, skipping cells outside the
    /// renderer's frame.
    pub fn render<S: Surface + ?Sized>(
        &self,
        renderer: &mut Renderer<'_, S>,
        tilesets: &TilesetCollection,
    ) {
        if self.width == 0 {
            return;
        }
        let bounds = CullBounds::new(renderer.frame(), self.tile_size());
        for layer in &self.layers {
            self.render_layer(renderer, &bounds, layer, Vec2::ZERO, tilesets);
        }
    }

    fn render_layer<S: Surface + ?Sized>(
        &self,
        renderer: &mut Renderer<'_, S>,
        bounds: &CullBounds,
        layer: &LayerNode,
        offset: Vec2,
        tilesets: &TilesetCollection,
    ) {
        match layer {
            LayerNode::Group(group) => {
                if !group.visible {
                    return;
                }
                for child in &group.layers {
                    self.render_layer(renderer, bounds, child, offset + group.offset, tilesets);
                }
            }
            LayerNode::Tiles(tiles) => {
                self.render_tiles(renderer, bounds, tiles, offset + tiles.offset, tilesets)
            }
            LayerNode::Unsupported { .. } => {}
        }
    }

    fn render_tiles<S: Surface + ?Sized>(
        &self,
        renderer: &mut Renderer<'_, S>,
        bounds: &CullBounds,
        layer: &TileLayer,
        offset: Vec2,
        tilesets: &TilesetCollection,
    ) {
        if !layer.visible || !layer.is_well_formed() {
            return;
        }

        for (index, &gid) in layer.data.iter().enumerate() {
            let top_left = self.cell_position(index) + offset;
            if !bounds.is_visible(top_left) {
                renderer.note_culled();
                continue;
            }
            let Some((tileset_ref, local)) = self.resolve(gid) else {
                continue;
            };
            let Some(tileset) = tilesets.get(tileset_ref.tileset_name()) else {
                continue;
            };
            let tile = tileset.tile_size();
            renderer.draw_frame_at(
                &tileset.sprite,
                top_left + tile.as_vec2() / 2.0,
                tile,
                local,
            );
        }
    }

    /// Logs every problem that will make the renderer treat cells or layers as empty.
    fn report_malformed(&self) {
        for node in &self.layers {
            node.for_each_tile_layer(&mut |layer| {
                if !layer.is_well_formed() {
                    warn!(
                        layer = %layer.name,
                        expected = layer.width as u64 * layer.height as u64,
                        actual = layer.data.len(),
                        "layer_size_mismatch"
                    );
                    return;
                }
                let unresolved = layer
                    .data
                    .iter()
                    .filter(|&&gid| gid & GID_MASK != 0 && self.resolve(gid).is_none())
                    .count();
                if unresolved > 0 {
                    warn!(layer = %layer.name, cells = unresolved, "unresolved_tile_gid");
                }
            });
        }
    }
}

/// Reads a map file and every tileset it references, resolved relative to
/// the map's directory.
///
/// A `.tsx` reference loads the `.json` export next to it.
pub async fn load_map_with_tilesets(
    path: impl AsRef<Path>,
) -> Result<(TileMap, TilesetCollection)> {
    let path = path.as_ref();
    let map = TileMap::load(path)?;
    let map_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut tilesets = TilesetCollection::new();
    for tileset_ref in map.tileset_refs() {
        let tileset_path = tileset_path_for(map_dir, &tileset_ref.source);
        let tileset = Tileset::load(&tileset_path).await?;
        tilesets.insert_named(tileset_ref.tileset_name(), tileset);
    }

    info!(
        map = %path.display(),
        width = map.width,
        height = map.height,
        tilesets = tilesets.len(),
        "map_loaded"
    );
    Ok((map, tilesets))
}
