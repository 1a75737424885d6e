use std::collections::HashMap;
use std::path::Path;

use macroquad::math::{uvec2, UVec2};
use tracing::info;

use crate::error::Result;
use crate::loader::json_loader::decode_tileset_file;
use crate::sprite::Sprite;
use crate::viewport::Viewport;

/// Tileset metadata as exported by Tiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilesetMeta {
    /// Tileset name; key in a [`TilesetCollection`].
    pub name: String,
    /// Image path, relative to the tileset file.
    pub image: String,
    /// Width of one tile in pixels.
    pub tile_width: u32,
    /// Height of one tile in pixels.
    pub tile_height: u32,
    /// Tiles per image row.
    pub columns: u32,
    /// Total tiles.
    pub tile_count: u32,
    /// Image width in pixels.
    pub image_width: u32,
    /// Image height in pixels.
    pub image_height: u32,
}

/// Tileset metadata plus the sprite sheet holding its tiles.
#[derive(Debug)]
pub struct Tileset {
    /// Metadata.
    pub meta: TilesetMeta,
    /// The tileset image.
    pub sprite: Sprite,
}

impl Tileset {
    /// Pairs metadata with an already-loaded sheet.
    pub fn new(meta: TilesetMeta, sprite: Sprite) -> Self {
        Self { meta, sprite }
    }

    /// Reads a tileset JSON file and loads its image, resolved relative to the file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let meta = decode_tileset_file(path)?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let image_path = dir.join(&meta.image);
        let sprite = Sprite::load(&image_path.to_string_lossy()).await?;
        info!(
            name = %meta.name,
            tiles = meta.tile_count,
            image = %image_path.display(),
            "tileset_loaded"
        );
        Ok(Self { meta, sprite })
    }

    /// Size of one tile.
    pub fn tile_size(&self) -> UVec2 {
        uvec2(self.meta.tile_width, self.meta.tile_height)
    }
}

/// Tilesets by name.
#[derive(Debug, Default)]
pub struct TilesetCollection {
    tilesets: HashMap<String, Tileset>,
}

impl TilesetCollection {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `tileset` under its own name, replacing any previous entry.
    pub fn insert(&mut self, tileset: Tileset) -> Option<Tileset> {
        let name = tileset.meta.name.clone();
        self.insert_named(name, tileset)
    }

    /// Adds `tileset` under `name`, replacing any previous entry.
    pub fn insert_named(&mut self, name: impl Into<String>, tileset: Tileset) -> Option<Tileset> {
        self.tilesets.insert(name.into(), tileset)
    }

    /// Tileset called `name`.
    pub fn get(&self, name: &str) -> Option<&Tileset> {
        self.tilesets.get(name)
    }

    /// Mutable tileset called `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Tileset> {
        self.tilesets.get_mut(name)
    }

    /// Number of tilesets.
    pub fn len(&self) -> usize {
        self.tilesets.len()
    }

    /// No tilesets at all.
    pub fn is_empty(&self) -> bool {
        self.tilesets.is_empty()
    }

    /// Tileset names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tilesets.keys().map(String::as_str)
    }

    /// Brings every tileset sheet up to the viewport's current pixel scale.
    pub fn sync(&mut self, viewport: &Viewport) {
        for tileset in self.tilesets.values_mut() {
            tileset.sprite.sync(viewport);
        }
    }
}

/// Loads every tileset file in `paths`, keyed by tileset name.
pub async fn generate_tilesets<P: AsRef<Path>>(paths: &[P]) -> Result<TilesetCollection> {
    let mut tilesets = TilesetCollection::new();
    for path in paths {
        tilesets.insert(Tileset::load(path).await?);
    }
    Ok(tilesets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::SizingPolicy;
    use macroquad::texture::Image;

    fn meta(name: &str) -> TilesetMeta {
        TilesetMeta {
            name: name.into(),
            image: format!("{name}.png"),
            tile_width: 2,
            tile_height: 2,
            columns: 1,
            tile_count: 1,
            image_width: 2,
            image_height: 2,
        }
    }

    fn sheet() -> Sprite {
        Sprite::from_image(Image {
            bytes: vec![0; 16],
            width: 2,
            height: 2,
        })
    }

    #[test]
    fn insert_keys_by_name() {
        let mut tilesets = TilesetCollection::new();
        assert!(tilesets.insert(Tileset::new(meta("A"), sheet())).is_none());
        tilesets.insert_named("alias", Tileset::new(meta("B"), sheet()));

        assert_eq!(tilesets.len(), 2);
        assert_eq!(tilesets.get("A").unwrap().tile_size(), uvec2(2, 2));
        assert_eq!(tilesets.get("alias").unwrap().meta.name, "B");
        assert!(tilesets.get("B").is_none());
    }

    #[test]
    fn sync_scales_every_sheet() {
        let viewport = Viewport::new(
            100.0,
            100.0,
            SizingPolicy::FixedResolution {
                width: 100,
                height: 100,
            },
            4,
        )
        .unwrap();
        let mut tilesets = TilesetCollection::new();
        tilesets.insert(Tileset::new(meta("A"), sheet()));
        tilesets.insert(Tileset::new(meta("B"), sheet()));

        tilesets.sync(&viewport);
        for name in ["A", "B"] {
            assert!(tilesets.get(name).unwrap().sprite.bitmap(4).is_some());
        }
    }
}
