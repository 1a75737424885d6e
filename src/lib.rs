#![warn(missing_docs)]

//! Pixel-perfect Tiled map & sprite-sheet renderer for Macroquad.
//!
//! A [`Viewport`] sizes the canvas and picks an integer pixel scale, a
//! [`Camera`] offsets the world, [`Sprite`]s cache one nearest-neighbour
//! upscaled bitmap per scale, and a [`TileMap`] draws its layer tree through a
//! [`Renderer`], skipping cells outside the canvas.

mod camera;
mod config;
mod error;
mod input;
mod layer;
mod loader {
    pub mod json_loader;
}
mod map;
pub mod render;
mod scene;
mod sprite;
mod tileset;
mod upscale;
mod viewport;

pub use camera::Camera;
pub use config::{CanvasConfig, Config, DirectionalSprites, LevelConfig, PlayerConfig};
pub use error::{Error, Result};
pub use input::DirectionKeys;
pub use layer::{GroupLayer, LayerNode, TileLayer};
pub use loader::json_loader::{decode_tileset_file, decode_tileset_str};
pub use map::{load_map_with_tilesets, TileMap, TilesetRef, FLIP_D, FLIP_H, FLIP_V, GID_MASK};
pub use render::surface::{DrawCall, MacroquadSurface, RecordingSurface, Surface};
pub use render::{Frame, FrameStats, Renderer};
pub use scene::{Facing, PlayerAnimation, PlayerSprites, Scene};
pub use sprite::{Bitmap, BitmapId, Sprite};
pub use tileset::{generate_tilesets, Tileset, TilesetCollection, TilesetMeta};
pub use upscale::{nearest_neighbor, MAX_IMAGE_DIMENSION};
pub use viewport::{fit_aspect, pixel_scale_for, CanvasLayout, SizingPolicy, Viewport};
