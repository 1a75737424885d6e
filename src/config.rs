use std::path::Path;

use macroquad::color::Color;
use macroquad::math::{uvec2, UVec2};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::viewport::SizingPolicy;

/// Scene settings, usually read from a JSON file. Missing fields take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Canvas sizing.
    pub canvas: CanvasConfig,
    /// Player sprite and movement.
    pub player: PlayerConfig,
    /// Map to load.
    pub level: LevelConfig,
    /// RGBA colour the canvas is cleared to every frame.
    pub clear_color: [u8; 4],
}

/// Canvas sizing settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Width over height in aspect-locked mode.
    pub aspect_ratio: f32,
    /// Desired pixel scale at an 800 px tall canvas.
    pub pixel_scale: u32,
    /// Free border around the canvas, in window pixels.
    pub margin: f32,
    /// `[width, height]`: render at this resolution instead of locking the aspect.
    pub fixed_resolution: Option<[u32; 2]>,
}

/// Player settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// World units per tick.
    pub speed: f32,
    /// Width of one animation frame.
    pub frame_width: u32,
    /// Height of one animation frame.
    pub frame_height: u32,
    /// Ticks each walk frame stays on screen.
    pub frames_per_step: u32,
    /// One sprite sheet per facing.
    pub sprites: DirectionalSprites,
}

/// Image paths for each facing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DirectionalSprites {
    /// Walking up.
    pub up: String,
    /// Walking down.
    pub down: String,
    /// Walking left.
    pub left: String,
    /// Walking right.
    pub right: String,
}

/// Level settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Tiled JSON map path.
    pub map: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            player: PlayerConfig::default(),
            level: LevelConfig::default(),
            clear_color: [255, 255, 255, 255],
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: 4.0 / 3.0,
            pixel_scale: 5,
            margin: 12.0,
            fixed_resolution: None,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 2.0,
            frame_width: 12,
            frame_height: 17,
            frames_per_step: 8,
            sprites: DirectionalSprites::default(),
        }
    }
}

impl Default for DirectionalSprites {
    fn default() -> Self {
        Self {
            up: "assets/playerUp.png".into(),
            down: "assets/playerDown.png".into(),
            left: "assets/playerLeft.png".into(),
            right: "assets/playerRight.png".into(),
        }
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            map: "assets/map.json".into(),
        }
    }
}

impl Config {
    /// Reads a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let txt = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&txt).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Sizing policy the canvas section describes.
    pub fn viewport_policy(&self) -> SizingPolicy {
        match self.canvas.fixed_resolution {
            Some([width, height]) => SizingPolicy::FixedResolution { width, height },
            None => SizingPolicy::AspectLocked {
                aspect_ratio: self.canvas.aspect_ratio,
                margin: self.canvas.margin,
            },
        }
    }

    /// Clear colour as a macroquad colour.
    pub fn clear_color(&self) -> Color {
        let [r, g, b, a] = self.clear_color;
        Color::from_rgba(r, g, b, a)
    }

    /// Player animation frame size.
    pub fn frame_size(&self) -> UVec2 {
        uvec2(self.player.frame_width, self.player.frame_height)
    }
}
