use anyhow::Context;
use macroquad::color::Color;
use macroquad::math::{UVec2, Vec2};
use tracing::info;

use crate::camera::Camera;
use crate::config::{Config, DirectionalSprites};
use crate::input::DirectionKeys;
use crate::map::{load_map_with_tilesets, TileMap};
use crate::render::surface::Surface;
use crate::render::{FrameStats, Renderer};
use crate::sprite::Sprite;
use crate::tileset::TilesetCollection;
use crate::viewport::Viewport;

/// Direction the player is looking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Facing {
    /// Towards the top of the screen.
    Up,
    /// Towards the bottom of the screen.
    #[default]
    Down,
    /// Towards the left.
    Left,
    /// Towards the right.
    Right,
}

impl Facing {
    /// Facing for a displacement; horizontal wins on diagonals. `None` when still.
    pub fn from_movement(movement: Vec2) -> Option<Self> {
        if movement == Vec2::ZERO {
            None
        } else if movement.x.abs() >= movement.y.abs() {
            Some(if movement.x < 0.0 { Facing::Left } else { Facing::Right })
        } else {
            Some(if movement.y < 0.0 { Facing::Up } else { Facing::Down })
        }
    }
}

/// One walk-cycle sheet per facing.
#[derive(Debug)]
pub struct PlayerSprites {
    /// Walking up.
    pub up: Sprite,
    /// Walking down.
    pub down: Sprite,
    /// Walking left.
    pub left: Sprite,
    /// Walking right.
    pub right: Sprite,
}

impl PlayerSprites {
    /// Loads the four sheets.
    pub async fn load(paths: &DirectionalSprites) -> crate::Result<Self> {
        Ok(Self {
            up: Sprite::load(&paths.up).await?,
            down: Sprite::load(&paths.down).await?,
            left: Sprite::load(&paths.left).await?,
            right: Sprite::load(&paths.right).await?,
        })
    }

    /// Sheet for `facing`.
    pub fn get(&self, facing: Facing) -> &Sprite {
        match facing {
            Facing::Up => &self.up,
            Facing::Down => &self.down,
            Facing::Left => &self.left,
            Facing::Right => &self.right,
        }
    }

    /// Mutable sheet for `facing`.
    pub fn get_mut(&mut self, facing: Facing) -> &mut Sprite {
        match facing {
            Facing::Up => &mut self.up,
            Facing::Down => &mut self.down,
            Facing::Left => &mut self.left,
            Facing::Right => &mut self.right,
        }
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Sprite> {
        [&mut self.up, &mut self.down, &mut self.left, &mut self.right].into_iter()
    }
}

/// Walk-cycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerAnimation {
    /// Current facing.
    pub facing: Facing,
    frame: u32,
    ticks: u32,
}

impl PlayerAnimation {
    /// Advances one tick. While moving, the frame steps every
    /// `frames_per_step` ticks and wraps after `frame_count`; standing still
    /// resets to frame 0.
    pub fn advance(&mut self, movement: Vec2, frames_per_step: u32, frame_count: u32) {
        let Some(facing) = Facing::from_movement(movement) else {
            self.frame = 0;
            self.ticks = 0;
            return;
        };
        self.facing = facing;
        self.ticks += 1;
        if self.ticks >= frames_per_step.max(1) {
            self.ticks = 0;
            self.frame = (self.frame + 1) % frame_count.max(1);
        }
    }

    /// Frame to draw.
    pub fn frame_index(&self) -> u32 {
        self.frame
    }
}

/// Viewport, camera, map and player, ticked in a fixed order.
#[derive(Debug)]
pub struct Scene {
    /// Canvas sizing.
    pub viewport: Viewport,
    /// Follows the player.
    pub camera: Camera,
    /// The level.
    pub map: TileMap,
    /// Tilesets the level draws from.
    pub tilesets: TilesetCollection,
    /// Player sheets.
    pub player: PlayerSprites,
    /// Walk-cycle state.
    pub animation: PlayerAnimation,
    player_position: Vec2,
    frame_size: UVec2,
    frames_per_step: u32,
    speed: f32,
    clear_color: Color,
}

impl Scene {
    /// Loads the map, tilesets and player sheets named in `config` and sizes
    /// the viewport for the host window.
    pub async fn load(config: &Config, host_width: f32, host_height: f32) -> anyhow::Result<Self> {
        let viewport = Viewport::new(
            host_width,
            host_height,
            config.viewport_policy(),
            config.canvas.pixel_scale,
        )
        .context("Creating viewport")?;

        let (map, tilesets) = load_map_with_tilesets(&config.level.map)
            .await
            .with_context(|| format!("Loading level {}", config.level.map))?;

        let player = PlayerSprites::load(&config.player.sprites)
            .await
            .context("Loading player sprites")?;

        info!(
            width = viewport.physical_size().x,
            height = viewport.physical_size().y,
            pixel_scale = viewport.pixel_scale(),
            "scene_ready"
        );
        Ok(Self::new(viewport, map, tilesets, player, config))
    }

    /// Assembles a scene from loaded parts. The camera starts on the map anchor.
    pub fn new(
        viewport: Viewport,
        map: TileMap,
        tilesets: TilesetCollection,
        player: PlayerSprites,
        config: &Config,
    ) -> Self {
        let start = map.position;
        Self {
            viewport,
            camera: Camera::new(start),
            map,
            tilesets,
            player,
            animation: PlayerAnimation::default(),
            player_position: start,
            frame_size: config.frame_size(),
            frames_per_step: config.player.frames_per_step,
            speed: config.player.speed,
            clear_color: config.clear_color(),
        }
    }

    /// Player position in world units.
    pub fn player_position(&self) -> Vec2 {
        self.player_position
    }

    /// Applies a host window size. Call between frames.
    pub fn resize(&mut self, host_width: f32, host_height: f32) -> bool {
        self.viewport.sync_host(host_width, host_height)
    }

    /// Runs one frame: clear, move the player, move the camera, draw the map,
    /// draw the player.
    pub fn tick<S: Surface + ?Sized>(&mut self, keys: DirectionKeys, surface: &mut S) -> FrameStats {
        self.viewport.clear(surface, self.clear_color);

        let movement = keys.movement(self.speed);
        self.player_position += movement;
        self.camera.translate(movement);
        let next_facing = Facing::from_movement(movement).unwrap_or(self.animation.facing);
        let frame_count = self.frames_per_row(next_facing);
        self.animation
            .advance(movement, self.frames_per_step, frame_count);

        self.sync_sprites();
        let facing = self.animation.facing;
        self.player.get_mut(facing).position = self.player_position;

        let mut renderer = Renderer::begin(surface, &self.viewport, &self.camera);
        self.map.render(&mut renderer, &self.tilesets);
        renderer.draw_frame(
            self.player.get(facing),
            self.frame_size,
            self.animation.frame_index(),
        );
        renderer.finish()
    }

    fn frames_per_row(&self, facing: Facing) -> u32 {
        self.player.get(facing).source().width() / self.frame_size.x.max(1)
    }

    fn sync_sprites(&mut self) {
        self.tilesets.sync(&self.viewport);
        for sprite in self.player.iter_mut() {
            sprite.sync(&self.viewport);
        }
    }
}
