//! Per-cell visibility tests against the padded canvas.

use macroquad::math::{UVec2, Vec2};

use super::Frame;

/// How many tiles of slack the visible area gets on every side.
const CULL_MARGIN_TILES: f32 = 1.0;

/// Visible area of one frame, padded by one tile, for testing map cells.
#[derive(Debug, Clone, Copy)]
pub struct CullBounds {
    frame: Frame,
    tile_px: Vec2,
    min: Vec2,
    max: Vec2,
}

impl CullBounds {
    /// Bounds for cells of `tile_size` world units under `frame`.
    pub fn new(frame: &Frame, tile_size: UVec2) -> Self {
        let tile_px = tile_size.as_vec2() * frame.scale();
        let half = frame.canvas_size / 2.0;
        let pad = tile_px * CULL_MARGIN_TILES;
        Self {
            frame: *frame,
            tile_px,
            min: -half - pad,
            max: half + pad,
        }
    }

    /// Whether a cell whose top-left corner is at `top_left` (world units)
    /// overlaps the padded visible area.
    pub fn is_visible(&self, top_left: Vec2) -> bool {
        let lo = self.frame.project(top_left);
        let hi = lo + self.tile_px;
        !(hi.x < self.min.x || lo.x > self.max.x || hi.y < self.min.y || lo.y > self.max.y)
    }
}
