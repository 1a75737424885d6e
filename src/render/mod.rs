//! Projection from world space to the canvas and the sprite drawing calls.

pub mod cull;
pub mod surface;

use std::rc::Rc;

use macroquad::color::Color;
use macroquad::math::{vec2, Rect, UVec2, Vec2};
use tracing::trace;

use crate::camera::Camera;
use crate::sprite::{Bitmap, Sprite};
use crate::viewport::Viewport;

use self::surface::Surface;

/// Fractional device-pixel offset of the camera, `(origin * scale) mod 1`
/// per axis (sign follows the origin).
pub fn subpixel_correction(origin: Vec2, pixel_scale: u32) -> Vec2 {
    let scaled = origin * pixel_scale as f32;
    vec2(scaled.x % 1.0, scaled.y % 1.0)
}

/// Everything a draw needs to know about the current frame.
///
/// Taken once per frame so that sprites, sheet frames and cull bounds all
/// agree on scale and camera position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Canvas size in physical pixels.
    pub canvas_size: Vec2,
    /// Pixel scale in force for this frame.
    pub pixel_scale: u32,
    /// Camera origin in world units.
    pub origin: Vec2,
    /// Correction subtracted from every destination position.
    pub subpixel: Vec2,
}

impl Frame {
    /// Snapshot of `viewport` and `camera`.
    pub fn new(viewport: &Viewport, camera: &Camera) -> Self {
        let pixel_scale = viewport.pixel_scale();
        let origin = camera.origin();
        Self {
            canvas_size: viewport.physical_size().as_vec2(),
            pixel_scale,
            origin,
            subpixel: subpixel_correction(origin, pixel_scale),
        }
    }

    /// Pixel scale as a float.
    pub fn scale(&self) -> f32 {
        self.pixel_scale as f32
    }

    /// Canvas centre.
    pub fn center(&self) -> Vec2 {
        self.canvas_size / 2.0
    }

    /// Offset of `world` from the canvas centre, in device pixels.
    pub fn project(&self, world: Vec2) -> Vec2 {
        (world - self.origin) * self.scale()
    }

    /// Top-left canvas position for something `size_px` large centred on `world`.
    pub fn place(&self, world: Vec2, size_px: Vec2) -> Vec2 {
        let raw = self.center() + self.project(world) - size_px / 2.0;
        vec2(raw.x.trunc(), raw.y.trunc()) - self.subpixel
    }
}

/// Counters for one frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Bitmap draws issued.
    pub drawn: usize,
    /// Draws dropped because the sprite had no bitmap at this scale.
    pub skipped: usize,
    /// Map cells rejected by culling.
    pub culled: usize,
}

/// Issues the draws of one frame onto a surface.
pub struct Renderer<'s, S: Surface + ?Sized> {
    surface: &'s mut S,
    frame: Frame,
    stats: FrameStats,
}

impl<'s, S: Surface + ?Sized> Renderer<'s, S> {
    /// Starts drawing with a snapshot of `viewport` and `camera`.
    pub fn begin(surface: &'s mut S, viewport: &Viewport, camera: &Camera) -> Self {
        Self::with_frame(surface, Frame::new(viewport, camera))
    }

    /// Starts drawing with an explicit frame snapshot.
    pub fn with_frame(surface: &'s mut S, frame: Frame) -> Self {
        Self {
            surface,
            frame,
            stats: FrameStats::default(),
        }
    }

    /// The snapshot every draw of this frame uses.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Counters so far.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub(crate) fn note_culled(&mut self) {
        self.stats.culled += 1;
    }

    fn ready_bitmap(&mut self, sprite: &Sprite) -> Option<Rc<Bitmap>> {
        let bitmap = sprite.bitmap(self.frame.pixel_scale).cloned();
        if bitmap.is_none() {
            self.stats.skipped += 1;
            trace!(scale = self.frame.pixel_scale, "sprite_not_ready");
        }
        bitmap
    }

    /// Draws the sprite's whole image centred on its position.
    pub fn draw_whole(&mut self, sprite: &Sprite) {
        let Some(bitmap) = self.ready_bitmap(sprite) else {
            return;
        };
        let size = bitmap.size();
        let at = self.frame.place(sprite.position, size);
        self.surface.draw_bitmap(
            &bitmap,
            Rect::new(0.0, 0.0, size.x, size.y),
            Rect::new(at.x, at.y, size.x, size.y),
        );
        self.stats.drawn += 1;
    }

    /// Draws a `crop_size` (world units) piece of the sprite starting at
    /// `crop_origin` (scaled bitmap pixels), centred on the sprite's position.
    pub fn draw_cropped(&mut self, sprite: &Sprite, crop_origin: Vec2, crop_size: Vec2) {
        self.draw_cropped_at(sprite, sprite.position, crop_origin, crop_size);
    }

    /// [`Renderer::draw_cropped`] centred on `position` instead.
    pub fn draw_cropped_at(
        &mut self,
        sprite: &Sprite,
        position: Vec2,
        crop_origin: Vec2,
        crop_size: Vec2,
    ) {
        let Some(bitmap) = self.ready_bitmap(sprite) else {
            return;
        };
        let size = crop_size * self.frame.scale();
        let at = self.frame.place(position, size);
        self.surface.draw_bitmap(
            &bitmap,
            Rect::new(crop_origin.x, crop_origin.y, size.x, size.y),
            Rect::new(at.x, at.y, size.x, size.y),
        );
        self.stats.drawn += 1;
    }

    /// Draws frame `frame_index` of a sprite sheet laid out in `tile_size`
    /// cells, row-major from 0, centred on the sprite's position.
    ///
    /// `frame_index` must lie inside the sheet; an index past the end crops
    /// outside the image.
    pub fn draw_frame(&mut self, sprite: &Sprite, tile_size: UVec2, frame_index: u32) {
        self.draw_frame_at(sprite, sprite.position, tile_size, frame_index);
    }

    /// [`Renderer::draw_frame`] centred on `position` instead.
    pub fn draw_frame_at(
        &mut self,
        sprite: &Sprite,
        position: Vec2,
        tile_size: UVec2,
        frame_index: u32,
    ) {
        let Some((column, row)) = frame_cell(sprite.source().width(), tile_size.x, frame_index)
        else {
            trace!(tile_width = tile_size.x, "sheet_narrower_than_tile");
            self.stats.skipped += 1;
            return;
        };
        let scale = self.frame.scale();
        let crop_origin = vec2(
            column as f32 * tile_size.x as f32 * scale,
            row as f32 * tile_size.y as f32 * scale,
        );
        self.draw_cropped_at(sprite, position, crop_origin, tile_size.as_vec2());
    }

    /// Fills one scaled pixel at the sprite's projected position.
    pub fn draw_origin_marker(&mut self, sprite: &Sprite, color: Color) {
        let at = self.frame.center() + self.frame.project(sprite.position);
        let s = self.frame.scale();
        self.surface.fill_rect(Rect::new(at.x, at.y, s, s), color);
    }

    /// Ends the frame and returns its counters.
    pub fn finish(self) -> FrameStats {
        self.surface.finish();
        self.stats
    }
}

/// `(column, row)` of `frame_index` in a sheet `sheet_width` pixels wide.
///
/// `None` when not even one tile fits in a row.
pub fn frame_cell(sheet_width: u32, tile_width: u32, frame_index: u32) -> Option<(u32, u32)> {
    let frames_per_row = sheet_width.checked_div(tile_width)?;
    if frames_per_row == 0 {
        return None;
    }
    Some((frame_index % frames_per_row, frame_index / frames_per_row))
}
