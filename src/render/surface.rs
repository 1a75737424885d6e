//! Drawing backends: the macroquad surface and a recording one for tests.

use std::collections::HashMap;

use macroquad::color::{Color, BLACK, WHITE};
use macroquad::math::{vec2, Rect, UVec2};
use macroquad::shapes::draw_rectangle;
use macroquad::texture::{draw_texture_ex, DrawTextureParams, FilterMode, Texture2D};
use macroquad::window::clear_background;

use crate::sprite::{Bitmap, BitmapId};
use crate::viewport::CanvasLayout;

/// Drawing backend. All rectangles are in canvas pixels.
pub trait Surface {
    /// Starts a frame: remembers `layout` and fills the canvas with `color`.
    fn clear(&mut self, layout: &CanvasLayout, color: Color);

    /// Copies `source` (bitmap pixels) of `bitmap` into `dest`.
    fn draw_bitmap(&mut self, bitmap: &Bitmap, source: Rect, dest: Rect);

    /// Fills `rect` with a flat colour.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Called once after the last draw of a frame.
    fn finish(&mut self) {}
}

/// Draws through macroquad's immediate-mode API.
///
/// Textures are uploaded lazily the first time a bitmap is drawn and kept
/// for the lifetime of the surface.
pub struct MacroquadSurface {
    layout: CanvasLayout,
    letterbox: Color,
    textures: HashMap<BitmapId, Texture2D>,
}

impl MacroquadSurface {
    /// Surface with a black letterbox.
    pub fn new() -> Self {
        Self::with_letterbox(BLACK)
    }

    /// Surface whose area outside the canvas is painted `letterbox`.
    pub fn with_letterbox(letterbox: Color) -> Self {
        Self {
            layout: CanvasLayout {
                size: UVec2::ZERO,
                offset: Default::default(),
                display_scale: 1.0,
            },
            letterbox,
            textures: HashMap::new(),
        }
    }

    /// Number of uploaded textures.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn to_window(&self, rect: Rect) -> Rect {
        let s = self.layout.display_scale;
        Rect::new(
            self.layout.offset.x + rect.x * s,
            self.layout.offset.y + rect.y * s,
            rect.w * s,
            rect.h * s,
        )
    }

    fn texture(&mut self, bitmap: &Bitmap) -> &Texture2D {
        self.textures.entry(bitmap.id()).or_insert_with(|| {
            let tex = Texture2D::from_image(bitmap.image());
            tex.set_filter(FilterMode::Nearest);
            tex
        })
    }
}

impl Default for MacroquadSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for MacroquadSurface {
    fn clear(&mut self, layout: &CanvasLayout, color: Color) {
        self.layout = *layout;
        clear_background(self.letterbox);
        let canvas = self.to_window(Rect::new(
            0.0,
            0.0,
            layout.size.x as f32,
            layout.size.y as f32,
        ));
        draw_rectangle(canvas.x, canvas.y, canvas.w, canvas.h, color);
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, source: Rect, dest: Rect) {
        let dest = self.to_window(dest);
        let texture = self.texture(bitmap);
        draw_texture_ex(
            texture,
            dest.x,
            dest.y,
            WHITE,
            DrawTextureParams {
                source: Some(source),
                dest_size: Some(vec2(dest.w, dest.h)),
                ..Default::default()
            },
        );
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let rect = self.to_window(rect);
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, color);
    }

    fn finish(&mut self) {
        // repaint the letterbox over anything that spilled past the canvas
        let canvas = self.to_window(Rect::new(
            0.0,
            0.0,
            self.layout.size.x as f32,
            self.layout.size.y as f32,
        ));
        let (win_w, win_h) = (
            macroquad::window::screen_width(),
            macroquad::window::screen_height(),
        );
        let c = self.letterbox;
        draw_rectangle(0.0, 0.0, win_w, canvas.y, c);
        draw_rectangle(0.0, canvas.bottom(), win_w, win_h - canvas.bottom(), c);
        draw_rectangle(0.0, canvas.y, canvas.x, canvas.h, c);
        draw_rectangle(canvas.right(), canvas.y, win_w - canvas.right(), canvas.h, c);
    }
}

/// One recorded call on a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    /// A frame started.
    Clear {
        /// Canvas size at that frame.
        size: UVec2,
        /// Fill colour.
        color: Color,
    },
    /// A bitmap copy.
    Bitmap {
        /// Which bitmap.
        bitmap: BitmapId,
        /// Source rectangle in bitmap pixels.
        source: Rect,
        /// Destination rectangle in canvas pixels.
        dest: Rect,
    },
    /// A flat fill.
    Fill {
        /// Filled rectangle.
        rect: Rect,
        /// Fill colour.
        color: Color,
    },
}

/// Headless surface that only records what would have been drawn.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    /// Calls in issue order.
    pub calls: Vec<DrawCall>,
    /// Number of completed frames.
    pub frames: usize,
}

impl RecordingSurface {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bitmap draws as `(bitmap, source, dest)`, in issue order.
    pub fn bitmap_draws(&self) -> Vec<(BitmapId, Rect, Rect)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Bitmap {
                    bitmap,
                    source,
                    dest,
                } => Some((*bitmap, *source, *dest)),
                _ => None,
            })
            .collect()
    }

    /// Number of bitmap draws recorded.
    pub fn bitmap_draw_count(&self) -> usize {
        self.bitmap_draws().len()
    }

    /// Forgets everything recorded so far.
    pub fn reset(&mut self) {
        self.calls.clear();
        self.frames = 0;
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self, layout: &CanvasLayout, color: Color) {
        self.calls.push(DrawCall::Clear {
            size: layout.size,
            color,
        });
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, source: Rect, dest: Rect) {
        self.calls.push(DrawCall::Bitmap {
            bitmap: bitmap.id(),
            source,
            dest,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.calls.push(DrawCall::Fill { rect, color });
    }

    fn finish(&mut self) {
        self.frames += 1;
    }
}
