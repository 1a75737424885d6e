use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use macroquad::math::{vec2, Vec2};
use macroquad::texture::{load_image, Image};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::upscale::nearest_neighbor;
use crate::viewport::Viewport;

static NEXT_BITMAP_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a decoded bitmap, used by backends to key GPU textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BitmapId(u64);

/// A decoded RGBA image at one particular scale.
pub struct Bitmap {
    id: BitmapId,
    image: Image,
}

impl Bitmap {
    /// Wraps a decoded image and gives it a fresh id.
    pub fn new(image: Image) -> Self {
        Self {
            id: BitmapId(NEXT_BITMAP_ID.fetch_add(1, Ordering::Relaxed)),
            image,
        }
    }

    /// Unique id.
    pub fn id(&self) -> BitmapId {
        self.id
    }

    /// Pixel data.
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width as u32
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height as u32
    }

    /// Size in pixels as a float vector.
    pub fn size(&self) -> Vec2 {
        vec2(self.width() as f32, self.height() as f32)
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("id", &self.id)
            .field("width", &self.image.width)
            .field("height", &self.image.height)
            .finish()
    }
}

/// An image placed in the world, with one cached bitmap per pixel scale.
#[derive(Debug)]
pub struct Sprite {
    source: Rc<Bitmap>,
    images: HashMap<u32, Rc<Bitmap>>,
    synced_generation: Option<u64>,
    /// World-space position of the sprite's centre.
    pub position: Vec2,
}

impl Sprite {
    /// Fetches and decodes `path`, then wraps it as a sprite at the world origin.
    pub async fn load(path: &str) -> Result<Self> {
        let image = load_image(path).await.map_err(|err| Error::ImageDecode {
            path: path.to_owned(),
            reason: err.to_string(),
        })?;
        debug!(path, width = image.width, height = image.height, "sprite_loaded");
        Ok(Self::from_image(image))
    }

    /// Sprite over an already-decoded image.
    pub fn from_image(image: Image) -> Self {
        let source = Rc::new(Bitmap::new(image));
        let mut images = HashMap::new();
        images.insert(1, Rc::clone(&source));
        Self {
            source,
            images,
            synced_generation: None,
            position: Vec2::ZERO,
        }
    }

    /// Builder-style position setter.
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// The unscaled bitmap.
    pub fn source(&self) -> &Rc<Bitmap> {
        &self.source
    }

    /// Bitmap for `scale`, if it has been generated.
    pub fn bitmap(&self, scale: u32) -> Option<&Rc<Bitmap>> {
        self.images.get(&scale)
    }

    /// Scales with a cached bitmap, ascending.
    pub fn cached_scales(&self) -> Vec<u32> {
        let mut scales: Vec<u32> = self.images.keys().copied().collect();
        scales.sort_unstable();
        scales
    }

    /// Makes sure a bitmap exists for `scale`, generating it from the source
    /// image on first request. Existing entries are never regenerated.
    ///
    /// Returns whether a bitmap for `scale` is available afterwards.
    pub fn ensure_scaled(&mut self, scale: u32) -> bool {
        if self.images.contains_key(&scale) {
            return true;
        }
        match nearest_neighbor(self.source.image(), scale) {
            Some(image) => {
                debug!(scale, width = image.width, height = image.height, "sprite_scaled");
                self.images.insert(scale, Rc::new(Bitmap::new(image)));
                true
            }
            None => {
                warn!(
                    scale,
                    width = self.source.width(),
                    height = self.source.height(),
                    "sprite_scale_unavailable"
                );
                false
            }
        }
    }

    /// Reacts to a pixel-scale change of `viewport` since the last call.
    pub fn sync(&mut self, viewport: &Viewport) {
        let generation = viewport.scale_generation();
        if self.synced_generation == Some(generation) {
            return;
        }
        self.ensure_scaled(viewport.pixel_scale());
        self.synced_generation = Some(generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::SizingPolicy;

    fn red_pixel() -> Image {
        Image {
            bytes: vec![255, 0, 0, 255],
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn scale_one_is_the_source() {
        let sprite = Sprite::from_image(red_pixel());
        let one = sprite.bitmap(1).unwrap();
        assert!(Rc::ptr_eq(one, sprite.source()));
        assert!(sprite.bitmap(2).is_none());
    }

    #[test]
    fn ensure_scaled_generates_once() {
        let mut sprite = Sprite::from_image(red_pixel());
        assert!(sprite.ensure_scaled(3));
        let first = Rc::clone(sprite.bitmap(3).unwrap());
        assert_eq!((first.width(), first.height()), (3, 3));
        assert!(first.image().bytes.chunks(4).all(|px| px == [255, 0, 0, 255]));

        assert!(sprite.ensure_scaled(3));
        let second = sprite.bitmap(3).unwrap();
        assert!(Rc::ptr_eq(&first, second));
        assert_eq!(first.id(), second.id());
    }

    #[test]
    fn impossible_scale_leaves_no_entry() {
        let mut sprite = Sprite::from_image(red_pixel());
        assert!(!sprite.ensure_scaled(0));
        assert!(!sprite.ensure_scaled(70_000));
        assert_eq!(sprite.cached_scales(), vec![1]);
    }

    #[test]
    fn sync_follows_viewport_scale() {
        let policy = SizingPolicy::AspectLocked {
            aspect_ratio: 4.0 / 3.0,
            margin: 0.0,
        };
        let mut viewport = Viewport::new(1000.0, 400.0, policy, 5).unwrap();
        let mut sprite = Sprite::from_image(red_pixel());

        sprite.sync(&viewport);
        assert_eq!(sprite.cached_scales(), vec![1, 3]);

        viewport.resize(1200.0, 900.0);
        sprite.sync(&viewport);
        assert_eq!(sprite.cached_scales(), vec![1, 3, 6]);

        viewport.resize(1000.0, 400.0);
        let kept = Rc::clone(sprite.bitmap(3).unwrap());
        sprite.sync(&viewport);
        assert!(Rc::ptr_eq(&kept, sprite.bitmap(3).unwrap()));
    }

    #[test]
    fn bitmap_ids_are_unique() {
        let a = Bitmap::new(red_pixel());
        let b = Bitmap::new(red_pixel());
        assert_ne!(a.id(), b.id());
    }
}
