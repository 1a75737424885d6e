use macroquad::color::Color;
use macroquad::math::{uvec2, vec2, UVec2, Vec2};
use tracing::debug;

use crate::error::{Error, Result};
use crate::render::surface::Surface;

/// Physical canvas height at which `desired_pixel_scale` applies unchanged.
pub const SCALE_REFERENCE_HEIGHT: f32 = 800.0;

/// How the physical canvas is sized from the host window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizingPolicy {
    /// Fit a fixed aspect ratio inside the window, letterboxing the rest.
    AspectLocked {
        /// Width divided by height.
        aspect_ratio: f32,
        /// Border kept free on every side, in host pixels.
        margin: f32,
    },
    /// Render at a constant resolution and scale the result into the window.
    FixedResolution {
        /// Logical canvas width in pixels.
        width: u32,
        /// Logical canvas height in pixels.
        height: u32,
    },
}

/// Where the canvas lands inside the host window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasLayout {
    /// Physical canvas size.
    pub size: UVec2,
    /// Top-left corner of the canvas in host coordinates.
    pub offset: Vec2,
    /// Host pixels per canvas pixel.
    pub display_scale: f32,
}

/// Largest `aspect_ratio` rectangle that fits `host` with `margin` on each side.
///
/// Width-first; falls back to height-first when the width-derived height does
/// not fit.
pub fn fit_aspect(host: Vec2, aspect_ratio: f32, margin: f32) -> Vec2 {
    let border = 2.0 * margin;
    let size = vec2(host.x - border, host.x / aspect_ratio - border);
    if host.y < size.y + border {
        return vec2(host.y * aspect_ratio - border, host.y - border);
    }
    size
}

/// `floor(1 + desired * height / 800)`.
pub fn pixel_scale_for(desired_pixel_scale: u32, physical_height: u32) -> u32 {
    let scale =
        1.0 + desired_pixel_scale as f32 * physical_height as f32 / SCALE_REFERENCE_HEIGHT;
    scale.floor() as u32
}

/// Drawable canvas dimensions and the world-to-pixel scale.
///
/// Owned by the caller and mutated only through [`Viewport::resize`] and
/// [`Viewport::set_policy`], which the host calls between frames.
#[derive(Debug, Clone)]
pub struct Viewport {
    policy: SizingPolicy,
    desired_pixel_scale: u32,
    host: Vec2,
    physical: UVec2,
    pixel_scale: u32,
    scale_generation: u64,
}

impl Viewport {
    /// Sizes a viewport for the given host window.
    pub fn new(
        host_width: f32,
        host_height: f32,
        policy: SizingPolicy,
        desired_pixel_scale: u32,
    ) -> Result<Self> {
        validate_policy(&policy)?;
        if desired_pixel_scale == 0 {
            return Err(Error::Initialization(
                "desired pixel scale must be at least 1".into(),
            ));
        }
        let host = vec2(host_width, host_height);
        if !host_is_usable(host) {
            return Err(Error::Initialization(format!(
                "host window {host_width}x{host_height} has no drawable area"
            )));
        }

        let mut viewport = Self {
            policy,
            desired_pixel_scale,
            host,
            physical: UVec2::ONE,
            pixel_scale: desired_pixel_scale,
            scale_generation: 0,
        };
        viewport.apply();
        viewport.scale_generation = 0;
        Ok(viewport)
    }

    /// Recomputes the canvas for a new host size.
    ///
    /// Returns `true` when the pixel scale changed. A window with no area
    /// (minimised) is ignored.
    pub fn resize(&mut self, host_width: f32, host_height: f32) -> bool {
        let host = vec2(host_width, host_height);
        if !host_is_usable(host) {
            debug!(host_width, host_height, "resize_ignored");
            return false;
        }
        self.host = host;
        self.apply()
    }

    /// Like [`Viewport::resize`], but does nothing when the host size is unchanged.
    pub fn sync_host(&mut self, host_width: f32, host_height: f32) -> bool {
        if self.host == vec2(host_width, host_height) {
            return false;
        }
        self.resize(host_width, host_height)
    }

    /// Switches sizing policy and re-applies it to the current host size.
    pub fn set_policy(&mut self, policy: SizingPolicy) -> Result<bool> {
        validate_policy(&policy)?;
        self.policy = policy;
        Ok(self.apply())
    }

    fn apply(&mut self) -> bool {
        let previous = self.pixel_scale;
        match self.policy {
            SizingPolicy::AspectLocked {
                aspect_ratio,
                margin,
            } => {
                let size = fit_aspect(self.host, aspect_ratio, margin);
                self.physical = uvec2(size.x.max(1.0) as u32, size.y.max(1.0) as u32);
                self.pixel_scale = pixel_scale_for(self.desired_pixel_scale, self.physical.y);
            }
            SizingPolicy::FixedResolution { width, height } => {
                self.physical = uvec2(width, height);
                self.pixel_scale = self.desired_pixel_scale;
            }
        }

        let changed = self.pixel_scale != previous;
        if changed {
            self.scale_generation += 1;
            debug!(
                from = previous,
                to = self.pixel_scale,
                generation = self.scale_generation,
                "pixel_scale_changed"
            );
        }
        changed
    }

    /// Fills the whole canvas with `color`. First call of every frame.
    pub fn clear<S: Surface + ?Sized>(&self, surface: &mut S, color: Color) {
        surface.clear(&self.layout(), color);
    }

    /// Canvas placement inside the host window.
    pub fn layout(&self) -> CanvasLayout {
        let display_scale = match self.policy {
            SizingPolicy::AspectLocked { .. } => 1.0,
            SizingPolicy::FixedResolution { width, height } => {
                (self.host.x / width as f32).min(self.host.y / height as f32)
            }
        };
        let shown = self.physical.as_vec2() * display_scale;
        CanvasLayout {
            size: self.physical,
            offset: ((self.host - shown) / 2.0).max(Vec2::ZERO),
            display_scale,
        }
    }

    /// Canvas size in physical pixels.
    pub fn physical_size(&self) -> UVec2 {
        self.physical
    }

    /// Canvas size in world units, truncated.
    pub fn world_size(&self) -> UVec2 {
        self.physical / self.pixel_scale
    }

    /// Current world-to-pixel magnification.
    pub fn pixel_scale(&self) -> u32 {
        self.pixel_scale
    }

    /// Configured base scale.
    pub fn desired_pixel_scale(&self) -> u32 {
        self.desired_pixel_scale
    }

    /// Bumped every time the pixel scale changes; sprites poll it.
    pub fn scale_generation(&self) -> u64 {
        self.scale_generation
    }

    /// Last host window size seen.
    pub fn host_size(&self) -> Vec2 {
        self.host
    }

    /// Active sizing policy.
    pub fn policy(&self) -> SizingPolicy {
        self.policy
    }
}

fn host_is_usable(host: Vec2) -> bool {
    host.x.is_finite() && host.y.is_finite() && host.x > 0.0 && host.y > 0.0
}

fn validate_policy(policy: &SizingPolicy) -> Result<()> {
    match *policy {
        SizingPolicy::AspectLocked {
            aspect_ratio,
            margin,
        } => {
            if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
                return Err(Error::Initialization(format!(
                    "aspect ratio must be positive, got {aspect_ratio}"
                )));
            }
            if !margin.is_finite() || margin < 0.0 {
                return Err(Error::Initialization(format!(
                    "margin must be non-negative, got {margin}"
                )));
            }
        }
        SizingPolicy::FixedResolution { width, height } => {
            if width == 0 || height == 0 {
                return Err(Error::Initialization(format!(
                    "fixed resolution {width}x{height} has no area"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOUR_THIRDS: SizingPolicy = SizingPolicy::AspectLocked {
        aspect_ratio: 4.0 / 3.0,
        margin: 0.0,
    };

    #[test]
    fn fit_aspect_falls_back_to_height_when_window_is_wide() {
        let size = fit_aspect(vec2(1000.0, 400.0), 4.0 / 3.0, 0.0);
        assert!((size.x - 533.333).abs() < 0.01, "width was {}", size.x);
        assert_eq!(size.y, 400.0);
    }

    #[test]
    fn fit_aspect_uses_width_when_window_is_tall() {
        let size = fit_aspect(vec2(800.0, 1000.0), 4.0 / 3.0, 0.0);
        assert_eq!(size, vec2(800.0, 600.0));
    }

    #[test]
    fn fit_aspect_keeps_margin_free() {
        let host = vec2(1000.0, 400.0);
        let size = fit_aspect(host, 4.0 / 3.0, 12.0);
        assert!(size.x + 24.0 <= host.x);
        assert!(size.y + 24.0 <= host.y);
        assert_eq!(size.y, 376.0);
    }

    #[test]
    fn pixel_scale_follows_height() {
        assert_eq!(pixel_scale_for(5, 800), 6);
        assert_eq!(pixel_scale_for(5, 400), 3);
        assert_eq!(pixel_scale_for(5, 100), 1);
    }

    #[test]
    fn resize_truncates_physical_size_and_world_size() {
        let viewport = Viewport::new(1000.0, 400.0, FOUR_THIRDS, 5).unwrap();
        assert_eq!(viewport.physical_size(), uvec2(533, 400));
        assert_eq!(viewport.pixel_scale(), 3);
        assert_eq!(viewport.world_size(), uvec2(177, 133));
    }

    #[test]
    fn scale_generation_only_moves_when_scale_changes() {
        let mut viewport = Viewport::new(1000.0, 400.0, FOUR_THIRDS, 5).unwrap();
        let start = viewport.scale_generation();

        assert!(!viewport.resize(1001.0, 400.0));
        assert_eq!(viewport.scale_generation(), start);

        assert!(viewport.resize(1200.0, 900.0));
        assert_eq!(viewport.pixel_scale(), 6);
        assert_eq!(viewport.scale_generation(), start + 1);
    }

    #[test]
    fn minimised_window_is_ignored() {
        let mut viewport = Viewport::new(1000.0, 400.0, FOUR_THIRDS, 5).unwrap();
        assert!(!viewport.resize(0.0, 0.0));
        assert_eq!(viewport.physical_size(), uvec2(533, 400));
    }

    #[test]
    fn fixed_resolution_keeps_scale_and_fits_window() {
        let policy = SizingPolicy::FixedResolution {
            width: 320,
            height: 240,
        };
        let mut viewport = Viewport::new(1280.0, 720.0, policy, 2).unwrap();
        assert_eq!(viewport.physical_size(), uvec2(320, 240));
        assert_eq!(viewport.pixel_scale(), 2);

        let layout = viewport.layout();
        assert_eq!(layout.display_scale, 3.0);
        assert_eq!(layout.offset, vec2(160.0, 0.0));

        assert!(!viewport.resize(2000.0, 2000.0));
        assert_eq!(viewport.pixel_scale(), 2);
        let shown = viewport.physical_size().as_vec2() * viewport.layout().display_scale;
        assert!(shown.x <= 2000.0 && shown.y <= 2000.0);
    }

    #[test]
    fn aspect_layout_centres_canvas() {
        let viewport = Viewport::new(1000.0, 400.0, FOUR_THIRDS, 5).unwrap();
        let layout = viewport.layout();
        assert_eq!(layout.display_scale, 1.0);
        assert_eq!(layout.offset, vec2(233.5, 0.0));
    }

    #[test]
    fn rejects_unusable_settings() {
        let bad_ratio = SizingPolicy::AspectLocked {
            aspect_ratio: 0.0,
            margin: 0.0,
        };
        assert!(matches!(
            Viewport::new(800.0, 600.0, bad_ratio, 5),
            Err(Error::Initialization(_))
        ));
        assert!(matches!(
            Viewport::new(800.0, 600.0, FOUR_THIRDS, 0),
            Err(Error::Initialization(_))
        ));
        assert!(matches!(
            Viewport::new(0.0, 600.0, FOUR_THIRDS, 5),
            Err(Error::Initialization(_))
        ));
    }

    #[test]
    fn switching_policy_signals_scale_change() {
        let mut viewport = Viewport::new(1000.0, 400.0, FOUR_THIRDS, 5).unwrap();
        let changed = viewport
            .set_policy(SizingPolicy::FixedResolution {
                width: 256,
                height: 192,
            })
            .unwrap();
        assert!(changed);
        assert_eq!(viewport.pixel_scale(), 5);
    }
}
