use macroquad::math::Vec2;

/// World-space offset subtracted from every position before projection.
///
/// The tracked entity stays near the canvas centre as long as the camera is
/// translated by the same displacement as the entity each frame. Positions
/// project as `world - origin`, so moving the origin by `+movement` scrolls
/// the world by `-movement` on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera {
    origin: Vec2,
}

impl Camera {
    /// Camera looking at `origin`.
    pub fn new(origin: Vec2) -> Self {
        Self { origin }
    }

    /// Current origin in world units.
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Moves the origin by `delta` world units.
    pub fn translate(&mut self, delta: Vec2) {
        self.origin += delta;
    }

    /// Jumps straight to `target`.
    pub fn recenter(&mut self, target: Vec2) {
        self.origin = target;
    }
}
