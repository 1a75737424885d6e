use macroquad::input::{is_key_down, KeyCode};
use macroquad::math::{vec2, Vec2};

/// Which direction keys are held this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionKeys {
    /// Up (W or arrow).
    pub up: bool,
    /// Down (S or arrow).
    pub down: bool,
    /// Left (A or arrow).
    pub left: bool,
    /// Right (D or arrow).
    pub right: bool,
}

impl DirectionKeys {
    /// Reads WASD and the arrow keys from macroquad.
    pub fn poll() -> Self {
        Self {
            up: is_key_down(KeyCode::W) || is_key_down(KeyCode::Up),
            down: is_key_down(KeyCode::S) || is_key_down(KeyCode::Down),
            left: is_key_down(KeyCode::A) || is_key_down(KeyCode::Left),
            right: is_key_down(KeyCode::D) || is_key_down(KeyCode::Right),
        }
    }

    /// Displacement for one tick at `speed` world units: unit length in any
    /// direction (diagonals included), zero when opposite keys cancel.
    pub fn movement(&self, speed: f32) -> Vec2 {
        let axis = |neg: bool, pos: bool| pos as i8 as f32 - neg as i8 as f32;
        let dir = vec2(axis(self.left, self.right), axis(self.up, self.down));
        dir.normalize_or_zero() * speed
    }
}
