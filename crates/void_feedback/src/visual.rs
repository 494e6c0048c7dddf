//! Visual highlight entries

use crate::haptic::clamp_unit;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use void_physics::ObjectId;

/// A one-shot highlight request for an object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualFeedback {
    pub object: ObjectId,
    /// Linear RGB, each channel in [0, 1]
    pub color: Vec3,
    /// Strength in [0, 1]
    pub intensity: f32,
    pub active: bool,
}

impl VisualFeedback {
    /// Create a highlight; color channels and intensity are clamped
    pub fn new(object: ObjectId, color: Vec3, intensity: f32) -> Self {
        let color = if color.is_finite() {
            color.clamp(Vec3::ZERO, Vec3::ONE)
        } else {
            Vec3::ONE
        };
        Self {
            object,
            color,
            intensity: clamp_unit(intensity),
            active: true,
        }
    }

    /// Scale intensity, keeping it within [0, 1]
    pub fn scaled(mut self, factor: f32) -> Self {
        self.intensity = clamp_unit(self.intensity * factor);
        self
    }
}

/// Common highlight colors
pub mod colors {
    use glam::Vec3;

    pub const WHITE: Vec3 = Vec3::new(1.0, 1.0, 1.0);
    pub const GREEN: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const BLUE: Vec3 = Vec3::new(0.0, 0.0, 1.0);
    pub const ORANGE: Vec3 = Vec3::new(1.0, 0.5, 0.0);
    pub const YELLOW: Vec3 = Vec3::new(1.0, 1.0, 0.0);
    pub const CYAN: Vec3 = Vec3::new(0.0, 1.0, 1.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_color_and_intensity() {
        let v = VisualFeedback::new(ObjectId::from_raw(1), Vec3::new(2.0, -1.0, 0.5), 7.0);
        assert_eq!(v.color, Vec3::new(1.0, 0.0, 0.5));
        assert_eq!(v.intensity, 1.0);
    }
}
