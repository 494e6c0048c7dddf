//! Haptic feedback entries

use glam::Vec3;
use serde::{Deserialize, Serialize};
use void_physics::Hand;

/// Strength class of a haptic pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HapticCategory {
    /// Brush or tap
    #[default]
    Light,
    /// Firm grip or contact
    Medium,
    /// Impact or recoil
    Heavy,
    /// Caller-defined pattern
    Custom,
}

impl HapticCategory {
    /// Intensity used when a caller does not supply one
    pub fn default_intensity(&self) -> f32 {
        match self {
            Self::Light => 0.3,
            Self::Medium => 0.6,
            Self::Heavy => 0.9,
            Self::Custom => 0.5,
        }
    }

    /// Duration in seconds used when a caller does not supply one
    pub fn default_duration(&self) -> f32 {
        match self {
            Self::Light => 0.1,
            Self::Medium => 0.2,
            Self::Heavy => 0.4,
            Self::Custom => 0.25,
        }
    }
}

/// A haptic pulse waiting to be forwarded to a controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HapticFeedback {
    pub hand: Hand,
    pub category: HapticCategory,
    /// Strength in [0, 1]
    pub intensity: f32,
    /// Seconds left before the pulse expires
    pub remaining: f32,
    /// Where the pulse originated, for spatialized devices
    pub position: Vec3,
    pub active: bool,
}

impl HapticFeedback {
    /// Create a pulse; intensity is clamped into [0, 1]
    pub fn new(hand: Hand, category: HapticCategory, intensity: f32, duration: f32) -> Self {
        Self {
            hand,
            category,
            intensity: clamp_unit(intensity),
            remaining: if duration.is_finite() { duration.max(0.0) } else { 0.0 },
            position: Vec3::ZERO,
            active: true,
        }
    }

    /// Pulse with the category's default strength and duration
    pub fn preset(hand: Hand, category: HapticCategory) -> Self {
        Self::new(hand, category, category.default_intensity(), category.default_duration())
    }

    /// Set the originating position
    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Scale intensity, keeping it within [0, 1]
    pub fn scaled(mut self, factor: f32) -> Self {
        self.intensity = clamp_unit(self.intensity * factor);
        self
    }
}

pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_intensity_clamped() {
        assert_relative_eq!(HapticFeedback::new(Hand::Left, HapticCategory::Heavy, 3.0, 0.1).intensity, 1.0);
        assert_relative_eq!(HapticFeedback::new(Hand::Left, HapticCategory::Light, -1.0, 0.1).intensity, 0.0);
        assert_relative_eq!(HapticFeedback::new(Hand::Left, HapticCategory::Light, f32::NAN, 0.1).intensity, 0.0);
    }

    #[test]
    fn test_scaled_stays_in_range() {
        let pulse = HapticFeedback::preset(Hand::Right, HapticCategory::Medium).scaled(4.0);
        assert_relative_eq!(pulse.intensity, 1.0);
        assert_relative_eq!(pulse.remaining, 0.2);
    }
}
