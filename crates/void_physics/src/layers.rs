//! Collision layers and filtering

use serde::{Deserialize, Serialize};

/// A collision layer identifier (bit index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionLayer(pub u32);

impl CollisionLayer {
    /// Default layer
    pub const DEFAULT: Self = Self(0);
    /// Hand/controller proxies
    pub const HANDS: Self = Self(1);
    /// Headset proxy
    pub const HEAD: Self = Self(2);
    /// Body proxy
    pub const BODY: Self = Self(3);
    /// Grabbable and pushable props
    pub const INTERACTABLE: Self = Self(4);
    /// Static environment
    pub const ENVIRONMENT: Self = Self(5);
    /// Trigger volumes
    pub const TRIGGERS: Self = Self(6);

    /// Create a custom layer
    pub const fn custom(id: u32) -> Self {
        Self(id)
    }

    /// Get the layer as a bitmask (zero for out-of-range indices)
    pub fn as_mask(&self) -> u32 {
        1u32.checked_shl(self.0).unwrap_or(0)
    }
}

impl Default for CollisionLayer {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Which directions of the layer/mask gate must pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerGating {
    /// `a.layer & b.mask` and `b.layer & a.mask` must both be non-zero
    #[default]
    Symmetric,
    /// Only `a.layer & b.mask` is tested
    OneWay,
}

/// Layer membership and collision mask of one object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionGroups {
    /// Layers this object belongs to
    pub layer: u32,
    /// Layers this object collides with
    pub mask: u32,
}

impl CollisionGroups {
    /// Collide with everything
    pub const ALL: Self = Self {
        layer: u32::MAX,
        mask: u32::MAX,
    };

    /// Collide with nothing
    pub const NONE: Self = Self { layer: 0, mask: 0 };

    /// Create new collision groups
    pub fn new(layer: u32, mask: u32) -> Self {
        Self { layer, mask }
    }

    /// Create from a single layer that collides with specific layers
    pub fn from_layer(layer: CollisionLayer, collides_with: &[CollisionLayer]) -> Self {
        let mask = collides_with.iter().fold(0u32, |acc, l| acc | l.as_mask());
        Self {
            layer: layer.as_mask(),
            mask,
        }
    }

    /// Gate test between `self` (a) and `other` (b)
    pub fn can_collide(&self, other: &CollisionGroups, gating: LayerGating) -> bool {
        let forward = (self.layer & other.mask) != 0;
        match gating {
            LayerGating::OneWay => forward,
            LayerGating::Symmetric => forward && (other.layer & self.mask) != 0,
        }
    }

    /// Add a layer to membership
    pub fn add_layer(mut self, layer: CollisionLayer) -> Self {
        self.layer |= layer.as_mask();
        self
    }

    /// Add a layer to the mask
    pub fn add_mask(mut self, layer: CollisionLayer) -> Self {
        self.mask |= layer.as_mask();
        self
    }

    /// Remove a layer from the mask
    pub fn remove_mask(mut self, layer: CollisionLayer) -> Self {
        self.mask &= !layer.as_mask();
        self
    }
}

impl Default for CollisionGroups {
    fn default() -> Self {
        Self::ALL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disjoint_layers_never_collide() {
        let a = CollisionGroups::new(0b01, 0b01);
        let b = CollisionGroups::new(0b10, 0b10);

        assert!(!a.can_collide(&b, LayerGating::Symmetric));
        assert!(!b.can_collide(&a, LayerGating::Symmetric));
        assert!(!a.can_collide(&b, LayerGating::OneWay));
    }

    #[test]
    fn test_one_way_gating() {
        // b is in a's mask, a is not in b's
        let a = CollisionGroups::new(0b01, 0b10);
        let b = CollisionGroups::new(0b10, 0b00);

        assert!(!a.can_collide(&b, LayerGating::OneWay));
        assert!(b.can_collide(&a, LayerGating::OneWay));
        assert!(!b.can_collide(&a, LayerGating::Symmetric));
    }

    #[test]
    fn test_from_layer() {
        let hands = CollisionGroups::from_layer(
            CollisionLayer::HANDS,
            &[CollisionLayer::INTERACTABLE, CollisionLayer::ENVIRONMENT],
        );
        let prop = CollisionGroups::from_layer(CollisionLayer::INTERACTABLE, &[CollisionLayer::HANDS]);

        assert!(hands.can_collide(&prop, LayerGating::Symmetric));
        assert_eq!(CollisionLayer::custom(40).as_mask(), 0);
    }
}
