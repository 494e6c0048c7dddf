//! Collision shapes
//!
//! Shapes carry real geometry so callers can describe props faithfully,
//! but every collision test in this crate works on the shape's bounding
//! sphere. That is an intentional approximation: VR interaction sets are
//! small and hand contact does not need mesh-exact answers.

use crate::error::{PhysicsError, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Collision shape type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CollisionShape {
    /// Box with half-extents
    Box { half_extents: Vec3 },
    /// Sphere with radius
    Sphere { radius: f32 },
    /// Capsule aligned along Y
    Capsule { half_height: f32, radius: f32 },
    /// Cylinder aligned along Y
    Cylinder { half_height: f32, radius: f32 },
    /// Triangle mesh
    Mesh { vertices: Vec<Vec3>, indices: Vec<[u32; 3]> },
    /// Convex hull of a point cloud
    ConvexHull { points: Vec<Vec3> },
    /// Several shapes at local offsets
    Compound { children: Vec<(Vec3, CollisionShape)> },
}

impl Default for CollisionShape {
    fn default() -> Self {
        Self::Box {
            half_extents: Vec3::splat(0.5),
        }
    }
}

impl CollisionShape {
    /// Create a sphere shape
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Create a box shape from half-extents
    pub fn cuboid(hx: f32, hy: f32, hz: f32) -> Self {
        Self::Box {
            half_extents: Vec3::new(hx, hy, hz),
        }
    }

    /// Create a capsule shape (Y-aligned)
    pub fn capsule(half_height: f32, radius: f32) -> Self {
        Self::Capsule { half_height, radius }
    }

    /// Create a cylinder shape (Y-aligned)
    pub fn cylinder(half_height: f32, radius: f32) -> Self {
        Self::Cylinder { half_height, radius }
    }

    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Sphere { .. } => "sphere",
            Self::Capsule { .. } => "capsule",
            Self::Cylinder { .. } => "cylinder",
            Self::Mesh { .. } => "mesh",
            Self::ConvexHull { .. } => "convex_hull",
            Self::Compound { .. } => "compound",
        }
    }

    /// Reject shapes with zero, negative or non-finite extents
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Box { half_extents } => {
                if !half_extents.is_finite() || half_extents.min_element() <= 0.0 {
                    return Err(degenerate(format!("box half-extents {:?}", half_extents)));
                }
            }
            Self::Sphere { radius } => positive("sphere radius", *radius)?,
            Self::Capsule { half_height, radius } | Self::Cylinder { half_height, radius } => {
                positive("radius", *radius)?;
                // A zero half-height capsule is just a sphere
                if !half_height.is_finite() || *half_height < 0.0 {
                    return Err(degenerate(format!("half-height {}", half_height)));
                }
            }
            Self::Mesh { vertices, indices } => {
                if vertices.is_empty() || indices.is_empty() {
                    return Err(degenerate("empty mesh".to_string()));
                }
                if vertices.iter().any(|v| !v.is_finite()) {
                    return Err(degenerate("non-finite mesh vertex".to_string()));
                }
                let count = vertices.len() as u32;
                if indices.iter().flatten().any(|&i| i >= count) {
                    return Err(degenerate("mesh index out of range".to_string()));
                }
                points_have_extent(vertices)?;
            }
            Self::ConvexHull { points } => {
                if points.len() < 2 || points.iter().any(|p| !p.is_finite()) {
                    return Err(degenerate("convex hull needs finite points".to_string()));
                }
                points_have_extent(points)?;
            }
            Self::Compound { children } => {
                if children.is_empty() {
                    return Err(degenerate("empty compound".to_string()));
                }
                for (offset, child) in children {
                    if !offset.is_finite() {
                        return Err(degenerate("non-finite compound offset".to_string()));
                    }
                    child.validate()?;
                }
            }
        }
        Ok(())
    }

    /// Radius of the sphere around the local origin that encloses the shape
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Self::Box { half_extents } => half_extents.length(),
            Self::Sphere { radius } => *radius,
            Self::Capsule { half_height, radius } => half_height + radius,
            Self::Cylinder { half_height, radius } => (half_height * half_height + radius * radius).sqrt(),
            Self::Mesh { vertices, .. } => max_length(vertices),
            Self::ConvexHull { points } => max_length(points),
            Self::Compound { children } => children
                .iter()
                .map(|(offset, child)| offset.length() + child.bounding_radius())
                .fold(0.0, f32::max),
        }
    }

    /// Volume estimate used for density-derived mass
    pub fn volume(&self) -> f32 {
        use std::f32::consts::PI;
        match self {
            Self::Box { half_extents } => 8.0 * half_extents.x * half_extents.y * half_extents.z,
            Self::Sphere { radius } => 4.0 / 3.0 * PI * radius.powi(3),
            Self::Capsule { half_height, radius } => {
                PI * radius * radius * (2.0 * half_height) + 4.0 / 3.0 * PI * radius.powi(3)
            }
            Self::Cylinder { half_height, radius } => PI * radius * radius * 2.0 * half_height,
            Self::Compound { children } => children.iter().map(|(_, c)| c.volume()).sum(),
            // Bounding sphere volume for free-form geometry
            Self::Mesh { .. } | Self::ConvexHull { .. } => {
                4.0 / 3.0 * PI * self.bounding_radius().powi(3)
            }
        }
    }
}

fn degenerate(msg: String) -> PhysicsError {
    PhysicsError::DegenerateShape(msg)
}

fn positive(what: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(degenerate(format!("{} {}", what, value)))
    }
}

fn max_length(points: &[Vec3]) -> f32 {
    points.iter().map(|p| p.length()).fold(0.0, f32::max)
}

fn points_have_extent(points: &[Vec3]) -> Result<()> {
    if max_length(points) <= 0.0 {
        return Err(degenerate("all points at the origin".to_string()));
    }
    Ok(())
}
