//! Collision Resolution
//!
//! Landing-only collision against static arena geometry, plus avatar-avatar
//! separation. Horizontal movement into the side of a shape is deliberately
//! never blocked; only coming to rest on top of a surface is modeled.
//!
//! Shape evaluation order is the registration order, which makes the resolver
//! deterministic when several overlapping shapes could claim a landing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::vec3::Vec3;

/// Band below a surface top in which a falling avatar still snaps up.
const LAND_BAND_BELOW: f32 = 0.2;

/// Band above a surface top in which a falling avatar snaps down.
const LAND_BAND_ABOVE: f32 = 0.5;

/// Epsilon guarding the zero-distance separation case.
const SEPARATION_EPS: f32 = 1e-6;

/// A static arena collider.
///
/// Immutable after world construction. Each kind has its own footprint test
/// in [`CollisionWorld::resolve_landing`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum StaticShape {
    /// Axis-aligned box, optionally yawed around +Y.
    Box {
        /// Center of the box
        center: Vec3,
        /// Half extents along local X/Y/Z
        half_extents: Vec3,
        /// Rotation around +Y in radians
        yaw: f32,
    },
    /// Horizontal bounded rectangle (ground, roads, platforms).
    Plane {
        /// Center of the rectangle; `center.y` is the walk surface
        center: Vec3,
        /// Extent along X
        width: f32,
        /// Extent along Z
        depth: f32,
    },
    /// Vertical cylinder (posts, trees, barrels).
    Cylinder {
        /// Center at mid-height
        center: Vec3,
        /// Radius in the XZ plane
        radius: f32,
        /// Full height
        height: f32,
    },
    /// Sphere (boulders).
    Sphere {
        /// Center of the sphere
        center: Vec3,
        /// Radius
        radius: f32,
    },
}

impl StaticShape {
    /// Height of the walkable top surface.
    #[inline]
    pub fn top(&self) -> f32 {
        match *self {
            StaticShape::Box { center, half_extents, .. } => center.y + half_extents.y,
            StaticShape::Plane { center, .. } => center.y,
            StaticShape::Cylinder { center, height, .. } => center.y + height * 0.5,
            StaticShape::Sphere { center, radius } => center.y + radius,
        }
    }

    /// Per-kind XZ footprint test.
    ///
    /// The box test expands by the avatar radius while the plane test does
    /// not; both quirks are part of the landing contract.
    fn footprint_contains(&self, pos: Vec3, avatar_radius: f32) -> bool {
        match *self {
            StaticShape::Box { center, half_extents, yaw } => {
                let dx = pos.x - center.x;
                let dz = pos.z - center.z;
                // Rotate the avatar into box-local space
                let (lx, lz) = if yaw == 0.0 {
                    (dx, dz)
                } else {
                    let (sin, cos) = yaw.sin_cos();
                    (dx * cos + dz * sin, dz * cos - dx * sin)
                };
                lx.abs() <= half_extents.x + avatar_radius
                    && lz.abs() <= half_extents.z + avatar_radius
            }
            StaticShape::Plane { center, width, depth } => {
                (pos.x - center.x).abs() <= width * 0.5
                    && (pos.z - center.z).abs() <= depth * 0.5
            }
            StaticShape::Cylinder { center, radius, .. }
            | StaticShape::Sphere { center, radius } => {
                pos.horizontal_distance(center) < radius + avatar_radius
            }
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        let (center, dims) = match *self {
            StaticShape::Box { center, half_extents, yaw } => {
                if !yaw.is_finite() {
                    return Err("non-finite yaw");
                }
                (center, [half_extents.x, half_extents.y, half_extents.z])
            }
            StaticShape::Plane { center, width, depth } => (center, [width, depth, 1.0]),
            StaticShape::Cylinder { center, radius, height } => (center, [radius, height, 1.0]),
            StaticShape::Sphere { center, radius } => (center, [radius, 1.0, 1.0]),
        };
        if !center.is_finite() {
            return Err("non-finite center");
        }
        for d in dims {
            if !d.is_finite() {
                return Err("non-finite dimension");
            }
            if d <= 0.0 {
                return Err("non-positive dimension");
            }
        }
        Ok(())
    }
}

/// Construction-time rejection of a malformed shape (programmer error).
#[derive(Debug, Clone, Error)]
#[error("invalid static shape at index {index}: {reason}")]
pub struct ShapeError {
    /// Registration index of the offending shape
    pub index: usize,
    /// What was wrong with it
    pub reason: &'static str,
}

/// Result of a landing resolution pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LandingResolution {
    /// Vertical position after resolution
    pub new_y: f32,
    /// Vertical velocity after resolution
    pub new_vel_y: f32,
    /// Whether the avatar came to rest on a surface
    pub grounded: bool,
}

/// Registry of static arena colliders.
///
/// Append-only after construction; the simulation never mutates it at
/// runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollisionWorld {
    shapes: Vec<StaticShape>,
}

impl CollisionWorld {
    /// Build a world from shapes, validating each one.
    ///
    /// A malformed shape (non-finite or non-positive dimensions) is a fatal
    /// construction error, not a runtime condition.
    pub fn new(shapes: Vec<StaticShape>) -> Result<Self, ShapeError> {
        for (index, shape) in shapes.iter().enumerate() {
            shape
                .validate()
                .map_err(|reason| ShapeError { index, reason })?;
        }
        Ok(Self { shapes })
    }

    /// Registered shapes, in registration order.
    pub fn shapes(&self) -> &[StaticShape] {
        &self.shapes
    }

    /// Resolve a falling avatar against every shape.
    ///
    /// The first shape (in registration order) whose footprint contains the
    /// avatar and whose top lies within the landing band of the avatar's
    /// bottom wins: the avatar snaps to `top + radius`, vertical velocity is
    /// zeroed, and it is grounded. Rising avatars are never captured.
    pub fn resolve_landing(&self, pos: Vec3, vel_y: f32, radius: f32) -> LandingResolution {
        if vel_y <= 0.0 {
            let bottom = pos.y - radius;
            for shape in &self.shapes {
                if !shape.footprint_contains(pos, radius) {
                    continue;
                }
                let top = shape.top();
                if bottom <= top + LAND_BAND_ABOVE && bottom >= top - LAND_BAND_BELOW {
                    return LandingResolution {
                        new_y: top + radius,
                        new_vel_y: 0.0,
                        grounded: true,
                    };
                }
            }
        }
        LandingResolution {
            new_y: pos.y,
            new_vel_y: vel_y,
            grounded: false,
        }
    }
}

/// Push two overlapping avatars apart, splitting the overlap 50/50.
///
/// Overlap is measured in the XZ plane. Returns `None` when the avatars are
/// clear of each other; otherwise the per-avatar position deltas. Exact
/// overlap (zero distance) falls back to the +X axis rather than producing a
/// NaN direction.
pub fn resolve_avatar_separation(
    pos_a: Vec3,
    pos_b: Vec3,
    radius: f32,
) -> Option<(Vec3, Vec3)> {
    let distance = pos_a.horizontal_distance(pos_b);
    if distance >= radius * 2.0 {
        return None;
    }

    let direction = if distance <= SEPARATION_EPS {
        Vec3::new(1.0, 0.0, 0.0)
    } else {
        (pos_a - pos_b).flattened().scale(1.0 / distance)
    };

    let push = (radius * 2.0 - distance) * 0.5;
    Some((direction.scale(push), direction.scale(-push)))
}

// =============================================================================
// TESTS
// =============================================================================
