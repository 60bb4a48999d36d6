//! Default Arena
//!
//! The standard arena geometry and tube curves, supplied once at
//! world-construction time. Only colliders and paths live here; visual
//! decoration belongs to rendering collaborators.
//!
//! Layout: a suburban block around a central Connect-Four board. Each of the
//! seven board columns is fed by one tube whose entry point is scattered
//! around the map.

use crate::core::vec3::Vec3;
use crate::game::board::COLS;
use crate::game::collision::{CollisionWorld, ShapeError, StaticShape};
use crate::game::tube::TubePath;

/// Edge length of a board cell in world units.
pub const CELL_SIZE: f32 = 4.0;

/// Board center height.
pub const BOARD_CENTER_Y: f32 = 12.0;

/// Z position of the board frame collider.
const BOARD_FRAME_Z: f32 = -20.0;

/// Z position of placed pieces.
const PIECE_Z: f32 = -5.0;

/// Height of a tube's board-connect point (just above the top row).
const BOARD_CONNECT_Y: f32 = BOARD_CENTER_Y + CELL_SIZE * 2.5;

/// Tube entry points around the map, one per column.
const TUBE_ENTRIES: [Vec3; COLS] = [
    Vec3::new(-25.0, 3.0, -25.0), // inside the west house
    Vec3::new(25.0, 3.0, -25.0),  // inside the east house
    Vec3::new(-15.0, 4.0, 32.0),  // on top of the bus
    Vec3::new(35.0, 4.0, 10.0),   // on the truck bed
    Vec3::new(0.0, 1.0, 15.0),    // inside the gazebo
    Vec3::new(-20.0, 1.0, 10.0),  // backyard
    Vec3::new(15.0, 1.0, 30.0),   // backroad
];

/// World position of the center of a board cell (where a placed piece rests).
pub fn piece_world_position(row: usize, col: usize) -> Vec3 {
    Vec3::new(
        (col as f32 - 3.0) * CELL_SIZE,
        (2.5 - row as f32) * CELL_SIZE,
        PIECE_Z,
    )
}

/// World X of a column's top opening.
fn column_x(col: usize) -> f32 {
    (col as f32 - 3.0) * CELL_SIZE
}

/// Build the standard static geometry.
///
/// Shapes register in a fixed order; landing resolution depends on it.
pub fn standard_world() -> Result<CollisionWorld, ShapeError> {
    let shapes = vec![
        // Main ground
        StaticShape::Plane {
            center: Vec3::ZERO,
            width: 150.0,
            depth: 150.0,
        },
        // Board frame
        StaticShape::Box {
            center: Vec3::new(0.0, BOARD_CENTER_Y, BOARD_FRAME_Z),
            half_extents: Vec3::new(15.0, 12.0, 1.0),
            yaw: 0.0,
        },
        // Player platform in front of the board
        StaticShape::Box {
            center: Vec3::new(0.0, 1.0, -15.0),
            half_extents: Vec3::new(15.0, 0.5, 5.0),
            yaw: 0.0,
        },
        // West and east houses
        StaticShape::Box {
            center: Vec3::new(-25.0, 2.5, -25.0),
            half_extents: Vec3::new(5.0, 2.5, 5.0),
            yaw: 0.0,
        },
        StaticShape::Box {
            center: Vec3::new(25.0, 2.5, -25.0),
            half_extents: Vec3::new(5.0, 2.5, 5.0),
            yaw: 0.0,
        },
        // Bus and truck (their roofs are tube entry platforms)
        StaticShape::Box {
            center: Vec3::new(-15.0, 2.0, 32.0),
            half_extents: Vec3::new(2.5, 2.0, 6.0),
            yaw: 0.0,
        },
        StaticShape::Box {
            center: Vec3::new(35.0, 2.0, 10.0),
            half_extents: Vec3::new(3.0, 2.0, 5.0),
            yaw: 0.2,
        },
        // Gazebo floor
        StaticShape::Cylinder {
            center: Vec3::new(0.0, 0.25, 15.0),
            radius: 4.0,
            height: 0.5,
        },
        // Lamp posts by the road
        StaticShape::Cylinder {
            center: Vec3::new(-8.0, 2.0, 20.0),
            radius: 0.3,
            height: 4.0,
        },
        StaticShape::Cylinder {
            center: Vec3::new(8.0, 2.0, 20.0),
            radius: 0.3,
            height: 4.0,
        },
        // Boulder
        StaticShape::Sphere {
            center: Vec3::new(20.0, 1.0, -5.0),
            radius: 1.5,
        },
    ];

    CollisionWorld::new(shapes)
}

/// Build the seven standard tube curves, one per board column.
///
/// Each curve runs entry -> side-dependent midpoint -> above the column ->
/// the column's top opening.
pub fn standard_tubes() -> Vec<TubePath> {
    (0..COLS)
        .map(|col| {
            let entry = TUBE_ENTRIES[col];
            let midpoint = match col.cmp(&3) {
                std::cmp::Ordering::Less => Vec3::new(-10.0, 10.0, 0.0),
                std::cmp::Ordering::Greater => Vec3::new(10.0, 10.0, 0.0),
                std::cmp::Ordering::Equal => Vec3::new(0.0, 12.0, 0.0),
            };
            let x = column_x(col);
            TubePath::new(
                col,
                vec![
                    entry,
                    midpoint,
                    Vec3::new(x, BOARD_CONNECT_Y + 5.0, BOARD_FRAME_Z),
                    Vec3::new(x, BOARD_CONNECT_Y, BOARD_FRAME_Z),
                ],
            )
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
