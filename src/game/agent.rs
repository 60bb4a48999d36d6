//! Avatar Movement Integration
//!
//! Per-frame integration of intent-driven horizontal movement, gravity,
//! landing resolution, jumping, and facing. Integration is suspended entirely
//! while the avatar is riding a tube; the external stabilization gate only
//! mutes the movement intents (gravity and landing keep running so avatars
//! settle onto the ground during startup).

use crate::core::vec3::{wrap_angle, Vec3};
use crate::game::collision::CollisionWorld;
use crate::game::input::IntentFrame;
use crate::game::state::{AvatarState, AVATAR_RADIUS};

/// Horizontal movement speed, units/second.
pub const MOVE_SPEED: f32 = 8.0;

/// Gravity acceleration, units/second^2.
pub const GRAVITY: f32 = 30.0;

/// Vertical velocity applied on jump, units/second.
pub const JUMP_IMPULSE: f32 = 10.0;

/// Proportional yaw approach gain, 1/second.
pub const TURN_GAIN: f32 = 5.0;

/// Falling below this height teleports the avatar back to spawn.
pub const FALL_RESET_Y: f32 = -20.0;

/// Integrate one avatar for one frame.
///
/// Order matters: horizontal intent movement, gravity, vertical movement,
/// landing resolution, jump (rising edge only), facing, out-of-bounds reset.
pub fn integrate(
    avatar: &mut AvatarState,
    intent: &IntentFrame,
    world: &CollisionWorld,
    stabilized: bool,
    dt: f32,
) {
    if avatar.transit.suspends_movement() {
        return;
    }

    // Forward/right basis from the externally supplied view heading
    let yaw = intent.view_yaw;
    let (sin, cos) = yaw.sin_cos();
    let forward = Vec3::new(-sin, 0.0, -cos);
    let right = Vec3::new(cos, 0.0, -sin);

    let mut direction = Vec3::ZERO;
    if stabilized {
        if intent.forward() {
            direction += forward;
        }
        if intent.backward() {
            direction += -forward;
        }
        if intent.right() {
            direction += right;
        }
        if intent.left() {
            direction += -right;
        }
    }

    // Normalize so diagonals are not faster
    if direction.length_squared() > 0.0 {
        direction = direction.normalize();
    }
    avatar.position += direction.scale(MOVE_SPEED * dt);

    // Gravity only accumulates while airborne
    if !avatar.grounded {
        avatar.velocity.y -= GRAVITY * dt;
    }
    avatar.position.y += avatar.velocity.y * dt;

    // Landing is re-derived every frame
    avatar.grounded = false;
    let landing = world.resolve_landing(avatar.position, avatar.velocity.y, AVATAR_RADIUS);
    avatar.position.y = landing.new_y;
    avatar.velocity.y = landing.new_vel_y;
    if landing.grounded {
        avatar.grounded = true;
        avatar.jump_ready = true;
    }

    // Jump triggers only on the rising edge of the intent
    if intent.jump() && !avatar.jump_held && avatar.grounded && avatar.jump_ready {
        avatar.velocity.y = JUMP_IMPULSE;
        avatar.grounded = false;
        avatar.jump_ready = false;
    }
    avatar.jump_held = intent.jump();

    // Smoothly face the movement heading along the shortest angular path
    if direction.length_squared() > 0.0 {
        let target = direction.x.atan2(direction.z);
        let diff = wrap_angle(target - avatar.yaw);
        avatar.yaw += diff * TURN_GAIN * dt;
    }

    // Fell off the world: forced reset, not an error
    if avatar.position.y < FALL_RESET_Y {
        avatar.reset_pose();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::PlayerColor;
    use crate::game::collision::{CollisionWorld, StaticShape};
    use crate::game::state::TransitState;

    const DT: f32 = 1.0 / 60.0;

    fn flat_world() -> CollisionWorld {
        CollisionWorld::new(vec![StaticShape::Plane {
            center: Vec3::ZERO,
            width: 200.0,
            depth: 200.0,
        }])
        .expect("test world is valid")
    }

    fn grounded_avatar() -> AvatarState {
        let mut avatar = AvatarState::new(PlayerColor::Red, Vec3::new(0.0, 1.0, 0.0));
        avatar.grounded = true;
        avatar.jump_ready = true;
        avatar
    }

    fn settle(avatar: &mut AvatarState, world: &CollisionWorld) {
        for _ in 0..240 {
            integrate(avatar, &IntentFrame::new(), world, true, DT);
        }
    }

    #[test]
    fn test_forward_intent_moves_along_view_heading() {
        let world = flat_world();
        let mut avatar = grounded_avatar();
        let intent = IntentFrame::pressing(IntentFrame::FLAG_FORWARD);

        integrate(&mut avatar, &intent, &world, true, DT);
        // View yaw 0 faces -Z
        assert!(avatar.position.z < 0.0);
        assert_eq!(avatar.position.x, 0.0);
        let expected = MOVE_SPEED * DT;
        assert!((avatar.position.z + expected).abs() < 1e-5);
    }

    #[test]
    fn test_diagonal_movement_is_normalized() {
        let world = flat_world();
        let mut a = grounded_avatar();
        let mut b = grounded_avatar();

        let straight = IntentFrame::pressing(IntentFrame::FLAG_FORWARD);
        let diagonal =
            IntentFrame::pressing(IntentFrame::FLAG_FORWARD | IntentFrame::FLAG_RIGHT);

        integrate(&mut a, &straight, &world, true, DT);
        integrate(&mut b, &diagonal, &world, true, DT);

        let da = a.position.horizontal_distance(Vec3::new(0.0, 0.0, 0.0));
        let db = b.position.horizontal_distance(Vec3::new(0.0, 0.0, 0.0));
        assert!((da - db).abs() < 1e-5, "diagonal must not be faster");
    }

    #[test]
    fn test_view_yaw_rotates_basis() {
        use std::f32::consts::FRAC_PI_2;
        let world = flat_world();
        let mut avatar = grounded_avatar();
        let intent =
            IntentFrame::pressing(IntentFrame::FLAG_FORWARD).with_yaw(FRAC_PI_2);

        integrate(&mut avatar, &intent, &world, true, DT);
        // Yaw π/2 turns forward from -Z to -X
        assert!(avatar.position.x < -1e-4);
        assert!(avatar.position.z.abs() < 1e-4);
    }

    #[test]
    fn test_gravity_pulls_airborne_avatar_to_ground() {
        let world = flat_world();
        let mut avatar = AvatarState::new(PlayerColor::Red, Vec3::new(0.0, 5.0, 0.0));

        settle(&mut avatar, &world);
        assert!(avatar.grounded);
        assert_eq!(avatar.velocity.y, 0.0);
        // Resting on the plane: center at surface + radius
        assert_eq!(avatar.position.y, 1.0);
    }

    #[test]
    fn test_jump_rising_edge_only() {
        let world = flat_world();
        let mut avatar = grounded_avatar();
        avatar.position.y = 1.0;

        let jump = IntentFrame::pressing(IntentFrame::FLAG_JUMP);
        integrate(&mut avatar, &jump, &world, true, DT);
        assert!(!avatar.grounded);
        assert!(avatar.velocity.y > 0.0);

        // Holding jump while airborne never re-triggers
        let v_after_first = avatar.velocity.y;
        integrate(&mut avatar, &jump, &world, true, DT);
        assert!(avatar.velocity.y < v_after_first);

        // Land while still holding: no bunny hop without a release
        settle_holding(&mut avatar, &world, &jump);
        assert!(avatar.grounded);

        // Release, then press again: jump fires
        integrate(&mut avatar, &IntentFrame::new(), &world, true, DT);
        integrate(&mut avatar, &jump, &world, true, DT);
        assert!(!avatar.grounded);
    }

    fn settle_holding(avatar: &mut AvatarState, world: &CollisionWorld, intent: &IntentFrame) {
        for _ in 0..240 {
            integrate(avatar, intent, world, true, DT);
            if avatar.grounded {
                return;
            }
        }
        panic!("avatar never landed");
    }

    #[test]
    fn test_unstabilized_gate_mutes_intents_but_not_gravity() {
        let world = flat_world();
        let mut avatar = AvatarState::new(PlayerColor::Red, Vec3::new(0.0, 5.0, 0.0));
        let intent = IntentFrame::pressing(IntentFrame::FLAG_FORWARD);

        for _ in 0..240 {
            integrate(&mut avatar, &intent, &world, false, DT);
        }
        // Never moved horizontally, but still settled onto the ground
        assert_eq!(avatar.position.x, 0.0);
        assert_eq!(avatar.position.z, 0.0);
        assert!(avatar.grounded);
    }

    #[test]
    fn test_transit_suspends_integration_entirely() {
        let world = flat_world();
        let mut avatar = grounded_avatar();
        avatar.transit = TransitState::InTransit { column: 0 };
        let before = avatar.position;

        let intent = IntentFrame::pressing(IntentFrame::FLAG_FORWARD | IntentFrame::FLAG_JUMP);
        integrate(&mut avatar, &intent, &world, true, DT);
        assert_eq!(avatar.position, before);
    }

    #[test]
    fn test_facing_approaches_movement_heading() {
        let world = flat_world();
        let mut avatar = grounded_avatar();
        assert_eq!(avatar.yaw, 0.0);

        // Strafe right: heading is +X, target yaw = atan2(1, 0) = π/2
        let intent = IntentFrame::pressing(IntentFrame::FLAG_RIGHT);
        for _ in 0..240 {
            integrate(&mut avatar, &intent, &world, true, DT);
        }
        assert!((avatar.yaw - std::f32::consts::FRAC_PI_2).abs() < 0.05);
    }

    #[test]
    fn test_facing_takes_shortest_path() {
        let world = flat_world();
        let mut avatar = grounded_avatar();
        avatar.yaw = 3.0; // just under π

        // Target just past -π equivalent: moving -X, target atan2(-1, 0) = -π/2
        let intent = IntentFrame::pressing(IntentFrame::FLAG_LEFT);
        let before = avatar.yaw;
        integrate(&mut avatar, &intent, &world, true, DT);
        // Shortest path from 3.0 rad to -π/2 goes forward through π, so yaw
        // increases rather than unwinding all the way back through zero
        assert!(avatar.yaw > before);
    }

    #[test]
    fn test_fall_below_threshold_resets_to_spawn() {
        // No geometry at all: the avatar falls forever
        let world = CollisionWorld::new(Vec::new()).expect("empty world is valid");
        let spawn = Vec3::new(4.0, 12.0, -7.0);
        let mut avatar = AvatarState::new(PlayerColor::Yellow, spawn);

        for _ in 0..600 {
            integrate(&mut avatar, &IntentFrame::new(), &world, true, DT);
        }
        // It must have been teleported back at least once and be falling again
        assert!(avatar.position.y > FALL_RESET_Y - 2.0);
        assert_eq!(avatar.position.x, spawn.x);
        assert_eq!(avatar.position.z, spawn.z);
    }
}
