//! Simulation State
//!
//! Avatar state plus the `SimState` context that owns every subsystem. All
//! global mutable state of the original design lives here explicitly, passed
//! by reference to subsystems - multiple independent simulations can coexist
//! and tests stay deterministic.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::DeterministicRng;
use crate::core::vec3::Vec3;
use crate::game::board::{BoardState, MatchStatus, PlayerColor, COLS, ROWS};
use crate::game::collision::CollisionWorld;
use crate::game::events::GameEvent;
use crate::game::scheduler::{AnimationScheduler, TaskCtx, TaskId};
use crate::game::tube::TubePath;

/// Avatar collision radius.
pub const AVATAR_RADIUS: f32 = 1.0;

/// Spawn pose for the Red avatar.
pub const RED_SPAWN: Vec3 = Vec3::new(-10.0, 12.0, 35.0);

/// Spawn pose for the Yellow avatar.
pub const YELLOW_SPAWN: Vec3 = Vec3::new(10.0, 12.0, 35.0);

/// Where an avatar is in the tube pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitState {
    /// Roaming the arena
    #[default]
    Free,
    /// Near a tube entry; a notification side effect only
    Approaching {
        /// Index of the tracked tube
        tube: usize,
    },
    /// Sliding down a tube toward a column
    InTransit {
        /// Target board column
        column: usize,
    },
    /// Slide finished; waiting for the end-of-frame sweep back to spawn
    PendingReset,
}

impl TransitState {
    /// Movement integration is suspended while sliding or awaiting reset.
    /// `Approaching` is only proximity tracking and still moves freely.
    #[inline]
    pub fn suspends_movement(self) -> bool {
        matches!(self, TransitState::InTransit { .. } | TransitState::PendingReset)
    }

    /// Whether proximity/entry checks apply in this state.
    #[inline]
    pub fn tracks_tubes(self) -> bool {
        matches!(self, TransitState::Free | TransitState::Approaching { .. })
    }
}

/// A player's in-arena movable entity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AvatarState {
    /// Board-game color of this avatar's pieces
    pub color: PlayerColor,
    /// Center position
    pub position: Vec3,
    /// Velocity; only the vertical component persists across frames
    pub velocity: Vec3,
    /// Facing around +Y, radians
    pub yaw: f32,
    /// Resting on a surface this frame
    pub grounded: bool,
    /// Allowed to jump (set on landing, cleared on takeoff)
    pub jump_ready: bool,
    /// Jump intent observed last frame, for rising-edge detection
    pub jump_held: bool,
    /// Tube pipeline state
    pub transit: TransitState,
    /// Hidden while sliding through a tube
    pub visible: bool,
    /// Pose restored on reset and after each transit
    pub spawn: Vec3,
}

impl AvatarState {
    /// Create an avatar at its spawn pose.
    pub fn new(color: PlayerColor, spawn: Vec3) -> Self {
        Self {
            color,
            position: spawn,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            grounded: false,
            jump_ready: false,
            jump_held: false,
            transit: TransitState::Free,
            visible: true,
            spawn,
        }
    }

    /// Return to the spawn pose: transit cleared, velocity zeroed, visible.
    pub fn reset_pose(&mut self) {
        self.position = self.spawn;
        self.velocity = Vec3::ZERO;
        self.transit = TransitState::Free;
        self.visible = true;
        self.grounded = false;
        self.jump_ready = false;
    }
}

/// Render record for a placed piece. Created once at placement and animated
/// by its Drop task; collaborators reference it by index, never by scanning
/// scene attributes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlacedPiece {
    /// Board row (0 = top)
    pub row: usize,
    /// Board column
    pub col: usize,
    /// Piece color
    pub color: PlayerColor,
    /// Current world position (animated during the drop)
    pub position: Vec3,
    /// Spin around the facing axis (animated during the drop)
    pub spin: f32,
}

/// A decorative particle riding a tube path during a slide.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlideSpark {
    /// The Sparks task that owns this particle
    pub owner: TaskId,
    /// Tube whose path the particle rides
    pub tube: usize,
    /// Normalized path parameter, wraps at 1
    pub t: f32,
    /// Path-parameter speed
    pub speed: f32,
    /// Current world position
    pub position: Vec3,
    /// Fades from 1 to 0 over the burst lifetime
    pub intensity: f32,
}

/// The complete simulation context.
///
/// Owns the board, both avatars, the static world, tube paths, and the
/// animation scheduler. One writer per resource: board mutations only happen
/// inside the transit completion step, and the static shape set never changes
/// after construction.
#[derive(Debug)]
pub struct SimState {
    /// The Connect-Four board (exclusive owner of the grid)
    pub board: BoardState,
    /// Both avatars, slot order Red then Yellow
    pub avatars: [AvatarState; 2],
    /// Static arena geometry
    pub world: CollisionWorld,
    /// Tube paths, index = board column
    pub tubes: Vec<TubePath>,
    /// Animation/task scheduler
    pub scheduler: AnimationScheduler,
    /// Render records for placed pieces
    pub pieces: Vec<PlacedPiece>,
    /// Decorative slide particles
    pub sparks: Vec<SlideSpark>,
    /// Seeded PRNG for decorative state
    pub rng: DeterministicRng,
    /// Frame counter
    pub frame: u32,
    /// Reset epoch; tasks created under an older epoch become no-ops
    pub epoch: u32,
    /// External "world settled" gate; intents are ignored until set
    pub stabilized: bool,

    pending_events: Vec<GameEvent>,
}

impl SimState {
    /// Create a simulation from world geometry and tube paths.
    pub fn new(world: CollisionWorld, tubes: Vec<TubePath>, rng_seed: u64) -> Self {
        Self {
            board: BoardState::new(),
            avatars: [
                AvatarState::new(PlayerColor::Red, RED_SPAWN),
                AvatarState::new(PlayerColor::Yellow, YELLOW_SPAWN),
            ],
            world,
            tubes,
            scheduler: AnimationScheduler::new(),
            pieces: Vec::new(),
            sparks: Vec::new(),
            rng: DeterministicRng::new(rng_seed),
            frame: 0,
            epoch: 0,
            stabilized: false,
            pending_events: Vec::new(),
        }
    }

    /// Avatar for a color.
    pub fn avatar(&self, color: PlayerColor) -> &AvatarState {
        &self.avatars[color.slot()]
    }

    /// Mutable avatar for a color.
    pub fn avatar_mut(&mut self, color: PlayerColor) -> &mut AvatarState {
        &mut self.avatars[color.slot()]
    }

    /// Flip the external stabilization gate.
    pub fn set_stabilized(&mut self, stabilized: bool) {
        self.stabilized = stabilized;
    }

    /// Queue an event for collaborators.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Global reset: atomically clears the animation scheduler, the board and
    /// match status, all render records, and both avatars' transit state and
    /// pose. Bumps the reset epoch so that any in-flight task created before
    /// the reset is discarded instead of mutating the fresh board.
    pub fn reset(&mut self) {
        self.scheduler.clear();
        self.board.reset();
        self.pieces.clear();
        self.sparks.clear();
        for avatar in &mut self.avatars {
            avatar.reset_pose();
        }
        self.epoch = self.epoch.wrapping_add(1);
        info!(frame = self.frame, epoch = self.epoch, "simulation reset");
        self.push_event(GameEvent::reset(self.frame));
    }

    /// Advance the animation scheduler by `dt`, lending the rest of the
    /// context to tasks through a [`TaskCtx`].
    pub fn advance_animations(&mut self, dt: f32) {
        let mut scheduler = std::mem::take(&mut self.scheduler);
        {
            let mut ctx = TaskCtx {
                board: &mut self.board,
                avatars: &mut self.avatars,
                tubes: &self.tubes,
                pieces: &mut self.pieces,
                sparks: &mut self.sparks,
                rng: &mut self.rng,
                events: &mut self.pending_events,
                epoch: self.epoch,
                frame: self.frame,
            };
            scheduler.tick(dt, &mut ctx);
        }
        self.scheduler = scheduler;
    }

    /// Hash the simulation state for determinism checks.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.frame, |hasher| {
            for row in 0..ROWS {
                for col in 0..COLS {
                    hasher.update_u8(self.board.cell(row, col) as u8);
                }
            }
            hasher.update_u8(status_tag(self.board.status()));

            for avatar in &self.avatars {
                hasher.update_vec3(avatar.position);
                hasher.update_vec3(avatar.velocity);
                hasher.update_f32(avatar.yaw);
                hasher.update_bool(avatar.grounded);
                hasher.update_u8(transit_tag(avatar.transit));
                hasher.update_bool(avatar.visible);
            }

            for piece in &self.pieces {
                hasher.update_u8(piece.color.cell() as u8);
                hasher.update_vec3(piece.position);
                hasher.update_f32(piece.spin);
            }

            hasher.update_u32(self.epoch);
        })
    }
}

fn status_tag(status: MatchStatus) -> u8 {
    match status {
        MatchStatus::InProgress => 0,
        MatchStatus::Won { color, .. } => 1 + color as u8,
        MatchStatus::Drawn => 3,
    }
}

fn transit_tag(transit: TransitState) -> u8 {
    match transit {
        TransitState::Free => 0,
        TransitState::Approaching { tube } => 10 + tube as u8,
        TransitState::InTransit { column } => 20 + column as u8,
        TransitState::PendingReset => 30,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::arena;

    fn test_state() -> SimState {
        SimState::new(
            arena::standard_world().expect("builtin geometry is valid"),
            arena::standard_tubes(),
            12345,
        )
    }

    #[test]
    fn test_new_state_spawns_two_avatars() {
        let state = test_state();
        assert_eq!(state.avatars[0].color, PlayerColor::Red);
        assert_eq!(state.avatars[1].color, PlayerColor::Yellow);
        assert_eq!(state.avatars[0].position, RED_SPAWN);
        assert_eq!(state.avatars[1].position, YELLOW_SPAWN);
        assert_eq!(state.board.status(), MatchStatus::InProgress);
    }

    #[test]
    fn test_reset_pose_restores_spawn() {
        let mut state = test_state();
        let avatar = state.avatar_mut(PlayerColor::Red);
        avatar.position = Vec3::new(1.0, 2.0, 3.0);
        avatar.velocity = Vec3::new(0.0, -9.0, 0.0);
        avatar.transit = TransitState::InTransit { column: 2 };
        avatar.visible = false;

        avatar.reset_pose();
        assert_eq!(avatar.position, RED_SPAWN);
        assert_eq!(avatar.velocity, Vec3::ZERO);
        assert_eq!(avatar.transit, TransitState::Free);
        assert!(avatar.visible);
    }

    #[test]
    fn test_reset_bumps_epoch_and_clears_everything() {
        let mut state = test_state();
        state.board.apply_move(0, PlayerColor::Red);
        state.pieces.push(PlacedPiece {
            row: 5,
            col: 0,
            color: PlayerColor::Red,
            position: Vec3::ZERO,
            spin: 0.0,
        });
        let epoch_before = state.epoch;

        state.reset();

        assert_eq!(state.epoch, epoch_before + 1);
        assert_eq!(state.board.piece_count(), 0);
        assert!(state.pieces.is_empty());
        assert!(state.sparks.is_empty());
        assert_eq!(state.scheduler.active_count(), 0);
        let events = state.take_events();
        assert!(matches!(events.last(), Some(GameEvent::Reset { .. })));
    }

    #[test]
    fn test_identical_states_hash_identically() {
        let a = test_state();
        let b = test_state();
        assert_eq!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_board_change_changes_hash() {
        let a = test_state();
        let mut b = test_state();
        b.board.apply_move(3, PlayerColor::Yellow);
        assert_ne!(a.compute_hash(), b.compute_hash());
    }
}
