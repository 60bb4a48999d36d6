//! Tube Transit Pipeline
//!
//! Tube paths (curves from arena entry points to the top of each board
//! column) and the per-avatar state machine that rides them:
//!
//! ```text
//! Free -> Approaching(tube) -> InTransit(column) -> PendingReset -> Free
//! ```
//!
//! Approaching is a notification side effect only; the commitment point is
//! entry, which schedules a single slide task. The slide's completion is the
//! one and only writer of the board.

use tracing::{debug, info, warn};

use serde::{Deserialize, Serialize};

use crate::core::vec3::Vec3;
use crate::game::arena;
use crate::game::board::MoveOutcome;
use crate::game::events::GameEvent;
use crate::game::scheduler::{TaskCtx, TaskKind, TaskSpawn};
use crate::game::state::{PlacedPiece, SimState, SlideSpark, TransitState};

/// Wide radius that triggers the proximity notification.
pub const PROXIMITY_RADIUS: f32 = 10.0;

/// Vertical tolerance for the proximity notification.
pub const PROXIMITY_HEIGHT: f32 = 3.0;

/// Narrow radius that commits the avatar to the tube.
pub const ENTRY_RADIUS: f32 = 3.0;

/// Vertical tolerance for entry.
pub const ENTRY_HEIGHT: f32 = 1.5;

/// Slide duration in seconds.
pub const SLIDE_DURATION: f32 = 1.5;

/// Piece drop duration in seconds.
pub const DROP_DURATION: f32 = 1.0;

/// How far above its cell a dropped piece starts.
pub const DROP_HEIGHT: f32 = 10.0;

/// Decorative particles seeded per slide.
const SPARKS_PER_SLIDE: usize = 30;

/// An ordered curve from an arena entry point to the top of a board column.
///
/// Control points are interpolated with a uniform Catmull-Rom spline
/// (clamped endpoints). Shared and read-only after construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TubePath {
    /// Board column this tube feeds
    pub column: usize,
    points: Vec<Vec3>,
}

impl TubePath {
    /// Create a path from at least two control points.
    pub fn new(column: usize, points: Vec<Vec3>) -> Self {
        debug_assert!(points.len() >= 2, "a tube path needs at least two points");
        Self { column, points }
    }

    /// The entry point (first control point).
    #[inline]
    pub fn entry(&self) -> Vec3 {
        self.points[0]
    }

    /// The board-connect point (last control point).
    #[inline]
    pub fn exit(&self) -> Vec3 {
        self.points[self.points.len() - 1]
    }

    /// Sample the curve at `t` in [0, 1].
    pub fn point(&self, t: f32) -> Vec3 {
        let n = self.points.len();
        if n == 1 {
            return self.points[0];
        }

        let t = t.clamp(0.0, 1.0);
        let segments = (n - 1) as f32;
        let scaled = t * segments;
        let seg = (scaled.floor() as usize).min(n - 2);
        let u = scaled - seg as f32;

        // Clamped endpoint tangents
        let p0 = self.points[seg.saturating_sub(1)];
        let p1 = self.points[seg];
        let p2 = self.points[seg + 1];
        let p3 = self.points[(seg + 2).min(n - 1)];

        catmull_rom(p0, p1, p2, p3, u)
    }
}

/// Uniform Catmull-Rom interpolation between `p1` and `p2`.
fn catmull_rom(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, u: f32) -> Vec3 {
    let u2 = u * u;
    let u3 = u2 * u;

    let a = p1.scale(2.0);
    let b = p2 - p0;
    let c = p0.scale(2.0) - p1.scale(5.0) + p2.scale(4.0) - p3;
    let d = p1.scale(3.0) - p0 - p2.scale(3.0) + p3;

    (a + b.scale(u) + c.scale(u2) + d.scale(u3)).scale(0.5)
}

/// Evaluate tube proximity and entry for one avatar.
///
/// Runs each frame after collision resolution. An avatar already in transit
/// never re-triggers these checks, so at most one slide task per avatar is
/// live at a time.
pub fn check_transit(state: &mut SimState, avatar_idx: usize) {
    if !state.avatars[avatar_idx].transit.tracks_tubes() {
        return;
    }

    let position = state.avatars[avatar_idx].position;
    let decided = state.board.status().is_decided();

    for tube_idx in 0..state.tubes.len() {
        let entry = state.tubes[tube_idx].entry();
        let distance = position.distance(entry);
        let dy = (position.y - entry.y).abs();

        let near = distance < PROXIMITY_RADIUS && dy < PROXIMITY_HEIGHT;
        let transit = state.avatars[avatar_idx].transit;

        if near {
            if transit != (TransitState::Approaching { tube: tube_idx }) {
                let color = state.avatars[avatar_idx].color;
                state.avatars[avatar_idx].transit = TransitState::Approaching { tube: tube_idx };
                debug!(?color, tube = tube_idx, "avatar approaching tube");
                state.push_event(GameEvent::tube_proximity(state.frame, color, Some(tube_idx)));
            }
        } else if transit == (TransitState::Approaching { tube: tube_idx }) {
            let color = state.avatars[avatar_idx].color;
            state.avatars[avatar_idx].transit = TransitState::Free;
            state.push_event(GameEvent::tube_proximity(state.frame, color, None));
        }

        if distance < ENTRY_RADIUS && dy < ENTRY_HEIGHT {
            if decided {
                // Entry refused once the match has an outcome
                state.avatars[avatar_idx].reset_pose();
                return;
            }
            enter_tube(state, avatar_idx, tube_idx);
            return;
        }
    }
}

/// Commit an avatar to a tube: suppress its movement and visibility, and
/// schedule the slide task plus its decorative spark burst.
fn enter_tube(state: &mut SimState, avatar_idx: usize, tube_idx: usize) {
    let column = state.tubes[tube_idx].column;
    let color = state.avatars[avatar_idx].color;

    state.avatars[avatar_idx].transit = TransitState::InTransit { column };
    state.avatars[avatar_idx].visible = false;

    info!(?color, tube = tube_idx, column, "avatar entering tube");
    state.push_event(GameEvent::tube_entered(state.frame, color, column));

    state.scheduler.spawn(
        TaskKind::Slide { avatar: avatar_idx, tube: tube_idx },
        SLIDE_DURATION,
        state.epoch,
    );

    let sparks_id = state.scheduler.spawn(
        TaskKind::Sparks { tube: tube_idx },
        SLIDE_DURATION,
        state.epoch,
    );
    for _ in 0..SPARKS_PER_SLIDE {
        let t = state.rng.next_f32();
        let speed = state.rng.next_range(0.2, 0.5);
        let position = state.tubes[tube_idx].point(t);
        state.sparks.push(SlideSpark {
            owner: sparks_id,
            tube: tube_idx,
            t,
            speed,
            position,
            intensity: 1.0,
        });
    }
}

/// Complete a slide: apply the board move, emit events, and request the piece
/// drop animation. Called by the scheduler when the slide task reaches full
/// progress; the avatar is swept back to its spawn pose at the end of the
/// frame in every case.
pub(crate) fn complete_slide(
    avatar_idx: usize,
    tube_idx: usize,
    ctx: &mut TaskCtx<'_>,
) -> Vec<TaskSpawn> {
    let column = ctx.tubes[tube_idx].column;
    let color = ctx.avatars[avatar_idx].color;
    ctx.avatars[avatar_idx].transit = TransitState::PendingReset;

    // The other avatar may have decided the match while this slide was in
    // flight; transits that land afterwards place nothing.
    if ctx.board.status().is_decided() {
        return Vec::new();
    }

    match ctx.board.apply_move(column, color) {
        MoveOutcome::ColumnFull => {
            // Soft condition: behaves like a successful but inert transit
            warn!(?color, column, "column full; transit places nothing");
            Vec::new()
        }
        MoveOutcome::PlacedAt(row) => {
            let rest = arena::piece_world_position(row, column);
            let start_y = rest.y + DROP_HEIGHT;
            let piece = ctx.pieces.len();
            ctx.pieces.push(PlacedPiece {
                row,
                col: column,
                color,
                position: Vec3::new(rest.x, start_y, rest.z),
                spin: 0.0,
            });

            info!(?color, row, column, "piece placed");
            ctx.events
                .push(GameEvent::piece_placed(ctx.frame, row, column, color));

            let status = ctx.board.refresh_status();
            if status.is_decided() {
                info!(?status, "match ended");
                ctx.events.push(GameEvent::match_ended(ctx.frame, status));
            }

            vec![TaskSpawn {
                kind: TaskKind::Drop { piece, start_y, end_y: rest.y },
                duration: DROP_DURATION,
            }]
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
