//! Animation Scheduler
//!
//! Cooperative, frame-driven tasks: easing-driven, time-bounded units of work
//! that bridge the continuous world to discrete board mutations. "Waiting" is
//! always modeled as task progress across frames, never as a blocking wait.
//!
//! Ordering contract: tasks advance - and therefore complete - in insertion
//! order. Tasks spawned while a tick is running join the active set when the
//! tick ends, so they first advance on the following tick. Removing a
//! finished task never skips a still-active sibling.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::core::rng::DeterministicRng;
use crate::game::board::BoardState;
use crate::game::events::GameEvent;
use crate::game::state::{AvatarState, PlacedPiece, SlideSpark};
use crate::game::tube::{self, TubePath};

/// Handle to a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u32);

/// What a task animates. Per-kind state is explicit; there are no hidden
/// closures coupling animation to other layers.
#[derive(Clone, Debug)]
pub enum TaskKind {
    /// Pure delay with no side effects.
    Wait,

    /// An avatar sliding down a tube; completion applies the board move.
    Slide {
        /// Avatar slot index
        avatar: usize,
        /// Tube index (equals the target column)
        tube: usize,
    },

    /// A placed piece falling into its cell with a bounce.
    Drop {
        /// Index into the piece render records
        piece: usize,
        /// Vertical start of the fall
        start_y: f32,
        /// Final resting height
        end_y: f32,
    },

    /// Decorative particles riding a tube path, fading out.
    Sparks {
        /// Tube whose path the particles ride
        tube: usize,
    },
}

/// A scheduled animation task.
#[derive(Clone, Debug)]
pub struct Task {
    /// Handle for this task
    pub id: TaskId,
    /// What it animates
    pub kind: TaskKind,
    /// Scheduler clock value when it started
    pub started_at: f32,
    /// Duration in seconds
    pub duration: f32,
    /// Reset epoch captured at creation; stale tasks are discarded
    pub epoch: u32,
}

/// A follow-up task requested by a completing task.
#[derive(Clone, Debug)]
pub struct TaskSpawn {
    /// What to animate
    pub kind: TaskKind,
    /// Duration in seconds
    pub duration: f32,
}

/// Failure raised by a task's advance step. Isolated per task: logged, the
/// task discarded, siblings unaffected.
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    /// A slide or sparks task referenced a tube that does not exist.
    #[error("task references missing tube {0}")]
    MissingTube(usize),
    /// A drop task referenced a piece record that does not exist.
    #[error("task references missing piece {0}")]
    MissingPiece(usize),
    /// A slide task referenced an avatar slot that does not exist.
    #[error("task references missing avatar slot {0}")]
    MissingAvatar(usize),
}

/// The mutable simulation context lent to tasks for one tick.
pub struct TaskCtx<'a> {
    /// The board (single writer: the slide completion step)
    pub board: &'a mut BoardState,
    /// Both avatars
    pub avatars: &'a mut [AvatarState; 2],
    /// Tube paths
    pub tubes: &'a [TubePath],
    /// Piece render records
    pub pieces: &'a mut Vec<PlacedPiece>,
    /// Decorative particles
    pub sparks: &'a mut Vec<SlideSpark>,
    /// PRNG for decorative state
    pub rng: &'a mut DeterministicRng,
    /// Event sink
    pub events: &'a mut Vec<GameEvent>,
    /// Live reset epoch
    pub epoch: u32,
    /// Current frame number (for events)
    pub frame: u32,
}

enum Advance {
    Running,
    Done(Vec<TaskSpawn>),
}

/// Frame-driven scheduler over an insertion-ordered task set.
#[derive(Debug, Default)]
pub struct AnimationScheduler {
    now: f32,
    tasks: Vec<Task>,
    queued: Vec<Task>,
    next_id: u32,
}

impl AnimationScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler clock in seconds (sum of ticked `dt`).
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Number of active tasks (not counting ones queued mid-tick).
    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    /// Whether a task is still active or queued.
    pub fn has_task(&self, id: TaskId) -> bool {
        self.tasks.iter().chain(&self.queued).any(|t| t.id == id)
    }

    /// Schedule a task. Called between ticks (e.g. on tube entry); the task
    /// is active immediately and first advances on the next tick.
    pub fn spawn(&mut self, kind: TaskKind, duration: f32, epoch: u32) -> TaskId {
        let id = self.alloc_id();
        self.tasks.push(Task {
            id,
            kind,
            started_at: self.now,
            duration,
            epoch,
        });
        id
    }

    /// Drop every active and queued task.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.queued.clear();
    }

    /// Advance all active tasks by `dt`.
    ///
    /// Tasks advance in insertion order; a completed or failed task is
    /// removed in place without skipping the next one. Follow-up tasks
    /// requested by completions are appended after the loop.
    pub fn tick(&mut self, dt: f32, ctx: &mut TaskCtx<'_>) {
        self.now += dt;

        let mut i = 0;
        while i < self.tasks.len() {
            // Stale task from before a reset: silently discard
            if self.tasks[i].epoch != ctx.epoch {
                self.tasks.remove(i);
                continue;
            }

            let elapsed = self.now - self.tasks[i].started_at;
            let progress = if self.tasks[i].duration > 0.0 {
                (elapsed / self.tasks[i].duration).min(1.0)
            } else {
                1.0
            };

            let outcome = {
                let task = &self.tasks[i];
                advance_task(task, progress, ctx)
            };

            match outcome {
                Ok(Advance::Running) => i += 1,
                Ok(Advance::Done(followups)) => {
                    let epoch = self.tasks[i].epoch;
                    self.tasks.remove(i);
                    for spawn in followups {
                        let id = self.alloc_id();
                        self.queued.push(Task {
                            id,
                            kind: spawn.kind,
                            started_at: self.now,
                            duration: spawn.duration,
                            epoch,
                        });
                    }
                }
                Err(error) => {
                    warn!(task = ?self.tasks[i].id, %error, "animation task failed; discarding");
                    self.tasks.remove(i);
                }
            }
        }

        // Tasks queued during this tick become active for the next one
        self.tasks.append(&mut self.queued);
    }

    fn alloc_id(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }
}

/// Advance a single task to `progress` in [0, 1]. Returns `Done` exactly when
/// progress reached 1.
fn advance_task(task: &Task, progress: f32, ctx: &mut TaskCtx<'_>) -> Result<Advance, TaskError> {
    match task.kind {
        TaskKind::Wait => {
            if progress >= 1.0 {
                Ok(Advance::Done(Vec::new()))
            } else {
                Ok(Advance::Running)
            }
        }

        TaskKind::Slide { avatar, tube } => {
            let path = ctx.tubes.get(tube).ok_or(TaskError::MissingTube(tube))?;
            if avatar >= ctx.avatars.len() {
                return Err(TaskError::MissingAvatar(avatar));
            }

            // Accelerate as the avatar slides down
            let eased = ease_slide(progress);
            ctx.avatars[avatar].position = path.point(eased);

            if progress >= 1.0 {
                let followups = tube::complete_slide(avatar, tube, ctx);
                Ok(Advance::Done(followups))
            } else {
                Ok(Advance::Running)
            }
        }

        TaskKind::Drop { piece, start_y, end_y } => {
            let record = ctx
                .pieces
                .get_mut(piece)
                .ok_or(TaskError::MissingPiece(piece))?;
            let eased = ease_out_bounce(progress);
            record.position.y = start_y + (end_y - start_y) * eased;
            record.spin = progress * 4.0 * PI;

            if progress >= 1.0 {
                record.position.y = end_y;
                Ok(Advance::Done(Vec::new()))
            } else {
                Ok(Advance::Running)
            }
        }

        TaskKind::Sparks { tube } => {
            let path = ctx.tubes.get(tube).ok_or(TaskError::MissingTube(tube))?;
            if progress >= 1.0 {
                ctx.sparks.retain(|s| s.owner != task.id);
                return Ok(Advance::Done(Vec::new()));
            }
            for spark in ctx.sparks.iter_mut().filter(|s| s.owner == task.id) {
                spark.t += spark.speed * 0.01;
                if spark.t > 1.0 {
                    spark.t = 0.0;
                }
                spark.position = path.point(spark.t);
                spark.intensity = 1.0 - progress;
            }
            Ok(Advance::Running)
        }
    }
}

// =============================================================================
// EASING
// =============================================================================

/// Cubic bounce ease-out, used for the piece drop.
///
/// Pure function of normalized progress in [0, 1].
pub fn ease_out_bounce(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

/// Slide acceleration curve: `t^1.5`.
///
/// Pure function of normalized progress in [0, 1].
pub fn ease_slide(t: f32) -> f32 {
    t.powf(1.5)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::arena;
    use crate::game::board::PlayerColor;
    use crate::game::state::SimState;

    fn test_state() -> SimState {
        SimState::new(
            arena::standard_world().expect("builtin geometry is valid"),
            arena::standard_tubes(),
            7,
        )
    }

    /// Run one scheduler tick against a full SimState.
    fn tick(state: &mut SimState, dt: f32) {
        state.advance_animations(dt);
    }

    #[test]
    fn test_wait_task_lifecycle() {
        let mut state = test_state();
        let id = state.scheduler.spawn(TaskKind::Wait, 1.0, state.epoch);

        // Present for every tick with elapsed < duration (dt chosen so the
        // clock sums exactly in binary floating point)
        for _ in 0..7 {
            tick(&mut state, 0.125);
            assert!(state.scheduler.has_task(id));
        }
        // Gone on the first tick where elapsed >= duration
        tick(&mut state, 0.125);
        assert!(!state.scheduler.has_task(id));
    }

    #[test]
    fn test_mid_tick_removal_does_not_skip_sibling() {
        let mut state = test_state();
        // First task completes this tick; second must still advance
        let short = state.scheduler.spawn(TaskKind::Wait, 0.05, state.epoch);
        let long = state.scheduler.spawn(TaskKind::Wait, 10.0, state.epoch);

        tick(&mut state, 0.1);
        assert!(!state.scheduler.has_task(short));
        assert!(state.scheduler.has_task(long));
        assert_eq!(state.scheduler.active_count(), 1);
    }

    #[test]
    fn test_zero_duration_task_completes_on_first_tick() {
        let mut state = test_state();
        let id = state.scheduler.spawn(TaskKind::Wait, 0.0, state.epoch);
        tick(&mut state, 0.001);
        assert!(!state.scheduler.has_task(id));
    }

    #[test]
    fn test_failed_task_is_isolated() {
        let mut state = test_state();
        // Drop task pointing at a piece record that does not exist
        let bad = state.scheduler.spawn(
            TaskKind::Drop { piece: 99, start_y: 10.0, end_y: 0.0 },
            1.0,
            state.epoch,
        );
        let good = state.scheduler.spawn(TaskKind::Wait, 1.0, state.epoch);

        tick(&mut state, 0.1);
        assert!(!state.scheduler.has_task(bad));
        assert!(state.scheduler.has_task(good));
    }

    #[test]
    fn test_stale_epoch_task_discarded_without_effect() {
        let mut state = test_state();
        let old_epoch = state.epoch;
        state.epoch += 1; // simulate a reset having happened after spawn
        let stale = state.scheduler.spawn(
            TaskKind::Slide { avatar: 0, tube: 0 },
            1.5,
            old_epoch,
        );
        let pos_before = state.avatars[0].position;

        tick(&mut state, 2.0);
        assert!(!state.scheduler.has_task(stale));
        assert_eq!(state.avatars[0].position, pos_before);
        assert_eq!(state.board.piece_count(), 0);
    }

    #[test]
    fn test_drop_task_settles_piece_exactly() {
        let mut state = test_state();
        state.pieces.push(crate::game::state::PlacedPiece {
            row: 5,
            col: 0,
            color: PlayerColor::Red,
            position: crate::core::vec3::Vec3::new(-12.0, 20.0, -5.0),
            spin: 0.0,
        });
        state.scheduler.spawn(
            TaskKind::Drop { piece: 0, start_y: 20.0, end_y: 10.0 },
            1.0,
            state.epoch,
        );

        for _ in 0..30 {
            tick(&mut state, 0.05);
        }
        assert_eq!(state.pieces[0].position.y, 10.0);
        assert!(state.pieces[0].spin > 0.0);
        assert_eq!(state.scheduler.active_count(), 0);
    }

    #[test]
    fn test_same_tick_completions_apply_in_insertion_order() {
        // Two slides entering on consecutive spawns but completing within the
        // same tick must mutate the board in insertion order: Red (spawned
        // first) takes the lower row of the shared column.
        let mut state = test_state();
        state.avatars[0].transit = crate::game::state::TransitState::InTransit { column: 3 };
        state.avatars[1].transit = crate::game::state::TransitState::InTransit { column: 3 };
        state
            .scheduler
            .spawn(TaskKind::Slide { avatar: 0, tube: 3 }, 1.5, state.epoch);
        state
            .scheduler
            .spawn(TaskKind::Slide { avatar: 1, tube: 3 }, 1.5, state.epoch);

        // One huge tick completes both slides together
        tick(&mut state, 5.0);

        use crate::game::board::Cell;
        assert_eq!(state.board.cell(5, 3), Cell::Red);
        assert_eq!(state.board.cell(4, 3), Cell::Yellow);
    }

    #[test]
    fn test_easing_endpoints() {
        assert_eq!(ease_slide(0.0), 0.0);
        assert!((ease_slide(1.0) - 1.0).abs() < 1e-6);
        assert!(ease_slide(0.5) < 0.5, "slide easing starts slow");

        assert_eq!(ease_out_bounce(0.0), 0.0);
        assert!((ease_out_bounce(1.0) - 1.0).abs() < 1e-6);
        // The bounce overshoots nothing: stays within [0, 1]
        for i in 0..=100 {
            let t = i as f32 / 100.0;
            let v = ease_out_bounce(t);
            assert!((0.0..=1.0 + 1e-6).contains(&v), "bounce({t}) = {v}");
        }
    }

    #[test]
    fn test_clear_drops_queued_tasks_too() {
        let mut state = test_state();
        state.scheduler.spawn(TaskKind::Wait, 1.0, state.epoch);
        state.scheduler.clear();
        assert_eq!(state.scheduler.active_count(), 0);
        tick(&mut state, 1.0);
        assert_eq!(state.scheduler.active_count(), 0);
    }
}
