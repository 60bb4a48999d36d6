//! Frame Orchestration
//!
//! One external tick runs, in order: avatar integration, collision
//! resolution between avatars, tube proximity/entry checks, the animation
//! scheduler (where board mutations happen), and finally the render-state
//! hand-off: pending-reset avatars are swept back to spawn and the frame's
//! events are collected.

use crate::game::agent;
use crate::game::board::MatchStatus;
use crate::game::collision::resolve_avatar_separation;
use crate::game::events::GameEvent;
use crate::game::input::{IntentFrame, IntentRecording};
use crate::game::state::{SimState, TransitState, AVATAR_RADIUS};
use crate::game::tube;

/// Result of one simulation frame.
#[derive(Debug, Default)]
pub struct FrameResult {
    /// Events generated this frame, in emission order
    pub events: Vec<GameEvent>,
    /// Match status after the frame
    pub status: MatchStatus,
}

/// Run one simulation frame.
///
/// `intents` holds one frame of input per avatar, slot order Red then Yellow.
/// `dt` is the frame's delta time in seconds.
pub fn frame(state: &mut SimState, intents: &[IntentFrame; 2], dt: f32) -> FrameResult {
    state.frame += 1;

    // 1. Integrate both avatars, slot order
    for idx in 0..state.avatars.len() {
        agent::integrate(
            &mut state.avatars[idx],
            &intents[idx],
            &state.world,
            state.stabilized,
            dt,
        );
    }

    // 2. Avatar-avatar separation (skipped while either rides a tube)
    let suspended = state
        .avatars
        .iter()
        .any(|a| a.transit.suspends_movement());
    if !suspended {
        let [a, b] = &mut state.avatars;
        if let Some((da, db)) = resolve_avatar_separation(a.position, b.position, AVATAR_RADIUS) {
            a.position += da;
            b.position += db;
        }
    }

    // 3. Tube proximity/entry, slot order
    for idx in 0..state.avatars.len() {
        tube::check_transit(state, idx);
    }

    // 4. Advance animations; slide completions mutate the board here
    state.advance_animations(dt);

    // 5. Sweep avatars whose transit finished back to their spawn pose
    for avatar in &mut state.avatars {
        if avatar.transit == TransitState::PendingReset {
            avatar.reset_pose();
        }
    }

    FrameResult {
        events: state.take_events(),
        status: state.board.status(),
    }
}

/// Replay recorded intent streams frame by frame.
///
/// Returns every event produced. Given the same starting state and
/// recordings, the replay is bit-identical to the original run.
pub fn replay_frames(
    state: &mut SimState,
    recordings: &[IntentRecording; 2],
    frames: u32,
    dt: f32,
) -> Vec<GameEvent> {
    let mut all_events = Vec::new();
    for t in 0..frames {
        let intents = [recordings[0].intent_at(t), recordings[1].intent_at(t)];
        let result = frame(state, &intents, dt);
        all_events.extend(result.events);
    }
    all_events
}

// =============================================================================
// TESTS
// =============================================================================
