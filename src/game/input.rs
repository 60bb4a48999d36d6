//! Movement Intents
//!
//! Discrete per-frame movement intents plus the externally supplied view
//! heading. Input-device binding lives outside the core; collaborators
//! translate keys/gamepads into [`IntentFrame`]s and feed one per avatar per
//! frame.
//!
//! Also provides delta-compressed intent recording with a tick-by-tick replay
//! iterator, which backs the determinism tests.

use serde::{Deserialize, Serialize};

/// One frame of movement intent for a single avatar.
///
/// Directions are relative to `view_yaw`, the avatar's camera heading around
/// +Y in radians (0 faces -Z).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentFrame {
    /// Packed direction/jump bits
    pub flags: u8,
    /// View heading around +Y, radians
    pub view_yaw: f32,
}

impl IntentFrame {
    /// Move toward the view heading
    pub const FLAG_FORWARD: u8 = 0x01;
    /// Move away from the view heading
    pub const FLAG_BACKWARD: u8 = 0x02;
    /// Strafe left
    pub const FLAG_LEFT: u8 = 0x04;
    /// Strafe right
    pub const FLAG_RIGHT: u8 = 0x08;
    /// Jump held
    pub const FLAG_JUMP: u8 = 0x10;

    /// Create an idle frame.
    pub const fn new() -> Self {
        Self { flags: 0, view_yaw: 0.0 }
    }

    /// Create a frame holding the given flag bits.
    pub const fn pressing(flags: u8) -> Self {
        Self { flags, view_yaw: 0.0 }
    }

    /// Same frame with a different view heading.
    pub const fn with_yaw(mut self, view_yaw: f32) -> Self {
        self.view_yaw = view_yaw;
        self
    }

    /// Forward intent active.
    #[inline]
    pub fn forward(&self) -> bool {
        self.flags & Self::FLAG_FORWARD != 0
    }

    /// Backward intent active.
    #[inline]
    pub fn backward(&self) -> bool {
        self.flags & Self::FLAG_BACKWARD != 0
    }

    /// Left strafe intent active.
    #[inline]
    pub fn left(&self) -> bool {
        self.flags & Self::FLAG_LEFT != 0
    }

    /// Right strafe intent active.
    #[inline]
    pub fn right(&self) -> bool {
        self.flags & Self::FLAG_RIGHT != 0
    }

    /// Jump intent held.
    #[inline]
    pub fn jump(&self) -> bool {
        self.flags & Self::FLAG_JUMP != 0
    }

    /// No flags set.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.flags == 0
    }

    /// Any direction flag set.
    #[inline]
    pub fn has_movement(&self) -> bool {
        self.flags
            & (Self::FLAG_FORWARD | Self::FLAG_BACKWARD | Self::FLAG_LEFT | Self::FLAG_RIGHT)
            != 0
    }

    /// Set or clear a flag.
    #[inline]
    pub fn set_flag(&mut self, flag: u8, active: bool) {
        if active {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }
}

/// A change of intent at a given frame index.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct IntentDelta {
    /// Frame index when this intent state began
    pub frame: u32,
    /// The new intent state
    pub intent: IntentFrame,
}

/// Delta-compressed intent stream for one avatar.
///
/// Only stores frames where the intent changed, which keeps long recordings
/// small while allowing exact tick-by-tick replay.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IntentRecording {
    /// First recorded frame index
    pub start_frame: u32,
    /// Last recorded frame index
    pub end_frame: u32,

    deltas: Vec<IntentDelta>,

    #[serde(skip)]
    last: IntentFrame,
}

impl IntentRecording {
    /// Create an empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the intent for a frame. Only stores a delta when it changed.
    pub fn record(&mut self, frame: u32, intent: IntentFrame) {
        self.end_frame = frame;
        if intent != self.last || self.deltas.is_empty() {
            self.deltas.push(IntentDelta { frame, intent });
            self.last = intent;
        }
    }

    /// Intent in effect at a frame index (binary search over deltas).
    pub fn intent_at(&self, frame: u32) -> IntentFrame {
        let idx = self.deltas.partition_point(|d| d.frame <= frame);
        if idx == 0 {
            IntentFrame::new()
        } else {
            self.deltas[idx - 1].intent
        }
    }

    /// Number of stored deltas.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Iterate the effective intent of every frame from start to end.
    pub fn replay_iter(&self) -> ReplayIter<'_> {
        ReplayIter {
            recording: self,
            current: self.start_frame,
            delta_idx: 0,
            intent: IntentFrame::new(),
        }
    }
}

/// Tick-by-tick replay over an [`IntentRecording`].
pub struct ReplayIter<'a> {
    recording: &'a IntentRecording,
    current: u32,
    delta_idx: usize,
    intent: IntentFrame,
}

impl Iterator for ReplayIter<'_> {
    type Item = (u32, IntentFrame);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current > self.recording.end_frame {
            return None;
        }

        while self.delta_idx < self.recording.deltas.len() {
            let delta = &self.recording.deltas[self.delta_idx];
            if delta.frame <= self.current {
                self.intent = delta.intent;
                self.delta_idx += 1;
            } else {
                break;
            }
        }

        let item = (self.current, self.intent);
        self.current += 1;
        Some(item)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let mut intent = IntentFrame::new();
        assert!(intent.is_idle());

        intent.set_flag(IntentFrame::FLAG_FORWARD, true);
        intent.set_flag(IntentFrame::FLAG_LEFT, true);
        assert!(intent.forward() && intent.left());
        assert!(!intent.backward() && !intent.right());
        assert!(intent.has_movement());

        intent.set_flag(IntentFrame::FLAG_FORWARD, false);
        assert!(!intent.forward());

        let jump_only = IntentFrame::pressing(IntentFrame::FLAG_JUMP);
        assert!(jump_only.jump());
        assert!(!jump_only.has_movement());
    }

    #[test]
    fn test_recording_compresses_unchanged_intents() {
        let mut recording = IntentRecording::new();
        let held = IntentFrame::pressing(IntentFrame::FLAG_FORWARD);

        for frame in 0..100 {
            recording.record(frame, held);
        }
        assert_eq!(recording.delta_count(), 1);

        recording.record(100, IntentFrame::new());
        assert_eq!(recording.delta_count(), 2);
    }

    #[test]
    fn test_intent_at() {
        let mut recording = IntentRecording::new();
        let a = IntentFrame::pressing(IntentFrame::FLAG_FORWARD);
        let b = IntentFrame::pressing(IntentFrame::FLAG_RIGHT);

        recording.record(10, a);
        recording.record(20, b);

        assert!(recording.intent_at(5).is_idle());
        assert_eq!(recording.intent_at(10), a);
        assert_eq!(recording.intent_at(15), a);
        assert_eq!(recording.intent_at(20), b);
        assert_eq!(recording.intent_at(999), b);
    }

    #[test]
    fn test_replay_iter_covers_every_frame() {
        let mut recording = IntentRecording::new();
        recording.record(0, IntentFrame::pressing(IntentFrame::FLAG_FORWARD));
        recording.record(3, IntentFrame::pressing(IntentFrame::FLAG_BACKWARD));
        recording.end_frame = 5;

        let frames: Vec<_> = recording.replay_iter().collect();
        assert_eq!(frames.len(), 6);
        assert!(frames[..3].iter().all(|(_, i)| i.forward()));
        assert!(frames[3..].iter().all(|(_, i)| i.backward()));
    }

    #[test]
    fn test_yaw_changes_count_as_deltas() {
        let mut recording = IntentRecording::new();
        let held = IntentFrame::pressing(IntentFrame::FLAG_FORWARD);
        recording.record(0, held.with_yaw(0.0));
        recording.record(1, held.with_yaw(0.1));
        assert_eq!(recording.delta_count(), 2);
    }
}
