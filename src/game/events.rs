//! Game Events
//!
//! Events handed synchronously to collaborators (2D board view, minimap,
//! banners) at the end of each frame. The core has no dependency on who
//! consumes them.

use serde::{Deserialize, Serialize};

use crate::game::board::{MatchStatus, PlayerColor};

/// An event produced during a simulation frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// An avatar's nearest-tube tracking changed (`None` = moved away).
    TubeProximity {
        /// Frame the change happened on
        frame: u32,
        /// Which avatar
        color: PlayerColor,
        /// Tube now being approached, if any
        tube: Option<usize>,
    },

    /// An avatar committed to a tube and started sliding.
    TubeEntered {
        /// Frame the slide started on
        frame: u32,
        /// Which avatar
        color: PlayerColor,
        /// Board column the tube feeds
        column: usize,
    },

    /// A piece landed on the board.
    PiecePlaced {
        /// Frame of the board mutation
        frame: u32,
        /// Board row (0 = top)
        row: usize,
        /// Board column
        col: usize,
        /// Piece color
        color: PlayerColor,
    },

    /// The match reached a final outcome.
    MatchEnded {
        /// Frame the outcome was detected on
        frame: u32,
        /// The final status (`Won` or `Drawn`)
        status: MatchStatus,
    },

    /// A global reset cleared the board, animations, and avatar poses.
    Reset {
        /// Frame the reset happened on
        frame: u32,
    },
}

impl GameEvent {
    /// Create a tube proximity change event.
    pub fn tube_proximity(frame: u32, color: PlayerColor, tube: Option<usize>) -> Self {
        Self::TubeProximity { frame, color, tube }
    }

    /// Create a tube entered event.
    pub fn tube_entered(frame: u32, color: PlayerColor, column: usize) -> Self {
        Self::TubeEntered { frame, color, column }
    }

    /// Create a piece placed event.
    pub fn piece_placed(frame: u32, row: usize, col: usize, color: PlayerColor) -> Self {
        Self::PiecePlaced { frame, row, col, color }
    }

    /// Create a match ended event.
    pub fn match_ended(frame: u32, status: MatchStatus) -> Self {
        Self::MatchEnded { frame, status }
    }

    /// Create a reset event.
    pub fn reset(frame: u32) -> Self {
        Self::Reset { frame }
    }
}
