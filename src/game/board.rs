//! Connect-Four Board
//!
//! The discrete half of the simulation: a 6x7 grid, move application, and
//! win/draw detection. The grid is only ever mutated through [`BoardState::apply_move`],
//! which always fills the lowest empty cell of a column - the "no floating
//! pieces" invariant is procedural, not validated after the fact.
//!
//! Row 0 is the TOP row, row 5 the BOTTOM row, matching the tube drop
//! direction.

use serde::{Deserialize, Serialize};

/// Number of board rows.
pub const ROWS: usize = 6;

/// Number of board columns (one tube per column).
pub const COLS: usize = 7;

/// One of the 42 board positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Cell {
    /// No piece
    #[default]
    Empty = 0,
    /// Red piece (avatar slot 0)
    Red = 1,
    /// Yellow piece (avatar slot 1)
    Yellow = 2,
}

/// A player's board-game color, distinct from their in-arena avatar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlayerColor {
    /// First player
    Red = 0,
    /// Second player
    Yellow = 1,
}

impl PlayerColor {
    /// The cell value this color places.
    #[inline]
    pub fn cell(self) -> Cell {
        match self {
            PlayerColor::Red => Cell::Red,
            PlayerColor::Yellow => Cell::Yellow,
        }
    }

    /// Avatar slot index (0 or 1).
    #[inline]
    pub fn slot(self) -> usize {
        self as usize
    }

    /// Color for an avatar slot index.
    pub fn from_slot(slot: usize) -> Option<PlayerColor> {
        match slot {
            0 => Some(PlayerColor::Red),
            1 => Some(PlayerColor::Yellow),
            _ => None,
        }
    }
}

/// Endpoints of a winning 4-cell window, as (row, col) pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinLine {
    /// First cell of the window in scan order
    pub start: (usize, usize),
    /// Last cell of the window in scan order
    pub end: (usize, usize),
}

/// Discrete outcome state of the board game.
///
/// Transitions are one-way until [`BoardState::reset`] returns the board to
/// `InProgress`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Match still accepting moves
    #[default]
    InProgress,
    /// Four in a row
    Won {
        /// Winning color
        color: PlayerColor,
        /// The winning window
        line: WinLine,
    },
    /// Top row full with no winning window
    Drawn,
}

impl MatchStatus {
    /// True once the match has a final outcome.
    #[inline]
    pub fn is_decided(self) -> bool {
        !matches!(self, MatchStatus::InProgress)
    }
}

/// Result of applying a move to a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Piece landed at this row
    PlacedAt(usize),
    /// Column already holds 6 pieces; board unchanged
    ColumnFull,
}

/// The Connect-Four grid and its match status.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoardState {
    cells: [[Cell; COLS]; ROWS],
    status: MatchStatus,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardState {
    /// Create an empty board.
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; COLS]; ROWS],
            status: MatchStatus::InProgress,
        }
    }

    /// Get a cell. Panics on out-of-range indices (programmer error).
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    /// Current match status.
    #[inline]
    pub fn status(&self) -> MatchStatus {
        self.status
    }

    /// Drop a piece into a column.
    ///
    /// Scans the column from the bottom row upward for the first empty cell.
    /// A full column is a soft condition: the board is left untouched and
    /// [`MoveOutcome::ColumnFull`] is returned.
    pub fn apply_move(&mut self, column: usize, color: PlayerColor) -> MoveOutcome {
        for row in (0..ROWS).rev() {
            if self.cells[row][column] == Cell::Empty {
                self.cells[row][column] = color.cell();
                return MoveOutcome::PlacedAt(row);
            }
        }
        MoveOutcome::ColumnFull
    }

    /// Scan the board for an outcome.
    ///
    /// Window order is fixed: horizontal, vertical, down-right diagonal,
    /// up-right diagonal; the first matching window wins ties. Pure - repeated
    /// calls without an intervening move return identical results.
    pub fn evaluate(&self) -> MatchStatus {
        // Horizontal
        for row in 0..ROWS {
            for col in 0..COLS - 3 {
                if let Some(status) =
                    self.check_window((row, col), (row, col + 1), (row, col + 2), (row, col + 3))
                {
                    return status;
                }
            }
        }

        // Vertical
        for row in 0..ROWS - 3 {
            for col in 0..COLS {
                if let Some(status) =
                    self.check_window((row, col), (row + 1, col), (row + 2, col), (row + 3, col))
                {
                    return status;
                }
            }
        }

        // Diagonal (down-right)
        for row in 0..ROWS - 3 {
            for col in 0..COLS - 3 {
                if let Some(status) = self.check_window(
                    (row, col),
                    (row + 1, col + 1),
                    (row + 2, col + 2),
                    (row + 3, col + 3),
                ) {
                    return status;
                }
            }
        }

        // Diagonal (up-right)
        for row in 3..ROWS {
            for col in 0..COLS - 3 {
                if let Some(status) = self.check_window(
                    (row, col),
                    (row - 1, col + 1),
                    (row - 2, col + 2),
                    (row - 3, col + 3),
                ) {
                    return status;
                }
            }
        }

        // Draw: the gravity invariant means a full top row is a full board
        if (0..COLS).all(|col| self.cells[0][col] != Cell::Empty) {
            return MatchStatus::Drawn;
        }

        MatchStatus::InProgress
    }

    /// Evaluate and store the status if the match just got decided.
    pub fn refresh_status(&mut self) -> MatchStatus {
        if !self.status.is_decided() {
            self.status = self.evaluate();
        }
        self.status
    }

    /// Clear the grid and return to `InProgress`.
    ///
    /// Callable at any time, including while slide animations are mid-flight;
    /// stale completions are fenced off by the reset epoch upstream.
    pub fn reset(&mut self) {
        self.cells = [[Cell::Empty; COLS]; ROWS];
        self.status = MatchStatus::InProgress;
    }

    /// Count of occupied cells, for summaries.
    pub fn piece_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&c| c != Cell::Empty)
            .count()
    }

    fn check_window(
        &self,
        a: (usize, usize),
        b: (usize, usize),
        c: (usize, usize),
        d: (usize, usize),
    ) -> Option<MatchStatus> {
        let first = self.cells[a.0][a.1];
        if first == Cell::Empty {
            return None;
        }
        if first == self.cells[b.0][b.1]
            && first == self.cells[c.0][c.1]
            && first == self.cells[d.0][d.1]
        {
            let color = match first {
                Cell::Red => PlayerColor::Red,
                Cell::Yellow => PlayerColor::Yellow,
                Cell::Empty => unreachable!(),
            };
            return Some(MatchStatus::Won {
                color,
                line: WinLine { start: a, end: d },
            });
        }
        None
    }
}

// =============================================================================
// TESTS
// =============================================================================
