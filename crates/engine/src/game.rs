//! Game state abstraction consumed by every engine.
//!
//! A [`Game`] is a stack of moves on top of an immutable starting
//! [`Board`]. Engines drive it exclusively through `make_move` and
//! `unmake_move`, and walk the legal moves of the current position through
//! an incremental cursor that survives speculative descents.

use std::fmt::{self, Debug, Display};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Score of a drawn position, from either point of view.
pub const DRAW_SCORE: i32 = 0;

/// One of the two players of a zero-sum game.
///
/// South moves first by convention and owns the positive side of the score
/// scale; all game-level scores are expressed from South's point of view.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    South,
    North,
}

impl Side {
    /// Numeric sign of this side: `+1` for South, `-1` for North.
    ///
    /// Multiplying a South-relative score by the sign of the side to move
    /// converts it into a mover-relative score, and back.
    #[inline(always)]
    pub fn sign(self) -> i32 {
        match self {
            Side::South => 1,
            Side::North => -1,
        }
    }

    /// The opponent of this side.
    #[inline(always)]
    pub fn flip(self) -> Side {
        match self {
            Side::South => Side::North,
            Side::North => Side::South,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::South => write!(f, "south"),
            Side::North => write!(f, "north"),
        }
    }
}

/// Immutable snapshot of a game position.
///
/// A board carries everything needed to reconstruct an equivalent game
/// through [`Game::set_board`], plus the codecs between moves and their
/// textual notations. Two boards are equal exactly when their canonical
/// diagram strings are equal.
pub trait Board: Clone + Eq + Display {
    /// Move representation shared with the owning game.
    type Move: Copy + Eq + Debug;

    /// Side to move on this board.
    fn turn(&self) -> Side;

    /// Canonical diagram of this board.
    fn to_diagram(&self) -> String;

    /// Parses a canonical diagram back into a board.
    fn from_diagram(diagram: &str) -> Result<Self, Error>;

    /// Coordinate notation of a single move on this board.
    fn to_coordinates(&self, mv: Self::Move) -> String;

    /// Coordinate notation of a move sequence played from this board.
    fn to_notation(&self, moves: &[Self::Move]) -> String;

    /// Parses a single move from its coordinate notation.
    fn to_move(&self, notation: &str) -> Result<Self::Move, Error>;

    /// Parses a move sequence from its notation.
    fn to_moves(&self, notation: &str) -> Result<Vec<Self::Move>, Error>;
}

/// Mutable game state machine.
///
/// # Contract
///
/// Implementations must guarantee that after `make_move(m)` followed by
/// `unmake_move()` the hash, the move cursor and all scoring results are
/// exactly what they were before the `make_move` call. The cursor keeps
/// yielding `None` once exhausted until the next make/unmake boundary, and
/// [`legal_moves`](Game::legal_moves) never perturbs it.
///
/// `make_move` is not required to validate legality; feeding it an illegal
/// move is a caller bug. Scores returned by [`score`](Game::score) and
/// [`outcome`](Game::outcome) are always from South's point of view:
/// `outcome` is `-infinity()`, [`DRAW_SCORE`] or `+infinity()`, while
/// `score` stays strictly inside the open interval.
pub trait Game {
    /// Move representation of this game.
    type Move: Copy + Eq + Debug;

    /// Board snapshot type of this game.
    type Board: Board<Move = Self::Move>;

    /// Number of moves performed on this game.
    fn length(&self) -> usize;

    /// Moves performed on this game, oldest first.
    fn moves(&self) -> &[Self::Move];

    /// Side to move.
    fn turn(&self) -> Side;

    /// Hash of the current position.
    ///
    /// Two states reachable from the same starting board with the same
    /// hash are treated as the same position by every engine.
    fn hash(&self) -> u64;

    /// Checks whether the match has ended on the current position.
    fn has_ended(&self) -> bool;

    /// Winner of an ended match, if any.
    fn winner(&self) -> Option<Side>;

    /// Heuristic evaluation of the current position, from South's point
    /// of view, strictly inside `(-infinity(), +infinity())`.
    fn score(&self) -> i32;

    /// Exact utility of an ended match from South's point of view:
    /// `-infinity()`, [`DRAW_SCORE`] or `+infinity()`.
    fn outcome(&self) -> i32;

    /// Score that engines should assign to a true draw.
    fn contempt(&self) -> i32;

    /// Absolute ceiling of the score scale.
    fn infinity(&self) -> i32;

    /// Checks whether a move is legal on the current position.
    fn is_legal(&self, mv: Self::Move) -> bool;

    /// Performs a move on the current position.
    ///
    /// Saves enough information to restore the move cursor when the move
    /// is taken back.
    fn make_move(&mut self, mv: Self::Move);

    /// Takes back the last performed move.
    ///
    /// # Panics
    ///
    /// Panics if no moves have been performed.
    fn unmake_move(&mut self);

    /// Takes back the last `n` performed moves.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n` moves have been performed.
    fn unmake_moves(&mut self, n: usize) {
        for _ in 0..n {
            self.unmake_move();
        }
    }

    /// Next legal move of the current position, or `None` when the
    /// iteration is exhausted.
    ///
    /// Implementations may stage the iteration internally; the only
    /// requirements are that every legal move is produced exactly once
    /// per boundary and that an exhausted cursor stays exhausted.
    fn next_move(&mut self) -> Option<Self::Move>;

    /// Snapshot of all the legal moves of the current position.
    ///
    /// Does not perturb the move cursor.
    fn legal_moves(&self) -> Vec<Self::Move>;

    /// Opaque cursor capturing the state of the move iteration.
    fn cursor(&self) -> usize;

    /// Restores a cursor previously obtained from [`cursor`](Game::cursor)
    /// on the same position.
    fn set_cursor(&mut self, cursor: usize);

    /// Grows the internal stacks to admit at least `n` more moves.
    ///
    /// Idempotent. Fails with [`Error::CapacityExceeded`] when `n` lies
    /// above the game's absolute maximum.
    fn ensure_capacity(&mut self, n: usize) -> Result<(), Error>;

    /// Resets this game to the position of the given board, discarding
    /// the move history.
    fn set_board(&mut self, board: &Self::Board) -> Result<(), Error>;

    /// Board this game started from.
    fn board(&self) -> Self::Board;

    /// Snapshot of the current position.
    fn to_board(&self) -> Self::Board;

    /// Signals that the match being played on this game has concluded.
    fn end_match(&mut self);

    /// Converts an engine score into centipawns for reporting purposes.
    fn to_centi_pawns(&self, score: i32) -> i32;
}
