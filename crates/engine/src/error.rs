//! Crate-wide error type.

use thiserror::Error;

/// Errors surfaced by games, boards, engines and the node store.
///
/// Lookup misses in the transposition cache or the endgame oracle are not
/// errors; neither is a cooperative time abort, which is reported through
/// the best-move-so-far return path instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A board diagram could not be parsed into a valid position.
    #[error("invalid position: {0}")]
    InvalidPosition(String),

    /// A move in coordinate or match notation could not be parsed.
    #[error("invalid move notation: {0}")]
    InvalidMove(String),

    /// A capacity request exceeded the game's hard limit.
    #[error("capacity exceeded: requested {requested}, limit {limit}")]
    CapacityExceeded { requested: usize, limit: usize },

    /// The persisted training root does not match the supplied game.
    #[error("persisted root does not match the supplied game")]
    StateMismatch,

    /// The node store failed to read, write or decode a record.
    #[error("store failure: {0}")]
    Store(String),
}
