//! Engine surface exposed to protocol layers.
//!
//! Every search engine implements [`Engine`]: the setters configure the
//! score scale and the search budget, `compute_best_move` runs a search
//! on a caller-owned game and returns the chosen move, and attached
//! consumers receive periodic [`Report`]s while the search runs.
//!
//! Engine entry points are exclusive; the only concurrent interaction
//! with a running search is its cloneable [`Timer`] handle, which is how
//! callers retarget or abort the countdown from another thread.

use serde::{Deserialize, Serialize};

use crate::game::Game;
use crate::timer::Timer;

/// Default time budget per move, in milliseconds.
pub const DEFAULT_MOVE_TIME: u64 = 2_000;

/// Snapshot of a running search.
///
/// Scores are from South's point of view, in engine units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report<M> {
    /// Best move found so far, if any
    pub best_move: Option<M>,
    /// Score of the best move, from South's point of view
    pub score: i32,
    /// Depth the search completed, in plies
    pub depth: u8,
    /// Nodes visited since the search started
    pub nodes: u64,
    /// Expected continuation, best move first
    pub pv: Vec<M>,
}

/// Callback receiving search reports.
pub type ReportConsumer<M> = Box<dyn FnMut(&Report<M>) + Send>;

/// A search engine for a concrete game type.
pub trait Engine<G: Game> {
    /// Sets the score assigned to a true draw.
    fn set_contempt(&mut self, contempt: i32);

    /// Sets the score ceiling used by the search.
    fn set_infinity(&mut self, infinity: i32);

    /// Sets the time budget per move, in milliseconds.
    fn set_move_time(&mut self, millis: u64);

    /// Sets the maximum search depth, in plies.
    fn set_depth(&mut self, depth: u8);

    /// Forgets everything learned from the current match.
    fn new_match(&mut self);

    /// Computes the best move for the game's current position.
    ///
    /// The game is returned in the state it was received. `None` means
    /// the position has no legal moves.
    fn compute_best_move(&mut self, game: &mut G) -> Option<G::Move>;

    /// Computes the expected score of the game's current position, from
    /// South's point of view.
    fn compute_best_score(&mut self, game: &mut G) -> i32;

    /// Move the engine expects to be played on the current position,
    /// usually recalled from a previous search.
    fn ponder_move(&mut self, game: &mut G) -> Option<G::Move>;

    /// Countdown handle of this engine.
    ///
    /// The handle is shared with the running search; cloning it lets
    /// another thread retarget or cancel the current computation.
    fn timer(&self) -> Timer;

    /// Asks the current computation to finish within `millis`
    /// milliseconds, returning the best move found so far.
    fn abort_computation(&mut self, millis: u64) {
        self.timer().abort_computation(millis);
    }

    /// Attaches a consumer that will receive search reports.
    fn attach(&mut self, consumer: ReportConsumer<G::Move>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serialization() {
        let report = Report::<u8> {
            best_move: Some(4),
            score: -120,
            depth: 7,
            nodes: 90_210,
            pv: vec![4, 2, 8],
        };

        let json = serde_json::to_string(&report).unwrap();
        let back: Report<u8> = serde_json::from_str(&json).unwrap();

        assert_eq!(back.best_move, Some(4));
        assert_eq!(back.score, -120);
        assert_eq!(back.depth, 7);
        assert_eq!(back.nodes, 90_210);
        assert_eq!(back.pv, vec![4, 2, 8]);
    }
}
