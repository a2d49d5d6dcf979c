//! MTD(f) search, a zero-window refinement on top of negamax.
//!
//! Instead of searching each depth with a full window, the engine probes
//! it repeatedly with null windows `[g - 1, g]`, using the failures to
//! narrow a `lower..upper` bracket around the true minimax value until
//! the bounds meet. The transposition cache absorbs most of the repeated
//! work, and the converged value of one depth seeds the first guess of
//! the next.

use crate::cache::{Cache, Flag};
use crate::engine::{Engine, ReportConsumer};
use crate::game::{Game, DRAW_SCORE};
use crate::leaves::Leaves;
use crate::negamax::{Negamax, MIN_DEPTH};
use crate::timer::Timer;

/// Plies added between consecutive iterations.
const DEPTH_STEP: u8 = 2;

/// Zero-window iterative-deepening engine.
pub struct Mtdf<G: Game> {
    inner: Negamax<G>,
}

impl<G: Game> Mtdf<G> {
    /// Creates an engine with a default-sized transposition table and no
    /// endgame database.
    pub fn new() -> Self
    where
        G::Move: 'static,
    {
        Self { inner: Negamax::new() }
    }

    /// Replaces the transposition cache.
    pub fn set_cache(&mut self, cache: Box<dyn Cache<G>>) {
        self.inner.set_cache(cache);
    }

    /// Replaces the endgame oracle.
    pub fn set_leaves(&mut self, leaves: Box<dyn Leaves<G>>) {
        self.inner.set_leaves(leaves);
    }

    /// Nodes visited by the last search.
    pub fn nodes(&self) -> u64 {
        self.inner.nodes()
    }

    /// Converges on the minimax value of the current depth with null
    /// window probes seeded by `guess`.
    ///
    /// Returns the best root move index and the converged score, or
    /// `None` when the search was aborted mid-probe.
    fn converge(
        &mut self,
        game: &mut G,
        moves: &[G::Move],
        depth: u8,
        guess: i32,
    ) -> Option<(usize, i32)> {
        let max_score = self.inner.max_score;
        let mut g = guess.clamp(-max_score, max_score);
        let mut lower = -max_score;
        let mut upper = max_score;
        let mut best_index = 0;

        while lower < upper {
            let beta = if g == lower { g + 1 } else { g };

            let (index, score) = self.inner.search_root(game, moves, depth, beta - 1, beta)?;
            g = score;

            // Clamping keeps the bracket shrinking even when cached
            // bounds make consecutive probes disagree.
            if score < beta {
                upper = upper.min(score);
            } else {
                lower = lower.max(score);
                // Only fail-highs identify a best move; fail-lows bound
                // every root move from above.
                best_index = index;
            }
        }

        Some((best_index, g))
    }
}

impl<G: Game> Default for Mtdf<G>
where
    G::Move: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Game> Engine<G> for Mtdf<G> {
    fn set_contempt(&mut self, contempt: i32) {
        self.inner.set_contempt(contempt);
    }

    fn set_infinity(&mut self, infinity: i32) {
        self.inner.set_infinity(infinity);
    }

    fn set_move_time(&mut self, millis: u64) {
        self.inner.set_move_time(millis);
    }

    fn set_depth(&mut self, depth: u8) {
        self.inner.set_depth(depth);
    }

    fn new_match(&mut self) {
        self.inner.new_match();
    }

    fn compute_best_move(&mut self, game: &mut G) -> Option<G::Move> {
        if game.has_ended() {
            return None;
        }

        self.inner.configure(game);
        self.inner.timer.schedule_count_down(self.inner.move_time);
        self.inner.cache.discharge();
        self.inner.nodes = 0;

        let mut moves = self.inner.prepare_root_moves(game);
        if moves.is_empty() {
            self.inner.timer.cancel_count_down();
            return None;
        }

        let max_score = self.inner.max_score;
        let mut best_score = game.score() * game.turn().sign();
        let mut depth = MIN_DEPTH.min(self.inner.max_depth);

        loop {
            self.inner.abortable = depth > MIN_DEPTH;

            match self.converge(game, &moves, depth, best_score) {
                Some((index, score)) => {
                    moves[..=index].rotate_right(1);
                    best_score = score;
                    self.inner.last_depth = depth;
                    self.inner.cache.store(game, score, Some(moves[0]), depth, Flag::Exact);
                    self.inner.emit_report(game, depth, score);
                    if score.abs() >= max_score {
                        break;
                    }
                }
                None => break,
            }

            if depth >= self.inner.max_depth || self.inner.timer.aborted() {
                break;
            }
            depth = depth.saturating_add(DEPTH_STEP).min(self.inner.max_depth);
        }

        self.inner.last_score = best_score * game.turn().sign();
        self.inner.timer.cancel_count_down();

        Some(moves[0])
    }

    fn compute_best_score(&mut self, game: &mut G) -> i32 {
        if game.has_ended() {
            self.inner.configure(game);
            let outcome = game.outcome();
            return if outcome == DRAW_SCORE { self.inner.draw_score } else { outcome };
        }
        self.compute_best_move(game);
        self.inner.last_score
    }

    fn ponder_move(&mut self, game: &mut G) -> Option<G::Move> {
        self.inner.ponder_move(game)
    }

    fn timer(&self) -> Timer {
        self.inner.timer()
    }

    fn attach(&mut self, consumer: ReportConsumer<G::Move>) {
        self.inner.attach(consumer);
    }
}
