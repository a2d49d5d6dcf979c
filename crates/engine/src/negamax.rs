//! Iterative-deepening negamax search with alpha-beta pruning.
//!
//! The engine deepens two plies at a time starting from [`MIN_DEPTH`],
//! reusing each iteration's transposition entries to order the next one.
//! Before recursing on a position it probes the endgame oracle and the
//! cache, tries the remembered hash move first, and walks the rest of the
//! moves through the game's incremental cursor.
//!
//! Aborts are cooperative: the recursion polls the countdown timer and
//! unwinds returning `None`, and the driver falls back on the last
//! completed iteration. The first iteration always runs to completion so
//! a move is available no matter how small the budget was.

use std::collections::HashSet;

use crate::cache::{Cache, Flag, TranspositionTable};
use crate::engine::{Engine, Report, ReportConsumer, DEFAULT_MOVE_TIME};
use crate::game::{Game, DRAW_SCORE};
use crate::leaves::{Leaves, NullLeaves};
use crate::timer::Timer;

/// Depth of the first iteration, in plies.
pub const MIN_DEPTH: u8 = 2;

/// Hard ceiling on the search depth, in plies.
pub const MAX_DEPTH: u8 = 126;

/// Plies added between consecutive iterations.
const DEPTH_STEP: u8 = 2;

/// The timer is polled once per this many visited nodes.
const ABORT_CHECK_MASK: u64 = 0x3FF;

/// Default transposition table budget, in bytes.
const DEFAULT_CACHE_BYTES: usize = 16 << 20;

/// Iterative-deepening alpha-beta engine.
pub struct Negamax<G: Game> {
    pub(crate) cache: Box<dyn Cache<G>>,
    pub(crate) leaves: Box<dyn Leaves<G>>,
    pub(crate) timer: Timer,
    pub(crate) consumers: Vec<ReportConsumer<G::Move>>,

    // Configuration
    pub(crate) max_depth: u8,
    pub(crate) move_time: u64,
    contempt: Option<i32>,
    infinity: Option<i32>,

    // Resolved per search
    pub(crate) max_score: i32,
    pub(crate) draw_score: i32,

    // Search state
    pub(crate) nodes: u64,
    pub(crate) abortable: bool,
    pub(crate) last_score: i32,
    pub(crate) last_depth: u8,
}

impl<G: Game> Negamax<G> {
    /// Creates an engine with a default-sized transposition table and no
    /// endgame database.
    pub fn new() -> Self
    where
        G::Move: 'static,
    {
        Self {
            cache: Box::new(TranspositionTable::new(DEFAULT_CACHE_BYTES)),
            leaves: Box::new(NullLeaves),
            timer: Timer::new(),
            consumers: Vec::new(),
            max_depth: MAX_DEPTH,
            move_time: DEFAULT_MOVE_TIME,
            contempt: None,
            infinity: None,
            max_score: 0,
            draw_score: 0,
            nodes: 0,
            abortable: false,
            last_score: 0,
            last_depth: 0,
        }
    }

    /// Replaces the transposition cache.
    pub fn set_cache(&mut self, cache: Box<dyn Cache<G>>) {
        self.cache = cache;
    }

    /// Replaces the endgame oracle.
    pub fn set_leaves(&mut self, leaves: Box<dyn Leaves<G>>) {
        self.leaves = leaves;
    }

    /// Nodes visited by the last search.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Resolves the score scale before a search, defaulting to the
    /// game's own values when no override was set.
    pub(crate) fn configure(&mut self, game: &G) {
        self.max_score = self.infinity.unwrap_or_else(|| game.infinity());
        self.draw_score = self.contempt.unwrap_or_else(|| game.contempt());
    }

    /// Exact score of an ended position, from the mover's point of view.
    pub(crate) fn final_score(&self, game: &G) -> i32 {
        let outcome = game.outcome();
        let score = if outcome == DRAW_SCORE { self.draw_score } else { outcome };
        score * game.turn().sign()
    }

    /// Recursive alpha-beta negamax. Returns `None` when aborted.
    fn negamax(&mut self, game: &mut G, depth: u8, mut alpha: i32, mut beta: i32) -> Option<i32> {
        self.nodes += 1;
        if self.abortable && self.nodes & ABORT_CHECK_MASK == 0 && self.timer.aborted() {
            return None;
        }

        if game.has_ended() {
            return Some(self.final_score(game));
        }

        if depth == 0 {
            return Some(game.score() * game.turn().sign());
        }

        if self.leaves.find(game) {
            let score = self.leaves.score();
            match self.leaves.flag() {
                Flag::Exact => return Some(score),
                Flag::Lower => {
                    if score >= beta {
                        return Some(score);
                    }
                    alpha = alpha.max(score);
                }
                Flag::Upper => {
                    if score <= alpha {
                        return Some(score);
                    }
                    beta = beta.min(score);
                }
            }
        }

        let mut hash_move = None;
        if let Some(entry) = self.cache.find(game) {
            hash_move = entry.best_move;
            if entry.depth >= depth {
                match entry.flag {
                    Flag::Exact => return Some(entry.score),
                    Flag::Lower => alpha = alpha.max(entry.score),
                    Flag::Upper => beta = beta.min(entry.score),
                }
                if alpha >= beta {
                    return Some(entry.score);
                }
            }
        }

        let alpha_orig = alpha;
        let mut best_score = i32::MIN + 1;
        let mut best_move = None;
        let mut searched = 0u32;

        if let Some(mv) = hash_move {
            searched += 1;
            let score = self.search_child(game, mv, depth, alpha, beta)?;
            best_score = score;
            best_move = Some(mv);
            alpha = alpha.max(score);
        }

        if alpha < beta {
            while let Some(mv) = game.next_move() {
                if Some(mv) == hash_move {
                    continue;
                }
                searched += 1;
                let score = self.search_child(game, mv, depth, alpha, beta)?;
                if score > best_score {
                    best_score = score;
                    best_move = Some(mv);
                }
                alpha = alpha.max(score);
                if alpha >= beta {
                    break;
                }
            }
        }

        if searched == 0 {
            return Some(self.final_score(game));
        }

        let flag = if best_score >= beta {
            Flag::Lower
        } else if best_score > alpha_orig {
            Flag::Exact
        } else {
            Flag::Upper
        };
        self.cache.store(game, best_score, best_move, depth, flag);

        Some(best_score)
    }

    /// Searches one child, restoring the game even when aborted.
    fn search_child(
        &mut self,
        game: &mut G,
        mv: G::Move,
        depth: u8,
        alpha: i32,
        beta: i32,
    ) -> Option<i32> {
        game.make_move(mv);
        let result = self.negamax(game, depth - 1, -beta, -alpha);
        game.unmake_move();
        result.map(|score| -score)
    }

    /// Searches every root move inside the given window.
    ///
    /// Returns the index of the best move and its score, or `None` when
    /// the iteration was aborted.
    pub(crate) fn search_root(
        &mut self,
        game: &mut G,
        moves: &[G::Move],
        depth: u8,
        mut alpha: i32,
        beta: i32,
    ) -> Option<(usize, i32)> {
        let mut best_index = 0;
        let mut best_score = i32::MIN + 1;

        for (index, &mv) in moves.iter().enumerate() {
            let score = self.search_child(game, mv, depth, alpha, beta)?;
            if score > best_score {
                best_score = score;
                best_index = index;
            }
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }

        Some((best_index, best_score))
    }

    /// Root moves with the cached hash move rotated to the front.
    pub(crate) fn prepare_root_moves(&mut self, game: &G) -> Vec<G::Move> {
        let mut moves = game.legal_moves();
        if let Some(entry) = self.cache.find(game) {
            if let Some(hash_move) = entry.best_move {
                if let Some(position) = moves.iter().position(|&m| m == hash_move) {
                    moves[..=position].rotate_right(1);
                }
            }
        }
        moves
    }

    /// Expected continuation starting at the current position, recalled
    /// from the cache. The game is restored before returning.
    pub(crate) fn extract_pv(&mut self, game: &mut G, max_len: u8) -> Vec<G::Move> {
        let mut pv = Vec::new();
        let mut seen = HashSet::new();

        for _ in 0..max_len {
            if game.has_ended() || !seen.insert(game.hash()) {
                break;
            }
            let Some(entry) = self.cache.find(game) else { break };
            let Some(mv) = entry.best_move else { break };
            if !game.is_legal(mv) {
                break;
            }
            pv.push(mv);
            game.make_move(mv);
        }

        game.unmake_moves(pv.len());
        pv
    }

    /// Emits a report for a completed iteration.
    pub(crate) fn emit_report(&mut self, game: &mut G, depth: u8, score: i32) {
        if self.consumers.is_empty() {
            return;
        }
        let pv = self.extract_pv(game, depth);
        let report = Report {
            best_move: pv.first().copied(),
            score: score * game.turn().sign(),
            depth,
            nodes: self.nodes,
            pv,
        };
        for consumer in &mut self.consumers {
            consumer(&report);
        }
    }
}

impl<G: Game> Default for Negamax<G>
where
    G::Move: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Game> Engine<G> for Negamax<G> {
    fn set_contempt(&mut self, contempt: i32) {
        self.contempt = Some(contempt);
    }

    fn set_infinity(&mut self, infinity: i32) {
        self.infinity = Some(infinity);
    }

    fn set_move_time(&mut self, millis: u64) {
        self.move_time = millis;
    }

    fn set_depth(&mut self, depth: u8) {
        self.max_depth = depth.clamp(1, MAX_DEPTH);
    }

    fn new_match(&mut self) {
        self.cache.clear();
        self.timer.cancel_count_down();
        self.nodes = 0;
        self.last_score = 0;
        self.last_depth = 0;
    }

    fn compute_best_move(&mut self, game: &mut G) -> Option<G::Move> {
        if game.has_ended() {
            return None;
        }

        self.configure(game);
        self.timer.schedule_count_down(self.move_time);
        self.cache.discharge();
        self.nodes = 0;

        let mut moves = self.prepare_root_moves(game);
        if moves.is_empty() {
            self.timer.cancel_count_down();
            return None;
        }

        let window = self.max_score / 10 + 1;
        let mut best_score = game.score() * game.turn().sign();
        let mut depth = MIN_DEPTH.min(self.max_depth);

        loop {
            // The first iteration always completes so that an aborted
            // search still has a move to fall back on.
            self.abortable = depth > MIN_DEPTH;

            let alpha = best_score.saturating_sub(window).max(-self.max_score);
            let beta = best_score.saturating_add(window).min(self.max_score);

            let result = match self.search_root(game, &moves, depth, alpha, beta) {
                Some((index, score)) if score > alpha && score < beta => Some((index, score)),
                Some(_) => self.search_root(game, &moves, depth, -self.max_score, self.max_score),
                None => None,
            };

            match result {
                Some((index, score)) => {
                    moves[..=index].rotate_right(1);
                    best_score = score;
                    self.last_depth = depth;
                    self.cache.store(game, score, Some(moves[0]), depth, Flag::Exact);
                    self.emit_report(game, depth, score);
                    if score.abs() >= self.max_score {
                        break;
                    }
                }
                None => break,
            }

            if depth >= self.max_depth || self.timer.aborted() {
                break;
            }
            depth = depth.saturating_add(DEPTH_STEP).min(self.max_depth);
        }

        self.last_score = best_score * game.turn().sign();
        self.timer.cancel_count_down();

        Some(moves[0])
    }

    fn compute_best_score(&mut self, game: &mut G) -> i32 {
        if game.has_ended() {
            self.configure(game);
            let outcome = game.outcome();
            return if outcome == DRAW_SCORE { self.draw_score } else { outcome };
        }
        self.compute_best_move(game);
        self.last_score
    }

    fn ponder_move(&mut self, game: &mut G) -> Option<G::Move> {
        let entry = self.cache.find(game)?;
        entry.best_move.filter(|&mv| game.is_legal(mv))
    }

    fn timer(&self) -> Timer {
        self.timer.clone()
    }

    fn attach(&mut self, consumer: ReportConsumer<G::Move>) {
        self.consumers.push(consumer);
    }
}
