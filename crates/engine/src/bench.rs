//! Benchmarking decorators.
//!
//! Pass-through wrappers around a game, a cache or a leaves oracle that
//! count the operations flowing through them into a shared
//! [`SearchStats`] accumulator. Engines see the wrapped object through
//! the same trait, at the cost of a single indirection; the wrapped
//! target stays reachable through `inner`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cache::{Cache, Entry, Flag};
use crate::error::Error;
use crate::game::{Game, Side};
use crate::leaves::Leaves;

/// Shared operation counters.
#[derive(Debug, Default)]
pub struct SearchStats {
    /// Moves performed on the game
    pub moves_made: AtomicU64,
    /// Moves taken back
    pub moves_unmade: AtomicU64,
    /// Moves produced by the incremental generator
    pub moves_generated: AtomicU64,
    /// Heuristic evaluations
    pub evaluations: AtomicU64,
    /// Exact terminal evaluations
    pub outcomes: AtomicU64,
    /// Cache probes
    pub cache_probes: AtomicU64,
    /// Cache probes that found an entry
    pub cache_hits: AtomicU64,
    /// Cache stores
    pub cache_stores: AtomicU64,
    /// Endgame oracle probes
    pub leaves_probes: AtomicU64,
    /// Endgame oracle probes that found the position
    pub leaves_hits: AtomicU64,
}

impl SearchStats {
    /// Creates a zeroed accumulator behind a shared handle.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Resets every counter to zero.
    pub fn clear(&self) {
        self.moves_made.store(0, Ordering::Relaxed);
        self.moves_unmade.store(0, Ordering::Relaxed);
        self.moves_generated.store(0, Ordering::Relaxed);
        self.evaluations.store(0, Ordering::Relaxed);
        self.outcomes.store(0, Ordering::Relaxed);
        self.cache_probes.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_stores.store(0, Ordering::Relaxed);
        self.leaves_probes.store(0, Ordering::Relaxed);
        self.leaves_hits.store(0, Ordering::Relaxed);
    }

    #[inline(always)]
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Game decorator counting state-machine operations.
pub struct BenchGame<G> {
    inner: G,
    stats: Arc<SearchStats>,
}

impl<G: Game> BenchGame<G> {
    /// Wraps a game, counting its operations into `stats`.
    pub fn new(inner: G, stats: Arc<SearchStats>) -> Self {
        Self { inner, stats }
    }

    /// The wrapped game.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Unwraps the decorator.
    pub fn into_inner(self) -> G {
        self.inner
    }
}

impl<G: Game> Game for BenchGame<G> {
    type Move = G::Move;
    type Board = G::Board;

    fn length(&self) -> usize {
        self.inner.length()
    }

    fn moves(&self) -> &[G::Move] {
        self.inner.moves()
    }

    fn turn(&self) -> Side {
        self.inner.turn()
    }

    fn hash(&self) -> u64 {
        self.inner.hash()
    }

    fn has_ended(&self) -> bool {
        self.inner.has_ended()
    }

    fn winner(&self) -> Option<Side> {
        self.inner.winner()
    }

    fn score(&self) -> i32 {
        SearchStats::bump(&self.stats.evaluations);
        self.inner.score()
    }

    fn outcome(&self) -> i32 {
        SearchStats::bump(&self.stats.outcomes);
        self.inner.outcome()
    }

    fn contempt(&self) -> i32 {
        self.inner.contempt()
    }

    fn infinity(&self) -> i32 {
        self.inner.infinity()
    }

    fn is_legal(&self, mv: G::Move) -> bool {
        self.inner.is_legal(mv)
    }

    fn make_move(&mut self, mv: G::Move) {
        SearchStats::bump(&self.stats.moves_made);
        self.inner.make_move(mv);
    }

    fn unmake_move(&mut self) {
        SearchStats::bump(&self.stats.moves_unmade);
        self.inner.unmake_move();
    }

    fn next_move(&mut self) -> Option<G::Move> {
        let mv = self.inner.next_move();
        if mv.is_some() {
            SearchStats::bump(&self.stats.moves_generated);
        }
        mv
    }

    fn legal_moves(&self) -> Vec<G::Move> {
        self.inner.legal_moves()
    }

    fn cursor(&self) -> usize {
        self.inner.cursor()
    }

    fn set_cursor(&mut self, cursor: usize) {
        self.inner.set_cursor(cursor);
    }

    fn ensure_capacity(&mut self, n: usize) -> Result<(), Error> {
        self.inner.ensure_capacity(n)
    }

    fn set_board(&mut self, board: &G::Board) -> Result<(), Error> {
        self.inner.set_board(board)
    }

    fn board(&self) -> G::Board {
        self.inner.board()
    }

    fn to_board(&self) -> G::Board {
        self.inner.to_board()
    }

    fn end_match(&mut self) {
        self.inner.end_match();
    }

    fn to_centi_pawns(&self, score: i32) -> i32 {
        self.inner.to_centi_pawns(score)
    }
}

/// Cache decorator counting probes, hits and stores.
pub struct BenchCache<C> {
    inner: C,
    stats: Arc<SearchStats>,
}

impl<C> BenchCache<C> {
    /// Wraps a cache, counting its operations into `stats`.
    pub fn new(inner: C, stats: Arc<SearchStats>) -> Self {
        Self { inner, stats }
    }

    /// The wrapped cache.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Unwraps the decorator.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<G: Game, C: Cache<G>> Cache<G> for BenchCache<C> {
    fn find(&mut self, game: &G) -> Option<Entry<G::Move>> {
        SearchStats::bump(&self.stats.cache_probes);
        let entry = self.inner.find(game);
        if entry.is_some() {
            SearchStats::bump(&self.stats.cache_hits);
        }
        entry
    }

    fn store(&mut self, game: &G, score: i32, best_move: Option<G::Move>, depth: u8, flag: Flag) {
        SearchStats::bump(&self.stats.cache_stores);
        self.inner.store(game, score, best_move, depth, flag);
    }

    fn discharge(&mut self) {
        self.inner.discharge();
    }

    fn resize(&mut self, bytes: usize) {
        self.inner.resize(bytes);
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn size(&self) -> usize {
        self.inner.size()
    }
}

/// Leaves decorator counting probes and hits.
pub struct BenchLeaves<L> {
    inner: L,
    stats: Arc<SearchStats>,
}

impl<L> BenchLeaves<L> {
    /// Wraps a leaves oracle, counting its operations into `stats`.
    pub fn new(inner: L, stats: Arc<SearchStats>) -> Self {
        Self { inner, stats }
    }

    /// The wrapped oracle.
    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Unwraps the decorator.
    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<G: Game, L: Leaves<G>> Leaves<G> for BenchLeaves<L> {
    fn find(&mut self, game: &G) -> bool {
        SearchStats::bump(&self.stats.leaves_probes);
        let found = self.inner.find(game);
        if found {
            SearchStats::bump(&self.stats.leaves_hits);
        }
        found
    }

    fn score(&self) -> i32 {
        self.inner.score()
    }

    fn flag(&self) -> Flag {
        self.inner.flag()
    }
}
