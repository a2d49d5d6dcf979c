//! Opening book oracle.
//!
//! A source of curated moves for positions near the start of the match.
//! Protocol layers consult it before handing the position to a search
//! engine; the engines themselves never probe it.

use std::collections::HashMap;

use crate::doe::{Store, NIL_KEY, ROOT_KEY};
use crate::game::Game;

/// Read-only oracle of opening moves.
pub trait Roots<G: Game> {
    /// A book move for the game's current position, if one is known.
    fn pick_move(&mut self, game: &G) -> Option<G::Move>;
}

/// Opening book backed by a hash map from position to move choices.
///
/// Positions keep their moves in preference order; `pick_move` returns
/// the first one that is legal on the probed game.
pub struct BookRoots<M> {
    positions: HashMap<u64, Vec<M>>,
}

impl<M: Copy> BookRoots<M> {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self { positions: HashMap::new() }
    }

    /// Adds a position and its moves, best first.
    pub fn add_position(&mut self, hash: u64, moves: Vec<M>) {
        if !moves.is_empty() {
            self.positions.insert(hash, moves);
        }
    }

    /// Checks whether a position is in the book.
    pub fn contains(&self, hash: u64) -> bool {
        self.positions.contains_key(&hash)
    }

    /// Number of positions in the book.
    pub fn size(&self) -> usize {
        self.positions.len()
    }
}

impl<M: Copy> Default for BookRoots<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Game> Roots<G> for BookRoots<G::Move> {
    fn pick_move(&mut self, game: &G) -> Option<G::Move> {
        let moves = self.positions.get(&game.hash())?;
        moves.iter().copied().find(|&m| game.is_legal(m))
    }
}

/// Opening book read from a tree persisted by the training module.
///
/// The probed position is located by replaying the game's move history
/// through the stored child lists; among its replies, the most sampled
/// legal one wins. Store failures and unknown positions are misses,
/// never errors.
pub struct DoeRoots<S> {
    store: S,
    min_count: u32,
}

impl<S> DoeRoots<S> {
    /// Creates a book over a trained store.
    pub fn new(store: S) -> Self {
        Self { store, min_count: 1 }
    }

    /// Requires at least this many samples before a reply is trusted.
    pub fn set_min_count(&mut self, min_count: u32) {
        self.min_count = min_count.max(1);
    }

    /// Unwraps the book, handing the store back.
    pub fn into_store(self) -> S {
        self.store
    }
}

impl<G: Game, S: Store<G::Move>> Roots<G> for DoeRoots<S> {
    fn pick_move(&mut self, game: &G) -> Option<G::Move> {
        let mut node = self.store.read(ROOT_KEY).ok()??;

        for &mv in game.moves() {
            let mut key = node.child;
            let mut found = None;
            while key != NIL_KEY {
                let child = self.store.read(key).ok()??;
                if child.mv == Some(mv) {
                    found = Some(child);
                    break;
                }
                key = child.sibling;
            }
            node = found?;
        }

        if node.hash != game.hash() {
            return None;
        }

        let mut key = node.child;
        let mut best: Option<(u32, G::Move)> = None;
        while key != NIL_KEY {
            let child = self.store.read(key).ok()??;
            if let Some(mv) = child.mv {
                let trusted = child.count >= self.min_count && game.is_legal(mv);
                if trusted && best.map_or(true, |(count, _)| child.count > count) {
                    best = Some((child.count, mv));
                }
            }
            key = child.sibling;
        }
        best.map(|(_, mv)| mv)
    }
}
