//! Transposition cache for search results.
//!
//! Maps position hashes to the score, best move, depth and bound kind of
//! a previous search, inside a fixed byte budget. Entries age by
//! generation: [`Cache::discharge`] runs at every root search so fresh
//! results outrank stale ones without erasing them.

use crate::game::Game;

/// Bound kind of a cached or oracle score.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Flag {
    /// Exact score (the search window was not clipped)
    Exact,
    /// Lower bound (the score caused a beta cutoff)
    Lower,
    /// Upper bound (the score failed to raise alpha)
    Upper,
}

/// A cached search result.
#[derive(Debug, Copy, Clone)]
pub struct Entry<M> {
    /// Hash of the cached position
    pub hash: u64,
    /// Best move found, if any survived the search window
    pub best_move: Option<M>,
    /// Score from the point of view of the side to move
    pub score: i32,
    /// Depth the score was searched to
    pub depth: u8,
    /// Bound kind of the score
    pub flag: Flag,
}

/// Cache of search results keyed by position hash.
///
/// Lookups and stores are amortized O(1) and need not be thread-safe;
/// each engine owns its cache.
pub trait Cache<G: Game> {
    /// Last-stored entry matching the game's current position, if any.
    fn find(&mut self, game: &G) -> Option<Entry<G::Move>>;

    /// Records a search result for the game's current position.
    fn store(&mut self, game: &G, score: i32, best_move: Option<G::Move>, depth: u8, flag: Flag);

    /// Bumps the generation tag so that new entries outrank stale ones.
    fn discharge(&mut self);

    /// Reshapes the backing table to the given byte budget, discarding
    /// every stored entry.
    fn resize(&mut self, bytes: usize);

    /// Erases every stored entry.
    fn clear(&mut self);

    /// Size in bytes of the backing table.
    fn size(&self) -> usize;
}

/// How many generations it takes an entry to lose one ply of priority.
///
/// A stale entry competes with `depth - 2 * age`, so a fresh shallow
/// store only evicts a deep entry once enough searches have passed.
const AGE_PENALTY: u8 = 2;

struct Slot<M> {
    hash: u64,
    best_move: Option<M>,
    score: i32,
    depth: u8,
    generation: u8,
    flag: Flag,
}

impl<M> Slot<M> {
    fn empty() -> Self {
        Self {
            hash: 0,
            best_move: None,
            score: 0,
            depth: 0,
            generation: 0,
            flag: Flag::Exact,
        }
    }
}

/// Fixed-size transposition table with single-slot replacement.
///
/// The slot count is the largest power of two fitting the byte budget,
/// so indexing is a mask of the hash. On a collision the incumbent is
/// kept only while its age-discounted depth beats the newcomer's.
pub struct TranspositionTable<M> {
    slots: Vec<Slot<M>>,
    mask: usize,
    generation: u8,
}

impl<M: Copy> TranspositionTable<M> {
    /// Creates a table of approximately the given size in bytes.
    pub fn new(bytes: usize) -> Self {
        let count = Self::slot_count(bytes);
        let mut slots = Vec::with_capacity(count);
        slots.resize_with(count, Slot::empty);
        Self { slots, mask: count - 1, generation: 0 }
    }

    fn slot_count(bytes: usize) -> usize {
        let count = (bytes / std::mem::size_of::<Slot<M>>()).max(1);
        1 << count.ilog2()
    }

    #[inline(always)]
    fn index(&self, hash: u64) -> usize {
        hash as usize & self.mask
    }

    /// Effective depth of a slot once its age discount is applied.
    fn effective_depth(&self, slot: &Slot<M>) -> i32 {
        let age = self.generation.wrapping_sub(slot.generation);
        i32::from(slot.depth) - i32::from(AGE_PENALTY) * i32::from(age)
    }
}

impl<G: Game> Cache<G> for TranspositionTable<G::Move> {
    fn find(&mut self, game: &G) -> Option<Entry<G::Move>> {
        let hash = game.hash();
        let slot = &self.slots[self.index(hash)];

        if hash != 0 && slot.hash == hash {
            Some(Entry {
                hash,
                best_move: slot.best_move,
                score: slot.score,
                depth: slot.depth,
                flag: slot.flag,
            })
        } else {
            None
        }
    }

    fn store(&mut self, game: &G, score: i32, best_move: Option<G::Move>, depth: u8, flag: Flag) {
        let hash = game.hash();
        let index = self.index(hash);
        let slot = &self.slots[index];

        // Same position always takes the latest result. A colliding
        // store wins only against an empty or age-outranked incumbent.
        let replace = slot.hash == 0
            || slot.hash == hash
            || i32::from(depth) >= self.effective_depth(slot);

        if replace {
            self.slots[index] = Slot {
                hash,
                best_move,
                score,
                depth,
                generation: self.generation,
                flag,
            };
        }
    }

    fn discharge(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn resize(&mut self, bytes: usize) {
        let count = Self::slot_count(bytes);
        self.slots.clear();
        self.slots.resize_with(count, Slot::empty);
        self.mask = count - 1;
        self.generation = 0;
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = Slot::empty());
        self.generation = 0;
    }

    fn size(&self) -> usize {
        self.slots.len() * std::mem::size_of::<Slot<G::Move>>()
    }
}
