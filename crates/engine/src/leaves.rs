//! Endgame database oracle.
//!
//! A read-only source of exact scores for positions close to the end of
//! the game. Engines probe it before recursing; a hit replaces the whole
//! subtree below the position. [`NullLeaves`] is the fallback for games
//! without a database, [`MapLeaves`] keeps small databases on the heap,
//! and [`BitsetLeaves`] packs large ones into fixed-width records
//! indexed by a perfect hash of the position.

use crate::bitset::BitsetMap;
use crate::cache::Flag;
use crate::game::Game;

/// Read-only oracle of exact endgame scores.
///
/// A successful [`find`](Leaves::find) loads the probed position so that
/// [`score`](Leaves::score) and [`flag`](Leaves::flag) describe it until
/// the next probe. Scores are in engine units from the point of view of
/// the side to move.
pub trait Leaves<G: Game> {
    /// Checks whether the game's current position is in the database and
    /// loads its record if so.
    fn find(&mut self, game: &G) -> bool;

    /// Score of the last found position.
    fn score(&self) -> i32;

    /// Bound kind of the last found score.
    fn flag(&self) -> Flag;
}

/// Endgame oracle for games without a database; never finds anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLeaves;

impl<G: Game> Leaves<G> for NullLeaves {
    fn find(&mut self, _game: &G) -> bool {
        false
    }

    fn score(&self) -> i32 {
        0
    }

    fn flag(&self) -> Flag {
        Flag::Exact
    }
}

/// Endgame oracle backed by a map from position hash to exact record.
///
/// Suits databases small enough to live on the heap; bigger ones pack
/// their records with [`crate::bitset::BitsetMap`] behind the same
/// trait.
pub struct MapLeaves {
    records: std::collections::HashMap<u64, (i32, Flag)>,
    score: i32,
    flag: Flag,
}

impl MapLeaves {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self {
            records: std::collections::HashMap::new(),
            score: 0,
            flag: Flag::Exact,
        }
    }

    /// Records the exact score of a position.
    pub fn add_position(&mut self, hash: u64, score: i32, flag: Flag) {
        self.records.insert(hash, (score, flag));
    }

    /// Number of known positions.
    pub fn size(&self) -> usize {
        self.records.len()
    }
}

impl Default for MapLeaves {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Game> Leaves<G> for MapLeaves {
    fn find(&mut self, game: &G) -> bool {
        match self.records.get(&game.hash()) {
            Some(&(score, flag)) => {
                self.score = score;
                self.flag = flag;
                true
            }
            None => false,
        }
    }

    fn score(&self) -> i32 {
        self.score
    }

    fn flag(&self) -> Flag {
        self.flag
    }
}

/// Endgame database packed into fixed-width records.
///
/// Records live in a [`BitsetMap`] indexed by a caller-supplied perfect
/// hash of the position, typically one of the rankings in
/// [`crate::hashing`]. The low two bits of each record hold the bound
/// kind, with zero marking an absent position, and the remaining bits
/// hold the score shifted into an unsigned range.
pub struct BitsetLeaves<G> {
    records: BitsetMap,
    index_of: Box<dyn Fn(&G) -> Option<usize> + Send>,
    range: i32,
    score: i32,
    flag: Flag,
}

const FLAG_BITS: u32 = 2;

impl<G> BitsetLeaves<G> {
    /// Creates a zeroed database of `len` records of `width` bits each,
    /// resolved through the given position indexer.
    ///
    /// # Panics
    ///
    /// Panics unless `4 <= width <= 34`, the widths whose score range
    /// fits an `i32`.
    pub fn new(
        width: u32,
        len: usize,
        index_of: Box<dyn Fn(&G) -> Option<usize> + Send>,
    ) -> Self {
        assert!((4..=34).contains(&width), "record width must be 4..=34");
        let range = ((1i64 << (width - FLAG_BITS - 1)) - 1) as i32;
        Self {
            records: BitsetMap::new(width, len),
            index_of,
            range,
            score: 0,
            flag: Flag::Exact,
        }
    }

    /// Largest score magnitude a record can hold.
    pub fn range(&self) -> i32 {
        self.range
    }

    /// Size in bytes of the backing storage.
    pub fn byte_size(&self) -> usize {
        self.records.byte_size()
    }

    /// Records the score of the position at the given index.
    ///
    /// # Panics
    ///
    /// Panics when the score magnitude exceeds [`range`](Self::range).
    pub fn add_position(&mut self, index: usize, score: i32, flag: Flag) {
        assert!(score.abs() <= self.range, "score out of record range");
        let code = match flag {
            Flag::Exact => 1,
            Flag::Lower => 2,
            Flag::Upper => 3,
        };
        let offset = (score + self.range) as u64;
        self.records.set(index, offset << FLAG_BITS | code);
    }
}

impl<G: Game> Leaves<G> for BitsetLeaves<G> {
    fn find(&mut self, game: &G) -> bool {
        let Some(index) = (self.index_of)(game) else {
            return false;
        };
        if index >= self.records.len() {
            return false;
        }

        let record = self.records.get(index);
        self.flag = match record & 0b11 {
            1 => Flag::Exact,
            2 => Flag::Lower,
            3 => Flag::Upper,
            _ => return false,
        };
        self.score = (record >> FLAG_BITS) as i32 - self.range;
        true
    }

    fn score(&self) -> i32 {
        self.score
    }

    fn flag(&self) -> Flag {
        self.flag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::HashedGame;

    #[test]
    fn test_null_leaves_always_misses() {
        let mut leaves = NullLeaves;
        let game = HashedGame(42);
        assert!(!Leaves::<HashedGame>::find(&mut leaves, &game));
        assert_eq!(Leaves::<HashedGame>::score(&leaves), 0);
        assert_eq!(Leaves::<HashedGame>::flag(&leaves), Flag::Exact);
    }

    #[test]
    fn test_map_leaves_round_trip() {
        let mut leaves = MapLeaves::new();
        leaves.add_position(42, -350, Flag::Exact);
        leaves.add_position(43, 120, Flag::Lower);
        assert_eq!(leaves.size(), 2);

        assert!(Leaves::<HashedGame>::find(&mut leaves, &HashedGame(42)));
        assert_eq!(Leaves::<HashedGame>::score(&leaves), -350);
        assert_eq!(Leaves::<HashedGame>::flag(&leaves), Flag::Exact);

        assert!(Leaves::<HashedGame>::find(&mut leaves, &HashedGame(43)));
        assert_eq!(Leaves::<HashedGame>::flag(&leaves), Flag::Lower);
    }

    #[test]
    fn test_map_leaves_misses_keep_the_last_record() {
        let mut leaves = MapLeaves::new();
        leaves.add_position(7, 99, Flag::Upper);

        assert!(Leaves::<HashedGame>::find(&mut leaves, &HashedGame(7)));
        assert!(!Leaves::<HashedGame>::find(&mut leaves, &HashedGame(8)));
        // A miss does not clobber the loaded record.
        assert_eq!(Leaves::<HashedGame>::score(&leaves), 99);
    }

    /// Indexes the stub game by its hash value.
    fn hashed_leaves(width: u32, len: usize) -> BitsetLeaves<HashedGame> {
        BitsetLeaves::new(width, len, Box::new(|game: &HashedGame| Some(game.0 as usize)))
    }

    #[test]
    fn test_bitset_leaves_round_trip() {
        let mut leaves = hashed_leaves(12, 64);
        assert_eq!(leaves.range(), 511);

        leaves.add_position(5, -300, Flag::Exact);
        leaves.add_position(6, 0, Flag::Lower);
        leaves.add_position(63, 511, Flag::Upper);

        assert!(leaves.find(&HashedGame(5)));
        assert_eq!(Leaves::<HashedGame>::score(&leaves), -300);
        assert_eq!(Leaves::<HashedGame>::flag(&leaves), Flag::Exact);

        assert!(leaves.find(&HashedGame(6)));
        assert_eq!(Leaves::<HashedGame>::score(&leaves), 0);
        assert_eq!(Leaves::<HashedGame>::flag(&leaves), Flag::Lower);

        assert!(leaves.find(&HashedGame(63)));
        assert_eq!(Leaves::<HashedGame>::score(&leaves), 511);
        assert_eq!(Leaves::<HashedGame>::flag(&leaves), Flag::Upper);
    }

    #[test]
    fn test_bitset_leaves_absent_records_miss() {
        let mut leaves = hashed_leaves(12, 64);
        leaves.add_position(5, 10, Flag::Exact);

        assert!(!leaves.find(&HashedGame(4)));
        // Out-of-table indices miss instead of panicking.
        assert!(!leaves.find(&HashedGame(10_000)));
    }

    #[test]
    #[should_panic(expected = "score out of record range")]
    fn test_bitset_leaves_rejects_oversized_scores() {
        let mut leaves = hashed_leaves(8, 16);
        leaves.add_position(0, 1_000, Flag::Exact);
    }
}
