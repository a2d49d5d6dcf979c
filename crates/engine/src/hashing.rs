//! Hash functions over game states.
//!
//! Three families cover the usual encodings of board games:
//!
//! - [`Zobrist`] XORs per-(slot, value) random keys and supports O(1)
//!   incremental updates, which makes it the default for make/unmake
//!   state machines.
//! - [`Lehmer`] ranks permutations, for games whose positions are
//!   arrangements of distinct pieces.
//! - [`Binomial`] ranks combinations through the combinatorial number
//!   system, for games whose positions are subsets of slots.
//!
//! The ranking hashes are perfect over their domains, which is what
//! packed endgame databases index their records with.

use once_cell::sync::Lazy;

use crate::game::Side;

/// Factorials up to 20!, the largest that fits an `u64`.
static FACTORIALS: Lazy<[u64; 21]> = Lazy::new(|| {
    let mut table = [1u64; 21];
    for n in 1..21 {
        table[n] = table[n - 1] * n as u64;
    }
    table
});

/// Generate pseudorandom 64-bit numbers using a simple LCG.
const fn prng(mut seed: u64) -> u64 {
    // LCG parameters from Numerical Recipes
    seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
    seed
}

/// Zobrist keys for a game with `slots` positions that can each hold one
/// of `values` states.
///
/// Value zero conventionally means "empty" and contributes nothing, so
/// only occupied slots need to be folded into a hash.
pub struct Zobrist {
    keys: Vec<u64>,
    values: usize,
    north_to_move: u64,
}

impl Zobrist {
    /// Creates a reproducible key table for `slots` x `values` states.
    ///
    /// The same dimensions always produce the same keys, so hashes are
    /// comparable across game instances and across runs.
    pub fn new(slots: usize, values: usize) -> Self {
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut keys = Vec::with_capacity(slots * values);

        for _ in 0..slots * values {
            seed = prng(seed);
            keys.push(seed);
        }

        seed = prng(seed);

        Self { keys, values, north_to_move: seed }
    }

    /// Key of the given slot holding the given value.
    ///
    /// Value zero maps to the null key so empty slots can be folded in
    /// unconditionally.
    #[inline(always)]
    pub fn key(&self, slot: usize, value: usize) -> u64 {
        debug_assert!(value < self.values, "value out of range");
        if value == 0 {
            0
        } else {
            self.keys[slot * self.values + value]
        }
    }

    /// Key toggled when North is to move.
    #[inline(always)]
    pub fn side_key(&self) -> u64 {
        self.north_to_move
    }

    /// Hashes a full state where `state[slot]` is the value held by the
    /// slot, plus the side to move.
    pub fn hash(&self, state: &[u8], turn: Side) -> u64 {
        let mut hash = 0u64;
        for (slot, &value) in state.iter().enumerate() {
            hash ^= self.key(slot, value as usize);
        }
        if turn == Side::North {
            hash ^= self.north_to_move;
        }
        hash
    }
}

/// Lehmer code ranking of permutations.
///
/// Ranks a permutation of `0..n` into its index in lexicographic order,
/// a perfect hash over the `n!` arrangements.
pub struct Lehmer {
    size: usize,
}

impl Lehmer {
    /// Creates a ranker for permutations of `0..size`.
    ///
    /// # Panics
    ///
    /// Panics if `size > 20`, where ranks no longer fit an `u64`.
    pub fn new(size: usize) -> Self {
        assert!(size <= 20, "permutation rank overflows u64");
        Self { size }
    }

    /// Rank of a permutation in lexicographic order.
    pub fn hash(&self, permutation: &[u8]) -> u64 {
        debug_assert_eq!(permutation.len(), self.size);

        let mut rank = 0u64;
        for (i, &digit) in permutation.iter().enumerate() {
            let mut smaller_right = 0u64;
            for &other in &permutation[i + 1..] {
                if other < digit {
                    smaller_right += 1;
                }
            }
            rank += smaller_right * FACTORIALS[self.size - 1 - i];
        }
        rank
    }

    /// Permutation of the given rank, the inverse of [`hash`](Lehmer::hash).
    pub fn unhash(&self, mut rank: u64) -> Vec<u8> {
        let mut pool: Vec<u8> = (0..self.size as u8).collect();
        let mut permutation = Vec::with_capacity(self.size);

        for i in 0..self.size {
            let base = FACTORIALS[self.size - 1 - i];
            let index = (rank / base) as usize;
            rank %= base;
            permutation.push(pool.remove(index));
        }
        permutation
    }
}

/// Combinatorial number system ranking of combinations.
///
/// Ranks a strictly increasing sequence of `k` slot indices out of `n`
/// into its index among all the `C(n, k)` combinations.
pub struct Binomial {
    coefficients: Vec<u64>,
    slots: usize,
    choose: usize,
}

impl Binomial {
    /// Creates a ranker for combinations of `choose` items out of `slots`.
    pub fn new(slots: usize, choose: usize) -> Self {
        // Pascal's triangle, row-major up to `slots`.
        let width = choose + 1;
        let mut coefficients = vec![0u64; (slots + 1) * width];
        for n in 0..=slots {
            coefficients[n * width] = 1;
            for k in 1..=choose.min(n) {
                let above = coefficients[(n - 1) * width + k];
                let left = coefficients[(n - 1) * width + k - 1];
                coefficients[n * width + k] = above + left;
            }
        }
        Self { coefficients, slots, choose }
    }

    /// The binomial coefficient `C(n, k)` from the precomputed table.
    #[inline(always)]
    pub fn coefficient(&self, n: usize, k: usize) -> u64 {
        debug_assert!(k <= self.choose, "k out of range");
        self.coefficients[n * (self.choose + 1) + k]
    }

    /// Rank of a strictly increasing combination of slot indices.
    pub fn hash(&self, combination: &[u8]) -> u64 {
        debug_assert_eq!(combination.len(), self.choose);

        let mut rank = 0u64;
        for (i, &slot) in combination.iter().enumerate() {
            rank += self.coefficient(slot as usize, i + 1);
        }
        rank
    }

    /// Combination of the given rank, the inverse of
    /// [`hash`](Binomial::hash).
    pub fn unhash(&self, mut rank: u64) -> Vec<u8> {
        let mut combination = vec![0u8; self.choose];

        for k in (1..=self.choose).rev() {
            // Largest slot whose coefficient still fits the rank.
            let mut slot = k - 1;
            while slot + 1 <= self.slots && self.coefficient(slot + 1, k) <= rank {
                slot += 1;
            }
            rank -= self.coefficient(slot, k);
            combination[k - 1] = slot as u8;
        }
        combination
    }
}
