//! Persisted training tree nodes.

use serde::{Deserialize, Serialize};

use crate::game::Side;

/// Store key of the unique root node.
pub const ROOT_KEY: u64 = 1;

/// Null store key; links carrying it do not resolve.
pub const NIL_KEY: u64 = 0;

/// A training tree node as persisted in the store.
///
/// Tree links are store keys rather than memory references, with
/// [`NIL_KEY`] standing in for absent edges. The `moves` path replays
/// the position from the root, which is all an external evaluator needs
/// to reconstruct it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoeNode<M> {
    /// Store key of this node
    pub key: u64,
    /// Store key of the parent, [`NIL_KEY`] at the root
    pub parent: u64,
    /// Store key of the first child
    pub child: u64,
    /// Store key of the next sibling
    pub sibling: u64,
    /// Hash of the position
    pub hash: u64,
    /// Move that led from the parent to this node
    pub mv: Option<M>,
    /// Side to move at the position
    pub turn: Side,
    /// Number of samples backed up through this node
    pub count: u32,
    /// Running mean value, from the point of view of `turn`
    pub score: f64,
    /// Outstanding descendant evaluations, the virtual-loss weight
    pub waiting: u32,
    /// The node's own evaluation has been applied
    pub evaluated: bool,
    /// The position ends the match
    pub terminal: bool,
    /// Children have been generated
    pub expanded: bool,
    /// Move-generator cursor of the position
    pub cursor: usize,
    /// Path from the root to this node
    pub moves: Vec<M>,
}

impl<M> DoeNode<M> {
    /// Adds a sample to the node's running mean.
    pub fn update_score(&mut self, value: f64) {
        self.count += 1;
        self.score += (value - self.score) / f64::from(self.count);
    }
}
