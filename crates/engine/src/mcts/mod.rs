//! Best-first Monte-Carlo tree search engines.
//!
//! All four engines share one driver, [`Mcts`], and one arena-allocated
//! tree; a [`Policy`] decides how children are prioritized during the
//! descent and how new leaves are evaluated:
//!
//! - [`Uct`](crate::mcts::Uct) scores leaves with the game's heuristic
//!   and explores with the UCB1 term.
//! - [`Puct`](crate::mcts::Puct) replaces the UCB1 term with a
//!   per-child bias proportional to the leaf's initial evaluation.
//! - [`Montecarlo`](crate::mcts::Montecarlo) scores leaves with
//!   uniformly random playouts.
//! - [`Partner`](crate::mcts::Partner) is the cooperative variant for
//!   single-player puzzles: both sides optimize South's result and
//!   losses count as draws.
//!
//! Node scores are running means stored from the point of view of the
//! side to move at the node, so a parent reads each child negated and
//! the selection always minimizes.

mod engine;
mod montecarlo;
mod partner;
mod puct;
mod tree;
mod uct;

pub use engine::Mcts;
pub use montecarlo::{Montecarlo, MontecarloPolicy};
pub use partner::{Partner, PartnerPolicy};
pub use puct::{Puct, PuctPolicy};
pub use tree::{Node, NodeId};
pub use uct::{Uct, UctPolicy};

pub(crate) use tree::Tree;

use rand::rngs::SmallRng;

use crate::game::Game;

/// Selection and evaluation strategy of an [`Mcts`] engine.
pub trait Policy<G: Game>: Default {
    /// Selection key of a child node, minimized among its siblings.
    ///
    /// `bias` is the engine-level exploration weight, the exploration
    /// factor scaled by the score ceiling.
    fn priority(&self, node: &Node<G::Move>, parent_count: u32, bias: f64) -> f64;

    /// Exploration bias attached to a freshly evaluated child, given
    /// the engine exploration factor and the child's initial value.
    fn child_bias(&self, _explore_factor: f64, _value: f64) -> f64 {
        0.0
    }

    /// Value of a non-terminal leaf, from South's point of view.
    ///
    /// `depth` bounds the work a playout may spend before falling back
    /// on the game's heuristic.
    fn simulate(&mut self, game: &mut G, depth: u8, rng: &mut SmallRng) -> i32;

    /// Maps a terminal outcome before it is scored.
    fn adjust_outcome(&self, outcome: i32, _max_score: i32) -> i32 {
        outcome
    }
}

/// The UCB1 selection key shared by the UCT-like policies.
///
/// Unvisited children sort first so every freshly expanded node gets
/// sampled before its siblings are revisited.
pub(crate) fn uct_priority<M>(node: &Node<M>, parent_count: u32, bias: f64) -> f64 {
    if node.count == 0 {
        return f64::NEG_INFINITY;
    }
    let exploration = (f64::from(parent_count).ln() / f64::from(node.count)).sqrt();
    node.score - bias * exploration
}
