//! Cooperative tree search for single-player puzzles.

use rand::rngs::SmallRng;

use crate::game::{Game, DRAW_SCORE};
use crate::mcts::{Mcts, Node, Policy};

/// Partner engine: both sides work toward South's best result.
pub type Partner<G> = Mcts<G, PartnerPolicy>;

/// Cooperative selection for puzzles framed as two-player games.
///
/// Every node is ranked by South's outlook regardless of whose turn it
/// is, so the North mover picks the move that is worst for itself, and
/// losses count as draws so a failed line merely stops scoring instead
/// of poisoning its whole branch.
#[derive(Debug, Default, Clone, Copy)]
pub struct PartnerPolicy;

impl<G: Game> Policy<G> for PartnerPolicy {
    fn priority(&self, node: &Node<G::Move>, parent_count: u32, bias: f64) -> f64 {
        if node.count == 0 {
            return f64::NEG_INFINITY;
        }
        let exploration = (f64::from(parent_count).ln() / f64::from(node.count)).sqrt();
        let south_view = f64::from(node.turn.sign()) * node.score;
        -south_view - bias * exploration
    }

    fn simulate(&mut self, game: &mut G, _depth: u8, _rng: &mut SmallRng) -> i32 {
        game.score()
    }

    fn adjust_outcome(&self, outcome: i32, max_score: i32) -> i32 {
        if outcome == -max_score {
            DRAW_SCORE
        } else {
            outcome
        }
    }
}
