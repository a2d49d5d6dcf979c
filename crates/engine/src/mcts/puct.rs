//! Predictor-weighted tree search.

use rand::rngs::SmallRng;

use crate::game::Game;
use crate::mcts::{Mcts, Node, Policy};

/// PUCT engine: exploration weighted by each child's initial evaluation.
pub type Puct<G> = Mcts<G, PuctPolicy>;

/// Selection driven by a per-child predictor bias.
///
/// Each child carries the bias it earned when first evaluated; the
/// exploration term grows with the parent-to-child visit ratio instead
/// of the UCB1 logarithm, so strong first impressions keep a branch
/// attractive until it has been sampled often enough to speak for
/// itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct PuctPolicy;

impl<G: Game> Policy<G> for PuctPolicy {
    fn priority(&self, node: &Node<G::Move>, parent_count: u32, _bias: f64) -> f64 {
        if node.count == 0 {
            return f64::NEG_INFINITY;
        }
        let ratio = f64::from(parent_count) / f64::from(node.count);
        node.score - ratio * node.bias
    }

    fn child_bias(&self, explore_factor: f64, value: f64) -> f64 {
        explore_factor * value.abs()
    }

    fn simulate(&mut self, game: &mut G, _depth: u8, _rng: &mut SmallRng) -> i32 {
        game.score()
    }
}
