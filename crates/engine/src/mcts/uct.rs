//! Upper confidence bounds applied to trees.

use rand::rngs::SmallRng;

use crate::game::Game;
use crate::mcts::{uct_priority, Mcts, Node, Policy};

/// UCT engine: UCB1 selection over heuristic leaf evaluations.
pub type Uct<G> = Mcts<G, UctPolicy>;

/// UCB1 selection with the game's heuristic as the leaf value.
#[derive(Debug, Default, Clone, Copy)]
pub struct UctPolicy;

impl<G: Game> Policy<G> for UctPolicy {
    fn priority(&self, node: &Node<G::Move>, parent_count: u32, bias: f64) -> f64 {
        uct_priority(node, parent_count, bias)
    }

    fn simulate(&mut self, game: &mut G, _depth: u8, _rng: &mut SmallRng) -> i32 {
        game.score()
    }
}
