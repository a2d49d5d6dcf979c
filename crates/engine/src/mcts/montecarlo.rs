//! Tree search over uniformly random playouts.

use rand::rngs::SmallRng;
use rand::Rng;

use crate::game::Game;
use crate::mcts::{uct_priority, Mcts, Node, Policy};

/// Monte-Carlo engine: UCB1 selection over random playouts.
pub type Montecarlo<G> = Mcts<G, MontecarloPolicy>;

/// Picks a legal move uniformly at random through reservoir sampling,
/// so the distribution stays uniform without knowing the move count
/// that the incremental generator will produce.
pub(crate) fn random_move<G: Game, R: Rng>(game: &mut G, rng: &mut R) -> Option<G::Move> {
    let mut chosen = None;
    let mut seen = 0u32;
    while let Some(mv) = game.next_move() {
        seen += 1;
        if rng.gen_range(0..seen) == 0 {
            chosen = Some(mv);
        }
    }
    chosen
}

/// UCB1 selection with random playouts as the leaf value.
#[derive(Debug, Default, Clone, Copy)]
pub struct MontecarloPolicy;

impl<G: Game> Policy<G> for MontecarloPolicy {
    fn priority(&self, node: &Node<G::Move>, parent_count: u32, bias: f64) -> f64 {
        uct_priority(node, parent_count, bias)
    }

    /// Plays uniformly random moves until the match ends or the depth
    /// budget runs out, then rewinds the game to where it stood.
    fn simulate(&mut self, game: &mut G, depth: u8, rng: &mut SmallRng) -> i32 {
        let mut made = 0usize;

        while !game.has_ended() && made < usize::from(depth) {
            match random_move(game, rng) {
                Some(mv) => {
                    game.make_move(mv);
                    made += 1;
                }
                None => break,
            }
        }

        let value = if game.has_ended() { game.outcome() } else { game.score() };
        game.unmake_moves(made);
        value
    }
}
