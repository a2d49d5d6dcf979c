//! # zermelo
//!
//! Generic search engines for two-player zero-sum games:
//! - A [`Game`](game::Game)/[`Board`](game::Board) trait pair any turn
//!   based game can implement once to drive every engine
//! - Iterative-deepening alpha-beta ([`Negamax`](negamax::Negamax)) and
//!   its zero-window refinement ([`Mtdf`](mtdf::Mtdf))
//! - A Monte-Carlo family ([`Uct`](mcts::Uct), [`Puct`](mcts::Puct),
//!   [`Montecarlo`](mcts::Montecarlo), [`Partner`](mcts::Partner)) with
//!   tree reuse, terminal proof propagation and bounded-memory pruning
//! - A persistent, multithreaded opening trainer
//!   ([`Trainer`](doe::Trainer)) coordinated through virtual loss
//!
//! ## Quick start
//!
//! ```ignore
//! use zermelo::engine::Engine;
//! use zermelo::negamax::Negamax;
//!
//! let mut game = MyGame::new();
//! let mut engine = Negamax::new();
//! engine.set_move_time(1_000);
//!
//! if let Some(best) = engine.compute_best_move(&mut game) {
//!     game.make_move(best);
//! }
//! ```
//!
//! ## Core modules
//!
//! - [`game`] - state machine and board snapshot contracts
//! - [`engine`] - the engine surface and search reports
//! - [`negamax`], [`mtdf`] - depth-first engines
//! - [`mcts`] - the best-first engine family
//! - [`doe`] - distributed opening expansion over a node store
//! - [`cache`] - transposition cache
//! - [`leaves`], [`roots`] - endgame and opening oracles
//! - [`hashing`], [`bitset`] - position hashing and packed records
//! - [`timer`] - cooperative countdowns
//! - [`bench`] - operation-counting decorators

pub mod bench;
pub mod bitset;
pub mod cache;
pub mod doe;
pub mod engine;
pub mod error;
pub mod game;
pub mod hashing;
pub mod leaves;
pub mod mcts;
pub mod mtdf;
pub mod negamax;
pub mod roots;
pub mod timer;

#[cfg(test)]
pub(crate) mod support;

pub use crate::engine::{Engine, Report};
pub use crate::error::Error;
pub use crate::game::{Board, Game, Side, DRAW_SCORE};
pub use crate::timer::Timer;
