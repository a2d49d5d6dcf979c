//! End-to-end search scenarios on the tic-tac-toe driver.

mod common;

use common::{TicTacToe, MAX_SCORE};
use zermelo::engine::Engine;
use zermelo::game::Game;
use zermelo::mcts::{Montecarlo, Uct};
use zermelo::mtdf::Mtdf;
use zermelo::negamax::{Negamax, MIN_DEPTH};

/// South mates in three plies: both 3 and 6 build a double threat.
const MATE_IN_THREE: &str = "XO..X...O S";

/// Every South move loses on the next ply; North owns three threats.
const LOST_IN_TWO: &str = "O.OXOX.X. S";

fn negamax(depth: u8) -> Negamax<TicTacToe> {
    let mut engine = Negamax::new();
    engine.set_depth(depth);
    engine.set_move_time(60_000);
    engine
}

fn mtdf(depth: u8) -> Mtdf<TicTacToe> {
    let mut engine = Mtdf::new();
    engine.set_depth(depth);
    engine.set_move_time(60_000);
    engine
}

#[test]
fn test_perfect_play_draws_the_empty_board() {
    let mut game = TicTacToe::new();
    let mut engine = negamax(9);

    let score = engine.compute_best_score(&mut game);
    assert_eq!(score, 0);
    assert_eq!(game.length(), 0);
}

#[test]
fn test_negamax_finds_the_forced_win() {
    let mut game = TicTacToe::from_diagram(MATE_IN_THREE).unwrap();
    let mut engine = negamax(9);

    let best = engine.compute_best_move(&mut game).unwrap();
    let score = engine.compute_best_score(&mut game);

    assert!(best == 3 || best == 6, "not a double threat: {best}");
    assert_eq!(score, MAX_SCORE);
}

#[test]
fn test_every_engine_sees_the_forced_loss() {
    let mut game = TicTacToe::from_diagram(LOST_IN_TWO).unwrap();

    let mut negamax = negamax(9);
    assert_eq!(negamax.compute_best_score(&mut game), -MAX_SCORE);

    let mut mtdf = mtdf(9);
    assert_eq!(mtdf.compute_best_score(&mut game), -MAX_SCORE);

    let mut uct = Uct::new();
    uct.set_move_time(30_000);
    assert_eq!(uct.compute_best_score(&mut game), -MAX_SCORE);
}

#[test]
fn test_uct_proves_the_forced_win() {
    let mut game = TicTacToe::from_diagram(MATE_IN_THREE).unwrap();
    let mut engine = Uct::new();
    engine.set_move_time(30_000);

    let best = engine.compute_best_move(&mut game).unwrap();
    let score = engine.compute_best_score(&mut game);

    assert!(best == 3 || best == 6, "not a double threat: {best}");
    assert_eq!(score, MAX_SCORE);
}

#[test]
fn test_montecarlo_avoids_the_immediate_blunder() {
    // South completes the top row on the spot; blocking the middle row
    // instead is the only other move a noisy playout could defend.
    let mut game = TicTacToe::from_diagram("XX.OO.... S").unwrap();
    let mut engine = Montecarlo::new();
    engine.set_move_time(2_000);

    let best = engine.compute_best_move(&mut game).unwrap();
    assert!(best == 2 || best == 5, "played {best}");
}

#[test]
fn test_mtdf_matches_negamax_scores() {
    let diagrams = [
        "......... S",
        MATE_IN_THREE,
        LOST_IN_TWO,
        "X...O...X N",
        "XOX.O...X N",
    ];

    for diagram in diagrams {
        let mut game = TicTacToe::from_diagram(diagram).unwrap();
        let full = negamax(9).compute_best_score(&mut game);
        let zero = mtdf(9).compute_best_score(&mut game);
        assert_eq!(full, zero, "diverged on {diagram}");
    }
}

#[test]
fn test_aborted_search_returns_the_last_iteration() {
    let mut game = TicTacToe::new();
    let mut engine = negamax(9);

    // The countdown expired before the search even starts; only the
    // non-abortable first iteration runs.
    engine.timer().abort_computation(0);
    let best = engine.compute_best_move(&mut game);

    assert!(best.is_some());
    assert!(game.is_legal(best.unwrap()));
    assert!(engine.timer().aborted());
}

#[test]
fn test_deep_search_respects_a_small_budget() {
    let mut game = TicTacToe::new();
    let mut engine = Negamax::new();
    engine.set_depth(9);
    engine.set_move_time(10);

    let start = std::time::Instant::now();
    let best = engine.compute_best_move(&mut game);

    assert!(best.is_some());
    // Generous bound: the point is that the search does not run to the
    // full depth-9 budget regardless of the clock.
    assert!(start.elapsed().as_millis() < 2_000);
}

#[test]
fn test_negamax_reports_progress() {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    let reports = Arc::new(AtomicU32::new(0));
    let seen = Arc::clone(&reports);

    let mut game = TicTacToe::new();
    let mut engine = negamax(9);
    engine.attach(Box::new(move |report| {
        assert!(report.depth >= MIN_DEPTH);
        assert!(!report.pv.is_empty());
        seen.fetch_add(1, Ordering::Relaxed);
    }));

    engine.compute_best_move(&mut game);
    assert!(reports.load(Ordering::Relaxed) >= 2);
}

#[test]
fn test_engines_decline_finished_games() {
    let mut game = TicTacToe::from_diagram("XXXOO.... N").unwrap();

    assert!(negamax(9).compute_best_move(&mut game).is_none());
    assert!(mtdf(9).compute_best_move(&mut game).is_none());
    assert!(Uct::<TicTacToe>::new().compute_best_move(&mut game).is_none());
}

#[test]
fn test_uct_reuses_its_tree_between_moves() {
    let mut game = TicTacToe::new();
    let mut engine = Uct::new();
    engine.set_move_time(200);

    let first = engine.compute_best_move(&mut game).unwrap();
    game.make_move(first);
    let reply = game.legal_moves()[0];
    game.make_move(reply);

    // The new root is a grandchild of the previous one.
    let best = engine.compute_best_move(&mut game);
    assert!(best.is_some());
    assert!(game.is_legal(best.unwrap()));

    game.unmake_moves(2);
}

#[test]
fn test_ponder_move_follows_the_principal_variation() {
    let mut game = TicTacToe::from_diagram(MATE_IN_THREE).unwrap();
    let mut engine = negamax(9);

    let best = engine.compute_best_move(&mut game).unwrap();
    game.make_move(best);

    if let Some(ponder) = engine.ponder_move(&mut game) {
        assert!(game.is_legal(ponder));
    }
    game.unmake_move();
}
