//! Generic driver of the Monte-Carlo engine family.

use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::cache::Flag;
use crate::engine::{Engine, Report, ReportConsumer, DEFAULT_MOVE_TIME};
use crate::game::{Game, Side, DRAW_SCORE};
use crate::leaves::{Leaves, NullLeaves};
use crate::mcts::tree::{Node, NodeId, Tree};
use crate::mcts::Policy;
use crate::timer::Timer;

/// Default exploration factor of the UCB1 term.
const DEFAULT_EXPLORE_FACTOR: f64 = 0.707;

/// Default ceiling on live tree nodes.
const DEFAULT_MAX_NODES: usize = 1 << 20;

/// Default cap on the descent and playout depth, in plies.
const DEFAULT_MAX_DEPTH: u8 = 254;

/// Subtrees detached per pruning pass when the node ceiling is hit.
/// Victims sit deep on the worst line and shed few nodes each, so the
/// budget outpaces the nodes appended between two pruning checks.
const PRUNE_ROUNDS: usize = 256;

/// The timer and the reporting clock are polled once per this many
/// iterations.
const POLL_MASK: u64 = 0x3F;

/// Minimum time between two reports.
const REPORT_INTERVAL: Duration = Duration::from_millis(1_000);

/// Score movement, in engine units, that makes a report worth emitting
/// even when the best move did not change.
const REPORT_THRESHOLD: i32 = 5;

/// How far below the previous root the tree is searched when a new
/// search tries to reuse the existing tree.
const REUSE_DEPTH: u32 = 2;

/// Best-first search engine parameterized by a selection policy.
pub struct Mcts<G: Game, P: Policy<G>> {
    policy: P,
    tree: Tree<G::Move>,
    root: Option<NodeId>,
    leaves: Box<dyn Leaves<G>>,
    timer: Timer,
    consumers: Vec<ReportConsumer<G::Move>>,
    rng: SmallRng,

    // Configuration
    explore_factor: f64,
    move_time: u64,
    max_depth: u8,
    max_nodes: usize,
    contempt: Option<i32>,
    infinity: Option<i32>,

    // Resolved per search
    max_score: i32,
    draw_score: i32,
    bias: f64,
    turn: Side,

    // Search state
    iterations: u64,
    peak_depth: u8,
    last_report: Instant,
    reported_move: Option<G::Move>,
    reported_score: i32,
}

impl<G: Game, P: Policy<G>> Mcts<G, P> {
    /// Creates an engine with the policy's defaults and no endgame
    /// database.
    pub fn new() -> Self {
        Self {
            policy: P::default(),
            tree: Tree::new(),
            root: None,
            leaves: Box::new(NullLeaves),
            timer: Timer::new(),
            consumers: Vec::new(),
            rng: SmallRng::from_entropy(),
            explore_factor: DEFAULT_EXPLORE_FACTOR,
            move_time: DEFAULT_MOVE_TIME,
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
            contempt: None,
            infinity: None,
            max_score: 0,
            draw_score: 0,
            bias: 0.0,
            turn: Side::South,
            iterations: 0,
            peak_depth: 0,
            last_report: Instant::now(),
            reported_move: None,
            reported_score: 0,
        }
    }

    /// Replaces the endgame oracle.
    pub fn set_leaves(&mut self, leaves: Box<dyn Leaves<G>>) {
        self.leaves = leaves;
    }

    /// Sets the exploration factor of the selection term.
    pub fn set_explore_factor(&mut self, explore_factor: f64) {
        self.explore_factor = explore_factor;
    }

    /// Bounds the number of live tree nodes; the tree is pruned of its
    /// least promising subtrees whenever the ceiling is crossed.
    pub fn set_max_nodes(&mut self, max_nodes: usize) {
        self.max_nodes = max_nodes.max(2);
    }

    /// Iterations performed by the last search.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Live nodes currently held by the search tree.
    pub fn tree_size(&self) -> usize {
        self.tree.len()
    }

    fn configure(&mut self, game: &G) {
        self.max_score = self.infinity.unwrap_or_else(|| game.infinity());
        self.draw_score = self.contempt.unwrap_or_else(|| game.contempt());
        self.bias = self.explore_factor * f64::from(self.max_score);
        self.turn = game.turn();
    }

    /// Binds the engine root to the game's current position, reusing a
    /// matching node near the previous root when one exists.
    fn ensure_root(&mut self, game: &G) {
        if let Some(old_root) = self.root {
            if let Some(found) = self.tree.find(old_root, game.hash(), REUSE_DEPTH) {
                if found != old_root {
                    self.tree.reroot(old_root, found);
                }
                self.root = Some(found);
                return;
            }
        }

        self.tree.clear();
        let root = Node::new(None, game.hash(), game.turn(), game.has_ended(), game.cursor());
        self.root = Some(self.tree.alloc(root));
    }

    /// One expansion: descend to a leaf, grow it by one child, score the
    /// child and back the value up the path.
    fn search_iteration(&mut self, game: &mut G) {
        let mut id = self.root.expect("search without a root");
        let mut made = 0usize;

        loop {
            if self.tree.get(id).proven {
                let value = self.tree.get(id).score;
                self.backpropagate(id, value);
                break;
            }

            if self.tree.get(id).terminal {
                let value = self.evaluate(game, id);
                self.backpropagate(id, value);
                break;
            }

            if made >= usize::from(self.max_depth) {
                let value = f64::from(game.score() * self.tree.get(id).turn.sign());
                self.backpropagate(id, value);
                break;
            }

            if !self.tree.get(id).expanded {
                game.set_cursor(self.tree.get(id).cursor);
                match game.next_move() {
                    Some(mv) => {
                        self.tree.get_mut(id).cursor = game.cursor();
                        game.make_move(mv);
                        made += 1;
                        let child = self.append_child(id, mv, game);
                        let value = self.evaluate(game, child);
                        self.backpropagate(child, value);
                        break;
                    }
                    None => {
                        self.tree.get_mut(id).expanded = true;
                        if self.tree.get(id).child.is_none() {
                            // A position without moves ends the match.
                            self.tree.get_mut(id).terminal = true;
                            continue;
                        }
                    }
                }
            }

            match self.select_child(id) {
                Some(next) => {
                    let mv = self.tree.get(next).mv.expect("child without a move");
                    game.make_move(mv);
                    made += 1;
                    id = next;
                }
                None => break,
            }
        }

        if made as u64 > u64::from(self.peak_depth) {
            self.peak_depth = made.min(usize::from(u8::MAX)) as u8;
        }
        game.unmake_moves(made);
    }

    /// Appends a child for the position the game currently sits on.
    fn append_child(&mut self, parent: NodeId, mv: G::Move, game: &G) -> NodeId {
        let node = Node::new(Some(mv), game.hash(), game.turn(), game.has_ended(), game.cursor());
        let id = self.tree.alloc(node);
        self.tree.add_child(parent, id);
        id
    }

    /// Scores a leaf from the point of view of its own mover.
    ///
    /// Terminal positions settle to their exact outcome and start a
    /// proof propagation; known draws take the contempt score, oriented
    /// by the engine's root side.
    fn evaluate(&mut self, game: &mut G, id: NodeId) -> f64 {
        let sign = self.tree.get(id).turn.sign();
        let max_score = f64::from(self.max_score);

        let value = if self.tree.get(id).terminal {
            let outcome = self.policy.adjust_outcome(game.outcome(), self.max_score);
            let value = if outcome == DRAW_SCORE {
                f64::from(self.draw_score * self.turn.sign())
            } else {
                f64::from(outcome * sign)
            };
            self.tree.settle(id, value);
            if value.abs() == max_score {
                self.tree.propagate_proof(id, max_score);
            }
            value
        } else if self.leaves.find(game) {
            let score = self.leaves.score();
            if score == DRAW_SCORE && self.leaves.flag() == Flag::Exact {
                f64::from(self.draw_score * self.turn.sign())
            } else {
                f64::from(score)
            }
        } else {
            f64::from(self.policy.simulate(game, self.max_depth, &mut self.rng) * sign)
        };

        let bias = self.policy.child_bias(self.explore_factor, value);
        self.tree.get_mut(id).bias = bias;
        value
    }

    /// Backs a sample up the parent chain, negating at every level.
    fn backpropagate(&mut self, id: NodeId, value: f64) {
        let mut current = Some(id);
        let mut value = value;
        while let Some(node) = current {
            if self.tree.get(node).proven {
                self.tree.visit(node);
            } else {
                self.tree.update_score(node, value);
            }
            current = self.tree.get(node).parent;
            value = -value;
        }
    }

    /// Child with the minimum selection priority.
    fn select_child(&self, parent: NodeId) -> Option<NodeId> {
        let parent_count = self.tree.get(parent).count.max(1);
        let mut best = None;
        let mut best_priority = f64::INFINITY;

        for child in self.tree.children(parent) {
            let node = self.tree.get(child);
            let priority = self.policy.priority(node, parent_count, self.bias);
            if priority < best_priority {
                best_priority = priority;
                best = Some(child);
            }
        }
        best
    }

    /// Child with the minimum secure score.
    ///
    /// The secure score discounts lightly sampled optimism, so a well
    /// supported near-optimal child beats a barely visited one that
    /// merely looks better.
    fn secure_child(&self, parent: NodeId) -> Option<NodeId> {
        let max_score = f64::from(self.max_score);
        let mut best = None;
        let mut best_secure = f64::INFINITY;

        for child in self.tree.children(parent) {
            let node = self.tree.get(child);
            if node.count == 0 {
                continue;
            }
            let secure = node.score + max_score / f64::from(node.count).sqrt();
            if secure < best_secure {
                best_secure = secure;
                best = Some(child);
            }
        }
        best
    }

    /// Detaches the least promising expanded subtrees until the node
    /// count falls back under the ceiling, a bounded number per call.
    /// The root and the nodes on the active descent are never touched;
    /// pruning runs between iterations, when no descent is active.
    fn prune_if_needed(&mut self) {
        for _ in 0..PRUNE_ROUNDS {
            if self.tree.len() <= self.max_nodes {
                break;
            }
            let Some(victim) = self.worst_expanded() else { break };
            self.tree.release_children(victim);
            let node = self.tree.get_mut(victim);
            node.expanded = false;
            node.cursor = node.start;
        }
    }

    /// Deepest node on the walk that always follows the child its
    /// parent likes least among the expanded ones.
    fn worst_expanded(&self) -> Option<NodeId> {
        let root = self.root?;
        let mut id = root;
        let mut victim = None;

        loop {
            let mut worst = None;
            let mut worst_score = f64::NEG_INFINITY;
            for child in self.tree.children(id) {
                let node = self.tree.get(child);
                if node.expanded && node.score > worst_score {
                    worst_score = node.score;
                    worst = Some(child);
                }
            }
            match worst {
                Some(next) => {
                    victim = Some(next);
                    id = next;
                }
                None => break,
            }
        }
        victim
    }

    /// Expected continuation along the secure children.
    fn principal_variation(&self, root: NodeId) -> Vec<G::Move> {
        let mut pv = Vec::new();
        let mut id = root;
        for _ in 0..self.max_depth {
            match self.secure_child(id) {
                Some(child) => {
                    pv.push(self.tree.get(child).mv.expect("child without a move"));
                    id = child;
                }
                None => break,
            }
        }
        pv
    }

    /// South-view score of a root child.
    fn child_score(&self, child: NodeId) -> i32 {
        let node = self.tree.get(child);
        (node.score.round() as i32) * node.turn.sign()
    }

    /// Emits a report when the interval elapsed and something moved.
    fn maybe_report(&mut self) {
        if self.consumers.is_empty() || self.last_report.elapsed() < REPORT_INTERVAL {
            return;
        }
        self.last_report = Instant::now();

        let Some(root) = self.root else { return };
        let Some(best) = self.secure_child(root) else { return };

        let mv = self.tree.get(best).mv;
        let score = self.child_score(best);
        let moved = (score - self.reported_score).abs() > REPORT_THRESHOLD;

        if mv != self.reported_move || moved {
            self.emit_report(root, mv, score);
        }
    }

    fn emit_report(&mut self, root: NodeId, mv: Option<G::Move>, score: i32) {
        self.reported_move = mv;
        self.reported_score = score;

        let report = Report {
            best_move: mv,
            score,
            depth: self.peak_depth,
            nodes: self.iterations,
            pv: self.principal_variation(root),
        };
        for consumer in &mut self.consumers {
            consumer(&report);
        }
    }
}

impl<G: Game, P: Policy<G>> Default for Mcts<G, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Game, P: Policy<G>> Engine<G> for Mcts<G, P> {
    fn set_contempt(&mut self, contempt: i32) {
        self.contempt = Some(contempt);
    }

    fn set_infinity(&mut self, infinity: i32) {
        self.infinity = Some(infinity);
    }

    fn set_move_time(&mut self, millis: u64) {
        self.move_time = millis;
    }

    fn set_depth(&mut self, depth: u8) {
        self.max_depth = depth.max(1);
    }

    fn new_match(&mut self) {
        self.tree.clear();
        self.root = None;
        self.timer.cancel_count_down();
        self.iterations = 0;
        self.peak_depth = 0;
        self.reported_move = None;
        self.reported_score = 0;
    }

    fn compute_best_move(&mut self, game: &mut G) -> Option<G::Move> {
        if game.has_ended() {
            return None;
        }

        self.configure(game);
        self.timer.schedule_count_down(self.move_time);
        self.ensure_root(game);

        let root = self.root.expect("root was just bound");
        self.iterations = 0;
        self.peak_depth = 0;
        self.last_report = Instant::now();

        while !self.tree.get(root).proven {
            self.search_iteration(game);
            self.iterations += 1;

            if self.iterations & POLL_MASK == 0 {
                if self.timer.aborted() {
                    break;
                }
                self.prune_if_needed();
                self.maybe_report();
            }
        }

        let best = self.secure_child(root);
        if let Some(best) = best {
            let mv = self.tree.get(best).mv;
            let score = self.child_score(best);
            if !self.consumers.is_empty() {
                self.emit_report(root, mv, score);
            }
        }

        self.timer.cancel_count_down();
        best.map(|id| self.tree.get(id).mv.expect("child without a move"))
    }

    fn compute_best_score(&mut self, game: &mut G) -> i32 {
        if game.has_ended() {
            self.configure(game);
            let outcome = game.outcome();
            return if outcome == DRAW_SCORE { self.draw_score } else { outcome };
        }

        self.compute_best_move(game);
        let root = self.root.expect("root was just bound");
        (self.tree.get(root).score.round() as i32) * self.turn.sign()
    }

    fn ponder_move(&mut self, game: &mut G) -> Option<G::Move> {
        let root = self.root?;
        let node = self.tree.find(root, game.hash(), REUSE_DEPTH)?;
        let best = self.secure_child(node)?;
        self.tree.get(best).mv.filter(|&mv| game.is_legal(mv))
    }

    fn timer(&self) -> Timer {
        self.timer.clone()
    }

    fn attach(&mut self, consumer: ReportConsumer<G::Move>) {
        self.consumers.push(consumer);
    }
}
