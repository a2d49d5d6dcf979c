//! Multithreaded trainer over a persistent node store.

use std::marker::PhantomData;
use std::sync::mpsc;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::doe::node::{DoeNode, NIL_KEY, ROOT_KEY};
use crate::doe::store::Store;
use crate::error::Error;
use crate::game::{Game, Side, DRAW_SCORE};
use crate::timer::Timer;

/// Default exploration factor of the selection term.
const DEFAULT_EXPLORE_FACTOR: f64 = 0.707;

/// Default cap on the selection depth, in plies.
const DEFAULT_MAX_DEPTH: u8 = 254;

/// A position evaluation handed to the worker pool.
type Job<M> = (u64, Vec<M>);

/// Result of an evaluation, keyed by the evaluated node.
type Verdict = (u64, Result<i32, Error>);

/// UCT trainer persisting its tree to a key/value store.
///
/// The trainer thread owns the game and the store; a pool of workers
/// runs the scorer over root-to-node move paths. Virtual loss marks
/// branches with outstanding evaluations so consecutive expansions
/// spread over the tree instead of piling onto the freshest leaf.
pub struct Trainer<G: Game, S: Store<G::Move>> {
    store: S,
    timer: Timer,

    // Configuration
    explore_factor: f64,
    pool_size: usize,
    max_depth: u8,
    contempt: Option<i32>,
    infinity: Option<i32>,

    // Resolved per run
    max_score: i32,
    draw_score: i32,
    bias: f64,
    turn: Side,

    next_key: u64,

    _game: PhantomData<G>,
}

impl<G, S> Trainer<G, S>
where
    G: Game,
    G::Move: Send,
    S: Store<G::Move>,
{
    /// Creates a trainer over the given store with one worker per
    /// available CPU.
    pub fn new(store: S) -> Self {
        Self {
            store,
            timer: Timer::new(),
            explore_factor: DEFAULT_EXPLORE_FACTOR,
            pool_size: num_cpus::get().max(1),
            max_depth: DEFAULT_MAX_DEPTH,
            contempt: None,
            infinity: None,
            max_score: 0,
            draw_score: 0,
            bias: 0.0,
            turn: Side::South,
            next_key: ROOT_KEY + 1,
            _game: PhantomData,
        }
    }

    /// Sets the number of evaluation workers.
    pub fn set_pool_size(&mut self, pool_size: usize) {
        self.pool_size = pool_size.max(1);
    }

    /// Sets the cap on the selection depth, in plies.
    pub fn set_depth(&mut self, depth: u8) {
        self.max_depth = depth.max(1);
    }

    /// Sets the exploration factor of the selection term.
    pub fn set_explore_factor(&mut self, explore_factor: f64) {
        self.explore_factor = explore_factor;
    }

    /// Sets the score assigned to a true draw.
    pub fn set_contempt(&mut self, contempt: i32) {
        self.contempt = Some(contempt);
    }

    /// Sets the score ceiling used by the selection.
    pub fn set_infinity(&mut self, infinity: i32) {
        self.infinity = Some(infinity);
    }

    /// Countdown handle; an abort stops the run after the expansion in
    /// progress, letting in-flight evaluations land first.
    pub fn timer(&self) -> Timer {
        self.timer.clone()
    }

    /// Unwraps the trainer, handing the store back.
    pub fn into_store(mut self) -> S {
        let _ = self.store.close();
        self.store
    }

    fn configure(&mut self, game: &G) {
        self.max_score = self.infinity.unwrap_or_else(|| game.infinity());
        self.draw_score = self.contempt.unwrap_or_else(|| game.contempt());
        self.bias = self.explore_factor * f64::from(self.max_score);
        self.turn = game.turn();
    }

    /// Reads the unique root node, creating it on first use.
    ///
    /// Fails with [`Error::StateMismatch`] when the store was trained
    /// on a different position than the supplied game.
    pub fn root_node(&mut self, game: &G) -> Result<DoeNode<G::Move>, Error> {
        if let Some(node) = self.store.read(ROOT_KEY)? {
            if node.hash != game.hash() {
                return Err(Error::StateMismatch);
            }
            return Ok(node);
        }

        let mut node = DoeNode {
            key: ROOT_KEY,
            parent: NIL_KEY,
            child: NIL_KEY,
            sibling: NIL_KEY,
            hash: game.hash(),
            mv: None,
            turn: game.turn(),
            count: 0,
            score: 0.0,
            waiting: 0,
            evaluated: false,
            terminal: game.has_ended(),
            expanded: false,
            cursor: game.cursor(),
            moves: Vec::new(),
        };
        if node.terminal {
            node.score = self.exact_value(game.outcome(), node.turn);
            node.evaluated = true;
        }
        self.store.write(&node)?;
        Ok(node)
    }

    /// Runs `size` expansions, dispatching evaluations to the pool.
    ///
    /// Previously persisted nodes that never got their evaluation are
    /// re-enqueued first, so an interrupted run resumes where it
    /// stopped. A scorer failure aborts the run; everything already
    /// evaluated stays applied and the rest remains on disk unevaluated.
    pub fn train<F>(&mut self, game: &mut G, size: usize, scorer: F) -> Result<(), Error>
    where
        F: Fn(&[G::Move]) -> Result<i32, Error> + Send + Sync,
    {
        self.configure(game);
        self.root_node(game)?;
        let recovered = self.recover()?;

        let pool_size = self.pool_size;
        let scorer = &scorer;

        std::thread::scope(|scope| -> Result<(), Error> {
            let (job_tx, job_rx) = mpsc::channel::<Job<G::Move>>();
            let job_rx = Arc::new(Mutex::new(job_rx));
            let (verdict_tx, verdict_rx) = mpsc::channel::<Verdict>();

            for _ in 0..pool_size {
                let job_rx = Arc::clone(&job_rx);
                let verdict_tx = verdict_tx.clone();
                scope.spawn(move || loop {
                    let job = job_rx.lock().recv();
                    match job {
                        Ok((key, moves)) => {
                            let verdict = scorer(&moves);
                            if verdict_tx.send((key, verdict)).is_err() {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                });
            }
            drop(verdict_tx);

            let mut in_flight = 0usize;
            let mut failure: Option<Error> = None;

            for node in recovered {
                self.add_waiting(node.key)?;
                if job_tx.send((node.key, node.moves.clone())).is_ok() {
                    in_flight += 1;
                }
            }

            let mut remaining = size;
            'training: while remaining > 0 && failure.is_none() {
                if self.timer.aborted() {
                    break;
                }

                // Keep the pool busy without racing too far ahead of it.
                while in_flight >= pool_size {
                    match verdict_rx.recv() {
                        Ok(verdict) => {
                            in_flight -= 1;
                            if let Err(error) = self.apply_verdict(verdict) {
                                failure = Some(error);
                                break 'training;
                            }
                        }
                        Err(_) => break 'training,
                    }
                }
                while let Ok(verdict) = verdict_rx.try_recv() {
                    in_flight -= 1;
                    if let Err(error) = self.apply_verdict(verdict) {
                        failure = Some(error);
                        break 'training;
                    }
                }

                let selected = self.expand(game)?;
                remaining -= 1;

                for key in selected {
                    let node = self.read_node(key)?;
                    if node.evaluated {
                        self.backpropagate(key, node.score)?;
                    } else {
                        self.add_waiting(key)?;
                        if job_tx.send((key, node.moves.clone())).is_ok() {
                            in_flight += 1;
                        }
                    }
                }
            }

            // Shutdown: no new jobs; in-flight evaluations run to
            // completion and their results are applied.
            drop(job_tx);
            while in_flight > 0 {
                match verdict_rx.recv() {
                    Ok(verdict) => {
                        in_flight -= 1;
                        match self.apply_verdict(verdict) {
                            Ok(()) => {}
                            Err(error) if failure.is_none() => failure = Some(error),
                            Err(_) => {}
                        }
                    }
                    Err(_) => break,
                }
            }

            match failure {
                Some(error) => Err(error),
                None => Ok(()),
            }
        })?;

        self.store.close()
    }

    /// Scans the store, resetting stale virtual losses and collecting
    /// the nodes whose evaluation never landed.
    fn recover(&mut self) -> Result<Vec<DoeNode<G::Move>>, Error> {
        let mut pending = Vec::new();
        let mut max_key = ROOT_KEY;

        for mut node in self.store.values()? {
            max_key = max_key.max(node.key);
            if node.waiting != 0 {
                node.waiting = 0;
                self.store.write(&node)?;
            }
            if !node.evaluated && !node.terminal {
                pending.push(node);
            }
        }

        self.next_key = max_key + 1;
        Ok(pending)
    }

    /// One selection descent from the root.
    ///
    /// Ends at the first unexpanded node, whose children are created
    /// and returned for evaluation, or at a terminal or depth-capped
    /// node, which is returned alone.
    fn expand(&mut self, game: &mut G) -> Result<Vec<u64>, Error> {
        let mut key = ROOT_KEY;
        let mut made = 0usize;
        let selected;

        loop {
            let node = self.read_node(key)?;

            if node.terminal || made >= usize::from(self.max_depth) {
                selected = vec![key];
                break;
            }

            if !node.expanded {
                selected = self.expand_children(game, node)?;
                break;
            }

            let next = self.select_child(&node)?;
            let child = self.read_node(next)?;
            game.make_move(child.mv.expect("child without a move"));
            made += 1;
            key = next;
        }

        game.unmake_moves(made);
        Ok(selected)
    }

    /// Creates every child of an unexpanded node the game sits on.
    fn expand_children(
        &mut self,
        game: &mut G,
        mut node: DoeNode<G::Move>,
    ) -> Result<Vec<u64>, Error> {
        let mut children = Vec::new();

        game.set_cursor(node.cursor);
        while let Some(mv) = game.next_move() {
            game.make_move(mv);

            let mut moves = node.moves.clone();
            moves.push(mv);
            let mut child = DoeNode {
                key: self.allocate_key(),
                parent: node.key,
                child: NIL_KEY,
                sibling: NIL_KEY,
                hash: game.hash(),
                mv: Some(mv),
                turn: game.turn(),
                count: 0,
                score: 0.0,
                waiting: 0,
                evaluated: false,
                terminal: game.has_ended(),
                expanded: false,
                cursor: game.cursor(),
                moves,
            };
            if child.terminal {
                child.score = self.exact_value(game.outcome(), child.turn);
                child.evaluated = true;
            }

            game.unmake_move();
            children.push(child);
        }

        node.cursor = game.cursor();
        node.expanded = true;

        if children.is_empty() {
            node.terminal = true;
            node.score = self.exact_value(game.outcome(), node.turn);
            node.evaluated = true;
            self.store.write(&node)?;
            return Ok(vec![node.key]);
        }

        for index in 0..children.len() - 1 {
            children[index].sibling = children[index + 1].key;
        }
        node.child = children[0].key;
        self.store.write(&node)?;

        let mut keys = Vec::with_capacity(children.len());
        for child in &children {
            self.store.write(child)?;
            keys.push(child.key);
        }
        Ok(keys)
    }

    /// Child with the minimum virtual-loss-adjusted priority.
    fn select_child(&mut self, node: &DoeNode<G::Move>) -> Result<u64, Error> {
        let parent_count = node.count.max(1);
        let mut best = NIL_KEY;
        let mut best_priority = f64::INFINITY;

        let mut key = node.child;
        while key != NIL_KEY {
            let child = self.read_node(key)?;
            let priority = self.priority(&child, parent_count);
            if priority < best_priority {
                best_priority = priority;
                best = child.key;
            }
            key = child.sibling;
        }

        if best == NIL_KEY {
            return Err(Error::Store("expanded node without children".to_string()));
        }
        Ok(best)
    }

    /// Selection priority of a child under virtual loss.
    ///
    /// Each outstanding evaluation counts as one pessimistic sample at
    /// the score ceiling of the child's own mover losing appeal, folded
    /// in with the same running-mean update real samples use.
    fn priority(&self, child: &DoeNode<G::Move>, parent_count: u32) -> f64 {
        let mut score = child.score;
        let mut count = f64::from(child.count);
        let sample = f64::from(self.max_score);

        for _ in 0..child.waiting {
            count += 1.0;
            score += (sample - score) / count;
        }

        if count == 0.0 {
            return f64::NEG_INFINITY;
        }
        score - self.bias * (f64::from(parent_count).ln() / count).sqrt()
    }

    /// Applies a worker verdict: marks the node evaluated, releases the
    /// virtual loss and backs the sample up the stored tree.
    fn apply_verdict(&mut self, (key, verdict): Verdict) -> Result<(), Error> {
        let score = verdict?;

        let mut node = self.read_node(key)?;
        node.evaluated = true;
        let value = f64::from(score * node.turn.sign());
        self.store.write(&node)?;

        self.remove_waiting(key)?;
        self.backpropagate(key, value)
    }

    /// Increments the virtual-loss counter from a node up to the root.
    fn add_waiting(&mut self, key: u64) -> Result<(), Error> {
        let mut key = key;
        while let Some(mut node) = self.store.read(key)? {
            node.waiting += 1;
            key = node.parent;
            self.store.write(&node)?;
        }
        Ok(())
    }

    /// Decrements the virtual-loss counter from a node up to the root.
    fn remove_waiting(&mut self, key: u64) -> Result<(), Error> {
        let mut key = key;
        while let Some(mut node) = self.store.read(key)? {
            node.waiting = node.waiting.saturating_sub(1);
            key = node.parent;
            self.store.write(&node)?;
        }
        Ok(())
    }

    /// Backs a sample up the parent chain, negating at every level.
    /// The chain ends at the first key that does not resolve.
    fn backpropagate(&mut self, key: u64, value: f64) -> Result<(), Error> {
        let mut key = key;
        let mut value = value;

        while let Some(mut node) = self.store.read(key)? {
            node.update_score(value);
            key = node.parent;
            self.store.write(&node)?;
            value = -value;
        }
        Ok(())
    }

    /// Exact value of an ended position from its mover's view, with the
    /// contempt substitution for true draws.
    fn exact_value(&self, outcome: i32, turn: Side) -> f64 {
        if outcome == DRAW_SCORE {
            f64::from(self.draw_score * self.turn.sign())
        } else {
            f64::from(outcome * turn.sign())
        }
    }

    fn allocate_key(&mut self) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    fn read_node(&mut self, key: u64) -> Result<DoeNode<G::Move>, Error> {
        self.store
            .read(key)?
            .ok_or_else(|| Error::Store(format!("missing node {key}")))
    }
}
