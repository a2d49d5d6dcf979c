//! Cooperative countdown timer shared between a search and its driver.
//!
//! Searches never get preempted. They poll [`Timer::aborted`] at iteration
//! boundaries and inside the recursive descent, and unwind on their own
//! once the deadline has passed. The handle is cloneable so a protocol
//! thread can retarget or cancel the countdown of a running search, for
//! instance to convert ponder time into search time on a ponder hit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

struct TimerState {
    deadline: Mutex<Option<Instant>>,
    triggered: AtomicBool,
}

/// Cloneable handle to a cooperative countdown.
#[derive(Clone)]
pub struct Timer {
    state: Arc<TimerState>,
}

impl Timer {
    /// Creates a timer with no scheduled countdown.
    pub fn new() -> Self {
        Self {
            state: Arc::new(TimerState {
                deadline: Mutex::new(None),
                triggered: AtomicBool::new(false),
            }),
        }
    }

    /// Starts a countdown of `millis` milliseconds from now.
    ///
    /// Clears any previous abort signal. A zero or negative remaining
    /// budget makes [`aborted`](Timer::aborted) report true immediately.
    pub fn schedule_count_down(&self, millis: u64) {
        let mut deadline = self.state.deadline.lock();
        *deadline = Some(Instant::now() + Duration::from_millis(millis));
        self.state.triggered.store(false, Ordering::Release);
    }

    /// Retargets the deadline to `millis` milliseconds from now.
    ///
    /// With `millis == 0` the computation is asked to abort right away.
    pub fn abort_computation(&self, millis: u64) {
        if millis == 0 {
            self.state.triggered.store(true, Ordering::Release);
            return;
        }
        let mut deadline = self.state.deadline.lock();
        *deadline = Some(Instant::now() + Duration::from_millis(millis));
        self.state.triggered.store(false, Ordering::Release);
    }

    /// Clears the deadline and the abort signal.
    pub fn cancel_count_down(&self) {
        let mut deadline = self.state.deadline.lock();
        *deadline = None;
        self.state.triggered.store(false, Ordering::Release);
    }

    /// Checks whether the computation should stop.
    ///
    /// Latches once the deadline passes, so repeated polls stay cheap
    /// after the first positive answer.
    pub fn aborted(&self) -> bool {
        if self.state.triggered.load(Ordering::Acquire) {
            return true;
        }
        let deadline = self.state.deadline.lock();
        match *deadline {
            Some(instant) if Instant::now() >= instant => {
                self.state.triggered.store(true, Ordering::Release);
                true
            }
            _ => false,
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
