#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Logical clock with cancellable one-shot and repeating timers.
//!
//! The queue never consults a wall clock. Callers advance it by the frame's
//! delta time and receive every timer whose trigger time fell inside the
//! advanced window, ordered by trigger time and then by scheduling order.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
    time::Duration,
};

/// Shortest period accepted for repeating timers.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle identifying a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Timer that elapsed during [`TimerQueue::advance`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fired<T> {
    /// Handle of the timer that fired.
    pub id: TimerId,
    /// Logical time at which the timer was due.
    pub at: Duration,
    /// Payload supplied when the timer was scheduled.
    pub payload: T,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct HeapEntry {
    due: Duration,
    sequence: u64,
    id: TimerId,
}

#[derive(Debug)]
struct Pending<T> {
    payload: T,
    period: Option<Duration>,
}

/// Min-heap of timers keyed by logical trigger time.
#[derive(Debug)]
pub struct TimerQueue<T> {
    now: Duration,
    next_id: u64,
    next_sequence: u64,
    heap: BinaryHeap<Reverse<HeapEntry>>,
    pending: HashMap<TimerId, Pending<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            next_sequence: 0,
            heap: BinaryHeap::new(),
            pending: HashMap::new(),
        }
    }
}

impl<T: Clone> TimerQueue<T> {
    /// Creates an empty queue whose clock reads zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current logical time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Schedules `payload` to fire once after `delay`.
    pub fn schedule(&mut self, delay: Duration, payload: T) -> TimerId {
        self.insert(delay, payload, None)
    }

    /// Schedules `payload` to fire every `period`, starting one period from now.
    pub fn schedule_repeating(&mut self, period: Duration, payload: T) -> TimerId {
        let period = period.max(MIN_PERIOD);
        self.insert(period, payload, Some(period))
    }

    /// Cancels a timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let removed = self.pending.remove(&id).is_some();
        if removed {
            tracing::trace!(timer = id.get(), "timer cancelled");
        }
        removed
    }

    /// Reports whether the timer is still waiting to fire.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Number of timers still waiting to fire.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Reports whether no timers are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Cancels every timer and rewinds the clock to zero.
    pub fn reset(&mut self) {
        self.heap.clear();
        self.pending.clear();
        self.now = Duration::ZERO;
    }

    /// Moves the clock forward by `dt`, appending every elapsed timer to `out`.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<Fired<T>>) {
        let target = self.now.saturating_add(dt);

        while let Some(Reverse(entry)) = self.heap.peek().copied() {
            if entry.due > target {
                break;
            }
            let _ = self.heap.pop();

            let Some(pending) = self.pending.get(&entry.id) else {
                continue;
            };
            let period = pending.period;
            self.now = entry.due;

            match period {
                Some(period) => {
                    let payload = pending.payload.clone();
                    self.push_entry(entry.due.saturating_add(period), entry.id);
                    out.push(Fired {
                        id: entry.id,
                        at: entry.due,
                        payload,
                    });
                }
                None => {
                    if let Some(pending) = self.pending.remove(&entry.id) {
                        out.push(Fired {
                            id: entry.id,
                            at: entry.due,
                            payload: pending.payload,
                        });
                    }
                }
            }
        }

        self.now = target;
    }

    fn insert(&mut self, delay: Duration, payload: T, period: Option<Duration>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let _ = self.pending.insert(id, Pending { payload, period });
        self.push_entry(self.now.saturating_add(delay), id);
        id
    }

    fn push_entry(&mut self, due: Duration, id: TimerId) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(Reverse(HeapEntry { due, sequence, id }));
    }
}
