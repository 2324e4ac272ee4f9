//! # Scheduled Continuations
//!
//! Deferred work measured in simulation ticks. Continuations are plain data
//! run by [`GameState::tick`](crate::GameState::tick) on the simulation thread,
//! so they never race with state mutation and can be cancelled at any time.

use serde::{Deserialize, Serialize};

/// Identifier returned by [`Scheduler::schedule`].
pub type TaskId = u64;

/// Work a scheduled task performs when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Continuation {
    /// Level-up check and return to exploration after a won battle
    FinishVictory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ScheduledTask {
    id: TaskId,
    due_tick: u64,
    continuation: Continuation,
}

/// Tick-driven queue of pending continuations.
///
/// # Examples
///
/// ```
/// use drapon::{Continuation, Scheduler};
///
/// let mut scheduler = Scheduler::new();
/// scheduler.schedule(0, 2, Continuation::FinishVictory);
/// assert!(scheduler.take_due(1).is_empty());
/// assert_eq!(scheduler.take_due(2), vec![Continuation::FinishVictory]);
/// assert!(scheduler.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheduler {
    next_id: TaskId,
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `continuation` to fire `delay` ticks after `now`.
    pub fn schedule(&mut self, now: u64, delay: u64, continuation: Continuation) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push(ScheduledTask {
            id,
            due_tick: now.saturating_add(delay),
            continuation,
        });
        id
    }

    /// Drops a pending task. Returns `false` if it already fired or never existed.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    /// Drops every pending task.
    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    /// Whether a continuation of this kind is waiting.
    pub fn is_pending(&self, continuation: Continuation) -> bool {
        self.tasks.iter().any(|task| task.continuation == continuation)
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Removes and returns every continuation due at or before `tick`, oldest first.
    pub fn take_due(&mut self, tick: u64) -> Vec<Continuation> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.tasks)
            .into_iter()
            .partition(|task| task.due_tick <= tick);
        self.tasks = pending;
        due.sort_by_key(|task| (task.due_tick, task.id));
        due.into_iter().map(|task| task.continuation).collect()
    }
}
