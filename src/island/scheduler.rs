//! Cancelable deferred actions for the main thread.
//!
//! Nothing here spawns threads or timers. The event loop asks
//! [`DeferredQueue::next_deadline`] how long it may sleep and calls
//! [`DeferredQueue::drain_due`] when it wakes up.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Cancellation handle for one scheduled action.
#[derive(Debug, Clone, Default)]
pub struct TaskHandle {
    cancelled: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

struct Scheduled<A> {
    due: Instant,
    seq: u64,
    handle: TaskHandle,
    action: A,
}

/// Queue of actions waiting for their deadline.
pub struct DeferredQueue<A> {
    tasks: Vec<Scheduled<A>>,
    next_seq: u64,
}

impl<A> Default for DeferredQueue<A> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<A> DeferredQueue<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, action: A) -> TaskHandle {
        let handle = TaskHandle::default();
        self.tasks.push(Scheduled {
            due: now + delay,
            seq: self.next_seq,
            handle: handle.clone(),
            action,
        });
        self.next_seq += 1;
        handle
    }

    /// Removes and returns every due action that was not canceled, earliest
    /// first, each with its handle. Canceled entries are dropped whether due
    /// or not. Applying one action can cancel a later one in the same batch,
    /// so callers check the handle again before applying.
    pub fn drain_due(&mut self, now: Instant) -> Vec<(TaskHandle, A)> {
        self.tasks.retain(|task| !task.handle.is_cancelled());

        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|task| task.due <= now);
        self.tasks = pending;

        due.sort_by_key(|task| (task.due, task.seq));
        due.into_iter()
            .map(|task| (task.handle, task.action))
            .collect()
    }

    /// Earliest deadline among live tasks.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks
            .iter()
            .filter(|task| !task.handle.is_cancelled())
            .map(|task| task.due)
            .min()
    }

    /// Number of live (not canceled) tasks.
    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.tasks
            .iter()
            .filter(|task| !task.handle.is_cancelled())
            .count()
    }
}

/// Holds the single outstanding task of one category.
#[derive(Debug, Default)]
pub struct TimerSlot {
    handle: Option<TaskHandle>,
}

impl TimerSlot {
    /// Stores `handle`, canceling whatever this slot held before.
    pub fn replace(&mut self, handle: TaskHandle) {
        if let Some(previous) = self.handle.replace(handle) {
            previous.cancel();
        }
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
    }

    /// Forgets the held handle without canceling it (its task already ran).
    pub fn release(&mut self) {
        self.handle = None;
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_cancelled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn fire<A>(queue: &mut DeferredQueue<A>, now: Instant) -> Vec<A> {
        queue
            .drain_due(now)
            .into_iter()
            .map(|(_, action)| action)
            .collect()
    }

    #[test]
    fn test_nothing_due_before_deadline() {
        let start = Instant::now();
        let mut queue = DeferredQueue::new();
        queue.schedule(start, ms(100), "a");
        assert!(fire(&mut queue, start + ms(99)).is_empty());
        assert_eq!(fire(&mut queue, start + ms(100)), vec!["a"]);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_due_actions_come_out_in_deadline_order() {
        let start = Instant::now();
        let mut queue = DeferredQueue::new();
        queue.schedule(start, ms(300), 3);
        queue.schedule(start, ms(100), 1);
        queue.schedule(start, ms(100), 2);
        assert_eq!(queue.next_deadline(), Some(start + ms(100)));
        assert_eq!(fire(&mut queue, start + ms(500)), vec![1, 2, 3]);
    }

    #[test]
    fn test_cancelled_task_never_fires() {
        let start = Instant::now();
        let mut queue = DeferredQueue::new();
        let handle = queue.schedule(start, ms(50), "late");
        handle.cancel();
        assert_eq!(queue.pending(), 0);
        assert_eq!(queue.next_deadline(), None);
        assert!(fire(&mut queue, start + ms(60)).is_empty());
    }

    #[test]
    fn test_slot_keeps_only_latest() {
        let start = Instant::now();
        let mut queue = DeferredQueue::new();
        let mut slot = TimerSlot::default();

        slot.replace(queue.schedule(start, ms(80), "enter"));
        slot.replace(queue.schedule(start + ms(20), ms(80), "exit"));

        assert!(slot.is_pending());
        assert_eq!(queue.pending(), 1);
        assert_eq!(fire(&mut queue, start + ms(200)), vec!["exit"]);
    }

    #[test]
    fn test_slot_cancel() {
        let start = Instant::now();
        let mut queue = DeferredQueue::new();
        let mut slot = TimerSlot::default();
        slot.replace(queue.schedule(start, ms(10), ()));
        slot.cancel();
        assert!(!slot.is_pending());
        assert!(fire(&mut queue, start + ms(10)).is_empty());
    }

    #[test]
    fn test_drained_handle_sees_later_cancel() {
        let start = Instant::now();
        let mut queue = DeferredQueue::new();
        queue.schedule(start, ms(10), "first");
        let second = queue.schedule(start, ms(20), "second");

        let batch = queue.drain_due(start + ms(30));
        assert_eq!(batch.len(), 2);
        second.cancel();
        let live: Vec<_> = batch
            .into_iter()
            .filter(|(handle, _)| !handle.is_cancelled())
            .map(|(_, action)| action)
            .collect();
        assert_eq!(live, vec!["first"]);
    }
}
