//! Deferred turn queue.
//!
//! Sequence mutations on instance properties do not publish immediately;
//! they queue one notification per attribute here, and the queue is drained
//! when the owner of the editing session ends the current turn with
//! [`Scheduler::run_pending`]. Delivery depends only on turn order, never on
//! wall-clock time.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// Cloneable handle to a shared task queue.
///
/// Clones share the same queue, so every model of an editing session can be
/// driven from a single handle.
#[derive(Clone, Default)]
pub struct Scheduler {
    queue: Rc<RefCell<VecDeque<Task>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer<F>(&self, task: F)
    where
        F: FnOnce() + 'static,
    {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Runs the tasks queued before this call and returns how many ran.
    ///
    /// Tasks deferred while the batch runs belong to the next turn and stay
    /// queued.
    pub fn run_pending(&self) -> usize {
        let batch: Vec<Task> = self.queue.borrow_mut().drain(..).collect();
        let count = batch.len();
        if count > 0 {
            tracing::trace!(tasks = count, "run deferred turn");
        }
        for task in batch {
            task();
        }
        count
    }

    /// Runs turns until the queue stays empty.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            let ran = self.run_pending();
            if ran == 0 {
                return total;
            }
            total += ran;
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_run_in_queue_order() {
        let scheduler = Scheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = Rc::clone(&log);
            scheduler.defer(move || log.borrow_mut().push(i));
        }
        assert_eq!(scheduler.pending(), 3);
        assert_eq!(scheduler.run_pending(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn tasks_deferred_during_a_turn_wait_for_the_next() {
        let scheduler = Scheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner = scheduler.clone();
        let inner_log = Rc::clone(&log);
        scheduler.defer(move || {
            inner_log.borrow_mut().push("first");
            let log = Rc::clone(&inner_log);
            inner.defer(move || log.borrow_mut().push("second"));
        });
        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(*log.borrow(), vec!["first"]);
        assert_eq!(scheduler.run_until_idle(), 1);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }
}
