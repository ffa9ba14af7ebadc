//! Virtual-time scheduler
//!
//! Suspended tasks wait in a min-heap keyed by (wake time, scheduling
//! sequence). Advancing pops every task due at the earliest wake time as one
//! batch, in the order the tasks were scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug)]
struct Scheduled<T> {
    time: f64,
    sequence: u64,
    task: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.time.total_cmp(&other.time) == Ordering::Equal && self.sequence == other.sequence
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Virtual clock plus the tasks suspended on it
#[derive(Debug)]
pub struct Scheduler<T> {
    queue: BinaryHeap<Scheduled<T>>,
    sequence: u64,
    now: f64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Scheduler at time zero with nothing scheduled
    pub fn new() -> Self {
        Self { queue: BinaryHeap::new(), sequence: 0, now: 0.0 }
    }

    /// Current virtual time in hours
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Suspend `task` until `time`.
    ///
    /// # Panics
    ///
    /// Panics if `time` is in the past or not finite.
    pub fn schedule_at(&mut self, time: f64, task: T) {
        assert!(time.is_finite() && time >= self.now, "cannot schedule at {} (now {})", time, self.now);
        self.queue.push(Scheduled { time, sequence: self.sequence, task });
        self.sequence += 1;
    }

    /// Suspend `task` for `delay` hours from now
    pub fn schedule_in(&mut self, delay: f64, task: T) {
        self.schedule_at(self.now + delay, task);
    }

    /// Wake time of the earliest suspended task
    pub fn peek_time(&self) -> Option<f64> {
        self.queue.peek().map(|scheduled| scheduled.time)
    }

    /// Advance the clock to the earliest wake time and return every task due then
    pub fn pop_due(&mut self) -> Option<(f64, Vec<T>)> {
        let time = self.peek_time()?;
        let mut due = Vec::new();
        while self.queue.peek().is_some_and(|scheduled| scheduled.time == time) {
            if let Some(scheduled) = self.queue.pop() {
                due.push(scheduled.task);
            }
        }
        self.now = time;
        Some((time, due))
    }

    /// Move the clock forward without resuming anything
    pub fn advance_to(&mut self, time: f64) {
        if time > self.now {
            self.now = time;
        }
    }

    /// Whether no task is suspended
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of suspended tasks
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_time_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(5.0, "late");
        scheduler.schedule_at(1.0, "early");
        scheduler.schedule_at(3.0, "middle");

        assert_eq!(scheduler.pop_due(), Some((1.0, vec!["early"])));
        assert_eq!(scheduler.now(), 1.0);
        assert_eq!(scheduler.pop_due(), Some((3.0, vec!["middle"])));
        assert_eq!(scheduler.pop_due(), Some((5.0, vec!["late"])));
        assert_eq!(scheduler.pop_due(), None);
    }

    #[test]
    fn test_same_time_keeps_scheduling_order() {
        let mut scheduler = Scheduler::new();
        for task in ["a", "b", "c"] {
            scheduler.schedule_at(2.0, task);
        }
        scheduler.schedule_at(1.0, "first");

        assert_eq!(scheduler.pop_due(), Some((1.0, vec!["first"])));
        assert_eq!(scheduler.pop_due(), Some((2.0, vec!["a", "b", "c"])));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_schedule_in_is_relative() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(4.0, 1);
        scheduler.pop_due();
        scheduler.schedule_in(0.5, 2);
        assert_eq!(scheduler.peek_time(), Some(4.5));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_zero_delay_runs_in_a_later_batch() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(1.0, "x");
        let (now, _) = scheduler.pop_due().unwrap();
        scheduler.schedule_at(now, "y");
        assert_eq!(scheduler.pop_due(), Some((1.0, vec!["y"])));
    }

    #[test]
    #[should_panic(expected = "cannot schedule")]
    fn test_scheduling_in_the_past_panics() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(2.0, ());
        scheduler.pop_due();
        scheduler.schedule_at(1.0, ());
    }
}
