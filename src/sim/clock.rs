//! Cancellable timer scheduling
//!
//! Virtual-time scheduler owned by each engine session. The host supplies the
//! current time; due timers are popped one at a time in `(due, id)` order, so
//! a callback that cancels other timers takes effect before they can fire.
//! An interval that fell behind fires once per elapsed period.

use serde::{Deserialize, Serialize};

/// Cancel token for a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repeat {
    Every(u64),
    Once,
}

#[derive(Debug, Clone)]
struct Timer<E> {
    id: TimerId,
    due_ms: u64,
    repeat: Repeat,
    event: E,
}

/// A timer that came due
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<E> {
    pub id: TimerId,
    /// Scheduled time of this firing (not the time it was observed)
    pub at_ms: u64,
    pub event: E,
}

#[derive(Debug, Clone)]
pub struct TickClock<E> {
    now_ms: u64,
    next_id: u64,
    timers: Vec<Timer<E>>,
}

impl<E: Clone> TickClock<E> {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms,
            next_id: 1,
            timers: Vec::new(),
        }
    }

    /// Time of the last processed firing or observation
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Repeat `event` every `period_ms` (first firing one period from now)
    pub fn every(&mut self, period_ms: u64, event: E) -> TimerId {
        let period = period_ms.max(1);
        self.insert(self.now_ms.saturating_add(period), Repeat::Every(period), event)
    }

    /// Fire `event` once after `delay_ms`
    pub fn after(&mut self, delay_ms: u64, event: E) -> TimerId {
        self.insert(self.now_ms.saturating_add(delay_ms), Repeat::Once, event)
    }

    fn insert(&mut self, due_ms: u64, repeat: Repeat, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            due_ms,
            repeat,
            event,
        });
        id
    }

    /// Cancel one timer; returns false if it already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Cancel everything (session teardown/restart)
    pub fn cancel_all(&mut self) -> usize {
        let count = self.timers.len();
        self.timers.clear();
        count
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Earliest scheduled firing
    pub fn next_due(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.due_ms).min()
    }

    /// Pop the earliest timer due at or before `now_ms`. When nothing is due
    /// the clock catches up to `now_ms` and `None` is returned.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Fired<E>> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= now_ms)
            .min_by_key(|(_, t)| (t.due_ms, t.id))
            .map(|(i, _)| i);

        let Some(index) = index else {
            self.now_ms = self.now_ms.max(now_ms);
            return None;
        };

        let timer = &self.timers[index];
        let fired = Fired {
            id: timer.id,
            at_ms: timer.due_ms,
            event: timer.event.clone(),
        };
        let repeat = timer.repeat;
        self.now_ms = self.now_ms.max(fired.at_ms);

        match repeat {
            Repeat::Every(period) => self.timers[index].due_ms += period,
            Repeat::Once => {
                self.timers.swap_remove(index);
            }
        }
        Some(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(clock: &mut TickClock<&'static str>, now: u64) -> Vec<(u64, &'static str)> {
        let mut out = Vec::new();
        while let Some(fired) = clock.pop_due(now) {
            out.push((fired.at_ms, fired.event));
        }
        out
    }

    #[test]
    fn test_interval_fires_each_period() {
        let mut clock = TickClock::new(0);
        clock.every(100, "tick");
        assert!(drain(&mut clock, 99).is_empty());
        assert_eq!(drain(&mut clock, 100), vec![(100, "tick")]);
        // Catch-up fires discrete steps
        assert_eq!(
            drain(&mut clock, 450),
            vec![(200, "tick"), (300, "tick"), (400, "tick")]
        );
        assert_eq!(clock.now_ms(), 450);
    }

    #[test]
    fn test_one_shot_fires_once() {
        let mut clock = TickClock::new(1000);
        let id = clock.after(250, "go");
        assert!(clock.is_pending(id));
        assert_eq!(drain(&mut clock, 5000), vec![(1250, "go")]);
        assert!(!clock.is_pending(id));
        assert!(drain(&mut clock, 9000).is_empty());
    }

    #[test]
    fn test_cancelled_timers_never_fire() {
        let mut clock = TickClock::new(0);
        let a = clock.every(10, "a");
        clock.after(15, "b");
        assert!(clock.cancel(a));
        assert!(!clock.cancel(a));
        assert_eq!(drain(&mut clock, 100), vec![(15, "b")]);

        clock.every(10, "c");
        clock.after(5, "d");
        assert_eq!(clock.cancel_all(), 2);
        assert!(drain(&mut clock, 1000).is_empty());
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_order_by_due_then_id() {
        let mut clock = TickClock::new(0);
        clock.after(50, "second");
        clock.after(20, "first");
        clock.after(50, "third");
        assert_eq!(
            drain(&mut clock, 100),
            vec![(20, "first"), (50, "second"), (50, "third")]
        );
    }

    #[test]
    fn test_scheduling_from_a_callback_is_relative_to_fire_time() {
        let mut clock = TickClock::new(0);
        clock.after(100, "first");
        let fired = clock.pop_due(1000).unwrap();
        assert_eq!(fired.at_ms, 100);
        clock.after(100, "chained");
        assert_eq!(clock.next_due(), Some(200));
        assert_eq!(drain(&mut clock, 1000), vec![(200, "chained")]);
    }

    #[test]
    fn test_time_never_runs_backwards() {
        let mut clock: TickClock<&str> = TickClock::new(500);
        assert!(clock.pop_due(100).is_none());
        assert_eq!(clock.now_ms(), 500);
    }
}
