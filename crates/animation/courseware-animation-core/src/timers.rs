//! Virtual-clock timer queue.
//!
//! The host drives the clock (`Engine::advance_to`); timers fire in due-time
//! order, ties in scheduling order, and a timer scheduled while another is
//! firing sees the clock at the firing timer's due time.

use crate::ids::{ElementId, IdAllocator, RunId, SpriteId, TimerId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerTask {
    /// Synthesize a transition end if the run is still current.
    Guard { element: ElementId, token: u64 },
    /// Reveal the next typewriter character.
    TypewriterTick { run: RunId },
    /// Step a playing sprite sheet by one frame.
    SpriteTick { sprite: SpriteId },
}

#[derive(Clone, Debug)]
struct Entry {
    id: TimerId,
    due_ms: f64,
    task: TimerTask,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    now_ms: f64,
    ids: IdAllocator,
    entries: Vec<Entry>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Schedule `task` to run `delay_ms` from now. Negative delays run on the
    /// next advance.
    pub fn schedule(&mut self, delay_ms: f64, task: TimerTask) -> TimerId {
        let id = self.ids.alloc_timer();
        self.entries.push(Entry {
            id,
            due_ms: self.now_ms + delay_ms.max(0.0),
            task,
        });
        id
    }

    /// Returns whether the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        before != self.entries.len()
    }

    /// Remove and return the earliest timer due at or before `until_ms`,
    /// moving the clock to its due time.
    pub fn pop_due(&mut self, until_ms: f64) -> Option<(TimerId, TimerTask)> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= until_ms)
            .min_by(|(_, a), (_, b)| a.due_ms.total_cmp(&b.due_ms).then(a.id.cmp(&b.id)))
            .map(|(i, _)| i)?;
        let entry = self.entries.remove(idx);
        self.now_ms = self.now_ms.max(entry.due_ms);
        Some((entry.id, entry.task))
    }

    /// Move the clock forward. Never moves it backwards.
    pub fn settle(&mut self, now_ms: f64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(n: u32) -> TimerTask {
        TimerTask::Guard {
            element: ElementId(n),
            token: 1,
        }
    }

    #[test]
    fn fires_in_due_then_schedule_order() {
        let mut q = TimerQueue::new();
        q.schedule(100.0, guard(1));
        q.schedule(50.0, guard(2));
        q.schedule(50.0, guard(3));
        assert!(q.pop_due(40.0).is_none());
        assert_eq!(q.pop_due(200.0).map(|(_, t)| t), Some(guard(2)));
        assert_eq!(q.now_ms(), 50.0);
        assert_eq!(q.pop_due(200.0).map(|(_, t)| t), Some(guard(3)));
        assert_eq!(q.pop_due(200.0).map(|(_, t)| t), Some(guard(1)));
        assert!(q.is_empty());
    }

    #[test]
    fn cancel_and_relative_scheduling() {
        let mut q = TimerQueue::new();
        let a = q.schedule(10.0, guard(1));
        assert!(q.cancel(a));
        assert!(!q.cancel(a));
        q.settle(1000.0);
        q.settle(10.0);
        assert_eq!(q.now_ms(), 1000.0);
        let b = q.schedule(5.0, guard(2));
        assert_eq!(q.len(), 1);
        assert!(q.pop_due(1004.0).is_none());
        assert_eq!(q.pop_due(1005.0).map(|(id, _)| id), Some(b));
    }
}
