use std::collections::BTreeMap;

use gateway_primitives::Cid;
use tokio::time::Instant;

/// A batch waiting for its next attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    pub batch: Vec<Cid>,
    /// Attempt number that will run at `next_fire_at`.
    pub attempt: u32,
    pub next_fire_at: Instant,
}

/// Delay queue ordered by fire time, ties broken by insertion order.
#[derive(Debug, Default)]
pub(crate) struct RetryQueue {
    entries: BTreeMap<(Instant, u64), RetryState>,
    next_seq: u64,
}

impl RetryQueue {
    pub(crate) fn push(&mut self, state: RetryState) {
        let key = (state.next_fire_at, self.next_seq);
        self.next_seq += 1;
        self.entries.insert(key, state);
    }

    /// Earliest fire time, if anything is queued.
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.entries.keys().next().map(|(at, _)| *at)
    }

    /// Removes and returns every entry due at or before `now`, earliest first.
    pub(crate) fn pop_due(&mut self, now: Instant) -> Vec<RetryState> {
        let mut due = Vec::new();
        while let Some(entry) = self.entries.first_entry() {
            if entry.key().0 > now {
                break;
            }
            due.push(entry.remove());
        }
        due
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn state(tag: &str, attempt: u32, at: Instant) -> RetryState {
        RetryState {
            batch: vec![Cid::from(tag)],
            attempt,
            next_fire_at: at,
        }
    }

    #[test]
    fn test_pop_due_in_fire_order() {
        let t0 = Instant::now();
        let mut queue = RetryQueue::default();
        queue.push(state("late", 2, t0 + Duration::from_secs(20)));
        queue.push(state("early", 2, t0 + Duration::from_secs(10)));
        queue.push(state("tie", 3, t0 + Duration::from_secs(10)));

        assert_eq!(queue.next_deadline(), Some(t0 + Duration::from_secs(10)));
        assert!(queue.pop_due(t0).is_empty());

        let due = queue.pop_due(t0 + Duration::from_secs(10));
        let tags: Vec<_> = due.iter().map(|s| s.batch[0].as_str()).collect();
        assert_eq!(tags, ["early", "tie"]);
        assert_eq!(queue.len(), 1);

        let due = queue.pop_due(t0 + Duration::from_secs(60));
        assert_eq!(due[0].batch[0].as_str(), "late");
        assert!(queue.is_empty());
        assert_eq!(queue.next_deadline(), None);
    }
}
