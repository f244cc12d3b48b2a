/// Fixed-capacity snapshot history
///
/// Arena of slots plus a write cursor. Once full, each push overwrites the
/// oldest snapshot, which is always the slot under the cursor.
use super::types::ValuationSnapshot;
use chrono::{DateTime, Utc};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    slots: Vec<Option<ValuationSnapshot>>,
    /// Next slot to write
    cursor: usize,
    len: usize,
}

impl SnapshotHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![None; capacity],
            cursor: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    pub fn push(&mut self, snapshot: ValuationSnapshot) {
        let capacity = self.capacity();
        self.slots[self.cursor] = Some(snapshot);
        self.cursor = (self.cursor + 1) % capacity;
        if self.len < capacity {
            self.len += 1;
        }
    }

    pub fn latest(&self) -> Option<&ValuationSnapshot> {
        self.iter_newest_first().next()
    }

    pub fn oldest(&self) -> Option<&ValuationSnapshot> {
        if self.is_full() {
            self.slots[self.cursor].as_ref()
        } else {
            self.slots[0].as_ref()
        }
    }

    /// Newest to oldest
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &ValuationSnapshot> + '_ {
        let capacity = self.capacity();
        (1..=self.len).filter_map(move |back| {
            let idx = (self.cursor + capacity - back) % capacity;
            self.slots[idx].as_ref()
        })
    }

    /// First snapshot, scanning newest to oldest, whose age relative to
    /// `reference` lies within `[window, window + tolerance]`
    pub fn find_in_window(
        &self,
        reference: DateTime<Utc>,
        window: Duration,
        tolerance: Duration
    ) -> Option<&ValuationSnapshot> {
        let min_age = window.as_millis() as i64;
        let max_age = (window + tolerance).as_millis() as i64;

        for snapshot in self.iter_newest_first() {
            let age = (reference - snapshot.timestamp).num_milliseconds();
            if age > max_age {
                // Everything further back is older still
                break;
            }
            if age >= min_age {
                return Some(snapshot);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_at(base: DateTime<Utc>, secs: i64) -> ValuationSnapshot {
        ValuationSnapshot::from_holdings(base + chrono::Duration::seconds(secs), &[])
    }

    #[test]
    fn test_capacity_bound_and_eviction() {
        let base = Utc::now();
        let mut history = SnapshotHistory::new(3);
        assert!(history.is_empty());
        assert!(history.oldest().is_none());

        for i in 0..5 {
            history.push(snapshot_at(base, i));
            assert!(history.len() <= 3);
        }

        assert!(history.is_full());
        let ages: Vec<i64> = history
            .iter_newest_first()
            .map(|s| (s.timestamp - base).num_seconds())
            .collect();
        assert_eq!(ages, vec![4, 3, 2]);
        assert_eq!(history.oldest().map(|s| (s.timestamp - base).num_seconds()), Some(2));
        assert_eq!(history.latest().map(|s| (s.timestamp - base).num_seconds()), Some(4));
    }

    #[test]
    fn test_partial_fill_order() {
        let base = Utc::now();
        let mut history = SnapshotHistory::new(10);
        history.push(snapshot_at(base, 0));
        history.push(snapshot_at(base, 20));
        assert_eq!(history.oldest().map(|s| s.timestamp), Some(base));
        assert_eq!(history.iter_newest_first().count(), 2);
    }

    #[test]
    fn test_find_in_window() {
        let base = Utc::now();
        let mut history = SnapshotHistory::new(10);
        for secs in [0, 20, 40, 60] {
            history.push(snapshot_at(base, secs));
        }
        let now = base + chrono::Duration::seconds(91);
        let tolerance = Duration::from_secs(5);

        // Ages: 31, 51, 71, 91
        let found = history.find_in_window(now, Duration::from_secs(30), tolerance);
        assert_eq!(found.map(|s| (s.timestamp - base).num_seconds()), Some(60));
        assert!(history.find_in_window(now, Duration::from_secs(60), tolerance).is_none());
        let found = history.find_in_window(now, Duration::from_secs(90), tolerance);
        assert_eq!(found.map(|s| (s.timestamp - base).num_seconds()), Some(0));
    }
}
