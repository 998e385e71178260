use std::collections::VecDeque;

use super::Snapshot;

pub const DEFAULT_MAX_SNAPSHOTS: usize = 64;

#[derive(Debug)]
pub struct SnapshotBuffer {
    snapshots: VecDeque<Snapshot>,
    max_snapshots: usize,
}

impl Default for SnapshotBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SNAPSHOTS)
    }
}

impl SnapshotBuffer {
    pub fn new(max_snapshots: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(max_snapshots),
            max_snapshots: max_snapshots.max(2),
        }
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        if let Some(latest) = self.snapshots.back() {
            if snapshot.timestamp < latest.timestamp {
                log::debug!(
                    "Snapshot at {:.1} arrived after {:.1}",
                    snapshot.timestamp,
                    latest.timestamp
                );
            }
        }

        while self.snapshots.len() >= self.max_snapshots {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    pub fn bracket_index(&self, render_time: f64) -> Option<usize> {
        let to = self
            .snapshots
            .iter()
            .position(|snapshot| snapshot.timestamp >= render_time)?;
        to.checked_sub(1)
    }

    pub fn bracket(&mut self, render_time: f64) -> Option<(&Snapshot, &Snapshot)> {
        let from = self.bracket_index(render_time)?;
        self.snapshots.drain(..from);
        Some((&self.snapshots[0], &self.snapshots[1]))
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
