//! Suppression of counts that have not changed since the previous batch.

use crate::decode::CountMap;

/// Entries of `current` that are new or whose count differs from `previous`.
///
/// Labels that were in `previous` but are absent from `current` are not
/// reported.
pub fn changed_counts(previous: &CountMap, current: &CountMap) -> CountMap {
    current
        .iter()
        .filter(|&(label, count)| previous.get(label) != Some(count))
        .map(|(label, count)| (label.clone(), *count))
        .collect()
}

/// Remembers the last batch's counts and reports only what changed.
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    previous: CountMap,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts of the most recently reduced batch, before suppression.
    pub fn previous(&self) -> &CountMap {
        &self.previous
    }

    /// Return the changed entries of `current`, then remember `current` in full.
    pub fn reduce(&mut self, current: CountMap) -> CountMap {
        let emitted = changed_counts(&self.previous, &current);
        self.previous = current;
        emitted
    }
}
