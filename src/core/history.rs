//! Bounded history of captures, newest last.

use std::collections::VecDeque;

use crate::core::capture::Capture;

#[derive(Debug, Clone)]
pub struct CaptureHistory {
    entries: VecDeque<Capture>,
    /// Previous captures kept in addition to the latest one.
    depth: usize,
}

impl CaptureHistory {
    pub fn new(depth: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(depth.saturating_add(1).min(64)),
            depth,
        }
    }

    /// Appends `capture` as the latest entry and returns how many old entries were dropped.
    pub fn push(&mut self, capture: Capture) -> usize {
        self.entries.push_back(capture);
        let mut evicted = 0;
        while self.entries.len() > self.depth.saturating_add(1) {
            self.entries.pop_front();
            evicted += 1;
        }
        evicted
    }

    pub fn latest(&self) -> Option<&Capture> {
        self.entries.back()
    }

    pub fn oldest(&self) -> Option<&Capture> {
        self.entries.front()
    }

    pub fn get(&self, sequence: u64) -> Option<&Capture> {
        self.index_of(sequence).map(|index| &self.entries[index])
    }

    pub fn older_than(&self, sequence: u64) -> Option<&Capture> {
        let index = self.index_of(sequence)?;
        index.checked_sub(1).map(|index| &self.entries[index])
    }

    pub fn newer_than(&self, sequence: u64) -> Option<&Capture> {
        let index = self.index_of(sequence)?;
        self.entries.get(index + 1)
    }

    /// Number of entries newer than `sequence` (0 for the latest).
    pub fn age_of(&self, sequence: u64) -> Option<usize> {
        let index = self.index_of(sequence)?;
        Some(self.entries.len() - 1 - index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn index_of(&self, sequence: u64) -> Option<usize> {
        // Sequences are strictly increasing front to back.
        self.entries
            .binary_search_by_key(&sequence, Capture::sequence)
            .ok()
    }
}
