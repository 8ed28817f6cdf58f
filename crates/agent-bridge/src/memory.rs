//! Bounded multi-turn memory for action proposers.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default number of turns retained.
pub const DEFAULT_MEMORY_CAPACITY: usize = 40;

/// What a memory entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// A goal the proposer was asked to pursue.
    Goal,
    /// An action the proposer emitted.
    Action,
    /// The ground-truth outcome reported back after execution.
    Outcome,
}

/// One remembered turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub kind: MemoryKind,
    pub content: String,
}

/// Size-capped append-only conversation memory.
///
/// The cap keeps a long attempt from accumulating unbounded history; the
/// oldest entries are evicted first. [`ConversationMemory::clear`] is
/// called on every full-attempt restart so stale context from a failed
/// attempt never leaks into a retried one.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    entries: VecDeque<MemoryEntry>,
    capacity: usize,
}

impl ConversationMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, kind: MemoryKind, content: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(MemoryEntry {
            kind,
            content: content.into(),
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter()
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let mut memory = ConversationMemory::new(2);
        memory.push(MemoryKind::Goal, "first");
        memory.push(MemoryKind::Action, "second");
        memory.push(MemoryKind::Outcome, "third");

        assert_eq!(memory.len(), 2);
        let contents: Vec<_> = memory.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["second", "third"]);
    }

    #[test]
    fn clear_empties_memory() {
        let mut memory = ConversationMemory::default();
        memory.push(MemoryKind::Goal, "goal");
        memory.clear();
        assert!(memory.is_empty());
    }
}
