//! Structured interaction log kept for the preview panel.
//!
//! Entries are appended after every completed press when structured logging
//! is enabled. The recorder keeps a sliding window over the most recent
//! entries and hands out ids from a counter that only ever moves forward, so
//! an id is never seen twice during the lifetime of a recorder even after the
//! window is trimmed or cleared.

use alloc::string::String;

use heapless::{HistoryBuf, OldestOrdered};

use crate::behavior::{BehaviorKind, ButtonId};

/// Number of structured log entries retained.
pub const STRUCTURED_LOG_CAPACITY: usize = 5;

/// Identifier attached to each structured log entry.
pub type EntryId = u64;

/// One completed interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuredLogEntry<I> {
    pub id: EntryId,
    pub button: ButtonId,
    pub button_label: String,
    pub timestamp: I,
    pub action: String,
    pub behavior: BehaviorKind,
    /// Input value that was submitted with the press.
    pub input: Option<String>,
    /// Playlist item shown after the press.
    pub playlist_item: Option<String>,
}

/// Entry fields supplied by the caller; the recorder assigns the id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogDraft<I> {
    pub button: ButtonId,
    pub button_label: String,
    pub timestamp: I,
    pub action: String,
    pub behavior: BehaviorKind,
    pub input: Option<String>,
    pub playlist_item: Option<String>,
}

/// Bounded append-only log with monotonic ids.
pub struct StructuredLogRecorder<I, const CAPACITY: usize = STRUCTURED_LOG_CAPACITY> {
    ring: HistoryBuf<StructuredLogEntry<I>, CAPACITY>,
    next_id: EntryId,
}

impl<I, const CAPACITY: usize> StructuredLogRecorder<I, CAPACITY> {
    /// Creates an empty recorder whose first entry gets id 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_id: 1,
        }
    }

    /// Appends an entry, trimming the oldest once the window is full.
    pub fn append(&mut self, draft: LogDraft<I>) -> EntryId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);

        self.ring.write(StructuredLogEntry {
            id,
            button: draft.button,
            button_label: draft.button_label,
            timestamp: draft.timestamp,
            action: draft.action,
            behavior: draft.behavior,
            input: draft.input,
            playlist_item: draft.playlist_item,
        });

        id
    }

    /// Entries in insertion order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, StructuredLogEntry<I>> {
        self.ring.oldest_ordered()
    }

    pub fn latest(&self) -> Option<&StructuredLogEntry<I>> {
        self.ring.recent()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Id the next appended entry will receive.
    pub fn next_id(&self) -> EntryId {
        self.next_id
    }

    /// Empties the window. Ids keep counting from where they were.
    pub fn clear(&mut self) {
        self.ring.clear();
    }
}

impl<I, const CAPACITY: usize> Default for StructuredLogRecorder<I, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::vec::Vec;

    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
    struct MicrosInstant(u64);

    fn draft(index: u64) -> LogDraft<MicrosInstant> {
        LogDraft {
            button: ButtonId(1),
            button_label: String::from("Counter"),
            timestamp: MicrosInstant(index * 1_000),
            action: format!("Count: {index}"),
            behavior: BehaviorKind::Counter,
            input: None,
            playlist_item: None,
        }
    }

    #[test]
    fn keeps_only_the_most_recent_entries() {
        let mut recorder = StructuredLogRecorder::<MicrosInstant>::new();
        for index in 1..=8 {
            recorder.append(draft(index));
        }

        assert_eq!(recorder.len(), STRUCTURED_LOG_CAPACITY);
        let ids: Vec<EntryId> = recorder.oldest_first().map(|entry| entry.id).collect();
        assert_eq!(ids, [4, 5, 6, 7, 8]);
        assert_eq!(
            recorder.latest().map(|entry| entry.action.as_str()),
            Some("Count: 8")
        );
    }

    #[test]
    fn ids_survive_clear() {
        let mut recorder = StructuredLogRecorder::<MicrosInstant, 2>::new();
        assert_eq!(recorder.append(draft(1)), 1);
        assert_eq!(recorder.append(draft(2)), 2);
        recorder.clear();
        assert!(recorder.is_empty());
        assert_eq!(recorder.append(draft(3)), 3);
        assert_eq!(recorder.next_id(), 4);
    }
}
