//! Touch sequence tracking.
//!
//! A *touch sequence* spans one continuous contact: a `Down`, any number of
//! `Drag`s, and the matching `Up`.  The digitizer collapses concurrent
//! contacts into a single point, so at most one sequence is live at a time.
//!
//! Sequence IDs are monotonically increasing and wrap at `u64::MAX` without
//! panicking.  They label diagnostics entries so a consumer can group every
//! decision that belonged to one contact.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// What happened to the sequence state when a contact event was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceTransition {
    /// A new sequence started.
    Started,
    /// A new sequence started and a stuck previous one (no `Up`) was dropped.
    Restarted {
        /// ID of the sequence that never received its `Up`.
        abandoned: u64,
    },
    /// The live sequence continued.
    Continued,
    /// The live sequence ended.
    Ended,
    /// The event arrived with no live sequence and changed nothing.
    Orphaned,
}

/// Snapshot of the current touch sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TouchSequence {
    /// ID of the most recent sequence (0 before the first `Down`).
    pub sequence_id: u64,
    /// `true` between a `Down` and its `Up`.
    pub is_active: bool,
    /// Number of `Drag` events seen in the live sequence.
    pub drag_event_count: u32,
}

impl TouchSequence {
    /// Creates a tracker with no sequence started.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new sequence, implicitly terminating a stuck one.
    pub fn begin(&mut self) -> SequenceTransition {
        let abandoned = self.is_active.then_some(self.sequence_id);
        self.sequence_id = self.sequence_id.wrapping_add(1);
        self.is_active = true;
        self.drag_event_count = 0;
        match abandoned {
            Some(abandoned) => {
                warn!(
                    abandoned,
                    sequence_id = self.sequence_id,
                    "touch sequence never ended; starting a new one"
                );
                SequenceTransition::Restarted { abandoned }
            }
            None => SequenceTransition::Started,
        }
    }

    /// Records a drag inside the live sequence.
    pub fn extend(&mut self) -> SequenceTransition {
        if !self.is_active {
            return SequenceTransition::Orphaned;
        }
        self.drag_event_count = self.drag_event_count.saturating_add(1);
        SequenceTransition::Continued
    }

    /// Ends the live sequence.  The ID is kept so the `Up` can be labelled.
    pub fn end(&mut self) -> SequenceTransition {
        if !self.is_active {
            return SequenceTransition::Orphaned;
        }
        self.is_active = false;
        SequenceTransition::Ended
    }

    /// Drops any live sequence without advancing the ID.
    pub fn reset(&mut self) {
        self.is_active = false;
        self.drag_event_count = 0;
    }
}
