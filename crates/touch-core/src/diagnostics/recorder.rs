//! Fixed-capacity ring buffer of pipeline decisions.
//!
//! Both the interception context (suppressed and dropped events) and the
//! surface context (delivered events) append here, and the diagnostics
//! consumer reads snapshots from yet another task.  A `std::sync::Mutex`
//! guards the buffer; every critical section is a bounded push/pop or a copy,
//! so the interception callback never waits on anything unbounded.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::domain::event::{DeviceIdentity, EventKind};
use crate::domain::geometry::Point;

/// Default number of entries retained by the recorder.
pub const DEFAULT_CAPACITY: usize = 500;

/// Trailing window used for throughput statistics.
pub const THROUGHPUT_WINDOW: Duration = Duration::from_secs(2);

/// Outcome recorded for one touch-class event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryStatus {
    /// A synthetic event reached the target surface.
    Delivered,
    /// The event was swallowed and nothing could be delivered
    /// (transform rejected, surface absent, display missing).
    Dropped,
    /// The event was swallowed on purpose (hover noise).
    Suppressed,
}

/// One pipeline decision.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticsEntry {
    /// When the decision was recorded.
    pub recorded_at: Instant,
    pub sequence_id: u64,
    pub device_identity: DeviceIdentity,
    pub kind: EventKind,
    /// Location as reported by the host.
    pub original_point: Point,
    /// Location after remapping, when a remap happened.
    pub remapped_point: Option<Point>,
    pub delivery_status: DeliveryStatus,
    /// Interception-to-delivery latency, when measured.
    pub latency_ms: Option<f64>,
}

/// Derived statistics over the recorder's current contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecorderStatistics {
    pub capacity: usize,
    pub buffered: usize,
    pub total_recorded: u64,
    pub total_dropped: u64,
    pub total_evicted: u64,
    pub delivered_in_buffer: usize,
    pub dropped_in_buffer: usize,
    pub suppressed_in_buffer: usize,
    /// Entries per second over the trailing window.
    pub throughput_per_sec: f64,
    /// Mean latency over buffered entries that carry one.
    pub mean_latency_ms: Option<f64>,
}

#[derive(Default)]
struct RecorderInner {
    entries: VecDeque<DiagnosticsEntry>,
    total_recorded: u64,
    total_dropped: u64,
    total_evicted: u64,
}

/// Thread-safe, fixed-capacity FIFO of [`DiagnosticsEntry`] values.
pub struct DiagnosticsRecorder {
    capacity: usize,
    inner: Mutex<RecorderInner>,
}

impl DiagnosticsRecorder {
    /// Creates a recorder holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(RecorderInner {
                entries: VecDeque::with_capacity(capacity),
                ..RecorderInner::default()
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // A consumer that panicked mid-read must not stop the interception
    // context from recording, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, RecorderInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an entry, evicting the oldest one when full.
    pub fn record(&self, entry: DiagnosticsEntry) {
        let mut inner = self.lock();
        if inner.entries.len() == self.capacity {
            inner.entries.pop_front();
            inner.total_evicted += 1;
        }
        if entry.delivery_status == DeliveryStatus::Dropped {
            inner.total_dropped += 1;
        }
        inner.total_recorded += 1;
        inner.entries.push_back(entry);
    }

    /// Returns up to `n` of the most recent entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<DiagnosticsEntry> {
        let inner = self.lock();
        let skip = inner.entries.len().saturating_sub(n);
        inner.entries.iter().skip(skip).cloned().collect()
    }

    /// Returns every buffered entry, oldest first.
    pub fn snapshot(&self) -> Vec<DiagnosticsEntry> {
        self.lock().entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Number of entries ever recorded, including evicted ones.
    pub fn total_recorded(&self) -> u64 {
        self.lock().total_recorded
    }

    /// Number of `Dropped` entries ever recorded.
    pub fn total_dropped(&self) -> u64 {
        self.lock().total_dropped
    }

    /// Number of entries evicted to make room.
    pub fn total_evicted(&self) -> u64 {
        self.lock().total_evicted
    }

    /// Entries per second recorded within `window` before `now`.
    pub fn throughput_at(&self, now: Instant, window: Duration) -> f64 {
        let inner = self.lock();
        throughput(&inner.entries, now, window)
    }

    /// Entries per second over the trailing two seconds.
    pub fn throughput(&self) -> f64 {
        self.throughput_at(Instant::now(), THROUGHPUT_WINDOW)
    }

    /// Mean latency over buffered entries that carry a measured latency.
    pub fn mean_latency_ms(&self) -> Option<f64> {
        mean_latency(&self.lock().entries)
    }

    /// Computes every statistic under a single lock acquisition.
    pub fn statistics_at(&self, now: Instant, window: Duration) -> RecorderStatistics {
        let inner = self.lock();
        let count = |status| {
            inner
                .entries
                .iter()
                .filter(|e| e.delivery_status == status)
                .count()
        };
        RecorderStatistics {
            capacity: self.capacity,
            buffered: inner.entries.len(),
            total_recorded: inner.total_recorded,
            total_dropped: inner.total_dropped,
            total_evicted: inner.total_evicted,
            delivered_in_buffer: count(DeliveryStatus::Delivered),
            dropped_in_buffer: count(DeliveryStatus::Dropped),
            suppressed_in_buffer: count(DeliveryStatus::Suppressed),
            throughput_per_sec: throughput(&inner.entries, now, window),
            mean_latency_ms: mean_latency(&inner.entries),
        }
    }

    /// Drops every buffered entry and resets the counters.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.total_recorded = 0;
        inner.total_dropped = 0;
        inner.total_evicted = 0;
    }
}

impl Default for DiagnosticsRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

fn throughput(entries: &VecDeque<DiagnosticsEntry>, now: Instant, window: Duration) -> f64 {
    if window.is_zero() {
        return 0.0;
    }
    let in_window = entries
        .iter()
        .filter(|e| now.saturating_duration_since(e.recorded_at) <= window)
        .count();
    in_window as f64 / window.as_secs_f64()
}

fn mean_latency(entries: &VecDeque<DiagnosticsEntry>) -> Option<f64> {
    let (sum, n) = entries
        .iter()
        .filter_map(|e| e.latency_ms)
        .fold((0.0, 0usize), |(sum, n), l| (sum + l, n + 1));
    (n > 0).then(|| sum / n as f64)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
