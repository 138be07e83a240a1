//! Optional, process-local instrumentation.
//!
//! These counters never cross the process boundary and are not part of the
//! shared-memory layout — they exist purely so a caller that opts in can observe
//! its own role's behavior. Enabling them costs one atomic add per event; leaving
//! them disabled (the default) costs nothing beyond a `None` check.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for one producer or consumer instance.
#[derive(Debug, Default)]
pub struct Metrics {
    messages_framed: AtomicU64,
    bytes_framed: AtomicU64,
    flushes: AtomicU64,
    skip_markers: AtomicU64,
    messages_read: AtomicU64,
    overruns: AtomicU64,
}

impl Metrics {
    pub(crate) fn add_message_framed(&self, bytes: u64) {
        self.messages_framed.fetch_add(1, Ordering::Relaxed);
        self.bytes_framed.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn add_flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_skip_marker(&self) {
        self.skip_markers.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_message_read(&self) {
        self.messages_read.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_overrun(&self) {
        self.overruns.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy out a point-in-time snapshot.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_framed: self.messages_framed.load(Ordering::Relaxed),
            bytes_framed: self.bytes_framed.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            skip_markers: self.skip_markers.load(Ordering::Relaxed),
            messages_read: self.messages_read.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
        }
    }
}

/// A plain, `Copy` snapshot of [`Metrics`] at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_framed: u64,
    pub bytes_framed: u64,
    pub flushes: u64,
    pub skip_markers: u64,
    pub messages_read: u64,
    pub overruns: u64,
}
