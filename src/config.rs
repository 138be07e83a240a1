//! Runtime configuration for the producer and consumer roles.
//!
//! `N` (ring size exponent) and `S` (size-prefix width) are compile-time choices
//! baked into a `Producer<N, P>`/`Consumer<N, P>`'s type; what's left as a runtime
//! value is `batch_reserve`, since only the producer itself needs to agree on it —
//! it never appears in the validated cross-process header.

/// Runtime configuration for a [`crate::producer::Producer`].
#[derive(Debug, Clone, Copy)]
pub struct ProducerConfig {
    /// Bytes grabbed from the shared write index per round trip. Amortizes the
    /// release-store and the resulting cross-core cache-line invalidation across
    /// many small messages. Must leave headroom under the ring capacity; checked
    /// at `attach` time against the ring's compile-time size.
    pub batch_reserve: u64,
    /// Whether to maintain the atomic counters in [`crate::metrics::Metrics`].
    pub enable_metrics: bool,
}

impl ProducerConfig {
    #[must_use]
    pub const fn new(batch_reserve: u64, enable_metrics: bool) -> Self {
        Self {
            batch_reserve,
            enable_metrics,
        }
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            batch_reserve: 4096,
            enable_metrics: false,
        }
    }
}

/// Runtime configuration for a [`crate::consumer::Consumer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsumerConfig {
    /// Whether to maintain the atomic counters in [`crate::metrics::Metrics`].
    pub enable_metrics: bool,
}

/// Small batch reserve, favoring low per-message latency over syscall/atomic
/// amortization. Fits comfortably in a small ring.
pub const LOW_LATENCY_PRODUCER: ProducerConfig = ProducerConfig::new(256, false);

/// Large batch reserve, favoring throughput; requires a correspondingly large
/// ring (`N` chosen so `2^N` comfortably exceeds this plus the largest message).
pub const HIGH_THROUGHPUT_PRODUCER: ProducerConfig = ProducerConfig::new(16384, false);
