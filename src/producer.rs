//! The producer role: frames variable-length messages into the ring and
//! publishes them to the consumer.

use std::marker::PhantomData;
use std::slice;
use std::sync::atomic::Ordering;

use crate::buffer_size::BufferSize;
use crate::config::ProducerConfig;
use crate::error::QueueError;
use crate::header::QueueLayout;
use crate::invariants::{
    debug_assert_batch_reserve_headroom, debug_assert_message_fits_batch,
    debug_assert_monotonic, debug_assert_nonzero_message,
};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::segment::Segment;
use crate::size_prefix::SizePrefix;

/// The single writer attached to a queue.
///
/// Not `Clone`: a second producer writing to the same ring would break the
/// single-producer invariant the whole protocol depends on.
pub struct Producer<const N: u8, P> {
    segment: Segment,
    base: *mut u8,
    batch_reserve: u64,
    /// Most recent value this producer has published to the shared write index.
    cached_write_index: u64,
    /// Bytes framed locally but not yet published via `flush`.
    allocated_index: u64,
    metrics: Option<Metrics>,
    _prefix: PhantomData<P>,
}

impl<const N: u8, P: SizePrefix> Producer<N, P> {
    /// Attach to an existing, already-initialized segment.
    pub fn attach(name: &str, config: ProducerConfig) -> Result<Self, QueueError> {
        let ring_bytes = BufferSize::<N>::BYTES;
        if config.batch_reserve == 0 || config.batch_reserve >= ring_bytes - P::BYTES as u64 {
            return Err(QueueError::InvalidConfig {
                reason: "batch_reserve must be nonzero and leave headroom under the ring capacity",
            });
        }
        debug_assert_batch_reserve_headroom!(config.batch_reserve, P::BYTES, ring_bytes);

        let segment = Segment::attach(name, QueueLayout::<N, P>::TOTAL_SIZE)?;
        let base = segment.as_ptr();
        unsafe {
            QueueLayout::<N, P>::wait_and_validate(base)?;
        }

        let initial_index = P::BYTES as u64;
        unsafe {
            (*QueueLayout::<N, P>::write_index(base)).store(initial_index, Ordering::Release);
        }

        Ok(Self {
            segment,
            base,
            batch_reserve: config.batch_reserve,
            cached_write_index: initial_index,
            allocated_index: initial_index,
            metrics: config.enable_metrics.then(Metrics::default),
            _prefix: PhantomData,
        })
    }

    /// Reserve `n` bytes of writable payload space and frame its size prefix.
    ///
    /// The returned slice borrows `self` mutably, so the compiler forbids calling
    /// `allocate_write` again (or `flush`) while a previous allocation is still
    /// in hand.
    ///
    /// # Panics (debug builds only)
    /// Panics if `n` is zero or does not fit under this producer's
    /// `batch_reserve`. Both are caller-contract violations; release builds
    /// leave them as undefined behavior rather than paying for the check.
    pub fn allocate_write(&mut self, n: usize) -> &mut [u8] {
        debug_assert_nonzero_message!(n);
        debug_assert_message_fits_batch!(n, self.batch_reserve);

        let need = n as u64 + P::BYTES as u64;
        if self.cached_write_index - self.allocated_index < need {
            self.reserve(need);
        }

        let ring = unsafe { QueueLayout::<N, P>::ring(self.base) };
        let off = BufferSize::<N>::offset(self.allocated_index) as usize;

        unsafe {
            let prefix = slice::from_raw_parts_mut(ring.add(off - P::BYTES), P::BYTES);
            P::write(prefix, n as u64);
        }

        self.allocated_index += need;

        if let Some(metrics) = &self.metrics {
            metrics.add_message_framed(n as u64);
        }

        unsafe { slice::from_raw_parts_mut(ring.add(off), n) }
    }

    /// Grow the committed reservation window so the next `need` bytes fit,
    /// inserting a skip marker and jumping to ring offset 0 if the allocation
    /// would otherwise straddle the end of the ring.
    fn reserve(&mut self, need: u64) {
        let old_cached = self.cached_write_index;
        self.cached_write_index += self.batch_reserve + P::BYTES as u64;
        debug_assert_monotonic!("cached_write_index", old_cached, self.cached_write_index);

        let off_allocated = BufferSize::<N>::offset(self.allocated_index - P::BYTES as u64);
        let off_next = BufferSize::<N>::offset(self.allocated_index + need);

        if off_next < off_allocated {
            let ring = unsafe { QueueLayout::<N, P>::ring(self.base) };
            unsafe {
                let skip = slice::from_raw_parts_mut(ring.add(off_allocated as usize), P::BYTES);
                P::write(skip, 0);
            }
            let wrap = BufferSize::<N>::distance_to_wrap(self.allocated_index) + P::BYTES as u64;
            self.allocated_index += wrap;
            self.cached_write_index += wrap;

            if let Some(metrics) = &self.metrics {
                metrics.add_skip_marker();
            }
        }

        unsafe {
            (*QueueLayout::<N, P>::write_index(self.base))
                .store(self.cached_write_index, Ordering::Release);
        }
    }

    /// Publish every message framed since the last `flush` to the consumer.
    ///
    /// Idempotent when called with no intervening `allocate_write`. Never
    /// blocks, never fails.
    pub fn flush(&mut self) {
        let release_frontier = self.allocated_index - P::BYTES as u64;
        unsafe {
            (*QueueLayout::<N, P>::read_index(self.base)).store(release_frontier, Ordering::Release);
        }
        if let Some(metrics) = &self.metrics {
            metrics.add_flush();
        }
    }

    #[must_use]
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.metrics.as_ref().map(Metrics::snapshot)
    }
}
