//! The consumer role: tracks the read cursor, decodes frames, and detects
//! overrun.

use std::marker::PhantomData;
use std::slice;
use std::sync::atomic::Ordering;

use crate::buffer_size::BufferSize;
use crate::config::ConsumerConfig;
use crate::error::QueueError;
use crate::header::QueueLayout;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::segment::Segment;
use crate::size_prefix::SizePrefix;

/// The single reader attached to a queue.
///
/// Not `Clone`: a second consumer reading the same ring would race the first
/// over which bytes have been delivered.
pub struct Consumer<const N: u8, P> {
    segment: Segment,
    base: *mut u8,
    /// Snapshot of the producer's reservation frontier, used only for overrun
    /// detection.
    cached_write_index: u64,
    /// Snapshot of the producer's release frontier (the shared read index).
    cached_read_index: u64,
    /// This consumer's own cursor of bytes already delivered to callers.
    read_index: u64,
    overrun: bool,
    metrics: Option<Metrics>,
    _prefix: PhantomData<P>,
}

impl<const N: u8, P: SizePrefix> Consumer<N, P> {
    /// Attach to an existing, already-initialized segment.
    ///
    /// A consumer that attaches mid-stream begins reading from wherever the
    /// producer has currently released, not from the start of the ring — it
    /// never sees backlog written before it attached.
    pub fn attach(name: &str) -> Result<Self, QueueError> {
        Self::attach_with_config(name, ConsumerConfig::default())
    }

    pub fn attach_with_config(name: &str, config: ConsumerConfig) -> Result<Self, QueueError> {
        let segment = Segment::attach(name, QueueLayout::<N, P>::TOTAL_SIZE)?;
        let base = segment.as_ptr();
        unsafe {
            QueueLayout::<N, P>::wait_and_validate(base)?;
        }

        let cached_write_index = unsafe { (*QueueLayout::<N, P>::write_index(base)).load(Ordering::Acquire) };
        let cached_read_index = unsafe { (*QueueLayout::<N, P>::read_index(base)).load(Ordering::Acquire) };

        Ok(Self {
            segment,
            base,
            cached_write_index,
            cached_read_index,
            read_index: cached_read_index,
            overrun: false,
            metrics: config.enable_metrics.then(Metrics::default),
            _prefix: PhantomData,
        })
    }

    /// Non-blocking: returns the next message, or `Ok(None)` if none is
    /// currently available.
    ///
    /// Once this returns `Err(QueueError::Overrun)`, every subsequent call
    /// returns the same error — the consumer is poisoned rather than attempting
    /// to re-derive state from a ring the producer may have already overwritten.
    pub fn read(&mut self) -> Result<Option<&[u8]>, QueueError> {
        if self.overrun {
            return Err(QueueError::Overrun);
        }

        if self.read_index >= self.cached_read_index {
            self.refresh()?;
            if self.read_index >= self.cached_read_index {
                return Ok(None);
            }
        }

        Ok(Some(self.decode()))
    }

    fn refresh(&mut self) -> Result<(), QueueError> {
        self.cached_write_index =
            unsafe { (*QueueLayout::<N, P>::write_index(self.base)).load(Ordering::Acquire) };

        let read_gen = BufferSize::<N>::generation(self.read_index);
        let write_gen = BufferSize::<N>::generation(self.cached_write_index);
        if write_gen > read_gen {
            let read_off = BufferSize::<N>::offset(self.read_index);
            let write_off = BufferSize::<N>::offset(self.cached_write_index);
            if write_off > read_off {
                self.overrun = true;
                if let Some(metrics) = &self.metrics {
                    metrics.add_overrun();
                }
                return Err(QueueError::Overrun);
            }
        }

        self.cached_read_index =
            unsafe { (*QueueLayout::<N, P>::read_index(self.base)).load(Ordering::Acquire) };
        Ok(())
    }

    fn decode(&mut self) -> &[u8] {
        let ring = unsafe { QueueLayout::<N, P>::ring(self.base) };
        let mut off = BufferSize::<N>::offset(self.read_index) as usize;
        let mut size = unsafe { P::read(slice::from_raw_parts(ring.add(off), P::BYTES)) };

        if size == 0 {
            self.read_index += BufferSize::<N>::distance_to_wrap(self.read_index);
            off = 0;
            size = unsafe { P::read(slice::from_raw_parts(ring.add(off), P::BYTES)) };
        }

        self.read_index += size + P::BYTES as u64;

        if let Some(metrics) = &self.metrics {
            metrics.add_message_read();
        }

        unsafe { slice::from_raw_parts(ring.add(off + P::BYTES), size as usize) }
    }

    #[must_use]
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.metrics.as_ref().map(Metrics::snapshot)
    }
}
