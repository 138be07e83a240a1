//! The host role: creates and initializes a segment, then merely keeps it alive.

use std::marker::PhantomData;

use crate::error::QueueError;
use crate::header::QueueLayout;
use crate::segment::Segment;
use crate::size_prefix::SizePrefix;

/// Creates and owns the lifetime of a queue's shared-memory segment.
///
/// A `Host` does not read or write the ring or the indices after
/// initialization — its only remaining job is to hold the segment (and its
/// unlink-on-drop responsibility) alive for as long as the queue should exist.
pub struct Host<const N: u8, P> {
    segment: Segment,
    _prefix: PhantomData<P>,
}

impl<const N: u8, P: SizePrefix> Host<N, P> {
    /// Create a brand-new segment and initialize its header. Fails with
    /// [`QueueError::AlreadyExists`] if a segment of this name is already
    /// present.
    pub fn create(name: &str) -> Result<Self, QueueError> {
        let segment = Segment::create(name, QueueLayout::<N, P>::TOTAL_SIZE)?;
        unsafe {
            QueueLayout::<N, P>::initialize(segment.as_ptr());
        }
        Ok(Self {
            segment,
            _prefix: PhantomData,
        })
    }

    /// Unconditionally remove any existing segment of this name, then create a
    /// fresh one.
    ///
    /// This is dangerous: any process still attached to the old segment
    /// continues to address memory that is no longer reachable by this name,
    /// and will observe neither the new header nor any subsequent traffic.
    /// Callers must guarantee no stale producer/consumer/host is still running
    /// before calling this.
    pub fn recreate(name: &str) -> Result<Self, QueueError> {
        Segment::delete_existing(name)?;
        Self::create(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.segment.name()
    }
}
