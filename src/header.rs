//! Fixed shared-memory layout: the common header, the two index atomics, and the
//! ring-data offset calculator.
//!
//! The ring itself is `2^N` bytes for a const generic `N`, which stable Rust
//! cannot express as an embedded `[u8; 2^N]` array field. Instead of a literal
//! Rust struct spanning the whole mapping, [`QueueLayout`] is a zero-sized type
//! that computes fixed byte offsets from the mapping base; every field is reached
//! through a raw pointer cast at the computed offset. Nothing in the mapping is
//! ever constructed, moved, or dropped as a Rust value — it is read and written in
//! place, under the orderings documented on each accessor.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use crate::buffer_size::BufferSize;
use crate::error::QueueError;
use crate::size_prefix::SizePrefix;

/// Identifies this header layout family, independent of the semantic version.
/// Any mapping whose header does not start with this value was not created by
/// this library (or is a different, incompatible layout revision).
const MAGIC_NUMBER: u64 = 0xA55E_5350_5343_3101;

const LIBRARY_VERSION_MAJOR: u16 = 0;
const LIBRARY_VERSION_MINOR: u16 = 1;
const LIBRARY_VERSION_PATCH: u16 = 0;

/// Discriminates what kind of queue a segment holds.
///
/// Only [`QueueType::SpscVariableLength`] is implemented by this crate; the other
/// variants are reserved so a future multi-producer or multi-consumer variant can
/// share this header without breaking the tag's meaning for existing readers.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueType {
    /// Segment has been mapped but not yet initialized by its host.
    None = 0,
    SpscVariableLength = 1,
    SpmcVariableLength = 2,
    MpscVariableLength = 3,
}

impl QueueType {
    fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::SpscVariableLength),
            2 => Some(Self::SpmcVariableLength),
            3 => Some(Self::MpscVariableLength),
            _ => None,
        }
    }
}

/// Fixed-layout, trivially-copyable header placed at offset 0 of every segment.
///
/// `queue_type` is the only field accessed through an atomic; every other field
/// is written once by the host before the type tag's release store and read only
/// after a producer/consumer's acquire load of that same tag observes it, so
/// plain reads of the rest of the header are safe without their own atomics.
#[repr(C)]
pub struct CommonHeader {
    pub queue_type: AtomicU32,
    pub magic_number: u64,
    pub version_major: u16,
    pub version_minor: u16,
    pub version_patch: u16,
    pub message_size_prefix_bytes: u64,
    pub max_producers: u64,
    pub max_consumers: u64,
    pub ring_size_bytes: u64,
    pub cache_line_size: u64,
}

/// Zero-sized offset calculator for a queue's fixed-layout segment.
///
/// Parameterized on the same `N`/`P` as the role facades, so header/index/ring
/// offsets are computed identically (and at compile time) everywhere they're
/// needed.
pub struct QueueLayout<const N: u8, P> {
    _prefix: PhantomData<P>,
}

impl<const N: u8, P: SizePrefix> QueueLayout<N, P> {
    /// Cache-line pad size used to separate the header, the write index, the
    /// read index, and the ring data. Derived from `crossbeam_utils::CachePadded`
    /// rather than hardcoded, so it tracks whatever this platform's actual
    /// destructive-interference size is; the value is also stored in the header
    /// so two processes built for different pad sizes fail validation instead of
    /// silently misreading each other's indices.
    pub const CACHE_LINE: usize = std::mem::align_of::<crossbeam_utils::CachePadded<u8>>();

    const _ASSERT_HEADER_FITS: () = assert!(
        std::mem::size_of::<CommonHeader>() <= Self::CACHE_LINE,
        "CommonHeader must fit within one cache line of padding"
    );

    pub const WRITE_INDEX_OFFSET: usize = Self::CACHE_LINE;
    pub const READ_INDEX_OFFSET: usize = Self::CACHE_LINE * 2;
    pub const RING_OFFSET: usize = Self::CACHE_LINE * 3;
    pub const TOTAL_SIZE: usize = {
        let _ = Self::_ASSERT_HEADER_FITS;
        Self::RING_OFFSET + BufferSize::<N>::BYTES as usize
    };

    /// # Safety
    /// `base` must point to a mapping of at least [`Self::TOTAL_SIZE`] bytes,
    /// valid for as long as the returned pointer is used.
    #[must_use]
    pub unsafe fn common_header(base: *mut u8) -> *mut CommonHeader {
        base.cast()
    }

    /// # Safety
    /// Same requirement as [`Self::common_header`].
    #[must_use]
    pub unsafe fn write_index(base: *mut u8) -> *const AtomicU64 {
        base.add(Self::WRITE_INDEX_OFFSET).cast()
    }

    /// # Safety
    /// Same requirement as [`Self::common_header`].
    #[must_use]
    pub unsafe fn read_index(base: *mut u8) -> *const AtomicU64 {
        base.add(Self::READ_INDEX_OFFSET).cast()
    }

    /// # Safety
    /// Same requirement as [`Self::common_header`].
    #[must_use]
    pub unsafe fn ring(base: *mut u8) -> *mut u8 {
        base.add(Self::RING_OFFSET)
    }

    /// Populate the header and the two indices, then publish the queue-type tag.
    /// Called exactly once, by the host, on a freshly mapped (zero-filled)
    /// segment.
    ///
    /// # Safety
    /// `base` must point to a mapping of at least [`Self::TOTAL_SIZE`] zero-filled
    /// bytes, not concurrently accessed by any other role until this call returns.
    pub unsafe fn initialize(base: *mut u8) {
        let header = Self::common_header(base);
        (*header).magic_number = MAGIC_NUMBER;
        (*header).version_major = LIBRARY_VERSION_MAJOR;
        (*header).version_minor = LIBRARY_VERSION_MINOR;
        (*header).version_patch = LIBRARY_VERSION_PATCH;
        (*header).message_size_prefix_bytes = P::BYTES as u64;
        (*header).max_producers = 1;
        (*header).max_consumers = 1;
        (*header).ring_size_bytes = BufferSize::<N>::BYTES;
        (*header).cache_line_size = Self::CACHE_LINE as u64;

        (*Self::write_index(base)).store(0, Ordering::Release);
        (*Self::read_index(base)).store(0, Ordering::Release);

        (*header)
            .queue_type
            .store(QueueType::SpscVariableLength as u32, Ordering::Release);
    }

    /// Spin (sleeping ~1ms between polls) until the host has published the
    /// queue-type tag, then validate every layout-affecting header field against
    /// this role's compile-time parameters.
    ///
    /// The semantic version is recorded in the header but deliberately excluded
    /// from validation: it is diagnostic metadata, not part of the wire contract.
    ///
    /// # Safety
    /// Same requirement as [`Self::common_header`].
    pub unsafe fn wait_and_validate(base: *mut u8) -> Result<(), QueueError> {
        let header = Self::common_header(base);
        loop {
            if (*header).queue_type.load(Ordering::Acquire) != QueueType::None as u32 {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }

        let mismatch = |reason: String| QueueError::MismatchedLayout { reason };

        if (*header).magic_number != MAGIC_NUMBER {
            return Err(mismatch("magic number does not match this library".into()));
        }
        let tag = (*header).queue_type.load(Ordering::Acquire);
        if QueueType::from_u32(tag) != Some(QueueType::SpscVariableLength) {
            return Err(mismatch(format!(
                "queue type tag {tag} is not SPSC variable-length"
            )));
        }
        if (*header).message_size_prefix_bytes != P::BYTES as u64 {
            return Err(mismatch(format!(
                "segment uses a {}-byte size prefix, expected {}",
                (*header).message_size_prefix_bytes,
                P::BYTES
            )));
        }
        if (*header).max_producers != 1 {
            return Err(mismatch("segment was not created for a single producer".into()));
        }
        if (*header).max_consumers != 1 {
            return Err(mismatch("segment was not created for a single consumer".into()));
        }
        if (*header).ring_size_bytes != BufferSize::<N>::BYTES {
            return Err(mismatch(format!(
                "segment ring is {} bytes, expected {}",
                (*header).ring_size_bytes,
                BufferSize::<N>::BYTES
            )));
        }
        if (*header).cache_line_size != Self::CACHE_LINE as u64 {
            return Err(mismatch(format!(
                "segment was laid out with a {}-byte cache line, this build uses {}",
                (*header).cache_line_size,
                Self::CACHE_LINE
            )));
        }

        Ok(())
    }
}
