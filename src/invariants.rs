//! Runtime checks for the protocol's programming-contract invariants.
//!
//! Every macro here compiles to nothing in release builds (`debug_assert!`); they
//! exist to turn a silent contract violation into an immediate panic during
//! development and testing instead of a subtle corruption discovered later.

/// A message length passed to `allocate_write` must be nonzero — zero is reserved
/// for the skip marker.
macro_rules! debug_assert_nonzero_message {
    ($len:expr) => {
        debug_assert!($len > 0, "allocate_write(0) is undefined: 0 is reserved for skip markers");
    };
}

/// A message must fit under the configured batch reserve, or a single allocation
/// could never be satisfied by one `reserve()` call.
macro_rules! debug_assert_message_fits_batch {
    ($len:expr, $batch_reserve:expr) => {
        debug_assert!(
            ($len as u64) < $batch_reserve,
            "message of {} bytes does not fit under batch_reserve {}",
            $len,
            $batch_reserve
        );
    };
}

/// Ring indices only ever advance.
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "{} went backwards: {} -> {}",
            $name,
            $old,
            $new
        );
    };
}

/// At construction, the batch reserve plus one size prefix must leave headroom in
/// the ring, or the producer could be asked to reserve more than the ring can ever
/// hold.
macro_rules! debug_assert_batch_reserve_headroom {
    ($batch_reserve:expr, $prefix_bytes:expr, $ring_bytes:expr) => {
        debug_assert!(
            $batch_reserve + ($prefix_bytes as u64) < $ring_bytes,
            "batch_reserve {} leaves no headroom in a {}-byte ring",
            $batch_reserve,
            $ring_bytes
        );
    };
}

pub(crate) use debug_assert_batch_reserve_headroom;
pub(crate) use debug_assert_message_fits_batch;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_nonzero_message;
