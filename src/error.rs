//! Typed error surface shared by every role.

use thiserror::Error;

/// Everything that can go wrong setting up or operating a queue.
///
/// Variants split into the two classes the roles actually need to react to
/// differently: setup/configuration failures (terminal for the role instance) and
/// the single runtime data-plane failure, [`QueueError::Overrun`].
#[derive(Debug, Clone, Error)]
pub enum QueueError {
    /// The supplied segment name is empty or too long once the library's prefix
    /// is added.
    #[error("invalid segment name {name:?}: {reason}")]
    InvalidName {
        name: String,
        reason: &'static str,
    },

    /// A host tried to create a segment that already exists.
    #[error("segment {name:?} already exists")]
    AlreadyExists { name: String },

    /// A producer or consumer tried to attach to a segment that does not exist.
    #[error("segment {name:?} does not exist")]
    NotFound { name: String },

    /// `shm_open`/`ftruncate`/`mmap` failed.
    #[error("failed to map segment {name:?}: {syscall} returned errno {errno}")]
    MapFailed {
        name: String,
        syscall: &'static str,
        errno: i32,
    },

    /// The segment's header does not match this role's compile-time parameters.
    #[error("segment layout mismatch: {reason}")]
    MismatchedLayout { reason: String },

    /// A `ProducerConfig`/`ConsumerConfig` value is not valid for this ring's
    /// geometry.
    #[error("invalid queue configuration: {reason}")]
    InvalidConfig { reason: &'static str },

    /// The producer has lapped the consumer's read cursor. The consumer that
    /// returns this is poisoned: every subsequent `read()` call returns the same
    /// error without re-deriving state from the (possibly torn) ring.
    #[error("consumer overrun: producer has lapped the read cursor")]
    Overrun,
}
