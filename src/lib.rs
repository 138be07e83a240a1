//! A lock-free single-producer single-consumer variable-length message queue
//! built on a POSIX shared-memory segment.
//!
//! Three roles share one named segment: a [`Host`] creates and initializes it, a
//! [`Producer`] frames and publishes messages into it, and a [`Consumer`] reads
//! them back out. No kernel mediation is needed on the fast path — the three
//! roles coordinate entirely through a small fixed header and two cache-line
//! isolated atomic indices living in the shared mapping.
//!
//! # Example
//!
//! ```no_run
//! use arq_spsc::{Consumer, ConsumerConfig, Host, Producer, ProducerConfig, U32Prefix};
//!
//! const N: u8 = 16; // 64 KiB ring
//!
//! // One process (or one thread, for this in-process demo) hosts the segment.
//! let _host = Host::<N, U32Prefix>::create("example").unwrap();
//!
//! let mut producer =
//!     Producer::<N, U32Prefix>::attach("example", ProducerConfig::default()).unwrap();
//! producer.allocate_write(5).copy_from_slice(b"hello");
//! producer.flush();
//!
//! let mut consumer =
//!     Consumer::<N, U32Prefix>::attach_with_config("example", ConsumerConfig::default()).unwrap();
//! let message = consumer.read().unwrap().unwrap();
//! assert_eq!(message, b"hello");
//! ```

mod buffer_size;
mod config;
mod consumer;
mod error;
mod header;
mod host;
mod invariants;
mod metrics;
mod producer;
mod segment;
mod size_prefix;

pub use buffer_size::BufferSize;
pub use config::{ConsumerConfig, ProducerConfig, HIGH_THROUGHPUT_PRODUCER, LOW_LATENCY_PRODUCER};
pub use consumer::Consumer;
pub use error::QueueError;
pub use header::{CommonHeader, QueueLayout, QueueType};
pub use host::Host;
pub use metrics::{Metrics, MetricsSnapshot};
pub use producer::Producer;
pub use segment::{Segment, SHM_PREFIX};
pub use size_prefix::{SizePrefix, U16Prefix, U32Prefix, U64Prefix, U8Prefix};
