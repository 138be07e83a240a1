//! Pluggable little-endian length-prefix encodings for the frame format.
//!
//! Every frame on the ring begins with a fixed-width unsigned length prefix. The
//! width is a compile-time choice (1, 2, 4 or 8 bytes) rather than a single
//! hardcoded `u32`, so a caller with very small messages can shrink framing
//! overhead, or one with very large messages can raise the length ceiling.

use std::mem::size_of;

/// A fixed-width little-endian frame length encoding.
///
/// Sealed: the only implementors are the four marker types below, each
/// corresponding to one of the unsigned integer widths the wire format allows.
pub trait SizePrefix: Copy + Send + Sync + 'static {
    /// Number of bytes the prefix occupies on the wire.
    const BYTES: usize;
    /// Largest payload length this width can represent.
    const MAX_VALUE: u64;

    /// Decode a little-endian length from the first [`Self::BYTES`] bytes of `buf`.
    fn read(buf: &[u8]) -> u64;

    /// Encode `value` as little-endian into the first [`Self::BYTES`] bytes of `buf`.
    ///
    /// `value` must be `<= MAX_VALUE`; callers are expected to have already
    /// validated this (see [`crate::invariants`]).
    fn write(buf: &mut [u8], value: u64);
}

macro_rules! size_prefix_impl {
    ($name:ident, $repr:ty) => {
        #[doc = concat!("`", stringify!($repr), "`-wide little-endian size prefix.")]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl SizePrefix for $name {
            const BYTES: usize = size_of::<$repr>();
            const MAX_VALUE: u64 = <$repr>::MAX as u64;

            #[inline]
            fn read(buf: &[u8]) -> u64 {
                let mut raw = [0u8; size_of::<$repr>()];
                raw.copy_from_slice(&buf[..size_of::<$repr>()]);
                u64::from(<$repr>::from_le_bytes(raw))
            }

            #[inline]
            fn write(buf: &mut [u8], value: u64) {
                let bytes = (value as $repr).to_le_bytes();
                buf[..bytes.len()].copy_from_slice(&bytes);
            }
        }
    };
}

size_prefix_impl!(U8Prefix, u8);
size_prefix_impl!(U16Prefix, u16);
size_prefix_impl!(U32Prefix, u32);
size_prefix_impl!(U64Prefix, u64);

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<P: SizePrefix>(value: u64) {
        let mut buf = vec![0xAAu8; P::BYTES];
        P::write(&mut buf, value);
        assert_eq!(P::read(&buf), value);
    }

    #[test]
    fn round_trips_each_width() {
        round_trip::<U8Prefix>(0);
        round_trip::<U8Prefix>(200);
        round_trip::<U16Prefix>(40_000);
        round_trip::<U32Prefix>(70_000);
        round_trip::<U64Prefix>(1 << 40);
    }

    #[test]
    fn widths_match_repr_size() {
        assert_eq!(U8Prefix::BYTES, 1);
        assert_eq!(U16Prefix::BYTES, 2);
        assert_eq!(U32Prefix::BYTES, 4);
        assert_eq!(U64Prefix::BYTES, 8);
    }
}
