use arq_spsc::BufferSize;
use proptest::prelude::*;

// Pure ring arithmetic needs no shared memory, so it's the one area of this
// protocol cheap enough to exercise at proptest volume; everything else in
// `tests/integration_tests.rs` needs a real segment per case.

type B6 = BufferSize<6>;
type B10 = BufferSize<10>;

proptest! {
    #[test]
    fn offset_after_distance_to_wrap_is_zero_n6(index in 0u64..1_000_000) {
        let d = B6::distance_to_wrap(index);
        prop_assert_eq!(B6::offset(index + d), 0);
    }

    #[test]
    fn offset_after_distance_to_wrap_is_zero_n10(index in 0u64..1_000_000) {
        let d = B10::distance_to_wrap(index);
        prop_assert_eq!(B10::offset(index + d), 0);
    }

    #[test]
    fn generation_increases_by_exactly_one_per_wrap(index in 0u64..1_000_000) {
        let d = B6::distance_to_wrap(index);
        prop_assert_eq!(B6::generation(index + d), B6::generation(index) + 1);
    }

    #[test]
    fn offset_is_always_within_capacity(index in any::<u64>()) {
        prop_assert!(B6::offset(index) < B6::BYTES);
    }

    #[test]
    fn distance_to_wrap_is_always_between_one_and_capacity(index in any::<u64>()) {
        let d = B6::distance_to_wrap(index);
        prop_assert!(d >= 1 && d <= B6::BYTES);
    }
}
