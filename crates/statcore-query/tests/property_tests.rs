//! Property-based tests for the milestone star/experience conversion.
//!
//! Run with: cargo test --test property_tests

use proptest::prelude::*;
use statcore_query::{exp_to_stars, stars_to_exp};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: `exp_to_stars` inverts `stars_to_exp` for every star count
    /// in the range the milestone finder is expected to operate over (§8).
    #[test]
    fn exp_to_stars_inverts_stars_to_exp(n in 0i64..=10_000) {
        prop_assert_eq!(exp_to_stars(stars_to_exp(n)), n);
    }

    /// Property: `stars_to_exp` is monotonically non-decreasing, since every
    /// star offset costs a non-negative amount of experience.
    #[test]
    fn stars_to_exp_is_monotonic(a in 0i64..=10_000, b in 0i64..=10_000) {
        if a <= b {
            prop_assert!(stars_to_exp(a) <= stars_to_exp(b));
        }
    }
}
