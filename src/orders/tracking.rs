//! Tracking and delivery estimates

use jiff::Timestamp;
use rand::Rng;

use crate::clock::shift_days;

/// Prefix of every tracking number.
pub const TRACKING_PREFIX: &str = "TLX";

const TRACKING_SUFFIX_LEN: usize = 9;

/// Earliest delivery estimate, in days after ordering.
pub const MIN_DELIVERY_DAYS: i64 = 7;

/// Latest delivery estimate, in days after ordering.
pub const MAX_DELIVERY_DAYS: i64 = 14;

/// Generates `TLX` followed by nine upper-case base-36 characters.
pub fn tracking_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix = (0..TRACKING_SUFFIX_LEN)
        .filter_map(|_| char::from_digit(rng.gen_range(0..36), 36))
        .map(|c| c.to_ascii_uppercase());

    TRACKING_PREFIX.chars().chain(suffix).collect()
}

/// Picks a delivery estimate a whole number of days after `ordered_at`.
pub fn expected_delivery<R: Rng + ?Sized>(rng: &mut R, ordered_at: Timestamp) -> Timestamp {
    shift_days(
        ordered_at,
        rng.gen_range(MIN_DELIVERY_DAYS..=MAX_DELIVERY_DAYS),
    )
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn tracking_numbers_are_prefixed_base36() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let number = tracking_number(&mut rng);

            assert_eq!(number.len(), 12);
            assert!(number.starts_with(TRACKING_PREFIX));
            assert!(
                number
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()),
                "unexpected character in {number}"
            );
        }
    }

    #[test]
    fn delivery_estimates_fall_in_window() {
        let mut rng = StdRng::seed_from_u64(11);
        let now = Timestamp::UNIX_EPOCH;

        for _ in 0..100 {
            let expected = expected_delivery(&mut rng, now);
            let days = expected.duration_since(now);

            assert!(days >= SignedDuration::from_hours(24 * MIN_DELIVERY_DAYS));
            assert!(days <= SignedDuration::from_hours(24 * MAX_DELIVERY_DAYS));
            assert_eq!(days.as_secs() % 86_400, 0);
        }
    }
}
