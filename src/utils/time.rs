//! Scrape window arithmetic.

use chrono::Utc;

/// Compute the `(start, end)` scrape window for the current wall clock.
///
/// `now` is floored to a period boundary when `period > 0` so that
/// consecutive scrapes with the same settings request aligned windows.
pub fn scrape_window(period: i64, length: i64, delay: i64) -> (i64, i64) {
    window_at(Utc::now().timestamp(), period, length, delay)
}

/// Window rule: `start = now - length - delay`, `end = now - delay`.
pub fn window_at(now: i64, period: i64, length: i64, delay: i64) -> (i64, i64) {
    let mut now = now;
    if period > 0 {
        now = (now / period) * period;
    }
    (now - length - delay, now - delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn window_is_aligned_to_period() {
        let (start, end) = window_at(1_700_000_030, 60, 60, 0);
        assert_eq!(end % 60, 0);
        assert_eq!(end - start, 60);
    }

    #[test]
    fn delay_shifts_both_ends() {
        let (start, end) = window_at(1_700_000_000, 60, 300, 120);
        assert_eq!(end, (1_700_000_000 / 60) * 60 - 120);
        assert_eq!(end - start, 300);
    }

    #[test]
    fn zero_period_skips_alignment() {
        let (start, end) = window_at(1_700_000_031, 0, 60, 0);
        assert_eq!(end, 1_700_000_031);
        assert_eq!(start, 1_700_000_031 - 60);
    }

    proptest! {
        #[test]
        fn window_length_and_alignment(
            now in 1_000_000_000i64..2_000_000_000,
            period in 1i64..=86_400,
            length in 0i64..=604_800,
            delay in 0i64..=3_600,
        ) {
            let (start, end) = window_at(now, period, length, delay);
            prop_assert_eq!(end - start, length);
            prop_assert_eq!((end + delay) % period, 0);
        }
    }
}
