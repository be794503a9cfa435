//! Calendar-day arithmetic for exemption periods.
//!
//! All durations are plain calendar days: no timezone handling, no
//! business-day adjustment. The derived end date is recomputed from its two
//! inputs on every change and is never stored independently of them.

use chrono::{Duration, Local, NaiveDate};

/// End of an exemption: `start + duration_days` calendar days.
pub fn derive_end(start: NaiveDate, duration_days: u32) -> NaiveDate {
    start + Duration::days(i64::from(duration_days))
}

/// Today's date in the local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// An exemption is expired once its end date is strictly in the past.
pub fn is_expired(end: NaiveDate) -> bool {
    end < today()
}

/// Signed count of calendar days from today until `end`.
///
/// Negative for expired exemptions; collaborating UI uses this for the
/// "N days left" badge and for Terminale expiry cleanup.
pub fn days_remaining(end: NaiveDate) -> i64 {
    (end - today()).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn derive_end_adds_calendar_days() {
        assert_eq!(derive_end(d("2024-03-10"), 5), d("2024-03-15"));
    }

    #[test]
    fn derive_end_zero_days_is_identity() {
        assert_eq!(derive_end(d("2024-03-10"), 0), d("2024-03-10"));
    }

    #[test]
    fn derive_end_crosses_leap_february() {
        assert_eq!(derive_end(d("2024-02-28"), 2), d("2024-03-01"));
    }

    #[test]
    fn derive_end_crosses_non_leap_february() {
        assert_eq!(derive_end(d("2023-02-28"), 2), d("2023-03-02"));
    }

    #[test]
    fn derive_end_crosses_year_boundary() {
        assert_eq!(derive_end(d("2024-12-30"), 3), d("2025-01-02"));
    }

    #[test]
    fn derive_end_round_trips() {
        for days in [0u32, 1, 2, 14, 90, 366] {
            let start = d("2024-02-28");
            let end = derive_end(start, days);
            assert_eq!(end - Duration::days(i64::from(days)), start);
        }
    }

    #[test]
    fn past_end_is_expired() {
        assert!(is_expired(today() - Duration::days(1)));
        assert!(!is_expired(today()));
        assert!(!is_expired(today() + Duration::days(1)));
    }

    #[test]
    fn days_remaining_signed() {
        assert_eq!(days_remaining(today()), 0);
        assert_eq!(days_remaining(today() + Duration::days(7)), 7);
        assert_eq!(days_remaining(today() - Duration::days(3)), -3);
    }
}
