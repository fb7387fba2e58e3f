// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
///
/// Microsecond precision matches what Firestore keeps, and the fixed width
/// keeps lexical and chronological order identical.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_is_fixed_width() {
        let whole = DateTime::from_timestamp(1_704_103_200, 0).unwrap();
        let frac = DateTime::from_timestamp(1_704_103_200, 5_000).unwrap();

        assert_eq!(format_utc_rfc3339(whole), "2024-01-01T10:00:00.000000Z");
        assert_eq!(format_utc_rfc3339(frac), "2024-01-01T10:00:00.000005Z");
        assert!(format_utc_rfc3339(whole) < format_utc_rfc3339(frac));
    }
}
