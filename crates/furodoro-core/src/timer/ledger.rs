//! Work/break credit arithmetic.
//!
//! Net work seconds grow by one per worked second and shrink by
//! `work_ratio / break_ratio` per rested second. The break a user has earned
//! is the positive part of that balance scaled by the ratio.

/// Break units earned per `work_ratio` work units. Fixed.
pub const BREAK_RATIO: i64 = 1;

/// Seconds of break earned by `net` seconds of net work.
///
/// A deficit (`net <= 0`) earns nothing; it never yields a negative duration.
pub fn earned_break_seconds(net: i64, work_ratio: i64, break_ratio: i64) -> i64 {
    if net <= 0 || work_ratio <= 0 {
        return 0;
    }
    (net * break_ratio).div_euclid(work_ratio)
}

/// Net work seconds consumed by one second of break.
pub fn break_cost_per_second(work_ratio: i64, break_ratio: i64) -> i64 {
    if work_ratio > 0 && break_ratio > 0 {
        work_ratio / break_ratio
    } else {
        0
    }
}

/// Signed earned-rest value for display.
///
/// Unlike [`earned_break_seconds`] a deficit is reported as a negative
/// number, computed from the magnitude of the balance.
pub fn earned_rest_display_seconds(net: i64, work_ratio: i64, break_ratio: i64) -> i64 {
    let earned = earned_break_seconds(net.abs(), work_ratio, break_ratio);
    if net < 0 {
        -earned
    } else {
        earned
    }
}

/// Format a second count as `MM:SS`, minutes unbounded.
pub fn format_mm_ss(total_seconds: u64) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// `"Earned Rest: MM:SS"`, with a leading `-` for a credit deficit.
pub fn earned_rest_text(net: i64, work_ratio: i64) -> String {
    let earned = earned_rest_display_seconds(net, work_ratio, BREAK_RATIO);
    if earned == 0 {
        return "Earned Rest: 00:00".to_string();
    }
    let sign = if earned < 0 { "-" } else { "" };
    format!("Earned Rest: {sign}{}", format_mm_ss(earned.unsigned_abs()))
}

/// `"Total Work: MM:SS"` of gross work time.
pub fn total_work_text(gross: u64) -> String {
    format!("Total Work: {}", format_mm_ss(gross))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn earned_break_floors() {
        assert_eq!(earned_break_seconds(1500, 3, BREAK_RATIO), 500);
        assert_eq!(earned_break_seconds(5, 3, BREAK_RATIO), 1);
        assert_eq!(earned_break_seconds(2, 3, BREAK_RATIO), 0);
    }

    #[test]
    fn deficit_earns_nothing() {
        assert_eq!(earned_break_seconds(-900, 3, BREAK_RATIO), 0);
        assert_eq!(earned_break_seconds(0, 3, BREAK_RATIO), 0);
    }

    #[test]
    fn cost_is_ratio_over_break_ratio() {
        assert_eq!(break_cost_per_second(3, BREAK_RATIO), 3);
        assert_eq!(break_cost_per_second(0, BREAK_RATIO), 0);
    }

    #[test]
    fn earned_rest_text_shows_deficit() {
        assert_eq!(earned_rest_text(1500, 3), "Earned Rest: 08:20");
        assert_eq!(earned_rest_text(-360, 3), "Earned Rest: -02:00");
        assert_eq!(earned_rest_text(-2, 3), "Earned Rest: 00:00");
        assert_eq!(earned_rest_text(0, 3), "Earned Rest: 00:00");
    }

    #[test]
    fn total_work_text_pads() {
        assert_eq!(total_work_text(65), "Total Work: 01:05");
        assert_eq!(total_work_text(6000), "Total Work: 100:00");
    }

    proptest! {
        #[test]
        fn earned_break_matches_floor_division(net in 0i64..10_000_000, ratio in 1i64..100) {
            prop_assert_eq!(earned_break_seconds(net, ratio, 1), net / ratio);
        }

        #[test]
        fn negative_balance_earns_zero(net in -10_000_000i64..0, ratio in 1i64..100) {
            prop_assert_eq!(earned_break_seconds(net, ratio, 1), 0);
        }
    }
}
