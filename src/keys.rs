//! # Key Scheme
//!
//! Deterministic derivation of store keys from `(content, platform, date)`.
//! Everything lives under the `shares:` prefix so the namespace can be wiped
//! in one scan.
//!
//! ```text
//! shares:total:{content}                        → content total
//! shares:platform:{content}:{platform}          → per-platform count
//! shares:daily:{content}:{YYYY-MM-DD}           → daily bucket (7d TTL)
//! shares:weekly:{content}:{YYYY-Www}            → weekly bucket (30d TTL)
//! shares:monthly:{content}:{YYYY-MM}            → monthly bucket (365d TTL)
//! shares:last:{content}                         → last-shared timestamp
//! shares:events:{content}                       → capped event log (30d TTL)
//! shares:global:total                           → global total
//! shares:global:leaderboard                     → sorted set, score = total
//! shares:global:platforms                       → platform histogram hash
//! shares:dedup:{ip_hash}:{content}:{platform}   → dedup token (1h TTL)
//! ```
//!
//! Week labels use a simple `ceil(day_of_year / 7)` numbering, not ISO-8601
//! weeks. Existing bucket keys depend on it, so changing it breaks stats
//! continuity.

use chrono::{Datelike, Days, NaiveDate};

pub const PREFIX: &str = "shares:";

pub const DEDUP_TTL_SECS: u64 = 3600;
pub const DAILY_TTL_SECS: u64 = 7 * 86400;
pub const WEEKLY_TTL_SECS: u64 = 30 * 86400;
pub const MONTHLY_TTL_SECS: u64 = 365 * 86400;
pub const EVENT_LOG_CAP: usize = 1000;
pub const EVENT_LOG_TTL_SECS: u64 = 30 * 86400;

pub const DAILY_WINDOW: usize = 7;
pub const WEEKLY_WINDOW: usize = 4;
pub const MONTHLY_WINDOW: usize = 12;

/// The platform set the reporting path reads. Events for platforms outside
/// this list are still counted in their own keys and in the histogram, but
/// per-content reads only fan out across these.
pub const PLATFORMS: [&str; 7] = [
    "twitter", "weibo", "linkedin", "facebook", "qq", "wechat", "copy",
];

pub fn total(content: &str) -> String {
    format!("{PREFIX}total:{content}")
}

pub fn platform(content: &str, platform: &str) -> String {
    format!("{PREFIX}platform:{content}:{platform}")
}

pub fn daily(content: &str, date: NaiveDate) -> String {
    format!("{PREFIX}daily:{content}:{}", day_label(date))
}

pub fn weekly(content: &str, date: NaiveDate) -> String {
    format!("{PREFIX}weekly:{content}:{}", week_label(date))
}

pub fn monthly(content: &str, date: NaiveDate) -> String {
    format!("{PREFIX}monthly:{content}:{}", month_label(date))
}

pub fn last_shared(content: &str) -> String {
    format!("{PREFIX}last:{content}")
}

pub fn events(content: &str) -> String {
    format!("{PREFIX}events:{content}")
}

pub fn global_total() -> String {
    format!("{PREFIX}global:total")
}

pub fn leaderboard() -> String {
    format!("{PREFIX}global:leaderboard")
}

pub fn histogram() -> String {
    format!("{PREFIX}global:platforms")
}

pub fn dedup(ip_hash: &str, content: &str, platform: &str) -> String {
    format!("{PREFIX}dedup:{ip_hash}:{content}:{platform}")
}

pub fn day_label(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Simple week index: ceil(day_of_year / 7). Weeks restart at each Jan 1 and
/// can disagree with ISO week numbers near year boundaries.
pub fn week_label(date: NaiveDate) -> String {
    let week = (date.ordinal() + 6) / 7;

    format!("{}-W{:02}", date.year(), week)
}

pub fn month_label(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// The `count` most recent daily dates, newest first, starting at `today`.
pub fn daily_window(today: NaiveDate, count: usize) -> Vec<NaiveDate> {
    (0..count)
        .filter_map(|i| today.checked_sub_days(Days::new(i as u64)))
        .collect()
}

/// One representative date per week for the `count` most recent weekly
/// buckets, newest first, stepping back 7 days.
pub fn weekly_window(today: NaiveDate, count: usize) -> Vec<NaiveDate> {
    (0..count)
        .filter_map(|i| today.checked_sub_days(Days::new(7 * i as u64)))
        .collect()
}

/// The first of each month for the `count` most recent monthly buckets,
/// newest first.
pub fn monthly_window(today: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut year = today.year();
    let mut month = today.month();
    let mut dates = Vec::with_capacity(count);

    for _ in 0..count {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, 1) {
            dates.push(date);
        }
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }

    dates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn key_shapes() {
        assert_eq!(total("hello-world"), "shares:total:hello-world");
        assert_eq!(
            platform("hello-world", "twitter"),
            "shares:platform:hello-world:twitter"
        );
        assert_eq!(
            daily("hello-world", date(2024, 10, 15)),
            "shares:daily:hello-world:2024-10-15"
        );
        assert_eq!(last_shared("a"), "shares:last:a");
        assert_eq!(events("a"), "shares:events:a");
        assert_eq!(global_total(), "shares:global:total");
        assert_eq!(
            dedup("abcd1234", "a", "copy"),
            "shares:dedup:abcd1234:a:copy"
        );
    }

    #[test]
    fn every_key_is_namespaced() {
        for key in [
            total("a"),
            platform("a", "qq"),
            daily("a", date(2024, 1, 1)),
            weekly("a", date(2024, 1, 1)),
            monthly("a", date(2024, 1, 1)),
            last_shared("a"),
            events("a"),
            global_total(),
            leaderboard(),
            histogram(),
            dedup("h", "a", "qq"),
        ] {
            assert!(key.starts_with(PREFIX), "{key}");
        }
    }

    #[test]
    fn week_numbering_is_the_simple_scheme() {
        assert_eq!(week_label(date(2024, 1, 1)), "2024-W01");
        assert_eq!(week_label(date(2024, 1, 7)), "2024-W01");
        assert_eq!(week_label(date(2024, 1, 8)), "2024-W02");
        // Oct 15 2024 is day 289, ceil(289/7) = 42
        assert_eq!(week_label(date(2024, 10, 15)), "2024-W42");
        // day 366 of a leap year still lands in week 53
        assert_eq!(week_label(date(2024, 12, 31)), "2024-W53");
        // not ISO: 2024-12-30 is ISO week 2025-W01, here it stays in 2024
        assert_eq!(week_label(date(2024, 12, 30)), "2024-W53");
    }

    #[test]
    fn month_and_day_labels() {
        assert_eq!(day_label(date(2024, 3, 5)), "2024-03-05");
        assert_eq!(month_label(date(2024, 3, 5)), "2024-03");
    }

    #[test]
    fn daily_window_is_newest_first() {
        let days = daily_window(date(2024, 3, 2), 4);
        assert_eq!(
            days,
            vec![
                date(2024, 3, 2),
                date(2024, 3, 1),
                date(2024, 2, 29),
                date(2024, 2, 28),
            ]
        );
    }

    #[test]
    fn weekly_window_steps_back_seven_days() {
        let labels: Vec<String> = weekly_window(date(2024, 10, 15), 4)
            .into_iter()
            .map(week_label)
            .collect();
        assert_eq!(labels, vec!["2024-W42", "2024-W41", "2024-W40", "2024-W39"]);
    }

    #[test]
    fn monthly_window_crosses_year_boundary() {
        let labels: Vec<String> = monthly_window(date(2024, 2, 10), 4)
            .into_iter()
            .map(month_label)
            .collect();
        assert_eq!(labels, vec!["2024-02", "2024-01", "2023-12", "2023-11"]);
    }

    #[test]
    fn contract_constants() {
        assert_eq!(DEDUP_TTL_SECS, 3600);
        assert_eq!(DAILY_TTL_SECS, 604_800);
        assert_eq!(WEEKLY_TTL_SECS, 2_592_000);
        assert_eq!(MONTHLY_TTL_SECS, 31_536_000);
        assert_eq!(EVENT_LOG_CAP, 1000);
        assert_eq!(EVENT_LOG_TTL_SECS, 2_592_000);
    }
}
