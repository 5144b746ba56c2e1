//! Read side of the counter service.
//!
//! Reporting is best-effort by contract: any individual read failure
//! degrades that field to zero/empty, and a completely unreachable store
//! yields the all-zero default instead of an error. Bucket windows are
//! computed from "now", not from what happens to be stored, so expired
//! buckets simply drop out of the view.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use tracing::warn;

use crate::{
    keys,
    models::{ContentCount, GlobalSummary, PlatformCount, ShareStats},
    store::ShareStore,
};

const TOP_PLATFORMS: usize = 10;
const TOP_CONTENT: usize = 10;

pub async fn get_stats(store: &dyn ShareStore, content: &str) -> ShareStats {
    let today = Utc::now().date_naive();

    let total = read_count(store, &keys::total(content)).await;

    let last_shared = match store.get(&keys::last_shared(content)).await {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to read last-shared for {content}: {e}");
            None
        }
    };

    let platform_keys: Vec<String> = keys::PLATFORMS
        .iter()
        .map(|p| keys::platform(content, p))
        .collect();
    let platforms: BTreeMap<String, u64> = keys::PLATFORMS
        .iter()
        .map(|p| p.to_string())
        .zip(read_counts(store, &platform_keys).await)
        .filter(|(_, count)| *count > 0)
        .collect();

    let daily_stats = read_buckets(
        store,
        &keys::daily_window(today, keys::DAILY_WINDOW),
        |date| keys::daily(content, date),
        keys::day_label,
    )
    .await;
    let weekly_stats = read_buckets(
        store,
        &keys::weekly_window(today, keys::WEEKLY_WINDOW),
        |date| keys::weekly(content, date),
        keys::week_label,
    )
    .await;
    let monthly_stats = read_buckets(
        store,
        &keys::monthly_window(today, keys::MONTHLY_WINDOW),
        |date| keys::monthly(content, date),
        keys::month_label,
    )
    .await;

    let mut top_platforms: Vec<PlatformCount> = platforms
        .iter()
        .map(|(platform, count)| PlatformCount {
            platform: platform.clone(),
            count: *count,
        })
        .collect();
    top_platforms.sort_by(|a, b| b.count.cmp(&a.count));
    top_platforms.truncate(TOP_PLATFORMS);

    ShareStats {
        total,
        platforms,
        daily_stats,
        weekly_stats,
        monthly_stats,
        last_shared,
        top_platforms,
    }
}

pub async fn get_global_stats(store: &dyn ShareStore) -> GlobalSummary {
    let total_shares = read_count(store, &keys::global_total()).await;

    let total_content = match store.ranked_len(&keys::leaderboard()).await {
        Ok(len) => len,
        Err(e) => {
            warn!("Failed to read leaderboard size: {e}");
            0
        }
    };

    let top_content = match store.ranked_top(&keys::leaderboard(), TOP_CONTENT).await {
        Ok(members) => members
            .into_iter()
            .map(|(content_key, count)| ContentCount { content_key, count })
            .collect(),
        Err(e) => {
            warn!("Failed to read leaderboard: {e}");
            Vec::new()
        }
    };

    let top_platforms = match store.hash_all(&keys::histogram()).await {
        Ok(mut counts) => {
            counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            counts
                .into_iter()
                .map(|(platform, count)| PlatformCount { platform, count })
                .collect()
        }
        Err(e) => {
            warn!("Failed to read platform histogram: {e}");
            Vec::new()
        }
    };

    GlobalSummary {
        total_shares,
        total_content,
        top_content,
        top_platforms,
    }
}

async fn read_count(store: &dyn ShareStore, key: &str) -> u64 {
    match store.get(key).await {
        Ok(value) => parse_count(key, value),
        Err(e) => {
            warn!("Failed to read counter {key}: {e}");
            0
        }
    }
}

async fn read_counts(store: &dyn ShareStore, counter_keys: &[String]) -> Vec<u64> {
    match store.get_many(counter_keys).await {
        Ok(values) => counter_keys
            .iter()
            .zip(values)
            .map(|(key, value)| parse_count(key, value))
            .collect(),
        Err(e) => {
            warn!("Failed to read counters: {e}");
            vec![0; counter_keys.len()]
        }
    }
}

fn parse_count(key: &str, value: Option<String>) -> u64 {
    match value {
        None => 0,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Skipping malformed counter value at {key}: {raw:?}");
            0
        }),
    }
}

async fn read_buckets(
    store: &dyn ShareStore,
    window: &[NaiveDate],
    key_of: impl Fn(NaiveDate) -> String,
    label_of: impl Fn(NaiveDate) -> String,
) -> BTreeMap<String, u64> {
    let bucket_keys: Vec<String> = window.iter().map(|date| key_of(*date)).collect();

    window
        .iter()
        .map(|date| label_of(*date))
        .zip(read_counts(store, &bucket_keys).await)
        .filter(|(_, count)| *count > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Days, Utc};

    use super::*;
    use crate::models::ShareEvent;
    use crate::store::MemoryStore;
    use crate::tracker::record_share;

    fn event_at(content: &str, platform: &str, ip_hash: &str, days_ago: u64) -> ShareEvent {
        ShareEvent {
            content_key: content.to_string(),
            platform: platform.to_string(),
            title: None,
            timestamp: Utc::now() - chrono::Duration::days(days_ago as i64),
            client_ip_hash: ip_hash.to_string(),
            user_agent: None,
            referrer: None,
        }
    }

    #[tokio::test]
    async fn unknown_content_reads_as_zero() {
        let store = MemoryStore::new();

        let stats = get_stats(&store, "hello-world").await;

        assert_eq!(stats.total, 0);
        assert!(stats.platforms.is_empty());
        assert!(stats.daily_stats.is_empty());
        assert!(stats.last_shared.is_none());
        assert!(stats.top_platforms.is_empty());
    }

    #[tokio::test]
    async fn stats_reflect_recorded_events() {
        let store = MemoryStore::new();
        record_share(&store, &event_at("post", "twitter", "a", 0)).await.unwrap();
        record_share(&store, &event_at("post", "twitter", "b", 0)).await.unwrap();
        record_share(&store, &event_at("post", "copy", "a", 0)).await.unwrap();

        let stats = get_stats(&store, "post").await;

        assert_eq!(stats.total, 3);
        assert_eq!(stats.platforms.get("twitter"), Some(&2));
        assert_eq!(stats.platforms.get("copy"), Some(&1));
        assert!(stats.platforms.get("weibo").is_none());
        assert_eq!(stats.top_platforms[0].platform, "twitter");
        assert_eq!(stats.top_platforms[0].count, 2);
        assert!(stats.last_shared.is_some());

        let today = keys::day_label(Utc::now().date_naive());
        assert_eq!(stats.daily_stats.get(&today), Some(&3));
    }

    #[tokio::test]
    async fn buckets_outside_the_window_are_not_reported() {
        let store = MemoryStore::new();
        record_share(&store, &event_at("post", "twitter", "a", 0)).await.unwrap();
        record_share(&store, &event_at("post", "twitter", "b", 1)).await.unwrap();
        record_share(&store, &event_at("post", "twitter", "c", 8)).await.unwrap();

        let stats = get_stats(&store, "post").await;
        let today = Utc::now().date_naive();

        assert_eq!(stats.daily_stats.get(&keys::day_label(today)), Some(&1));
        assert_eq!(
            stats
                .daily_stats
                .get(&keys::day_label(today.checked_sub_days(Days::new(1)).unwrap())),
            Some(&1)
        );
        assert!(stats
            .daily_stats
            .get(&keys::day_label(today.checked_sub_days(Days::new(8)).unwrap()))
            .is_none());

        // all three still count toward the total
        assert_eq!(stats.total, 3);
    }

    #[tokio::test]
    async fn platforms_outside_the_fixed_list_are_not_reported() {
        let store = MemoryStore::new();
        record_share(&store, &event_at("post", "myspace", "a", 0)).await.unwrap();

        let stats = get_stats(&store, "post").await;

        assert_eq!(stats.total, 1);
        assert!(stats.platforms.is_empty());
    }

    #[tokio::test]
    async fn failing_store_degrades_to_all_zero_stats() {
        let store = MemoryStore::new();
        record_share(&store, &event_at("post", "twitter", "a", 0)).await.unwrap();
        store.set_failing(true);

        let stats = get_stats(&store, "post").await;

        assert_eq!(stats.total, 0);
        assert!(stats.platforms.is_empty());
        assert!(stats.daily_stats.is_empty());
        assert!(stats.last_shared.is_none());
    }

    #[tokio::test]
    async fn malformed_counter_reads_as_zero() {
        let store = MemoryStore::new();
        record_share(&store, &event_at("post", "twitter", "a", 0)).await.unwrap();

        let corrupted = crate::store::EventBatch {
            counters: vec![],
            buckets: vec![],
            last_shared: (keys::total("corrupt"), "not-a-number".to_string()),
            leaderboard: (keys::leaderboard(), "corrupt".to_string()),
            histogram: (keys::histogram(), "copy".to_string()),
        };
        store.apply_event(&corrupted).await.unwrap();

        let stats = get_stats(&store, "corrupt").await;
        assert_eq!(stats.total, 0);
    }

    #[tokio::test]
    async fn global_summary_matches_leaderboard_and_histogram() {
        let store = MemoryStore::new();
        for i in 0..3 {
            record_share(&store, &event_at("first", "twitter", &format!("a{i}"), 0))
                .await
                .unwrap();
        }
        for i in 0..2 {
            record_share(&store, &event_at("second", "copy", &format!("b{i}"), 0))
                .await
                .unwrap();
        }
        record_share(&store, &event_at("third", "copy", "c", 0)).await.unwrap();

        let summary = get_global_stats(&store).await;

        assert_eq!(summary.total_shares, 6);
        assert_eq!(summary.total_content, 3);
        assert_eq!(summary.top_content.len(), 3);
        assert_eq!(summary.top_content[0].content_key, "first");
        assert_eq!(summary.top_content[0].count, 3);
        assert_eq!(summary.top_content[1].content_key, "second");
        assert_eq!(summary.top_content[2].content_key, "third");
        assert_eq!(summary.top_platforms[0].platform, "copy");
        assert_eq!(summary.top_platforms[0].count, 3);
        assert_eq!(summary.top_platforms[1].platform, "twitter");
    }

    #[tokio::test]
    async fn global_summary_degrades_on_store_failure() {
        let store = MemoryStore::new();
        store.set_failing(true);

        let summary = get_global_stats(&store).await;

        assert_eq!(summary.total_shares, 0);
        assert_eq!(summary.total_content, 0);
        assert!(summary.top_content.is_empty());
        assert!(summary.top_platforms.is_empty());
    }
}
