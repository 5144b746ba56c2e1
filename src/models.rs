use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One accepted user share action. Immutable once created; appended to the
/// per-content event log and echoed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareEvent {
    pub content_key: String,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub client_ip_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformCount {
    pub platform: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCount {
    pub content_key: String,
    pub count: u64,
}

/// Per-content view assembled by the reporting path. Bucket maps only carry
/// non-zero entries; an unreachable store yields the all-zero default.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareStats {
    pub total: u64,
    pub platforms: BTreeMap<String, u64>,
    pub daily_stats: BTreeMap<String, u64>,
    pub weekly_stats: BTreeMap<String, u64>,
    pub monthly_stats: BTreeMap<String, u64>,
    pub last_shared: Option<String>,
    pub top_platforms: Vec<PlatformCount>,
}

/// Site-wide view: totals, leaderboard top-10 and the platform histogram.
/// No time buckets at this level.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSummary {
    pub total_shares: u64,
    pub total_content: u64,
    pub top_content: Vec<ContentCount>,
    pub top_platforms: Vec<PlatformCount>,
}

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub slug: Option<String>,
    pub url: Option<String>,
    pub platform: Option<String>,
    pub title: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    All,
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub slug: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub include_events: bool,
    #[serde(default)]
    pub period: Period,
    #[serde(default = "default_event_limit")]
    pub limit: usize,
}

fn default_event_limit() -> usize {
    100
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteQuery {
    pub slug: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub clear_all: bool,
}
