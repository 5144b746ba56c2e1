//! Write side of the counter service: the dedup gate, the atomic counter
//! batch and the capped event log.
//!
//! An inbound event passes the gate first; only an accepted event fans out
//! to counters, and the raw event is logged strictly after the batch
//! commits. Duplicate events touch nothing but the gate.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::{
    keys,
    models::ShareEvent,
    store::{EventBatch, ShareStore, StoreError},
};

/// Records an accepted event, or detects a duplicate. Returns whether the
/// event was novel within its dedupe window.
///
/// The gate's `SET NX EX` must complete before the counter batch is issued;
/// a store failure anywhere here fails the whole request (fail closed).
pub async fn record_share(
    store: &dyn ShareStore,
    event: &ShareEvent,
) -> Result<bool, StoreError> {
    let token = keys::dedup(&event.client_ip_hash, &event.content_key, &event.platform);
    let accepted = store.set_nx_ex(&token, keys::DEDUP_TTL_SECS).await?;

    if !accepted {
        debug!(
            "Duplicate share for {} on {} within dedupe window",
            event.content_key, event.platform
        );
        return Ok(false);
    }

    let batch = build_batch(
        &event.content_key,
        &event.platform,
        event.timestamp.date_naive(),
        &event.timestamp.to_rfc3339(),
    );
    store.apply_event(&batch).await?;

    debug!("Counted share for {} on {}", event.content_key, event.platform);

    // Log-after-commit: the counters are the source of truth, so a failed
    // append must not turn an already-counted event into a client error.
    append_event(store, event).await;

    Ok(true)
}

/// All counter mutations for one accepted event, applied in one batch.
/// Bucket TTLs ride along so eviction is relative to last write.
pub fn build_batch(
    content: &str,
    platform: &str,
    date: NaiveDate,
    timestamp: &str,
) -> EventBatch {
    EventBatch {
        counters: vec![
            keys::total(content),
            keys::platform(content, platform),
            keys::global_total(),
        ],
        buckets: vec![
            (keys::daily(content, date), keys::DAILY_TTL_SECS),
            (keys::weekly(content, date), keys::WEEKLY_TTL_SECS),
            (keys::monthly(content, date), keys::MONTHLY_TTL_SECS),
        ],
        last_shared: (keys::last_shared(content), timestamp.to_string()),
        leaderboard: (keys::leaderboard(), content.to_string()),
        histogram: (keys::histogram(), platform.to_string()),
    }
}

async fn append_event(store: &dyn ShareStore, event: &ShareEvent) {
    let entry = match serde_json::to_string(event) {
        Ok(entry) => entry,
        Err(e) => {
            warn!("Failed to serialize share event: {e}");
            return;
        }
    };

    if let Err(e) = store
        .push_capped(
            &keys::events(&event.content_key),
            &entry,
            keys::EVENT_LOG_CAP,
            keys::EVENT_LOG_TTL_SECS,
        )
        .await
    {
        warn!("Failed to append share event for {}: {e}", event.content_key);
    }
}

/// Recent raw events for a content key, newest first. Read path: malformed
/// entries are skipped and a failing store degrades to an empty list.
pub async fn read_events(store: &dyn ShareStore, content: &str, limit: usize) -> Vec<ShareEvent> {
    let limit = limit.min(keys::EVENT_LOG_CAP);

    let entries = match store.list_range(&keys::events(content), limit).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to read share events for {content}: {e}");
            return Vec::new();
        }
    };

    entries
        .iter()
        .filter_map(|entry| match serde_json::from_str(entry) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Skipping malformed share event for {content}: {e}");
                None
            }
        })
        .collect()
}
