//! Explicit cleanup for data-subject requests and operational resets.
//!
//! Time buckets and dedup tokens are not touched here; their per-key TTLs
//! already bound their lifetime, and `delete_all` sweeps them anyway.

use tracing::info;

use crate::{
    keys,
    store::{ShareStore, StoreError},
};

/// Removes one content key's total, last-shared timestamp, event log and
/// known per-platform counters, and drops it from the leaderboard. Returns
/// how many keys were removed.
pub async fn delete_content(store: &dyn ShareStore, content: &str) -> Result<u64, StoreError> {
    let mut doomed = vec![
        keys::total(content),
        keys::last_shared(content),
        keys::events(content),
    ];
    doomed.extend(keys::PLATFORMS.iter().map(|p| keys::platform(content, p)));

    let removed = store.delete(&doomed).await?;
    store.ranked_remove(&keys::leaderboard(), content).await?;

    info!("Deleted {removed} keys for {content}");

    Ok(removed)
}

/// Wipes every key in the subsystem's namespace. Returns how many keys were
/// removed. Destructive; operational resets only.
pub async fn delete_all(store: &dyn ShareStore) -> Result<u64, StoreError> {
    let removed = store.delete_prefix(keys::PREFIX).await?;

    info!("Cleared share namespace, {removed} keys removed");

    Ok(removed)
}
