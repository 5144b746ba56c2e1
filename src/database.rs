//! # Redis
//!
//! The only shared mutable state in the service. Counters, dedup tokens,
//! the leaderboard and the event logs all live here; handlers keep no
//! in-process caches, so every read hits the store and there is nothing to
//! invalidate.
//!
//! ## Requirements
//!
//! - Atomic `SET NX EX` for the dedup gate
//! - `MULTI`/`EXEC` batches for counter updates
//! - Per-key TTLs for rolling bucket eviction
//! - Bounded timeouts: a slow store fails the request, it never hangs it

use std::time::Duration;

use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    Client,
};

pub async fn init_redis(redis_url: &str) -> ConnectionManager {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(500))
        .set_response_timeout(Duration::from_millis(500));

    let client = Client::open(redis_url).expect("REDIS_URL misconfigured!");

    client
        .get_connection_manager_with_config(config)
        .await
        .expect("Redis unreachable at startup!")
}
