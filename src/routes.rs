use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::{DeleteQuery, Period, ShareEvent, ShareRequest, ShareStats, StatsQuery},
    retention::{delete_all, delete_content},
    state::AppState,
    stats::{get_global_stats, get_stats},
    tracker::{read_events, record_share},
    utils::{content_key, event_timestamp, hash_ip},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route(
            "/api/share",
            axum::routing::post(share_handler)
                .get(stats_handler)
                .delete(delete_handler),
        )
        .with_state(state)
}

pub async fn health_handler() -> impl IntoResponse {
    StatusCode::OK
}

pub async fn share_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ShareRequest>,
) -> Result<Json<Value>, AppError> {
    let store = state.store()?;

    let content = content_key(payload.slug.as_deref(), payload.url.as_deref())
        .ok_or(AppError::Validation("Missing slug or url parameter"))?;
    let platform = payload
        .platform
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or(AppError::Validation("Missing platform parameter"))?
        .to_string();

    let event = ShareEvent {
        content_key: content.clone(),
        platform,
        title: payload.title,
        timestamp: event_timestamp(payload.timestamp.as_deref()),
        client_ip_hash: hash_ip(&client_ip(&headers)),
        user_agent: header_value(&headers, header::USER_AGENT),
        referrer: header_value(&headers, header::REFERER),
    };

    let is_new = record_share(store.as_ref(), &event).await?;
    let stats = get_stats(store.as_ref(), &content).await;

    Ok(Json(json!({
        "success": true,
        "stats": stats,
        "event": event,
        "isNewShare": is_new,
    })))
}

pub async fn stats_handler(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Value>, AppError> {
    let store = state.store()?;

    let Some(content) = content_key(query.slug.as_deref(), query.url.as_deref()) else {
        let summary = get_global_stats(store.as_ref()).await;
        return Ok(Json(json!({ "success": true, "summary": summary })));
    };

    let mut stats = get_stats(store.as_ref(), &content).await;
    apply_period(&mut stats, query.period);

    let mut body = json!({ "success": true, "stats": stats });
    if query.include_events {
        let events = read_events(store.as_ref(), &content, query.limit).await;
        body["events"] = serde_json::to_value(&events).unwrap_or_else(|_| json!([]));
    }

    Ok(Json(body))
}

pub async fn delete_handler(
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Value>, AppError> {
    let store = state.store()?;

    if query.clear_all {
        let removed = delete_all(store.as_ref()).await?;
        return Ok(Json(json!({
            "success": true,
            "message": "All share data cleared",
            "deletedKeysCount": removed,
        })));
    }

    let content = content_key(query.slug.as_deref(), query.url.as_deref())
        .ok_or(AppError::Validation("Missing slug or url parameter"))?;
    let removed = delete_content(store.as_ref(), &content).await?;

    Ok(Json(json!({
        "success": true,
        "deleted": removed > 0,
        "deletedKeys": removed,
    })))
}

/// Narrows the stats view to one bucket series. `all` leaves it untouched.
fn apply_period(stats: &mut ShareStats, period: Period) {
    match period {
        Period::All => {}
        Period::Daily => {
            stats.weekly_stats.clear();
            stats.monthly_stats.clear();
        }
        Period::Weekly => {
            stats.daily_stats.clear();
            stats.monthly_stats.clear();
        }
        Period::Monthly => {
            stats.daily_stats.clear();
            stats.weekly_stats.clear();
        }
    }
}

/// First forwarded hop, or the reverse proxy's real-ip header. The raw
/// value goes straight into the hash and is never persisted.
fn client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
