//! Dashboard API endpoint handlers

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

use veritas_core::event_grid::parse_events;
use veritas_core::{
    generate_series, is_valid_tab, load_analyses, sanitize_message, AiInteraction, EventFilter,
    FeedError, ModelCommand, Section, Session, SettingsPatch, WebhookRequest, WebhookValidation,
    DASHBOARD_TABS,
};

use super::events::default_vote_weight;
use super::state::AppState;

/// Header carrying the authenticated user id, set by the fronting proxy
pub const USER_ID_HEADER: &str = "x-veritas-user";

// ============================================================================
// HEALTH
// ============================================================================

/// Health check
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let simulated = state.feeds.simulated_count();
    let status = if simulated == 0 || state.config.feed_endpoint.is_none() {
        "healthy"
    } else {
        "degraded"
    };

    Json(serde_json::json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSecs": state.start_time.elapsed().as_secs(),
        "apiMocking": state.config.api_mocking,
        "simulatedFeeds": simulated,
    }))
}

// ============================================================================
// DASHBOARD STATE
// ============================================================================

/// Full dashboard snapshot
pub async fn get_dashboard(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::to_value(state.dashboard.snapshot()).unwrap_or_default())
}

#[derive(Debug, Deserialize)]
pub struct RefreshParams {
    pub section: Option<String>,
}

/// Refresh one section (or overview + performance) and return the snapshot
pub async fn refresh_dashboard(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<Value>, StatusCode> {
    let section = match params.section.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => Some(raw.parse::<Section>().map_err(|e| {
            warn!(error = %e, "Rejected refresh request");
            StatusCode::BAD_REQUEST
        })?),
        None => None,
    };

    state.dashboard.refresh_data(section).await;
    Ok(get_dashboard(State(state)).await)
}

pub async fn get_settings(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::to_value(state.dashboard.settings()).unwrap_or_default())
}

/// Merge a partial settings update and persist it
pub async fn update_settings(
    State(state): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<Value>, StatusCode> {
    let settings = state.dashboard.update_settings(patch).map_err(|e| {
        warn!(error = %sanitize_message(&e.to_string()), "Settings not persisted");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(serde_json::to_value(settings).unwrap_or_default()))
}

#[derive(Debug, Deserialize)]
pub struct TabRequest {
    pub tab: String,
}

/// Switch the active tab; only known tabs are accepted
pub async fn set_active_tab(
    State(state): State<AppState>,
    Json(request): Json<TabRequest>,
) -> Result<Json<Value>, StatusCode> {
    if !is_valid_tab(&request.tab) {
        warn!(tab = %request.tab, valid = ?DASHBOARD_TABS, "Rejected unknown tab");
        return Err(StatusCode::BAD_REQUEST);
    }

    state.dashboard.set_active_tab(request.tab.clone());
    Ok(Json(serde_json::json!({ "activeTab": request.tab })))
}

// ============================================================================
// EVENT GRID
// ============================================================================

pub async fn list_topics(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({ "topics": state.event_grid.list_topics() }))
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionListParams {
    pub topic: Option<String>,
}

pub async fn list_subscriptions(
    State(state): State<AppState>,
    Query(params): Query<SubscriptionListParams>,
) -> Json<Value> {
    let subscriptions = state.event_grid.list_subscriptions(params.topic.as_deref());
    Json(serde_json::json!({
        "total": subscriptions.len(),
        "subscriptions": subscriptions,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    pub topic_name: String,
    pub endpoint: String,
    pub filter: Option<EventFilter>,
}

/// Record a webhook subscription
pub async fn create_subscription(
    State(state): State<AppState>,
    Json(request): Json<SubscriptionRequest>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    if request.topic_name.trim().is_empty() || request.endpoint.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let subscription = state.event_grid.subscribe_to_topic(
        &request.topic_name,
        &request.endpoint,
        request.filter.filter(|f| !f.is_empty()),
    );
    Ok((
        StatusCode::CREATED,
        Json(serde_json::to_value(subscription).unwrap_or_default()),
    ))
}

pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Value> {
    let deleted = state.event_grid.unsubscribe_from_topic(&id);
    Json(serde_json::json!({ "deleted": deleted, "id": id }))
}

/// Event Grid delivery endpoint: answers the validation handshake, otherwise
/// processes every event in the body.
pub async fn event_grid_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let request = headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        .fold(WebhookRequest::new(body), |req, (name, value)| {
            req.with_header(name, value)
        });

    match state.event_grid.validate_webhook_request(&request) {
        WebhookValidation::Handshake { validation_code } => {
            info!("Event Grid subscription validation handshake");
            Ok(Json(serde_json::json!({ "validationResponse": validation_code })))
        }
        WebhookValidation::Invalid { reason } => {
            warn!(reason = %reason, "Rejected Event Grid webhook");
            Err(StatusCode::UNAUTHORIZED)
        }
        WebhookValidation::Valid => {
            let events = parse_events(request.body).map_err(|e| {
                warn!(error = %e, "Malformed Event Grid delivery");
                StatusCode::BAD_REQUEST
            })?;

            let received = events.len();
            let delivered: usize = events
                .into_iter()
                .map(|event| state.event_grid.process_event(event))
                .sum();

            Ok(Json(serde_json::json!({
                "received": received,
                "delivered": delivered,
            })))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecentEventsParams {
    pub limit: Option<usize>,
}

/// Cached events for a topic, newest first
pub async fn recent_events(
    State(state): State<AppState>,
    Path(topic): Path<String>,
    Query(params): Query<RecentEventsParams>,
) -> Json<Value> {
    let limit = params
        .limit
        .unwrap_or(50)
        .clamp(1, state.event_grid.max_cache_size().max(1));
    let events = state.event_grid.get_recent_events(&topic, limit);

    Json(serde_json::json!({
        "topic": topic,
        "total": events.len(),
        "events": events,
    }))
}

// ============================================================================
// FEEDS
// ============================================================================

/// Latest snapshot of every feed
pub async fn get_feeds(State(state): State<AppState>) -> Json<Value> {
    let feeds = &state.feeds;
    Json(serde_json::json!({
        "voting": feeds.voting.data(),
        "model": feeds.model.data(),
        "allocation": feeds.allocation.data(),
        "dashboard": feeds.system.data(),
        "simulated": {
            "voting": feeds.voting.is_simulated(),
            "model": feeds.model.is_simulated(),
            "allocation": feeds.allocation.is_simulated(),
            "dashboard": feeds.system.is_simulated(),
        },
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub proposal_id: String,
    pub support: bool,
    #[serde(default = "default_vote_weight")]
    pub weight: f64,
}

pub async fn submit_vote(
    State(state): State<AppState>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<Value>, StatusCode> {
    state
        .feeds
        .voting
        .submit_vote(&request.proposal_id, request.support, request.weight)
        .map_err(feed_status)?;

    Ok(Json(serde_json::json!({
        "submitted": true,
        "voting": state.feeds.voting.data(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: ModelCommand,
}

pub async fn send_model_command(
    State(state): State<AppState>,
    Json(request): Json<CommandRequest>,
) -> Result<Json<Value>, StatusCode> {
    state
        .feeds
        .model
        .send_command(request.command)
        .map_err(feed_status)?;

    Ok(Json(serde_json::json!({
        "sent": request.command,
        "model": state.feeds.model.data(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct AllocationRequest {
    pub weights: BTreeMap<String, f64>,
}

pub async fn update_allocations(
    State(state): State<AppState>,
    Json(request): Json<AllocationRequest>,
) -> Result<Json<Value>, StatusCode> {
    let weights = state
        .feeds
        .allocation
        .update_allocations(request.weights)
        .map_err(feed_status)?;

    Ok(Json(serde_json::json!({ "weights": weights })))
}

/// Restart one feed from its initial data
pub async fn reconnect_feed(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let feeds = &state.feeds;
    match domain.as_str() {
        "voting" => feeds.voting.reconnect(),
        "model" => feeds.model.reconnect(),
        "allocation" => feeds.allocation.reconnect(),
        "dashboard" => feeds.system.reconnect(),
        _ => return Err(StatusCode::NOT_FOUND),
    }
    Ok(Json(serde_json::json!({ "reconnected": domain })))
}

pub(crate) fn feed_status(e: FeedError) -> StatusCode {
    warn!(error = %e, "Feed action rejected");
    match e {
        FeedError::UnknownProposal(_) => StatusCode::NOT_FOUND,
        FeedError::ProposalClosed(_) => StatusCode::CONFLICT,
        FeedError::InvalidAllocation(_) | FeedError::InvalidVote(_) => StatusCode::BAD_REQUEST,
        FeedError::NoData => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// HISTORICAL DATA / AI
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HistoricalParams {
    pub protocol: Option<String>,
    pub days: Option<u32>,
}

/// Synthetic protocol history (indexer stand-in)
pub async fn historical_data(
    Query(params): Query<HistoricalParams>,
) -> Result<Json<Value>, StatusCode> {
    let protocol = params
        .protocol
        .filter(|p| !p.trim().is_empty())
        .ok_or(StatusCode::BAD_REQUEST)?;
    let days = params
        .days
        .unwrap_or(veritas_core::historical::DEFAULT_HISTORY_DAYS);

    Ok(Json(
        serde_json::to_value(generate_series(&protocol, days)).unwrap_or_default(),
    ))
}

/// The caller's AI analyses, or the fallback set
pub async fn get_analyses(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    let session = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map(Session::new);

    let result = load_analyses(session.as_ref(), state.analyses.as_ref()).await;
    Json(serde_json::to_value(result).unwrap_or_default())
}

pub async fn get_ai_history(State(state): State<AppState>) -> Json<Value> {
    let interactions = state.ai_history.history();
    Json(serde_json::json!({
        "enabled": state.ai_history.is_enabled(),
        "total": interactions.len(),
        "interactions": interactions,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRequest {
    pub model: String,
    pub prompt: String,
    pub response: String,
    pub duration_ms: Option<u64>,
    pub metadata: Option<Value>,
}

pub async fn record_ai_interaction(
    State(state): State<AppState>,
    Json(request): Json<InteractionRequest>,
) -> Result<Json<Value>, StatusCode> {
    let mut interaction = AiInteraction::new(request.model, request.prompt, request.response);
    if let Some(ms) = request.duration_ms {
        interaction = interaction.with_duration_ms(ms);
    }
    if let Some(metadata) = request.metadata {
        interaction = interaction.with_metadata(metadata);
    }
    let id = interaction.id.clone();

    let recorded = state.ai_history.record(interaction).map_err(|e| {
        warn!(error = %sanitize_message(&e.to_string()), "Failed to record AI interaction");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(serde_json::json!({ "recorded": recorded, "id": id })))
}

pub async fn clear_ai_history(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    state
        .ai_history
        .clear()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(serde_json::json!({ "cleared": true })))
}

#[derive(Debug, Deserialize)]
pub struct TrackingRequest {
    pub enabled: bool,
}

pub async fn set_ai_tracking(
    State(state): State<AppState>,
    Json(request): Json<TrackingRequest>,
) -> Result<Json<Value>, StatusCode> {
    state
        .ai_history
        .set_enabled(request.enabled)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(serde_json::json!({ "enabled": request.enabled })))
}
