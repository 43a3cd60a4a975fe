//! Dashboard HTTP + WebSocket surface
//!
//! REST endpoints over the dashboard state, settings, Event Grid, feeds and
//! AI history, plus a `/ws` stream of every change.

pub mod events;
pub mod handlers;
pub mod state;
pub mod websocket;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use state::AppState;

/// Concurrent request ceiling
const MAX_CONCURRENT_REQUESTS: usize = 50;

/// Build the axum router with all dashboard routes
pub fn build_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = [
        state.config.app_url.clone(),
        format!("http://127.0.0.1:{}", state.config.port),
        format!("http://localhost:{}", state.config.port),
        // Frontend dev server
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
    .iter()
    .filter_map(|origin| origin.trim_end_matches('/').parse::<HeaderValue>().ok())
    .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static(handlers::USER_ID_HEADER),
        ]);

    let no_store = SetResponseHeaderLayer::overriding(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );

    Router::new()
        // WebSocket for real-time events
        .route("/ws", get(websocket::ws_handler))
        // Health
        .route("/api/health", get(handlers::health_check))
        // Dashboard state
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/dashboard/refresh", post(handlers::refresh_dashboard))
        .route(
            "/api/settings",
            get(handlers::get_settings).patch(handlers::update_settings),
        )
        .route("/api/tab", put(handlers::set_active_tab))
        // Event Grid
        .route("/api/event-grid/topics", get(handlers::list_topics))
        .route(
            "/api/event-grid/topics/{topic}/events",
            get(handlers::recent_events),
        )
        .route(
            "/api/event-grid/subscriptions",
            get(handlers::list_subscriptions).post(handlers::create_subscription),
        )
        .route(
            "/api/event-grid/subscriptions/{id}",
            delete(handlers::delete_subscription),
        )
        .route("/api/event-grid/webhook", post(handlers::event_grid_webhook))
        // Feeds
        .route("/api/feeds", get(handlers::get_feeds))
        .route("/api/feeds/voting/votes", post(handlers::submit_vote))
        .route("/api/feeds/model/commands", post(handlers::send_model_command))
        .route("/api/feeds/allocation", put(handlers::update_allocations))
        .route("/api/feeds/{domain}/reconnect", post(handlers::reconnect_feed))
        // Mocked indexer
        .route(
            "/api/goldsky/historical-data",
            get(handlers::historical_data),
        )
        // AI
        .route("/api/analyses", get(handlers::get_analyses))
        .route(
            "/api/ai/history",
            get(handlers::get_ai_history)
                .post(handlers::record_ai_interaction)
                .delete(handlers::clear_ai_history),
        )
        .route("/api/ai/tracking", put(handlers::set_ai_tracking))
        .layer(
            ServiceBuilder::new()
                .concurrency_limit(MAX_CONCURRENT_REQUESTS)
                .layer(cors)
                .layer(no_store),
        )
        .with_state(state)
}

/// Serve the dashboard until the process is stopped
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], state.config.port));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "Dashboard available at http://{} (WebSocket at ws://{}/ws)",
        addr, addr
    );

    axum::serve(listener, app).await
}
