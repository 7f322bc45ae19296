pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{
    Router,
    extract::State,
    http::HeaderValue,
    routing::{get, post},
};
use state::AppState;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.app.cors_origins);

    let mentorship_request_routes = Router::new()
        .route("/", get(routes::mentorship_request::list))
        .route("/{request_id}/accept", post(routes::mentorship_request::accept))
        .route("/{request_id}/decline", post(routes::mentorship_request::decline));

    let meeting_routes = Router::new()
        .route("/", post(routes::meeting::create))
        .route("/upcoming", get(routes::meeting::upcoming))
        .route("/past", get(routes::meeting::past))
        .route("/stats", get(routes::meeting::stats))
        .route("/export", get(routes::meeting::export))
        .route(
            "/{meeting_id}",
            get(routes::meeting::get).put(routes::meeting::update),
        )
        .route("/{meeting_id}/cancel", post(routes::meeting::cancel))
        .route("/{meeting_id}/complete", post(routes::meeting::complete));

    let meeting_request_routes = Router::new()
        .route("/", get(routes::meeting_request::list))
        .route("/{request_id}/accept", post(routes::meeting_request::accept))
        .route("/{request_id}/reject", post(routes::meeting_request::reject));

    let notification_routes = Router::new()
        .route("/", get(routes::notification::list))
        .route("/read", post(routes::notification::mark_read));

    let api = Router::new()
        .nest("/mentorship-request", mentorship_request_routes)
        .nest("/meeting", meeting_routes)
        .nest("/meeting-request", meeting_request_routes)
        .nest("/notification", notification_routes)
        .route("/mentorship", get(routes::mentorship::list))
        .route("/student", get(routes::student::list));

    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .route("/ws", get(ws::handler::ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "store": state.store.backend_name(),
        "connections": state.ws_storage.connection_count(),
    }))
}
