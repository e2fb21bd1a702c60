use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

pub fn routes() -> Router<AppState> {
	Router::new()
		.route("/api/config", get(viewer_config))
		.route("/api/health", get(health))
}

/// Serves the data-source configuration document the viewer loads at startup.
/// Pure data; the field names follow the viewer's configuration schema.
async fn viewer_config(State(state): State<AppState>) -> impl IntoResponse {
	Json(state.config.viewer.clone())
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
	Json(json!({
		"status": "ok",
		"version": env!("CARGO_PKG_VERSION"),
		"upstream": state.upstream.origin(),
	}))
}
