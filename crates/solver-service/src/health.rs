//! Liveness endpoint.

use axum::{response::Json, routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Serves `GET /health` on the configured listen address.
pub async fn serve(listen_addr: String, port: u16) -> anyhow::Result<()> {
	let app = Router::new()
		.route("/health", get(health))
		.layer(TraceLayer::new_for_http());

	let listener = tokio::net::TcpListener::bind((listen_addr.as_str(), port)).await?;
	info!(addr = %listen_addr, port, "healthcheck endpoint listening");

	axum::serve(listener, app).await?;
	Ok(())
}

async fn health() -> Json<serde_json::Value> {
	Json(serde_json::json!({ "status": "ok" }))
}
