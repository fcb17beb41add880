//! HTTP health endpoint.

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc, time::Instant};
use tokio::net::TcpListener;
use tracing::info;

/// Process start time, captured once in `main` and never mutated.
#[derive(Debug)]
pub struct Uptime {
    started: Instant,
    started_at: DateTime<Utc>,
}

impl Uptime {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    pub fn seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

pub fn create_router(uptime: Arc<Uptime>) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/health", get(health_check))
        .with_state(uptime)
}

/// Binds the health listener and serves it until the process exits.
pub async fn serve(port: u16, uptime: Arc<Uptime>) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("No se pudo abrir el puerto de salud {}", port))?;

    info!("🩺 Endpoint de salud escuchando en {}", addr);
    axum::serve(listener, create_router(uptime)).await?;
    Ok(())
}

async fn status() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "running",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

async fn health_check(State(uptime): State<Arc<Uptime>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "uptime_seconds": uptime.seconds(),
            "started_at": uptime.started_at().to_rfc3339(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn spawn_server() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = create_router(Arc::new(Uptime::start()));
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_health_reports_uptime() {
        let addr = spawn_server().await;

        let response = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["status"], "healthy");
        assert!(body["uptime_seconds"].as_u64().is_some());
        assert!(body["started_at"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_root_reports_status() {
        let addr = spawn_server().await;

        let response = reqwest::get(format!("http://{}/", addr)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["status"], "running");
        assert_eq!(body["service"], env!("CARGO_PKG_NAME"));
    }
}
