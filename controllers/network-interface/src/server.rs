//! Health, readiness and metrics endpoints.

use crate::error::ControllerError;
use crate::metrics::Metrics;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Tracks whether both watchers have completed their initial list.
#[derive(Clone, Default)]
pub struct Readiness {
    interfaces: Arc<AtomicBool>,
    networks: Arc<AtomicBool>,
}

impl Readiness {
    pub fn mark_interfaces_synced(&self) {
        self.interfaces.store(true, Ordering::SeqCst);
    }

    pub fn mark_networks_synced(&self) {
        self.networks.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.interfaces.load(Ordering::SeqCst) && self.networks.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct ProbeState {
    pub readiness: Readiness,
    pub metrics: Arc<Metrics>,
}

pub fn router(state: ProbeState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve the probe endpoints until the task is aborted
pub async fn serve(addr: SocketAddr, state: ProbeState) -> Result<(), ControllerError> {
    let listener = TcpListener::bind(addr).await?;
    info!("Serving probes and metrics on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn readyz(State(state): State<ProbeState>) -> Response {
    if state.readiness.is_ready() {
        (StatusCode::OK, "ready").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "watchers not synced").into_response()
    }
}

async fn metrics(State(state): State<ProbeState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
