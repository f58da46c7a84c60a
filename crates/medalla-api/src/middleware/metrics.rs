//! # Prometheus Metrics
//!
//! Request metrics go through the `metrics` facade and are exported by the
//! Prometheus recorder. Inventory gauges (keg stock, rentals per status)
//! are refreshed from the stores on each scrape of `/metrics`.

use std::sync::OnceLock;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use medalla_core::RentalStatus;

use crate::state::AppState;

/// The recorder is process-global; it can only be installed once.
static RECORDER: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Handle to the Prometheus recorder, if metrics are enabled.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    handle: Option<PrometheusHandle>,
}

impl ApiMetrics {
    /// Install (or reuse) the global Prometheus recorder.
    pub fn install() -> Self {
        let handle = RECORDER
            .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!(error = %e, "prometheus recorder not installed; metrics disabled");
                    None
                }
            })
            .clone();
        Self { handle }
    }

    pub fn disabled() -> Self {
        Self { handle: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.handle.is_some()
    }

    /// Refresh inventory gauges and render the exposition text.
    pub fn render(&self, state: &AppState) -> Option<String> {
        let handle = self.handle.as_ref()?;

        for keg in state.kegs.list() {
            metrics::gauge!("medalla_keg_stock", "keg" => keg.size.clone()).set(keg.stock as f64);
        }
        let rentals = state.rentals.list();
        for status in RentalStatus::ALL {
            let count = rentals.iter().filter(|r| r.status == status).count();
            metrics::gauge!("medalla_rentals", "status" => status.as_str()).set(count as f64);
        }

        Some(handle.render())
    }
}

/// Middleware that records a request counter and latency histogram,
/// labelled by method, matched route and status.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    let elapsed = start.elapsed().as_secs_f64();
    metrics::counter!(
        "medalla_http_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "medalla_http_request_duration_seconds",
        "method" => method,
        "route" => route,
        "status" => status
    )
    .record(elapsed);

    response
}

/// GET /metrics: Prometheus text exposition.
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render(&state) {
        Some(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
