//! HTTP surface: the metrics endpoint and a landing page.
//!
//! Every request to the metrics path triggers a fresh scrape; there is no
//! caching between requests. RPC failures never become HTTP errors — the
//! response content carries them via the liveness sample.

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use futures::StreamExt;
use tracing::warn;

use crate::lnrpc::NodeConnector;
use crate::metrics::{encoder, LightningCollector};

pub struct AppState<C: NodeConnector> {
    collector: LightningCollector<C>,
    process_registry: Option<prometheus::Registry>,
    telemetry_path: String,
}

impl<C: NodeConnector> AppState<C> {
    pub fn new(
        collector: LightningCollector<C>,
        process_registry: Option<prometheus::Registry>,
        telemetry_path: String,
    ) -> Self {
        Self {
            collector,
            process_registry,
            telemetry_path,
        }
    }
}

/// A registry carrying only process/runtime metrics, kept separate from the
/// node metrics so the domain output stays scrape-fresh.
#[cfg(target_os = "linux")]
pub fn process_registry() -> Option<prometheus::Registry> {
    use prometheus::process_collector::ProcessCollector;

    let registry = prometheus::Registry::new();
    match registry.register(Box::new(ProcessCollector::for_self())) {
        Ok(()) => Some(registry),
        Err(e) => {
            warn!("Failed to register process collector: {}", e);
            None
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn process_registry() -> Option<prometheus::Registry> {
    warn!("Process metrics are only available on Linux");
    None
}

pub fn create_router<C>(state: Arc<AppState<C>>) -> Router
where
    C: NodeConnector + 'static,
    C::Client: 'static,
{
    let telemetry_path = state.telemetry_path.clone();
    Router::new()
        .route("/", get(landing_handler::<C>))
        .route(&telemetry_path, get(metrics_handler::<C>))
        .with_state(state)
}

async fn metrics_handler<C>(State(state): State<Arc<AppState<C>>>) -> Response
where
    C: NodeConnector + 'static,
    C::Client: 'static,
{
    let mut stream = state.collector.collect();
    let mut samples = Vec::new();
    while let Some(sample) = stream.next().await {
        samples.push(sample);
    }

    let mut body = encoder::render(&state.collector.describe(), &samples);

    if let Some(registry) = &state.process_registry {
        match prometheus::TextEncoder::new().encode_to_string(&registry.gather()) {
            Ok(text) => body.push_str(&text),
            Err(e) => warn!("Failed to encode process metrics: {}", e),
        }
    }

    ([(header::CONTENT_TYPE, encoder::TEXT_FORMAT)], body).into_response()
}

async fn landing_handler<C>(State(state): State<Arc<AppState<C>>>) -> Html<String>
where
    C: NodeConnector + 'static,
    C::Client: 'static,
{
    Html(format!(
        "<html>\n\
         <head><title>Lightning Exporter</title></head>\n\
         <body>\n\
         <h1>Lightning Exporter</h1>\n\
         <p><a href='{}'>Metrics</a></p>\n\
         </body>\n\
         </html>",
        state.telemetry_path
    ))
}
