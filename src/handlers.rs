// HTTP handlers. These are thin wrappers around `dispatch` and the
// Prometheus `Registry`; all directive outcomes, including Alexa error
// events, go back as 200 with a JSON body.
use axum::{extract::Extension, http::{header::CONTENT_TYPE, HeaderMap, HeaderValue}, Json};
use prometheus::{Encoder, TextEncoder};

use crate::directive::{DirectiveRequest, DirectiveResponse};
use crate::dispatch;
use crate::state::SharedState;

pub async fn directive_handler(
    Extension(state): Extension<SharedState>,
    Json(request): Json<DirectiveRequest>,
) -> Json<DirectiveResponse> {
    let response = dispatch::handle_directive(&request, state.publisher.as_ref(), &state.feeder).await;

    let (namespace, name) = dispatch::metric_labels(&request.directive.header);
    state.metrics.directives.with_label_values(&[namespace, name]).inc();

    Json(response)
}

/// Prometheus text-format metrics gathered from the shared registry.
pub async fn metrics_handler(Extension(state): Extension<SharedState>) -> (HeaderMap, String) {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("failed to encode metrics: {}", e);
    }

    let mut headers = HeaderMap::new();
    if let Ok(content_type) = HeaderValue::from_str(encoder.format_type()) {
        headers.insert(CONTENT_TYPE, content_type);
    }
    (headers, String::from_utf8_lossy(&buffer).to_string())
}
