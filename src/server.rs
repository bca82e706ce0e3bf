// `server.rs` composes the HTTP application: it loads configuration,
// registers Prometheus metrics, builds the MQTT publisher and mounts the
// directive endpoint next to health and metrics.
use crate::{config::Config, handlers, metrics::Metrics, mqtt::MqttPublisher, state::{SharedState, SkillState}};
use axum::{routing::{get, post}, Extension, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "feeder_skill=info,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let metrics = Metrics::new()?;

    match &config.mqtt.credentials {
        Some(creds) => tracing::info!("Using MQTT credentials from environment {}:*******", creds.user),
        None => tracing::info!("No MQTT credentials provided; connecting without authentication"),
    }
    tracing::info!(
        "Feeder commands go to {}:{} topic '{}'",
        config.mqtt.host,
        config.mqtt.port,
        config.feeder.topic
    );

    let publisher = MqttPublisher::new(
        config.mqtt.clone(),
        metrics.publishes.clone(),
        metrics.publish_failures.clone(),
    );
    let state = Arc::new(SkillState {
        publisher: Arc::new(publisher),
        feeder: config.feeder.clone(),
        metrics,
    });

    let app = router(state);

    tracing::info!("listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Layers are applied bottom -> top, so the trace layer wraps everything.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/directive", post(handlers::directive_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeederCommand;
    use crate::power::tests::RecordingPublisher;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use prometheus::{Encoder, TextEncoder};
    use serde_json::json;
    use tower::ServiceExt;

    fn test_state(publisher: Arc<RecordingPublisher>) -> SharedState {
        Arc::new(SkillState {
            publisher,
            feeder: FeederCommand::default(),
            metrics: Metrics::new().unwrap(),
        })
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_directive(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/directive")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(test_state(Arc::new(RecordingPublisher::default())));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_turn_on_over_http() {
        let publisher = Arc::new(RecordingPublisher::default());
        let state = test_state(publisher.clone());
        let app = router(state.clone());

        let response = app
            .oneshot(post_directive(json!({
                "directive": {
                    "header": {
                        "namespace": "Alexa.PowerController",
                        "name": "TurnOn",
                        "payloadVersion": "3",
                        "messageId": "http-1"
                    },
                    "endpoint": { "endpointId": "id123" },
                    "payload": {}
                }
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let v: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(v["context"]["properties"][0]["value"], "ON");
        assert_eq!(v["event"]["header"]["messageId"], "http-1-R");
        assert_eq!(publisher.calls(), vec![("feeder".to_string(), "7".to_string(), true)]);
        assert_eq!(
            state
                .metrics
                .directives
                .with_label_values(&["Alexa.PowerController", "TurnOn"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn test_malformed_body_rejected() {
        let publisher = Arc::new(RecordingPublisher::default());
        let app = router(test_state(publisher.clone()));

        let response = app
            .oneshot(post_directive(json!({ "header": { "name": "TurnOn" } })))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
        assert!(publisher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_metrics_exposed() {
        let state = test_state(Arc::new(RecordingPublisher::default()));
        state.metrics.publishes.inc();
        state
            .metrics
            .directives
            .with_label_values(&["Alexa.Discovery", "Discover"])
            .inc();

        let response = router(state)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("mqtt_publishes_total 1"));
        assert!(body.contains("directives_total{name=\"Discover\",namespace=\"Alexa.Discovery\"} 1"));
    }

    #[tokio::test]
    async fn test_unrouted_directives_share_one_series() {
        let publisher = Arc::new(RecordingPublisher::default());
        let state = test_state(publisher.clone());

        for i in 0..50 {
            let response = router(state.clone())
                .oneshot(post_directive(json!({
                    "directive": {
                        "header": {
                            "namespace": format!("Vendor.Junk{i}"),
                            "name": format!("Do{i}"),
                            "messageId": format!("junk-{i}")
                        },
                        "payload": {}
                    }
                })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&state.metrics.registry.gather(), &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let series = text.lines().filter(|l| l.starts_with("directives_total{")).count();
        assert_eq!(series, 1);
        assert_eq!(
            state
                .metrics
                .directives
                .with_label_values(&["unsupported", "unsupported"])
                .get(),
            50
        );
        assert!(publisher.calls().is_empty());
    }
}
