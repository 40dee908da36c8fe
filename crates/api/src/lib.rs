//! Signal Visualizer API Server
//!
//! Serves windowed slices of the loaded physiological streams and the
//! recording metadata to the visualization client.

use anyhow::{anyhow, Context};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use stream_registry::Registry;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod error;
mod routes;

pub use error::{ApiError, ErrorBody};

/// Application state shared across handlers
pub struct AppState {
    /// Loaded streams, immutable for the life of the process
    pub registry: Arc<Registry>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub stream_count: usize,
    pub data_length: f64,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/get_data", post(routes::data::get_data))
        .route("/api/get_metadata", get(routes::metadata::get_metadata))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        stream_count: state.registry.len(),
        data_length: state.registry.total_duration(),
    })
}

/// Initialize logging at `level` (`trace` .. `error`)
pub fn init_logging(level: &str) -> anyhow::Result<()> {
    let level: Level = level
        .parse()
        .map_err(|_| anyhow!("unknown log level '{level}'"))?;
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Serve `registry` on `addr` until the process stops
pub async fn run_server(addr: &str, registry: Registry) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(registry));
    let app = create_router(state);

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use feature_engine::BandPowerExtractor;
    use ndarray::Array2;
    use serde_json::{json, Value};
    use std::f64::consts::PI;
    use stream_registry::Stream;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let raw = Arc::new(Array2::from_shape_fn((2, 1280), |(_, i)| {
            (2.0 * PI * 10.0 * i as f64 / 128.0).sin()
        }));

        let mut builder = Registry::builder();
        builder
            .insert("gsr", Stream::samples((0..500).map(f64::from).collect(), 50))
            .unwrap()
            .insert("hr", Stream::samples(vec![f64::NAN; 10], 1))
            .unwrap()
            .insert("eeg", Stream::channels(Arc::clone(&raw), 128))
            .unwrap()
            .insert(
                "power_bands",
                Stream::on_demand(raw, 128, BandPowerExtractor::default()),
            )
            .unwrap();
        builder
            .set_duration(10.0)
            .set_eeg_channels(vec!["Fp1".to_string(), "Fp2".to_string()]);

        create_router(Arc::new(AppState::new(builder.build())))
    }

    fn post_data(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/get_data")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["stream_count"], 4);
    }

    #[tokio::test]
    async fn test_get_data_window() {
        let response = test_app()
            .oneshot(post_data(r#"{"start_time": 2, "window_size": 3}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;

        let gsr = json["gsr"].as_array().unwrap();
        assert_eq!(gsr.len(), 150);
        assert_eq!(gsr[0], json!(100.0));
        assert_eq!(json["hr"], json!([null, null, null]));
        assert_eq!(json["eeg"].as_array().unwrap().len(), 2);
        assert_eq!(json["eeg"][0].as_array().unwrap().len(), 384);
        assert!(json["power_bands"]["Alpha"].as_f64().unwrap() > 0.5);
    }

    #[tokio::test]
    async fn test_missing_window_size_rejected() {
        let response = test_app()
            .oneshot(post_data(r#"{"start_time": 2}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("window_size"));
    }

    #[tokio::test]
    async fn test_malformed_body_rejected() {
        for body in ["not json", r#"{"start_time": -1, "window_size": 3}"#, r#"{"start_time": "a", "window_size": 3}"#] {
            let response = test_app().oneshot(post_data(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        }
    }

    #[tokio::test]
    async fn test_metadata() {
        let response = test_app()
            .oneshot(Request::get("/api/get_metadata").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(
            json["enabled_graphs"],
            json!(["eeg", "gsr", "hr", "power_bands"])
        );
        assert_eq!(json["data_length"], json!(10.0));
        assert_eq!(json["sampling_rates"]["gsr"], 50);
        assert_eq!(json["sampling_rates"]["hr"], 1);
        assert_eq!(json["eeg_channels"], json!(["Fp1", "Fp2"]));
    }

    #[test]
    fn test_unknown_log_level() {
        assert!(init_logging("loud").is_err());
    }
}
