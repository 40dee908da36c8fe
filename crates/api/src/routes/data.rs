//! Windowed Data Route

use axum::{body::Bytes, extract::State, Json};
use data_validator::WindowRequest;
use std::sync::Arc;
use stream_registry::{resolve_window, WindowResponse};
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// `POST /api/get_data` with `{"start_time": s, "window_size": s}`
pub async fn get_data(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<WindowResponse>, ApiError> {
    let request = WindowRequest::from_slice(&body)?;
    debug!(
        "Data request: start {}s, length {}s",
        request.start_time(),
        request.length()
    );

    // On-demand band powers run FFTs; keep them off the async workers
    let registry = Arc::clone(&state.registry);
    let response = tokio::task::spawn_blocking(move || resolve_window(&registry, &request))
        .await
        .map_err(|e| ApiError::Internal(format!("window resolution failed: {e}")))?;

    Ok(Json(response))
}
