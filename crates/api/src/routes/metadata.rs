//! Recording Metadata Route

use axum::{extract::State, Json};
use std::sync::Arc;
use stream_registry::Metadata;

use crate::AppState;

/// `GET /api/get_metadata`
pub async fn get_metadata(State(state): State<Arc<AppState>>) -> Json<Metadata> {
    Json(state.registry.metadata())
}
