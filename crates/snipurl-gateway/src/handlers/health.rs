use crate::error::Result;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;

/// Probes the storage backend.
pub async fn ping_handler(State(state): State<AppState>) -> Result<StatusCode> {
    state.snipper().ping().await?;
    Ok(StatusCode::OK)
}
