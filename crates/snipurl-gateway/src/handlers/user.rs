use crate::error::{AppError, Result};
use crate::model::UserUrl;
use crate::owner::Owner;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use snipurl_core::ShortCode;
use tracing::debug;

pub async fn list_user_urls_handler(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Response> {
    let owner = owner.ok_or(AppError::Unauthorized)?;
    let urls = state.snipper().get_urls(&owner).await?;

    if urls.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let urls: Vec<UserUrl> = urls
        .into_iter()
        .map(|url| UserUrl {
            short_url: state.short_url(&url.code),
            original_url: url.original_url,
        })
        .collect();
    Ok(Json(urls).into_response())
}

/// Accepts the codes for background deletion.
pub async fn delete_user_urls_handler(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Json(ids): Json<Vec<String>>,
) -> StatusCode {
    let requested = ids.len();
    let codes: Vec<ShortCode> = ids
        .into_iter()
        .filter_map(|id| ShortCode::new(id).ok())
        .collect();
    debug!(requested, valid = codes.len(), "queueing user url deletion");

    state.snipper().delete_urls(owner.as_ref(), codes).await;
    StatusCode::ACCEPTED
}
