use crate::error::{AppError, Result};
use crate::model::{BatchShortenItem, BatchShortenedItem, ShortenRequest, ShortenResponse};
use crate::owner::Owner;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use snipurl_core::{BatchInput, ShortCode, Snipped};
use tracing::debug;

fn status_of(snipped: &Snipped) -> StatusCode {
    if snipped.is_existing() {
        StatusCode::CONFLICT
    } else {
        StatusCode::CREATED
    }
}

fn require_url(url: &str) -> Result<&str> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::BadRequest("url must not be empty".to_string()));
    }
    Ok(url)
}

/// `POST /` with the URL as the plain-text body.
pub async fn shorten_text_handler(
    State(state): State<AppState>,
    owner: Owner,
    body: String,
) -> Result<Response> {
    let url = require_url(&body)?;
    let snipped = state
        .snipper()
        .set_url(url, &owner.or_anonymous())
        .await?;

    Ok((status_of(&snipped), state.short_url(snipped.code())).into_response())
}

pub async fn shorten_json_handler(
    State(state): State<AppState>,
    owner: Owner,
    Json(request): Json<ShortenRequest>,
) -> Result<Response> {
    let url = require_url(&request.url)?;
    let snipped = state
        .snipper()
        .set_url(url, &owner.or_anonymous())
        .await?;

    let response = ShortenResponse {
        result: state.short_url(snipped.code()),
    };
    Ok((status_of(&snipped), Json(response)).into_response())
}

pub async fn batch_shorten_handler(
    State(state): State<AppState>,
    owner: Owner,
    Json(items): Json<Vec<BatchShortenItem>>,
) -> Result<(StatusCode, Json<Vec<BatchShortenedItem>>)> {
    if items.is_empty() {
        return Err(AppError::BadRequest("batch must not be empty".to_string()));
    }

    let order: Vec<String> = items.iter().map(|i| i.correlation_id.clone()).collect();
    let inputs = items
        .into_iter()
        .map(|item| {
            Ok(BatchInput {
                correlation_id: item.correlation_id,
                original_url: require_url(&item.original_url)?.to_owned(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut outputs = state
        .snipper()
        .set_urls(inputs, &owner.or_anonymous())
        .await?;

    // Answer in request order; repeated correlation ids collapse to one entry.
    let response = order
        .into_iter()
        .filter_map(|id| outputs.remove(&id))
        .map(|output| BatchShortenedItem {
            short_url: state.short_url(&output.code),
            correlation_id: output.correlation_id,
        })
        .collect();

    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /{id}`: redirects to the original URL.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let Ok(code) = ShortCode::new(id) else {
        // Such a code can never have been issued.
        return Err(AppError::NotFound);
    };

    let url = state.snipper().get_url(&code).await?;
    debug!(code = %code, url, "redirecting");
    Ok(Redirect::temporary(&url))
}
