use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use snipurl_core::SnipperError;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("missing user identity")]
    Unauthorized,
    #[error("short url not found")]
    NotFound,
    #[error(transparent)]
    Snipper(#[from] SnipperError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Snipper(SnipperError::Deleted) => StatusCode::GONE,
            AppError::Snipper(SnipperError::InvalidShortCode(_)) => StatusCode::BAD_REQUEST,
            AppError::Snipper(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            AppError::Snipper(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}
