use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::state::AppState;

/// Header the fronting proxy stores the client address in.
pub const REAL_IP_HEADER: &str = "x-real-ip";

/// Lets a request through only when its `X-Real-IP` equals the configured
/// trusted subnet. With no subnet configured every request is refused.
pub async fn trusted_subnet(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let real_ip = request
        .headers()
        .get(REAL_IP_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match (real_ip, state.trusted_subnet()) {
        (Some(ip), Some(trusted)) if ip == trusted => next.run(request).await,
        (ip, _) => {
            debug!(real_ip = ?ip, "request from untrusted address refused");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}
