use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use snipurl_core::OwnerId;

/// Header carrying the caller's identity, set by the authentication proxy.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller's identity, if the request carried one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub Option<OwnerId>);

impl Owner {
    /// Identity to create records under. Anonymous when absent.
    pub fn or_anonymous(&self) -> OwnerId {
        self.0.clone().unwrap_or_else(OwnerId::anonymous)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(OwnerId::from);

        Ok(Owner(owner))
    }
}
