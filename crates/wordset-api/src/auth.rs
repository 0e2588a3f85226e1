use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::ApiError;

/// Header carrying the authenticated caller, set by the gateway in front of us.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller of a mutating route.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .map(|user| CurrentUser(user.to_string()))
            .ok_or(ApiError::Unauthorized)
    }
}
