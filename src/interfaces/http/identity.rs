use crate::domain::order::CallerId;
use crate::error::AppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Header set by the upstream authentication layer once a token has been verified.
pub const CALLER_HEADER: &str = "x-user-id";

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedCaller(pub CallerId);

impl<S> FromRequestParts<S> for AuthenticatedCaller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(CALLER_HEADER)
            .ok_or_else(|| AppError::Unauthorized("missing caller identity".to_string()))?;
        let value = value
            .to_str()
            .map_err(|_| AppError::Unauthorized("unreadable caller identity".to_string()))?;
        Ok(Self(value.parse()?))
    }
}
