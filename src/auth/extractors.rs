use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderValue},
};
use tracing::warn;

use super::jwt::{Claims, JwtKeys};
use crate::error::AppError;

/// Verified bearer token. Handlers that take this argument only run once the
/// `Authorization` header has been checked.
pub struct AuthUser(pub Claims);

/// Gate over the raw `Authorization` header value.
pub fn authorize(header: Option<&HeaderValue>, keys: &JwtKeys) -> Result<Claims, AppError> {
    let header = header.ok_or(AppError::NoTokenProvided)?;
    let token = bearer_token(header)?;
    keys.verify(token)
}

// The token is whatever follows the first space, verbatim; the scheme word is not checked.
fn bearer_token(value: &HeaderValue) -> Result<&str, AppError> {
    let raw = value.to_str().map_err(|_| AppError::InvalidToken)?;
    raw.split_once(' ')
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::InvalidToken)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        match authorize(parts.headers.get(AUTHORIZATION), &keys) {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(e) => {
                warn!(reason = %e, path = %parts.uri.path(), "rejected unauthenticated request");
                Err(e)
            }
        }
    }
}
