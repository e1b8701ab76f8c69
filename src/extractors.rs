use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header, request::Parts},
};

use crate::{db::models::AuthUser, names, rejections::AppError, AppState};

/// JSON body extractor whose rejections become `400 INPUT_ERROR`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// The raw session token from `Authorization: Bearer <token>`.
pub struct BearerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix(names::BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| BearerToken(token.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}

/// Guard extractor that verifies the bearer session token against the database.
/// Carries the authenticated user's info for use in handlers.
pub struct AuthGuard(pub AuthUser);

impl FromRequestParts<AppState> for AuthGuard {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;

        match state.db.get_user_by_session(&token).await {
            Ok(Some(user)) => Ok(AuthGuard(user)),
            Ok(None) => Err(AppError::Unauthorized),
            Err(e) => {
                tracing::error!("session lookup failed: {e:?}");
                Err(AppError::Internal("could not verify session"))
            }
        }
    }
}
