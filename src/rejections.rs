use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::StoreError;
use crate::services::generator::GeneratorError;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Input(String),
    Conflict(String),
    Unauthorized,
    Upstream(&'static str),
    Internal(&'static str),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: &'a str,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, &str) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.as_str()),
            AppError::Input(msg) => (StatusCode::BAD_REQUEST, "INPUT_ERROR", msg.as_str()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.as_str()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "authentication required"),
            AppError::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_ERROR", *msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR", *msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, error, message) = self.parts();
        (code, Json(ErrorBody { error, message })).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!("rejected request body: {}", rejection.body_text());
        AppError::Input(rejection.body_text())
    }
}

pub trait ResultExt<T> {
    /// Classify the failure by the typed error it carries. Store and service
    /// faults become 5xx with `msg` as the only client-visible text.
    fn reject(self, msg: &'static str) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for color_eyre::Result<T> {
    fn reject(self, msg: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            if let Some(store) = e.downcast_ref::<StoreError>() {
                return match store {
                    StoreError::NotFound { .. } => AppError::NotFound(store.to_string()),
                    StoreError::Invalid(reason) => {
                        tracing::warn!("{msg}: {reason}");
                        AppError::Input(reason.clone())
                    }
                    StoreError::Conflict(reason) => AppError::Conflict(reason.clone()),
                };
            }

            if let Some(generator) = e.downcast_ref::<GeneratorError>() {
                tracing::error!("{msg}: {generator}");
                return AppError::Upstream(msg);
            }

            tracing::error!("{msg}: {e:?}");
            AppError::Internal(msg)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn classify(err: color_eyre::Report) -> AppError {
        Err::<(), _>(err).reject("operation failed").unwrap_err()
    }

    #[test]
    fn store_errors_map_to_client_errors() {
        assert!(matches!(
            classify(StoreError::not_found("quiz", "q1").into()),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            classify(StoreError::Invalid("bad".to_string()).into()),
            AppError::Input(msg) if msg == "bad"
        ));
        assert!(matches!(
            classify(StoreError::Conflict("dup".to_string()).into()),
            AppError::Conflict(_)
        ));
    }

    #[test]
    fn generator_errors_map_to_upstream() {
        let err = classify(GeneratorError::Timeout(Duration::from_secs(1)).into());
        assert!(matches!(err, AppError::Upstream("operation failed")));
    }

    #[test]
    fn unknown_errors_hide_their_cause() {
        let err = classify(color_eyre::eyre::eyre!("disk on fire"));
        assert!(matches!(err, AppError::Internal("operation failed")));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
