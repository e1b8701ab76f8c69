use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use crate::{
    extractors::{ApiJson, AuthGuard},
    models::Submission,
    names,
    rejections::{AppError, ResultExt},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/submit-answers", post(submit_answers))
        .route("/user-activity", get(user_activity))
        .route("/user-tests-count", get(user_tests_count))
}

async fn submit_answers(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Submission>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = state
        .db
        .submit_answers(&user.id, &body, Utc::now())
        .await
        .reject("could not save answers")?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn user_activity(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let activity = state
        .db
        .activity(&user.id, Utc::now().date_naive(), names::ACTIVITY_DAYS)
        .await
        .reject("could not load activity")?;

    Ok(Json(activity))
}

async fn user_tests_count(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let tests_count = state
        .db
        .tests_count(&user.id)
        .await
        .reject("could not count tests")?;

    Ok(Json(json!({ "tests_count": tests_count })))
}
