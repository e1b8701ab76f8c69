use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    extractors::{ApiJson, AuthGuard},
    models::{NewQuiz, QuizPatch},
    names,
    rejections::{AppError, ResultExt},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quizes", post(create_quiz).get(list_quizzes))
        .route(
            "/quizes/{id}",
            get(get_quiz).put(update_quiz).delete(delete_quiz),
        )
}

async fn create_quiz(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewQuiz>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = state
        .db
        .create_quiz(&body)
        .await
        .reject("could not create quiz")?;

    tracing::debug!("quiz {} created by user {}", quiz.id, user.id);
    Ok((StatusCode::CREATED, Json(quiz)))
}

async fn update_quiz(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
    ApiJson(body): ApiJson<QuizPatch>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = state
        .db
        .update_quiz(&quiz_id, body)
        .await
        .reject("could not update quiz")?;

    tracing::debug!("quiz {quiz_id} updated by user {}", user.id);
    Ok(Json(quiz))
}

async fn delete_quiz(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .delete_quiz(&quiz_id)
        .await
        .reject("could not delete quiz")?;

    tracing::debug!("quiz {quiz_id} deleted by user {}", user.id);
    Ok(Json(json!({ "message": "quiz deleted", "id": quiz_id })))
}

async fn get_quiz(
    AuthGuard(_user): AuthGuard,
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = state
        .db
        .quiz_detail(&quiz_id)
        .await
        .reject("could not load quiz")?;

    Ok(Json(quiz))
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    names::DEFAULT_PAGE_LIMIT
}

async fn list_quizzes(
    AuthGuard(_user): AuthGuard,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    if query.skip < 0 || query.limit < 0 {
        return Err(AppError::Input("skip and limit must not be negative".to_string()));
    }

    let (quizes, total_count) = state
        .db
        .quizzes(query.skip, query.limit)
        .await
        .reject("could not list quizzes")?;

    Ok(Json(json!({ "quizes": quizes, "total_count": total_count })))
}
