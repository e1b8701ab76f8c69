use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;

use crate::{
    extractors::{ApiJson, AuthGuard},
    rejections::{AppError, ResultExt},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/generate-quiz", post(generate_quiz))
}

#[derive(Deserialize)]
struct GenerateBody {
    text: String,
    category_id: String,
}

async fn generate_quiz(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<GenerateBody>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .generator
        .generate_quiz(&state.db, &body.text, &body.category_id)
        .await
        .reject("could not generate quiz")?;

    tracing::debug!("generated quiz {} for user {}", outcome.quiz.id, user.id);
    Ok(Json(outcome))
}
