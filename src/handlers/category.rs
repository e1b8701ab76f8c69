use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    extractors::{ApiJson, AuthGuard},
    rejections::{AppError, ResultExt},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/categories", get(list_categories).post(create_category))
}

async fn list_categories(
    AuthGuard(_user): AuthGuard,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let categories = state
        .db
        .categories()
        .await
        .reject("could not list categories")?;

    Ok(Json(json!({ "categories": categories })))
}

#[derive(Deserialize)]
struct CategoryBody {
    name: String,
}

async fn create_category(
    AuthGuard(_user): AuthGuard,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CategoryBody>,
) -> Result<impl IntoResponse, AppError> {
    let category = state
        .db
        .create_category(&body.name)
        .await
        .reject("could not create category")?;

    Ok((StatusCode::CREATED, Json(category)))
}
