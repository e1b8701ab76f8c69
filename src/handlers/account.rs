use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    extractors::{ApiJson, AuthGuard, BearerToken},
    models::ProfilePatch,
    rejections::{AppError, ResultExt},
    services::auth::{LoginOutcome, RegisterOutcome},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/change_user_data", post(change_user_data))
}

#[derive(Deserialize)]
struct RegisterBody {
    login: String,
    password: String,
    name: Option<String>,
    surname: Option<String>,
}

async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterBody>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .auth
        .register(&body.login, &body.password, body.name, body.surname)
        .await
        .reject("could not register user")?;

    match outcome {
        RegisterOutcome::Created(_) => Ok((
            StatusCode::CREATED,
            Json(json!({ "message": "user created" })),
        )),
        RegisterOutcome::EmptyFields => {
            Err(AppError::Input("login and password are required".to_string()))
        }
        RegisterOutcome::LoginTaken => {
            Err(AppError::Conflict(format!("login already exists: {}", body.login)))
        }
    }
}

#[derive(Deserialize)]
struct LoginBody {
    login: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginBody>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .auth
        .login(&body.login, &body.password)
        .await
        .reject("could not log in")?;

    match outcome {
        LoginOutcome::Success { token, user } => Ok(Json(json!({
            "token": token,
            "login": user.login,
            "name": user.name,
            "surname": user.surname,
            "score": user.score,
        }))),
        LoginOutcome::InvalidCredentials => {
            tracing::warn!("failed login attempt for {}", body.login);
            Err(AppError::Unauthorized)
        }
    }
}

async fn logout(
    AuthGuard(_user): AuthGuard,
    BearerToken(token): BearerToken,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth
        .logout(&token)
        .await
        .reject("could not log out")?;

    Ok(Json(json!({ "message": "logged out" })))
}

async fn change_user_data(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ProfilePatch>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state
        .auth
        .update_profile(&user.id, body)
        .await
        .reject("could not update profile")?;

    Ok(Json(updated))
}
