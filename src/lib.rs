pub mod db;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod names;
pub mod rejections;
pub mod services;

use axum::Router;

use services::{auth::AuthService, generator::GeneratorService};

#[derive(Clone)]
pub struct AppState {
    pub db: db::Db,
    pub auth: AuthService,
    pub generator: GeneratorService,
}

impl AppState {
    pub fn new(db: db::Db, generator: GeneratorService) -> Self {
        Self {
            auth: AuthService::new(db.clone()),
            db,
            generator,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest(names::QUIZ_PREFIX, handlers::quiz::routes())
        .nest(names::AUTH_PREFIX, handlers::account::routes())
        .with_state(state)
}
