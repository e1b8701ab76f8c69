mod crud;
mod generate;

use axum::Router;

use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(crud::routes())
        .merge(generate::routes())
        .merge(super::category::routes())
        .merge(super::results::routes())
}
