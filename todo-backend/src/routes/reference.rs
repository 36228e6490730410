//! Read-only lookup tables the todos point into.

use axum::Json;
use axum::extract::State;
use todo_model::{Category, User};

use crate::AppState;

pub async fn users(State(state): State<AppState>) -> Json<Vec<User>> {
    Json(state.db.find_all_users().await)
}

pub async fn categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.db.find_all_categories().await)
}
