use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::Value;
use todo_model::{DeleteResponse, NewTodo, Todo, TodoPatch, validate_title};

use super::SimulatedError;
use crate::AppState;
use crate::error::ApiError;

pub async fn list(State(state): State<AppState>) -> Json<Vec<Todo>> {
    Json(state.db.find_all_todos().await)
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, ApiError> {
    state
        .db
        .find_todo(&id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound("Todo not found"))
}

pub async fn create(
    simulated: SimulatedError,
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    simulated.check("create")?;
    let Json(body) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let new = parse_new_todo(&body)?;

    let todo = state.db.create_todo(new).await;
    log::info!("created todo {} ({:?})", todo.id, todo.title);
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn update(
    simulated: SimulatedError,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TodoPatch>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    mutation_delay(&state).await;
    simulated.check("update")?;
    let Json(patch) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    state
        .db
        .update_todo(&id, patch)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound("Todo not found"))
}

pub async fn delete(
    simulated: SimulatedError,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    mutation_delay(&state).await;
    simulated.check("delete")?;

    if !state.db.delete_todo(&id).await {
        return Err(ApiError::NotFound("Todo not found"));
    }
    Ok(Json(DeleteResponse { success: true }))
}

async fn mutation_delay(state: &AppState) {
    let delay = state.config.mutation_delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

// Checked by hand rather than through `Json<NewTodo>` so a missing or non-string title gets the same message.
fn parse_new_todo(body: &Value) -> Result<NewTodo, ApiError> {
    let title = body
        .get("title")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::BadRequest("Title is required".to_string()))?;
    validate_title(title).map_err(ApiError::BadRequest)?;

    let reference = |field: &str| body.get(field).and_then(Value::as_str).map(str::to_string);
    Ok(NewTodo {
        title: title.to_string(),
        completed: body
            .get("completed")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        user_id: reference("userId"),
        category_id: reference("categoryId"),
    })
}
