//! Types shared by the todo backend and the client.

use serde::{Deserialize, Deserializer, Serialize};

/// Requests carrying this header (with value `true`) are rejected by the server with a 500.
pub const SIMULATE_ERROR_HEADER: &str = "x-simulate-error";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub completed: bool,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl optimist::data_model::Entity for Todo {
    fn key(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)
    }
}

pub fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title is required".to_string());
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
}

impl optimist::data_model::Entity for User {
    fn key(&self) -> String {
        self.id.clone()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Hex color, e.g. `#3b82f6`.
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl optimist::data_model::Entity for Category {
    fn key(&self) -> String {
        self.id.clone()
    }
}

/// Body of `POST /todos`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl From<&Todo> for NewTodo {
    fn from(todo: &Todo) -> Self {
        Self {
            title: todo.title.clone(),
            completed: todo.completed,
            user_id: todo.user_id.clone(),
            category_id: todo.category_id.clone(),
        }
    }
}

/// Body of `PUT /todos/{id}`. Absent fields are left alone; for the optional
/// references, an explicit `null` clears them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub user_id: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub category_id: Option<Option<String>>,
}

impl TodoPatch {
    /// Every mutable field of `todo`, so the server ends up with exactly this record.
    pub fn replacing_with(todo: &Todo) -> Self {
        Self {
            title: Some(todo.title.clone()),
            completed: Some(todo.completed),
            user_id: Some(todo.user_id.clone()),
            category_id: Some(todo.category_id.clone()),
        }
    }

    pub fn apply(self, todo: &mut Todo) {
        if let Some(title) = self.title {
            todo.title = title;
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        if let Some(user_id) = self.user_id {
            todo.user_id = user_id;
        }
        if let Some(category_id) = self.category_id {
            todo.category_id = category_id;
        }
    }
}

// A field that is present (even as `null`) becomes `Some(..)`; `default` covers the absent case.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
