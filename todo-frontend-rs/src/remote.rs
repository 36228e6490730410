//! Thin HTTP client for the todo API. Every failure, whether the server said no or never answered,
//! comes back as a [`RemoteError`].

use optimist::RemoteError;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use todo_model::{
    Category, DeleteResponse, ErrorBody, NewTodo, SIMULATE_ERROR_HEADER, Todo, TodoPatch, User,
};

use crate::config::ClientConfig;
use crate::error_simulation::ErrorSimulation;

#[derive(Clone, Debug)]
pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
    simulation: ErrorSimulation,
}

impl RemoteStore {
    pub fn new(config: &ClientConfig, simulation: ErrorSimulation) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            simulation,
        }
    }

    pub fn simulation(&self) -> &ErrorSimulation {
        &self.simulation
    }

    pub async fn fetch_todos(&self) -> Result<Vec<Todo>, RemoteError> {
        self.send(self.read("/todos"), "Failed to fetch todos")
            .await
    }

    pub async fn fetch_users(&self) -> Result<Vec<User>, RemoteError> {
        self.send(self.read("/users"), "Failed to fetch users")
            .await
    }

    pub async fn fetch_categories(&self) -> Result<Vec<Category>, RemoteError> {
        self.send(self.read("/categories"), "Failed to fetch categories")
            .await
    }

    pub async fn create_todo(&self, todo: &NewTodo) -> Result<Todo, RemoteError> {
        let request = self.write(Method::POST, "/todos").json(todo);
        self.send(request, "Failed to create todo").await
    }

    pub async fn update_todo(&self, id: &str, patch: &TodoPatch) -> Result<Todo, RemoteError> {
        let request = self.write(Method::PUT, &format!("/todos/{id}")).json(patch);
        self.send(request, "Failed to update todo").await
    }

    pub async fn delete_todo(&self, id: &str) -> Result<(), RemoteError> {
        let request = self.write(Method::DELETE, &format!("/todos/{id}"));
        let _: DeleteResponse = self.send(request, "Failed to delete todo").await?;
        Ok(())
    }

    fn read(&self, path: &str) -> RequestBuilder {
        self.client.get(format!("{}{path}", self.base_url))
    }

    fn write(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        if self.simulation.is_enabled() {
            request.header(SIMULATE_ERROR_HEADER, "true")
        } else {
            request
        }
    }

    async fn send<R: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<R, RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::transport(format!("{fallback}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(RemoteError::new(
                status.as_u16(),
                error_message(&body, fallback),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| RemoteError::new(status.as_u16(), format!("{fallback}: {e}")))
    }
}

/// The `error` field of a JSON error body, or `fallback` if there isn't a usable one.
fn error_message(body: &[u8], fallback: &str) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .map(|body| body.error)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
