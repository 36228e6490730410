use optimist::data_model::Mutation;
use optimist::{Persistence, RemoteError};
use todo_model::{NewTodo, Todo, TodoPatch};

use crate::notifications::Notifier;
use crate::remote::RemoteStore;

/// Sends todo mutations to the REST API. Failures are reported to the notifier before the
/// collection rolls back and the caller hears about them.
#[derive(Clone, Debug)]
pub struct TodoPersistence {
    remote: RemoteStore,
    notifier: Notifier,
}

impl TodoPersistence {
    pub fn new(remote: RemoteStore, notifier: Notifier) -> Self {
        Self { remote, notifier }
    }

    pub fn remote(&self) -> &RemoteStore {
        &self.remote
    }

    fn report<R>(&self, action: &str, result: Result<R, RemoteError>) -> Result<R, RemoteError> {
        if let Err(error) = &result {
            self.notifier.error(format!("{action} failed: {}", error.message));
        }
        result
    }
}

impl Persistence<Todo> for TodoPersistence {
    async fn on_insert(&self, mutation: &Mutation<Todo>) -> Result<Todo, RemoteError> {
        let result = match &mutation.modified {
            Some(todo) => self.remote.create_todo(&NewTodo::from(todo)).await,
            None => Err(RemoteError::transport("Failed to create todo: nothing to create")),
        };
        self.report("Create", result)
    }

    async fn on_update(&self, mutation: &Mutation<Todo>) -> Result<Todo, RemoteError> {
        let result = match &mutation.modified {
            Some(todo) => {
                self.remote
                    .update_todo(&mutation.key, &TodoPatch::replacing_with(todo))
                    .await
            }
            None => Err(RemoteError::transport("Failed to update todo: nothing to send")),
        };
        self.report("Update", result)
    }

    async fn on_delete(&self, mutation: &Mutation<Todo>) -> Result<(), RemoteError> {
        let result = self.remote.delete_todo(&mutation.key).await;
        self.report("Delete", result)
    }
}
