//! The todo client. [`TodoApp`] owns three collections mirroring the server (todos, users, categories) and offers
//! the actions the screens need. Every action returns the underlying [`Transaction`] so callers can choose between
//! firing and forgetting (optimistic) or awaiting [`Transaction::persisted`] (pessimistic).
//!
//! All of it runs on one thread and must be driven from inside a [`tokio::task::LocalSet`].

use optimist::data_model::{Collection, MutationOptions, Transaction};
use optimist::{MutationError, RemoteError};
use todo_model::{Category, Todo, User};

pub mod config;
pub mod error_simulation;
pub mod notifications;
pub mod persistence;
pub mod queries;
pub mod remote;

pub use config::ClientConfig;
pub use error_simulation::ErrorSimulation;
pub use notifications::{Notification, NotificationKind, Notifier, Toasts};
pub use persistence::TodoPersistence;
pub use remote::RemoteStore;

pub type Todos = Collection<Todo, TodoPersistence>;
pub type Users = Collection<User>;
pub type Categories = Collection<Category>;

/// Owner given to todos created from the pessimistic form.
pub const DEFAULT_USER_ID: &str = "user-1";

#[derive(Clone, Debug)]
pub struct TodoApp {
    remote: RemoteStore,
    notifier: Notifier,
    todos: Todos,
    users: Users,
    categories: Categories,
}

impl TodoApp {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_parts(config, Notifier::new(), ErrorSimulation::new())
    }

    pub fn with_parts(config: &ClientConfig, notifier: Notifier, simulation: ErrorSimulation) -> Self {
        let remote = RemoteStore::new(config, simulation);
        Self {
            todos: Collection::new(TodoPersistence::new(remote.clone(), notifier.clone())),
            users: Collection::default(),
            categories: Collection::default(),
            remote,
            notifier,
        }
    }

    pub fn todos(&self) -> &Todos {
        &self.todos
    }

    pub fn users(&self) -> &Users {
        &self.users
    }

    pub fn categories(&self) -> &Categories {
        &self.categories
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn simulation(&self) -> &ErrorSimulation {
        self.remote.simulation()
    }

    /// Reloads all three collections from the server. Todos with a mutation in flight keep their local value.
    pub async fn refresh(&self) -> Result<(), RemoteError> {
        let loaded = futures::try_join!(
            self.remote.fetch_todos(),
            self.remote.fetch_users(),
            self.remote.fetch_categories(),
        );
        let (todos, users, categories) = match loaded {
            Ok(loaded) => loaded,
            Err(error) => {
                log::error!("Refresh failed: {error}");
                self.notifier.error(error.message.clone());
                return Err(error);
            }
        };

        log::debug!(
            "Loaded {} todos, {} users, {} categories",
            todos.len(),
            users.len(),
            categories.len()
        );
        self.users.replace_all(users, None);
        self.categories.replace_all(categories, None);
        self.todos.replace_all(todos, None);
        Ok(())
    }

    /// Creates a todo under a temporary id. Once the server confirms, it is re-keyed to the server's id.
    pub fn add_todo(
        &self,
        title: &str,
        user_id: Option<String>,
        category_id: Option<String>,
        options: MutationOptions,
    ) -> Result<Transaction<Todo>, MutationError> {
        let todo = Todo {
            id: eyedee::temp_id(),
            title: title.trim().to_string(),
            completed: false,
            created_at: todo_model::now_millis(),
            user_id,
            category_id,
        };
        self.todos.insert(todo, options)
    }

    pub fn toggle(&self, id: &str, options: MutationOptions) -> Result<Transaction<Todo>, MutationError> {
        self.todos
            .update(id, options, |todo| todo.completed = !todo.completed)
    }

    pub fn rename(
        &self,
        id: &str,
        title: &str,
        options: MutationOptions,
    ) -> Result<Transaction<Todo>, MutationError> {
        let title = title.trim().to_string();
        self.todos.update(id, options, move |todo| todo.title = title)
    }

    /// `None` clears the category.
    pub fn set_category(
        &self,
        id: &str,
        category_id: Option<String>,
        options: MutationOptions,
    ) -> Result<Transaction<Todo>, MutationError> {
        self.todos
            .update(id, options, move |todo| todo.category_id = category_id)
    }

    pub fn assign(
        &self,
        id: &str,
        user_id: Option<String>,
        options: MutationOptions,
    ) -> Result<Transaction<Todo>, MutationError> {
        self.todos
            .update(id, options, move |todo| todo.user_id = user_id)
    }

    pub fn delete(&self, id: &str, options: MutationOptions) -> Result<Transaction<Todo>, MutationError> {
        self.todos.delete(id, options)
    }
}
