//! The in-memory store behind the API. Every call sleeps for a while to feel like a real database.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use todo_model::{Category, NewTodo, Todo, TodoPatch, User, now_millis};
use tokio::sync::RwLock;

pub struct Db {
    todos: RwLock<Vec<Todo>>,
    users: Vec<User>,
    categories: Vec<Category>,
    next_id: AtomicU64,
    latency: Duration,
}

impl Db {
    pub fn seeded(latency: Duration) -> Self {
        let now = now_millis();
        let minutes_ago = |m: i64| now - m * 60 * 1000;

        let todos = vec![
            Todo {
                id: "1".to_string(),
                title: "Learn optimistic mutations".to_string(),
                completed: false,
                created_at: minutes_ago(5),
                user_id: Some("user-1".to_string()),
                category_id: Some("cat-3".to_string()),
            },
            Todo {
                id: "2".to_string(),
                title: "Build a sample app".to_string(),
                completed: false,
                created_at: minutes_ago(3),
                user_id: Some("user-1".to_string()),
                category_id: Some("cat-1".to_string()),
            },
            Todo {
                id: "3".to_string(),
                title: "Understand live queries".to_string(),
                completed: true,
                created_at: minutes_ago(1),
                user_id: Some("user-2".to_string()),
                category_id: Some("cat-3".to_string()),
            },
        ];

        Self {
            next_id: AtomicU64::new(todos.len() as u64 + 1),
            todos: RwLock::new(todos),
            users: seed_users(),
            categories: seed_categories(),
            latency,
        }
    }

    async fn pause(&self, latency: Duration) {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    pub async fn find_all_todos(&self) -> Vec<Todo> {
        self.pause(self.latency).await;
        self.todos.read().await.clone()
    }

    pub async fn find_todo(&self, id: &str) -> Option<Todo> {
        self.pause(self.latency / 2).await;
        self.todos.read().await.iter().find(|t| t.id == id).cloned()
    }

    pub async fn create_todo(&self, new: NewTodo) -> Todo {
        self.pause(self.latency).await;
        let todo = Todo {
            id: self.next_id.fetch_add(1, Ordering::Relaxed).to_string(),
            title: new.title,
            completed: new.completed,
            created_at: now_millis(),
            user_id: new.user_id,
            category_id: new.category_id,
        };
        self.todos.write().await.push(todo.clone());
        todo
    }

    /// `None` if there is no such todo. The id and creation time never change.
    pub async fn update_todo(&self, id: &str, patch: TodoPatch) -> Option<Todo> {
        self.pause(self.latency).await;
        let mut todos = self.todos.write().await;
        let todo = todos.iter_mut().find(|t| t.id == id)?;
        patch.apply(todo);
        Some(todo.clone())
    }

    pub async fn delete_todo(&self, id: &str) -> bool {
        self.pause(self.latency).await;
        let mut todos = self.todos.write().await;
        let Some(index) = todos.iter().position(|t| t.id == id) else {
            return false;
        };
        todos.remove(index);
        true
    }

    pub async fn find_all_users(&self) -> Vec<User> {
        self.pause(self.latency).await;
        self.users.clone()
    }

    pub async fn find_all_categories(&self) -> Vec<Category> {
        self.pause(self.latency).await;
        self.categories.clone()
    }
}

fn seed_users() -> Vec<User> {
    [
        ("user-1", "Alice Johnson", "alice@example.com", 58),
        ("user-2", "Bob Smith", "bob@example.com", 10),
        ("user-3", "Carol Williams", "carol@example.com", 28),
    ]
    .into_iter()
    .map(|(id, name, email, img)| User {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        avatar: format!("https://i.pravatar.cc/150?img={img}"),
    })
    .collect()
}

fn seed_categories() -> Vec<Category> {
    [
        ("cat-1", "Work", "#3b82f6", "Work-related tasks"),
        ("cat-2", "Personal", "#10b981", "Personal tasks"),
        ("cat-3", "Learning", "#f59e0b", "Learning and education"),
    ]
    .into_iter()
    .map(|(id, name, color, description)| Category {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
        description: Some(description.to_string()),
    })
    .collect()
}
