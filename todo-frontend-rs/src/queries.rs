//! The live views the todo screens render. Every list is newest first.

use optimist::data_model::{Collection, Items};
use optimist::query::{LiveQuery, inner_join, left_join, order_by_desc};
use todo_model::{Category, Todo, User};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoWithUser {
    pub todo: Todo,
    pub user: User,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoWithCategory {
    pub todo: Todo,
    pub category: Option<Category>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoDetails {
    pub todo: Todo,
    pub user: User,
    pub category: Option<Category>,
}

fn newest_first(todos: &Items<Todo>, keep: impl Fn(&Todo) -> bool) -> Vec<Todo> {
    order_by_desc(
        todos.values().filter(|&todo| keep(todo)).cloned().collect(),
        |todo: &Todo| (todo.created_at, todo.id.clone()),
    )
}

pub fn all_todos<P: 'static>(todos: &Collection<Todo, P>) -> LiveQuery<Todo> {
    LiveQuery::over(todos, |items: &Items<Todo>| newest_first(items, |_| true))
}

pub fn active_todos<P: 'static>(todos: &Collection<Todo, P>) -> LiveQuery<Todo> {
    LiveQuery::over(todos, |items: &Items<Todo>| {
        newest_first(items, |todo| !todo.completed)
    })
}

pub fn completed_todos<P: 'static>(todos: &Collection<Todo, P>) -> LiveQuery<Todo> {
    LiveQuery::over(todos, |items: &Items<Todo>| {
        newest_first(items, |todo| todo.completed)
    })
}

/// Todos that have an owner, with that owner. Unassigned todos are left out.
pub fn todos_with_users<P: 'static, Q: 'static>(
    todos: &Collection<Todo, P>,
    users: &Collection<User, Q>,
) -> LiveQuery<TodoWithUser> {
    let (todo_source, user_source) = (todos.clone(), users.clone());
    LiveQuery::new(move || {
        let todos = newest_first(&todo_source.snapshot(), |_| true);
        let users = user_source.snapshot();
        inner_join(
            &todos,
            users.values(),
            |todo: &Todo| todo.user_id.clone(),
            |user: &User| user.id.clone(),
        )
        .into_iter()
        .map(|(todo, user)| TodoWithUser { todo, user })
        .collect()
    })
    .depends_on(todos)
    .depends_on(users)
}

pub fn todos_with_categories<P: 'static, Q: 'static>(
    todos: &Collection<Todo, P>,
    categories: &Collection<Category, Q>,
) -> LiveQuery<TodoWithCategory> {
    let (todo_source, category_source) = (todos.clone(), categories.clone());
    LiveQuery::new(move || {
        let todos = newest_first(&todo_source.snapshot(), |_| true);
        let categories = category_source.snapshot();
        left_join(
            &todos,
            categories.values(),
            |todo: &Todo| todo.category_id.clone(),
            |category: &Category| category.id.clone(),
        )
        .into_iter()
        .map(|(todo, category)| TodoWithCategory { todo, category })
        .collect()
    })
    .depends_on(todos)
    .depends_on(categories)
}

/// Owner required, category optional.
pub fn todo_details<P: 'static, Q: 'static, R: 'static>(
    todos: &Collection<Todo, P>,
    users: &Collection<User, Q>,
    categories: &Collection<Category, R>,
) -> LiveQuery<TodoDetails> {
    let todo_source = todos.clone();
    let user_source = users.clone();
    let category_source = categories.clone();
    LiveQuery::new(move || {
        let todos = newest_first(&todo_source.snapshot(), |_| true);
        let users = user_source.snapshot();
        let categories = category_source.snapshot();
        let with_users = inner_join(
            &todos,
            users.values(),
            |todo: &Todo| todo.user_id.clone(),
            |user: &User| user.id.clone(),
        );
        with_users
            .into_iter()
            .map(|(todo, user)| {
                let category = todo
                    .category_id
                    .as_ref()
                    .and_then(|id| categories.get(id))
                    .cloned();
                TodoDetails {
                    todo,
                    user,
                    category,
                }
            })
            .collect()
    })
    .depends_on(todos)
    .depends_on(users)
    .depends_on(categories)
}
