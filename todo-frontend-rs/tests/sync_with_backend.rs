use optimist::MutationError;
use optimist::data_model::{MutationOptions, TransactionState};
use todo_frontend_rs::queries::{all_todos, todo_details};
use todo_frontend_rs::{ClientConfig, DEFAULT_USER_ID, NotificationKind, TodoApp, Toasts};
use tokio::task::LocalSet;

async fn connect() -> (TodoApp, Toasts) {
    let _ = env_logger::builder().is_test(true).try_init();
    let (addr, _server) = todo_backend::start(todo_backend::Config::for_tests())
        .await
        .unwrap();

    let app = TodoApp::new(&ClientConfig::new(format!("http://{addr}")));
    let toasts = Toasts::new();
    toasts.attach(app.notifier());
    app.refresh().await.unwrap();
    (app, toasts)
}

fn toast_texts(toasts: &Toasts) -> Vec<String> {
    toasts.current().into_iter().map(|t| t.text).collect()
}

#[tokio::test]
async fn test_initial_load() {
    LocalSet::new()
        .run_until(async {
            let (app, toasts) = connect().await;
            assert_eq!(app.todos().len(), 3);
            assert_eq!(app.users().len(), 3);
            assert_eq!(app.categories().len(), 3);
            assert!(app.todos().loaded_at_least_once());

            let newest = all_todos(app.todos()).current();
            assert_eq!(newest[0].id, "3");
            assert_eq!(
                todo_details(app.todos(), app.users(), app.categories()).len(),
                3
            );
            assert!(toasts.is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_optimistic_insert_is_rekeyed_to_the_server_id() {
    LocalSet::new()
        .run_until(async {
            let (app, _toasts) = connect().await;
            let newest_first = all_todos(app.todos());

            let tx = app
                .add_todo("Buy milk", None, None, MutationOptions::optimistic())
                .unwrap();
            let temp_id = tx.mutation().key.clone();

            // visible before the server has answered
            assert_eq!(newest_first.current()[0].id, temp_id);
            assert_eq!(newest_first.len(), 4);

            let confirmed = tx.persisted().await.unwrap().unwrap();
            assert_eq!(confirmed.id, "4");
            assert_eq!(tx.state(), TransactionState::Completed);

            assert!(app.todos().get(&temp_id).is_none());
            let stored = app.todos().get("4").unwrap();
            assert_eq!(stored.title, "Buy milk");
            assert!(!stored.completed);
            assert_eq!(newest_first.current()[0].id, "4");
            assert_eq!(newest_first.len(), 4);

            let on_server = app.todos().persistence().remote().fetch_todos().await.unwrap();
            assert!(on_server.iter().any(|t| t.id == "4" && t.title == "Buy milk"));
        })
        .await;
}

#[tokio::test]
async fn test_pessimistic_insert_waits_for_the_server() {
    LocalSet::new()
        .run_until(async {
            let (app, _toasts) = connect().await;
            let before = app.todos().snapshot();

            let tx = app
                .add_todo(
                    "Write report",
                    Some(DEFAULT_USER_ID.to_string()),
                    Some("cat-1".to_string()),
                    MutationOptions::pessimistic(),
                )
                .unwrap();
            assert_eq!(app.todos().snapshot(), before);

            let confirmed = tx.persisted().await.unwrap().unwrap();
            assert_eq!(app.todos().get(&confirmed.id), Some(confirmed.clone()));
            assert_eq!(confirmed.user_id.as_deref(), Some(DEFAULT_USER_ID));
            assert_eq!(confirmed.category_id.as_deref(), Some("cat-1"));
            assert_eq!(app.todos().len(), 4);
        })
        .await;
}

#[tokio::test]
async fn test_pessimistic_update_clears_the_category() {
    LocalSet::new()
        .run_until(async {
            let (app, _toasts) = connect().await;
            let tx = app
                .set_category("1", None, MutationOptions::pessimistic())
                .unwrap();
            assert_eq!(app.todos().get("1").unwrap().category_id.as_deref(), Some("cat-3"));

            tx.persisted().await.unwrap();
            assert_eq!(app.todos().get("1").unwrap().category_id, None);

            let on_server = app.todos().persistence().remote().fetch_todos().await.unwrap();
            let todo = on_server.into_iter().find(|t| t.id == "1").unwrap();
            assert_eq!(todo.category_id, None);
        })
        .await;
}

#[tokio::test]
async fn test_simulated_failures_roll_back_and_notify() {
    LocalSet::new()
        .run_until(async {
            let (app, toasts) = connect().await;
            let before = app.todos().snapshot();
            app.simulation().enable();

            let toggle = app.toggle("1", MutationOptions::optimistic()).unwrap();
            assert!(app.todos().get("1").unwrap().completed);
            let error = toggle.persisted().await.unwrap_err();
            assert!(matches!(error, MutationError::Remote(ref e) if e.status == Some(500)));
            assert_eq!(toggle.state(), TransactionState::Failed);

            let delete = app.delete("2", MutationOptions::optimistic()).unwrap();
            assert!(!app.todos().contains("2"));
            assert!(delete.persisted().await.is_err());

            let insert = app
                .add_todo("Doomed", None, None, MutationOptions::optimistic())
                .unwrap();
            assert_eq!(app.todos().len(), 4);
            assert!(insert.persisted().await.is_err());

            assert_eq!(app.todos().snapshot(), before);
            assert_eq!(
                toast_texts(&toasts),
                vec![
                    "Update failed: Simulated server error (update)",
                    "Delete failed: Simulated server error (delete)",
                    "Create failed: Simulated server error (create)",
                ]
            );
            assert!(toasts.current().iter().all(|t| t.kind == NotificationKind::Error));

            app.simulation().disable();
            let on_server = app.todos().persistence().remote().fetch_todos().await.unwrap();
            assert_eq!(on_server.len(), 3);
            assert!(on_server.iter().all(|t| t.id != "1" || !t.completed));
        })
        .await;
}

#[tokio::test]
async fn test_second_mutation_on_a_busy_todo_is_rejected() {
    LocalSet::new()
        .run_until(async {
            let (app, _toasts) = connect().await;
            let first = app.toggle("2", MutationOptions::optimistic()).unwrap();
            assert!(matches!(
                app.toggle("2", MutationOptions::optimistic()),
                Err(MutationError::InFlight { .. })
            ));

            first.persisted().await.unwrap();
            assert!(app.todos().get("2").unwrap().completed);

            let second = app.toggle("2", MutationOptions::optimistic()).unwrap();
            second.persisted().await.unwrap();
            assert!(!app.todos().get("2").unwrap().completed);
        })
        .await;
}

#[tokio::test]
async fn test_deleting_a_todo_gone_from_the_server() {
    LocalSet::new()
        .run_until(async {
            let (app, toasts) = connect().await;
            app.todos().persistence().remote().delete_todo("3").await.unwrap();

            let tx = app.delete("3", MutationOptions::optimistic()).unwrap();
            let error = tx.persisted().await.unwrap_err();
            assert!(matches!(error, MutationError::Remote(ref e) if e.status == Some(404)));
            assert!(app.todos().contains("3"));
            assert_eq!(toast_texts(&toasts), vec!["Delete failed: Todo not found"]);

            app.refresh().await.unwrap();
            assert!(!app.todos().contains("3"));
            assert_eq!(app.todos().len(), 2);
        })
        .await;
}
