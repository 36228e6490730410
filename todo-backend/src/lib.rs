//! A small in-memory REST API for todos, with artificial latency and on-demand failures so that
//! optimistic and pessimistic clients behave visibly differently.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;

pub mod config;
pub mod db;
pub mod error;
pub mod routes;

pub use config::{Config, ConfigError};
pub use db::Db;
pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Db>,
    pub config: Arc<Config>,
}

pub fn app(config: Config) -> Router {
    let state = AppState {
        db: Arc::new(Db::seeded(config.db_latency)),
        config: Arc::new(config),
    };

    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/todos",
            get(routes::todos::list).post(routes::todos::create),
        )
        .route(
            "/todos/{id}",
            get(routes::todos::get)
                .put(routes::todos::update)
                .delete(routes::todos::delete),
        )
        .route("/users", get(routes::reference::users))
        .route("/categories", get(routes::reference::categories))
        .layer(middleware::from_fn(log_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `config.bind_addr` and serves in the background. Returns the address actually bound.
pub async fn start(
    config: Config,
) -> std::io::Result<(SocketAddr, JoinHandle<std::io::Result<()>>)> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;
    let app = app(config);
    let server = tokio::spawn(async move { axum::serve(listener, app).await });
    Ok((addr, server))
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = std::time::Instant::now();

    let response = next.run(request).await;

    log::info!(
        "{method} {uri} -> {} in {:?}",
        response.status(),
        started.elapsed()
    );
    response
}
