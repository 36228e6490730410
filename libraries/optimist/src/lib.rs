//! This is a library for keeping an in-memory mirror of server records that the UI can mutate instantly.
//! It was created for a todo demo, so it doesn't include much that was not needed for that project.
//!
//! Mutation strategy:
//! 1. Every record lives in a [`Collection`](data_model::Collection), keyed by a string id.
//! 2. Instead of mutating records directly, callers ask the collection to `insert`, `update` or `delete`. Each call creates a [`Transaction`](data_model::Transaction) for exactly one record.
//! 3. In optimistic mode the change is visible immediately. In pessimistic mode nothing changes until the server confirms.
//! 4. A [`Persistence`] adapter performs the remote call. When it succeeds the server's copy of the record replaces the local one (re-keying freshly inserted records from their temporary id). When it fails, the optimistic change is rolled back.
//! 5. [`LiveQuery`](query::LiveQuery) values subscribe to collections and recompute whenever they change.
//!
//! Everything here is single-threaded. Collections hold their state in `RefCell`s and never keep a borrow across an `.await`,
//! and the remote calls run on `tokio::task::spawn_local`, so mutations must be issued from inside a [`tokio::task::LocalSet`].

pub mod data_model;
pub mod error;
pub mod persistence;
pub mod query;

pub use error::{MutationError, RemoteError};
pub use persistence::{Persistence, ReadOnly};
