//! # Transaction
//! A transaction tracks one mutation from the moment a collection accepts it until the server has answered.
//!
//! ```text
//! Pending ──► Persisting ──► Completed
//!    │             │
//!    └─────────────┴───────► Failed
//! ```
//!
//! `Pending ──► Failed` only happens when the background task is dropped before it ever ran.
//!
//! Exactly one terminal state is ever reached, and the completion signal returned by [`Transaction::persisted`]
//! resolves exactly once. Every clone of a transaction observes the same resolution.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::Shared;

use crate::data_model::{Entity, Mutation};
use crate::error::MutationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionState {
    Pending,
    Persisting,
    Completed,
    Failed,
}

impl TransactionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionState::Completed | TransactionState::Failed)
    }

    fn can_transition_to(self, next: TransactionState) -> bool {
        use TransactionState::*;
        matches!(
            (self, next),
            (Pending, Persisting)
                | (Pending, Failed)
                | (Persisting, Completed)
                | (Persisting, Failed)
        )
    }
}

/// The authoritative record for inserts and updates, `None` for deletes.
pub type Outcome<T> = Result<Option<T>, MutationError>;

pub struct Transaction<T> {
    inner: Rc<TransactionInner<T>>,
}

struct TransactionInner<T> {
    id: String,
    mutation: Mutation<T>,
    optimistic: bool,
    state: Cell<TransactionState>,
    resolve: RefCell<Option<oneshot::Sender<Outcome<T>>>>,
    signal: Shared<oneshot::Receiver<Outcome<T>>>,
}

impl<T> Clone for Transaction<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Transaction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.mutation.kind)
            .field("key", &self.inner.mutation.key)
            .field("optimistic", &self.inner.optimistic)
            .field("state", &self.inner.state.get())
            .finish()
    }
}

impl<T: Entity> Transaction<T> {
    pub fn begin(mutation: Mutation<T>, optimistic: bool) -> Self {
        let (resolve, signal) = oneshot::channel();
        let id = eyedee::get_uuid();
        log::debug!(
            "Transaction {id} created: {} {:?} (optimistic: {optimistic})",
            mutation.kind,
            mutation.key
        );
        Self {
            inner: Rc::new(TransactionInner {
                id,
                mutation,
                optimistic,
                state: Cell::new(TransactionState::Pending),
                resolve: RefCell::new(Some(resolve)),
                signal: signal.shared(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn state(&self) -> TransactionState {
        self.inner.state.get()
    }

    pub fn mutation(&self) -> &Mutation<T> {
        &self.inner.mutation
    }

    pub fn is_optimistic(&self) -> bool {
        self.inner.optimistic
    }

    /// Resolves once the transaction reaches a terminal state. Can be awaited any number of times, from any clone.
    pub fn persisted(&self) -> impl Future<Output = Outcome<T>> + 'static {
        let signal = self.inner.signal.clone();
        async move { signal.await.unwrap_or(Err(MutationError::Abandoned)) }
    }

    pub(crate) fn begin_persisting(&self) -> bool {
        self.transition(TransactionState::Persisting)
    }

    pub(crate) fn complete(&self, confirmed: Option<T>) {
        if self.transition(TransactionState::Completed) {
            self.resolve(Ok(confirmed));
        }
    }

    pub(crate) fn fail(&self, error: MutationError) {
        if self.transition(TransactionState::Failed) {
            self.resolve(Err(error));
        }
    }

    fn transition(&self, next: TransactionState) -> bool {
        let current = self.inner.state.get();
        if !current.can_transition_to(next) {
            log::error!(
                "Transaction {} cannot move from {current:?} to {next:?}",
                self.inner.id
            );
            return false;
        }
        log::debug!("Transaction {}: {current:?} -> {next:?}", self.inner.id);
        self.inner.state.set(next);
        true
    }

    fn resolve(&self, outcome: Outcome<T>) {
        if let Some(resolve) = self.inner.resolve.borrow_mut().take() {
            // nobody listening is fine, the state is still recorded
            let _ = resolve.send(outcome);
        }
    }
}
