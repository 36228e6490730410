//! # Collection
//! An in-memory mirror of one kind of server record, keyed by id. Readers only ever see snapshots; the only way to
//! change a collection is through a mutation (or a full reload from the server via [`Collection::replace_all`]).
//!
//! At most one transaction per key is in flight at any time. A second mutation on a key whose previous transaction
//! has not settled is rejected with [`MutationError::InFlight`]. This keeps rollback exact: undoing a failed
//! optimistic change restores precisely the state from before it.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::data_model::{
    DirtyTracker, Entity, ListenerKey, Mutation, MutationKind, MutationOptions, Transaction,
};
use crate::error::MutationError;
use crate::persistence::{Persistence, ReadOnly};

pub type Items<T> = im::HashMap<String, T>;

type Listener = Rc<dyn Fn(ListenerKey)>;

pub struct Collection<T: Entity, P = ReadOnly> {
    inner: Rc<CollectionInner<T>>,
    persistence: Rc<P>,
}

struct CollectionInner<T> {
    // never hold a borrow of these across an .await
    items: RefCell<DirtyTracker<Items<T>>>,
    in_flight: RefCell<HashSet<String>>,
    listeners: RefCell<slotmap::SlotMap<slotmap::DefaultKey, Listener>>,
}

impl<T: Entity, P> Clone for Collection<T, P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            persistence: self.persistence.clone(),
        }
    }
}

impl<T: Entity, P> fmt::Debug for Collection<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("len", &self.len())
            .field("in_flight", &self.inner.in_flight.borrow().len())
            .field("loaded", &self.loaded_at_least_once())
            .finish()
    }
}

impl<T: Entity> Default for Collection<T, ReadOnly> {
    fn default() -> Self {
        Self::new(ReadOnly)
    }
}

/// Flushes pending listener notifications when dropped, so a method can't forget to.
struct FlushLater<'a, T: Entity, P>(&'a Collection<T, P>);

impl<T: Entity, P> Drop for FlushLater<'_, T, P> {
    fn drop(&mut self) {
        self.0.flush_notifications();
    }
}

impl<T: Entity, P> Collection<T, P> {
    pub fn new(persistence: P) -> Self {
        Self {
            inner: Rc::new(CollectionInner {
                items: RefCell::new(DirtyTracker::default()),
                in_flight: RefCell::new(HashSet::new()),
                listeners: RefCell::new(slotmap::SlotMap::new()),
            }),
            persistence: Rc::new(persistence),
        }
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.inner.items.borrow().state().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.items.borrow().state().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().state().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cheap: the underlying map is persistent, so this is a pointer copy.
    pub fn snapshot(&self) -> Items<T> {
        self.inner.items.borrow().state().clone()
    }

    pub fn values(&self) -> Vec<T> {
        self.inner.items.borrow().state().values().cloned().collect()
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.inner.in_flight.borrow().contains(key)
    }

    pub fn loaded_at_least_once(&self) -> bool {
        self.inner.items.borrow().loaded_at_least_once()
    }

    /// Replace the contents with a fresh copy from the server.
    /// Records with a transaction in flight keep their local (possibly optimistic) value.
    /// An optimistic insert is still held under its temporary key, so if the server already stored it the reload
    /// shows both rows until the insert settles and re-keys onto the server's id.
    pub fn replace_all(&self, items: impl IntoIterator<Item = T>, modifier: Option<ListenerKey>) {
        let _flusher = FlushLater(self);

        let mut fresh: Items<T> = items.into_iter().map(|item| (item.key(), item)).collect();
        {
            let in_flight = self.inner.in_flight.borrow();
            let mut tracker = self.inner.items.borrow_mut();
            for key in in_flight.iter() {
                match tracker.state().get(key) {
                    Some(local) => fresh.insert(key.clone(), local.clone()),
                    None => fresh.remove(key),
                };
            }
            if *tracker.state() != fresh {
                *tracker.state_mut(modifier) = fresh;
            }
            tracker.mark_loaded(modifier);
        }
    }

    /// The listener is invoked whenever the records change.
    pub fn subscribe(&self, listener: impl Fn(ListenerKey) + 'static) -> ListenerKey {
        let key = self.inner.listeners.borrow_mut().insert(Rc::new(listener));
        ListenerKey(key)
    }

    pub fn unsubscribe(&self, key: ListenerKey) {
        self.inner.listeners.borrow_mut().remove(key.0);
    }

    /// Calls every listener due a notification. Borrows are released before any listener runs,
    /// so listeners are free to read the collection (or subscribe, unsubscribe, mutate).
    pub fn flush_notifications(&self) {
        for notification in self.drain_due_notifications() {
            notification();
        }
    }

    fn drain_due_notifications(&self) -> Vec<Box<dyn FnOnce()>> {
        let Some(exclude_key) = self.inner.items.borrow_mut().take_dirty() else {
            return Vec::new();
        };

        self.inner
            .listeners
            .borrow()
            .iter()
            .map(|(key, listener)| (ListenerKey(key), listener.clone()))
            .filter(|(key, _)| exclude_key != Some(*key))
            .map(|(key, listener)| Box::new(move || listener(key)) as Box<dyn FnOnce()>)
            .collect()
    }

    fn ensure_idle(&self, key: &str) -> Result<(), MutationError> {
        if self.is_in_flight(key) {
            return Err(MutationError::InFlight {
                key: key.to_string(),
            });
        }
        Ok(())
    }
}

impl<T: Entity, P: Persistence<T> + 'static> Collection<T, P> {
    /// The entity must already carry a (temporary) key that is not present in the collection.
    pub fn insert(
        &self,
        entity: T,
        options: MutationOptions,
    ) -> Result<Transaction<T>, MutationError> {
        let key = entity.key();
        validate(&entity)?;
        if self.contains(&key) {
            return Err(MutationError::Validation {
                key,
                reason: "a record with this key already exists".to_string(),
            });
        }
        self.ensure_idle(&key)?;

        Ok(self.begin(Mutation::insert(entity), options))
    }

    /// `mutator` edits a draft copy of the current record. Changing the key is not allowed.
    pub fn update(
        &self,
        key: &str,
        options: MutationOptions,
        mutator: impl FnOnce(&mut T),
    ) -> Result<Transaction<T>, MutationError> {
        let original = self.get(key).ok_or_else(|| MutationError::NotFound {
            key: key.to_string(),
        })?;
        self.ensure_idle(key)?;

        let mut draft = original.clone();
        mutator(&mut draft);
        if draft.key() != key {
            return Err(MutationError::Validation {
                key: key.to_string(),
                reason: format!("the key cannot change (got {:?})", draft.key()),
            });
        }
        validate(&draft)?;

        Ok(self.begin(Mutation::update(original, draft), options))
    }

    pub fn delete(
        &self,
        key: &str,
        options: MutationOptions,
    ) -> Result<Transaction<T>, MutationError> {
        let original = self.get(key).ok_or_else(|| MutationError::NotFound {
            key: key.to_string(),
        })?;
        self.ensure_idle(key)?;

        Ok(self.begin(Mutation::delete(original), options))
    }

    fn begin(&self, mutation: Mutation<T>, options: MutationOptions) -> Transaction<T> {
        let transaction = Transaction::begin(mutation, options.optimistic);
        let key = transaction.mutation().key.clone();
        self.inner.in_flight.borrow_mut().insert(key);

        if options.optimistic {
            let _flusher = FlushLater(self);
            let mut tracker = self.inner.items.borrow_mut();
            transaction
                .mutation()
                .apply_to(&mut tracker.state_mut(options.modifier));
        }

        let trip = SettleOrAbandon {
            collection: self.clone(),
            transaction: transaction.clone(),
            modifier: options.modifier,
        };
        tokio::task::spawn_local(async move { trip.persist().await });

        transaction
    }
}

/// One transaction's trip to the server. Dropping it before the transaction settles (the adapter
/// panicked, or the task was dropped with its `LocalSet`) releases the key, rolls back an optimistic
/// change and fails the transaction with [`MutationError::Abandoned`].
struct SettleOrAbandon<T: Entity, P> {
    collection: Collection<T, P>,
    transaction: Transaction<T>,
    modifier: Option<ListenerKey>,
}

impl<T: Entity, P> Drop for SettleOrAbandon<T, P> {
    fn drop(&mut self) {
        if self.transaction.state().is_terminal() {
            return;
        }

        let mutation = self.transaction.mutation();
        log::error!(
            "{} of {:?} was abandoned before it settled",
            mutation.kind,
            mutation.key
        );
        let inner = &self.collection.inner;
        if let Ok(mut in_flight) = inner.in_flight.try_borrow_mut() {
            in_flight.remove(&mutation.key);
        }
        if self.transaction.is_optimistic() {
            match inner.items.try_borrow_mut() {
                Ok(mut tracker) => mutation.revert(&mut tracker.state_mut(self.modifier)),
                Err(_) => log::error!("cannot roll back {:?}, records are borrowed", mutation.key),
            }
        }
        // while unwinding, listeners hear about the rollback on the next flush instead
        if !std::thread::panicking() {
            self.collection.flush_notifications();
        }
        self.transaction.fail(MutationError::Abandoned);
    }
}

impl<T: Entity, P: Persistence<T> + 'static> SettleOrAbandon<T, P> {
    async fn persist(&self) {
        let (collection, transaction, modifier) =
            (&self.collection, &self.transaction, self.modifier);
        transaction.begin_persisting();

        let mutation = transaction.mutation();
        let persistence = &collection.persistence;
        let result = match mutation.kind {
            MutationKind::Insert => persistence.on_insert(mutation).await.map(Some),
            MutationKind::Update => persistence.on_update(mutation).await.map(Some),
            MutationKind::Delete => persistence.on_delete(mutation).await.map(|()| None),
        };

        collection.inner.in_flight.borrow_mut().remove(&mutation.key);

        match result {
            Ok(confirmed) => {
                {
                    let _flusher = FlushLater(collection);
                    let mut tracker = collection.inner.items.borrow_mut();
                    if !mutation.is_settled_in(tracker.state(), confirmed.as_ref()) {
                        mutation.settle(&mut tracker.state_mut(modifier), confirmed.as_ref());
                    }
                }
                transaction.complete(confirmed);
            }
            Err(error) => {
                log::warn!(
                    "{} of {:?} failed: {error}{}",
                    mutation.kind,
                    mutation.key,
                    if transaction.is_optimistic() {
                        ", rolling back"
                    } else {
                        ""
                    }
                );
                if transaction.is_optimistic() {
                    let _flusher = FlushLater(collection);
                    let mut tracker = collection.inner.items.borrow_mut();
                    mutation.revert(&mut tracker.state_mut(modifier));
                }
                transaction.fail(MutationError::Remote(error));
            }
        }
    }
}

fn validate<T: Entity>(entity: &T) -> Result<(), MutationError> {
    entity
        .validate()
        .map_err(|reason| MutationError::Validation {
            key: entity.key(),
            reason,
        })
}
