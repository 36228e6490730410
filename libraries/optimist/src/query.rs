//! # Live queries
//! A live query is a computation over one or more collections whose result is kept up to date: every time a source
//! collection notifies, the query re-runs synchronously and then tells its own observers.
//!
//! The join helpers below work on plain iterators so a query closure can combine snapshots of several collections.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use crate::data_model::{Collection, Entity, Items, ListenerKey};

type Observer = Rc<dyn Fn()>;

pub struct LiveQuery<R> {
    inner: Rc<LiveQueryInner<R>>,
    unsubscribers: Vec<Box<dyn FnOnce()>>,
}

struct LiveQueryInner<R> {
    compute: Box<dyn Fn() -> Vec<R>>,
    results: RefCell<Vec<R>>,
    observers: RefCell<slotmap::SlotMap<slotmap::DefaultKey, Observer>>,
}

impl<R> LiveQueryInner<R> {
    fn refresh(&self) {
        let results = (self.compute)();
        *self.results.borrow_mut() = results;

        let observers: Vec<Observer> = self.observers.borrow().values().cloned().collect();
        for observer in observers {
            observer();
        }
    }
}

impl<R: Clone + 'static> LiveQuery<R> {
    /// Evaluates `compute` once right away. Call [`LiveQuery::depends_on`] for every collection it reads.
    pub fn new(compute: impl Fn() -> Vec<R> + 'static) -> Self {
        let results = compute();
        Self {
            inner: Rc::new(LiveQueryInner {
                compute: Box::new(compute),
                results: RefCell::new(results),
                observers: RefCell::new(slotmap::SlotMap::new()),
            }),
            unsubscribers: Vec::new(),
        }
    }

    /// A query over a single collection.
    pub fn over<T: Entity, P: 'static>(
        collection: &Collection<T, P>,
        compute: impl Fn(&Items<T>) -> Vec<R> + 'static,
    ) -> Self {
        let source = collection.clone();
        Self::new(move || compute(&source.snapshot())).depends_on(collection)
    }

    pub fn depends_on<T: Entity, P: 'static>(mut self, collection: &Collection<T, P>) -> Self {
        let weak: Weak<LiveQueryInner<R>> = Rc::downgrade(&self.inner);
        let key = collection.subscribe(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.refresh();
            }
        });
        let collection = collection.clone();
        self.unsubscribers
            .push(Box::new(move || collection.unsubscribe(key)));
        self
    }

    pub fn current(&self) -> Vec<R> {
        self.inner.results.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.results.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-run the query by hand. Normally unnecessary.
    pub fn refresh(&self) {
        self.inner.refresh();
    }

    /// The observer runs after every re-evaluation.
    pub fn subscribe(&self, observer: impl Fn() + 'static) -> ListenerKey {
        ListenerKey(self.inner.observers.borrow_mut().insert(Rc::new(observer)))
    }

    pub fn unsubscribe(&self, key: ListenerKey) {
        self.inner.observers.borrow_mut().remove(key.0);
    }
}

impl<R> Drop for LiveQuery<R> {
    fn drop(&mut self) {
        for unsubscribe in self.unsubscribers.drain(..) {
            unsubscribe();
        }
    }
}

/// Sort descending by `key`, e.g. newest first.
pub fn order_by_desc<R, K: Ord>(mut rows: Vec<R>, key: impl Fn(&R) -> K) -> Vec<R> {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

/// Rows from `left` that have a match in `right`. Left rows without a join key never match.
pub fn inner_join<'a, L, R, K>(
    left: impl IntoIterator<Item = &'a L>,
    right: impl IntoIterator<Item = &'a R>,
    left_key: impl Fn(&L) -> Option<K>,
    right_key: impl Fn(&R) -> K,
) -> Vec<(L, R)>
where
    L: Clone + 'a,
    R: Clone + 'a,
    K: Eq + Hash,
{
    let index = index_by(right, right_key);
    left.into_iter()
        .filter_map(|l| {
            let r = left_key(l).and_then(|k| index.get(&k).copied())?;
            Some((l.clone(), r.clone()))
        })
        .collect()
}

/// Every row from `left`, paired with its match in `right` if there is one.
pub fn left_join<'a, L, R, K>(
    left: impl IntoIterator<Item = &'a L>,
    right: impl IntoIterator<Item = &'a R>,
    left_key: impl Fn(&L) -> Option<K>,
    right_key: impl Fn(&R) -> K,
) -> Vec<(L, Option<R>)>
where
    L: Clone + 'a,
    R: Clone + 'a,
    K: Eq + Hash,
{
    let index = index_by(right, right_key);
    left.into_iter()
        .map(|l| {
            let r = left_key(l).and_then(|k| index.get(&k).copied()).cloned();
            (l.clone(), r)
        })
        .collect()
}

fn index_by<'a, R: 'a, K: Eq + Hash>(
    rows: impl IntoIterator<Item = &'a R>,
    key: impl Fn(&R) -> K,
) -> HashMap<K, &'a R> {
    rows.into_iter().map(|row| (key(row), row)).collect()
}
