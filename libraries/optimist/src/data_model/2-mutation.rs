//! # Mutation
//! A mutation describes one change to one record: what it looked like before (`original`) and what it should look
//! like after (`modified`). Inserts have no original, deletes have no modified.
//! Keeping both snapshots is what makes rollback possible: undoing a mutation just means putting `original` back.

use std::fmt;

use crate::data_model::{Entity, ListenerKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Insert => write!(f, "insert"),
            MutationKind::Update => write!(f, "update"),
            MutationKind::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MutationOptions {
    /// Apply the change locally before the server confirms it.
    pub optimistic: bool,

    /// The listener responsible for the change. It will not be notified about it.
    pub modifier: Option<ListenerKey>,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self::optimistic()
    }
}

impl MutationOptions {
    pub fn optimistic() -> Self {
        Self {
            optimistic: true,
            modifier: None,
        }
    }

    pub fn pessimistic() -> Self {
        Self {
            optimistic: false,
            modifier: None,
        }
    }

    pub fn by(self, modifier: ListenerKey) -> Self {
        Self {
            modifier: Some(modifier),
            ..self
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mutation<T> {
    pub kind: MutationKind,
    /// Key of the record as the collection knows it when the mutation starts.
    pub key: String,
    pub original: Option<T>,
    pub modified: Option<T>,
}

type Items<T> = im::HashMap<String, T>;

impl<T: Entity> Mutation<T> {
    pub fn insert(modified: T) -> Self {
        Self {
            kind: MutationKind::Insert,
            key: modified.key(),
            original: None,
            modified: Some(modified),
        }
    }

    pub fn update(original: T, modified: T) -> Self {
        Self {
            kind: MutationKind::Update,
            key: original.key(),
            original: Some(original),
            modified: Some(modified),
        }
    }

    pub fn delete(original: T) -> Self {
        Self {
            kind: MutationKind::Delete,
            key: original.key(),
            original: Some(original),
            modified: None,
        }
    }

    /// Make `items` look like the mutation already happened.
    pub(crate) fn apply_to(&self, items: &mut Items<T>) {
        match &self.modified {
            Some(modified) => {
                items.insert(self.key.clone(), modified.clone());
            }
            None => {
                items.remove(&self.key);
            }
        }
    }

    /// Make `items` look like the mutation never happened.
    pub(crate) fn revert(&self, items: &mut Items<T>) {
        match &self.original {
            Some(original) => {
                items.insert(self.key.clone(), original.clone());
            }
            None => {
                items.remove(&self.key);
            }
        }
    }

    /// Replace whatever is stored under `key` with the server's answer. Re-keys inserts.
    pub(crate) fn settle(&self, items: &mut Items<T>, confirmed: Option<&T>) {
        items.remove(&self.key);
        if let Some(confirmed) = confirmed {
            items.insert(confirmed.key(), confirmed.clone());
        }
    }

    /// True if `settle` would be a no-op, i.e. the optimistic guess matched the server.
    pub(crate) fn is_settled_in(&self, items: &Items<T>, confirmed: Option<&T>) -> bool {
        match confirmed {
            Some(confirmed) => {
                confirmed.key() == self.key && items.get(&self.key) == Some(confirmed)
            }
            None => !items.contains_key(&self.key),
        }
    }
}
