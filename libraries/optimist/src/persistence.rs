//! # Persistence
//! The bridge between a collection and whatever actually stores the records (usually a REST API).
//! A collection calls exactly one of these hooks per transaction, after any optimistic change has been applied.

use crate::data_model::{Entity, Mutation};
use crate::error::RemoteError;

#[allow(async_fn_in_trait)] // collections are single-threaded, nothing here needs to be `Send`
pub trait Persistence<T: Entity> {
    /// Returns the authoritative record, which may carry a different key than `mutation.key`.
    async fn on_insert(&self, mutation: &Mutation<T>) -> Result<T, RemoteError>;

    /// Returns the authoritative record after the update.
    async fn on_update(&self, mutation: &Mutation<T>) -> Result<T, RemoteError>;

    async fn on_delete(&self, mutation: &Mutation<T>) -> Result<(), RemoteError>;
}

/// Marker for collections that are only ever loaded from the server (e.g. reference data).
/// `Collection<T, ReadOnly>` has no mutation methods at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadOnly;
