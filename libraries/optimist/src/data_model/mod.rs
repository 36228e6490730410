#[path = "1-entity.rs"]
mod entity;

#[path = "2-mutation.rs"]
mod mutation;

#[path = "3-transaction.rs"]
mod transaction;

#[path = "4-dirty-tracker.rs"]
mod dirty_tracker;

#[path = "5-collection.rs"]
mod collection;

pub use collection::*;
pub use dirty_tracker::*;
pub use entity::*;
pub use mutation::*;
pub use transaction::*;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ListenerKey(pub(crate) slotmap::DefaultKey);
