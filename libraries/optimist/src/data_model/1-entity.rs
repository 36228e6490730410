//! # Entity
//! Entities are the records a collection holds. Each one knows its own key, which must stay stable for as long as
//! the record lives in a collection. The only exception is the temporary key of a freshly inserted record, which the
//! collection swaps for the server-assigned key once the insert is confirmed.

pub trait Entity: Clone + PartialEq + std::fmt::Debug + 'static {
    fn key(&self) -> String;

    /// Checked before any mutation is attempted. Returning `Err` rejects the mutation with a validation error.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}
