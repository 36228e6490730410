//! # DirtyTracker
//! A DirtyTracker wraps a collection's records and remembers whether they changed since listeners were last told.
//! Live queries use this to know when to re-evaluate. Several changes made in one go are coalesced into a single
//! notification, and the listener that caused a change can be left out of it.
//!
//! A new tracker starts Clean: an empty collection has nothing to announce. The first load from the server is
//! announced through [`DirtyTracker::mark_loaded`], which also flips [`DirtyTracker::loaded_at_least_once`].

use std::ops::{Deref, DerefMut};

use crate::data_model::ListenerKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirtyState {
    /// Not dirty, no pending notifications
    Clean,
    /// Dirty, notify all listeners except the specified one
    DirtyExcept(ListenerKey),
    /// Dirty, notify all listeners
    DirtyAll,
}

#[derive(Clone, Debug)]
pub struct DirtyTracker<State> {
    state: State,
    dirty_state: DirtyState,
    loaded_at_least_once: bool,
}

impl<State: Default> Default for DirtyTracker<State> {
    fn default() -> Self {
        Self {
            state: Default::default(),
            dirty_state: DirtyState::Clean,
            loaded_at_least_once: false,
        }
    }
}

/// Smart pointer that marks the state as dirty when dereferenced mutably
pub struct DirtyOnDerefMut<'a, State> {
    state: &'a mut State,
    dirty_state: &'a mut DirtyState,
    modifier: Option<ListenerKey>,
}

impl<State> Deref for DirtyOnDerefMut<'_, State> {
    type Target = State;

    fn deref(&self) -> &Self::Target {
        self.state
    }
}

impl<State> DerefMut for DirtyOnDerefMut<'_, State> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.mark_dirty();
        self.state
    }
}

impl<State> DirtyOnDerefMut<'_, State> {
    fn mark_dirty(&mut self) {
        use DirtyState::*;
        *self.dirty_state = match (*self.dirty_state, self.modifier) {
            (Clean, Some(key)) => DirtyExcept(key),
            (DirtyExcept(key1), Some(key2)) if key1 == key2 => DirtyExcept(key1),
            (Clean, None) => DirtyAll,
            (DirtyExcept(_), _) | (DirtyAll, _) => DirtyAll,
        };
    }
}

impl<State> DirtyTracker<State> {
    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn dirty_state(&self) -> DirtyState {
        self.dirty_state
    }

    pub(crate) fn state_mut(&mut self, modifier: Option<ListenerKey>) -> DirtyOnDerefMut<'_, State> {
        DirtyOnDerefMut {
            state: &mut self.state,
            dirty_state: &mut self.dirty_state,
            modifier,
        }
    }

    /// Returns true if the `loaded` marker was changed
    pub(crate) fn mark_loaded(&mut self, modifier: Option<ListenerKey>) -> bool {
        if self.loaded_at_least_once {
            return false;
        }
        self.loaded_at_least_once = true;
        self.state_mut(modifier).mark_dirty();
        true
    }

    pub fn loaded_at_least_once(&self) -> bool {
        self.loaded_at_least_once
    }

    /// Resets to clean. Returns `None` if nothing changed, otherwise the listener to skip (if any).
    pub(crate) fn take_dirty(&mut self) -> Option<Option<ListenerKey>> {
        let exclude = match self.dirty_state {
            DirtyState::Clean => return None,
            DirtyState::DirtyExcept(key) => Some(key),
            DirtyState::DirtyAll => None,
        };
        self.dirty_state = DirtyState::Clean;
        Some(exclude)
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;

    fn keys() -> (ListenerKey, ListenerKey) {
        let mut map = SlotMap::<slotmap::DefaultKey, ()>::new();
        (ListenerKey(map.insert(())), ListenerKey(map.insert(())))
    }

    #[test]
    fn test_reading_does_not_dirty() {
        let mut tracker: DirtyTracker<Vec<i32>> = DirtyTracker::default();
        let view = tracker.state_mut(None);
        assert!(view.is_empty());
        drop(view);
        assert_eq!(tracker.dirty_state(), DirtyState::Clean);
        assert_eq!(tracker.take_dirty(), None);
    }

    #[test]
    fn test_modifier_is_excluded() {
        let (a, b) = keys();
        let mut tracker: DirtyTracker<Vec<i32>> = DirtyTracker::default();

        tracker.state_mut(Some(a)).push(1);
        tracker.state_mut(Some(a)).push(2);
        assert_eq!(tracker.dirty_state(), DirtyState::DirtyExcept(a));

        tracker.state_mut(Some(b)).push(3);
        assert_eq!(tracker.dirty_state(), DirtyState::DirtyAll);

        assert_eq!(tracker.take_dirty(), Some(None));
        assert_eq!(tracker.take_dirty(), None);
        assert_eq!(tracker.state(), &vec![1, 2, 3]);
    }

    #[test]
    fn test_mark_loaded_once() {
        let mut tracker: DirtyTracker<Vec<i32>> = DirtyTracker::default();
        assert!(!tracker.loaded_at_least_once());
        assert!(tracker.mark_loaded(None));
        assert!(!tracker.mark_loaded(None));
        assert!(tracker.loaded_at_least_once());
        assert_eq!(tracker.take_dirty(), Some(None));
    }
}
