//! Type-keyed storage shared by all passes of a graph.
//!
//! Passes often need the same per-frame data, like camera matrices or the id of a texture produced by an earlier pass.
//! Instead of threading it through every pass, store it on the blackboard once and look it up by type.
//!
//! # Example
//! ```
//! # use framegraph::prelude::*;
//! #[derive(Default)]
//! struct FrameConstants {
//!     frame: u64,
//! }
//!
//! let mut blackboard = Blackboard::new();
//! blackboard.insert(FrameConstants { frame: 7 });
//! assert_eq!(blackboard.get::<FrameConstants>().map(|c| c.frame), Some(7));
//! blackboard.get_or_default::<FrameConstants>().frame += 1;
//! assert_eq!(blackboard.get::<FrameConstants>().map(|c| c.frame), Some(8));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Map holding at most one value of every type.
#[derive(Debug, Default)]
pub struct Blackboard {
    entries: HashMap<TypeId, Box<dyn Any>>,
}

impl Blackboard {
    /// Create an empty blackboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, returning the previous value of the same type if there was one.
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.entries
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.entries.get(&TypeId::of::<T>()).and_then(|value| value.downcast_ref::<T>())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    /// Get the value of type `T`, inserting `T::default()` first if there is none.
    pub fn get_or_default<T: Default + 'static>(&mut self) -> &mut T {
        let entry = self
            .entries
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()) as Box<dyn Any>);
        match entry.downcast_mut::<T>() {
            Some(value) => value,
            None => unreachable!("blackboard entries are keyed by their own type id"),
        }
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.entries
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
