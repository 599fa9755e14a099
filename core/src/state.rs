//! Keyed state cells and the registries that own them.
//!
//! # Design
//! A `StateCell` is a shared handle: cloning it clones the handle, and a
//! write through any clone is visible through all of them.
//!
//! `StateRegistry` keeps its cells in an `Arc<Vec<_>>` and never mutates
//! that vector in place. Every `add`, `upsert` and `remove` installs a fresh
//! vector, so a `snapshot()` taken earlier keeps describing the registry as
//! it was. The check-then-insert in `add` and `upsert` happens under one
//! write lock, so two callers racing on the same key cannot both insert.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

/// Generate a random, collision-resistant state key.
pub fn generate_key() -> String {
    Uuid::new_v4().simple().to_string()
}

/// A uniquely keyed, shared, mutable piece of state.
pub struct StateCell<T> {
    key: Arc<str>,
    value: Arc<RwLock<T>>,
}

impl<T> StateCell<T> {
    pub fn new(key: impl Into<String>, value: T) -> Self {
        Self {
            key: Arc::from(key.into()),
            value: Arc::new(RwLock::new(value)),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set(&self, value: T) {
        *self.value.write() = value;
    }

    /// Mutate the value in place and return whatever `f` returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.value.write())
    }

    /// Read the value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// True when both handles point at the same underlying cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl<T: Clone> StateCell<T> {
    pub fn get(&self) -> T {
        self.value.read().clone()
    }
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            key: Arc::clone(&self.key),
            value: Arc::clone(&self.value),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for StateCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCell")
            .field("key", &self.key)
            .field("value", &*self.value.read())
            .finish()
    }
}

/// Ordered collection of `StateCell`s with key-based add/get/upsert/remove.
pub struct StateRegistry<T> {
    cells: RwLock<Arc<Vec<StateCell<T>>>>,
}

impl<T> StateRegistry<T> {
    pub fn new() -> Self {
        Self {
            cells: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// The current backing sequence. Later mutations do not affect it.
    pub fn snapshot(&self) -> Arc<Vec<StateCell<T>>> {
        Arc::clone(&self.cells.read())
    }

    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.read().is_empty()
    }

    /// Keys in registry order.
    pub fn keys(&self) -> Vec<String> {
        self.cells.read().iter().map(|c| c.key().to_string()).collect()
    }

    pub fn get(&self, key: &str) -> Option<StateCell<T>> {
        find(&self.cells.read(), key)
    }

    /// Append a cell for `key` unless one already exists, in which case the
    /// existing cell is returned untouched and `value` is dropped.
    pub fn add(&self, key: impl Into<String>, value: T) -> StateCell<T> {
        let key = key.into();
        let mut cells = self.cells.write();
        if let Some(existing) = find(&cells, &key) {
            return existing;
        }

        let cell = StateCell::new(key, value);
        let mut next = Vec::with_capacity(cells.len() + 1);
        next.extend(cells.iter().cloned());
        next.push(cell.clone());
        *cells = Arc::new(next);
        cell
    }

    /// Replace the cell for `key` with a new cell holding `value`, or append
    /// one if the key is unknown. The replacement is a new handle: clones of
    /// the old cell no longer reach the registry.
    pub fn upsert(&self, key: impl Into<String>, value: T) -> StateCell<T> {
        let key = key.into();
        let mut cells = self.cells.write();

        let cell = StateCell::new(key, value);
        let mut next: Vec<StateCell<T>> = cells
            .iter()
            .filter(|c| c.key() != cell.key())
            .cloned()
            .collect();
        next.push(cell.clone());
        *cells = Arc::new(next);
        cell
    }

    /// Install `cell` itself under its key, replacing any other cell there.
    /// Unlike `upsert`, the registry then holds the caller's handle, so
    /// later writes through it stay visible via `get`.
    pub fn upsert_cell(&self, cell: StateCell<T>) -> StateCell<T> {
        let mut cells = self.cells.write();
        let mut next: Vec<StateCell<T>> = cells
            .iter()
            .filter(|c| c.key() != cell.key())
            .cloned()
            .collect();
        next.push(cell.clone());
        *cells = Arc::new(next);
        cell
    }

    pub fn remove(&self, key: &str) {
        let mut cells = self.cells.write();
        if !cells.iter().any(|c| c.key() == key) {
            return;
        }
        let next = cells.iter().filter(|c| c.key() != key).cloned().collect();
        *cells = Arc::new(next);
    }
}

impl<T> Default for StateRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for StateRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

fn find<T>(cells: &[StateCell<T>], key: &str) -> Option<StateCell<T>> {
    cells.iter().find(|c| c.key() == key).cloned()
}
