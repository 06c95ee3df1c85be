//! Fixed-capacity ID → object registry.
//!
//! One generic implementation backs every manager in the framework (topics,
//! services). Entries are owned by the registry: dropping it drops everything
//! still registered. Lookups are a linear scan, which is the right trade-off
//! for the handful of entries a firmware image declares.

use thiserror_no_std::Error;

/// Objects that can be resolved by ID.
pub trait Identified {
    /// ID type. Must be cheap to copy and compare.
    type Id: Copy + PartialEq;

    /// This object's ID.
    fn id(&self) -> Self::Id;
}

/// Registry failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// An object with the same ID is already registered.
    #[error("an object with this ID is already registered")]
    AlreadyRegistered,
    /// No object with the requested ID is registered.
    #[error("no object with this ID is registered")]
    NotFound,
    /// The registry is at capacity.
    #[error("registry is full")]
    Full,
    /// A registry slot was initialized twice.
    #[error("registry already initialized")]
    AlreadyInitialized,
    /// A registry slot was used before initialization.
    #[error("registry not initialized")]
    NotInitialized,
    /// A registry slot was accessed re-entrantly from inside its own scope.
    #[error("registry is busy")]
    Busy,
}

/// Registry of up to `N` objects keyed by [`Identified::id`].
pub struct Registry<T, const N: usize> {
    entries: heapless::Vec<T, N>,
}

impl<T: Identified, const N: usize> Registry<T, N> {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            entries: heapless::Vec::new(),
        }
    }

    /// Append `object`, returning a reference to the stored entry.
    pub fn add(&mut self, object: T) -> Result<&mut T, RegistryError> {
        if self.contains(object.id()) {
            return Err(RegistryError::AlreadyRegistered);
        }
        self.entries
            .push(object)
            .map_err(|_| RegistryError::Full)?;
        self.entries.last_mut().ok_or(RegistryError::Full)
    }

    /// Remove and return the entry with `id`.
    pub fn remove(&mut self, id: T::Id) -> Result<T, RegistryError> {
        let index = self.position(id).ok_or(RegistryError::NotFound)?;
        Ok(self.entries.remove(index))
    }

    /// Entry with `id`.
    pub fn find(&self, id: T::Id) -> Result<&T, RegistryError> {
        self.entries
            .iter()
            .find(|entry| entry.id() == id)
            .ok_or(RegistryError::NotFound)
    }

    /// Mutable entry with `id`.
    pub fn find_mut(&mut self, id: T::Id) -> Result<&mut T, RegistryError> {
        self.entries
            .iter_mut()
            .find(|entry| entry.id() == id)
            .ok_or(RegistryError::NotFound)
    }

    /// `true` if an entry with `id` is registered.
    pub fn contains(&self, id: T::Id) -> bool {
        self.position(id).is_some()
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    fn position(&self, id: T::Id) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id() == id)
    }
}

impl<T: Identified, const N: usize> Default for Registry<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
