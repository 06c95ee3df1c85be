//! Process-wide registry slot.
//!
//! A `RegistrySlot` holds at most one registry and is usually a `static`
//! owned by the composition root (the contents must then be `Send`):
//!
//! ```
//! use embassy_sync::blocking_mutex::raw::NoopRawMutex;
//! use topic::{RegistrySlot, TopicId, TopicManager};
//!
//! let topics: RegistrySlot<NoopRawMutex, TopicManager<'_, u32>> = RegistrySlot::new();
//!
//! topics.init(TopicManager::new()).ok();
//! let created = topics.with(|topics| topics.create(TopicId(1)).map(|_| ()));
//! assert!(matches!(created, Ok(Ok(()))));
//! ```
//!
//! Initializing twice yields [`RegistryError::AlreadyInitialized`], access
//! before initialization yields [`RegistryError::NotInitialized`]. Neither
//! halts the system; the caller decides.
//!
//! # Choosing the mutex
//!
//! [`with`](RegistrySlot::with) runs the whole closure, typically a topic
//! fan-out including transmits, inside the slot's lock. With
//! `CriticalSectionRawMutex` that masks interrupts for as long, starving the
//! receive interrupt that feeds a link queue. Prefer `ThreadModeRawMutex`
//! for a `static` touched only from thread mode, or `NoopRawMutex` for a
//! slot owned by a single task.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::RawMutex, Mutex};

use crate::registry::RegistryError;

/// Holder for a single process-wide registry, locked with `M`.
pub struct RegistrySlot<M: RawMutex, T> {
    inner: Mutex<M, RefCell<Option<T>>>,
}

impl<M: RawMutex, T> RegistrySlot<M, T> {
    /// Create an empty slot.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Install `registry`.
    pub fn init(&self, registry: T) -> Result<(), RegistryError> {
        self.inner.lock(|cell| {
            let mut slot = cell.try_borrow_mut().map_err(|_| RegistryError::Busy)?;
            if slot.is_some() {
                warn!("registry slot initialized twice");
                return Err(RegistryError::AlreadyInitialized);
            }
            *slot = Some(registry);
            Ok(())
        })
    }

    /// Run `f` against the installed registry, holding the slot's lock for
    /// the duration.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, RegistryError> {
        self.inner.lock(|cell| {
            let mut slot = cell.try_borrow_mut().map_err(|_| RegistryError::Busy)?;
            slot.as_mut().map(f).ok_or(RegistryError::NotInitialized)
        })
    }

    /// `true` once [`init`](Self::init) has succeeded (and until teardown).
    pub fn is_initialized(&self) -> bool {
        self.inner
            .lock(|cell| cell.try_borrow().map(|slot| slot.is_some()).unwrap_or(true))
    }

    /// Take the registry out of the slot, allowing a fresh `init`.
    ///
    /// Dropping the returned registry drops every object it still holds.
    pub fn teardown(&self) -> Option<T> {
        self.inner
            .lock(|cell| cell.try_borrow_mut().ok().and_then(|mut slot| slot.take()))
    }
}

impl<M: RawMutex, T> Default for RegistrySlot<M, T> {
    fn default() -> Self {
        Self::new()
    }
}
