//! # Dependency Wiring
//!
//! A system that needs another component type's data declares a
//! [`Sibling`] field and binds it in [`System::wire`](super::System::wire).
//! `World::init` hands every system a [`Wiring`] exactly once; each bind
//! is a direct lookup in the type-to-pool map. A sibling whose pool is not
//! registered stays unbound, which is not an error.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use super::component::{Component, ComponentTypeId};
use super::pool::ComponentPool;
use super::registry::{borrow_pool, borrow_pool_mut, PoolRegistry};
use super::storage::SlotStorage;
use crate::error::EcsResult;

/// Injection point for another pool's component data.
///
/// Siblings give read and in-place write access to slots. They cannot
/// reserve or release, so entity bookkeeping always goes through the world.
/// The link is weak: pools are owned by the world alone, so systems that
/// wire each other never keep one another alive.
pub struct Sibling<C: Component> {
    pool: Weak<RefCell<ComponentPool<C>>>,
}

impl<C: Component> Sibling<C> {
    /// Creates an unbound injection point.
    #[must_use]
    pub const fn new() -> Self {
        Self { pool: Weak::new() }
    }

    /// Whether wiring found a pool for `C` and that pool is still alive.
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.pool.strong_count() > 0
    }

    /// Runs `f` over the sibling's slots.
    ///
    /// Returns `Ok(None)` when unbound.
    ///
    /// # Errors
    ///
    /// [`EcsError::PoolBusy`](crate::EcsError::PoolBusy) if the sibling is
    /// mutably borrowed, e.g. because it is the pool currently iterating.
    pub fn read<R>(&self, f: impl FnOnce(&SlotStorage<C>) -> R) -> EcsResult<Option<R>> {
        let Some(pool) = self.pool.upgrade() else {
            return Ok(None);
        };
        let guard = borrow_pool(&pool)?;
        Ok(Some(f(guard.storage())))
    }

    /// Runs `f` over the sibling's slots with in-place write access.
    ///
    /// Returns `Ok(None)` when unbound.
    ///
    /// # Errors
    ///
    /// [`EcsError::PoolBusy`](crate::EcsError::PoolBusy) if the sibling is
    /// borrowed anywhere else.
    pub fn write<R>(&self, f: impl FnOnce(&mut SlotStorage<C>) -> R) -> EcsResult<Option<R>> {
        let Some(pool) = self.pool.upgrade() else {
            return Ok(None);
        };
        let mut guard = borrow_pool_mut(&pool)?;
        Ok(Some(f(guard.storage_mut())))
    }
}

impl<C: Component> Default for Sibling<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Component> fmt::Debug for Sibling<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sibling")
            .field("component", &C::NAME)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// One declared injection point and whether it was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WiringRecord {
    /// The pool whose system declared the dependency.
    pub pool: ComponentTypeId,
    /// The sibling component type it asked for.
    pub dependency: ComponentTypeId,
    /// Whether a pool for `dependency` was found.
    pub bound: bool,
}

/// Resolver handed to [`System::wire`](super::System::wire).
pub struct Wiring<'a> {
    pools: &'a PoolRegistry,
    current: ComponentTypeId,
    records: &'a mut Vec<WiringRecord>,
}

impl<'a> Wiring<'a> {
    pub(crate) fn new(
        pools: &'a PoolRegistry,
        current: ComponentTypeId,
        records: &'a mut Vec<WiringRecord>,
    ) -> Self {
        Self {
            pools,
            current,
            records,
        }
    }

    /// Binds `sibling` to the registered pool for `C`, if any.
    ///
    /// Returns whether the sibling is now bound.
    pub fn bind<C: Component>(&mut self, sibling: &mut Sibling<C>) -> bool {
        let dependency = ComponentTypeId::of::<C>();
        sibling.pool = self
            .pools
            .typed::<C>()
            .map(Rc::downgrade)
            .unwrap_or_default();
        let bound = sibling.is_bound();

        debug!(
            pool = self.current.name(),
            dependency = dependency.name(),
            bound,
            "wired sibling pool"
        );
        self.records.push(WiringRecord {
            pool: self.current,
            dependency,
            bound,
        });
        bound
    }

    /// The component type of the pool being wired.
    #[must_use]
    pub const fn pool(&self) -> ComponentTypeId {
        self.current
    }
}
