//! # Pool Registry
//!
//! Type-erased pool storage keyed by component type, kept in registration
//! order. Typed callers downcast back to the concrete pool; teardown goes
//! through the erased interface when only a [`ComponentTypeId`] is known.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

use super::component::{Component, ComponentTypeId};
use super::entity::EntityId;
use super::pool::ComponentPool;
use super::storage::SlotId;
use super::system::Frame;
use super::wiring::Wiring;
use crate::error::{EcsError, EcsResult};

/// Shared handle to a registered pool.
pub(crate) type SharedPool<C> = Rc<RefCell<ComponentPool<C>>>;

pub(crate) fn borrow_pool<C: Component>(pool: &SharedPool<C>) -> EcsResult<Ref<'_, ComponentPool<C>>> {
    pool.try_borrow()
        .map_err(|_| EcsError::PoolBusy { component: C::NAME })
}

pub(crate) fn borrow_pool_mut<C: Component>(
    pool: &SharedPool<C>,
) -> EcsResult<RefMut<'_, ComponentPool<C>>> {
    pool.try_borrow_mut()
        .map_err(|_| EcsError::PoolBusy { component: C::NAME })
}

/// Operations the world needs without knowing the component type.
pub(crate) trait ErasedPool {
    fn component_type(&self) -> ComponentTypeId;

    fn iterate(&self, frame: &Frame<'_>) -> EcsResult<Vec<(EntityId, SlotId)>>;

    fn owner_of(&self, slot: SlotId) -> EcsResult<Option<EntityId>>;

    fn release(&self, slot: SlotId) -> EcsResult<()>;

    /// Boxed reservation path; the value's runtime type must match.
    fn reserve_dyn(&self, owner: EntityId, value: Box<dyn Any>) -> EcsResult<SlotId>;

    fn wire(&self, wiring: &mut Wiring<'_>) -> EcsResult<()>;

    fn as_any(&self) -> &dyn Any;
}

impl<C: Component> ErasedPool for SharedPool<C> {
    fn component_type(&self) -> ComponentTypeId {
        ComponentTypeId::of::<C>()
    }

    fn iterate(&self, frame: &Frame<'_>) -> EcsResult<Vec<(EntityId, SlotId)>> {
        Ok(borrow_pool_mut(self)?.iterate(frame))
    }

    fn owner_of(&self, slot: SlotId) -> EcsResult<Option<EntityId>> {
        Ok(borrow_pool(self)?.storage().owner_of(slot))
    }

    fn release(&self, slot: SlotId) -> EcsResult<()> {
        borrow_pool_mut(self)?.release(slot)
    }

    fn reserve_dyn(&self, owner: EntityId, value: Box<dyn Any>) -> EcsResult<SlotId> {
        let value = value
            .downcast::<C>()
            .map_err(|_| EcsError::TypeMismatch { expected: C::NAME })?;
        borrow_pool_mut(self)?.reserve(owner, *value)
    }

    fn wire(&self, wiring: &mut Wiring<'_>) -> EcsResult<()> {
        borrow_pool_mut(self)?.wire(wiring);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// All registered pools, in registration order.
#[derive(Default)]
pub(crate) struct PoolRegistry {
    pools: Vec<Box<dyn ErasedPool>>,
    index: HashMap<ComponentTypeId, usize>,
}

impl PoolRegistry {
    pub fn insert<C: Component>(&mut self, pool: ComponentPool<C>) -> EcsResult<()> {
        let ty = ComponentTypeId::of::<C>();
        if self.index.contains_key(&ty) {
            return Err(EcsError::DuplicatePool { component: C::NAME });
        }
        let shared: SharedPool<C> = Rc::new(RefCell::new(pool));
        self.index.insert(ty, self.pools.len());
        self.pools.push(Box::new(shared));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn contains(&self, ty: ComponentTypeId) -> bool {
        self.index.contains_key(&ty)
    }

    /// Component types in registration order.
    pub fn types(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.pools.iter().map(|pool| pool.component_type())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ErasedPool> {
        self.pools.iter().map(Box::as_ref)
    }

    pub fn erased(&self, ty: ComponentTypeId) -> Option<&dyn ErasedPool> {
        self.index.get(&ty).map(|&i| self.pools[i].as_ref())
    }

    pub fn typed<C: Component>(&self) -> Option<&SharedPool<C>> {
        self.erased(ComponentTypeId::of::<C>())?
            .as_any()
            .downcast_ref::<SharedPool<C>>()
    }

    /// Like [`typed`](Self::typed), failing for unregistered types.
    pub fn require<C: Component>(&self) -> EcsResult<&SharedPool<C>> {
        self.typed::<C>()
            .ok_or(EcsError::UnregisteredComponentType { component: C::NAME })
    }
}
