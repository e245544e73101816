//! # ECS World
//!
//! The central registry and dispatcher: owns every pool and every entity,
//! routes typed component calls to the owning pool, and drives the
//! per-frame update in registration order.

use std::any::Any;
use std::cell::Ref;
use std::collections::{BTreeMap, VecDeque};

use tracing::{debug, warn};

use super::builder::{EntityBuilder, EntityMut};
use super::component::{Component, ComponentTypeId};
use super::entity::{Entity, EntityId};
use super::pool::ComponentPool;
use super::registry::{borrow_pool, borrow_pool_mut, PoolRegistry};
use super::storage::SlotId;
use super::system::{Frame, System};
use super::wiring::{Wiring, WiringRecord};
use crate::config::WorldConfig;
use crate::error::{EcsError, EcsResult};

/// The ECS World - container for all pools and entities.
///
/// # Lifecycle
///
/// 1. Register one pool per component type
/// 2. `init()` wires sibling dependencies, once
/// 3. `update(dt)` as many times as needed
///
/// # Example
///
/// ```rust,ignore
/// let mut world = World::new();
/// world
///     .register_pool(ComponentPool::<Position>::new(1024, Passive))?
///     .register_pool(ComponentPool::<Velocity>::new(1024, Movement::default()))?;
/// world.init()?;
///
/// let player = world
///     .new_entity()
///     .with(Position::new(0.0, 0.0))?
///     .with(Velocity::new(1.0, 0.0))?
///     .create();
///
/// world.update(1.0 / 60.0)?;
/// ```
pub struct World {
    config: WorldConfig,
    pub(crate) pools: PoolRegistry,
    entities: BTreeMap<EntityId, Entity>,
    /// Next never-used entity id.
    next_id: u32,
    /// Ids returned by `remove_entity`, oldest first.
    free_ids: VecDeque<EntityId>,
    initialized: bool,
    /// Number of completed updates.
    frame: u64,
    wiring: Vec<WiringRecord>,
}

impl World {
    /// Creates an empty world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates an empty world with the given configuration.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            config,
            pools: PoolRegistry::default(),
            entities: BTreeMap::new(),
            next_id: 1,
            free_ids: VecDeque::new(),
            initialized: false,
            frame: 0,
            wiring: Vec::new(),
        }
    }

    /// The configuration this world was created with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    // =========================================================================
    // Pools
    // =========================================================================

    /// Registers the pool for component type `C`.
    ///
    /// Registration order is update order. Pools registered after
    /// [`init`](Self::init) are never wired. The pool must be empty: every
    /// live component has to belong to an entity of this world.
    ///
    /// # Errors
    ///
    /// [`EcsError::PoolNotEmpty`] if the pool holds live components,
    /// [`EcsError::DuplicatePool`] if `C` already has a pool.
    pub fn register_pool<C: Component>(&mut self, pool: ComponentPool<C>) -> EcsResult<&mut Self> {
        if !pool.is_empty() {
            return Err(EcsError::PoolNotEmpty {
                component: C::NAME,
                live: pool.len(),
            });
        }
        let capacity = pool.capacity();
        let one_tick = pool.is_one_tick();
        self.pools.insert(pool)?;

        if self.initialized {
            warn!(
                component = C::NAME,
                "pool registered after init; its siblings will not be wired"
            );
        }
        debug!(component = C::NAME, capacity, one_tick, "registered pool");
        Ok(self)
    }

    /// Registers a pool for `C` sized from the world configuration.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] for a zero capacity,
    /// [`EcsError::DuplicatePool`] if `C` already has a pool.
    pub fn register_system<C: Component>(&mut self, system: impl System<C>) -> EcsResult<&mut Self> {
        let config = self.config.pool_config(C::NAME);
        let pool = ComponentPool::from_config(&config, system)?;
        self.register_pool(pool)
    }

    /// Component types with a registered pool, in registration order.
    pub fn component_types(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.pools.types()
    }

    /// Number of registered pools.
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Checks whether `C` has a registered pool.
    #[must_use]
    pub fn has_pool<C: Component>(&self) -> bool {
        self.pools.contains(ComponentTypeId::of::<C>())
    }

    /// Read access to the pool for `C`.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnregisteredComponentType`] if `C` has no pool,
    /// [`EcsError::PoolBusy`] if the pool is borrowed.
    pub fn pool<C: Component>(&self) -> EcsResult<Ref<'_, ComponentPool<C>>> {
        borrow_pool(self.pools.require::<C>()?)
    }

    /// Every live component of type `C` as `(owner, slot, value)`.
    ///
    /// # Errors
    ///
    /// Same as [`pool`](Self::pool).
    pub fn components<C: Component>(&self) -> EcsResult<Vec<(EntityId, SlotId, C)>> {
        Ok(self.pool::<C>()?.components().collect())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Resolves every system's sibling dependencies. Runs exactly once.
    ///
    /// # Errors
    ///
    /// [`EcsError::AlreadyInitialized`] on a second call.
    pub fn init(&mut self) -> EcsResult<()> {
        if self.initialized {
            return Err(EcsError::AlreadyInitialized);
        }

        let mut records = Vec::new();
        for pool in self.pools.iter() {
            let mut wiring = Wiring::new(&self.pools, pool.component_type(), &mut records);
            pool.wire(&mut wiring)?;
        }

        let unbound = records.iter().filter(|r| !r.bound).count();
        debug!(
            pools = self.pools.len(),
            bindings = records.len(),
            unbound,
            "world initialized"
        );
        self.wiring = records;
        self.initialized = true;
        Ok(())
    }

    /// Whether [`init`](Self::init) has run.
    #[inline]
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Every injection point declared during [`init`](Self::init).
    #[must_use]
    pub fn wiring(&self) -> &[WiringRecord] {
        &self.wiring
    }

    /// Number of completed updates.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Runs every pool's update once, in registration order.
    ///
    /// Slots released by one-tick pools are removed from their owners'
    /// slot maps before the next pool runs.
    ///
    /// # Errors
    ///
    /// [`EcsError::NotInitialized`] before [`init`](Self::init).
    pub fn update(&mut self, delta_time: f32) -> EcsResult<()> {
        if !self.initialized {
            return Err(EcsError::NotInitialized);
        }

        for pool in self.pools.iter() {
            let frame = Frame::new(delta_time, self.frame, &self.entities);
            let released = pool.iterate(&frame)?;

            let ty = pool.component_type();
            for (owner, slot) in released {
                if let Some(entity) = self.entities.get_mut(&owner) {
                    entity.unregister_slot(ty, slot);
                }
            }
        }

        self.frame += 1;
        Ok(())
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Starts building a new entity. It becomes visible on
    /// [`EntityBuilder::create`].
    ///
    /// Once all `u32` ids are used up (and none are recycled) the builder
    /// carries [`EntityId::NULL`]: `with` fails with
    /// [`EcsError::EntityIdsExhausted`] and `create` registers nothing.
    pub fn new_entity(&mut self) -> EntityBuilder<'_> {
        let id = self.allocate_id();
        let entity = Entity::new(id, self.pools.types());
        EntityBuilder::new(self, entity)
    }

    /// Looks up a registered entity.
    #[must_use]
    pub fn get_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Ids of every registered entity, ascending.
    #[must_use]
    pub fn get_entities(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// Iterates over registered entities, ascending id.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Number of registered entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Mutable handle for attaching and detaching components.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<EntityMut<'_>> {
        self.entities
            .contains_key(&id)
            .then(|| EntityMut::new(self, id))
    }

    /// Releases every component the entity owns. The entity stays registered.
    /// Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownEntity`] for unregistered ids; otherwise the first
    /// release failure, after every other slot has been released.
    pub fn reset_entity(&mut self, id: EntityId) -> EcsResult<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(EcsError::UnknownEntity(id))?;
        Self::release_all(&self.pools, entity)
    }

    /// Unregisters the entity and releases every component it owns.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownEntity`] for unregistered ids; otherwise the first
    /// release failure, after every other slot has been released.
    pub fn remove_entity(&mut self, id: EntityId) -> EcsResult<()> {
        let mut entity = self
            .entities
            .remove(&id)
            .ok_or(EcsError::UnknownEntity(id))?;
        let released = entity.component_count();
        let result = Self::release_all(&self.pools, &mut entity);
        self.recycle_id(id);

        debug!(entity = %id, released, "removed entity");
        result
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Attaches `value` to the entity.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownEntity`], [`EcsError::UnregisteredComponentType`],
    /// [`EcsError::PoolExhausted`].
    pub fn add_component<C: Component>(&mut self, id: EntityId, value: C) -> EcsResult<SlotId> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(EcsError::UnknownEntity(id))?;
        Self::attach(&self.pools, entity, value)
    }

    /// Attaches `C::default()` to the entity.
    ///
    /// # Errors
    ///
    /// Same as [`add_component`](Self::add_component).
    pub fn add_default<C: Component>(&mut self, id: EntityId) -> EcsResult<SlotId> {
        self.add_component(id, C::default())
    }

    /// Attaches a boxed value whose type is only known at runtime.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeMismatch`] if `value` is not of type `component`, plus
    /// everything [`add_component`](Self::add_component) can return.
    pub fn add_component_dyn(
        &mut self,
        id: EntityId,
        component: ComponentTypeId,
        value: Box<dyn Any>,
    ) -> EcsResult<SlotId> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(EcsError::UnknownEntity(id))?;
        let pool = self
            .pools
            .erased(component)
            .ok_or(EcsError::UnregisteredComponentType {
                component: component.name(),
            })?;
        let slot = pool.reserve_dyn(id, value)?;
        entity.register_slot(component, slot);
        Ok(slot)
    }

    /// Detaches and releases one component slot.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnregisteredComponentType`], [`EcsError::DoubleRelease`]
    /// for a free slot, [`EcsError::SlotOwnedByOther`] for another entity's slot.
    pub fn remove_component<C: Component>(&mut self, id: EntityId, slot: SlotId) -> EcsResult<()> {
        self.remove_component_by_type_id(id, ComponentTypeId::of::<C>(), slot)
    }

    /// [`remove_component`](Self::remove_component) for callers that only
    /// know the component type at runtime.
    ///
    /// # Errors
    ///
    /// Same as [`remove_component`](Self::remove_component).
    pub fn remove_component_by_type_id(
        &mut self,
        id: EntityId,
        component: ComponentTypeId,
        slot: SlotId,
    ) -> EcsResult<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(EcsError::UnknownEntity(id))?;
        Self::detach(&self.pools, entity, component, slot)
    }

    /// First (earliest attached) slot of type `C` owned by the entity.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownEntity`], [`EcsError::NoSuchComponent`].
    pub fn get_component<C: Component>(&self, id: EntityId) -> EcsResult<SlotId> {
        self.entities
            .get(&id)
            .ok_or(EcsError::UnknownEntity(id))?
            .component::<C>()
    }

    /// Every slot of type `C` owned by the entity.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownEntity`].
    pub fn get_components<C: Component>(&self, id: EntityId) -> EcsResult<&[SlotId]> {
        Ok(self
            .entities
            .get(&id)
            .ok_or(EcsError::UnknownEntity(id))?
            .components::<C>())
    }

    /// Copy of the value in `slot`, `None` if the slot is free.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnregisteredComponentType`] if `C` has no pool.
    pub fn try_get_component<C: Component>(&self, slot: SlotId) -> EcsResult<Option<C>> {
        Ok(self.pool::<C>()?.try_get(slot))
    }

    /// Overwrites the value in `slot`. Returns `false` if `C` has no pool,
    /// the pool is busy, or the slot is free.
    pub fn try_update_component<C: Component>(&mut self, slot: SlotId, value: C) -> bool {
        self.update_component(slot, value).is_ok()
    }

    /// Overwrites the value in `slot`.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnregisteredComponentType`], [`EcsError::UnoccupiedSlot`].
    pub fn update_component<C: Component>(&mut self, slot: SlotId, value: C) -> EcsResult<()> {
        borrow_pool_mut(self.pools.require::<C>()?)?.update(slot, value)
    }

    // =========================================================================
    // Internals shared with the entity handles
    // =========================================================================

    pub(crate) fn attach<C: Component>(
        pools: &PoolRegistry,
        entity: &mut Entity,
        value: C,
    ) -> EcsResult<SlotId> {
        let pool = pools.require::<C>()?;
        let slot = borrow_pool_mut(pool)?.reserve(entity.id(), value)?;
        entity.register_slot(ComponentTypeId::of::<C>(), slot);
        Ok(slot)
    }

    pub(crate) fn detach(
        pools: &PoolRegistry,
        entity: &mut Entity,
        component: ComponentTypeId,
        slot: SlotId,
    ) -> EcsResult<()> {
        let pool = pools
            .erased(component)
            .ok_or(EcsError::UnregisteredComponentType {
                component: component.name(),
            })?;

        match pool.owner_of(slot)? {
            None => {
                return Err(EcsError::DoubleRelease {
                    component: component.name(),
                    slot,
                })
            }
            Some(owner) if owner != entity.id() => {
                return Err(EcsError::SlotOwnedByOther {
                    component: component.name(),
                    slot,
                    entity: entity.id(),
                    owner,
                })
            }
            Some(_) => {}
        }

        pool.release(slot)?;
        entity.unregister_slot(component, slot);
        Ok(())
    }

    /// Releases every slot the entity owns and clears its slot map.
    ///
    /// Keeps going past failures and reports the first one.
    pub(crate) fn release_all(pools: &PoolRegistry, entity: &mut Entity) -> EcsResult<()> {
        let mut first_error = None;
        for (component, slots) in entity.take_slots() {
            let Some(pool) = pools.erased(component) else {
                first_error = first_error.or(Some(EcsError::UnregisteredComponentType {
                    component: component.name(),
                }));
                continue;
            };
            for slot in slots {
                if let Err(err) = pool.release(slot) {
                    first_error = first_error.or(Some(err));
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub(crate) fn register_entity(&mut self, entity: Entity) -> EntityId {
        let id = entity.id();
        self.entities.insert(id, entity);
        id
    }

    pub(crate) fn recycle_id(&mut self, id: EntityId) {
        if self.config.recycle_entity_ids && !id.is_null() {
            self.free_ids.push_back(id);
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        if self.config.recycle_entity_ids {
            if let Some(id) = self.free_ids.pop_front() {
                return id;
            }
        }
        let Some(following) = self.next_id.checked_add(1) else {
            warn!("entity ids exhausted");
            return EntityId::NULL;
        };
        let id = EntityId::new(self.next_id);
        self.next_id = following;
        id
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
