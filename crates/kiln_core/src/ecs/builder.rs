//! Entity handles: a builder for new entities and a mutable view of
//! registered ones.

use tracing::warn;

use super::component::{Component, ComponentTypeId};
use super::entity::{Entity, EntityId};
use super::storage::SlotId;
use super::world::World;
use crate::error::{EcsError, EcsResult};

/// Attaches components to an entity before it becomes visible.
///
/// Dropping the builder without calling [`create`](Self::create) releases
/// every slot it reserved.
#[must_use = "the entity is discarded unless `create` is called"]
pub struct EntityBuilder<'w> {
    world: &'w mut World,
    entity: Entity,
    created: bool,
}

impl<'w> EntityBuilder<'w> {
    pub(crate) fn new(world: &'w mut World, entity: Entity) -> Self {
        Self {
            world,
            entity,
            created: false,
        }
    }

    /// The id the entity will be registered under.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.entity.id()
    }

    /// Attaches `value`.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnregisteredComponentType`], [`EcsError::PoolExhausted`],
    /// [`EcsError::EntityIdsExhausted`]. The builder is dropped on error,
    /// releasing what it reserved.
    pub fn with<C: Component>(mut self, value: C) -> EcsResult<Self> {
        if self.entity.id().is_null() {
            return Err(EcsError::EntityIdsExhausted);
        }
        World::attach(&self.world.pools, &mut self.entity, value)?;
        Ok(self)
    }

    /// Attaches `C::default()`.
    ///
    /// # Errors
    ///
    /// Same as [`with`](Self::with).
    pub fn with_default<C: Component>(self) -> EcsResult<Self> {
        self.with(C::default())
    }

    /// Registers the entity with the world.
    ///
    /// Returns [`EntityId::NULL`] without registering anything when the
    /// world has run out of entity ids.
    pub fn create(mut self) -> EntityId {
        self.created = true;
        if self.entity.id().is_null() {
            return EntityId::NULL;
        }
        let placeholder = Entity::new(EntityId::NULL, std::iter::empty());
        let entity = std::mem::replace(&mut self.entity, placeholder);
        self.world.register_entity(entity)
    }
}

impl Drop for EntityBuilder<'_> {
    fn drop(&mut self) {
        if self.created {
            return;
        }
        let id = self.entity.id();
        if let Err(err) = World::release_all(&self.world.pools, &mut self.entity) {
            warn!(entity = %id, %err, "failed to release components of discarded entity");
        }
        self.world.recycle_id(id);
    }
}

/// Mutable view of a registered entity.
pub struct EntityMut<'w> {
    world: &'w mut World,
    id: EntityId,
}

impl<'w> EntityMut<'w> {
    pub(crate) fn new(world: &'w mut World, id: EntityId) -> Self {
        Self { world, id }
    }

    /// The entity's id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Read access to the entity's slot map.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownEntity`] if the entity was removed through another path.
    pub fn get(&self) -> EcsResult<&Entity> {
        self.world
            .get_entity(self.id)
            .ok_or(EcsError::UnknownEntity(self.id))
    }

    /// Attaches `value`. See [`World::add_component`].
    ///
    /// # Errors
    ///
    /// Same as [`World::add_component`].
    pub fn add_component<C: Component>(&mut self, value: C) -> EcsResult<SlotId> {
        self.world.add_component(self.id, value)
    }

    /// Attaches `C::default()`.
    ///
    /// # Errors
    ///
    /// Same as [`World::add_component`].
    pub fn add_default<C: Component>(&mut self) -> EcsResult<SlotId> {
        self.world.add_default::<C>(self.id)
    }

    /// Detaches and releases one slot. See [`World::remove_component`].
    ///
    /// # Errors
    ///
    /// Same as [`World::remove_component`].
    pub fn remove_component<C: Component>(&mut self, slot: SlotId) -> EcsResult<()> {
        self.world
            .remove_component_by_type_id(self.id, ComponentTypeId::of::<C>(), slot)
    }

    /// Releases every component the entity owns. Idempotent.
    ///
    /// # Errors
    ///
    /// Same as [`World::reset_entity`].
    pub fn reset(&mut self) -> EcsResult<()> {
        self.world.reset_entity(self.id)
    }

    /// Same as [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// Same as [`World::reset_entity`].
    pub fn remove_all_components(&mut self) -> EcsResult<()> {
        self.reset()
    }
}
