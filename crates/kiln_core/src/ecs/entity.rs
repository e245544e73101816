//! # Entity Management
//!
//! Entities are numeric identifiers plus, per component type, the slot ids
//! they currently own in that type's pool. They hold no component data.

use std::collections::BTreeMap;
use std::fmt;

use super::component::{Component, ComponentTypeId};
use super::storage::SlotId;
use crate::error::{EcsError, EcsResult};

/// Unique identifier for an entity.
///
/// Live ids start at 1; `EntityId::NULL` (0) is the owner recorded in a
/// free slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Null/invalid entity ID.
    pub const NULL: Self = Self(0);

    /// Creates an entity ID from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An entity and the component slots it owns.
///
/// The slot map is kept in sync with the pools by every add/remove that
/// goes through the [`World`](super::World). Slots of one type are listed
/// in attach order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    id: EntityId,
    components: BTreeMap<ComponentTypeId, Vec<SlotId>>,
}

impl Entity {
    /// Creates an entity with an empty slot list for each known component type.
    pub(crate) fn new(id: EntityId, known_types: impl IntoIterator<Item = ComponentTypeId>) -> Self {
        Self {
            id,
            components: known_types.into_iter().map(|ty| (ty, Vec::new())).collect(),
        }
    }

    /// The entity's identifier.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the first (earliest attached) slot of type `C` owned by this entity.
    ///
    /// # Errors
    ///
    /// [`EcsError::NoSuchComponent`] if the entity owns no component of type `C`.
    pub fn component<C: Component>(&self) -> EcsResult<SlotId> {
        self.components::<C>()
            .first()
            .copied()
            .ok_or(EcsError::NoSuchComponent {
                entity: self.id,
                component: C::NAME,
            })
    }

    /// Returns every slot of type `C` owned by this entity.
    #[must_use]
    pub fn components<C: Component>(&self) -> &[SlotId] {
        self.slots_of(ComponentTypeId::of::<C>())
    }

    /// Returns every slot of the given component type owned by this entity.
    #[must_use]
    pub fn slots_of(&self, component: ComponentTypeId) -> &[SlotId] {
        self.components.get(&component).map_or(&[][..], Vec::as_slice)
    }

    /// Checks whether the entity owns at least one component of type `C`.
    #[must_use]
    pub fn has<C: Component>(&self) -> bool {
        !self.components::<C>().is_empty()
    }

    /// Total number of owned slots across all component types.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.values().map(Vec::len).sum()
    }

    /// Checks whether the entity owns no components at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.component_count() == 0
    }

    /// Iterates over `(component type, owned slots)` pairs with at least one slot.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentTypeId, &[SlotId])> {
        self.components
            .iter()
            .filter(|(_, slots)| !slots.is_empty())
            .map(|(ty, slots)| (*ty, slots.as_slice()))
    }

    pub(crate) fn register_slot(&mut self, component: ComponentTypeId, slot: SlotId) {
        self.components.entry(component).or_default().push(slot);
    }

    /// Returns `true` if the slot was listed.
    pub(crate) fn unregister_slot(&mut self, component: ComponentTypeId, slot: SlotId) -> bool {
        let Some(slots) = self.components.get_mut(&component) else {
            return false;
        };
        match slots.iter().position(|&s| s == slot) {
            Some(index) => {
                slots.remove(index);
                true
            }
            None => false,
        }
    }

    /// Empties the slot map, handing back what it held.
    pub(crate) fn take_slots(&mut self) -> Vec<(ComponentTypeId, Vec<SlotId>)> {
        std::mem::take(&mut self.components)
            .into_iter()
            .filter(|(_, slots)| !slots.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[derive(Clone, Copy, Default, Zeroable)]
    struct Tag(u8);

    impl Component for Tag {
        const NAME: &'static str = "Tag";
    }

    #[test]
    fn test_null_entity() {
        assert!(EntityId::NULL.is_null());
        assert!(EntityId::default().is_null());
        assert!(!EntityId::new(1).is_null());
    }

    #[test]
    fn test_first_component_in_attach_order() {
        let ty = ComponentTypeId::of::<Tag>();
        let mut entity = Entity::new(EntityId::new(3), [ty]);
        assert_eq!(
            entity.component::<Tag>(),
            Err(EcsError::NoSuchComponent {
                entity: EntityId::new(3),
                component: "Tag",
            })
        );

        entity.register_slot(ty, 5);
        entity.register_slot(ty, 2);
        assert_eq!(entity.component::<Tag>(), Ok(5));
        assert_eq!(entity.components::<Tag>(), &[5, 2]);

        assert!(entity.unregister_slot(ty, 5));
        assert!(!entity.unregister_slot(ty, 5));
        assert_eq!(entity.component::<Tag>(), Ok(2));
    }

    #[test]
    fn test_take_slots_empties_the_map() {
        let ty = ComponentTypeId::of::<Tag>();
        let mut entity = Entity::new(EntityId::new(1), [ty]);
        entity.register_slot(ty, 0);

        let taken = entity.take_slots();
        assert_eq!(taken, vec![(ty, vec![0])]);
        assert!(entity.is_empty());
        assert!(entity.take_slots().is_empty());
    }
}
