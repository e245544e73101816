//! # Slot Storage
//!
//! Pre-allocated, fixed-capacity component slots.
//!
//! - All slots are allocated at creation; nothing grows afterwards
//! - Each slot carries the owning entity and the component value
//! - A reservation always takes the lowest free slot id

use std::collections::BTreeSet;

use super::component::Component;
use super::entity::EntityId;
use crate::error::{EcsError, EcsResult};

/// Index of a slot inside a pool. Stable for the lifetime of a reservation
/// and reused after release.
pub type SlotId = usize;

/// A single storage slot.
#[derive(Clone, Copy, Debug)]
struct Slot<C> {
    owner: EntityId,
    value: C,
}

impl<C: Component> Slot<C> {
    fn vacant() -> Self {
        Self {
            owner: EntityId::NULL,
            value: C::zeroed(),
        }
    }
}

/// Fixed-capacity storage for one component type.
///
/// This storage guarantees:
/// - Zero allocations after initialization
/// - O(1) access by slot id
/// - Free slots hold the zero value and [`EntityId::NULL`] as owner
///
/// # Example
///
/// ```rust,ignore
/// let pool = ComponentPool::<Position>::new(1024, Passive);
/// let storage: &SlotStorage<Position> = pool.storage();
/// assert_eq!(storage.len(), 0);
/// ```
pub struct SlotStorage<C: Component> {
    name: &'static str,
    /// The dense slot array.
    slots: Box<[Slot<C>]>,
    /// Occupancy flag per slot.
    occupied: Box<[bool]>,
    /// Free slot ids, ordered so the lowest is handed out first.
    free: BTreeSet<SlotId>,
    /// Number of occupied slots.
    len: usize,
}

impl<C: Component> SlotStorage<C> {
    /// Creates storage with the given capacity. All slots start free.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub(crate) fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");

        Self {
            name: C::NAME,
            slots: vec![Slot::vacant(); capacity].into_boxed_slice(),
            occupied: vec![false; capacity].into_boxed_slice(),
            free: (0..capacity).collect(),
            len: 0,
        }
    }

    /// Returns the fixed capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of occupied slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Checks whether no slot is occupied.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Checks whether every slot is occupied.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Checks whether `slot` currently holds a live component.
    #[inline]
    #[must_use]
    pub fn is_occupied(&self, slot: SlotId) -> bool {
        self.occupied.get(slot).copied().unwrap_or(false)
    }

    /// Returns the owner of an occupied slot.
    #[inline]
    #[must_use]
    pub fn owner_of(&self, slot: SlotId) -> Option<EntityId> {
        self.is_occupied(slot).then(|| self.slots[slot].owner)
    }

    /// Returns a reference to the component in an occupied slot.
    #[inline]
    #[must_use]
    pub fn get(&self, slot: SlotId) -> Option<&C> {
        self.is_occupied(slot).then(|| &self.slots[slot].value)
    }

    /// Returns a mutable reference to the component in an occupied slot.
    #[inline]
    pub fn get_mut(&mut self, slot: SlotId) -> Option<&mut C> {
        if self.is_occupied(slot) {
            Some(&mut self.slots[slot].value)
        } else {
            None
        }
    }

    /// Returns a copy of the component in an occupied slot.
    #[inline]
    #[must_use]
    pub fn try_get(&self, slot: SlotId) -> Option<C> {
        self.get(slot).copied()
    }

    /// Overwrites the component in an occupied slot, leaving the owner unchanged.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnoccupiedSlot`] if the slot is free or out of range.
    pub fn update(&mut self, slot: SlotId, value: C) -> EcsResult<()> {
        let component = self.name;
        let current = self
            .get_mut(slot)
            .ok_or(EcsError::UnoccupiedSlot { component, slot })?;
        *current = value;
        Ok(())
    }

    /// Iterates over live components in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, SlotId, &C)> {
        self.slots
            .iter()
            .zip(self.occupied.iter())
            .enumerate()
            .filter(|(_, (_, &occupied))| occupied)
            .map(|(slot, (entry, _))| (entry.owner, slot, &entry.value))
    }

    /// Full-capacity view: one entry per slot, `None` for free slots.
    ///
    /// Only for callers that need slot-index addressing; prefer [`iter`](Self::iter).
    #[must_use]
    pub fn snapshot(&self) -> Vec<Option<(EntityId, C)>> {
        self.slots
            .iter()
            .zip(self.occupied.iter())
            .map(|(entry, &occupied)| occupied.then_some((entry.owner, entry.value)))
            .collect()
    }

    /// Claims the lowest free slot.
    pub(crate) fn reserve(&mut self, owner: EntityId, value: C) -> EcsResult<SlotId> {
        let slot = self.free.pop_first().ok_or(EcsError::PoolExhausted {
            component: self.name,
            capacity: self.slots.len(),
        })?;

        self.slots[slot] = Slot { owner, value };
        self.occupied[slot] = true;
        self.len += 1;
        Ok(slot)
    }

    /// Frees an occupied slot, resetting it to the zero value.
    pub(crate) fn vacate(&mut self, slot: SlotId) -> EcsResult<(EntityId, C)> {
        if !self.is_occupied(slot) {
            return Err(EcsError::DoubleRelease {
                component: self.name,
                slot,
            });
        }

        let previous = std::mem::replace(&mut self.slots[slot], Slot::vacant());
        self.occupied[slot] = false;
        self.free.insert(slot);
        self.len -= 1;
        Ok((previous.owner, previous.value))
    }

    /// Occupied slot ids in ascending order.
    pub(crate) fn occupied_slots(&self) -> Vec<SlotId> {
        self.iter().map(|(_, slot, _)| slot).collect()
    }

    /// Raw slot access for the iteration loop; the caller checked occupancy.
    pub(crate) fn entry_mut(&mut self, slot: SlotId) -> (EntityId, &mut C) {
        let entry = &mut self.slots[slot];
        (entry.owner, &mut entry.value)
    }
}
