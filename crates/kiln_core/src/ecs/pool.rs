//! # Component Pools
//!
//! A pool pairs fixed-capacity [`SlotStorage`] with the [`System`] that
//! processes it. It is the unit of both storage and per-frame work.

use tracing::warn;

use super::component::Component;
use super::entity::{Entity, EntityId};
use super::storage::{SlotId, SlotStorage};
use super::system::{Frame, System};
use super::wiring::Wiring;
use crate::config::PoolConfig;
use crate::error::{EcsError, EcsResult};

/// Fixed-capacity storage for one component type plus its processing logic.
///
/// # Iteration order
///
/// `iterate` visits occupied slots in ascending slot id. The pool is
/// exclusively borrowed for the whole update, so `process` cannot reserve
/// or release components of the pool it is running in.
///
/// # One-tick pools
///
/// A one-tick pool releases every occupied slot right after its update
/// completes. Components reserved into it live for exactly one update.
pub struct ComponentPool<C: Component> {
    storage: SlotStorage<C>,
    system: Box<dyn System<C>>,
    one_tick: bool,
}

impl<C: Component> ComponentPool<C> {
    /// Creates a pool with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize, system: impl System<C>) -> Self {
        Self {
            storage: SlotStorage::new(capacity),
            system: Box::new(system),
            one_tick: false,
        }
    }

    /// Creates a one-tick pool: every component is released after the
    /// update it was first processed in.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn one_tick(capacity: usize, system: impl System<C>) -> Self {
        Self {
            one_tick: true,
            ..Self::new(capacity, system)
        }
    }

    /// Creates a pool from configuration.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if the configured capacity is zero.
    pub fn from_config(config: &PoolConfig, system: impl System<C>) -> EcsResult<Self> {
        if config.capacity == 0 {
            return Err(EcsError::InvalidConfig(format!(
                "pool for {} must have a capacity greater than zero",
                C::NAME
            )));
        }
        Ok(Self {
            one_tick: config.one_tick,
            ..Self::new(config.capacity, system)
        })
    }

    /// Returns the fixed capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Returns the number of live components.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.storage.len()
    }

    /// Checks whether the pool holds no live component.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Whether the pool wipes itself after every update.
    #[inline]
    #[must_use]
    pub const fn is_one_tick(&self) -> bool {
        self.one_tick
    }

    /// Read access to the underlying slots.
    #[inline]
    #[must_use]
    pub const fn storage(&self) -> &SlotStorage<C> {
        &self.storage
    }

    pub(crate) fn storage_mut(&mut self) -> &mut SlotStorage<C> {
        &mut self.storage
    }

    /// Stores `value` in the lowest free slot, owned by `owner`.
    ///
    /// # Errors
    ///
    /// [`EcsError::PoolExhausted`] if every slot is occupied.
    pub fn reserve(&mut self, owner: EntityId, value: C) -> EcsResult<SlotId> {
        self.storage.reserve(owner, value)
    }

    /// Releases an occupied slot. `on_remove` runs first, while the slot
    /// still holds its owner and value.
    ///
    /// # Errors
    ///
    /// [`EcsError::DoubleRelease`] if the slot is not occupied.
    pub fn release(&mut self, slot: SlotId) -> EcsResult<()> {
        let Some(owner) = self.storage.owner_of(slot) else {
            return Err(EcsError::DoubleRelease {
                component: C::NAME,
                slot,
            });
        };
        if let Some(component) = self.storage.get(slot) {
            self.system.on_remove(slot, owner, component);
        }
        self.storage.vacate(slot).map(|_| ())
    }

    /// Overwrites the value in an occupied slot.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnoccupiedSlot`] if the slot is not occupied.
    #[inline]
    pub fn update(&mut self, slot: SlotId, value: C) -> EcsResult<()> {
        self.storage.update(slot, value)
    }

    /// Returns a copy of the value in an occupied slot.
    #[inline]
    #[must_use]
    pub fn try_get(&self, slot: SlotId) -> Option<C> {
        self.storage.try_get(slot)
    }

    /// Live components as `(owner, slot, value)`, ascending slot order.
    pub fn components(&self) -> impl Iterator<Item = (EntityId, SlotId, C)> + '_ {
        self.storage
            .iter()
            .map(|(owner, slot, value)| (owner, slot, *value))
    }

    /// Full-capacity snapshot, `None` for free slots.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Option<(EntityId, C)>> {
        self.storage.snapshot()
    }

    /// Runs one update: `on_pre_update`, `process` for every occupied slot,
    /// `on_post_update`, then the one-tick wipe if enabled.
    ///
    /// Returns the `(owner, slot)` pairs released by the one-tick wipe.
    /// A slot whose owner is missing from the frame is still processed,
    /// against a detached entity with no slots.
    pub(crate) fn iterate(&mut self, frame: &Frame<'_>) -> Vec<(EntityId, SlotId)> {
        self.system.on_pre_update(frame);

        let mut detached = 0usize;
        for slot in 0..self.storage.capacity() {
            if !self.storage.is_occupied(slot) {
                continue;
            }
            let (owner_id, component) = self.storage.entry_mut(slot);
            match frame.entity(owner_id) {
                Some(owner) => self.system.process(frame, owner, component),
                None => {
                    detached += 1;
                    let owner = Entity::new(owner_id, std::iter::empty());
                    self.system.process(frame, &owner, component);
                }
            }
        }
        if detached > 0 {
            warn!(
                component = C::NAME,
                detached, "processed components whose owner is not a registered entity"
            );
        }

        self.system.on_post_update(frame);

        if self.one_tick {
            self.wipe()
        } else {
            Vec::new()
        }
    }

    pub(crate) fn wire(&mut self, wiring: &mut Wiring<'_>) {
        self.system.wire(wiring);
    }

    /// Releases every occupied slot, `on_remove` included.
    fn wipe(&mut self) -> Vec<(EntityId, SlotId)> {
        let mut released = Vec::with_capacity(self.storage.len());
        for slot in self.storage.occupied_slots() {
            if let Some(owner) = self.storage.owner_of(slot) {
                if self.release(slot).is_ok() {
                    released.push((owner, slot));
                }
            }
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::entity::Entity;
    use crate::ecs::system::system_fn;
    use bytemuck::Zeroable;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable)]
    struct Position {
        x: f32,
        y: f32,
    }

    impl Component for Position {
        const NAME: &'static str = "Position";
    }

    fn pos(x: f32, y: f32) -> Position {
        Position { x, y }
    }

    fn registry(ids: &[u32]) -> BTreeMap<EntityId, Entity> {
        ids.iter()
            .map(|&raw| {
                let id = EntityId::new(raw);
                (id, Entity::new(id, std::iter::empty()))
            })
            .collect()
    }

    #[derive(Default)]
    struct Recorder {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl System<Position> for Recorder {
        fn process(&mut self, _frame: &Frame<'_>, owner: &Entity, component: &mut Position) {
            self.log
                .borrow_mut()
                .push(format!("process {} {}", owner.id(), component.x));
            component.x += 1.0;
        }

        fn on_pre_update(&mut self, frame: &Frame<'_>) {
            self.log.borrow_mut().push(format!("pre {}", frame.number()));
        }

        fn on_post_update(&mut self, frame: &Frame<'_>) {
            self.log.borrow_mut().push(format!("post {}", frame.number()));
        }

        fn on_remove(&mut self, slot: SlotId, owner: EntityId, component: &Position) {
            self.log
                .borrow_mut()
                .push(format!("remove {slot} {owner} {}", component.x));
        }
    }

    #[test]
    fn test_capacity_two_scenario() {
        let mut pool = ComponentPool::new(2, Recorder::default());

        assert_eq!(pool.reserve(EntityId::new(1), pos(0.0, 0.0)), Ok(0));
        assert_eq!(pool.reserve(EntityId::new(2), pos(5.0, 5.0)), Ok(1));
        assert_eq!(
            pool.reserve(EntityId::new(3), pos(1.0, 1.0)),
            Err(EcsError::PoolExhausted {
                component: "Position",
                capacity: 2
            })
        );

        pool.release(0).unwrap();
        assert_eq!(pool.reserve(EntityId::new(4), pos(9.0, 9.0)), Ok(0));
        assert_eq!(pool.try_get(0), Some(pos(9.0, 9.0)));
        assert_eq!(pool.storage().owner_of(0), Some(EntityId::new(4)));
    }

    #[test]
    fn test_exhaustion_at_every_capacity() {
        for capacity in 1..=8 {
            let mut pool = ComponentPool::new(capacity, Recorder::default());
            for i in 0..capacity {
                assert_eq!(pool.reserve(EntityId::new(1), pos(0.0, 0.0)), Ok(i));
            }
            assert!(matches!(
                pool.reserve(EntityId::new(1), pos(0.0, 0.0)),
                Err(EcsError::PoolExhausted { capacity: c, .. }) if c == capacity
            ));
        }
    }

    #[test]
    fn test_release_runs_on_remove_once_before_clearing() {
        let recorder = Recorder::default();
        let log = Rc::clone(&recorder.log);
        let mut pool = ComponentPool::new(2, recorder);

        let slot = pool.reserve(EntityId::new(7), pos(3.0, 0.0)).unwrap();
        pool.release(slot).unwrap();
        assert_eq!(
            pool.release(slot),
            Err(EcsError::DoubleRelease {
                component: "Position",
                slot
            })
        );

        assert_eq!(*log.borrow(), vec!["remove 0 7 3".to_string()]);
        assert_eq!(pool.try_get(slot), None);
    }

    #[test]
    fn test_release_never_reserved_slot_fails() {
        let mut pool = ComponentPool::new(4, Recorder::default());
        assert!(matches!(pool.release(3), Err(EcsError::DoubleRelease { slot: 3, .. })));
        assert!(matches!(pool.release(40), Err(EcsError::DoubleRelease { slot: 40, .. })));
    }

    #[test]
    fn test_reuse_does_not_leak_stale_value() {
        let mut pool = ComponentPool::new(1, Recorder::default());
        let slot = pool.reserve(EntityId::new(1), pos(42.0, 42.0)).unwrap();
        pool.release(slot).unwrap();

        assert_eq!(pool.snapshot(), vec![None]);
        let again = pool.reserve(EntityId::new(2), Position::default()).unwrap();
        assert_eq!(again, slot);
        assert_eq!(pool.try_get(again), Some(Position::default()));
    }

    #[test]
    fn test_iterate_hook_order_and_write_back() {
        let recorder = Recorder::default();
        let log = Rc::clone(&recorder.log);
        let mut pool = ComponentPool::new(4, recorder);
        let entities = registry(&[1, 2]);

        pool.reserve(EntityId::new(1), pos(10.0, 0.0)).unwrap();
        pool.reserve(EntityId::new(2), pos(20.0, 0.0)).unwrap();
        pool.reserve(EntityId::new(1), pos(30.0, 0.0)).unwrap();
        pool.release(1).unwrap();
        log.borrow_mut().clear();

        let released = pool.iterate(&Frame::new(0.5, 3, &entities));
        assert!(released.is_empty());
        assert_eq!(
            *log.borrow(),
            vec!["pre 3", "process 1 10", "process 1 30", "post 3"]
        );
        assert_eq!(pool.try_get(0), Some(pos(11.0, 0.0)));
        assert_eq!(pool.try_get(2), Some(pos(31.0, 0.0)));
    }

    #[test]
    fn test_process_called_once_per_occupied_slot() {
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let mut pool = ComponentPool::new(
            8,
            system_fn(move |_: &Frame<'_>, _: &Entity, _: &mut Position| {
                *counter.borrow_mut() += 1;
            }),
        );
        let entities = registry(&[1]);
        for _ in 0..5 {
            pool.reserve(EntityId::new(1), Position::default()).unwrap();
        }
        pool.release(2).unwrap();

        pool.iterate(&Frame::new(0.016, 0, &entities));
        assert_eq!(*calls.borrow(), 4);
    }

    #[test]
    fn test_one_tick_pool_wipes_after_update() {
        let recorder = Recorder::default();
        let log = Rc::clone(&recorder.log);
        let mut pool = ComponentPool::one_tick(4, recorder);
        let entities = registry(&[5]);

        pool.reserve(EntityId::new(5), pos(1.0, 0.0)).unwrap();
        let released = pool.iterate(&Frame::new(0.016, 0, &entities));
        assert_eq!(released, vec![(EntityId::new(5), 0)]);
        assert!(pool.is_empty());

        log.borrow_mut().clear();
        let released = pool.iterate(&Frame::new(0.016, 1, &entities));
        assert!(released.is_empty());
        assert_eq!(*log.borrow(), vec!["pre 1", "post 1"]);
    }

    #[test]
    fn test_unregistered_owner_is_still_processed() {
        let recorder = Recorder::default();
        let log = Rc::clone(&recorder.log);
        let mut pool = ComponentPool::one_tick(2, recorder);
        let entities = registry(&[1]);

        pool.reserve(EntityId::new(42), pos(0.0, 0.0)).unwrap();
        let released = pool.iterate(&Frame::new(0.016, 0, &entities));

        assert_eq!(
            *log.borrow(),
            vec!["pre 0", "process 42 0", "post 0", "remove 0 42 1"]
        );
        assert_eq!(released, vec![(EntityId::new(42), 0)]);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_from_config_rejects_zero_capacity() {
        let config = PoolConfig {
            capacity: 0,
            one_tick: false,
        };
        assert!(matches!(
            ComponentPool::<Position>::from_config(&config, Recorder::default()),
            Err(EcsError::InvalidConfig(_))
        ));

        let config = PoolConfig {
            capacity: 3,
            one_tick: true,
        };
        let pool = ComponentPool::<Position>::from_config(&config, Recorder::default()).unwrap();
        assert_eq!(pool.capacity(), 3);
        assert!(pool.is_one_tick());
    }
}
