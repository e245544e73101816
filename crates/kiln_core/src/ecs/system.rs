//! # Systems
//!
//! A system is the per-component-type logic a pool runs every frame. The
//! pool owns the slot machinery; the system only supplies `process` and,
//! optionally, the lifecycle hooks.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use super::component::Component;
use super::entity::{Entity, EntityId};
use super::storage::SlotId;
use super::wiring::Wiring;

/// Read-only view of the current update, handed to every hook.
pub struct Frame<'a> {
    delta_time: f32,
    number: u64,
    entities: &'a BTreeMap<EntityId, Entity>,
}

impl<'a> Frame<'a> {
    pub(crate) fn new(delta_time: f32, number: u64, entities: &'a BTreeMap<EntityId, Entity>) -> Self {
        Self {
            delta_time,
            number,
            entities,
        }
    }

    /// Seconds elapsed since the previous update.
    #[inline]
    #[must_use]
    pub const fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Zero-based index of this update.
    #[inline]
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }

    /// Looks up a registered entity.
    #[inline]
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&'a Entity> {
        self.entities.get(&id)
    }
}

impl fmt::Debug for Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("delta_time", &self.delta_time)
            .field("number", &self.number)
            .field("entities", &self.entities.len())
            .finish()
    }
}

/// Per-component-type logic run by a [`ComponentPool`](super::ComponentPool).
///
/// Hook order within one update:
/// `on_pre_update`, then `process` once per occupied slot in ascending slot
/// order, then `on_post_update`. `on_remove` runs once per successful release,
/// before the slot is cleared.
///
/// # Example
///
/// ```rust,ignore
/// struct Movement {
///     positions: Sibling<Position>,
/// }
///
/// impl System<Velocity> for Movement {
///     fn wire(&mut self, wiring: &mut Wiring<'_>) {
///         wiring.bind(&mut self.positions);
///     }
///
///     fn process(&mut self, frame: &Frame<'_>, owner: &Entity, velocity: &mut Velocity) {
///         let Ok(slot) = owner.component::<Position>() else { return };
///         let _ = self.positions.write(|positions| {
///             if let Some(position) = positions.get_mut(slot) {
///                 position.x += velocity.x * frame.delta_time();
///             }
///         });
///     }
/// }
/// ```
pub trait System<C: Component>: 'static {
    /// Processes one live component.
    fn process(&mut self, frame: &Frame<'_>, owner: &Entity, component: &mut C);

    /// Runs before any component is processed.
    fn on_pre_update(&mut self, _frame: &Frame<'_>) {}

    /// Runs after every component has been processed.
    fn on_post_update(&mut self, _frame: &Frame<'_>) {}

    /// Runs when a slot is released, while it still holds its value.
    fn on_remove(&mut self, _slot: SlotId, _owner: EntityId, _component: &C) {}

    /// Declares and binds sibling pools. Called once, by `World::init`.
    fn wire(&mut self, _wiring: &mut Wiring<'_>) {}
}

/// Adapts a closure into a hook-less [`System`].
pub struct FnSystem<C, F> {
    f: F,
    _phantom: PhantomData<fn(&mut C)>,
}

/// Wraps `f` as a system with no hooks and no siblings.
///
/// ```rust,ignore
/// let gravity = system_fn(|frame: &Frame<'_>, _owner: &Entity, velocity: &mut Velocity| {
///     velocity.y -= 9.81 * frame.delta_time();
/// });
/// ```
pub fn system_fn<C, F>(f: F) -> FnSystem<C, F>
where
    C: Component,
    F: FnMut(&Frame<'_>, &Entity, &mut C) + 'static,
{
    FnSystem {
        f,
        _phantom: PhantomData,
    }
}

impl<C, F> System<C> for FnSystem<C, F>
where
    C: Component,
    F: FnMut(&Frame<'_>, &Entity, &mut C) + 'static,
{
    fn process(&mut self, frame: &Frame<'_>, owner: &Entity, component: &mut C) {
        (self.f)(frame, owner, component);
    }
}

/// A system that leaves every component untouched.
///
/// Useful for pure data pools that other systems reach through a
/// [`Sibling`](super::Sibling).
#[derive(Clone, Copy, Debug, Default)]
pub struct Passive;

impl<C: Component> System<C> for Passive {
    fn process(&mut self, _frame: &Frame<'_>, _owner: &Entity, _component: &mut C) {}
}
