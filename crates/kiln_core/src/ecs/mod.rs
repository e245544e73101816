//! # Entity Component System
//!
//! A pool-per-component ECS with fixed capacities.
//!
//! ## Design Philosophy
//!
//! - Every pool is sized once, at registration
//! - Components live in dense slot arrays, reused lowest-slot-first
//! - Entities are plain ids plus a map of the slots they own
//! - Each pool has exactly one system, run in registration order

mod builder;
mod component;
mod entity;
mod pool;
mod registry;
mod storage;
mod system;
mod wiring;
mod world;

pub use builder::{EntityBuilder, EntityMut};
pub use component::{Component, ComponentTypeId};
pub use entity::{Entity, EntityId};
pub use pool::ComponentPool;
pub use storage::{SlotId, SlotStorage};
pub use system::{system_fn, FnSystem, Frame, Passive, System};
pub use wiring::{Sibling, Wiring, WiringRecord};
pub use world::World;
