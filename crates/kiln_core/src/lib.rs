//! # Kiln Core
//!
//! Minimal Entity Component System runtime:
//! - One fixed-capacity pool per component type
//! - One system per pool, updated in registration order
//! - Entities as ids owning slots across pools
//! - Sibling pools wired into systems once, at init
//!
//! ## Example
//!
//! ```rust,ignore
//! use kiln_core::{ComponentPool, Passive, World};
//!
//! let mut world = World::new();
//! world.register_pool(ComponentPool::<Position>::new(4096, Passive))?;
//! world.init()?;
//!
//! let id = world.new_entity().with(Position::default())?.create();
//! world.update(1.0 / 60.0)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;

pub use config::{PoolConfig, WorldConfig, DEFAULT_POOL_CAPACITY};
pub use ecs::{
    system_fn, Component, ComponentPool, ComponentTypeId, Entity, EntityBuilder, EntityId,
    EntityMut, FnSystem, Frame, Passive, Sibling, SlotId, SlotStorage, System, Wiring,
    WiringRecord, World,
};
pub use error::{EcsError, EcsResult};
