//! # ECS Error Types
//!
//! Every failure the engine can report. All of them are programmer or
//! configuration errors: nothing here is retried, and a failing call leaves
//! the pool and entity registry as they were.

use thiserror::Error;

use crate::ecs::{EntityId, SlotId};

/// Errors that can occur in the ECS runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Add/remove/query against a component type with no registered pool.
    #[error("unregistered component type: {component}")]
    UnregisteredComponentType {
        /// Name of the component type.
        component: &'static str,
    },

    /// Every slot in a fixed-capacity pool is occupied.
    #[error("pool for {component} exhausted: all {capacity} slots occupied, create the pool with a larger capacity")]
    PoolExhausted {
        /// Name of the component type.
        component: &'static str,
        /// Fixed capacity of the pool.
        capacity: usize,
    },

    /// Release called on a slot that is not currently occupied.
    #[error("slot {slot} of {component} already released")]
    DoubleRelease {
        /// Name of the component type.
        component: &'static str,
        /// The slot that was released twice (or never reserved).
        slot: SlotId,
    },

    /// Update/get called against a slot that is not currently occupied.
    #[error("slot {slot} of {component} is not occupied")]
    UnoccupiedSlot {
        /// Name of the component type.
        component: &'static str,
        /// The unoccupied slot.
        slot: SlotId,
    },

    /// Entity owns no component of the requested type.
    #[error("entity {entity} has no component of type {component}")]
    NoSuchComponent {
        /// The queried entity.
        entity: EntityId,
        /// Name of the component type.
        component: &'static str,
    },

    /// A boxed value does not match the pool's declared component type.
    #[error("component should be {expected}, but received a different type")]
    TypeMismatch {
        /// Name of the pool's component type.
        expected: &'static str,
    },

    /// A pool for this component type is already registered.
    #[error("a pool for {component} is already registered")]
    DuplicatePool {
        /// Name of the component type.
        component: &'static str,
    },

    /// A pool handed to the world already holds live components.
    #[error("pool for {component} must be empty when registered, found {live} live components")]
    PoolNotEmpty {
        /// Name of the component type.
        component: &'static str,
        /// Number of occupied slots.
        live: usize,
    },

    /// Every entity id has been handed out.
    #[error("entity ids exhausted")]
    EntityIdsExhausted,

    /// `init` was called on an already initialized world.
    #[error("world already initialized")]
    AlreadyInitialized,

    /// `update` was called before `init`.
    #[error("world not initialized, call init() before update()")]
    NotInitialized,

    /// The entity id is not registered with the world.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    /// The slot is occupied, but by a different entity.
    #[error("slot {slot} of {component} belongs to entity {owner}, not {entity}")]
    SlotOwnedByOther {
        /// Name of the component type.
        component: &'static str,
        /// The slot in question.
        slot: SlotId,
        /// The entity the caller claimed owns the slot.
        entity: EntityId,
        /// The entity that actually owns the slot.
        owner: EntityId,
    },

    /// The pool is borrowed elsewhere, typically because it is mid-iteration.
    #[error("pool for {component} is busy")]
    PoolBusy {
        /// Name of the component type.
        component: &'static str,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
