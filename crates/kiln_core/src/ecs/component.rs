//! # Component Identity
//!
//! Components are pure data containers with no behavior.
//! They must be Copy and zeroable so a released slot can be wiped in place.

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use bytemuck::Zeroable;

/// Marker trait for ECS components.
///
/// Components must be:
/// - `Copy`: values are copied out of and back into their slot
/// - `Zeroable`: a released slot is reset to the all-zero value
/// - `Default`: the value attached when no explicit value is given
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Default, Zeroable)]
/// struct Position {
///     x: f32,
///     y: f32,
/// }
///
/// impl Component for Position {
///     const NAME: &'static str = "Position";
/// }
/// ```
pub trait Component: Copy + Default + Zeroable + 'static {
    /// Human-readable name, used in errors, logs and for config lookup.
    const NAME: &'static str;
}

/// Runtime identifier of a component type.
///
/// Only the `TypeId` takes part in comparisons; the name rides along for
/// diagnostics.
#[derive(Clone, Copy, Debug)]
pub struct ComponentTypeId {
    type_id: TypeId,
    name: &'static str,
}

impl ComponentTypeId {
    /// Returns the identifier of component type `C`.
    #[inline]
    #[must_use]
    pub fn of<C: Component>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: C::NAME,
        }
    }

    /// The component's declared name.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// The underlying Rust type id.
    #[inline]
    #[must_use]
    pub const fn type_id(self) -> TypeId {
        self.type_id
    }
}

impl PartialEq for ComponentTypeId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentTypeId {}

impl Hash for ComponentTypeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl PartialOrd for ComponentTypeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ComponentTypeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.type_id.cmp(&other.type_id)
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Default, Zeroable)]
    struct Health(u32);

    impl Component for Health {
        const NAME: &'static str = "Health";
    }

    #[derive(Clone, Copy, Default, Zeroable)]
    struct Armor(u32);

    impl Component for Armor {
        const NAME: &'static str = "Armor";
    }

    #[test]
    fn test_type_id_identity() {
        assert_eq!(ComponentTypeId::of::<Health>(), ComponentTypeId::of::<Health>());
        assert_ne!(ComponentTypeId::of::<Health>(), ComponentTypeId::of::<Armor>());
    }

    #[test]
    fn test_type_id_display_uses_name() {
        assert_eq!(ComponentTypeId::of::<Armor>().to_string(), "Armor");
        assert_eq!(ComponentTypeId::of::<Health>().name(), "Health");
    }
}
