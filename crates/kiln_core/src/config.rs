//! # World Configuration
//!
//! Pool sizing and entity id policy, loaded once at startup from TOML.
//!
//! ```toml
//! recycle_entity_ids = false
//! default_capacity = 256
//!
//! [pools.Position]
//! capacity = 4096
//!
//! [pools.Damage]
//! capacity = 512
//! one_tick = true
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{EcsError, EcsResult};

/// Default capacity for pools without an explicit entry.
pub const DEFAULT_POOL_CAPACITY: usize = 1024;

/// Sizing for a single pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of live components.
    pub capacity: usize,
    /// Release every component after each update.
    #[serde(default)]
    pub one_tick: bool,
}

/// Configuration for a [`World`](crate::World).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Reuse ids of removed entities (oldest freed first). When `false`,
    /// ids grow monotonically and are never handed out twice.
    pub recycle_entity_ids: bool,
    /// Capacity for pools without an entry in `pools`.
    pub default_capacity: usize,
    /// One-tick flag for pools without an entry in `pools`.
    pub default_one_tick: bool,
    /// Per-component overrides, keyed by `Component::NAME`.
    pub pools: BTreeMap<String, PoolConfig>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            recycle_entity_ids: false,
            default_capacity: DEFAULT_POOL_CAPACITY,
            default_one_tick: false,
            pools: BTreeMap::new(),
        }
    }
}

impl WorldConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] on malformed TOML or invalid values.
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| EcsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if the file cannot be read or is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| EcsError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Checks that every capacity is non-zero.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] naming the offending pool.
    pub fn validate(&self) -> EcsResult<()> {
        if self.default_capacity == 0 {
            return Err(EcsError::InvalidConfig(
                "default_capacity must be greater than zero".to_string(),
            ));
        }
        if let Some((name, _)) = self.pools.iter().find(|(_, pool)| pool.capacity == 0) {
            return Err(EcsError::InvalidConfig(format!(
                "pool {name} must have a capacity greater than zero"
            )));
        }
        Ok(())
    }

    /// Sizing for the named component, falling back to the defaults.
    #[must_use]
    pub fn pool_config(&self, name: &str) -> PoolConfig {
        self.pools.get(name).copied().unwrap_or(PoolConfig {
            capacity: self.default_capacity,
            one_tick: self.default_one_tick,
        })
    }
}
