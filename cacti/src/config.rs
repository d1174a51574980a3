//! Build-time limits of an [ActorSystem](../api/struct.ActorSystem.html).
//!
//! The defaults match the constants the runtime was designed around.
//! A [SystemConfig](struct.SystemConfig.html) can be persisted with `bincode` so the same limits can be shared by several programs.

use crate::errors::CactiError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

/// Number of worker threads in a pool.
pub const POOL_SIZE: usize = 3;
/// Maximum number of pending messages per actor. Never below 1024.
pub const ACTOR_QUEUE_LIMIT: usize = 1024;
/// Maximum number of actors a single system creates over its lifetime.
pub const CAST_LIMIT: usize = 1_048_576;
/// Messages processed per visit of an actor before it yields its worker.
pub const BATCH_SIZE: usize = 1;
/// How often an idle worker looks for a pending interrupt.
pub const POLL_INTERVAL_MS: u64 = 50;

/// Limits and switches of an actor system, fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub pool_size: usize,
    pub mailbox_capacity: usize,
    pub actor_limit: usize,
    pub batch_size: usize,
    pub poll_interval_ms: u64,
    /// Install the SIGINT hook that drains the system on interrupt.
    pub handle_interrupt: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            pool_size: POOL_SIZE,
            mailbox_capacity: ACTOR_QUEUE_LIMIT,
            actor_limit: CAST_LIMIT,
            batch_size: BATCH_SIZE,
            poll_interval_ms: POLL_INTERVAL_MS,
            handle_interrupt: true,
        }
    }
}

impl SystemConfig {
    /// Check every limit, returning [InvalidConfig](../api/enum.CactiError.html#variant.InvalidConfig) for the first one out of range.
    pub fn validate(&self) -> Result<(), CactiError> {
        if self.pool_size == 0 {
            return Err(CactiError::InvalidConfig(
                "pool_size must be at least 1".to_string(),
            ));
        }
        if self.mailbox_capacity < ACTOR_QUEUE_LIMIT {
            return Err(CactiError::InvalidConfig(format!(
                "mailbox_capacity must be at least {}, got {}",
                ACTOR_QUEUE_LIMIT, self.mailbox_capacity
            )));
        }
        if self.actor_limit == 0 {
            return Err(CactiError::InvalidConfig(
                "actor_limit must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(CactiError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(CactiError::InvalidConfig(
                "poll_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Load a `bincode`-serialized config and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<SystemConfig, CactiError> {
        let mut file = File::open(path.as_ref()).map_err(|e| {
            CactiError::Config(format!("failed to open {}: {}", path.as_ref().display(), e))
        })?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| CactiError::Config(format!("failed to read config: {}", e)))?;
        let config = bincode::deserialize::<SystemConfig>(&contents)
            .map_err(|e| CactiError::Config(format!("deserialisation of config failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Like [load](#method.load), trying every candidate path in order and falling back to the defaults.
    pub fn load_first_or_default<P: AsRef<Path>>(candidates: &[P]) -> Result<SystemConfig, CactiError> {
        for candidate in candidates {
            if candidate.as_ref().exists() {
                return SystemConfig::load(candidate);
            }
        }
        Ok(SystemConfig::default())
    }

    /// Serialize this config with `bincode` into `path`.
    pub fn store<P: AsRef<Path>>(&self, path: P) -> Result<(), CactiError> {
        let serialized = bincode::serialize(self)
            .map_err(|e| CactiError::Config(format!("serialisation of config failed: {}", e)))?;
        let mut file = File::create(path.as_ref()).map_err(|e| {
            CactiError::Config(format!("failed to create {}: {}", path.as_ref().display(), e))
        })?;
        file.write_all(&serialized)
            .map_err(|e| CactiError::Config(format!("write failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SystemConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pool_size, 3);
        assert_eq!(config.mailbox_capacity, 1024);
        assert_eq!(config.actor_limit, 1_048_576);
        assert_eq!(config.batch_size, 1);
    }

    #[test]
    fn small_mailbox_is_rejected() {
        let config = SystemConfig {
            mailbox_capacity: 512,
            ..SystemConfig::default()
        };
        match config.validate() {
            Err(CactiError::InvalidConfig(msg)) => assert!(msg.contains("mailbox_capacity")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn zero_limits_are_rejected() {
        let zero_pool = SystemConfig {
            pool_size: 0,
            ..SystemConfig::default()
        };
        let zero_actors = SystemConfig {
            actor_limit: 0,
            ..SystemConfig::default()
        };
        let zero_batch = SystemConfig {
            batch_size: 0,
            ..SystemConfig::default()
        };
        assert!(zero_pool.validate().is_err());
        assert!(zero_actors.validate().is_err());
        assert!(zero_batch.validate().is_err());
    }

    #[test]
    fn store_then_load_keeps_values() {
        let path = std::env::temp_dir().join(format!("cacti-config-{}.cfg", std::process::id()));
        let config = SystemConfig {
            pool_size: 7,
            handle_interrupt: false,
            ..SystemConfig::default()
        };
        config.store(&path).unwrap();
        let loaded = SystemConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_candidates_fall_back_to_default() {
        let config =
            SystemConfig::load_first_or_default(&["./does/not/exist.cfg", "./neither.cfg"]).unwrap();
        assert_eq!(config, SystemConfig::default());
    }
}
