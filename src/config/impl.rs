use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;
use crate::errors::{AdminError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks. Falls back to defaults when
/// `init_config` has not been called yet.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::default()))
        .load_full()
}

/// Initialize the global configuration from `path` (or `config.toml`)
///
/// Only the first successful call loads from disk; later calls return the
/// already installed configuration.
pub fn init_config(path: Option<&str>) -> Result<Arc<StaticConfig>> {
    if let Some(existing) = CONFIG.get() {
        return Ok(existing.load_full());
    }
    let loaded = StaticConfig::load_from(path.unwrap_or(DEFAULT_CONFIG_PATH))?;
    let slot = CONFIG.get_or_init(|| ArcSwap::from_pointee(loaded));
    Ok(slot.load_full())
}

/// Install an explicit configuration (tests and embedding)
pub fn set_config(config: StaticConfig) -> Result<()> {
    match CONFIG.get() {
        Some(slot) => {
            slot.store(Arc::new(config));
            Ok(())
        }
        None => CONFIG
            .set(ArcSwap::from_pointee(config))
            .map_err(|_| AdminError::config("Config initialized concurrently")),
    }
}
