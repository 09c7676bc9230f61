/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Configuration for bulk transfers.
//!
//! Settings are read from environment variables into a process-wide
//! instance (see [`global`]); tests may override them temporarily
//! while holding [`global::lock`].

use std::env;

use serde::Deserialize;
use serde::Serialize;

/// Set to `0` or `false` to force element-by-element transfers.
pub const FAST_COPY_ENV: &str = "NDSPACE_FAST_COPY";

/// Shortest contiguous run worth copying as a block.
pub const MIN_BLOCK_LEN_ENV: &str = "NDSPACE_MIN_BLOCK_LEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Whether transfers may copy contiguous runs as blocks.
    pub fast_copy: bool,
    /// Runs shorter than this are copied element by element.
    pub min_block_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fast_copy: true,
            min_block_len: 2,
        }
    }
}

/// Load configuration from environment variables.
pub fn from_env() -> Config {
    from_vars(|key| env::var(key).ok())
}

/// Load configuration through `lookup`, falling back to defaults for
/// missing or unparsable values.
pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Config {
    let mut config = Config::default();

    if let Some(val) = lookup(FAST_COPY_ENV) {
        match val.as_str() {
            "0" | "false" => config.fast_copy = false,
            "1" | "true" => config.fast_copy = true,
            _ => tracing::warn!("ignoring {}={}: expected 0, 1, false or true", FAST_COPY_ENV, val),
        }
    }

    if let Some(val) = lookup(MIN_BLOCK_LEN_ENV) {
        match val.parse::<usize>() {
            Ok(parsed) => config.min_block_len = parsed,
            Err(err) => tracing::warn!("ignoring {}={}: {}", MIN_BLOCK_LEN_ENV, val, err),
        }
    }

    config
}

/// Merge with another configuration; fields of `other` that differ
/// from the defaults take precedence.
pub fn merge(config: &mut Config, other: &Config) {
    let defaults = Config::default();
    if other.fast_copy != defaults.fast_copy {
        config.fast_copy = other.fast_copy;
    }
    if other.min_block_len != defaults.min_block_len {
        config.min_block_len = other.min_block_len;
    }
}

/// Global configuration functions
pub mod global {
    use std::sync::LazyLock;
    use std::sync::Mutex;
    use std::sync::MutexGuard;
    use std::sync::PoisonError;
    use std::sync::RwLock;

    use super::*;

    /// Global configuration instance, initialized from environment variables.
    static CONFIG: LazyLock<RwLock<Config>> = LazyLock::new(|| RwLock::new(from_env()));

    static LOCK: Mutex<()> = Mutex::new(());

    /// The current global configuration.
    pub fn get() -> Config {
        *CONFIG.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the global configuration.
    pub fn set(config: Config) {
        *CONFIG.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Reset the global configuration to defaults (for testing only)
    pub fn reset_to_defaults() {
        set(Config::default());
    }

    /// Acquire the global configuration lock for testing.
    pub fn lock() -> ConfigLock {
        ConfigLock {
            _guard: LOCK.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Exclusive access to the global configuration. Overrides made
    /// through the lock are undone when their guard drops.
    pub struct ConfigLock {
        _guard: MutexGuard<'static, ()>,
    }

    impl ConfigLock {
        pub fn override_config(&self, config: Config) -> ConfigOverride<'_> {
            let previous = get();
            set(config);
            ConfigOverride {
                previous,
                _lock: self,
            }
        }
    }

    #[must_use]
    pub struct ConfigOverride<'a> {
        previous: Config,
        _lock: &'a ConfigLock,
    }

    impl Drop for ConfigOverride<'_> {
        fn drop(&mut self) {
            set(self.previous);
        }
    }
}
