//! Cache configuration.
//!
//! Controls the shared resource cache via `rubrica.toml`.

use std::num::NonZeroUsize;

use serde::Deserialize;

// Default values for cache configuration
const DEFAULT_ENTRY_LIMIT: usize = 256;
const DEFAULT_EVENT_BUFFER: usize = 64;

/// Cache configuration from `rubrica.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the shared query cache. When disabled every fetch goes to the
    /// network and no entries are stored.
    pub enabled: bool,
    /// Maximum cached query entries (lists and details combined).
    pub entry_limit: usize,
    /// Capacity of the invalidation broadcast channel.
    pub event_buffer: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            entry_limit: DEFAULT_ENTRY_LIMIT,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl CacheConfig {
    /// Returns the entry limit as `NonZeroUsize`, clamping to 1 if zero.
    pub fn entry_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.entry_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the event buffer as a channel capacity, clamping to 1 if zero.
    pub fn event_buffer_non_zero(&self) -> usize {
        self.event_buffer.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.entry_limit, 256);
        assert_eq!(config.event_buffer, 64);
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            entry_limit: 0,
            event_buffer: 0,
            ..Default::default()
        };
        assert_eq!(config.entry_limit_non_zero().get(), 1);
        assert_eq!(config.event_buffer_non_zero(), 1);
    }
}
