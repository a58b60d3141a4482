use causeway_core::config::defaults::{DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_READ_POOL_SIZE};
use causeway_core::config::StorageConfig;

/// Upper bound on read connections, whatever the config asks for.
pub const MAX_READ_CONNECTIONS: usize = 8;

/// Connection settings shared by the writer and the read pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub read_connections: usize,
    pub busy_timeout_ms: u32,
}

impl PoolConfig {
    /// Read connections actually opened: at least one, at most
    /// [`MAX_READ_CONNECTIONS`].
    pub fn effective_readers(&self) -> usize {
        self.read_connections.clamp(1, MAX_READ_CONNECTIONS)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            read_connections: DEFAULT_READ_POOL_SIZE,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl From<&StorageConfig> for PoolConfig {
    fn from(config: &StorageConfig) -> Self {
        Self {
            read_connections: config.read_pool_size,
            busy_timeout_ms: config.busy_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_count_is_clamped() {
        let mut config = PoolConfig::default();
        config.read_connections = 0;
        assert_eq!(config.effective_readers(), 1);
        config.read_connections = 64;
        assert_eq!(config.effective_readers(), MAX_READ_CONNECTIONS);
    }

    #[test]
    fn built_from_storage_config() {
        let storage = StorageConfig {
            read_pool_size: 2,
            busy_timeout_ms: 250,
            ..Default::default()
        };
        let config = PoolConfig::from(&storage);
        assert_eq!(config.read_connections, 2);
        assert_eq!(config.busy_timeout_ms, 250);
    }
}
