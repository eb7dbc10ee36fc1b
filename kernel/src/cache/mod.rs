//! Read-through block cache and write-back buffer.
//!
//! A key lives in at most one of the two maps. The cache only ever holds
//! clean data, so eviction never writes anything; dirty data waits in the
//! buffer until [`BlockCacheManager::flush_buffer`] pushes it to the device.

mod manager;

pub use manager::{BlockCacheManager, CacheStats};

use core::fmt;

/// (device name, block number)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockKey {
    pub device: String,
    pub block: usize,
}

impl BlockKey {
    pub fn new(device: &str, block: usize) -> Self {
        Self {
            device: device.into(),
            block,
        }
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.device, self.block)
    }
}
