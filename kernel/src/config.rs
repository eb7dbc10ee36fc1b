/// Maximum bytes a single process may hold at once.
pub const MAX_PROCESS_MEMORY: usize = 100;

/// Byte budget of each mounted filesystem store.
pub const FS_CAPACITY: usize = mkcore_fs::FS_CAPACITY;

pub const DEFAULT_BLOCK_SIZE: usize = mkcore_fs::BLOCK_SIZE;

/// Clean blocks kept before the least recently used one is dropped.
pub const BLOCK_CACHE_CAP: usize = 16;

/// Tunables of a [`Microkernel`](crate::Microkernel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelConfig {
    pub max_process_memory: usize,
    pub fs_capacity: usize,
    /// `None` disables automatic eviction.
    pub cache_capacity: Option<usize>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_process_memory: MAX_PROCESS_MEMORY,
            fs_capacity: FS_CAPACITY,
            cache_capacity: Some(BLOCK_CACHE_CAP),
        }
    }
}

impl KernelConfig {
    pub fn with_max_process_memory(mut self, bytes: usize) -> Self {
        self.max_process_memory = bytes;
        self
    }
    pub fn with_fs_capacity(mut self, bytes: usize) -> Self {
        self.fs_capacity = bytes;
        self
    }
    pub fn with_cache_capacity(mut self, blocks: Option<usize>) -> Self {
        self.cache_capacity = blocks;
        self
    }
}
