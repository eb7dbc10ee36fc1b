use super::BlockKey;
use crate::error::{KernelError, KernelResult};
use log::{debug, info, warn};
use mkcore_fs::DeviceManager;
use std::collections::BTreeMap;

struct CacheEntry {
    data: Vec<u8>,
    /// Value of the access clock at the last hit or insertion.
    recency: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub cached: usize,
    pub buffered: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

pub struct BlockCacheManager {
    cache: BTreeMap<BlockKey, CacheEntry>,
    buffer: BTreeMap<BlockKey, Vec<u8>>,
    clock: u64,
    capacity: Option<usize>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl BlockCacheManager {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            cache: BTreeMap::new(),
            buffer: BTreeMap::new(),
            clock: 0,
            capacity,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    pub fn read_block(
        &mut self,
        devices: &DeviceManager,
        device: &str,
        block: usize,
    ) -> KernelResult<Vec<u8>> {
        let key = BlockKey::new(device, block);
        let now = self.tick();
        if let Some(entry) = self.cache.get_mut(&key) {
            entry.recency = now;
            self.hits += 1;
            return Ok(entry.data.clone());
        }
        // promoted as-is, the device is not written
        if let Some(data) = self.buffer.remove(&key) {
            self.hits += 1;
            debug!("cache: {} promoted from buffer", key);
            self.insert_clean(key, data.clone(), now);
            return Ok(data);
        }
        self.misses += 1;
        let data = devices.read(device, block)?;
        debug!("cache: {} fetched from device", key);
        self.insert_clean(key, data.clone(), now);
        Ok(data)
    }

    fn insert_clean(&mut self, key: BlockKey, data: Vec<u8>, recency: u64) {
        if let Some(cap) = self.capacity {
            // a full cache is never empty, so there is always a victim
            if self.cache.len() >= cap.max(1) {
                if let Ok(victim) = self.evict_cache() {
                    debug!("cache: {} evicted to make room for {}", victim, key);
                }
            }
        }
        self.cache.insert(key, CacheEntry { data, recency });
    }

    /// Leaves `data` as the dirty copy of the block and drops any cached one.
    pub fn write_block(&mut self, device: &str, block: usize, data: &[u8]) {
        let key = BlockKey::new(device, block);
        if self.cache.remove(&key).is_some() {
            debug!("cache: {} invalidated by write", key);
        }
        self.buffer.insert(key, data.to_vec());
    }

    /// Write every buffered block to its device.
    ///
    /// Blocks that were written leave the buffer; blocks whose write failed
    /// stay and are listed in [`KernelError::FlushIncomplete`].
    pub fn flush_buffer(&mut self, devices: &DeviceManager) -> KernelResult<usize> {
        let mut flushed = 0;
        let mut failed = Vec::new();
        self.buffer.retain(|key, data| {
            match devices.write(&key.device, key.block, data) {
                Ok(()) => {
                    flushed += 1;
                    false
                }
                Err(err) => {
                    warn!("cache: flushing {} failed: {}", key, err);
                    failed.push(key.clone());
                    true
                }
            }
        });
        if failed.is_empty() {
            info!("cache: flushed {} blocks", flushed);
            Ok(flushed)
        } else {
            Err(KernelError::FlushIncomplete { flushed, failed })
        }
    }

    /// Drop the least recently used clean block. Ties go to the smaller key.
    pub fn evict_cache(&mut self) -> KernelResult<BlockKey> {
        let victim = self
            .cache
            .iter()
            .min_by_key(|(_, entry)| entry.recency)
            .map(|(key, _)| key.clone())
            .ok_or_else(|| KernelError::NotFound("nothing to evict".into()))?;
        self.cache.remove(&victim);
        self.evictions += 1;
        debug!("cache: evicted {}", victim);
        Ok(victim)
    }

    pub fn is_cached(&self, device: &str, block: usize) -> bool {
        self.cache.contains_key(&BlockKey::new(device, block))
    }

    pub fn is_buffered(&self, device: &str, block: usize) -> bool {
        self.buffer.contains_key(&BlockKey::new(device, block))
    }

    pub fn cached_keys(&self) -> Vec<BlockKey> {
        self.cache.keys().cloned().collect()
    }

    pub fn buffered_keys(&self) -> Vec<BlockKey> {
        self.buffer.keys().cloned().collect()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            cached: self.cache.len(),
            buffered: self.buffer.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mkcore_fs::{BlockDevice, DeviceError, MemBlockDevice};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts reads, refuses writes when `broken`.
    struct RecordingDevice {
        inner: MemBlockDevice,
        reads: AtomicUsize,
        broken: bool,
    }

    impl RecordingDevice {
        fn new(broken: bool) -> Arc<Self> {
            Arc::new(Self {
                inner: MemBlockDevice::new(),
                reads: AtomicUsize::new(0),
                broken,
            })
        }
    }

    impl BlockDevice for RecordingDevice {
        fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read_block(block_id, buf)
        }
        fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
            if self.broken {
                return Err(DeviceError::Io(std::io::Error::other("write refused")));
            }
            self.inner.write_block(block_id, buf)
        }
    }

    fn setup(broken: bool) -> (DeviceManager, Arc<RecordingDevice>) {
        let devices = DeviceManager::new();
        let device = RecordingDevice::new(broken);
        devices.register_device("d", 4, device.clone()).unwrap();
        (devices, device)
    }

    fn disjoint(manager: &BlockCacheManager) -> bool {
        manager
            .cached_keys()
            .iter()
            .all(|key| !manager.buffered_keys().contains(key))
    }

    #[test]
    fn miss_then_hit_reads_device_once() {
        let (devices, device) = setup(false);
        let mut manager = BlockCacheManager::new(None);
        assert_eq!(manager.read_block(&devices, "d", 0).unwrap(), vec![0; 4]);
        assert_eq!(manager.read_block(&devices, "d", 0).unwrap(), vec![0; 4]);
        assert_eq!(device.reads.load(Ordering::SeqCst), 1);
        let stats = manager.stats();
        assert_eq!((stats.hits, stats.misses, stats.cached), (1, 1, 1));
    }

    #[test]
    fn miss_on_unregistered_device_is_not_found() {
        let devices = DeviceManager::new();
        let mut manager = BlockCacheManager::new(None);
        let err = manager.read_block(&devices, "ghost", 1).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(manager.stats().cached, 0);
    }

    #[test]
    fn write_then_read_promotes_without_device() {
        let (devices, device) = setup(false);
        let mut manager = BlockCacheManager::new(None);
        manager.write_block("d", 1, b"P");
        assert!(manager.is_buffered("d", 1));
        assert_eq!(manager.read_block(&devices, "d", 1).unwrap(), b"P".to_vec());
        assert_eq!(device.reads.load(Ordering::SeqCst), 0);
        assert!(manager.is_cached("d", 1));
        assert!(!manager.is_buffered("d", 1));
    }

    #[test]
    fn write_over_cached_block_invalidates_it() {
        let (devices, _) = setup(false);
        let mut manager = BlockCacheManager::new(None);
        manager.read_block(&devices, "d", 2).unwrap();
        manager.write_block("d", 2, b"new");
        assert!(!manager.is_cached("d", 2));
        assert!(manager.is_buffered("d", 2));
        assert!(disjoint(&manager));
        manager.write_block("d", 2, b"newer");
        assert_eq!(manager.read_block(&devices, "d", 2).unwrap(), b"newer".to_vec());
        assert!(disjoint(&manager));
    }

    #[test]
    fn flush_writes_and_empties_buffer() {
        let (devices, device) = setup(false);
        let mut manager = BlockCacheManager::new(None);
        manager.write_block("d", 0, b"ab");
        manager.write_block("d", 3, b"cd");
        assert_eq!(manager.flush_buffer(&devices).unwrap(), 2);
        assert_eq!(manager.stats().buffered, 0);
        assert_eq!(device.inner.written_blocks(), 2);
        assert_eq!(manager.read_block(&devices, "d", 3).unwrap(), b"cd\0\0".to_vec());
    }

    #[test]
    fn failed_flush_keeps_failing_keys() {
        let (devices, _) = setup(true);
        devices.register("ok", 4).unwrap();
        let mut manager = BlockCacheManager::new(None);
        manager.write_block("d", 0, b"x");
        manager.write_block("ok", 0, b"y");
        manager.write_block("missing", 7, b"z");
        match manager.flush_buffer(&devices) {
            Err(KernelError::FlushIncomplete { flushed, failed }) => {
                assert_eq!(flushed, 1);
                assert_eq!(failed, vec![BlockKey::new("d", 0), BlockKey::new("missing", 7)]);
            }
            other => panic!("unexpected flush result: {:?}", other),
        }
        assert_eq!(
            manager.buffered_keys(),
            vec![BlockKey::new("d", 0), BlockKey::new("missing", 7)]
        );
    }

    #[test]
    fn evict_on_empty_cache_changes_nothing() {
        let mut manager = BlockCacheManager::new(None);
        manager.write_block("d", 0, b"dirty");
        assert!(manager.evict_cache().unwrap_err().is_not_found());
        assert!(manager.is_buffered("d", 0));
        assert_eq!(manager.stats().evictions, 0);
    }

    #[test]
    fn evicts_least_recently_used() {
        let (devices, _) = setup(false);
        let mut manager = BlockCacheManager::new(None);
        for block in 0..3 {
            manager.read_block(&devices, "d", block).unwrap();
        }
        manager.read_block(&devices, "d", 0).unwrap();
        assert_eq!(manager.evict_cache().unwrap(), BlockKey::new("d", 1));
        assert_eq!(manager.evict_cache().unwrap(), BlockKey::new("d", 2));
        assert_eq!(manager.evict_cache().unwrap(), BlockKey::new("d", 0));
    }

    #[test]
    fn capacity_evicts_before_insert() {
        let (devices, _) = setup(false);
        let mut manager = BlockCacheManager::new(Some(2));
        manager.read_block(&devices, "d", 0).unwrap();
        manager.read_block(&devices, "d", 1).unwrap();
        manager.read_block(&devices, "d", 0).unwrap();
        manager.read_block(&devices, "d", 2).unwrap();
        assert_eq!(
            manager.cached_keys(),
            vec![BlockKey::new("d", 0), BlockKey::new("d", 2)]
        );
        assert_eq!(manager.stats().evictions, 1);
    }
}
