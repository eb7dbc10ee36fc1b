use crate::cache::{BlockCacheManager, CacheStats};
use crate::config::KernelConfig;
use crate::error::{KernelError, KernelResult};
use crate::fs::{self, FileOp, FileOpOutput, MountTable};
use crate::ipc::{Mailboxes, Message, QueueTable};
use crate::mm::{BlockId, MemoryAllocator, MemoryBlock};
use crate::proc::{Pid, ProcessRegistry};
use crate::sync::SemaphoreTable;
use log::{debug, info};
use mkcore_fs::{BlockDevice, DeviceManager, FileHandle, FsDriver};
use spin::Mutex;
use std::sync::Arc;

/// The flat API over every core table.
///
/// Each table sits behind its own lock. Operations that need more than one
/// take them in this order: registry, memory, mailboxes. The cache lock is
/// held across the device call of a miss or flush, and the mount table lock
/// is released before the driver runs.
pub struct Microkernel {
    config: KernelConfig,
    registry: Mutex<ProcessRegistry>,
    memory: Mutex<MemoryAllocator>,
    mailboxes: Mutex<Mailboxes>,
    queues: Mutex<QueueTable>,
    semaphores: Mutex<SemaphoreTable>,
    devices: DeviceManager,
    cache: Mutex<BlockCacheManager>,
    mounts: Mutex<MountTable>,
}

impl Microkernel {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            registry: Mutex::new(ProcessRegistry::new()),
            memory: Mutex::new(MemoryAllocator::new(config.max_process_memory)),
            mailboxes: Mutex::new(Mailboxes::new()),
            queues: Mutex::new(QueueTable::new()),
            semaphores: Mutex::new(SemaphoreTable::new()),
            devices: DeviceManager::new(),
            cache: Mutex::new(BlockCacheManager::new(config.cache_capacity)),
            mounts: Mutex::new(MountTable::new(config.fs_capacity)),
            config,
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    // ---- processes ----

    /// Register `pid` and open its mailbox.
    pub fn add_process(&self, pid: Pid) -> KernelResult<()> {
        let mut registry = self.registry.lock();
        if !registry.add(pid) {
            return Err(KernelError::Conflict(format!("process {} exists", pid)));
        }
        self.mailboxes.lock().open(pid);
        info!("process {} added", pid);
        Ok(())
    }

    pub fn check_process(&self, pid: Pid) -> bool {
        self.registry.lock().contains(pid)
    }

    /// Unregister `pid`, drop its mailbox and release its memory.
    /// Returns the number of memory blocks released.
    pub fn remove_process(&self, pid: Pid) -> KernelResult<usize> {
        let mut registry = self.registry.lock();
        if !registry.remove(pid) {
            return Err(KernelError::NotFound(format!("process {}", pid)));
        }
        let released = self.memory.lock().release_all(pid);
        let dropped = self.mailboxes.lock().close(pid).unwrap_or(0);
        info!(
            "process {} removed: {} blocks released, {} messages dropped",
            pid, released, dropped
        );
        Ok(released)
    }

    pub fn processes(&self) -> Vec<Pid> {
        self.registry.lock().pids()
    }

    // ---- memory ----

    /// Ceiling first, then registration: an over-ceiling request is
    /// `ResourceExhausted` even for an unknown pid.
    pub fn allocate(&self, size: usize, pid: Pid) -> KernelResult<MemoryBlock> {
        let registry = self.registry.lock();
        let mut memory = self.memory.lock();
        memory.check_ceiling(pid, size)?;
        if !registry.contains(pid) {
            return Err(KernelError::NotFound(format!("process {}", pid)));
        }
        memory.allocate(size, pid)
    }

    pub fn free(&self, block: BlockId, pid: Pid) -> KernelResult<()> {
        self.memory.lock().free(block, pid).map(|_| ())
    }

    pub fn allocated(&self, pid: Pid) -> usize {
        self.memory.lock().allocated(pid)
    }

    pub fn memory_snapshot(&self) -> Vec<MemoryBlock> {
        self.memory.lock().snapshot()
    }

    // ---- mailboxes ----

    pub fn send(&self, pid: Pid, message: impl Into<Message>) -> KernelResult<()> {
        if self.mailboxes.lock().send(pid, message.into()) {
            Ok(())
        } else {
            Err(KernelError::NotFound(format!("mailbox of process {}", pid)))
        }
    }

    /// Never waits. `None` for an empty mailbox or an unknown pid.
    pub fn receive(&self, pid: Pid) -> Option<Message> {
        self.mailboxes.lock().receive(pid)
    }

    pub fn pending(&self, pid: Pid) -> usize {
        self.mailboxes.lock().pending(pid)
    }

    // ---- named queues ----

    pub fn create_queue(&self, name: &str) -> KernelResult<()> {
        if self.queues.lock().create(name) {
            debug!("queue {} created", name);
            Ok(())
        } else {
            Err(KernelError::Conflict(format!("queue {} exists", name)))
        }
    }

    pub fn send_queue(&self, name: &str, message: impl Into<Message>) -> KernelResult<()> {
        let queue = self
            .queues
            .lock()
            .get(name)
            .ok_or_else(|| KernelError::NotFound(format!("queue {}", name)))?;
        queue.send(message.into());
        Ok(())
    }

    /// Never waits. `None` for an empty or unknown queue.
    pub fn receive_queue(&self, name: &str) -> Option<Message> {
        let queue = self.queues.lock().get(name)?;
        queue.receive()
    }

    pub fn queue_len(&self, name: &str) -> Option<usize> {
        let queue = self.queues.lock().get(name)?;
        Some(queue.len())
    }

    // ---- semaphores ----

    pub fn sem_create(&self, name: &str, initial: usize) -> KernelResult<()> {
        if self.semaphores.lock().create(name, initial) {
            Ok(())
        } else {
            Err(KernelError::Conflict(format!("semaphore {} exists", name)))
        }
    }

    /// `Ok(false)` when the count is zero; never waits.
    pub fn sem_acquire(&self, name: &str) -> KernelResult<bool> {
        self.semaphores
            .lock()
            .try_acquire(name)
            .ok_or_else(|| KernelError::NotFound(format!("semaphore {}", name)))
    }

    pub fn sem_release(&self, name: &str) -> KernelResult<()> {
        if self.semaphores.lock().release(name) {
            Ok(())
        } else {
            Err(KernelError::NotFound(format!("semaphore {}", name)))
        }
    }

    pub fn sem_count(&self, name: &str) -> Option<usize> {
        self.semaphores.lock().count(name)
    }

    // ---- block devices, cache and buffer ----

    /// Register `name` backed by a zero-filled in-memory device.
    pub fn register_device(&self, name: &str, block_size: usize) -> KernelResult<()> {
        Ok(self.devices.register(name, block_size)?)
    }

    pub fn attach_device(
        &self,
        name: &str,
        block_size: usize,
        device: Arc<dyn BlockDevice>,
    ) -> KernelResult<()> {
        Ok(self.devices.register_device(name, block_size, device)?)
    }

    pub fn devices(&self) -> &DeviceManager {
        &self.devices
    }

    pub fn read_block(&self, device: &str, block: usize) -> KernelResult<Vec<u8>> {
        self.cache.lock().read_block(&self.devices, device, block)
    }

    pub fn write_block(&self, device: &str, block: usize, data: &[u8]) {
        self.cache.lock().write_block(device, block, data)
    }

    pub fn flush_buffer(&self) -> KernelResult<usize> {
        self.cache.lock().flush_buffer(&self.devices)
    }

    pub fn evict_cache(&self) -> KernelResult<()> {
        self.cache.lock().evict_cache().map(|_| ())
    }

    pub fn is_cached(&self, device: &str, block: usize) -> bool {
        self.cache.lock().is_cached(device, block)
    }

    pub fn is_buffered(&self, device: &str, block: usize) -> bool {
        self.cache.lock().is_buffered(device, block)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    // ---- mounts and files ----

    pub fn mount(&self, device: &str, prefix: &str) -> KernelResult<()> {
        self.mounts.lock().mount(device, prefix)
    }

    pub fn mount_driver(
        &self,
        device: &str,
        prefix: &str,
        driver: Arc<dyn FsDriver>,
    ) -> KernelResult<()> {
        self.mounts.lock().mount_driver(device, prefix, driver)
    }

    pub fn unmount(&self, prefix: &str) -> KernelResult<()> {
        self.mounts.lock().unmount(prefix).map(|_| ())
    }

    pub fn mounts(&self) -> Vec<(String, String)> {
        self.mounts.lock().mounts()
    }

    fn route(&self, path: &str) -> KernelResult<(Arc<dyn FsDriver>, String)> {
        let (point, name) = self.mounts.lock().resolve(path)?;
        Ok((point.driver, name))
    }

    /// Route `op` to the driver mounted at the longest prefix of `path`.
    pub fn dispatch(&self, path: &str, op: FileOp<'_>) -> KernelResult<FileOpOutput> {
        let (driver, name) = self.route(path)?;
        fs::apply(driver.as_ref(), &name, op)
    }

    pub fn free_space(&self, path: &str) -> KernelResult<usize> {
        let (driver, _) = self.route(path)?;
        Ok(driver.free_space())
    }

    pub fn create_file(&self, path: &str, size: usize) -> KernelResult<FileHandle> {
        let (driver, name) = self.route(path)?;
        Ok(driver.create_file(&name, size)?)
    }

    pub fn delete_file(&self, path: &str) -> KernelResult<()> {
        self.dispatch(path, FileOp::Delete).map(|_| ())
    }

    pub fn read_file(&self, path: &str) -> KernelResult<Vec<u8>> {
        let (driver, name) = self.route(path)?;
        driver
            .read_file(&name)
            .ok_or_else(|| KernelError::NotFound(format!("file {}", path)))
    }

    pub fn write_file(&self, path: &str, data: &[u8]) -> KernelResult<()> {
        self.dispatch(path, FileOp::Write(data)).map(|_| ())
    }
}

impl Default for Microkernel {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}
