use crate::block_dev::{BlockDevice, MemBlockDevice};
use crate::DeviceError;
use log::debug;
use spin::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

struct DeviceSlot {
    block_size: usize,
    device: Arc<dyn BlockDevice>,
}

/// Name → block device table.
///
/// The table lock is only held while looking a device up; the device call
/// itself runs outside of it.
pub struct DeviceManager {
    devices: Mutex<BTreeMap<String, DeviceSlot>>,
}

impl DeviceManager {
    pub fn new() -> Self {
        Self {
            devices: Mutex::new(BTreeMap::new()),
        }
    }

    /// Register `name` backed by a fresh zero-filled in-memory device.
    pub fn register(&self, name: &str, block_size: usize) -> Result<(), DeviceError> {
        self.register_device(name, block_size, Arc::new(MemBlockDevice::new()))
    }

    /// Register `name` backed by `device`.
    ///
    /// A device with its own block layout must use the same `block_size`.
    pub fn register_device(
        &self,
        name: &str,
        block_size: usize,
        device: Arc<dyn BlockDevice>,
    ) -> Result<(), DeviceError> {
        if let Some(actual) = device.block_size() {
            if actual != block_size {
                return Err(DeviceError::BlockSizeMismatch {
                    requested: block_size,
                    actual,
                });
            }
        }
        let mut devices = self.devices.lock();
        if devices.contains_key(name) {
            return Err(DeviceError::AlreadyRegistered(name.into()));
        }
        devices.insert(name.into(), DeviceSlot { block_size, device });
        debug!("device {} registered, block size {}", name, block_size);
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.devices.lock().contains_key(name)
    }

    pub fn block_size(&self, name: &str) -> Option<usize> {
        self.devices.lock().get(name).map(|slot| slot.block_size)
    }

    fn lookup(&self, name: &str) -> Result<(usize, Arc<dyn BlockDevice>), DeviceError> {
        self.devices
            .lock()
            .get(name)
            .map(|slot| (slot.block_size, Arc::clone(&slot.device)))
            .ok_or_else(|| DeviceError::NotRegistered(name.into()))
    }

    /// Read one whole block.
    pub fn read(&self, name: &str, block_id: usize) -> Result<Vec<u8>, DeviceError> {
        let (block_size, device) = self.lookup(name)?;
        let mut buf = vec![0u8; block_size];
        device.read_block(block_id, &mut buf)?;
        Ok(buf)
    }

    /// Write `data` as block `block_id`, zero-padded to the block size.
    pub fn write(&self, name: &str, block_id: usize, data: &[u8]) -> Result<(), DeviceError> {
        let (block_size, device) = self.lookup(name)?;
        if data.len() > block_size {
            return Err(DeviceError::BlockTooLarge {
                block_size,
                len: data.len(),
            });
        }
        let mut buf = vec![0u8; block_size];
        buf[..data.len()].copy_from_slice(data);
        device.write_block(block_id, &buf)
    }
}

impl Default for DeviceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockFile;

    #[test]
    fn unregistered_device_is_reported() {
        let manager = DeviceManager::new();
        let err = manager.read("/dev/none", 0).unwrap_err();
        assert!(matches!(err, DeviceError::NotRegistered(name) if name == "/dev/none"));
    }

    #[test]
    fn write_pads_and_read_returns_whole_block() {
        let manager = DeviceManager::new();
        manager.register("/dev/sda1", 8).unwrap();
        manager.write("/dev/sda1", 1, b"abc").unwrap();
        assert_eq!(manager.read("/dev/sda1", 1).unwrap(), b"abc\0\0\0\0\0".to_vec());
        assert_eq!(manager.read("/dev/sda1", 0).unwrap(), vec![0u8; 8]);
    }

    #[test]
    fn oversized_write_and_double_register_fail() {
        let manager = DeviceManager::new();
        manager.register("/dev/sda1", 4).unwrap();
        assert!(matches!(
            manager.write("/dev/sda1", 0, b"too long"),
            Err(DeviceError::BlockTooLarge { block_size: 4, len: 8 })
        ));
        assert!(matches!(
            manager.register("/dev/sda1", 4),
            Err(DeviceError::AlreadyRegistered(_))
        ));
        assert_eq!(manager.block_size("/dev/sda1"), Some(4));
        assert!(manager.is_registered("/dev/sda1"));
        assert!(!manager.is_registered("/dev/sdb1"));
    }

    #[test]
    fn file_device_with_another_block_size_is_refused() {
        let manager = DeviceManager::new();
        let file = tempfile::tempfile().unwrap();
        let image: Arc<dyn BlockDevice> = Arc::new(BlockFile::new(file, 16));
        assert!(matches!(
            manager.register_device("img", 512, Arc::clone(&image)),
            Err(DeviceError::BlockSizeMismatch { requested: 512, actual: 16 })
        ));
        assert!(!manager.is_registered("img"));

        manager.register_device("img", 16, image).unwrap();
        manager.write("img", 0, &[0xaa; 16]).unwrap();
        manager.write("img", 1, &[0xbb; 16]).unwrap();
        assert_eq!(manager.read("img", 0).unwrap(), vec![0xaa; 16]);
        assert_eq!(manager.read("img", 1).unwrap(), vec![0xbb; 16]);
    }
}
