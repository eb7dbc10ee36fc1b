use crate::DeviceError;
use spin::Mutex;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

/// A device addressed in fixed-size blocks.
///
/// `buf` is always exactly one block long; the [`DeviceManager`](crate::DeviceManager)
/// pads and checks payloads before they reach an implementation.
pub trait BlockDevice: Send + Sync {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError>;
    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError>;
    /// Block size the device lays its blocks out with, if it has a fixed one.
    fn block_size(&self) -> Option<usize> {
        None
    }
}

/// Sparse in-memory device. Blocks never written read back as zeros.
pub struct MemBlockDevice {
    blocks: Mutex<BTreeMap<usize, Vec<u8>>>,
}

impl MemBlockDevice {
    pub fn new() -> Self {
        Self {
            blocks: Mutex::new(BTreeMap::new()),
        }
    }
    /// Number of blocks that have been written at least once.
    pub fn written_blocks(&self) -> usize {
        self.blocks.lock().len()
    }
}

impl Default for MemBlockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDevice for MemBlockDevice {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        match self.blocks.lock().get(&block_id) {
            Some(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                buf[len..].fill(0);
            }
            None => buf.fill(0),
        }
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        self.blocks.lock().insert(block_id, buf.to_vec());
        Ok(())
    }
}

/// Host file used as a block device image.
pub struct BlockFile {
    file: Mutex<File>,
    block_size: usize,
}

impl BlockFile {
    pub fn new(file: File, block_size: usize) -> Self {
        Self {
            file: Mutex::new(file),
            block_size,
        }
    }

    fn offset(&self, block_id: usize) -> Result<u64, DeviceError> {
        block_id
            .checked_mul(self.block_size)
            .and_then(|offset| u64::try_from(offset).ok())
            .ok_or(DeviceError::OutOfRange { block_id })
    }
}

impl BlockDevice for BlockFile {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        let offset = self.offset(block_id)?;
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        let mut read = 0;
        while read < buf.len() {
            match file.read(&mut buf[read..])? {
                0 => break,
                n => read += n,
            }
        }
        if read != buf.len() {
            return Err(DeviceError::ShortBlock { block_id, read });
        }
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        let offset = self.offset(block_id)?;
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)?;
        Ok(())
    }

    fn block_size(&self) -> Option<usize> {
        Some(self.block_size)
    }
}
