use crate::error::{KernelError, KernelResult};
use crate::proc::Pid;
use log::{debug, warn};
use std::collections::BTreeMap;

pub type BlockId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBlock {
    pub id: BlockId,
    pub size: usize,
    pub owner: Pid,
    pub allocated: bool,
}

/// Table of memory blocks with a per-process ceiling.
///
/// Block ids increase monotonically for the allocator's lifetime and are
/// never handed out twice.
pub struct MemoryAllocator {
    blocks: BTreeMap<BlockId, MemoryBlock>,
    next_id: BlockId,
    ceiling: usize,
}

impl MemoryAllocator {
    pub fn new(ceiling: usize) -> Self {
        Self {
            blocks: BTreeMap::new(),
            next_id: 1,
            ceiling,
        }
    }

    /// Sum of the sizes of the blocks `owner` currently holds.
    pub fn allocated(&self, owner: Pid) -> usize {
        self.blocks
            .values()
            .filter(|block| block.owner == owner && block.allocated)
            .map(|block| block.size)
            .sum()
    }

    /// Fails with `ResourceExhausted` if `owner` cannot take `size` more bytes.
    pub fn check_ceiling(&self, owner: Pid, size: usize) -> KernelResult<()> {
        let current = self.allocated(owner);
        match current.checked_add(size) {
            Some(total) if total <= self.ceiling => Ok(()),
            _ => {
                warn!(
                    "mm: process {} asked for {} bytes, holds {} of {}",
                    owner, size, current, self.ceiling
                );
                Err(KernelError::ResourceExhausted {
                    requested: size,
                    available: self.ceiling.saturating_sub(current),
                })
            }
        }
    }

    pub fn allocate(&mut self, size: usize, owner: Pid) -> KernelResult<MemoryBlock> {
        self.check_ceiling(owner, size)?;
        let id = self.next_id;
        self.next_id += 1;
        let block = MemoryBlock {
            id,
            size,
            owner,
            allocated: true,
        };
        self.blocks.insert(id, block.clone());
        debug!("mm: block {} ({} bytes) -> process {}", id, size, owner);
        Ok(block)
    }

    pub fn free(&mut self, id: BlockId, caller: Pid) -> KernelResult<MemoryBlock> {
        let owner = match self.blocks.get(&id) {
            Some(block) => block.owner,
            None => return Err(KernelError::NotFound(format!("memory block {}", id))),
        };
        if owner != caller {
            return Err(KernelError::PermissionDenied {
                block: id,
                owner,
                caller,
            });
        }
        debug!("mm: block {} freed by process {}", id, caller);
        self.blocks
            .remove(&id)
            .ok_or_else(|| KernelError::NotFound(format!("memory block {}", id)))
    }

    /// Drop every block `owner` holds, returning how many there were.
    pub fn release_all(&mut self, owner: Pid) -> usize {
        let before = self.blocks.len();
        self.blocks.retain(|_, block| block.owner != owner);
        before - self.blocks.len()
    }

    pub fn get(&self, id: BlockId) -> Option<&MemoryBlock> {
        self.blocks.get(&id)
    }

    /// Every live block ordered by id.
    pub fn snapshot(&self) -> Vec<MemoryBlock> {
        self.blocks.values().cloned().collect()
    }
}
