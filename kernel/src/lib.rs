//! Control core of a simulated microkernel.
//!
//! [`Microkernel`] owns the process registry, the memory allocator,
//! mailboxes, named queues and semaphores, the block cache/buffer and the
//! mount table, and exposes them as one flat API. Block devices and
//! filesystems come from `mkcore_fs`.
//!
//! Every call runs to completion on the caller's thread; nothing waits for
//! a message or a semaphore to become available.

pub mod cache;
pub mod config;
pub mod error;
pub mod fs;
pub mod ipc;
pub mod mm;
pub mod proc;
pub mod sync;

mod microkernel;

pub use cache::{BlockKey, CacheStats};
pub use config::KernelConfig;
pub use error::{KernelError, KernelResult};
pub use fs::{FileOp, FileOpOutput};
pub use ipc::Message;
pub use microkernel::Microkernel;
pub use mm::{BlockId, MemoryBlock};
pub use proc::Pid;

pub use mkcore_fs::{
    BlockDevice, BlockFile, DeviceError, FileHandle, FsDriver, FsError, MemBlockDevice,
    PassThroughDriver,
};
