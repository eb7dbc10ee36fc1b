use crate::cache::BlockKey;
use crate::mm::BlockId;
use crate::proc::Pid;
use mkcore_fs::{DeviceError, FsError};
use thiserror::Error;

pub type KernelResult<T> = Result<T, KernelError>;

/// Every failure the core reports. All of them are recoverable by the caller.
#[derive(Debug, Error)]
pub enum KernelError {
    /// Unknown process, mailbox, queue, semaphore, device, file or mount.
    #[error("not found: {0}")]
    NotFound(String),
    /// Duplicate mount prefix, queue, semaphore, process or file.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("block {block} is owned by process {owner}, not {caller}")]
    PermissionDenied {
        block: BlockId,
        owner: Pid,
        caller: Pid,
    },
    #[error("resource exhausted: requested {requested}, available {available}")]
    ResourceExhausted { requested: usize, available: usize },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Some buffered blocks could not be written; they are still buffered.
    #[error("flushed {flushed} blocks, {} failed", .failed.len())]
    FlushIncomplete {
        flushed: usize,
        failed: Vec<BlockKey>,
    },
    #[error("device error: {0}")]
    Device(DeviceError),
}

impl From<DeviceError> for KernelError {
    fn from(value: DeviceError) -> Self {
        match value {
            DeviceError::NotRegistered(name) => Self::NotFound(format!("device {}", name)),
            DeviceError::AlreadyRegistered(name) => Self::Conflict(format!("device {}", name)),
            other => Self::Device(other),
        }
    }
}

impl From<FsError> for KernelError {
    fn from(value: FsError) -> Self {
        match value {
            FsError::NoSpace { requested, free } => Self::ResourceExhausted {
                requested,
                available: free,
            },
            FsError::Exists(name) => Self::Conflict(format!("file {}", name)),
        }
    }
}

impl KernelError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
