use thiserror::Error;

/// Failures reported by block devices and the [`DeviceManager`](crate::DeviceManager).
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No device was registered under this name.
    #[error("{0} is not a registered device")]
    NotRegistered(String),
    /// A device with this name already exists.
    #[error("{0} is already registered")]
    AlreadyRegistered(String),
    /// Payload does not fit in one block.
    #[error("payload of {len} bytes exceeds block size {block_size}")]
    BlockTooLarge { block_size: usize, len: usize },
    /// Backing storage ended in the middle of a block.
    #[error("block {block_id} is incomplete: read {read} bytes")]
    ShortBlock { block_id: usize, read: usize },
    /// Block number whose byte offset cannot be addressed.
    #[error("block {block_id} is out of range")]
    OutOfRange { block_id: usize },
    /// The device lays out blocks with a different size than requested.
    #[error("device block size {actual} does not match requested {requested}")]
    BlockSizeMismatch { requested: usize, actual: usize },
    /// Host I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported by the in-memory [`FileSystem`](crate::FileSystem).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("no space left: requested {requested} bytes, {free} free")]
    NoSpace { requested: usize, free: usize },
    #[error("file {0} already exists")]
    Exists(String),
}
