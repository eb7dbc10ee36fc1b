//! Collaborators of the microkernel core: block devices addressed by name,
//! and a flat in-memory filesystem behind a pass-through driver.

pub use crate::block_dev::{BlockDevice, BlockFile, MemBlockDevice};
pub use crate::device_manager::DeviceManager;
pub use crate::driver::{FsDriver, PassThroughDriver};
pub use crate::error::{DeviceError, FsError};
pub use crate::store::{FileHandle, FileSystem};

mod block_dev;
mod device_manager;
mod driver;
mod error;
mod store;

/// Block size used when a caller does not pick one.
pub const BLOCK_SIZE: usize = 512;
/// Byte budget of a freshly created [`FileSystem`].
pub const FS_CAPACITY: usize = 1024;
