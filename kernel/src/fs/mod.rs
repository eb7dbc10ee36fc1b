mod mount;

pub use mount::{MountPoint, MountTable};

use crate::error::{KernelError, KernelResult};
use mkcore_fs::{FileHandle, FsDriver};

/// A file operation routed through the mount table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp<'a> {
    Create { size: usize },
    Delete,
    Read,
    Write(&'a [u8]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOpOutput {
    Created(FileHandle),
    Deleted,
    Data(Vec<u8>),
    Written,
}

/// Run `op` on `name` inside `driver`, turning driver refusals into errors.
pub fn apply(driver: &dyn FsDriver, name: &str, op: FileOp<'_>) -> KernelResult<FileOpOutput> {
    let missing = || KernelError::NotFound(format!("file {}", name));
    match op {
        FileOp::Create { size } => Ok(FileOpOutput::Created(driver.create_file(name, size)?)),
        FileOp::Delete => driver
            .delete_file(name)
            .then_some(FileOpOutput::Deleted)
            .ok_or_else(missing),
        FileOp::Read => driver.read_file(name).map(FileOpOutput::Data).ok_or_else(missing),
        FileOp::Write(data) => driver
            .write_file(name, data)
            .then_some(FileOpOutput::Written)
            .ok_or_else(missing),
    }
}
