use crate::store::{FileHandle, FileSystem};
use crate::FsError;
use spin::Mutex;

/// File operations the mount dispatcher routes to.
pub trait FsDriver: Send + Sync {
    fn create_file(&self, name: &str, size: usize) -> Result<FileHandle, FsError>;
    fn delete_file(&self, name: &str) -> bool;
    fn read_file(&self, name: &str) -> Option<Vec<u8>>;
    fn write_file(&self, name: &str, data: &[u8]) -> bool;
    fn free_space(&self) -> usize;
}

/// Forwards every call unchanged to one [`FileSystem`].
pub struct PassThroughDriver {
    fs: Mutex<FileSystem>,
}

impl PassThroughDriver {
    pub fn new(capacity: usize) -> Self {
        Self {
            fs: Mutex::new(FileSystem::new(capacity)),
        }
    }

    pub fn ls(&self) -> Vec<String> {
        self.fs.lock().ls()
    }
}

impl FsDriver for PassThroughDriver {
    fn create_file(&self, name: &str, size: usize) -> Result<FileHandle, FsError> {
        self.fs.lock().create_file(name, size)
    }

    fn delete_file(&self, name: &str) -> bool {
        self.fs.lock().delete_file(name)
    }

    fn read_file(&self, name: &str) -> Option<Vec<u8>> {
        self.fs.lock().read_file(name)
    }

    fn write_file(&self, name: &str, data: &[u8]) -> bool {
        self.fs.lock().write_file(name, data)
    }

    fn free_space(&self) -> usize {
        self.fs.lock().free_space()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwards_to_one_store() {
        let driver = PassThroughDriver::new(8);
        driver.create_file("/b", 3).unwrap();
        driver.create_file("/a", 3).unwrap();
        assert_eq!(
            driver.create_file("/c", 3),
            Err(FsError::NoSpace { requested: 3, free: 2 })
        );
        assert!(driver.write_file("/a", b"xyz"));
        assert_eq!(driver.read_file("/a"), Some(b"xyz".to_vec()));
        assert_eq!(driver.ls(), vec!["/a".to_string(), "/b".to_string()]);
        assert!(driver.delete_file("/b"));
        assert_eq!(driver.free_space(), 5);
    }
}
