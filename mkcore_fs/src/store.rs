use crate::FsError;
use log::debug;
use std::collections::BTreeMap;

/// What `create_file` hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
    pub size: usize,
}

struct FileEntry {
    size: usize,
    data: Vec<u8>,
}

/// Flat name → file table with one byte budget shared by all files.
///
/// `size` is the reservation made at creation; writes replace the data
/// without re-checking it.
pub struct FileSystem {
    files: BTreeMap<String, FileEntry>,
    free_space: usize,
}

impl FileSystem {
    pub fn new(capacity: usize) -> Self {
        Self {
            files: BTreeMap::new(),
            free_space: capacity,
        }
    }

    pub fn create_file(&mut self, name: &str, size: usize) -> Result<FileHandle, FsError> {
        if self.files.contains_key(name) {
            return Err(FsError::Exists(name.into()));
        }
        if size > self.free_space {
            return Err(FsError::NoSpace {
                requested: size,
                free: self.free_space,
            });
        }
        self.free_space -= size;
        self.files.insert(
            name.into(),
            FileEntry {
                size,
                data: Vec::new(),
            },
        );
        debug!("fs: created {} ({} bytes, {} free)", name, size, self.free_space);
        Ok(FileHandle {
            name: name.into(),
            size,
        })
    }

    pub fn delete_file(&mut self, name: &str) -> bool {
        match self.files.remove(name) {
            Some(file) => {
                self.free_space += file.size;
                true
            }
            None => false,
        }
    }

    pub fn read_file(&self, name: &str) -> Option<Vec<u8>> {
        self.files.get(name).map(|file| file.data.clone())
    }

    pub fn write_file(&mut self, name: &str, data: &[u8]) -> bool {
        match self.files.get_mut(name) {
            Some(file) => {
                file.data = data.to_vec();
                true
            }
            None => false,
        }
    }

    pub fn free_space(&self) -> usize {
        self.free_space
    }

    pub fn ls(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_consumes_and_delete_restores_space() {
        let mut fs = FileSystem::new(32);
        let handle = fs.create_file("/a", 10).unwrap();
        assert_eq!(handle, FileHandle { name: "/a".into(), size: 10 });
        assert_eq!(fs.free_space(), 22);
        assert!(fs.delete_file("/a"));
        assert_eq!(fs.free_space(), 32);
        assert!(!fs.delete_file("/a"));
    }

    #[test]
    fn over_budget_and_duplicate_create_change_nothing() {
        let mut fs = FileSystem::new(16);
        assert_eq!(
            fs.create_file("/big", 17),
            Err(FsError::NoSpace { requested: 17, free: 16 })
        );
        fs.create_file("/a", 4).unwrap();
        assert_eq!(fs.create_file("/a", 4), Err(FsError::Exists("/a".into())));
        assert_eq!(fs.free_space(), 12);
        assert_eq!(fs.ls(), vec!["/a".to_string()]);
    }

    #[test]
    fn write_requires_existing_file() {
        let mut fs = FileSystem::new(16);
        assert!(!fs.write_file("/a", b"x"));
        assert_eq!(fs.read_file("/a"), None);
        fs.create_file("/a", 2).unwrap();
        assert_eq!(fs.read_file("/a"), Some(Vec::new()));
        assert!(fs.write_file("/a", b"Hello, world!"));
        assert_eq!(fs.read_file("/a").unwrap(), b"Hello, world!".to_vec());
    }
}
