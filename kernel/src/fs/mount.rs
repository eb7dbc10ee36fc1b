use crate::error::{KernelError, KernelResult};
use log::debug;
use mkcore_fs::{FsDriver, PassThroughDriver};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct MountPoint {
    pub prefix: String,
    pub device: String,
    pub driver: Arc<dyn FsDriver>,
}

impl fmt::Debug for MountPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountPoint")
            .field("prefix", &self.prefix)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

/// Path prefix → driver routing.
///
/// Each device gets one driver the first time it is mounted and keeps it,
/// so a device mounted twice, or mounted again later, shows the same files.
pub struct MountTable {
    mounts: BTreeMap<String, MountPoint>,
    drivers: BTreeMap<String, Arc<dyn FsDriver>>,
    fs_capacity: usize,
}

/// `/mnt/` → `/mnt`; anything not absolute is rejected.
fn normalize(prefix: &str) -> KernelResult<String> {
    if !prefix.starts_with('/') {
        return Err(KernelError::InvalidArgument(format!(
            "mount prefix {:?} is not absolute",
            prefix
        )));
    }
    let trimmed = prefix.trim_end_matches('/');
    Ok(if trimmed.is_empty() { "/".into() } else { trimmed.into() })
}

fn covers(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return path.starts_with('/');
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl MountTable {
    pub fn new(fs_capacity: usize) -> Self {
        Self {
            mounts: BTreeMap::new(),
            drivers: BTreeMap::new(),
            fs_capacity,
        }
    }

    /// Mount the filesystem of `device` at `prefix`.
    pub fn mount(&mut self, device: &str, prefix: &str) -> KernelResult<()> {
        let prefix = normalize(prefix)?;
        if self.mounts.contains_key(&prefix) {
            return Err(KernelError::Conflict(format!("{} is already mounted", prefix)));
        }
        let capacity = self.fs_capacity;
        let driver = Arc::clone(
            self.drivers
                .entry(device.into())
                .or_insert_with(|| Arc::new(PassThroughDriver::new(capacity))),
        );
        self.insert(prefix, device, driver);
        Ok(())
    }

    /// Mount a caller-supplied driver. `device` is only a label.
    pub fn mount_driver(
        &mut self,
        device: &str,
        prefix: &str,
        driver: Arc<dyn FsDriver>,
    ) -> KernelResult<()> {
        let prefix = normalize(prefix)?;
        if self.mounts.contains_key(&prefix) {
            return Err(KernelError::Conflict(format!("{} is already mounted", prefix)));
        }
        self.insert(prefix, device, driver);
        Ok(())
    }

    fn insert(&mut self, prefix: String, device: &str, driver: Arc<dyn FsDriver>) {
        debug!("mount: {} at {}", device, prefix);
        self.mounts.insert(
            prefix.clone(),
            MountPoint {
                prefix,
                device: device.into(),
                driver,
            },
        );
    }

    /// A prefix that could never have been mounted is simply not found.
    pub fn unmount(&mut self, prefix: &str) -> KernelResult<MountPoint> {
        let point = normalize(prefix)
            .ok()
            .and_then(|prefix| self.mounts.remove(&prefix))
            .ok_or_else(|| KernelError::NotFound(format!("mount point {}", prefix)))?;
        debug!("mount: {} unmounted from {}", point.device, point.prefix);
        Ok(point)
    }

    /// Longest mounted prefix covering `path`, and `path` with it stripped.
    pub fn resolve(&self, path: &str) -> KernelResult<(MountPoint, String)> {
        let point = self
            .mounts
            .values()
            .filter(|point| covers(&point.prefix, path))
            .max_by_key(|point| point.prefix.len())
            .ok_or_else(|| KernelError::NotFound(format!("no mount point for {}", path)))?;
        let rest = if point.prefix == "/" {
            path.to_string()
        } else {
            path[point.prefix.len()..].to_string()
        };
        Ok((point.clone(), rest))
    }

    /// (prefix, device) pairs ordered by prefix.
    pub fn mounts(&self) -> Vec<(String, String)> {
        self.mounts
            .values()
            .map(|point| (point.prefix.clone(), point.device.clone()))
            .collect()
    }

    pub fn is_mounted(&self, prefix: &str) -> bool {
        normalize(prefix).is_ok_and(|prefix| self.mounts.contains_key(&prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_prefix_conflicts() {
        let mut table = MountTable::new(64);
        table.mount("/dev/sda1", "/mnt").unwrap();
        assert!(matches!(table.mount("/dev/sdb1", "/mnt/"), Err(KernelError::Conflict(_))));
        assert_eq!(table.mounts(), vec![("/mnt".to_string(), "/dev/sda1".to_string())]);
    }

    #[test]
    fn relative_prefix_is_rejected() {
        let mut table = MountTable::new(64);
        assert!(matches!(table.mount("d", "mnt"), Err(KernelError::InvalidArgument(_))));
        assert!(matches!(table.mount("d", ""), Err(KernelError::InvalidArgument(_))));
    }

    #[test]
    fn longest_prefix_wins_and_is_stripped() {
        let mut table = MountTable::new(64);
        table.mount("root", "/").unwrap();
        table.mount("a", "/mnt").unwrap();
        table.mount("b", "/mnt/data").unwrap();

        let (point, rest) = table.resolve("/mnt/data/x.txt").unwrap();
        assert_eq!((point.device.as_str(), rest.as_str()), ("b", "/x.txt"));

        let (point, rest) = table.resolve("/mnt/test.txt").unwrap();
        assert_eq!((point.device.as_str(), rest.as_str()), ("a", "/test.txt"));

        let (point, rest) = table.resolve("/mnt2/y").unwrap();
        assert_eq!((point.device.as_str(), rest.as_str()), ("root", "/mnt2/y"));
    }

    #[test]
    fn unmatched_and_unmounted_paths_are_not_found() {
        let mut table = MountTable::new(64);
        table.mount("a", "/mnt").unwrap();
        assert!(table.resolve("/mntx/file").unwrap_err().is_not_found());
        table.unmount("/mnt").unwrap();
        assert!(table.resolve("/mnt/file").unwrap_err().is_not_found());
        assert!(table.unmount("/mnt").unwrap_err().is_not_found());
        assert!(!table.is_mounted("/mnt"));
        assert!(table.unmount("mnt").unwrap_err().is_not_found());
        assert!(table.unmount("").unwrap_err().is_not_found());
    }

    #[test]
    fn device_keeps_its_driver_across_mounts() {
        let mut table = MountTable::new(64);
        table.mount("a", "/one").unwrap();
        table.mount("a", "/two").unwrap();
        let (one, _) = table.resolve("/one/f").unwrap();
        let (two, _) = table.resolve("/two/f").unwrap();
        assert!(Arc::ptr_eq(&one.driver, &two.driver));
        one.driver.create_file("/f", 4).unwrap();
        assert_eq!(two.driver.free_space(), 60);
    }
}
