use super::Pid;
use std::collections::BTreeSet;

/// Set of live process ids.
pub struct ProcessRegistry {
    live: BTreeSet<Pid>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self {
            live: BTreeSet::new(),
        }
    }
    /// Returns false if `pid` was already live.
    pub fn add(&mut self, pid: Pid) -> bool {
        self.live.insert(pid)
    }
    pub fn contains(&self, pid: Pid) -> bool {
        self.live.contains(&pid)
    }
    /// Returns false if `pid` was not live.
    pub fn remove(&mut self, pid: Pid) -> bool {
        self.live.remove(&pid)
    }
    pub fn pids(&self) -> Vec<Pid> {
        self.live.iter().copied().collect()
    }
    pub fn len(&self) -> usize {
        self.live.len()
    }
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}
