use std::collections::BTreeMap;

/// Named counting semaphores. Acquire never waits; it reports whether a
/// unit was taken.
pub struct SemaphoreTable {
    counts: BTreeMap<String, usize>,
}

impl SemaphoreTable {
    pub fn new() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }

    /// Returns false if `name` already exists.
    pub fn create(&mut self, name: &str, initial: usize) -> bool {
        if self.counts.contains_key(name) {
            return false;
        }
        self.counts.insert(name.into(), initial);
        true
    }

    /// `None` for an unknown name, otherwise whether a unit was taken.
    pub fn try_acquire(&mut self, name: &str) -> Option<bool> {
        let count = self.counts.get_mut(name)?;
        if *count > 0 {
            *count -= 1;
            Some(true)
        } else {
            Some(false)
        }
    }

    /// Returns false for an unknown name.
    pub fn release(&mut self, name: &str) -> bool {
        match self.counts.get_mut(name) {
            Some(count) => {
                *count += 1;
                true
            }
            None => false,
        }
    }

    pub fn count(&self, name: &str) -> Option<usize> {
        self.counts.get(name).copied()
    }
}

impl Default for SemaphoreTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_until_exhausted_then_release() {
        let mut sems = SemaphoreTable::new();
        assert!(sems.create("disk", 1));
        assert!(!sems.create("disk", 5));
        assert_eq!(sems.try_acquire("disk"), Some(true));
        assert_eq!(sems.try_acquire("disk"), Some(false));
        assert!(sems.release("disk"));
        assert_eq!(sems.count("disk"), Some(1));
    }

    #[test]
    fn unknown_names() {
        let mut sems = SemaphoreTable::new();
        assert_eq!(sems.try_acquire("nope"), None);
        assert!(!sems.release("nope"));
        assert_eq!(sems.count("nope"), None);
    }
}
