use super::Message;
use spin::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

/// A FIFO channel guarded by its own lock, independent of every other queue.
pub struct NamedQueue {
    inner: Mutex<VecDeque<Message>>,
}

impl NamedQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }
    pub fn send(&self, message: Message) {
        self.inner.lock().push_back(message);
    }
    /// Never waits: `None` when nothing is queued.
    pub fn receive(&self) -> Option<Message> {
        self.inner.lock().pop_front()
    }
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Default for NamedQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Name → queue directory. Callers clone the `Arc` out and release the
/// directory before touching the queue.
pub struct QueueTable {
    queues: BTreeMap<String, Arc<NamedQueue>>,
}

impl QueueTable {
    pub fn new() -> Self {
        Self {
            queues: BTreeMap::new(),
        }
    }
    /// Returns false if `name` is taken.
    pub fn create(&mut self, name: &str) -> bool {
        if self.queues.contains_key(name) {
            return false;
        }
        self.queues.insert(name.into(), Arc::new(NamedQueue::new()));
        true
    }
    pub fn get(&self, name: &str) -> Option<Arc<NamedQueue>> {
        self.queues.get(name).cloned()
    }
    pub fn names(&self) -> Vec<String> {
        self.queues.keys().cloned().collect()
    }
}

impl Default for QueueTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_create_is_refused() {
        let mut table = QueueTable::new();
        assert!(table.create("jobs"));
        assert!(!table.create("jobs"));
        assert_eq!(table.names(), vec!["jobs".to_string()]);
    }

    #[test]
    fn queues_are_independent() {
        let mut table = QueueTable::new();
        table.create("a");
        table.create("b");
        let a = table.get("a").unwrap();
        let b = table.get("b").unwrap();
        a.send(b"1".to_vec());
        assert_eq!(b.receive(), None);
        assert_eq!(a.len(), 1);
        assert_eq!(a.receive(), Some(b"1".to_vec()));
        assert!(a.is_empty());
    }

    #[test]
    fn holding_one_queue_lock_does_not_block_another() {
        let a = NamedQueue::new();
        let b = NamedQueue::new();
        let _held = a.inner.lock();
        b.send(b"free".to_vec());
        assert_eq!(b.receive(), Some(b"free".to_vec()));
    }
}
