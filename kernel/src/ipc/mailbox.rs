use super::Message;
use crate::proc::Pid;
use std::collections::{BTreeMap, VecDeque};

/// Per-process FIFO inboxes.
pub struct Mailboxes {
    boxes: BTreeMap<Pid, VecDeque<Message>>,
}

impl Mailboxes {
    pub fn new() -> Self {
        Self {
            boxes: BTreeMap::new(),
        }
    }

    /// Create an empty mailbox for `pid`, keeping one that already exists.
    pub fn open(&mut self, pid: Pid) {
        self.boxes.entry(pid).or_default();
    }

    /// Drop the mailbox and whatever is still queued in it.
    pub fn close(&mut self, pid: Pid) -> Option<usize> {
        self.boxes.remove(&pid).map(|queue| queue.len())
    }

    /// Returns false when `pid` has no mailbox.
    pub fn send(&mut self, pid: Pid, message: Message) -> bool {
        match self.boxes.get_mut(&pid) {
            Some(queue) => {
                queue.push_back(message);
                true
            }
            None => false,
        }
    }

    /// Oldest pending message, if any.
    pub fn receive(&mut self, pid: Pid) -> Option<Message> {
        self.boxes.get_mut(&pid)?.pop_front()
    }

    pub fn pending(&self, pid: Pid) -> usize {
        self.boxes.get(&pid).map_or(0, |queue| queue.len())
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.boxes.contains_key(&pid)
    }
}

impl Default for Mailboxes {
    fn default() -> Self {
        Self::new()
    }
}
