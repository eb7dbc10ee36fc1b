//! Non-blocking messaging: one mailbox per process, plus named queues that
//! each carry their own lock.

mod mailbox;
mod queue;

pub use mailbox::Mailboxes;
pub use queue::{NamedQueue, QueueTable};

/// Opaque message payload.
pub type Message = Vec<u8>;
