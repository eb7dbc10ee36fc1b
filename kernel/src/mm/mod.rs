mod allocator;

pub use allocator::{BlockId, MemoryAllocator, MemoryBlock};
