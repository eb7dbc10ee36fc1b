mod semaphore;

pub use semaphore::SemaphoreTable;
