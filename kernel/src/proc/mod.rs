mod registry;

pub use registry::ProcessRegistry;

/// Opaque process identifier.
pub type Pid = usize;
