mod batch_allocator;

pub use batch_allocator::{AllocatorSettings, BatchAllocator, BatchOutcome};
