pub mod locks;
pub mod storage;

pub use locks::LockTable;
pub use storage::{FileStorage, MemoryStorage, Storage};
