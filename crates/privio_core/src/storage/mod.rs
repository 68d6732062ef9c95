pub mod backend;
pub mod task_store;

pub use backend::{
    FileBackend, MemoryBackend, StorageBackend, default_store_dir, store_dir_from_env,
};
pub use task_store::TaskStore;
