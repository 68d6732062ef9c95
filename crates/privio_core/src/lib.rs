pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod storage;
pub mod task_utils;
pub mod validate;

pub use controller::TaskController;
pub use error::AppError;
pub use model::{Priority, Task, TaskDraft, TaskFilter, TaskStats, TaskUpdate};
pub use storage::{FileBackend, MemoryBackend, StorageBackend, TaskStore};
