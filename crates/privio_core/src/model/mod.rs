mod filter;
mod task;

pub use filter::TaskFilter;
pub use task::{Priority, Task, TaskDraft, TaskStats, TaskUpdate};
