use crate::model::Priority;

/// View criteria applied to the collection. Session-only: never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub priority: Option<Priority>,
    pub search_query: String,
    pub show_completed: bool,
}
