use crate::model::{Priority, Task, TaskDraft, TaskFilter, TaskStats, TaskUpdate};
use crate::storage::TaskStore;
use crate::task_utils::{apply_filter, compute_stats, sort_by_priority};
use time::OffsetDateTime;
use uuid::Uuid;

/// Sole owner of the task collection and the session filter.
///
/// Every mutation replaces whole `Task` records, persists the collection and
/// recomputes the visible list. Mutations naming an unknown id are no-ops and
/// return `None`. Input is trusted; callers validate with
/// [`crate::validate`] first.
#[derive(Debug)]
pub struct TaskController {
    store: TaskStore,
    tasks: Vec<Task>,
    filter: TaskFilter,
    visible: Vec<Task>,
}

impl TaskController {
    pub fn load(store: TaskStore) -> Self {
        Self::with_filter(store, TaskFilter::default())
    }

    pub fn with_filter(store: TaskStore, filter: TaskFilter) -> Self {
        let tasks = store.load();
        let mut controller = Self {
            store,
            tasks,
            filter,
            visible: Vec::new(),
        };
        controller.refresh();
        controller
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    /// `sort_by_priority(apply_filter(tasks, filter))`.
    pub fn visible_tasks(&self) -> &[Task] {
        &self.visible
    }

    pub fn stats(&self) -> TaskStats {
        compute_stats(&self.tasks)
    }

    /// Adds a task at the front of the collection.
    pub fn create(&mut self, draft: TaskDraft) -> Task {
        let now = OffsetDateTime::now_utc();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            due_date: draft.due_date,
            priority: draft.priority,
            completed: false,
            created_at: now,
            updated_at: now,
        };

        tracing::debug!(id = %task.id, "created task");
        self.tasks.insert(0, task.clone());
        self.commit();
        task
    }

    pub fn update(&mut self, id: &str, update: TaskUpdate) -> Option<Task> {
        self.replace(id, |current| Task {
            id: current.id.clone(),
            title: update
                .title
                .map(|title| title.trim().to_string())
                .unwrap_or_else(|| current.title.clone()),
            description: update
                .description
                .map(|description| description.trim().to_string())
                .unwrap_or_else(|| current.description.clone()),
            due_date: update.due_date.unwrap_or(current.due_date),
            priority: update.priority.unwrap_or(current.priority),
            completed: update.completed.unwrap_or(current.completed),
            created_at: current.created_at,
            updated_at: touched_at(current),
        })
    }

    pub fn delete(&mut self, id: &str) -> Option<Task> {
        let Some(index) = self.position(id) else {
            tracing::debug!(id = id, "delete ignored, task not found");
            return None;
        };

        let removed = self.tasks.remove(index);
        tracing::debug!(id = id, "deleted task");
        self.commit();
        Some(removed)
    }

    pub fn toggle_completion(&mut self, id: &str) -> Option<Task> {
        self.replace(id, |current| Task {
            completed: !current.completed,
            updated_at: touched_at(current),
            ..current.clone()
        })
    }

    pub fn set_search_query<Q: Into<String>>(&mut self, query: Q) {
        self.filter.search_query = query.into();
        self.refresh();
    }

    pub fn set_priority_filter(&mut self, priority: Option<Priority>) {
        self.filter.priority = priority;
        self.refresh();
    }

    pub fn set_show_completed(&mut self, show_completed: bool) {
        self.filter.show_completed = show_completed;
        self.refresh();
    }

    /// Drops every task and removes the persisted snapshot.
    pub fn clear_all(&mut self) {
        self.tasks.clear();
        self.store.clear();
        self.refresh();
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    fn replace<F>(&mut self, id: &str, build: F) -> Option<Task>
    where
        F: FnOnce(&Task) -> Task,
    {
        let Some(index) = self.position(id) else {
            tracing::debug!(id = id, "mutation ignored, task not found");
            return None;
        };

        let replacement = build(&self.tasks[index]);
        self.tasks[index] = replacement.clone();
        tracing::debug!(id = id, "updated task");
        self.commit();
        Some(replacement)
    }

    fn commit(&mut self) {
        self.store.save(&self.tasks);
        self.refresh();
    }

    fn refresh(&mut self) {
        self.visible = sort_by_priority(apply_filter(&self.tasks, &self.filter));
    }
}

// Never earlier than creation, even if the clock moved backwards.
fn touched_at(task: &Task) -> OffsetDateTime {
    OffsetDateTime::now_utc().max(task.created_at)
}
