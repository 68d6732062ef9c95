use privio_core::error::AppError;
use privio_core::model::{Task, TaskStats};
use privio_core::task_utils::{due_label, is_overdue_at};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::OffsetDateTime;

#[derive(Debug, Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Due")]
    due: String,
}

pub fn status_label(task: &Task) -> &'static str {
    if task.completed { "done" } else { "open" }
}

/// `-` when undated; open tasks past due get an "(overdue)" suffix.
pub fn due_cell(task: &Task, now: OffsetDateTime) -> Result<String, AppError> {
    let Some(due_date) = task.due_date else {
        return Ok("-".to_string());
    };

    let label = due_label(due_date, now)?;
    if !task.completed && is_overdue_at(task.due_date, now) {
        Ok(format!("{label} (overdue)"))
    } else {
        Ok(label)
    }
}

pub fn render_task_table(tasks: &[Task], now: OffsetDateTime) -> Result<String, AppError> {
    if tasks.is_empty() {
        return Ok("No tasks.".to_string());
    }

    let mut rows = Vec::with_capacity(tasks.len());
    for task in tasks {
        rows.push(TaskRow {
            id: task.id.clone(),
            title: task.title.clone(),
            priority: task.priority.to_string(),
            status: status_label(task),
            due: due_cell(task, now)?,
        });
    }

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    Ok(table.to_string())
}

pub fn render_stats(stats: &TaskStats) -> String {
    format!(
        "Total: {} | Completed: {} | Pending: {}",
        stats.total, stats.completed, stats.pending
    )
}

pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    Ok(serde_json::to_string(value)?)
}
