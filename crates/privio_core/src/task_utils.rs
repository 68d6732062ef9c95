//! Side-effect-free operations over task collections.
//!
//! The filter functions return a new vector and never reorder; the sort
//! functions are stable.

use crate::error::AppError;
use crate::model::{Priority, Task, TaskFilter, TaskStats};
use std::cmp::Ordering;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

pub fn filter_by_priority(tasks: &[Task], priority: Option<Priority>) -> Vec<Task> {
    match priority {
        None => tasks.to_vec(),
        Some(priority) => tasks
            .iter()
            .filter(|task| task.priority == priority)
            .cloned()
            .collect(),
    }
}

/// Case-insensitive substring match against title or description. A blank
/// query matches everything.
pub fn search(tasks: &[Task], query: &str) -> Vec<Task> {
    if query.trim().is_empty() {
        return tasks.to_vec();
    }

    let needle = query.to_lowercase();
    tasks
        .iter()
        .filter(|task| {
            task.title.to_lowercase().contains(&needle)
                || task.description.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Priority, then search, then completion visibility.
pub fn apply_filter(tasks: &[Task], filter: &TaskFilter) -> Vec<Task> {
    let by_priority = filter_by_priority(tasks, filter.priority);
    let mut filtered = search(&by_priority, &filter.search_query);
    if !filter.show_completed {
        filtered.retain(|task| !task.completed);
    }
    filtered
}

pub fn sort_by_priority(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by_key(|task| task.priority.rank());
    tasks
}

/// Ascending by due date; undated tasks go last.
pub fn sort_by_due_date(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|a, b| match (a.due_date, b.due_date) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    tasks
}

pub fn compute_stats(tasks: &[Task]) -> TaskStats {
    let total = tasks.len();
    let completed = tasks.iter().filter(|task| task.completed).count();
    TaskStats {
        total,
        completed,
        pending: total - completed,
    }
}

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(local_offset())
}

pub fn is_overdue(due_date: Option<OffsetDateTime>) -> bool {
    is_overdue_at(due_date, OffsetDateTime::now_utc())
}

pub fn is_overdue_at(due_date: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    due_date.is_some_and(|due| due < now)
}

pub fn is_today(due_date: Option<OffsetDateTime>) -> bool {
    is_today_at(due_date, local_now())
}

/// Calendar-date comparison in `now`'s offset.
pub fn is_today_at(due_date: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    due_date.is_some_and(|due| due.to_offset(now.offset()).date() == now.date())
}

pub fn is_tomorrow(due_date: Option<OffsetDateTime>) -> bool {
    is_tomorrow_at(due_date, local_now())
}

pub fn is_tomorrow_at(due_date: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    let Some(tomorrow) = now.date().next_day() else {
        return false;
    };
    due_date.is_some_and(|due| due.to_offset(now.offset()).date() == tomorrow)
}

/// Human label for a due date relative to `now`: "Today at 09:30 AM",
/// "Tomorrow at 05:00 PM", "Mar 5", or "Mar 5, 2027" outside `now`'s year.
pub fn due_label(due_date: OffsetDateTime, now: OffsetDateTime) -> Result<String, AppError> {
    let due_local = due_date.to_offset(now.offset());
    let clock = format_description!("[hour repr:12 padding:zero]:[minute] [period]");

    if is_today_at(Some(due_date), now) {
        let time = due_local
            .format(clock)
            .map_err(|err| AppError::invalid_data(err.to_string()))?;
        return Ok(format!("Today at {time}"));
    }

    if is_tomorrow_at(Some(due_date), now) {
        let time = due_local
            .format(clock)
            .map_err(|err| AppError::invalid_data(err.to_string()))?;
        return Ok(format!("Tomorrow at {time}"));
    }

    let label = if due_local.year() == now.year() {
        due_local.format(format_description!(
            "[month repr:short] [day padding:none]"
        ))
    } else {
        due_local.format(format_description!(
            "[month repr:short] [day padding:none], [year]"
        ))
    };
    label.map_err(|err| AppError::invalid_data(err.to_string()))
}
